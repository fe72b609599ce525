//! Scoped engine snapshots.
//!
//! Commit and context data are lent out by the engine and must be returned
//! with `free_commit` / `free_context`. A `Snapshot` holds the borrowed value
//! and hands it back when it goes out of scope, whichever way the projection
//! exits.

use std::ops::Deref;

use tracing::warn;

use crate::api::{Commit, Context, RimeApi, SessionId};

pub struct Snapshot<'a, E: RimeApi + ?Sized, T> {
    api: &'a E,
    value: T,
    release: fn(&E, &mut T) -> bool,
}

impl<'a, E: RimeApi + ?Sized> Snapshot<'a, E, Commit> {
    /// Pending commit of `session`, if any.
    pub fn commit(api: &'a E, session: SessionId) -> Option<Self> {
        api.get_commit(session).map(|value| Self {
            api,
            value,
            release: E::free_commit,
        })
    }
}

impl<'a, E: RimeApi + ?Sized> Snapshot<'a, E, Context> {
    /// Composition and menu of `session`, if the engine has a context for it.
    pub fn context(api: &'a E, session: SessionId) -> Option<Self> {
        api.get_context(session).map(|value| Self {
            api,
            value,
            release: E::free_context,
        })
    }
}

impl<E: RimeApi + ?Sized, T> Deref for Snapshot<'_, E, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<E: RimeApi + ?Sized, T> Drop for Snapshot<'_, E, T> {
    fn drop(&mut self) {
        if !(self.release)(self.api, &mut self.value) {
            warn!("engine refused to release a snapshot");
        }
    }
}
