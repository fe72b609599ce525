//! A connected engine.
//!
//! `EngineHandle::connect` is the compatibility gate: it refuses providers
//! that do not implement every operation the bridge calls, then runs setup,
//! initialization and the startup maintenance pass. The engine is finalized
//! exactly once, either through `finalize` or when the handle is dropped.

use tracing::{error, info};

use crate::api::{Capabilities, RimeApi};
use crate::config::Traits;
use crate::error::{BridgeError, Result};

pub struct EngineHandle<E: RimeApi> {
    api: E,
    traits: Traits,
    finalized: bool,
}

impl<E: RimeApi> EngineHandle<E> {
    pub fn connect(mut api: E, traits: Traits) -> Result<Self> {
        let missing = Capabilities::REQUIRED.difference(api.capabilities());
        if !missing.is_empty() {
            error!(missing = %missing.names(), "incompatible engine API");
            return Err(BridgeError::IncompatibleApi { missing });
        }

        info!(
            shared_data_dir = %traits.shared_data_dir.display(),
            user_data_dir = %traits.user_data_dir.display(),
            app_name = %traits.app_name,
            "initializing engine"
        );
        api.setup(&traits);
        api.initialize(&traits);
        if api.start_maintenance(false) {
            info!("maintenance pass completed");
        }

        Ok(Self {
            api,
            traits,
            finalized: false,
        })
    }

    pub fn api(&self) -> &E {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut E {
        &mut self.api
    }

    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    /// Tear the engine down. Sessions should already be destroyed.
    pub fn finalize(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.finalized {
            self.finalized = true;
            self.api.finalize();
            info!("engine finalized");
        }
    }
}

impl<E: RimeApi> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        self.release();
    }
}
