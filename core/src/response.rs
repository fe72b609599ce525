//! Projection of engine state onto the wire.
//!
//! Every processed line yields one `Response`: either the literal `null`
//! (the key had no effect) or an envelope that always carries `commit`,
//! `composition` and `menu`, each of which may be null on its own.

use serde::Serialize;

use crate::api::{Commit, Context, Menu, RimeApi, SessionId};
use crate::snapshot::Snapshot;

/// Select keys used when the engine does not supply its own.
pub const DEFAULT_SELECT_KEYS: &str = "1234567890";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Serialized as `null`.
    NoEffect,
    State(Envelope),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub commit: Option<CommitState>,
    pub composition: Option<CompositionState>,
    pub menu: Option<MenuState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitState {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionState {
    pub preedit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuState {
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    pub text: String,
    pub comment: Option<String>,
    pub label: Option<String>,
}

impl Response {
    /// Compact single-line JSON, without the trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Envelope {
    /// Read commit and context of `session` and release both snapshots.
    pub fn project<E: RimeApi + ?Sized>(api: &E, session: SessionId) -> Self {
        let commit = Snapshot::commit(api, session).map(|commit| CommitState::from(&*commit));

        let (composition, menu) = match Snapshot::context(api, session) {
            Some(context) => (
                CompositionState::from_context(&context),
                MenuState::from_menu(&context.menu),
            ),
            None => (None, None),
        };

        Self {
            commit,
            composition,
            menu,
        }
    }
}

impl From<&Commit> for CommitState {
    fn from(commit: &Commit) -> Self {
        Self {
            text: commit.text.clone(),
        }
    }
}

impl CompositionState {
    fn from_context(context: &Context) -> Option<Self> {
        context
            .composition
            .preedit
            .as_deref()
            .filter(|preedit| !preedit.is_empty())
            .map(|preedit| Self {
                preedit: preedit.to_string(),
            })
    }
}

impl MenuState {
    fn from_menu(menu: &Menu) -> Option<Self> {
        if menu.candidates.is_empty() {
            return None;
        }
        let select_keys = menu.select_keys.as_deref().unwrap_or(DEFAULT_SELECT_KEYS);
        let candidates = menu
            .candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| CandidateEntry {
                text: candidate.text.clone(),
                comment: candidate.comment.clone(),
                label: label_for(select_keys, index),
            })
            .collect();
        Some(Self { candidates })
    }
}

/// Label of the candidate at `index`: the select key at that position.
pub fn label_for(select_keys: &str, index: usize) -> Option<String> {
    select_keys.chars().nth(index).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Candidate;

    fn menu(candidates: Vec<Candidate>, select_keys: Option<&str>) -> Menu {
        Menu {
            candidates,
            select_keys: select_keys.map(str::to_string),
        }
    }

    #[test]
    fn no_effect_is_literal_null() {
        assert_eq!(Response::NoEffect.to_line().unwrap(), "null");
    }

    #[test]
    fn empty_envelope_keeps_all_keys() {
        let line = Response::State(Envelope::default()).to_line().unwrap();
        assert_eq!(line, r#"{"commit":null,"composition":null,"menu":null}"#);
    }

    #[test]
    fn commit_without_text_serializes_null_text() {
        let envelope = Envelope {
            commit: Some(CommitState { text: None }),
            ..Envelope::default()
        };
        assert_eq!(
            Response::State(envelope).to_line().unwrap(),
            r#"{"commit":{"text":null},"composition":null,"menu":null}"#
        );
    }

    #[test]
    fn labels_follow_position() {
        for n in 0..14 {
            let candidates = (0..n).map(|i| Candidate::new(format!("c{i}"))).collect();
            let state = MenuState::from_menu(&menu(candidates, Some("abc")));
            let Some(state) = state else {
                assert_eq!(n, 0);
                continue;
            };
            for (i, entry) in state.candidates.iter().enumerate() {
                let expected = "abc".chars().nth(i).map(String::from);
                assert_eq!(entry.label, expected, "position {i} of {n}");
            }
        }
    }

    #[test]
    fn default_select_keys_label_ten_candidates() {
        let candidates = (0..11).map(|i| Candidate::new(i.to_string())).collect();
        let state = MenuState::from_menu(&menu(candidates, None)).unwrap();
        assert_eq!(state.candidates[0].label.as_deref(), Some("1"));
        assert_eq!(state.candidates[9].label.as_deref(), Some("0"));
        assert_eq!(state.candidates[10].label, None);
    }

    #[test]
    fn multibyte_select_keys_are_counted_in_chars() {
        assert_eq!(label_for("①②③", 1).as_deref(), Some("②"));
        assert_eq!(label_for("①②③", 3), None);
    }

    #[test]
    fn empty_preedit_means_no_composition() {
        let mut context = Context::default();
        assert!(CompositionState::from_context(&context).is_none());
        context.composition.preedit = Some(String::new());
        assert!(CompositionState::from_context(&context).is_none());
        context.composition.preedit = Some("ni".into());
        assert_eq!(
            CompositionState::from_context(&context),
            Some(CompositionState {
                preedit: "ni".into()
            })
        );
    }

    #[test]
    fn comment_passes_through() {
        let state = MenuState::from_menu(&menu(
            vec![Candidate::new("阿"), Candidate::with_comment("啊", "interjection")],
            None,
        ))
        .unwrap();
        let line = serde_json::to_string(&state).unwrap();
        assert_eq!(
            line,
            r#"{"candidates":[{"text":"阿","comment":null,"label":"1"},{"text":"啊","comment":"interjection","label":"2"}]}"#
        );
    }
}
