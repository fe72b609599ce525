//! Request decoding.
//!
//! Wire form: `{"keysym": <int>, "modifiers": <int>}`. `keycode` is accepted
//! as another name for `keysym`; giving both is an error. Extra fields are
//! ignored.
//!
//! A line that is not a JSON object, lacks either field, or carries a value
//! that is not a 32-bit integer decodes to `Request::Invalid`, which the
//! bridge turns into the neutral key event instead of dropping the line.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::input::RequestLine;
use crate::key_event::KeyEvent;

#[derive(Debug, Deserialize)]
struct KeyRequest {
    #[serde(alias = "keycode")]
    keysym: i32,
    modifiers: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Key(KeyEvent),
    /// Undecodable line, with the reason.
    Invalid(String),
}

impl Request {
    pub fn parse(line: &[u8]) -> Self {
        let object: Map<String, Value> = match serde_json::from_slice(line) {
            Ok(object) => object,
            Err(e) => return Request::Invalid(e.to_string()),
        };
        match KeyRequest::deserialize(Value::Object(object)) {
            Ok(req) => Request::Key(KeyEvent::from_raw(req.keysym, req.modifiers)),
            Err(e) => Request::Invalid(e.to_string()),
        }
    }

    pub fn from_line(line: &RequestLine) -> Self {
        if line.oversized {
            return Request::Invalid(format!("request line exceeds {} bytes", line.bytes.len()));
        }
        Self::parse(&line.bytes)
    }

    /// The event to dispatch: the decoded key, or the neutral key.
    pub fn key_event(&self) -> KeyEvent {
        match self {
            Request::Key(key) => *key,
            Request::Invalid(_) => KeyEvent::NEUTRAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_event::Modifiers;

    fn parse(s: &str) -> Request {
        Request::parse(s.as_bytes())
    }

    #[test]
    fn decodes_keysym_and_modifiers() {
        assert_eq!(
            parse(r#"{"keysym": 97, "modifiers": 0}"#),
            Request::Key(KeyEvent::plain(97))
        );
        assert_eq!(
            parse(r#"{"keysym": 65, "modifiers": 1}"#),
            Request::Key(KeyEvent::new(65, Modifiers::SHIFT))
        );
    }

    #[test]
    fn keycode_is_an_alias() {
        assert_eq!(
            parse(r#"{"keycode": 97, "modifiers": 0}"#).key_event(),
            KeyEvent::plain(97)
        );
    }

    #[test]
    fn both_key_names_is_invalid() {
        assert!(matches!(
            parse(r#"{"keysym": 97, "keycode": 98, "modifiers": 0}"#),
            Request::Invalid(_)
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        assert!(matches!(
            parse(r#"{"keysym": 97, "modifiers": 0, "id": "x"}"#),
            Request::Key(_)
        ));
    }

    #[test]
    fn malformed_lines_degrade_to_neutral() {
        let cases = [
            "",
            "not json",
            "null",
            "[97, 0]",
            r#"{"modifiers": 0}"#,
            r#"{"keysym": 97}"#,
            r#"{"keysym": "97", "modifiers": 0}"#,
            r#"{"keysym": 97.5, "modifiers": 0}"#,
            r#"{"keysym": 97, "modifiers": null}"#,
            r#"{"keysym": 4294967296, "modifiers": 0}"#,
        ];
        for case in cases {
            let request = parse(case);
            assert!(
                matches!(request, Request::Invalid(_)),
                "{case:?} should be invalid"
            );
            assert_eq!(request.key_event(), KeyEvent::NEUTRAL);
        }
    }

    #[test]
    fn oversized_line_is_invalid() {
        let line = RequestLine {
            bytes: br#"{"keysym": 97, "modifiers": 0}"#.to_vec(),
            oversized: true,
        };
        assert!(matches!(Request::from_line(&line), Request::Invalid(_)));
    }
}
