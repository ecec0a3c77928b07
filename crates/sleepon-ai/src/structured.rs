//! Decoding JSON the model was asked to produce.
//!
//! Models often wrap JSON in a Markdown code fence. The fence is removed,
//! then the body must match the target type exactly; anything else is a
//! decode error and the caller applies its own default.

use serde::de::DeserializeOwned;

pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json), which may run straight into the body
    // when the whole fence sits on one line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Flag {
        allowed: bool,
    }

    #[test]
    fn plain_json() {
        let flag: Flag = decode_json(r#" {"allowed": true} "#).unwrap();
        assert!(flag.allowed);
    }

    #[test]
    fn fenced_json() {
        let text = "```json\n{\"allowed\": false}\n```";
        let flag: Flag = decode_json(text).unwrap();
        assert!(!flag.allowed);

        let bare_fence = "```\n[\"a\", \"b\"]\n```\n";
        let list: Vec<String> = decode_json(bare_fence).unwrap();
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn single_line_fence() {
        let flag: Flag = decode_json(r#"```json{"allowed":false}```"#).unwrap();
        assert!(!flag.allowed);

        let list: Vec<String> = decode_json(r#"```["a"]```"#).unwrap();
        assert_eq!(list, vec!["a"]);
    }

    #[test]
    fn prose_is_rejected() {
        assert!(decode_json::<Flag>("Sure! \"allowed\": true").is_err());
        assert!(decode_json::<Flag>(r#"{"allowed": "yes"}"#).is_err());
    }
}
