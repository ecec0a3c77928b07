//! AI moderation of comments on public entries.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::client::{AiError, TextGenerator};
use crate::fallback::GENERIC_DENIAL_REASON;
use crate::prompts::moderation_prompt;
use crate::structured::decode_json;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    #[serde(default)]
    pub reason: String,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }
}

/// Sends diary/comment pairs to the generator and decodes its verdict.
///
/// A reply that does not decode as a verdict is treated as an allow. When the
/// generator itself fails, `fail_open` decides between allowing the comment
/// and returning the error.
pub struct Moderator {
    generator: Arc<dyn TextGenerator>,
    fail_open: bool,
}

impl Moderator {
    pub fn new(generator: Arc<dyn TextGenerator>, fail_open: bool) -> Self {
        Self { generator, fail_open }
    }

    pub async fn review(&self, diary: &str, comment: &str) -> Result<Verdict, AiError> {
        let reply = match self.generator.generate(&moderation_prompt(diary, comment)).await {
            Ok(reply) => reply,
            Err(e) if self.fail_open => {
                warn!("Moderation unavailable, allowing comment: {}", e);
                return Ok(Verdict::allow());
            }
            Err(e) => return Err(e),
        };

        match decode_json::<Verdict>(&reply) {
            Ok(mut verdict) => {
                if !verdict.allowed && verdict.reason.trim().is_empty() {
                    verdict.reason = GENERIC_DENIAL_REASON.to_string();
                }
                Ok(verdict)
            }
            Err(e) => {
                warn!("Undecodable moderation verdict, allowing comment: {}", e);
                Ok(Verdict::allow())
            }
        }
    }
}
