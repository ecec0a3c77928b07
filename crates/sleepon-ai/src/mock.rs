//! Scripted generator for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::client::{AiError, TextGenerator};

/// Returns a fixed reply (or always fails) and records every prompt.
pub struct ScriptedGenerator {
    reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicU32,
}

impl ScriptedGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Mutex::new(Some(text.into())),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Behaves like a service whose keys are all exhausted.
    pub fn failing() -> Self {
        Self {
            reply: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Change the reply; `None` switches to failing.
    pub fn set_reply(&self, reply: Option<&str>) {
        if let Ok(mut slot) = self.reply.lock() {
            *slot = reply.map(str::to_string);
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let reply = self
            .reply
            .lock()
            .map_err(|e| AiError::Unavailable(e.to_string()))?
            .clone();

        reply.ok_or_else(|| AiError::Unavailable("scripted failure".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_prompts_and_counts_calls() {
        let generator = ScriptedGenerator::replying("ok");
        assert_eq!(generator.generate("first").await.unwrap(), "ok");

        generator.set_reply(None);
        assert!(generator.generate("second").await.is_err());

        assert_eq!(generator.call_count(), 2);
        assert_eq!(generator.prompts(), vec!["first", "second"]);
    }
}
