//! Generative-text side of SleepOn.
//!
//! Everything that talks to the hosted language model goes through
//! [`TextGenerator`]. Callers decide what to do on failure; the canned
//! replies they fall back to live in [`fallback`].

pub mod client;
pub mod fallback;
pub mod mock;
pub mod moderation;
pub mod prompts;
pub mod structured;

pub use client::{AiError, GeminiClient, TextGenerator};
pub use mock::ScriptedGenerator;
pub use moderation::{Moderator, Verdict};
