//! Completion providers for AskRelay.
//!
//! Upstream backends implement `askrelay_core::Provider`. The
//! [`CompletionProvider`] wraps the backend chosen at startup and turns any
//! upstream failure into the echo answer.

pub mod completion;
pub mod echo;
pub mod openai_compat;
pub mod router;

pub use completion::{Completion, CompletionProvider, CompletionSettings, Mode, UsageRecord};
pub use echo::{EchoProvider, echo_answer};
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
