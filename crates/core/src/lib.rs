//! # AskRelay Core
//!
//! Domain types, traits, and error definitions for the AskRelay chat backend.
//! This crate has **no HTTP framework dependencies**: it defines the model
//! that the provider, audit, and gateway crates implement against.
//!
//! - [`Provider`] abstracts an upstream chat-completion API.
//! - [`SessionStore`] holds per-session conversation history in memory.
//! - [`AuditSink`] is the read-only view of the external message store.

pub mod audit;
pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod time;

// Re-export key types at crate root for ergonomics
pub use audit::{AuditRow, AuditSink};
pub use error::{AuditError, ProviderError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::{Exchange, SessionStore};
