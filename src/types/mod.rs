//! Core message types shared by the provider and the orchestrator.

pub mod message;

pub use message::{Message, MessageRole};
