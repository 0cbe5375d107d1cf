//! Shared building blocks for the chat-triggered command relay.
//! This crate provides the placeholder codec, command matching and
//! authorization, run state, status-document rendering, and transport helpers
//! consumed by the runtime crate.

pub mod command_envelope;
pub mod command_registry;
pub mod correlation;
pub mod error;
pub mod event_payload;
pub mod placeholder;
pub mod requester;
pub mod run_state;
pub mod status_document;
pub mod transport_helpers;

pub use error::RelayError;
