//! Contains data structures for requests and responses to the Ollama API.
//!
//! Chat, generate and embedding payloads live in their own modules; model
//! management, HTTP plumbing and shared types are re-exported from here.

pub mod chat;
pub mod embed;
pub mod generate;
mod http;
mod models;
mod shared;

pub use http::*;
pub use models::*;
pub use shared::*;
