//! Wire format types for backend-specific HTTP APIs
//!
//! Pure serde structs matching each backend's JSON format. They exist only at
//! the serialization boundary; nothing outside `convert` and `provider` uses
//! them.

pub mod ollama;
pub mod openai;
