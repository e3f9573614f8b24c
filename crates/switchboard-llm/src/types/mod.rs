//! Canonical, backend-independent request and response types
//!
//! Every adapter converts its wire format to and from these types; nothing
//! caller-visible varies in name or shape between backends.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{ChatMessage, ChatRole, MessageInput};
pub use request::{ChatParams, ChatRequest, ResponseFormat};
pub use response::{ChatResponse, FinishReason, Usage, coerce_token_count};
pub use stream::{ChatReply, ChatStream};
pub use tool::{FunctionCall, FunctionDefinition, ToolCall, ToolDefinition};
