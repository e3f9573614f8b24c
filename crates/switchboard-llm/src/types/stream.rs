use std::fmt;
use std::pin::Pin;

use futures_util::Stream;

use super::response::ChatResponse;
use crate::error::LlmError;

/// Lazy, finite sequence of partial responses from one streaming call
///
/// Dropping the stream releases the underlying connection.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatResponse, LlmError>> + Send>>;

/// Result of a chat call: one response, or a stream of partial responses
pub enum ChatReply {
    Complete(ChatResponse),
    Stream(ChatStream),
}

impl ChatReply {
    /// The complete response, if the call was not streamed
    pub fn into_complete(self) -> Option<ChatResponse> {
        match self {
            Self::Complete(response) => Some(response),
            Self::Stream(_) => None,
        }
    }

    /// The response stream, if the call was streamed
    pub fn into_stream(self) -> Option<ChatStream> {
        match self {
            Self::Complete(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            Self::Stream(_) => f.debug_struct("Stream").finish_non_exhaustive(),
        }
    }
}
