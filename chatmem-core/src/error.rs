// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Chat context error types

use crate::ids::MessageId;
use thiserror::Error;

/// Result type for chat context operations
pub type ChatResult<T> = Result<T, ChatContextError>;

/// Errors that can occur while building or mutating a chat context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatContextError {
    /// Message ID missing or blank
    #[error("Message ID is required")]
    MessageIdRequired,

    /// Sender missing or blank
    #[error("Message sender is required")]
    SenderRequired,

    /// Message text is empty
    #[error("Message text must not be empty")]
    MessageTextEmpty,

    /// Message text exceeds the configured cap
    #[error("Message text is too long: {length} characters (max {max})")]
    MessageTooLong { length: usize, max: usize },

    /// Unknown message role
    #[error("Invalid message role: {0}")]
    InvalidRole(String),

    /// Message timestamp missing
    #[error("Message timestamp is required")]
    TimestampRequired,

    /// Max messages bound set to zero
    #[error("Maximum messages must be a positive integer or unset")]
    MaxMessagesNotValid,

    /// Max tokens bound set to zero
    #[error("Maximum tokens must be a positive integer or unset")]
    MaxTokensNotValid,

    /// Timeout set to zero seconds
    #[error("Timeout must be a positive number of seconds or unset")]
    TimeoutNotValid,

    /// Context ID missing or blank
    #[error("Context ID is required")]
    ContextIdRequired,

    /// Agent ID missing or blank
    #[error("Agent ID is required")]
    AgentIdRequired,

    /// User ID missing or blank
    #[error("User ID is required")]
    UserIdRequired,

    /// Restored timestamps are inconsistent
    #[error("Invalid timestamps: updated_at ({updated_at}) is before created_at ({created_at})")]
    InvalidTimestamps {
        created_at: String,
        updated_at: String,
    },

    /// Message lookup failed where existence is required
    #[error("Message with ID '{0}' not found")]
    MessageNotFound(MessageId),

    /// Parent reference does not resolve inside the collection
    #[error("Message '{message_id}' references missing parent '{parent_id}'")]
    MessageHasInvalidParentId {
        message_id: MessageId,
        parent_id: MessageId,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ChatContextError {
    /// Whether the error comes from input validation rather than state
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            ChatContextError::MessageNotFound(_)
                | ChatContextError::MessageHasInvalidParentId { .. }
                | ChatContextError::ConfigError(_)
                | ChatContextError::SerializationError(_)
        )
    }
}

impl From<serde_json::Error> for ChatContextError {
    fn from(e: serde_json::Error) -> Self {
        ChatContextError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for ChatContextError {
    fn from(e: toml::de::Error) -> Self {
        ChatContextError::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for ChatContextError {
    fn from(e: std::io::Error) -> Self {
        ChatContextError::ConfigError(e.to_string())
    }
}
