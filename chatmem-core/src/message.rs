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

//! Message value object
//!
//! A [`Message`] is one immutable turn of a conversation. Construction goes
//! through [`MessageBuilder`], which validates every invariant up front, so an
//! invalid message never exists. "Updating" a message means building a new
//! value with the same id via [`Message::with_patch`].
//!
//! Equality and hashing only look at the message id.

use crate::clock::Clock;
use crate::error::{ChatContextError, ChatResult};
use crate::ids::{MessageId, SenderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Opaque metadata attached to a message.
pub type Metadata = BTreeMap<String, Value>;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End user input
    User,
    /// Agent output
    Agent,
    /// System instructions
    System,
}

impl MessageRole {
    /// Get the role as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
            MessageRole::System => "system",
        }
    }
}

impl Default for MessageRole {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = ChatContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "agent" => Ok(MessageRole::Agent),
            "system" => Ok(MessageRole::System),
            other => Err(ChatContextError::InvalidRole(other.to_string())),
        }
    }
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord")]
pub struct Message {
    message_id: MessageId,
    sender: SenderId,
    text: String,
    timestamp: DateTime<Utc>,
    role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_message_id: Option<MessageId>,
    #[serde(default)]
    attachments: Vec<Value>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    total_tokens: u64,
}

/// Wire shape of a message, validated on the way in.
#[derive(Deserialize)]
struct MessageRecord {
    message_id: MessageId,
    sender: SenderId,
    text: String,
    timestamp: DateTime<Utc>,
    role: MessageRole,
    #[serde(default)]
    parent_message_id: Option<MessageId>,
    #[serde(default)]
    attachments: Vec<Value>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    total_tokens: u64,
}

impl TryFrom<MessageRecord> for Message {
    type Error = ChatContextError;

    fn try_from(record: MessageRecord) -> ChatResult<Self> {
        MessageBuilder {
            message_id: Some(record.message_id),
            sender: record.sender,
            text: record.text,
            timestamp: Some(record.timestamp),
            role: record.role,
            parent_message_id: record.parent_message_id,
            attachments: record.attachments,
            metadata: record.metadata,
            total_tokens: record.total_tokens,
            max_text_length: None,
        }
        .build()
    }
}

impl Message {
    /// Start building a message.
    pub fn builder(
        sender: impl Into<SenderId>,
        role: MessageRole,
        text: impl Into<String>,
    ) -> MessageBuilder {
        MessageBuilder::new(sender, role, text)
    }

    /// Check the text invariants shared by construction and updates.
    pub fn validate_text(text: &str, max_text_length: Option<usize>) -> ChatResult<()> {
        if text.trim().is_empty() {
            return Err(ChatContextError::MessageTextEmpty);
        }
        if let Some(max) = max_text_length {
            let length = text.chars().count();
            if length > max {
                return Err(ChatContextError::MessageTooLong { length, max });
            }
        }
        Ok(())
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn parent_message_id(&self) -> Option<&MessageId> {
        self.parent_message_id.as_ref()
    }

    pub fn attachments(&self) -> &[Value] {
        &self.attachments
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Token cost used for budget accounting.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Build the replacement for this message with `patch` applied.
    ///
    /// Identity, sender, timestamp, role and parent carry over; fields the
    /// patch leaves unset keep their current value. The result goes through
    /// the same validation as a freshly built message.
    pub fn with_patch(&self, patch: MessagePatch, max_text_length: Option<usize>) -> ChatResult<Message> {
        MessageBuilder {
            message_id: Some(self.message_id.clone()),
            sender: self.sender.clone(),
            text: patch.text.unwrap_or_else(|| self.text.clone()),
            timestamp: Some(self.timestamp),
            role: self.role,
            parent_message_id: self.parent_message_id.clone(),
            attachments: patch.attachments.unwrap_or_else(|| self.attachments.clone()),
            metadata: patch.metadata.unwrap_or_else(|| self.metadata.clone()),
            total_tokens: patch.total_tokens.unwrap_or(self.total_tokens),
            max_text_length,
        }
        .build()
    }

    /// Copy of this message with its parent reference cleared.
    pub(crate) fn detached(&self) -> Message {
        Message {
            parent_message_id: None,
            ..self.clone()
        }
    }

    /// True when every field, not just the id, matches.
    pub fn same_content(&self, other: &Message) -> bool {
        self.message_id == other.message_id
            && self.sender == other.sender
            && self.text == other.text
            && self.timestamp == other.timestamp
            && self.role == other.role
            && self.parent_message_id == other.parent_message_id
            && self.attachments == other.attachments
            && self.metadata == other.metadata
            && self.total_tokens == other.total_tokens
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.message_id == other.message_id
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.message_id.hash(state);
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.timestamp.to_rfc3339(),
            self.role,
            self.sender,
            self.text
        )
    }
}

/// Builder for [`Message`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    message_id: Option<MessageId>,
    sender: SenderId,
    text: String,
    timestamp: Option<DateTime<Utc>>,
    role: MessageRole,
    parent_message_id: Option<MessageId>,
    attachments: Vec<Value>,
    metadata: Metadata,
    total_tokens: u64,
    max_text_length: Option<usize>,
}

impl MessageBuilder {
    /// Create a builder with the required fields.
    pub fn new(sender: impl Into<SenderId>, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            message_id: None,
            sender: sender.into(),
            text: text.into(),
            timestamp: None,
            role,
            parent_message_id: None,
            attachments: Vec::new(),
            metadata: Metadata::new(),
            total_tokens: 0,
            max_text_length: None,
        }
    }

    /// Use an explicit id instead of generating one.
    pub fn id(mut self, id: impl Into<MessageId>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Set the creation time. Required.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the message with the current time of `clock`.
    pub fn stamped_by(self, clock: &dyn Clock) -> Self {
        self.timestamp(clock.now())
    }

    /// Reply to another message in the same conversation.
    pub fn parent(mut self, parent_message_id: impl Into<MessageId>) -> Self {
        self.parent_message_id = Some(parent_message_id.into());
        self
    }

    /// Replace the attachment list.
    pub fn attachments(mut self, attachments: Vec<Value>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Append one attachment.
    pub fn attachment(mut self, attachment: Value) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Replace the metadata map.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert a single metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the token cost.
    pub fn total_tokens(mut self, total_tokens: u64) -> Self {
        self.total_tokens = total_tokens;
        self
    }

    /// Reject texts longer than `max` characters.
    pub fn max_text_length(mut self, max: Option<usize>) -> Self {
        self.max_text_length = max;
        self
    }

    /// Validate and produce the message.
    pub fn build(self) -> ChatResult<Message> {
        let message_id = self.message_id.unwrap_or_default();
        if message_id.is_blank() {
            return Err(ChatContextError::MessageIdRequired);
        }
        if self.sender.is_blank() {
            return Err(ChatContextError::SenderRequired);
        }
        Message::validate_text(&self.text, self.max_text_length)?;
        let timestamp = self.timestamp.ok_or(ChatContextError::TimestampRequired)?;

        Ok(Message {
            message_id,
            sender: self.sender,
            text: self.text,
            timestamp,
            role: self.role,
            parent_message_id: self.parent_message_id,
            attachments: self.attachments,
            metadata: self.metadata,
            total_tokens: self.total_tokens,
        })
    }
}

/// Field replacements for an update. Unset fields keep their prior value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub attachments: Option<Vec<Value>>,
    pub metadata: Option<Metadata>,
    pub total_tokens: Option<u64>,
}

impl MessagePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attachments(mut self, attachments: Vec<Value>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn total_tokens(mut self, total_tokens: u64) -> Self {
        self.total_tokens = Some(total_tokens);
        self
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.attachments.is_none()
            && self.metadata.is_none()
            && self.total_tokens.is_none()
    }
}
