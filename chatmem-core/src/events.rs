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

//! Chat context domain events
//!
//! Every successful mutation of a [`crate::ChatContext`] records what
//! changed. Persistence or notification layers drain them with
//! [`crate::ChatContext::take_events`].

use crate::ids::{ContextId, MessageId};
use crate::limits::ChatLimits;
use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something that happened to a chat context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContextEvent {
    MessageAdded {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        message: Message,
    },
    /// Messages dropped by the limit pipeline.
    MessagesEvicted {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        evicted: Vec<Message>,
    },
    MessageUpdated {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        message_id: MessageId,
        old_message: Message,
        new_message: Message,
    },
    MessageRemoved {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        removed_message: Message,
    },
    MessagesRemoved {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        removed_messages: Vec<Message>,
    },
    HistoryCleared {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        removed_messages: Vec<Message>,
    },
    ExpiredMessagesRemoved {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        expired_messages: Vec<Message>,
    },
    LimitsUpdated {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        old_limits: ChatLimits,
        new_limits: ChatLimits,
    },
    HistoryRestored {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
        restored_messages: Vec<Message>,
    },
}

impl ChatContextEvent {
    /// Conversation the event belongs to.
    pub fn context_id(&self) -> &ContextId {
        match self {
            ChatContextEvent::MessageAdded { context_id, .. }
            | ChatContextEvent::MessagesEvicted { context_id, .. }
            | ChatContextEvent::MessageUpdated { context_id, .. }
            | ChatContextEvent::MessageRemoved { context_id, .. }
            | ChatContextEvent::MessagesRemoved { context_id, .. }
            | ChatContextEvent::HistoryCleared { context_id, .. }
            | ChatContextEvent::ExpiredMessagesRemoved { context_id, .. }
            | ChatContextEvent::LimitsUpdated { context_id, .. }
            | ChatContextEvent::HistoryRestored { context_id, .. } => context_id,
        }
    }

    /// When the event was recorded.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatContextEvent::MessageAdded { timestamp, .. }
            | ChatContextEvent::MessagesEvicted { timestamp, .. }
            | ChatContextEvent::MessageUpdated { timestamp, .. }
            | ChatContextEvent::MessageRemoved { timestamp, .. }
            | ChatContextEvent::MessagesRemoved { timestamp, .. }
            | ChatContextEvent::HistoryCleared { timestamp, .. }
            | ChatContextEvent::ExpiredMessagesRemoved { timestamp, .. }
            | ChatContextEvent::LimitsUpdated { timestamp, .. }
            | ChatContextEvent::HistoryRestored { timestamp, .. } => *timestamp,
        }
    }

    /// Event name as serialized in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatContextEvent::MessageAdded { .. } => "message_added",
            ChatContextEvent::MessagesEvicted { .. } => "messages_evicted",
            ChatContextEvent::MessageUpdated { .. } => "message_updated",
            ChatContextEvent::MessageRemoved { .. } => "message_removed",
            ChatContextEvent::MessagesRemoved { .. } => "messages_removed",
            ChatContextEvent::HistoryCleared { .. } => "history_cleared",
            ChatContextEvent::ExpiredMessagesRemoved { .. } => "expired_messages_removed",
            ChatContextEvent::LimitsUpdated { .. } => "limits_updated",
            ChatContextEvent::HistoryRestored { .. } => "history_restored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    #[test]
    fn test_event_tag_matches_kind() {
        let message = Message::builder("u", MessageRole::User, "hi").build().unwrap();
        let event = ChatContextEvent::MessageAdded {
            context_id: ContextId::from("ctx"),
            timestamp: Utc::now(),
            message,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(event.context_id().as_str(), "ctx");

        let back: ChatContextEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), "message_added");
    }

    #[test]
    fn test_limits_event_serializes_limits() {
        let event = ChatContextEvent::LimitsUpdated {
            context_id: ContextId::from("ctx"),
            timestamp: Utc::now(),
            old_limits: ChatLimits::unbounded(),
            new_limits: ChatLimits::new(Some(5), None, Some(30)).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["new_limits"]["max_messages"], 5);
        assert_eq!(json["new_limits"]["timeout"], 30);
    }
}
