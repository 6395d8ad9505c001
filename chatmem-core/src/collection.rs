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

//! Message collection
//!
//! An immutable, id-keyed set of messages kept in chronological order.
//! Every mutating method returns a new collection and leaves `self`
//! untouched; clones share storage until the next mutation.
//!
//! The collection is a plain container. Parent references and limits are
//! enforced one layer up, in [`crate::operations::MessageOperationsService`].

use crate::error::{ChatContextError, ChatResult};
use crate::ids::MessageId;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    /// Sorted by timestamp; equal timestamps keep insertion order.
    messages: Vec<Message>,
    /// Position of every id in `messages`.
    index: HashMap<MessageId, usize>,
}

/// Ordered set of the messages retained for one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Message>", into = "Vec<Message>")]
pub struct MessageCollection {
    inner: Arc<Inner>,
}

impl MessageCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from messages in any order.
    ///
    /// A later message with an already-seen id replaces the earlier one.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut ordered: Vec<Message> = Vec::new();
        let mut seen: HashMap<MessageId, usize> = HashMap::new();

        for message in messages {
            match seen.get(message.message_id()) {
                Some(&pos) => ordered[pos] = message,
                None => {
                    seen.insert(message.message_id().clone(), ordered.len());
                    ordered.push(message);
                }
            }
        }

        // stable: ties keep input order
        ordered.sort_by_key(|m| m.timestamp());

        let index = ordered
            .iter()
            .enumerate()
            .map(|(pos, m)| (m.message_id().clone(), pos))
            .collect();

        Self {
            inner: Arc::new(Inner {
                messages: ordered,
                index,
            }),
        }
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.inner.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.messages.is_empty()
    }

    /// Sum of `total_tokens` over all messages.
    pub fn total_tokens(&self) -> u64 {
        self.inner.messages.iter().map(Message::total_tokens).sum()
    }

    /// Messages oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.inner.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.inner.messages.iter()
    }

    /// Ids oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &MessageId> + '_ {
        self.inner.messages.iter().map(Message::message_id)
    }

    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.inner.index.contains_key(message_id)
    }

    /// Look up a message; `None` when absent.
    pub fn get(&self, message_id: &MessageId) -> Option<&Message> {
        self.inner
            .index
            .get(message_id)
            .map(|&pos| &self.inner.messages[pos])
    }

    /// Insert a message, replacing any message with the same id.
    pub fn add(&self, message: Message) -> Self {
        Self::from_messages(self.inner.messages.iter().cloned().chain(Some(message)))
    }

    /// Remove one message; fails when the id is absent.
    pub fn remove(&self, message_id: &MessageId) -> ChatResult<Self> {
        if !self.contains(message_id) {
            return Err(ChatContextError::MessageNotFound(message_id.clone()));
        }
        Ok(self.retain(|m| m.message_id() != message_id))
    }

    /// Remove every listed id that is present; unknown ids are skipped.
    pub fn partial_remove(&self, message_ids: &[MessageId]) -> Self {
        let doomed: HashSet<&MessageId> = message_ids.iter().filter(|id| self.contains(id)).collect();
        if doomed.is_empty() {
            return self.clone();
        }
        self.retain(|m| !doomed.contains(m.message_id()))
    }

    /// An empty collection.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Chronological view of the most recent messages.
    ///
    /// Walks backwards from the newest message, stopping once `max_messages`
    /// are collected or the next message would push the running token total
    /// over `max_tokens`. A cap of zero is treated as no cap.
    pub fn get_history(&self, max_messages: Option<usize>, max_tokens: Option<u64>) -> Vec<Message> {
        let max_messages = max_messages.filter(|&n| n > 0);
        let max_tokens = max_tokens.filter(|&n| n > 0);

        let mut result: Vec<Message> = Vec::new();
        let mut token_count: u64 = 0;

        for message in self.inner.messages.iter().rev() {
            if max_messages.is_some_and(|max| result.len() >= max) {
                break;
            }
            let next = token_count.saturating_add(message.total_tokens());
            if max_tokens.is_some_and(|max| next > max) {
                break;
            }
            token_count = next;
            result.push(message.clone());
        }

        result.reverse();
        result
    }

    /// Replace the whole collection with `messages`, ordered by timestamp.
    pub fn restore(messages: impl IntoIterator<Item = Message>) -> Self {
        Self::from_messages(messages)
    }

    fn retain(&self, keep: impl Fn(&Message) -> bool) -> Self {
        Self::from_messages(self.inner.messages.iter().filter(|m| keep(m)).cloned())
    }
}

impl PartialEq for MessageCollection {
    /// Collections are equal when they hold the same messages with the same
    /// field values, in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.same_content(b))
    }
}

impl From<Vec<Message>> for MessageCollection {
    fn from(messages: Vec<Message>) -> Self {
        Self::restore(messages)
    }
}

impl From<MessageCollection> for Vec<Message> {
    fn from(collection: MessageCollection) -> Self {
        collection.inner.messages.clone()
    }
}

impl<'a> IntoIterator for &'a MessageCollection {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
