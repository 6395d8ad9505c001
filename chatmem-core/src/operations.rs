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

//! Message operations
//!
//! [`MessageOperationsService`] is the only place that mutates a
//! [`MessageCollection`] on behalf of a chat context. It checks parent
//! references, enforces text caps and runs the limit pipeline, then hands
//! back a new collection. On error the input collection is untouched.
//!
//! Every parent reference in a collection produced here resolves. When a
//! removal, eviction or expiry drops a message, replies to it keep their
//! place in the history but lose the parent reference.

use crate::collection::MessageCollection;
use crate::error::{ChatContextError, ChatResult};
use crate::ids::MessageId;
use crate::limits::ChatLimits;
use crate::message::{Message, MessagePatch};
use crate::services::ChatContextServices;
use std::collections::HashSet;

/// Validating mutation gateway over message collections.
#[derive(Debug, Clone, Default)]
pub struct MessageOperationsService {
    services: ChatContextServices,
    max_text_length: Option<usize>,
}

impl MessageOperationsService {
    /// Create a service over the given bundle.
    pub fn new(services: ChatContextServices) -> Self {
        Self {
            services,
            max_text_length: None,
        }
    }

    /// Cap message text at `max` characters on add and update.
    pub fn with_max_text_length(mut self, max: Option<usize>) -> Self {
        self.max_text_length = max;
        self
    }

    pub fn services(&self) -> &ChatContextServices {
        &self.services
    }

    pub fn max_text_length(&self) -> Option<usize> {
        self.max_text_length
    }

    /// Add `message`, then trim to `limits` when given.
    ///
    /// Fails with [`ChatContextError::MessageHasInvalidParentId`] when the
    /// message replies to a message that is not in `collection`.
    pub fn add_message(
        &self,
        message: Message,
        collection: &MessageCollection,
        limits: Option<&ChatLimits>,
    ) -> ChatResult<MessageCollection> {
        Message::validate_text(message.text(), self.max_text_length)?;

        if let Some(parent_id) = message.parent_message_id() {
            if !collection.contains(parent_id) {
                tracing::warn!(
                    message_id = %message.message_id(),
                    parent_id = %parent_id,
                    "Rejected message with unknown parent"
                );
                return Err(ChatContextError::MessageHasInvalidParentId {
                    message_id: message.message_id().clone(),
                    parent_id: parent_id.clone(),
                });
            }
        }

        let message_id = message.message_id().clone();
        let mut messages: Vec<Message> = collection
            .iter()
            .filter(|m| m.message_id() != &message_id)
            .cloned()
            .collect();
        messages.push(message);
        messages.sort_by_key(|m| m.timestamp());

        if let Some(limits) = limits {
            messages = self.services.limits_service().apply_limits(messages, limits);
        }

        let updated = Self::detach_orphans(MessageCollection::from_messages(messages));
        tracing::debug!(
            message_id = %message_id,
            before = collection.len(),
            after = updated.len(),
            total_tokens = updated.total_tokens(),
            "Added message"
        );
        Ok(updated)
    }

    /// Replace fields of an existing message.
    ///
    /// Identity, sender, timestamp, role and parent are preserved; the
    /// replacement is validated like a new message.
    pub fn update_message(
        &self,
        message_id: &MessageId,
        collection: &MessageCollection,
        patch: MessagePatch,
    ) -> ChatResult<MessageCollection> {
        let current = collection
            .get(message_id)
            .ok_or_else(|| ChatContextError::MessageNotFound(message_id.clone()))?;

        let updated_message = current.with_patch(patch, self.max_text_length)?;
        tracing::debug!(message_id = %message_id, "Updated message");
        Ok(collection.add(updated_message))
    }

    /// Remove one message; fails when it is absent.
    pub fn remove_message(
        &self,
        message_id: &MessageId,
        collection: &MessageCollection,
    ) -> ChatResult<MessageCollection> {
        let updated = Self::detach_orphans(collection.remove(message_id)?);
        tracing::debug!(message_id = %message_id, remaining = updated.len(), "Removed message");
        Ok(updated)
    }

    /// Remove whichever of `message_ids` are present. Never fails.
    pub fn remove_multiple_messages(
        &self,
        message_ids: &[MessageId],
        collection: &MessageCollection,
    ) -> MessageCollection {
        let existing = Self::filter_existing_message_ids(message_ids, collection);
        if existing.is_empty() {
            return collection.clone();
        }

        let updated = Self::detach_orphans(collection.partial_remove(&existing));
        tracing::debug!(
            requested = message_ids.len(),
            removed = collection.len() - updated.len(),
            "Removed messages"
        );
        updated
    }

    /// Drop messages older than `timeout` seconds; no-op when unset.
    pub fn remove_expired_messages(
        &self,
        collection: &MessageCollection,
        timeout: Option<u64>,
    ) -> MessageCollection {
        match timeout {
            Some(timeout) if timeout > 0 => Self::detach_orphans(
                self.services
                    .expiration_service()
                    .remove_expired_messages(collection, timeout),
            ),
            _ => collection.clone(),
        }
    }

    /// Look up a message; `None` when absent.
    pub fn get_message<'a>(
        &self,
        message_id: &MessageId,
        collection: &'a MessageCollection,
    ) -> Option<&'a Message> {
        collection.get(message_id)
    }

    /// Rebuild a collection from persisted messages.
    ///
    /// Every parent reference must resolve inside the restored set. A full
    /// history read from a collection built here always does.
    pub fn restore_messages(&self, messages: Vec<Message>) -> ChatResult<MessageCollection> {
        let restored = MessageCollection::restore(messages);
        for message in restored.iter() {
            if let Some(parent_id) = message.parent_message_id() {
                if !restored.contains(parent_id) {
                    return Err(ChatContextError::MessageHasInvalidParentId {
                        message_id: message.message_id().clone(),
                        parent_id: parent_id.clone(),
                    });
                }
            }
        }
        tracing::debug!(restored = restored.len(), "Restored history");
        Ok(restored)
    }

    /// Trim an existing collection to `limits`.
    pub fn enforce_limits(&self, collection: &MessageCollection, limits: &ChatLimits) -> MessageCollection {
        let kept = self
            .services
            .limits_service()
            .apply_limits(collection.messages().to_vec(), limits);
        if kept.len() == collection.len() {
            return collection.clone();
        }
        Self::detach_orphans(MessageCollection::from_messages(kept))
    }

    /// Clear parent references that no longer resolve inside `collection`.
    fn detach_orphans(collection: MessageCollection) -> MessageCollection {
        if !collection.iter().any(|m| Self::is_orphan(m, &collection)) {
            return collection;
        }

        let messages: Vec<Message> = collection
            .iter()
            .map(|m| {
                if Self::is_orphan(m, &collection) {
                    tracing::debug!(message_id = %m.message_id(), "Detached reply from removed parent");
                    m.detached()
                } else {
                    m.clone()
                }
            })
            .collect();
        MessageCollection::from_messages(messages)
    }

    fn is_orphan(message: &Message, collection: &MessageCollection) -> bool {
        message
            .parent_message_id()
            .is_some_and(|parent_id| !collection.contains(parent_id))
    }

    fn filter_existing_message_ids(message_ids: &[MessageId], collection: &MessageCollection) -> Vec<MessageId> {
        let mut seen = HashSet::new();
        message_ids
            .iter()
            .filter(|id| collection.contains(id) && seen.insert(*id))
            .cloned()
            .collect()
    }
}
