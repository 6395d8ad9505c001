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

//! Chat context aggregate
//!
//! A [`ChatContext`] binds one conversation (context, agent and user ids) to
//! its retained messages and limits. It is a copy-on-write value: every
//! mutating method borrows `self` and returns a new context with the same
//! identity and an advanced `updated_at`, so earlier snapshots stay valid.
//! All mutations go through [`MessageOperationsService`].
//!
//! Concurrent writers for the same conversation must be serialized by the
//! caller (for example with an optimistic check on `updated_at`); the
//! context itself does no locking.

use crate::collection::MessageCollection;
use crate::error::{ChatContextError, ChatResult};
use crate::events::ChatContextEvent;
use crate::factory::ChatContextFactory;
use crate::ids::{AgentId, ContextId, MessageId, UserId};
use crate::limits::ChatLimits;
use crate::message::{Message, MessagePatch};
use crate::operations::MessageOperationsService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One live conversation between a user and an agent.
#[derive(Debug, Clone)]
pub struct ChatContext {
    context_id: ContextId,
    agent_id: AgentId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    messages: MessageCollection,
    limits: ChatLimits,
    operations: Arc<MessageOperationsService>,
    events: Vec<ChatContextEvent>,
}

/// Serializable state of a chat context, for persistence layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContextSnapshot {
    pub context_id: ContextId,
    pub agent_id: AgentId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub limits: ChatLimits,
    #[serde(default)]
    pub messages: MessageCollection,
}

impl ChatContext {
    /// Create an empty context with default services.
    ///
    /// Fails when any identifier is blank or a limit is not positive.
    pub fn create(
        context_id: impl Into<ContextId>,
        agent_id: impl Into<AgentId>,
        user_id: impl Into<UserId>,
        max_messages: Option<usize>,
        max_tokens: Option<u64>,
        timeout: Option<u64>,
    ) -> ChatResult<Self> {
        ChatContextFactory::default().create(context_id, agent_id, user_id, max_messages, max_tokens, timeout)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        context_id: ContextId,
        agent_id: AgentId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        messages: MessageCollection,
        limits: ChatLimits,
        operations: Arc<MessageOperationsService>,
    ) -> ChatResult<Self> {
        Self::validate_identity(&context_id, &agent_id, &user_id)?;
        if updated_at < created_at {
            return Err(ChatContextError::InvalidTimestamps {
                created_at: created_at.to_rfc3339(),
                updated_at: updated_at.to_rfc3339(),
            });
        }

        Ok(Self {
            context_id,
            agent_id,
            user_id,
            created_at,
            updated_at,
            messages,
            limits,
            operations,
            events: Vec::new(),
        })
    }

    pub(crate) fn validate_identity(context_id: &ContextId, agent_id: &AgentId, user_id: &UserId) -> ChatResult<()> {
        if context_id.is_blank() {
            return Err(ChatContextError::ContextIdRequired);
        }
        if agent_id.is_blank() {
            return Err(ChatContextError::AgentIdRequired);
        }
        if user_id.is_blank() {
            return Err(ChatContextError::UserIdRequired);
        }
        Ok(())
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn limits(&self) -> &ChatLimits {
        &self.limits
    }

    /// The retained messages.
    pub fn messages(&self) -> &MessageCollection {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn total_tokens(&self) -> u64 {
        self.messages.total_tokens()
    }

    /// Look up a message; `None` when absent.
    pub fn get_message(&self, message_id: &MessageId) -> Option<&Message> {
        self.operations.get_message(message_id, &self.messages)
    }

    /// Chronological history, optionally narrowed to a smaller window.
    ///
    /// Read-only: `updated_at` does not move.
    pub fn get_history(&self, max_messages: Option<usize>, max_tokens: Option<u64>) -> Vec<Message> {
        self.messages.get_history(max_messages, max_tokens)
    }

    /// Events recorded since the last [`ChatContext::take_events`].
    pub fn pending_events(&self) -> &[ChatContextEvent] {
        &self.events
    }

    /// Split off the recorded events.
    pub fn take_events(mut self) -> (Self, Vec<ChatContextEvent>) {
        let events = std::mem::take(&mut self.events);
        (self, events)
    }

    /// Append a message and enforce the context limits.
    ///
    /// A message that the limits reject outright (for example one that
    /// alone exceeds the token budget) records no `MessageAdded` event.
    pub fn add_message(&self, message: Message) -> ChatResult<Self> {
        let message_id = message.message_id().clone();
        let updated = self
            .operations
            .add_message(message, &self.messages, Some(&self.limits))?;

        let now = self.now();
        let mut events = Vec::new();
        match updated.get(&message_id) {
            Some(stored) => events.push(ChatContextEvent::MessageAdded {
                context_id: self.context_id.clone(),
                timestamp: now,
                message: stored.clone(),
            }),
            None => tracing::info!(
                context_id = %self.context_id,
                message_id = %message_id,
                "Message did not fit the chat limits"
            ),
        }

        let evicted = self.dropped_from(&updated);
        if !evicted.is_empty() {
            tracing::info!(
                context_id = %self.context_id,
                evicted = evicted.len(),
                "Evicted messages to satisfy chat limits"
            );
            events.push(ChatContextEvent::MessagesEvicted {
                context_id: self.context_id.clone(),
                timestamp: now,
                evicted,
            });
        }

        Ok(self.next(updated, self.limits, events, now))
    }

    /// Replace fields of an existing message.
    pub fn update_message(&self, message_id: &MessageId, patch: MessagePatch) -> ChatResult<Self> {
        let updated = self.operations.update_message(message_id, &self.messages, patch)?;

        let now = self.now();
        let mut events = Vec::new();
        if let (Some(old_message), Some(new_message)) = (self.messages.get(message_id), updated.get(message_id)) {
            events.push(ChatContextEvent::MessageUpdated {
                context_id: self.context_id.clone(),
                timestamp: now,
                message_id: message_id.clone(),
                old_message: old_message.clone(),
                new_message: new_message.clone(),
            });
        }

        Ok(self.next(updated, self.limits, events, now))
    }

    /// Remove one message; fails when it is absent.
    pub fn remove_message(&self, message_id: &MessageId) -> ChatResult<Self> {
        let updated = self.operations.remove_message(message_id, &self.messages)?;

        let now = self.now();
        let events = self
            .messages
            .get(message_id)
            .map(|removed| ChatContextEvent::MessageRemoved {
                context_id: self.context_id.clone(),
                timestamp: now,
                removed_message: removed.clone(),
            })
            .into_iter()
            .collect();

        Ok(self.next(updated, self.limits, events, now))
    }

    /// Remove whichever of `message_ids` are present. Never fails.
    pub fn partial_remove(&self, message_ids: &[MessageId]) -> Self {
        let updated = self.operations.remove_multiple_messages(message_ids, &self.messages);

        let now = self.now();
        let removed = self.dropped_from(&updated);
        let events = if removed.is_empty() {
            Vec::new()
        } else {
            vec![ChatContextEvent::MessagesRemoved {
                context_id: self.context_id.clone(),
                timestamp: now,
                removed_messages: removed,
            }]
        };

        self.next(updated, self.limits, events, now)
    }

    /// Drop every message.
    pub fn clear_history(&self) -> Self {
        let now = self.now();
        let events = if self.messages.is_empty() {
            Vec::new()
        } else {
            vec![ChatContextEvent::HistoryCleared {
                context_id: self.context_id.clone(),
                timestamp: now,
                removed_messages: self.messages.messages().to_vec(),
            }]
        };
        tracing::debug!(context_id = %self.context_id, cleared = self.messages.len(), "Cleared history");

        self.next(self.messages.clear(), self.limits, events, now)
    }

    /// Replace the history with persisted messages.
    pub fn restore_history(&self, messages: Vec<Message>) -> ChatResult<Self> {
        let restored = self.operations.restore_messages(messages)?;

        let now = self.now();
        let events = vec![ChatContextEvent::HistoryRestored {
            context_id: self.context_id.clone(),
            timestamp: now,
            restored_messages: restored.messages().to_vec(),
        }];

        Ok(self.next(restored, self.limits, events, now))
    }

    /// Drop messages older than the context timeout.
    pub fn remove_expired(&self) -> Self {
        let updated = self
            .operations
            .remove_expired_messages(&self.messages, self.limits.timeout());

        let now = self.now();
        let expired = self.dropped_from(&updated);
        let events = if expired.is_empty() {
            Vec::new()
        } else {
            vec![ChatContextEvent::ExpiredMessagesRemoved {
                context_id: self.context_id.clone(),
                timestamp: now,
                expired_messages: expired,
            }]
        };

        self.next(updated, self.limits, events, now)
    }

    /// Change limits (unset arguments keep their value) and enforce them.
    pub fn update_limits(
        &self,
        max_messages: Option<usize>,
        max_tokens: Option<u64>,
        timeout: Option<u64>,
    ) -> ChatResult<Self> {
        let limits = self.limits.update(max_messages, max_tokens, timeout)?;
        let updated = self.operations.enforce_limits(&self.messages, &limits);

        let now = self.now();
        let mut events = vec![ChatContextEvent::LimitsUpdated {
            context_id: self.context_id.clone(),
            timestamp: now,
            old_limits: self.limits,
            new_limits: limits,
        }];
        let evicted = self.dropped_from(&updated);
        if !evicted.is_empty() {
            events.push(ChatContextEvent::MessagesEvicted {
                context_id: self.context_id.clone(),
                timestamp: now,
                evicted,
            });
        }
        tracing::debug!(
            context_id = %self.context_id,
            max_messages = ?limits.max_messages(),
            max_tokens = ?limits.max_tokens(),
            timeout = ?limits.timeout(),
            "Updated chat limits"
        );

        Ok(self.next(updated, limits, events, now))
    }

    /// Serializable copy of the current state.
    pub fn snapshot(&self) -> ChatContextSnapshot {
        ChatContextSnapshot {
            context_id: self.context_id.clone(),
            agent_id: self.agent_id.clone(),
            user_id: self.user_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            limits: self.limits,
            messages: self.messages.clone(),
        }
    }

    /// JSON form of [`ChatContext::snapshot`].
    pub fn to_json(&self) -> ChatResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    fn now(&self) -> DateTime<Utc> {
        self.operations.services().now()
    }

    /// Messages present here but missing from `after`.
    fn dropped_from(&self, after: &MessageCollection) -> Vec<Message> {
        let kept: HashSet<&MessageId> = after.ids().collect();
        self.messages
            .iter()
            .filter(|m| !kept.contains(m.message_id()))
            .cloned()
            .collect()
    }

    fn next(
        &self,
        messages: MessageCollection,
        limits: ChatLimits,
        new_events: Vec<ChatContextEvent>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut events = self.events.clone();
        events.extend(new_events);

        Self {
            context_id: self.context_id.clone(),
            agent_id: self.agent_id.clone(),
            user_id: self.user_id.clone(),
            created_at: self.created_at,
            // never moves backwards, even with a rewound clock
            updated_at: now.max(self.updated_at),
            messages,
            limits,
            operations: Arc::clone(&self.operations),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::message::MessageRole;
    use crate::services::ChatContextServices;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 14, 10, 0, 0).unwrap()
    }

    fn setup(max_messages: Option<usize>, max_tokens: Option<u64>, timeout: Option<u64>) -> (Arc<ManualClock>, ChatContext) {
        let clock = Arc::new(ManualClock::new(start()));
        let operations = MessageOperationsService::new(ChatContextServices::with_clock(clock.clone()));
        let factory = ChatContextFactory::new(operations);
        let context = factory
            .create("ctx-1", "agent-1", "user-1", max_messages, max_tokens, timeout)
            .unwrap();
        (clock, context)
    }

    fn msg(clock: &ManualClock, id: &str, tokens: u64) -> Message {
        clock.advance(Duration::seconds(1));
        Message::builder("user-1", MessageRole::User, format!("message {}", id))
            .id(id)
            .timestamp(clock.now())
            .total_tokens(tokens)
            .build()
            .unwrap()
    }

    fn history_ids(context: &ChatContext) -> Vec<String> {
        context
            .get_history(None, None)
            .iter()
            .map(|m| m.message_id().to_string())
            .collect()
    }

    #[test]
    fn test_create_requires_ids() {
        assert_eq!(
            ChatContext::create("ctx", "", "user", None, None, None).unwrap_err(),
            ChatContextError::AgentIdRequired
        );
        assert_eq!(
            ChatContext::create("ctx", "agent", " ", None, None, None).unwrap_err(),
            ChatContextError::UserIdRequired
        );
        assert_eq!(
            ChatContext::create("", "agent", "user", None, None, None).unwrap_err(),
            ChatContextError::ContextIdRequired
        );
        assert!(matches!(
            ChatContext::create("ctx", "agent", "user", Some(0), None, None),
            Err(ChatContextError::MaxMessagesNotValid)
        ));
    }

    #[test]
    fn test_create_sets_fields() {
        let (_, context) = setup(Some(10), Some(100), Some(60));
        assert_eq!(context.context_id().as_str(), "ctx-1");
        assert_eq!(context.agent_id().as_str(), "agent-1");
        assert_eq!(context.user_id().as_str(), "user-1");
        assert_eq!(context.created_at(), start());
        assert_eq!(context.updated_at(), start());
        assert_eq!(context.limits().max_messages(), Some(10));
        assert_eq!(context.message_count(), 0);
        assert!(context.pending_events().is_empty());
    }

    #[test]
    fn test_add_message_and_get_history() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 2)).unwrap();
        let history = context.get_history(None, None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text(), "message m1");
        assert_eq!(context.total_tokens(), 2);
    }

    #[test]
    fn test_add_message_bumps_updated_at_and_keeps_identity() {
        let (clock, context) = setup(None, None, None);
        let next = context.add_message(msg(&clock, "m1", 1)).unwrap();

        assert_eq!(next.updated_at(), start() + Duration::seconds(1));
        assert_eq!(next.created_at(), context.created_at());
        assert_eq!(next.context_id(), context.context_id());
        // old snapshot untouched
        assert_eq!(context.message_count(), 0);
        assert_eq!(context.updated_at(), start());
    }

    #[test]
    fn test_add_message_evicts_oldest() {
        let (clock, mut context) = setup(Some(3), None, None);
        for id in ["m1", "m2", "m3", "m4"] {
            context = context.add_message(msg(&clock, id, 1)).unwrap();
        }
        assert_eq!(history_ids(&context), vec!["m2", "m3", "m4"]);

        let (_, events) = context.take_events();
        let evicted: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChatContextEvent::MessagesEvicted { evicted, .. } => Some(evicted.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0][0].message_id().as_str(), "m1");
    }

    #[test]
    fn test_add_message_invalid_parent_leaves_context() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        let orphan = Message::builder("agent-1", MessageRole::Agent, "reply")
            .parent("nope")
            .stamped_by(clock.as_ref())
            .build()
            .unwrap();

        let err = context.add_message(orphan).unwrap_err();
        assert!(matches!(err, ChatContextError::MessageHasInvalidParentId { .. }));
        assert_eq!(context.message_count(), 1);
    }

    #[test]
    fn test_add_message_over_budget_records_only_eviction() {
        let (clock, context) = setup(None, Some(5), None);
        let context = context.add_message(msg(&clock, "small", 2)).unwrap();
        let (context, _) = context.take_events();

        let context = context.add_message(msg(&clock, "huge", 9)).unwrap();
        assert_eq!(context.message_count(), 0);

        let kinds: Vec<_> = context.pending_events().iter().map(ChatContextEvent::kind).collect();
        assert_eq!(kinds, vec!["messages_evicted"]);
        match &context.pending_events()[0] {
            ChatContextEvent::MessagesEvicted { evicted, .. } => {
                assert_eq!(evicted.len(), 1);
                assert_eq!(evicted[0].message_id().as_str(), "small");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_reply_survives_parent_eviction() {
        let (clock, context) = setup(Some(2), None, None);
        let question = msg(&clock, "q", 1);
        clock.advance(Duration::seconds(1));
        let answer = Message::builder("agent-1", MessageRole::Agent, "answer")
            .id("r")
            .parent("q")
            .stamped_by(clock.as_ref())
            .build()
            .unwrap();

        let context = context
            .add_message(question)
            .unwrap()
            .add_message(answer)
            .unwrap()
            .add_message(msg(&clock, "s", 1))
            .unwrap();

        assert_eq!(history_ids(&context), vec!["r", "s"]);
        let reply = context.get_message(&MessageId::from("r")).unwrap();
        assert!(reply.parent_message_id().is_none());
        assert_eq!(reply.text(), "answer");

        let restored = context.restore_history(context.get_history(None, None)).unwrap();
        assert_eq!(restored.messages(), context.messages());
    }

    #[test]
    fn test_get_history_does_not_touch() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        let before = context.updated_at();
        clock.advance(Duration::seconds(30));
        let _ = context.get_history(Some(1), None);
        assert_eq!(context.updated_at(), before);
    }

    #[test]
    fn test_get_history_window_independent_of_limits() {
        let (clock, mut context) = setup(Some(10), None, None);
        for id in ["a", "b", "c"] {
            context = context.add_message(msg(&clock, id, 1)).unwrap();
        }
        let window: Vec<_> = context
            .get_history(Some(2), None)
            .iter()
            .map(|m| m.message_id().to_string())
            .collect();
        assert_eq!(window, vec!["b", "c"]);
    }

    #[test]
    fn test_update_message() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        let id = MessageId::from("m1");

        let updated = context
            .update_message(&id, MessagePatch::new().text("edited").total_tokens(9))
            .unwrap();
        assert_eq!(updated.get_message(&id).unwrap().text(), "edited");
        assert_eq!(updated.total_tokens(), 9);
        assert!(matches!(
            updated.pending_events().last(),
            Some(ChatContextEvent::MessageUpdated { .. })
        ));

        let err = context
            .update_message(&MessageId::from("missing"), MessagePatch::new().text("x"))
            .unwrap_err();
        assert!(matches!(err, ChatContextError::MessageNotFound(_)));
    }

    #[test]
    fn test_remove_message() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();

        let removed = context.remove_message(&MessageId::from("m1")).unwrap();
        assert_eq!(removed.message_count(), 0);

        let err = removed.remove_message(&MessageId::from("m1")).unwrap_err();
        assert_eq!(err, ChatContextError::MessageNotFound(MessageId::from("m1")));
    }

    #[test]
    fn test_partial_remove() {
        let (clock, mut context) = setup(None, None, None);
        for id in ["m1", "m2", "m3"] {
            context = context.add_message(msg(&clock, id, 1)).unwrap();
        }
        let (context, _) = context.take_events();

        let context = context.partial_remove(&[MessageId::from("m2"), MessageId::from("ghost")]);
        assert_eq!(history_ids(&context), vec!["m1", "m3"]);
        assert_eq!(context.pending_events().len(), 1);

        let again = context.partial_remove(&[MessageId::from("m2")]);
        assert_eq!(history_ids(&again), vec!["m1", "m3"]);
        // nothing removed, nothing recorded
        assert_eq!(again.pending_events().len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        let cleared = context.clear_history();
        assert_eq!(cleared.message_count(), 0);
        assert_eq!(context.message_count(), 1);
        assert!(matches!(
            cleared.pending_events().last(),
            Some(ChatContextEvent::HistoryCleared { .. })
        ));
    }

    #[test]
    fn test_restore_history_orders_by_timestamp() {
        let (clock, context) = setup(None, None, None);
        let first = msg(&clock, "restore1", 1);
        let second = msg(&clock, "restore2", 1);

        let context = context.restore_history(vec![second, first]).unwrap();
        let history = context.get_history(None, None);
        assert_eq!(history[0].text(), "message restore1");
        assert_eq!(history[1].text(), "message restore2");
    }

    #[test]
    fn test_remove_expired() {
        let (clock, mut context) = setup(None, None, Some(10));
        context = context.add_message(msg(&clock, "old", 1)).unwrap();
        clock.advance(Duration::seconds(5));
        context = context.add_message(msg(&clock, "new", 1)).unwrap();

        clock.advance(Duration::seconds(6));
        let context = context.remove_expired();
        assert_eq!(history_ids(&context), vec!["new"]);
        assert!(matches!(
            context.pending_events().last(),
            Some(ChatContextEvent::ExpiredMessagesRemoved { .. })
        ));
    }

    #[test]
    fn test_remove_expired_without_timeout() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        clock.advance(Duration::days(365));
        assert_eq!(context.remove_expired().message_count(), 1);
    }

    #[test]
    fn test_update_limits_enforces_immediately() {
        let (clock, mut context) = setup(None, None, Some(60));
        for id in ["a", "b", "c", "d"] {
            context = context.add_message(msg(&clock, id, 1)).unwrap();
        }

        let context = context.update_limits(Some(2), None, None).unwrap();
        assert_eq!(history_ids(&context), vec!["c", "d"]);
        assert_eq!(context.limits().max_messages(), Some(2));
        assert_eq!(context.limits().timeout(), Some(60));

        assert!(context.update_limits(None, Some(0), None).is_err());
    }

    #[test]
    fn test_updated_at_is_monotonic() {
        let (clock, context) = setup(None, None, None);
        let context = context.add_message(msg(&clock, "m1", 1)).unwrap();
        let stamp = context.updated_at();

        clock.set(start() - Duration::hours(1));
        let context = context.clear_history();
        assert_eq!(context.updated_at(), stamp);
        assert!(context.updated_at() >= context.created_at());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (clock, context) = setup(Some(5), None, None);
        let context = context.add_message(msg(&clock, "m1", 3)).unwrap();

        let json = serde_json::to_string(&context.snapshot()).unwrap();
        let snapshot: ChatContextSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, context.snapshot());
    }
}
