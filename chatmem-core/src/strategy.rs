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

//! Limit strategies
//!
//! Each [`LimitStrategy`] trims a chronological message sequence along one
//! dimension of [`ChatLimits`]. [`ChatLimitsService`] runs a set of them in
//! priority order (lowest first). The default order trims by message count
//! before trimming by tokens; the token pass can only drop messages, so the
//! count bound still holds afterwards.

use crate::limits::ChatLimits;
use crate::message::Message;
use std::fmt;

/// Priority of [`MaxMessagesLimitStrategy`].
pub const MAX_MESSAGES_PRIORITY: u32 = 10;
/// Priority of [`MaxTokensLimitStrategy`].
pub const MAX_TOKENS_PRIORITY: u32 = 20;
/// Priority for strategies that do not pick one.
pub const DEFAULT_PRIORITY: u32 = 100;

/// A policy that enforces one dimension of the chat limits.
pub trait LimitStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Lower runs earlier.
    fn priority(&self) -> u32 {
        DEFAULT_PRIORITY
    }

    /// Trim `messages` (oldest first) so they satisfy this dimension.
    ///
    /// Must be a no-op when the dimension is unbounded or already satisfied,
    /// and must return messages oldest first.
    fn apply(&self, messages: Vec<Message>, limits: &ChatLimits) -> Vec<Message>;
}

/// Keeps only the most recent `max_messages` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxMessagesLimitStrategy;

impl LimitStrategy for MaxMessagesLimitStrategy {
    fn name(&self) -> &'static str {
        "max_messages"
    }

    fn priority(&self) -> u32 {
        MAX_MESSAGES_PRIORITY
    }

    fn apply(&self, mut messages: Vec<Message>, limits: &ChatLimits) -> Vec<Message> {
        match limits.max_messages() {
            Some(max) if messages.len() > max => {
                let excess = messages.len() - max;
                messages.drain(..excess);
                messages
            }
            _ => messages,
        }
    }
}

/// Keeps the longest run of most recent messages that fits the token budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxTokensLimitStrategy;

impl LimitStrategy for MaxTokensLimitStrategy {
    fn name(&self) -> &'static str {
        "max_tokens"
    }

    fn priority(&self) -> u32 {
        MAX_TOKENS_PRIORITY
    }

    fn apply(&self, mut messages: Vec<Message>, limits: &ChatLimits) -> Vec<Message> {
        let Some(max_tokens) = limits.max_tokens() else {
            return messages;
        };
        let total: u64 = messages.iter().map(Message::total_tokens).sum();
        if total <= max_tokens {
            return messages;
        }

        // stable: equal timestamps keep input order
        messages.sort_by_key(|m| m.timestamp());

        let mut kept = Vec::new();
        let mut accumulated: u64 = 0;
        for message in messages.into_iter().rev() {
            let next = accumulated.saturating_add(message.total_tokens());
            if next > max_tokens {
                break;
            }
            accumulated = next;
            kept.push(message);
        }
        kept.reverse();
        kept
    }
}

/// Applies an ordered set of limit strategies.
pub struct ChatLimitsService {
    strategies: Vec<Box<dyn LimitStrategy>>,
}

impl ChatLimitsService {
    /// Create a service; strategies are sorted by priority (stable).
    pub fn new(mut strategies: Vec<Box<dyn LimitStrategy>>) -> Self {
        strategies.sort_by_key(|s| s.priority());
        Self { strategies }
    }

    /// Message-count trimming followed by token trimming.
    pub fn with_default_strategies() -> Self {
        Self::new(vec![
            Box::new(MaxMessagesLimitStrategy),
            Box::new(MaxTokensLimitStrategy),
        ])
    }

    /// Strategy names in the order they run.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy in order and return what survives.
    pub fn apply_limits(&self, messages: Vec<Message>, limits: &ChatLimits) -> Vec<Message> {
        self.strategies.iter().fold(messages, |messages, strategy| {
            let before = messages.len();
            let trimmed = strategy.apply(messages, limits);
            if trimmed.len() != before {
                tracing::trace!(
                    strategy = strategy.name(),
                    before,
                    after = trimmed.len(),
                    "Limit strategy trimmed messages"
                );
            }
            trimmed
        })
    }
}

impl Default for ChatLimitsService {
    fn default() -> Self {
        Self::with_default_strategies()
    }
}

impl fmt::Debug for ChatLimitsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatLimitsService")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
