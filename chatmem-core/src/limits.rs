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

//! Chat limits value object

use crate::error::{ChatContextError, ChatResult};
use serde::{Deserialize, Serialize};

/// Bounds on the history retained by a chat context.
///
/// Every bound is optional; `None` means unbounded on that dimension. Set
/// bounds must be positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LimitsRecord")]
pub struct ChatLimits {
    max_messages: Option<usize>,
    max_tokens: Option<u64>,
    /// Time-to-live in seconds.
    timeout: Option<u64>,
}

#[derive(Deserialize)]
struct LimitsRecord {
    #[serde(default)]
    max_messages: Option<usize>,
    #[serde(default)]
    max_tokens: Option<u64>,
    #[serde(default)]
    timeout: Option<u64>,
}

impl TryFrom<LimitsRecord> for ChatLimits {
    type Error = ChatContextError;

    fn try_from(record: LimitsRecord) -> ChatResult<Self> {
        ChatLimits::new(record.max_messages, record.max_tokens, record.timeout)
    }
}

impl ChatLimits {
    /// Validate and create a set of limits.
    pub fn new(
        max_messages: Option<usize>,
        max_tokens: Option<u64>,
        timeout: Option<u64>,
    ) -> ChatResult<Self> {
        if max_messages == Some(0) {
            return Err(ChatContextError::MaxMessagesNotValid);
        }
        if max_tokens == Some(0) {
            return Err(ChatContextError::MaxTokensNotValid);
        }
        if timeout == Some(0) {
            return Err(ChatContextError::TimeoutNotValid);
        }
        Ok(Self {
            max_messages,
            max_tokens,
            timeout,
        })
    }

    /// Limits with every dimension unbounded.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_messages(&self) -> Option<usize> {
        self.max_messages
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.max_tokens
    }

    /// Time-to-live in seconds.
    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// True when no dimension is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.max_messages.is_none() && self.max_tokens.is_none() && self.timeout.is_none()
    }

    /// Produce new limits, keeping the current value for every `None`.
    pub fn update(
        &self,
        max_messages: Option<usize>,
        max_tokens: Option<u64>,
        timeout: Option<u64>,
    ) -> ChatResult<Self> {
        Self::new(
            max_messages.or(self.max_messages),
            max_tokens.or(self.max_tokens),
            timeout.or(self.timeout),
        )
    }
}
