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

//! Message expiration
//!
//! Removes messages older than a time-to-live. Both the time source and the
//! expiry predicate are injected so the service stays deterministic under
//! test.

use crate::clock::{Clock, SystemClock};
use crate::collection::MessageCollection;
use crate::ids::MessageId;
use crate::message::Message;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// Largest timeout representable as a chrono duration.
const MAX_TIMEOUT_SECS: i64 = i64::MAX / 1_000;

/// Decides whether a message has outlived its timeout.
pub trait ExpirationStrategy: Send + Sync {
    fn is_expired(&self, message: &Message, now: DateTime<Utc>, timeout_secs: u64) -> bool;
}

/// Expired when strictly more than `timeout_secs` have elapsed since the
/// message timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpirationStrategy;

impl ExpirationStrategy for DefaultExpirationStrategy {
    fn is_expired(&self, message: &Message, now: DateTime<Utc>, timeout_secs: u64) -> bool {
        let secs = i64::try_from(timeout_secs).unwrap_or(i64::MAX).min(MAX_TIMEOUT_SECS);
        let timeout = Duration::seconds(secs);
        now.signed_duration_since(message.timestamp()) > timeout
    }
}

/// Removes expired messages from a collection.
pub struct MessageExpirationService {
    clock: Arc<dyn Clock>,
    strategy: Box<dyn ExpirationStrategy>,
}

impl MessageExpirationService {
    /// Create a service with an explicit clock and strategy.
    pub fn new(clock: Arc<dyn Clock>, strategy: Box<dyn ExpirationStrategy>) -> Self {
        Self { clock, strategy }
    }

    /// Default strategy driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Box::new(DefaultExpirationStrategy))
    }

    /// Ids of every message that has expired at the current time.
    pub fn expired_ids(&self, collection: &MessageCollection, timeout_secs: u64) -> Vec<MessageId> {
        let now = self.clock.now();
        collection
            .iter()
            .filter(|m| self.strategy.is_expired(m, now, timeout_secs))
            .map(|m| m.message_id().clone())
            .collect()
    }

    /// Drop expired messages; a zero timeout disables expiration.
    pub fn remove_expired_messages(&self, collection: &MessageCollection, timeout_secs: u64) -> MessageCollection {
        if timeout_secs == 0 {
            return collection.clone();
        }

        let expired = self.expired_ids(collection, timeout_secs);
        if expired.is_empty() {
            return collection.clone();
        }

        tracing::info!(
            expired = expired.len(),
            remaining = collection.len() - expired.len(),
            timeout_secs,
            "Removing expired messages"
        );
        collection.partial_remove(&expired)
    }
}

impl Default for MessageExpirationService {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl fmt::Debug for MessageExpirationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageExpirationService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::message::MessageRole;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn aged(id: &str, age_secs: i64) -> Message {
        Message::builder("user-1", MessageRole::User, "hi")
            .id(id)
            .timestamp(now() - Duration::seconds(age_secs))
            .build()
            .unwrap()
    }

    fn service() -> MessageExpirationService {
        MessageExpirationService::with_clock(Arc::new(ManualClock::new(now())))
    }

    #[test]
    fn test_expiration_boundary() {
        let c = MessageCollection::from_messages(vec![aged("old", 11), aged("fresh", 9), aged("edge", 10)]);
        let out = service().remove_expired_messages(&c, 10);

        assert!(!out.contains(&MessageId::from("old")));
        assert!(out.contains(&MessageId::from("fresh")));
        // exactly at the timeout is not expired
        assert!(out.contains(&MessageId::from("edge")));
    }

    #[test]
    fn test_zero_timeout_is_noop() {
        let c = MessageCollection::from_messages(vec![aged("old", 1_000)]);
        assert_eq!(service().remove_expired_messages(&c, 0), c);
    }

    #[test]
    fn test_large_timeout_keeps_everything() {
        let c = MessageCollection::from_messages(vec![aged("old", 86_400)]);
        assert_eq!(service().remove_expired_messages(&c, u64::MAX).len(), 1);
    }

    #[test]
    fn test_clock_is_injected() {
        let clock = Arc::new(ManualClock::new(now()));
        let service = MessageExpirationService::with_clock(clock.clone());
        let c = MessageCollection::from_messages(vec![aged("m", 0)]);

        assert_eq!(service.remove_expired_messages(&c, 60).len(), 1);
        clock.advance(Duration::seconds(61));
        assert!(service.remove_expired_messages(&c, 60).is_empty());
    }

    struct ExpireEverything;

    impl ExpirationStrategy for ExpireEverything {
        fn is_expired(&self, _message: &Message, _now: DateTime<Utc>, _timeout_secs: u64) -> bool {
            true
        }
    }

    #[test]
    fn test_custom_strategy() {
        let service = MessageExpirationService::new(Arc::new(ManualClock::new(now())), Box::new(ExpireEverything));
        let c = MessageCollection::from_messages(vec![aged("a", 0), aged("b", 1)]);
        assert!(service.remove_expired_messages(&c, 3600).is_empty());
    }
}
