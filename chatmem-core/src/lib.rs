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

//! Chatmem Core
//!
//! Bounded conversational memory for chat agents:
//! - **Messages**: immutable, validated chat turns with token costs
//! - **Limits**: message-count, token-budget and time-to-live bounds
//! - **Eviction**: pluggable, priority-ordered limit strategies
//! - **Chat Context**: copy-on-write aggregate tying a conversation to its
//!   retained history
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       ChatContext                          │
//! │        (identity, limits, pending events, snapshot)        │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ every mutation
//! ┌─────────────────────────────▼─────────────────────────────┐
//! │                 MessageOperationsService                   │
//! │  parent checks · text caps · limit pipeline · expiration   │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌─────────┐  │
//! │  │ ChatLimitsService│  │ ExpirationService│  │  Clock  │  │
//! │  └──────────────────┘  └──────────────────┘  └─────────┘  │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ new snapshot
//! ┌─────────────────────────────▼─────────────────────────────┐
//! │                    MessageCollection                       │
//! │        (id-keyed, chronological, immutable)                │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use chatmem_core::{ChatContext, Message, MessageRole, SystemClock};
//!
//! # fn main() -> chatmem_core::ChatResult<()> {
//! let mut context = ChatContext::create("ctx-1", "agent-1", "user-1", Some(3), None, None)?;
//! for text in ["one", "two", "three", "four"] {
//!     let message = Message::builder("user-1", MessageRole::User, text)
//!         .stamped_by(&SystemClock)
//!         .total_tokens(1)
//!         .build()?;
//!     context = context.add_message(message)?;
//! }
//! assert_eq!(context.get_history(None, None).len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod expiration;
pub mod factory;
pub mod ids;
pub mod limits;
pub mod message;
pub mod operations;
pub mod services;
pub mod strategy;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::MessageCollection;
pub use config::{ChatContextConfig, LimitsConfig};
pub use context::{ChatContext, ChatContextSnapshot};
pub use error::{ChatContextError, ChatResult};
pub use events::ChatContextEvent;
pub use expiration::{DefaultExpirationStrategy, ExpirationStrategy, MessageExpirationService};
pub use factory::ChatContextFactory;
pub use ids::{AgentId, ContextId, MessageId, SenderId, UserId};
pub use limits::ChatLimits;
pub use message::{Message, MessageBuilder, MessagePatch, MessageRole, Metadata};
pub use operations::MessageOperationsService;
pub use services::ChatContextServices;
pub use strategy::{ChatLimitsService, LimitStrategy, MaxMessagesLimitStrategy, MaxTokensLimitStrategy};
