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

//! Chat context factory
//!
//! Creates fresh contexts and rehydrates persisted ones, sharing one
//! [`MessageOperationsService`] between all contexts it produces.

use crate::collection::MessageCollection;
use crate::config::ChatContextConfig;
use crate::context::{ChatContext, ChatContextSnapshot};
use crate::error::ChatResult;
use crate::ids::{AgentId, ContextId, UserId};
use crate::limits::ChatLimits;
use crate::operations::MessageOperationsService;
use crate::services::ChatContextServices;
use std::sync::Arc;

/// Builds [`ChatContext`] values.
#[derive(Debug, Clone, Default)]
pub struct ChatContextFactory {
    operations: Arc<MessageOperationsService>,
    default_limits: ChatLimits,
}

impl ChatContextFactory {
    /// Factory over `operations` with unbounded default limits.
    pub fn new(operations: MessageOperationsService) -> Self {
        Self {
            operations: Arc::new(operations),
            default_limits: ChatLimits::unbounded(),
        }
    }

    /// Factory with default services, configured limits and text cap.
    pub fn from_config(config: &ChatContextConfig) -> ChatResult<Self> {
        Self::from_config_with_services(config, ChatContextServices::create_default())
    }

    /// Factory with custom services, configured limits and text cap.
    pub fn from_config_with_services(config: &ChatContextConfig, services: ChatContextServices) -> ChatResult<Self> {
        config.validate()?;
        let operations = MessageOperationsService::new(services).with_max_text_length(config.max_text_length);
        Ok(Self {
            operations: Arc::new(operations),
            default_limits: config.default_limits.to_limits()?,
        })
    }

    /// Limits used when `create` leaves a dimension unset.
    pub fn default_limits(&self) -> &ChatLimits {
        &self.default_limits
    }

    pub fn operations(&self) -> &MessageOperationsService {
        &self.operations
    }

    /// Create an empty context. Unset limits fall back to the factory
    /// defaults.
    pub fn create(
        &self,
        context_id: impl Into<ContextId>,
        agent_id: impl Into<AgentId>,
        user_id: impl Into<UserId>,
        max_messages: Option<usize>,
        max_tokens: Option<u64>,
        timeout: Option<u64>,
    ) -> ChatResult<ChatContext> {
        let context_id = context_id.into();
        let agent_id = agent_id.into();
        let user_id = user_id.into();
        ChatContext::validate_identity(&context_id, &agent_id, &user_id)?;

        let limits = self.default_limits.update(max_messages, max_tokens, timeout)?;
        let now = self.operations.services().now();

        tracing::debug!(
            context_id = %context_id,
            agent_id = %agent_id,
            user_id = %user_id,
            "Created chat context"
        );
        ChatContext::from_parts(
            context_id,
            agent_id,
            user_id,
            now,
            now,
            MessageCollection::new(),
            limits,
            Arc::clone(&self.operations),
        )
    }

    /// Rehydrate a context from persisted state.
    ///
    /// Validates identity, timestamps and every parent reference.
    pub fn restore(&self, snapshot: ChatContextSnapshot) -> ChatResult<ChatContext> {
        let ChatContextSnapshot {
            context_id,
            agent_id,
            user_id,
            created_at,
            updated_at,
            limits,
            messages,
        } = snapshot;

        let messages = self.operations.restore_messages(messages.into())?;
        let context = ChatContext::from_parts(
            context_id,
            agent_id,
            user_id,
            created_at,
            updated_at,
            messages,
            limits,
            Arc::clone(&self.operations),
        )?;

        tracing::debug!(
            context_id = %context.context_id(),
            messages = context.message_count(),
            "Restored chat context"
        );
        Ok(context)
    }

    /// Rehydrate a context from its JSON snapshot.
    pub fn restore_json(&self, json: &str) -> ChatResult<ChatContext> {
        let snapshot: ChatContextSnapshot = serde_json::from_str(json)?;
        self.restore(snapshot)
    }
}
