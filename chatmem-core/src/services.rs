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

//! Service bundle shared by chat contexts

use crate::clock::{Clock, SystemClock};
use crate::expiration::MessageExpirationService;
use crate::strategy::ChatLimitsService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The limit pipeline, the expiration service and the clock, bundled.
///
/// Cheap to clone; all members are shared.
#[derive(Debug, Clone)]
pub struct ChatContextServices {
    limits_service: Arc<ChatLimitsService>,
    expiration_service: Arc<MessageExpirationService>,
    clock: Arc<dyn Clock>,
}

impl ChatContextServices {
    /// Bundle custom services.
    pub fn create(
        limits_service: ChatLimitsService,
        expiration_service: MessageExpirationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limits_service: Arc::new(limits_service),
            expiration_service: Arc::new(expiration_service),
            clock,
        }
    }

    /// Default strategies and expiration, driven by the system clock.
    pub fn create_default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Default strategies and expiration, driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::create(
            ChatLimitsService::with_default_strategies(),
            MessageExpirationService::with_clock(clock.clone()),
            clock,
        )
    }

    pub fn limits_service(&self) -> &ChatLimitsService {
        &self.limits_service
    }

    pub fn expiration_service(&self) -> &MessageExpirationService {
        &self.expiration_service
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time according to the bundled clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Default for ChatContextServices {
    fn default() -> Self {
        Self::create_default()
    }
}
