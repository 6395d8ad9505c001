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

//! Chat context configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! max_text_length = 8000
//!
//! [default_limits]
//! max_messages = 50
//! max_tokens = 8000
//! timeout_secs = 1800
//! ```

use crate::error::{ChatContextError, ChatResult};
use crate::limits::ChatLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for chat contexts created by a factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContextConfig {
    /// Limits applied to contexts that do not set their own.
    #[serde(default)]
    pub default_limits: LimitsConfig,

    /// Maximum message text length in characters (unset = unlimited).
    #[serde(default)]
    pub max_text_length: Option<usize>,
}

/// Limit section of the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum retained messages (unset = unlimited).
    #[serde(default)]
    pub max_messages: Option<usize>,

    /// Maximum retained tokens (unset = unlimited).
    #[serde(default)]
    pub max_tokens: Option<u64>,

    /// Message time-to-live in seconds (unset = never expire).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl LimitsConfig {
    /// Validate into [`ChatLimits`].
    pub fn to_limits(&self) -> ChatResult<ChatLimits> {
        ChatLimits::new(self.max_messages, self.max_tokens, self.timeout_secs)
    }
}

impl ChatContextConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ChatResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ChatResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatContextError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded chat context config");
        Ok(config)
    }

    /// Fail fast on bounds that `ChatLimits` would reject.
    pub fn validate(&self) -> ChatResult<()> {
        self.default_limits.to_limits()?;
        if self.max_text_length == Some(0) {
            return Err(ChatContextError::ConfigError(
                "max_text_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the default limits.
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.default_limits = limits;
        self
    }

    /// Set the text cap.
    pub fn with_max_text_length(mut self, max: Option<usize>) -> Self {
        self.max_text_length = max;
        self
    }
}
