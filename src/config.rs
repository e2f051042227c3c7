// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Registry configuration

use serde::{Deserialize, Serialize};

/// Priority given to providers registered without an explicit one
pub const DEFAULT_PRIORITY: i32 = 15;

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Starting priority for `Placement::Default` and `Placement::After`
    pub default_priority: i32,
    /// Retry past/future queries against present-time providers
    pub present_fallback: bool,
    /// Log the provider dump at debug level when registrations close
    pub dump_on_close: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            present_fallback: true,
            dump_on_close: false,
        }
    }
}

/// Builder for registry configuration with fluent API
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the priority used when none is given
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.config.default_priority = priority;
        self
    }

    /// Enable or disable the degrade-to-present fallback
    pub fn with_present_fallback(mut self, enabled: bool) -> Self {
        self.config.present_fallback = enabled;
        self
    }

    /// Enable or disable the debug dump when registrations close
    pub fn with_dump_on_close(mut self, enabled: bool) -> Self {
        self.config.dump_on_close = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RegistryConfig {
        self.config
    }
}
