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

//! Registration builder for providers

use super::provider::Accessor;
use super::table::Placement;
use super::{EventValueRegistry, RegistrationOutcome};
use crate::core::{Result, TimeState, TypeName};

/// Everything the canonical registration needs. Defaults: present time,
/// default priority, no exclusions.
#[derive(Clone)]
pub struct ProviderRegistration {
    pub occurrence_type: TypeName,
    pub value_type: TypeName,
    pub accessor: Accessor,
    pub time: TimeState,
    pub placement: Placement,
    pub excludes: Vec<TypeName>,
    pub exclude_message: Option<String>,
}

impl ProviderRegistration {
    pub fn new(
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        accessor: Accessor,
    ) -> Self {
        Self {
            occurrence_type: occurrence_type.into(),
            value_type: value_type.into(),
            accessor,
            time: TimeState::Present,
            placement: Placement::Default,
            excludes: Vec::new(),
            exclude_message: None,
        }
    }

    pub fn time(mut self, time: TimeState) -> Self {
        self.time = time;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.placement = Placement::Priority(priority);
        self
    }

    /// Rank this provider behind existing providers of these occurrence kinds
    pub fn after<I, T>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.placement = Placement::After(kinds.into_iter().map(Into::into).collect());
        self
    }

    /// Forbid this provider for the given occurrence subkinds
    pub fn excluding<I, T>(mut self, kinds: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.excludes = kinds.into_iter().map(Into::into).collect();
        self.exclude_message = Some(message.into());
        self
    }

    /// Set excluded kinds without touching the message
    pub fn excludes<I, T>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.excludes = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn register(self, registry: &mut EventValueRegistry) -> Result<RegistrationOutcome> {
        registry.register(self)
    }
}

impl std::fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("occurrence_type", &self.occurrence_type)
            .field("value_type", &self.value_type)
            .field("time", &self.time)
            .field("placement", &self.placement)
            .field("excludes", &self.excludes)
            .field("exclude_message", &self.exclude_message)
            .finish_non_exhaustive()
    }
}
