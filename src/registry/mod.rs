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

//! Value-provider registry
//!
//! Extensions register providers while they load. Every overload funnels into
//! [`EventValueRegistry::register`], which rejects malformed exclusions, drops
//! structural duplicates, computes the effective priority and keeps each time
//! list sorted. Once [`EventValueRegistry::close_registrations`] is called the
//! registry is read-only and can be shared across compilation threads.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::config::RegistryConfig;
use crate::converter::{ConverterLookup, NoConverters};
use crate::core::error::{EV0001, EV0002};
use crate::core::{EventValueError, Occurrence, Result, TimeState, TypeName, TypeOracle, Value};

pub mod builder;
pub mod provider;
pub mod table;

pub use builder::ProviderRegistration;
pub use provider::{Accessor, Provider, ProviderSummary, accessor};
pub use table::{Placement, ProviderTable};

/// Result of a successful registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Stored with this effective priority
    Registered { priority: i32 },
    /// An equal provider already existed; nothing changed
    Duplicate,
}

/// Registry of value providers keyed by time state
pub struct EventValueRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) oracle: Arc<dyn TypeOracle>,
    pub(crate) converters: Arc<dyn ConverterLookup>,
    pub(crate) table: ProviderTable,
    accepting_registrations: bool,
}

impl EventValueRegistry {
    /// Registry without converters and with the default configuration
    pub fn new(oracle: Arc<dyn TypeOracle>) -> Self {
        Self::with_config(oracle, Arc::new(NoConverters), RegistryConfig::default())
    }

    pub fn with_converters(
        oracle: Arc<dyn TypeOracle>,
        converters: Arc<dyn ConverterLookup>,
    ) -> Self {
        Self::with_config(oracle, converters, RegistryConfig::default())
    }

    pub fn with_config(
        oracle: Arc<dyn TypeOracle>,
        converters: Arc<dyn ConverterLookup>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            config,
            oracle,
            converters,
            table: ProviderTable::new(),
            accepting_registrations: true,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn oracle(&self) -> &Arc<dyn TypeOracle> {
        &self.oracle
    }

    /// Register a provider. This is the canonical registration operation.
    pub fn register(&mut self, registration: ProviderRegistration) -> Result<RegistrationOutcome> {
        let ProviderRegistration {
            occurrence_type,
            value_type,
            accessor,
            time,
            placement,
            excludes,
            exclude_message,
        } = registration;

        if !self.accepting_registrations {
            log::error!(
                "rejected registration of {occurrence_type}#{value_type}: registrations are closed"
            );
            return Err(EventValueError::RegistrationClosed {
                error_code: EV0002,
                occurrence_type,
                value_type,
            });
        }

        if !excludes.is_empty() && exclude_message.is_none() {
            log::error!(
                "rejected registration of {occurrence_type}#{value_type}: excluded occurrences require a message"
            );
            return Err(EventValueError::Registration {
                error_code: EV0001,
                message: "The exclude error message cannot be missing when there are excluded occurrences"
                    .to_string(),
                occurrence_type,
                value_type,
            });
        }

        let declared_priority = match &placement {
            Placement::Priority(priority) => *priority,
            Placement::Default | Placement::After(_) => self.config.default_priority,
        };

        let mut unique_excludes = SmallVec::<[TypeName; 2]>::new();
        for kind in excludes {
            if !unique_excludes.contains(&kind) {
                unique_excludes.push(kind);
            }
        }

        let mut provider = Provider {
            occurrence_type,
            value_type,
            accessor,
            priority: declared_priority,
            declared_priority,
            excludes: unique_excludes,
            exclude_message,
        };

        if self.table.contains(time, &provider) {
            log::debug!("ignoring duplicate provider {provider} for {time}");
            return Ok(RegistrationOutcome::Duplicate);
        }

        provider.priority = self
            .table
            .place(time, &provider, &placement, self.oracle.as_ref());
        let stored = self.table.insert(time, provider);
        log::debug!("registered provider {stored} for {time}");

        Ok(RegistrationOutcome::Registered {
            priority: stored.priority,
        })
    }

    /// Register a present-time provider with the default priority
    pub fn register_value(
        &mut self,
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        accessor: Accessor,
    ) -> Result<RegistrationOutcome> {
        self.register(ProviderRegistration::new(occurrence_type, value_type, accessor))
    }

    /// Register a provider for a time state with the default priority
    pub fn register_value_at(
        &mut self,
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        accessor: Accessor,
        time: TimeState,
    ) -> Result<RegistrationOutcome> {
        self.register(ProviderRegistration::new(occurrence_type, value_type, accessor).time(time))
    }

    /// Register a provider for a time state with an explicit priority
    pub fn register_with_priority(
        &mut self,
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        accessor: Accessor,
        time: TimeState,
        priority: i32,
    ) -> Result<RegistrationOutcome> {
        self.register(
            ProviderRegistration::new(occurrence_type, value_type, accessor)
                .time(time)
                .priority(priority),
        )
    }

    /// Register a provider that refuses the given occurrence subkinds
    pub fn register_excluding<I, T>(
        &mut self,
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        accessor: Accessor,
        time: TimeState,
        excludes: I,
        message: Option<String>,
    ) -> Result<RegistrationOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        let mut registration =
            ProviderRegistration::new(occurrence_type, value_type, accessor)
                .time(time)
                .excludes(excludes);
        registration.exclude_message = message;
        self.register(registration)
    }

    /// Register a closure as a present-time provider
    pub fn register_fn<F>(
        &mut self,
        occurrence_type: impl Into<TypeName>,
        value_type: impl Into<TypeName>,
        f: F,
    ) -> Result<RegistrationOutcome>
    where
        F: Fn(&dyn Occurrence) -> Option<Value> + Send + Sync + 'static,
    {
        self.register_value(occurrence_type, value_type, accessor(f))
    }

    /// Close the registration window. Later registrations fail.
    pub fn close_registrations(&mut self) {
        if !self.accepting_registrations {
            return;
        }
        self.accepting_registrations = false;
        log::debug!(
            "registrations closed with {} providers",
            self.table.total_len()
        );
        if self.config.dump_on_close {
            self.log_debug_dump();
        }
    }

    pub fn is_accepting_registrations(&self) -> bool {
        self.accepting_registrations
    }

    /// Sorted providers for a time state
    pub fn providers(&self, time: TimeState) -> &[Arc<Provider>] {
        self.table.providers(time)
    }

    /// Owned snapshot of the sorted providers for a time state
    pub fn list(&self, time: TimeState) -> Vec<Arc<Provider>> {
        self.table.providers(time).to_vec()
    }

    pub fn len(&self) -> usize {
        self.table.total_len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Human-readable listing of every provider in resolution order
    pub fn debug_dump(&self) -> String {
        let mut out = String::from("All registered event values in order");
        for time in TimeState::ALL {
            let _ = write!(out, "\n{}:", time.label());
            for (i, provider) in self.table.providers(time).iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                let _ = write!(out, "{sep}{provider}");
            }
        }
        out
    }

    pub fn log_debug_dump(&self) {
        log::debug!("{}", self.debug_dump());
    }

    /// Serializable view of the registry for tooling
    pub fn snapshot(&self) -> RegistrySnapshot {
        let list = |time: TimeState| -> Vec<ProviderSummary> {
            self.table
                .providers(time)
                .iter()
                .map(|p| p.summary())
                .collect()
        };
        RegistrySnapshot {
            accepting_registrations: self.accepting_registrations,
            past: list(TimeState::Past),
            present: list(TimeState::Present),
            future: list(TimeState::Future),
        }
    }
}

impl std::fmt::Debug for EventValueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventValueRegistry")
            .field("config", &self.config)
            .field("table", &self.table)
            .field("accepting_registrations", &self.accepting_registrations)
            .finish_non_exhaustive()
    }
}

/// Serializable registry contents
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub accepting_registrations: bool,
    pub past: Vec<ProviderSummary>,
    pub present: Vec<ProviderSummary>,
    pub future: Vec<ProviderSummary>,
}
