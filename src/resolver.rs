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

//! Resolution of typed value getters
//!
//! A query names an occurrence kind, a requested value type and a time state.
//! The provider list for that time is scanned in four phases, each one looser
//! than the previous:
//!
//! 1. exact value type
//! 2. covariant: the provider produces a subtype of the requested type
//! 3. contravariant: the provider produces a supertype, checked per value
//! 4. converted: the provider's value is run through a converter
//!
//! Before any phase runs, the list is checked for a provider that could answer
//! the query but excludes the requested occurrence; such a provider ends the
//! query with an error no matter how many other providers would match. When
//! nothing matches a past or future query, the query is retried once against
//! present-time providers.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::error::EV0003;
use crate::core::{EventValueError, Occurrence, Result, TimeState, TypeName, TypeOracle, Value};
use crate::registry::{EventValueRegistry, Provider};

type GetterFn = Arc<dyn Fn(&dyn Occurrence) -> Option<Value> + Send + Sync>;

/// Phase of the resolution that produced a getter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionPhase {
    Exact,
    Covariant,
    Contravariant,
    Converted,
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPhase::Exact => write!(f, "exact"),
            ResolutionPhase::Covariant => write!(f, "covariant"),
            ResolutionPhase::Contravariant => write!(f, "contravariant"),
            ResolutionPhase::Converted => write!(f, "converted"),
        }
    }
}

/// A resolved accessor bound to the provider that answered the query
#[derive(Clone)]
pub struct ValueGetter {
    provider: Arc<Provider>,
    phase: ResolutionPhase,
    time: TimeState,
    get: GetterFn,
}

impl ValueGetter {
    fn direct(provider: &Arc<Provider>, phase: ResolutionPhase, time: TimeState) -> Self {
        Self {
            provider: Arc::clone(provider),
            phase,
            time,
            get: Arc::clone(&provider.accessor),
        }
    }

    fn wrapped(
        provider: &Arc<Provider>,
        phase: ResolutionPhase,
        time: TimeState,
        get: GetterFn,
    ) -> Self {
        Self {
            provider: Arc::clone(provider),
            phase,
            time,
            get,
        }
    }

    /// Read the value from an occurrence. `None` means the occurrence has no
    /// such value, including failed runtime type checks.
    pub fn get(&self, occurrence: &dyn Occurrence) -> Option<Value> {
        (self.get)(occurrence)
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }

    /// Time state of the provider list that answered; differs from the
    /// requested time after a present fallback
    pub fn time(&self) -> TimeState {
        self.time
    }

    /// True when the getter hands out the provider's accessor untouched
    pub fn is_direct(&self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.get), Arc::as_ptr(&self.provider.accessor))
    }
}

impl fmt::Debug for ValueGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueGetter")
            .field("provider", &self.provider.to_string())
            .field("phase", &self.phase)
            .field("time", &self.time)
            .finish()
    }
}

impl EventValueRegistry {
    /// Resolve a getter for `value_type` values of `occurrence_type`
    /// occurrences at `time`.
    ///
    /// `Ok(None)` means the value is undefined for this combination. An
    /// `Err(EventValueError::Excluded)` carries the provider's message for the
    /// script author.
    pub fn resolve(
        &self,
        occurrence_type: &TypeName,
        value_type: &TypeName,
        time: TimeState,
    ) -> Result<Option<ValueGetter>> {
        self.resolve_at(occurrence_type, value_type, time, self.config.present_fallback)
    }

    /// Whether a past or future provider answers this query on its own
    pub fn has_time_states(&self, occurrence_type: &TypeName, value_type: &TypeName) -> bool {
        [TimeState::Past, TimeState::Future].into_iter().any(|time| {
            matches!(
                self.resolve_at(occurrence_type, value_type, time, false),
                Ok(Some(_))
            )
        })
    }

    /// Resolve the first candidate type that yields a getter, in order
    pub fn resolve_first(
        &self,
        occurrence_type: &TypeName,
        candidates: &[TypeName],
        time: TimeState,
    ) -> Result<Option<ValueGetter>> {
        for candidate in candidates {
            if let Some(getter) = self.resolve(occurrence_type, candidate, time)? {
                return Ok(Some(getter));
            }
        }
        Ok(None)
    }

    /// Resolve against the occurrence's own kind and read the value
    pub fn get_value(
        &self,
        occurrence: &dyn Occurrence,
        value_type: &TypeName,
        time: TimeState,
    ) -> Result<Option<Value>> {
        Ok(self
            .resolve(occurrence.kind(), value_type, time)?
            .and_then(|getter| getter.get(occurrence)))
    }

    fn resolve_at(
        &self,
        occurrence_type: &TypeName,
        value_type: &TypeName,
        time: TimeState,
        allow_fallback: bool,
    ) -> Result<Option<ValueGetter>> {
        let query = Query {
            oracle: &self.oracle,
            occurrence_type,
            value_type,
            time,
        };
        let providers = self.table.providers(time);
        query.check_exclusions(providers, self)?;

        let found = query
            .exact(providers)
            .or_else(|| query.covariant(providers))
            .or_else(|| query.contravariant(providers))
            .or_else(|| query.converted(providers, self));

        if let Some(getter) = found {
            log::trace!(
                "resolved {occurrence_type}#{value_type} at {time} via {} provider {}",
                getter.phase,
                getter.provider
            );
            return Ok(Some(getter));
        }

        if allow_fallback && time != TimeState::Present {
            log::trace!("no {time} provider for {occurrence_type}#{value_type}, trying present");
            return self.resolve_at(occurrence_type, value_type, TimeState::Present, false);
        }

        log::trace!("no provider for {occurrence_type}#{value_type} at {time}");
        Ok(None)
    }
}

/// One resolution attempt against a single time list
struct Query<'a> {
    oracle: &'a Arc<dyn TypeOracle>,
    occurrence_type: &'a TypeName,
    value_type: &'a TypeName,
    time: TimeState,
}

impl Query<'_> {
    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        self.oracle.is_subtype_of(sub, sup)
    }

    /// Fails when a provider that could answer this query refuses the
    /// requested occurrence
    fn check_exclusions(
        &self,
        providers: &[Arc<Provider>],
        registry: &EventValueRegistry,
    ) -> Result<()> {
        let refusing = providers.iter().find(|provider| {
            provider
                .excludes
                .iter()
                .any(|ex| self.is_subtype(self.occurrence_type, ex))
                && self.could_answer(provider, registry)
        });
        let Some(provider) = refusing else {
            return Ok(());
        };

        let message = provider.exclude_message.clone().unwrap_or_default();
        log::debug!(
            "provider {provider} excludes {}: {message}",
            self.occurrence_type
        );
        Err(EventValueError::Excluded {
            error_code: EV0003,
            message,
            occurrence_type: self.occurrence_type.clone(),
            value_type: self.value_type.clone(),
        })
    }

    /// Whether any phase would consider this provider
    fn could_answer(&self, provider: &Provider, registry: &EventValueRegistry) -> bool {
        if !self.occurrence_matches(provider) && !self.occurrence_narrower(provider) {
            return false;
        }
        self.is_subtype(&provider.value_type, self.value_type)
            || self.is_subtype(self.value_type, &provider.value_type)
            || registry
                .converters
                .get_converter(&provider.value_type, self.value_type)
                .is_some()
    }

    /// Requested occurrence is usable where the provider expects its kind
    fn occurrence_matches(&self, provider: &Provider) -> bool {
        self.is_subtype(self.occurrence_type, &provider.occurrence_type)
    }

    /// Provider's kind is a subtype of the requested one, so only some
    /// occurrences qualify and each has to be checked at runtime
    fn occurrence_narrower(&self, provider: &Provider) -> bool {
        self.is_subtype(&provider.occurrence_type, self.occurrence_type)
    }

    fn exact(&self, providers: &[Arc<Provider>]) -> Option<ValueGetter> {
        providers
            .iter()
            .find(|p| p.value_type == *self.value_type && self.occurrence_matches(p))
            .map(|p| ValueGetter::direct(p, ResolutionPhase::Exact, self.time))
    }

    fn covariant(&self, providers: &[Arc<Provider>]) -> Option<ValueGetter> {
        for provider in providers {
            if !self.is_subtype(&provider.value_type, self.value_type) {
                continue;
            }
            if self.occurrence_matches(provider) {
                return Some(ValueGetter::direct(
                    provider,
                    ResolutionPhase::Covariant,
                    self.time,
                ));
            }
            if !self.occurrence_narrower(provider) {
                continue;
            }

            let get = instance_checked(self.oracle, provider, None);
            return Some(ValueGetter::wrapped(
                provider,
                ResolutionPhase::Covariant,
                self.time,
                get,
            ));
        }
        None
    }

    fn contravariant(&self, providers: &[Arc<Provider>]) -> Option<ValueGetter> {
        for provider in providers {
            if !self.is_subtype(self.value_type, &provider.value_type) {
                continue;
            }
            let check_occurrence = !self.occurrence_matches(provider);
            if check_occurrence && !self.occurrence_narrower(provider) {
                continue;
            }

            let get = if check_occurrence {
                instance_checked(self.oracle, provider, Some(self.value_type))
            } else {
                value_checked(self.oracle, provider, self.value_type)
            };
            return Some(ValueGetter::wrapped(
                provider,
                ResolutionPhase::Contravariant,
                self.time,
                get,
            ));
        }
        None
    }

    fn converted(
        &self,
        providers: &[Arc<Provider>],
        registry: &EventValueRegistry,
    ) -> Option<ValueGetter> {
        for provider in providers {
            let check_occurrence = !self.occurrence_matches(provider);
            if check_occurrence && !self.occurrence_narrower(provider) {
                continue;
            }
            let Some(converter) = registry
                .converters
                .get_converter(&provider.value_type, self.value_type)
            else {
                continue;
            };

            let oracle = Arc::clone(self.oracle);
            let source = Arc::clone(provider);
            let get: GetterFn = Arc::new(move |occurrence: &dyn Occurrence| {
                if check_occurrence
                    && !oracle.is_subtype_of(occurrence.kind(), &source.occurrence_type)
                {
                    return None;
                }
                let value = (source.accessor)(occurrence)?;
                converter(&value)
            });
            return Some(ValueGetter::wrapped(
                provider,
                ResolutionPhase::Converted,
                self.time,
                get,
            ));
        }
        None
    }
}

/// Getter that checks the occurrence kind at runtime and, if `expected` is
/// given, the produced value's type as well
fn instance_checked(
    oracle: &Arc<dyn TypeOracle>,
    provider: &Arc<Provider>,
    expected: Option<&TypeName>,
) -> GetterFn {
    let oracle = Arc::clone(oracle);
    let source = Arc::clone(provider);
    let expected = expected.cloned();
    Arc::new(move |occurrence: &dyn Occurrence| {
        if !oracle.is_subtype_of(occurrence.kind(), &source.occurrence_type) {
            return None;
        }
        let value = (source.accessor)(occurrence)?;
        match &expected {
            Some(expected) if !oracle.is_subtype_of(value.type_name(), expected) => None,
            _ => Some(value),
        }
    })
}

/// Getter that only checks the produced value's type at runtime
fn value_checked(
    oracle: &Arc<dyn TypeOracle>,
    provider: &Arc<Provider>,
    expected: &TypeName,
) -> GetterFn {
    let oracle = Arc::clone(oracle);
    let source = Arc::clone(provider);
    let expected = expected.clone();
    Arc::new(move |occurrence: &dyn Occurrence| {
        let value = (source.accessor)(occurrence)?;
        oracle
            .is_subtype_of(value.type_name(), &expected)
            .then_some(value)
    })
}
