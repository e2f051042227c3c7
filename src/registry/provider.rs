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

//! Registered value providers

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::core::{Occurrence, TypeName, Value};

/// Extracts a value from an occurrence; `None` when the occurrence has no
/// such value
pub type Accessor = Arc<dyn Fn(&dyn Occurrence) -> Option<Value> + Send + Sync>;

/// Wrap a closure as an [`Accessor`]
pub fn accessor<F>(f: F) -> Accessor
where
    F: Fn(&dyn Occurrence) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registered provider. Immutable once stored in the table.
#[derive(Clone)]
pub struct Provider {
    pub(crate) occurrence_type: TypeName,
    pub(crate) value_type: TypeName,
    pub(crate) accessor: Accessor,
    /// Effective priority after placement
    pub(crate) priority: i32,
    /// Priority before placement, used for duplicate detection
    pub(crate) declared_priority: i32,
    pub(crate) excludes: SmallVec<[TypeName; 2]>,
    pub(crate) exclude_message: Option<String>,
}

impl Provider {
    pub fn occurrence_type(&self) -> &TypeName {
        &self.occurrence_type
    }

    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn declared_priority(&self) -> i32 {
        self.declared_priority
    }

    pub fn excludes(&self) -> &[TypeName] {
        &self.excludes
    }

    pub fn exclude_message(&self) -> Option<&str> {
        self.exclude_message.as_deref()
    }

    pub(crate) fn rank(&self) -> u32 {
        self.priority.unsigned_abs()
    }

    /// Run the accessor
    pub fn get(&self, occurrence: &dyn Occurrence) -> Option<Value> {
        (self.accessor)(occurrence)
    }

    fn same_accessor(&self, other: &Provider) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.accessor), Arc::as_ptr(&other.accessor))
    }

    /// Set equality, ignoring order and repeats
    fn same_excludes(&self, other: &Provider) -> bool {
        self.excludes.iter().all(|ex| other.excludes.contains(ex))
            && other.excludes.iter().all(|ex| self.excludes.contains(ex))
    }

    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            occurrence_type: self.occurrence_type.clone(),
            value_type: self.value_type.clone(),
            priority: self.priority,
            excludes: self.excludes.to_vec(),
        }
    }
}

/// Structural equality: occurrence kind, value type, accessor identity,
/// declared priority and exclusion set
impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.occurrence_type == other.occurrence_type
            && self.value_type == other.value_type
            && self.same_accessor(other)
            && self.declared_priority == other.declared_priority
            && self.same_excludes(other)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}#{} at priority {})",
            self.occurrence_type, self.value_type, self.priority
        )
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("occurrence_type", &self.occurrence_type)
            .field("value_type", &self.value_type)
            .field("priority", &self.priority)
            .field("declared_priority", &self.declared_priority)
            .field("excludes", &self.excludes)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a provider for tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub occurrence_type: TypeName,
    pub value_type: TypeName,
    pub priority: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<TypeName>,
}
