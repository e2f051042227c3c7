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

//! Per-time provider lists ordered by priority magnitude
//!
//! Each time state owns an independent list sorted by ascending `|priority|`.
//! Equal magnitudes keep registration order regardless of sign, so inserting
//! behaves like appending followed by a stable sort.

use std::sync::Arc;

use super::provider::Provider;
use crate::core::{TimeState, TypeName, TypeOracle};

/// Where a new provider lands relative to existing ones
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    /// The configured default priority, de-collided against broader entries
    #[default]
    Default,
    /// An explicit priority, de-collided against broader entries
    Priority(i32),
    /// Ranked behind the first existing entry for one of these occurrence kinds
    After(Vec<TypeName>),
}

/// Raise the magnitude of `priority` to at least `rank`, keeping its sign.
/// Saturates at the `i32` bounds; zero stays put.
fn raise_to_rank(priority: i32, rank: u64) -> i32 {
    if u64::from(priority.unsigned_abs()) >= rank {
        return priority;
    }
    let target = i64::try_from(rank).unwrap_or(i64::MAX);
    let signed = i64::from(priority.signum()).saturating_mul(target);
    i32::try_from(signed).unwrap_or(if signed < 0 { i32::MIN } else { i32::MAX })
}

#[derive(Debug, Default)]
pub struct ProviderTable {
    lists: [Vec<Arc<Provider>>; 3],
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted providers for a time state
    pub fn providers(&self, time: TimeState) -> &[Arc<Provider>] {
        &self.lists[time.index()]
    }

    pub fn len(&self, time: TimeState) -> usize {
        self.lists[time.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    pub fn total_len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, time: TimeState, provider: &Provider) -> bool {
        self.lists[time.index()]
            .iter()
            .any(|existing| **existing == *provider)
    }

    /// Effective priority for `candidate` given the entries already stored
    /// for `time`
    pub fn place(
        &self,
        time: TimeState,
        candidate: &Provider,
        placement: &Placement,
        oracle: &dyn TypeOracle,
    ) -> i32 {
        let mut priority = candidate.declared_priority;
        if priority == 0 {
            return priority;
        }

        match placement {
            Placement::After(kinds) => {
                let anchor = self.lists[time.index()]
                    .iter()
                    .find(|existing| kinds.contains(&existing.occurrence_type));
                if let Some(anchor) = anchor {
                    priority = raise_to_rank(priority, u64::from(anchor.rank()) + 1);
                }
            }
            Placement::Default | Placement::Priority(_) => {
                let broader = self.lists[time.index()].iter().find(|existing| {
                    if existing.occurrence_type != candidate.occurrence_type {
                        oracle.is_subtype_of(&candidate.occurrence_type, &existing.occurrence_type)
                    } else {
                        oracle.is_subtype_of(&candidate.value_type, &existing.value_type)
                    }
                });
                if let Some(broader) = broader {
                    priority = raise_to_rank(priority, u64::from(broader.rank()));
                }
            }
        }

        priority
    }

    /// Insert keeping the stable magnitude order
    pub fn insert(&mut self, time: TimeState, provider: Provider) -> Arc<Provider> {
        let provider = Arc::new(provider);
        let list = &mut self.lists[time.index()];
        let rank = provider.rank();
        let index = list.partition_point(|existing| existing.rank() <= rank);
        list.insert(index, Arc::clone(&provider));
        provider
    }
}
