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

//! Type names and the subtype oracle
//!
//! Occurrence kinds and value types form open hierarchies: extensions add new
//! kinds at load time, so the registry never matches on a closed enum. Instead
//! it asks a [`TypeOracle`] whether one name is assignable to another.
//! [`TypeHierarchy`] is the stock oracle built from declared parent lists.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of the universal type every other type is assignable to
pub const ANY_TYPE: &str = "Object";

/// Name of an occurrence kind or value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The universal "any" type
    pub fn any() -> Self {
        Self::new(ANY_TYPE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        &*self.0 == ANY_TYPE
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Answers assignability questions over an open type universe
pub trait TypeOracle: Send + Sync {
    /// Whether a value of `sub` may be used where `sup` is expected.
    /// Must be reflexive, and every type must be a subtype of [`ANY_TYPE`].
    fn is_subtype_of(&self, sub: &TypeName, sup: &TypeName) -> bool;
}

/// Type hierarchy built from declared parent lists
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: FxHashMap<TypeName, SmallVec<[TypeName; 2]>>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with the given direct supertypes. Redeclaring a type
    /// adds parents rather than replacing them.
    pub fn declare<I, T>(&mut self, name: impl Into<TypeName>, parents: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        let entry = self.parents.entry(name.into()).or_default();
        for parent in parents {
            let parent = parent.into();
            if !entry.contains(&parent) {
                entry.push(parent);
            }
        }
        self
    }

    /// Builder-style variant of [`TypeHierarchy::declare`]
    pub fn with_type<I, T>(mut self, name: impl Into<TypeName>, parents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.declare(name, parents);
        self
    }

    pub fn is_declared(&self, name: &str) -> bool {
        name == ANY_TYPE || self.parents.contains_key(name)
    }

    /// Direct supertypes of a type
    pub fn parents_of(&self, name: &TypeName) -> &[TypeName] {
        self.parents.get(name).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// All supertypes of a type, nearest first, ending with the any type
    pub fn supertypes(&self, name: &TypeName) -> Vec<TypeName> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(name.clone());
        seen.insert(name.clone());

        while let Some(current) = queue.pop_front() {
            out.push(current.clone());
            for parent in self.parents_of(&current) {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }

        if !name.is_any() && !out.iter().any(TypeName::is_any) {
            out.push(TypeName::any());
        }
        out
    }
}

impl TypeOracle for TypeHierarchy {
    fn is_subtype_of(&self, sub: &TypeName, sup: &TypeName) -> bool {
        if sub == sup || sup.is_any() {
            return true;
        }

        let mut seen = FxHashSet::default();
        let mut stack: Vec<&TypeName> = vec![sub];
        while let Some(current) = stack.pop() {
            for parent in self.parents_of(current) {
                if parent == sup {
                    return true;
                }
                if seen.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        false
    }
}
