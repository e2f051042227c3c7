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

//! Value conversion lookup
//!
//! The resolver only falls back to conversions when no provider produces a
//! compatible type. Hosts usually own a richer converter system; anything
//! implementing [`ConverterLookup`] can be plugged in.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{TypeName, TypeOracle, Value};

/// Pure conversion from one value to another; `None` when the particular
/// value cannot be converted
pub type ConverterFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Source of conversions between value types
pub trait ConverterLookup: Send + Sync {
    /// Converter from `from` values to `to` values, if one exists
    fn get_converter(&self, from: &TypeName, to: &TypeName) -> Option<ConverterFn>;
}

/// Lookup that never converts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConverters;

impl ConverterLookup for NoConverters {
    fn get_converter(&self, _from: &TypeName, _to: &TypeName) -> Option<ConverterFn> {
        None
    }
}

struct ConverterEntry {
    from: TypeName,
    to: TypeName,
    converter: ConverterFn,
}

/// Converter table keyed by source and target type.
///
/// Lookup tries the exact pair first, then the first registered converter
/// whose source accepts `from` and whose target is usable as `to`.
pub struct ConverterRegistry {
    oracle: Arc<dyn TypeOracle>,
    exact: FxHashMap<(TypeName, TypeName), usize>,
    entries: Vec<ConverterEntry>,
}

impl ConverterRegistry {
    pub fn new(oracle: Arc<dyn TypeOracle>) -> Self {
        Self {
            oracle,
            exact: FxHashMap::default(),
            entries: Vec::new(),
        }
    }

    /// Register a converter. A second converter for the same pair replaces
    /// the first.
    pub fn register(
        &mut self,
        from: impl Into<TypeName>,
        to: impl Into<TypeName>,
        converter: ConverterFn,
    ) {
        let (from, to) = (from.into(), to.into());
        match self.exact.get(&(from.clone(), to.clone())) {
            Some(&index) => self.entries[index].converter = converter,
            None => {
                self.exact.insert((from.clone(), to.clone()), self.entries.len());
                self.entries.push(ConverterEntry {
                    from,
                    to,
                    converter,
                });
            }
        }
    }

    /// Register a closure as converter
    pub fn register_fn<F>(&mut self, from: impl Into<TypeName>, to: impl Into<TypeName>, f: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(from, to, Arc::new(f));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConverterLookup for ConverterRegistry {
    fn get_converter(&self, from: &TypeName, to: &TypeName) -> Option<ConverterFn> {
        if let Some(&index) = self.exact.get(&(from.clone(), to.clone())) {
            return Some(Arc::clone(&self.entries[index].converter));
        }

        self.entries
            .iter()
            .find(|entry| {
                self.oracle.is_subtype_of(from, &entry.from)
                    && self.oracle.is_subtype_of(&entry.to, to)
            })
            .map(|entry| Arc::clone(&entry.converter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TypeHierarchy;

    fn registry() -> ConverterRegistry {
        let hierarchy = TypeHierarchy::new()
            .with_type("Entity", ["Object"])
            .with_type("Player", ["Entity"])
            .with_type("Location", ["Object"])
            .with_type("World", ["Object"]);
        ConverterRegistry::new(Arc::new(hierarchy))
    }

    #[test]
    fn test_exact_lookup() {
        let mut converters = registry();
        converters.register_fn("Location", "World", |v| Some(v.retag("World")));

        let convert = converters
            .get_converter(&"Location".into(), &"World".into())
            .unwrap();
        let out = convert(&Value::new("Location", 1_u8)).unwrap();
        assert_eq!(out.type_name().as_str(), "World");
        assert!(
            converters
                .get_converter(&"World".into(), &"Location".into())
                .is_none()
        );
    }

    #[test]
    fn test_subtype_source_lookup() {
        let mut converters = registry();
        converters.register_fn("Entity", "Location", |v| Some(v.retag("Location")));

        assert!(
            converters
                .get_converter(&"Player".into(), &"Location".into())
                .is_some()
        );
        assert!(
            converters
                .get_converter(&"Player".into(), &"Object".into())
                .is_some()
        );
        assert!(
            converters
                .get_converter(&"Object".into(), &"Location".into())
                .is_none()
        );
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut converters = registry();
        converters.register_fn("Location", "World", |_| None);
        converters.register_fn("Location", "World", |v| Some(v.retag("World")));
        assert_eq!(converters.len(), 1);

        let convert = converters
            .get_converter(&"Location".into(), &"World".into())
            .unwrap();
        assert!(convert(&Value::new("Location", ())).is_some());
    }

    #[test]
    fn test_no_converters() {
        assert!(
            NoConverters
                .get_converter(&"A".into(), &"B".into())
                .is_none()
        );
    }
}
