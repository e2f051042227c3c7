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

//! Runtime occurrences and dynamically typed values

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::types::TypeName;

/// A single runtime happening carrying contextual data
pub trait Occurrence: Send + Sync + fmt::Debug {
    /// Concrete kind of this occurrence, used for runtime instance checks
    fn kind(&self) -> &TypeName;

    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn Occurrence + 'a {
    /// Downcast to the concrete occurrence type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A value produced by a provider: a runtime type tag plus an opaque payload
#[derive(Clone)]
pub struct Value {
    type_name: TypeName,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<TypeName>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }

    /// Runtime type of the value
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Same payload under a different runtime type
    pub fn retag(&self, type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::clone(&self.payload),
        }
    }

    /// JSON payload, if the value carries one
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        self.downcast_ref::<serde_json::Value>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_json() {
            Some(json) => write!(f, "Value({}: {})", self.type_name, json),
            None => write!(f, "Value({})", self.type_name),
        }
    }
}

/// Occurrence backed by a JSON document
#[derive(Debug, Clone)]
pub struct JsonOccurrence {
    kind: TypeName,
    payload: serde_json::Value,
}

impl JsonOccurrence {
    pub fn new(kind: impl Into<TypeName>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Look up a dotted path ("from.world") in the payload
    pub fn field(&self, path: &str) -> Option<&serde_json::Value> {
        json_path(&self.payload, path)
    }
}

impl Occurrence for JsonOccurrence {
    fn kind(&self) -> &TypeName {
        &self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Walk a dotted path through nested JSON objects. An empty path returns the
/// value itself.
pub fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}
