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

//! Typed event-value registry
//!
//! Extensions register providers that read a typed value out of an occurrence
//! (an event) at a point in time. Script compilers ask the registry for the
//! value of some type on some occurrence kind and receive a getter, possibly
//! narrowed by runtime checks or passed through a converter. A scoped hint
//! store tracks the compiler's type guesses across nested blocks.
//!
//! ```
//! use std::sync::Arc;
//! use event_values::{EventValueRegistry, JsonOccurrence, TimeState, TypeHierarchy, Value};
//!
//! let types = TypeHierarchy::new()
//!     .with_type("Event", ["Object"])
//!     .with_type("Move", ["Event"])
//!     .with_type("Location", ["Object"]);
//! let mut registry = EventValueRegistry::new(Arc::new(types));
//! registry
//!     .register_fn("Move", "Location", |occurrence| {
//!         let json = occurrence.downcast_ref::<JsonOccurrence>()?;
//!         Some(Value::new("Location", json.field("to")?.clone()))
//!     })
//!     .unwrap();
//! registry.close_registrations();
//!
//! let getter = registry
//!     .resolve(&"Move".into(), &"Location".into(), TimeState::Present)
//!     .unwrap()
//!     .unwrap();
//! let occurrence = JsonOccurrence::new("Move", serde_json::json!({ "to": [1, 64, 2] }));
//! assert!(getter.get(&occurrence).is_some());
//! ```

pub mod config;
pub mod converter;
pub mod core;
pub mod hints;
pub mod manifest;
pub mod registry;
pub mod resolver;

pub use config::{DEFAULT_PRIORITY, RegistryConfig, RegistryConfigBuilder};
pub use converter::{ConverterFn, ConverterLookup, ConverterRegistry, NoConverters};
pub use core::{
    ANY_TYPE, ErrorCategory, ErrorCode, ErrorInfo, EventValueError, JsonOccurrence, Occurrence,
    Result, TimeState, TypeHierarchy, TypeName, TypeOracle, Value,
};
pub use hints::{HintKind, ScopedHintStore};
pub use manifest::Manifest;
pub use registry::{
    Accessor, EventValueRegistry, Placement, Provider, ProviderRegistration, ProviderSummary,
    RegistrationOutcome, RegistrySnapshot, accessor,
};
pub use resolver::{ResolutionPhase, ValueGetter};
