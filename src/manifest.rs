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

//! Declarative registry setup from JSON
//!
//! A manifest declares the type hierarchy, converters that project a field out
//! of a JSON value, and providers that read a field from a [`JsonOccurrence`]:
//!
//! ```json
//! {
//!   "config": { "defaultPriority": 15 },
//!   "types": [
//!     { "name": "Move", "parents": ["Event"] },
//!     { "name": "Location" },
//!     { "name": "World" }
//!   ],
//!   "converters": [{ "from": "Location", "to": "World", "field": "world" }],
//!   "providers": [
//!     { "occurrence": "Move", "value": "Location", "field": "to" },
//!     { "occurrence": "Move", "value": "Location", "field": "from", "time": "past" }
//!   ]
//! }
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::config::RegistryConfig;
use crate::converter::ConverterRegistry;
use crate::core::{
    EventValueError, JsonOccurrence, Result, TimeState, TypeHierarchy, TypeName, TypeOracle,
    Value, json_path,
};
use crate::registry::{EventValueRegistry, ProviderRegistration, accessor};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: RegistryConfig,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub converters: Vec<ConverterDecl>,
    #[serde(default)]
    pub providers: Vec<ProviderDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    /// Direct supertypes; none means the any type
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Converter that reads `field` from the source value's JSON payload
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterDecl {
    pub from: String,
    pub to: String,
    pub field: String,
}

/// Provider that reads `field` from the occurrence payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProviderDecl {
    pub occurrence: String,
    pub value: String,
    pub field: String,
    #[serde(default)]
    pub time: TimeState,
    pub priority: Option<i32>,
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    pub exclude_message: Option<String>,
}

impl Manifest {
    pub fn from_json(source: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(source)
            .map_err(|e| EventValueError::manifest(format!("invalid manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Type hierarchy declared by the manifest
    pub fn hierarchy(&self) -> TypeHierarchy {
        let mut hierarchy = TypeHierarchy::new();
        for decl in &self.types {
            hierarchy.declare(decl.name.as_str(), decl.parents.iter().map(String::as_str));
        }
        hierarchy
    }

    fn validate(&self) -> Result<()> {
        let hierarchy = self.hierarchy();
        let check = |name: &str, what: &str| -> Result<()> {
            if hierarchy.is_declared(name) {
                Ok(())
            } else {
                Err(EventValueError::manifest(format!(
                    "unknown type '{name}' in {what}"
                )))
            }
        };

        for decl in &self.types {
            for parent in &decl.parents {
                check(parent, &format!("parents of {}", decl.name))?;
            }
        }
        for conv in &self.converters {
            let what = format!("converter {} -> {}", conv.from, conv.to);
            check(&conv.from, &what)?;
            check(&conv.to, &what)?;
        }
        for provider in &self.providers {
            let what = format!("provider {}#{}", provider.occurrence, provider.value);
            check(&provider.occurrence, &what)?;
            check(&provider.value, &what)?;
            for kind in provider.after.iter().chain(&provider.excludes) {
                check(kind, &what)?;
            }
            if provider.priority.is_some() && !provider.after.is_empty() {
                return Err(EventValueError::manifest(format!(
                    "{what} sets both priority and after"
                )));
            }
        }
        Ok(())
    }

    /// Build an open registry populated with every declared provider
    pub fn build_registry(&self) -> Result<EventValueRegistry> {
        let oracle: Arc<dyn TypeOracle> = Arc::new(self.hierarchy());

        let mut converters = ConverterRegistry::new(Arc::clone(&oracle));
        for conv in &self.converters {
            let target = TypeName::new(&conv.to);
            let field = conv.field.clone();
            converters.register_fn(conv.from.as_str(), conv.to.as_str(), move |value| {
                let projected = json_path(value.as_json()?, &field)?;
                Some(Value::new(target.clone(), projected.clone()))
            });
        }

        let mut registry =
            EventValueRegistry::with_config(oracle, Arc::new(converters), self.config.clone());
        for decl in &self.providers {
            decl.registration().register(&mut registry)?;
        }
        log::debug!(
            "built registry from manifest: {} types, {} converters, {} providers",
            self.types.len(),
            self.converters.len(),
            registry.len()
        );
        Ok(registry)
    }
}

impl ProviderDecl {
    fn registration(&self) -> ProviderRegistration {
        let value_type = TypeName::new(&self.value);
        let field = self.field.clone();
        let read = accessor(move |occurrence| {
            let json = occurrence.downcast_ref::<JsonOccurrence>()?;
            Some(Value::new(value_type.clone(), json.field(&field)?.clone()))
        });

        let mut registration =
            ProviderRegistration::new(self.occurrence.as_str(), self.value.as_str(), read)
                .time(self.time)
                .excludes(self.excludes.iter().map(String::as_str));
        registration.exclude_message = self.exclude_message.clone();
        if let Some(priority) = self.priority {
            registration = registration.priority(priority);
        } else if !self.after.is_empty() {
            registration = registration.after(self.after.iter().map(String::as_str));
        }
        registration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{EV0001, EV0006};
    use crate::resolver::ResolutionPhase;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MANIFEST: &str = r#"{
        "config": { "defaultPriority": 10 },
        "types": [
            { "name": "Event" },
            { "name": "Move", "parents": ["Event"] },
            { "name": "Teleport", "parents": ["Move"] },
            { "name": "Location" },
            { "name": "World" }
        ],
        "converters": [{ "from": "Location", "to": "World", "field": "world" }],
        "providers": [
            { "occurrence": "Move", "value": "Location", "field": "to" },
            { "occurrence": "Move", "value": "Location", "field": "from", "time": "past" },
            { "occurrence": "Teleport", "value": "Location", "field": "target", "after": ["Move"] }
        ]
    }"#;

    #[test]
    fn test_build_registry_from_manifest() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let registry = manifest.build_registry().unwrap();
        assert_eq!(registry.config().default_priority, 10);
        assert_eq!(registry.len(), 3);

        let priorities: Vec<i32> = registry
            .providers(TimeState::Present)
            .iter()
            .map(|p| p.priority())
            .collect();
        assert_eq!(priorities, vec![10, 11]);

        let occurrence = JsonOccurrence::new(
            "Move",
            json!({"from": {"world": "overworld"}, "to": {"world": "nether"}}),
        );
        let past = registry
            .get_value(&occurrence, &"Location".into(), TimeState::Past)
            .unwrap()
            .unwrap();
        assert_eq!(past.as_json(), Some(&json!({"world": "overworld"})));

        let getter = registry
            .resolve(&"Move".into(), &"World".into(), TimeState::Present)
            .unwrap()
            .unwrap();
        assert_eq!(getter.phase(), ResolutionPhase::Converted);
        let world = getter.get(&occurrence).unwrap();
        assert_eq!(world.type_name().as_str(), "World");
        assert_eq!(world.as_json(), Some(&json!("nether")));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = Manifest::from_json(
            r#"{ "providers": [{ "occurrence": "Move", "value": "Location", "field": "to" }] }"#,
        )
        .unwrap_err();
        assert_eq!(*err.error_code(), EV0006);
        assert!(err.to_string().contains("unknown type 'Move'"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = Manifest::from_json("{ \"types\": 3 }").unwrap_err();
        assert_eq!(*err.error_code(), EV0006);
    }

    #[test]
    fn test_priority_and_after_conflict() {
        let err = Manifest::from_json(
            r#"{
                "types": [{ "name": "Move" }, { "name": "Location" }],
                "providers": [{
                    "occurrence": "Move", "value": "Location", "field": "to",
                    "priority": 3, "after": ["Move"]
                }]
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("both priority and after"));
    }

    #[test]
    fn test_exclusion_without_message_fails_registration() {
        let manifest = Manifest::from_json(
            r#"{
                "types": [{ "name": "Move" }, { "name": "Teleport", "parents": ["Move"] }, { "name": "Location" }],
                "providers": [{
                    "occurrence": "Move", "value": "Location", "field": "to",
                    "excludes": ["Teleport"]
                }]
            }"#,
        )
        .unwrap();
        let err = manifest.build_registry().unwrap_err();
        assert_eq!(*err.error_code(), EV0001);
    }
}
