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

//! Core types shared by the registry, the resolver and the hint store

pub mod error;
pub mod error_code;
pub mod time;
pub mod types;
pub mod value;

pub use error::{EventValueError, Result};
pub use error_code::{ErrorCategory, ErrorCode, ErrorInfo};
pub use time::TimeState;
pub use types::{ANY_TYPE, TypeHierarchy, TypeName, TypeOracle};
pub use value::{JsonOccurrence, Occurrence, Value, json_path};
