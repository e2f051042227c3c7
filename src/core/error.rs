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

//! Core error types with error codes

use thiserror::Error;

pub use super::error_code::*;

use super::types::TypeName;

/// Main error type for registration, resolution and hint handling
#[derive(Debug, Clone, Error)]
pub enum EventValueError {
    /// A provider could not be registered
    #[error("{error_code}: {message}")]
    Registration {
        error_code: ErrorCode,
        message: String,
        occurrence_type: TypeName,
        value_type: TypeName,
    },

    /// Registration attempted after the window closed
    #[error("{error_code}: cannot register {occurrence_type}#{value_type}, registrations are closed")]
    RegistrationClosed {
        error_code: ErrorCode,
        occurrence_type: TypeName,
        value_type: TypeName,
    },

    /// A provider's exclusion rule fired during resolution. `message` is the
    /// provider author's text and is meant for script authors.
    #[error("{error_code}: {message}")]
    Excluded {
        error_code: ErrorCode,
        message: String,
        occurrence_type: TypeName,
        value_type: TypeName,
    },

    /// Time state outside past/present/future (-1, 0, 1)
    #[error("{error_code}: time state must be past, present or future (-1, 0 or 1), got {value}")]
    InvalidTimeState { error_code: ErrorCode, value: String },

    /// The root hint scope cannot be exited
    #[error("{error_code}: cannot exit the root {kind} scope")]
    HintScopeUnderflow {
        error_code: ErrorCode,
        kind: &'static str,
    },

    /// Manifest parsing or validation failure
    #[error("{error_code}: {message}")]
    Manifest {
        error_code: ErrorCode,
        message: String,
    },
}

impl EventValueError {
    /// Create a manifest error
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            error_code: EV0006,
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &ErrorCode {
        match self {
            Self::Registration { error_code, .. } => error_code,
            Self::RegistrationClosed { error_code, .. } => error_code,
            Self::Excluded { error_code, .. } => error_code,
            Self::InvalidTimeState { error_code, .. } => error_code,
            Self::HintScopeUnderflow { error_code, .. } => error_code,
            Self::Manifest { error_code, .. } => error_code,
        }
    }

    /// Get error information with help text
    pub fn error_info(&self) -> &'static ErrorInfo {
        self.error_code().info()
    }

    /// Whether this error should be shown to the script author as a compile
    /// diagnostic rather than to the extension author
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Excluded { .. })
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, EventValueError>;
