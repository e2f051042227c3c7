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

//! Error code system in the style of the Rust compiler (E0001, E0002, ...)
//!
//! Every error raised by the registry carries an `EVnnnn` code. The code maps to
//! an [`ErrorInfo`] with a title, a longer description and a help line so that
//! hosts can render compile diagnostics without parsing messages.

use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Registration-time errors (EV0001-EV0002)
    Registration,
    /// Resolution-time errors (EV0003-EV0004)
    Resolution,
    /// Hint store errors (EV0005)
    Hints,
    /// Manifest and tooling errors (EV0006+)
    Manifest,
}

/// Error code following the compiler pattern (EV0001, EV0002, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Get the full error code string (e.g., "EV0001")
    pub fn code_str(&self) -> String {
        format!("EV{:04}", self.code)
    }

    /// Get error information from the registry
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_REGISTRY.get_error_info(self)
    }

    /// Get error category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self.code {
            1..=2 => ErrorCategory::Registration,
            3..=4 => ErrorCategory::Resolution,
            5 => ErrorCategory::Hints,
            _ => ErrorCategory::Manifest,
        }
    }

    /// Get human-readable description for this error code
    pub fn description(&self) -> &'static str {
        self.info().title
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EV{:04}", self.code)
    }
}

/// Rich error information
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error code number
    pub code: u16,
    /// Human-readable error title
    pub title: &'static str,
    /// Detailed description of the error
    pub description: &'static str,
    /// Help information and suggested solutions
    pub help: &'static str,
}

impl ErrorInfo {
    pub const fn new(
        code: u16,
        title: &'static str,
        description: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            code,
            title,
            description,
            help,
        }
    }
}

/// Central error registry containing all error definitions
pub struct ErrorRegistry;

impl ErrorRegistry {
    /// Get error information for a given error code
    pub fn get_error_info(&self, error_code: &ErrorCode) -> &'static ErrorInfo {
        match error_code.code {
            1 => &EV0001_INFO,
            2 => &EV0002_INFO,
            3 => &EV0003_INFO,
            4 => &EV0004_INFO,
            5 => &EV0005_INFO,
            6 => &EV0006_INFO,
            _ => &UNKNOWN_ERROR_INFO,
        }
    }
}

/// Global error registry instance
pub static ERROR_REGISTRY: ErrorRegistry = ErrorRegistry;

/// Exclusion rule declared without an explanatory message
pub const EV0001: ErrorCode = ErrorCode::new(1);
/// Registration attempted after the registration window closed
pub const EV0002: ErrorCode = ErrorCode::new(2);
/// A provider's exclusion rule matched the requested occurrence
pub const EV0003: ErrorCode = ErrorCode::new(3);
/// Time qualifier outside past/present/future
pub const EV0004: ErrorCode = ErrorCode::new(4);
/// Attempt to leave the root hint scope
pub const EV0005: ErrorCode = ErrorCode::new(5);
/// Malformed manifest
pub const EV0006: ErrorCode = ErrorCode::new(6);

static EV0001_INFO: ErrorInfo = ErrorInfo::new(
    1,
    "Missing exclusion message",
    "A provider was registered with excluded occurrence kinds but without the message shown to script authors when the exclusion fires.",
    "Pass an exclusion message together with the excluded kinds.",
);

static EV0002_INFO: ErrorInfo = ErrorInfo::new(
    2,
    "Registration window closed",
    "Providers can only be registered while extensions are loading. The registry stops accepting registrations once compilation starts.",
    "Move the registration into the extension's load phase.",
);

static EV0003_INFO: ErrorInfo = ErrorInfo::new(
    3,
    "Value excluded for occurrence",
    "The provider that would answer this query explicitly forbids the requested occurrence kind.",
    "Use a different value or a different occurrence; the message explains why the value is unavailable.",
);

static EV0004_INFO: ErrorInfo = ErrorInfo::new(
    4,
    "Invalid time state",
    "Time states are past (-1), present (0) and future (1). Text input also accepts \"former\" and \"now\".",
    "Use one of the TimeState variants.",
);

static EV0005_INFO: ErrorInfo = ErrorInfo::new(
    5,
    "Hint scope underflow",
    "exit_scope was called more often than enter_scope; the root hint scope cannot be removed.",
    "Pair every exit_scope with a preceding enter_scope.",
);

static EV0006_INFO: ErrorInfo = ErrorInfo::new(
    6,
    "Invalid manifest",
    "The registry manifest could not be parsed or references unknown names.",
    "Check the manifest against the documented JSON layout.",
);

static UNKNOWN_ERROR_INFO: ErrorInfo = ErrorInfo::new(
    0,
    "Unknown error",
    "An unknown error occurred.",
    "Please report this as a bug.",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatting() {
        assert_eq!(EV0001.to_string(), "EV0001");
        assert_eq!(EV0006.code_str(), "EV0006");
    }

    #[test]
    fn test_categories() {
        assert_eq!(EV0002.category(), ErrorCategory::Registration);
        assert_eq!(EV0003.category(), ErrorCategory::Resolution);
        assert_eq!(EV0005.category(), ErrorCategory::Hints);
        assert_eq!(EV0006.category(), ErrorCategory::Manifest);
    }

    #[test]
    fn test_info_lookup() {
        assert_eq!(EV0003.description(), "Value excluded for occurrence");
        assert_eq!(ErrorCode::new(999).info().code, 0);
    }
}
