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

//! Time qualifiers for occurrence values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{EV0004, EventValueError};

/// Which temporal view of an occurrence's data is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeState {
    /// The value before the occurrence took effect ("past", "former")
    #[serde(alias = "former")]
    Past,
    /// The value as seen while the occurrence is handled
    #[default]
    #[serde(alias = "now")]
    Present,
    /// The value after the occurrence takes effect
    Future,
}

impl TimeState {
    pub const ALL: [TimeState; 3] = [TimeState::Past, TimeState::Present, TimeState::Future];

    /// Slot of this time state in per-time tables
    pub(crate) const fn index(self) -> usize {
        match self {
            TimeState::Past => 0,
            TimeState::Present => 1,
            TimeState::Future => 2,
        }
    }

    /// Legacy integer encoding: -1, 0, 1
    pub const fn as_i32(self) -> i32 {
        match self {
            TimeState::Past => -1,
            TimeState::Present => 0,
            TimeState::Future => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeState::Past => "Past",
            TimeState::Present => "Present",
            TimeState::Future => "Future",
        }
    }
}

impl TryFrom<i32> for TimeState {
    type Error = EventValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(TimeState::Past),
            0 => Ok(TimeState::Present),
            1 => Ok(TimeState::Future),
            _ => Err(EventValueError::InvalidTimeState {
                error_code: EV0004,
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeState::Past => write!(f, "past"),
            TimeState::Present => write!(f, "present"),
            TimeState::Future => write!(f, "future"),
        }
    }
}

impl FromStr for TimeState {
    type Err = EventValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "past" | "former" => Ok(TimeState::Past),
            "present" | "now" => Ok(TimeState::Present),
            "future" => Ok(TimeState::Future),
            _ => Err(EventValueError::InvalidTimeState {
                error_code: EV0004,
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_round_trip() {
        for time in TimeState::ALL {
            assert_eq!(TimeState::try_from(time.as_i32()).unwrap(), time);
        }
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let err = TimeState::try_from(2).unwrap_err();
        assert_eq!(*err.error_code(), EV0004);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("former".parse::<TimeState>().unwrap(), TimeState::Past);
        assert_eq!("NOW".parse::<TimeState>().unwrap(), TimeState::Present);
        let err = "later".parse::<TimeState>().unwrap_err();
        assert_eq!(*err.error_code(), EV0004);
        assert!(err.to_string().ends_with("got later"));
    }

    #[test]
    fn test_serde_accepts_aliases() {
        let times: Vec<TimeState> =
            serde_json::from_str(r#"["former", "now", "future", "past"]"#).unwrap();
        assert_eq!(
            times,
            vec![
                TimeState::Past,
                TimeState::Present,
                TimeState::Future,
                TimeState::Past
            ]
        );
        assert!(serde_json::from_str::<TimeState>(r#""later""#).is_err());
    }
}
