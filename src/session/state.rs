use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Waiting for the Start affordance; no run exists yet.
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
    Completed,
    Exited,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Completed | Self::Exited)
    }

    /// Canonical result code for a terminal status.
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            Self::Won => Some(ResultCode::Win),
            Self::Lost => Some(ResultCode::Lose),
            Self::Completed => Some(ResultCode::Completed),
            Self::Exited => Some(ResultCode::Exit),
            Self::Idle | Self::Playing => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Playing => "Playing",
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::Completed => "Completed",
            Self::Exited => "Exited",
        }
    }
}

/// Language-independent outcome label sent with every result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Completed,
    Win,
    Lose,
    GameOver,
    Exit,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Win => "win",
            Self::Lose => "lose",
            Self::GameOver => "game_over",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "win" => Ok(Self::Win),
            "lose" => Ok(Self::Lose),
            "game_over" => Ok(Self::GameOver),
            "exit" => Ok(Self::Exit),
            other => Err(anyhow!("unknown result code '{other}'")),
        }
    }
}

/// Who is playing. Display language is not part of the profile and never
/// reaches scoring or the result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub identity: String,
    pub age: u32,
}

impl PlayerProfile {
    pub const GUEST: &'static str = "Guest";

    pub fn new(identity: impl Into<String>, age: u32) -> Self {
        Self {
            identity: identity.into(),
            age,
        }
    }

    /// Build from raw launcher arguments, substituting defaults for
    /// anything missing or unparsable.
    pub fn from_args(identity: Option<&str>, age: Option<&str>) -> Self {
        let identity = identity
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::GUEST);
        let age = age.and_then(|a| a.trim().parse::<u32>().ok()).unwrap_or(0);
        Self::new(identity, age)
    }
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new(Self::GUEST, 0)
    }
}

/// Immutable record of one finished run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResult {
    #[serde(rename = "username")]
    pub identity: String,
    pub age: u32,
    #[serde(rename = "game_name")]
    pub game_id: String,
    pub score: u32,
    pub time_seconds: u64,
    pub result: ResultCode,
    /// Local bookkeeping, not part of the reporting payload.
    #[serde(skip)]
    pub run_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        assert_eq!(PlayerProfile::from_args(None, None), PlayerProfile::new("Guest", 0));
        assert_eq!(PlayerProfile::from_args(Some("  "), Some("abc")), PlayerProfile::new("Guest", 0));
        assert_eq!(PlayerProfile::from_args(Some("maria"), Some("-4")).age, 0);
        assert_eq!(PlayerProfile::from_args(Some("maria"), Some(" 71 ")), PlayerProfile::new("maria", 71));
    }

    #[test]
    fn test_terminal_statuses_map_to_codes() {
        assert_eq!(SessionStatus::Won.result_code(), Some(ResultCode::Win));
        assert_eq!(SessionStatus::Lost.result_code(), Some(ResultCode::Lose));
        assert_eq!(SessionStatus::Completed.result_code(), Some(ResultCode::Completed));
        assert_eq!(SessionStatus::Exited.result_code(), Some(ResultCode::Exit));
        assert_eq!(SessionStatus::Playing.result_code(), None);
        assert!(!SessionStatus::Idle.is_terminal());
    }

    #[test]
    fn test_result_payload_field_names() {
        let result = SessionResult {
            identity: "nikos".into(),
            age: 64,
            game_id: "exercise_2".into(),
            score: 12,
            time_seconds: 60,
            result: ResultCode::Lose,
            run_id: "r1".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "username": "nikos",
                "age": 64,
                "game_name": "exercise_2",
                "score": 12,
                "time_seconds": 60,
                "result": "lose",
            })
        );
    }

    #[test]
    fn test_result_code_parsing() {
        assert_eq!("game_over".parse::<ResultCode>().unwrap(), ResultCode::GameOver);
        assert_eq!(ResultCode::GameOver.to_string(), "game_over");
        assert!("victory".parse::<ResultCode>().is_err());
    }
}
