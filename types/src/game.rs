use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a game (an app id, kept as text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Backend identifier of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity resolved during authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub login: String,
}

/// One row of the backend's owned-games listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedGameRecord {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub hours_played_total: f64,
    /// Epoch seconds. Absent for games that were never launched.
    #[serde(default)]
    pub last_played: Option<i64>,
}

impl OwnedGameRecord {
    /// Total play time in whole minutes.
    pub fn time_played_minutes(&self) -> u32 {
        if !self.hours_played_total.is_finite() || self.hours_played_total <= 0.0 {
            return 0;
        }
        (self.hours_played_total * 60.0).floor().min(u32::MAX as f64) as u32
    }

    /// Play-time entry for this game, `None` if it was never played.
    pub fn game_time(&self) -> Option<GameTime> {
        let last_played = self.last_played?;
        Some(GameTime {
            game_id: self.id.clone(),
            time_played: self.time_played_minutes(),
            last_played,
        })
    }
}

/// Owned game as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedGame {
    pub game_id: GameId,
    pub game_title: String,
}

impl From<&OwnedGameRecord> for OwnedGame {
    fn from(record: &OwnedGameRecord) -> Self {
        Self {
            game_id: record.id.clone(),
            game_title: record.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTime {
    pub game_id: GameId,
    /// Minutes.
    pub time_played: u32,
    /// Epoch seconds.
    pub last_played: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Epoch seconds.
    pub unlock_time: i64,
    pub name: String,
}

impl Achievement {
    pub fn new(unlock_time: i64, name: impl Into<String>) -> Self {
        Self {
            unlock_time,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInfo {
    pub user_id: UserId,
    pub user_name: String,
}
