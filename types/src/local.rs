use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::GameId;

/// Install/run flags for a game on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalGameState(u8);

impl LocalGameState {
    pub const NONE: Self = Self(0);
    pub const INSTALLED: Self = Self(1);
    pub const RUNNING: Self = Self(2);

    const ALL: u8 = Self::INSTALLED.0 | Self::RUNNING.0;

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, dropping any unknown flags.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for LocalGameState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LocalGameState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for LocalGameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("None");
        }
        let mut parts = Vec::with_capacity(2);
        if self.contains(Self::INSTALLED) {
            parts.push("Installed");
        }
        if self.contains(Self::RUNNING) {
            parts.push("Running");
        }
        f.write_str(&parts.join("|"))
    }
}

/// A game id together with its local state. Doubles as the state-change
/// notification: `NONE` means the game is gone from this machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalGame {
    pub game_id: GameId,
    pub local_game_state: LocalGameState,
}

impl LocalGame {
    pub fn new(game_id: impl Into<GameId>, local_game_state: LocalGameState) -> Self {
        Self {
            game_id: game_id.into(),
            local_game_state,
        }
    }
}
