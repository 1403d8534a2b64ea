//! Shared types for gamesync.
//!
//! Everything that crosses a boundary (backend records, host notifications,
//! the on-disk config) lives here so core and the agent agree on one shape.

pub mod config;
mod game;
mod local;

pub use config::{AgentConfig, ChangeSignalKind};
pub use game::{
    Achievement, FriendInfo, GameId, GameTime, OwnedGame, OwnedGameRecord, UserId, UserProfile,
};
pub use local::{LocalGame, LocalGameState};
