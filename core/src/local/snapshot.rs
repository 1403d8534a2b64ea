use gamesync_types::{GameId, LocalGame, LocalGameState};
use hashbrown::HashMap;

/// Point-in-time id → state mapping. Never mutated once built; a refresh
/// produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    games: HashMap<GameId, LocalGameState>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, game_id: &GameId) -> Option<LocalGameState> {
        self.games.get(game_id).copied()
    }

    pub fn contains(&self, game_id: &GameId) -> bool {
        self.games.contains_key(game_id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GameId, LocalGameState)> {
        self.games.iter().map(|(id, state)| (id, *state))
    }

    /// Records sorted by id.
    pub fn local_games(&self) -> Vec<LocalGame> {
        let mut games: Vec<LocalGame> = self
            .iter()
            .map(|(id, state)| LocalGame::new(id.clone(), state))
            .collect();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        games
    }

    /// New snapshot with `changes` applied. A `NONE` state removes the id.
    pub fn apply(&self, changes: &[LocalGame]) -> Snapshot {
        let mut games = self.games.clone();
        for change in changes {
            if change.local_game_state.is_none() {
                games.remove(&change.game_id);
            } else {
                games.insert(change.game_id.clone(), change.local_game_state);
            }
        }
        Snapshot { games }
    }

    /// Id → state with `NONE` entries dropped: what a consumer of change
    /// events can observe.
    pub fn observable(&self) -> HashMap<GameId, LocalGameState> {
        self.iter()
            .filter(|(_, state)| !state.is_none())
            .map(|(id, state)| (id.clone(), state))
            .collect()
    }
}

impl FromIterator<LocalGame> for Snapshot {
    /// Later records for the same id replace earlier ones.
    fn from_iter<I: IntoIterator<Item = LocalGame>>(iter: I) -> Self {
        Snapshot {
            games: iter
                .into_iter()
                .map(|g| (g.game_id, g.local_game_state))
                .collect(),
        }
    }
}
