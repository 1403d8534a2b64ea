use gamesync_types::{LocalGame, LocalGameState};

use super::Snapshot;

/// Transitions that turn `old` into `new`.
///
/// Removed ids become `NONE`, added ids carry their full new state, ids in
/// both are reported only if the state differs. Output is sorted by id;
/// consumers should treat it as a set.
pub fn state_changes(old: &Snapshot, new: &Snapshot) -> Vec<LocalGame> {
    let mut changes: Vec<LocalGame> = old
        .iter()
        .filter(|(id, _)| !new.contains(id))
        .map(|(id, _)| LocalGame::new(id.clone(), LocalGameState::NONE))
        .collect();

    changes.extend(
        new.iter()
            .filter(|(id, state)| old.state(id) != Some(*state))
            .map(|(id, state)| LocalGame::new(id.clone(), state)),
    );

    changes.sort_by(|a, b| a.game_id.cmp(&b.game_id));
    changes
}
