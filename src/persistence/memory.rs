//! In-memory game store.
//!
//! Records are kept as encoded bytes, exactly as a real backend would see
//! them, so codec problems surface in tests too.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::codec::{decode, encode};
use super::store::{GameStore, StorageError, StorageResult};
use crate::core::{GameId, State};
use crate::game::{GameHeader, GameSnapshot};

#[derive(Default)]
struct StoredGame {
    header: Vec<u8>,
    states: Vec<Vec<u8>>,
}

/// Thread-safe in-memory `GameStore`.
///
/// Clones share the same storage.
///
/// ```
/// use nodewar::persistence::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<FxHashMap<GameId, StoredGame>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> StorageResult<MutexGuard<'_, FxHashMap<GameId, StoredGame>>> {
        self.records
            .lock()
            .map_err(|_| StorageError::backend("in-memory store lock poisoned"))
    }

    /// Number of registered games.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().map_or(0, |r| r.len())
    }

    /// Check if no game is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of states stored for `game`.
    #[must_use]
    pub fn saved_states(&self, game: GameId) -> usize {
        self.records()
            .ok()
            .and_then(|r| r.get(&game).map(|g| g.states.len()))
            .unwrap_or(0)
    }

    /// Drop every record.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records() {
            records.clear();
        }
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn register(&self, game: GameId, header: &GameHeader) -> StorageResult<()> {
        let bytes = encode(header)?;
        let mut records = self.records()?;
        let stored = records.entry(game).or_default();
        if stored.header != bytes {
            if !stored.states.is_empty() {
                debug!(%game, dropped = stored.states.len(), "Header replaced");
            }
            stored.header = bytes;
            stored.states.clear();
        }
        Ok(())
    }

    async fn save(&self, game: GameId, state: &State) -> StorageResult<()> {
        let bytes = encode(state)?;
        let mut records = self.records()?;
        let stored = records.get_mut(&game).ok_or(StorageError::NotFound { game })?;

        let turn = usize::try_from(state.turn).map_err(|e| StorageError::backend(e.to_string()))?;
        match turn.cmp(&stored.states.len()) {
            std::cmp::Ordering::Less => stored.states[turn] = bytes,
            std::cmp::Ordering::Equal => stored.states.push(bytes),
            std::cmp::Ordering::Greater => {
                return Err(StorageError::backend(format!(
                    "turn {turn} saved before turn {}",
                    stored.states.len()
                )));
            }
        }
        debug!(%game, turn, "Stored state");
        Ok(())
    }

    async fn load(&self, game: GameId) -> StorageResult<GameSnapshot> {
        let records = self.records()?;
        let stored = records.get(&game).ok_or(StorageError::NotFound { game })?;

        let header: GameHeader = decode(&stored.header)?;
        let history = stored
            .states
            .iter()
            .map(|bytes| decode::<State>(bytes))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(GameSnapshot::new(header, history))
    }

    async fn contains(&self, game: GameId) -> StorageResult<bool> {
        Ok(self.records()?.contains_key(&game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardTemplate;
    use crate::core::{Action, ActionId, GameConfig, NodeId, PlayerId, UnitId};
    use crate::game::Game;

    fn started_game() -> Game {
        Game::create(
            GameId(7),
            BoardTemplate::ring(),
            GameConfig::default(),
            [PlayerId(1), PlayerId(2)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryStore::new();
        let mut game = started_game();
        game.submit(PlayerId(1), Action::move_to(ActionId(1), UnitId(1), NodeId(2)))
            .unwrap();

        store.register(game.id(), &game.header().unwrap()).await.unwrap();
        for state in game.history() {
            store.save(game.id(), state).await.unwrap();
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.saved_states(game.id()), 2);

        let snapshot = store.load(game.id()).await.unwrap();
        assert_eq!(snapshot, game.snapshot().unwrap());
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.load(GameId(1)).await.unwrap_err(),
            StorageError::NotFound { game: GameId(1) }
        );
    }

    #[tokio::test]
    async fn test_save_requires_register() {
        let store = InMemoryStore::new();
        let game = started_game();
        let state = game.current_state().unwrap();
        assert_eq!(
            store.save(game.id(), state).await.unwrap_err(),
            StorageError::NotFound { game: game.id() }
        );
    }

    #[tokio::test]
    async fn test_save_rejects_gap_and_accepts_retry() {
        let store = InMemoryStore::new();
        let mut game = started_game();
        game.submit(PlayerId(1), Action::pass(ActionId(1))).unwrap();
        let history: Vec<State> = game.history().iter().cloned().collect();

        store.register(game.id(), &game.header().unwrap()).await.unwrap();
        assert!(matches!(
            store.save(game.id(), &history[1]).await,
            Err(StorageError::Backend { .. })
        ));

        store.save(game.id(), &history[0]).await.unwrap();
        store.save(game.id(), &history[0]).await.unwrap();
        store.save(game.id(), &history[1]).await.unwrap();
        assert_eq!(store.saved_states(game.id()), 2);
    }

    #[tokio::test]
    async fn test_register_new_header_drops_states() {
        let store = InMemoryStore::new();
        let mut game = started_game();
        game.submit(PlayerId(1), Action::pass(ActionId(1))).unwrap();
        let header = game.header().unwrap();

        store.register(game.id(), &header).await.unwrap();
        for state in game.history() {
            store.save(game.id(), state).await.unwrap();
        }
        // Same header again: a retry, nothing lost.
        store.register(game.id(), &header).await.unwrap();
        assert_eq!(store.saved_states(game.id()), 2);
        assert!(store.contains(game.id()).await.unwrap());

        let other = Game::create(
            game.id(),
            BoardTemplate::line(),
            GameConfig::default(),
            [PlayerId(1), PlayerId(2)],
        )
        .unwrap();
        store.register(other.id(), &other.header().unwrap()).await.unwrap();
        assert_eq!(store.saved_states(game.id()), 0);
        store.save(other.id(), other.current_state().unwrap()).await.unwrap();
        assert_eq!(store.load(game.id()).await.unwrap(), other.snapshot().unwrap());
        assert!(!store.contains(GameId(8)).await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = InMemoryStore::new();
        let other = store.clone();
        let game = started_game();
        store.register(game.id(), &game.header().unwrap()).await.unwrap();
        assert_eq!(other.len(), 1);
        other.clear();
        assert!(store.is_empty());
    }
}
