//! Async façade over many games.
//!
//! ## Concurrency
//!
//! Each game sits behind its own `tokio::sync::Mutex`, so actions for one
//! game are validated, applied and persisted strictly one at a time in
//! arrival order. Distinct games share nothing but the registry map, which is
//! only locked long enough to look a game up.
//!
//! ## Persistence
//!
//! After a successful apply the new state is saved through the injected
//! `GameStore`, bounded by `ServiceConfig::persist_timeout`. A failed save
//! does not undo the action: `submit` still returns the new state with the
//! storage error attached, and `persist` retries every unsaved state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::board::TemplateRegistry;
use crate::core::{Action, GameConfig, GameId, GamePhase, PlayerId, State};
use crate::error::{EngineError, Result};
use crate::game::Game;
use crate::persistence::{GameStore, StorageError, StorageResult};
use crate::rules::{GameResult, LastPlayerStanding, WinCondition};

/// Default bound on a single storage round-trip.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Service-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bound on each `GameStore` call.
    pub persist_timeout: Duration,

    /// Rules applied to every game created by the service.
    pub game_config: GameConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            game_config: GameConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage timeout.
    #[must_use]
    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Set the rules for new games.
    #[must_use]
    pub fn with_game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig {
            message: e.to_string(),
        })
    }
}

/// Outcome of a successful `submit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// The state the action produced.
    pub state: State,

    /// Set when this action completed the game.
    pub result: Option<GameResult>,

    /// Set when the state could not be saved. The action still counts.
    pub persist_error: Option<StorageError>,
}

struct Slot {
    game: Game,
    registered: bool,
    /// Number of leading history states known to be stored.
    saved: usize,
}

/// Hosts games and routes actions to them.
pub struct GameService {
    config: ServiceConfig,
    templates: TemplateRegistry,
    store: Arc<dyn GameStore>,
    win_condition: Arc<dyn WinCondition>,
    games: RwLock<FxHashMap<GameId, Arc<Mutex<Slot>>>>,
    next_id: AtomicU64,
}

impl GameService {
    /// Create a service with built-in templates and default settings.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            config: ServiceConfig::default(),
            templates: TemplateRegistry::with_builtins(),
            store,
            win_condition: Arc::new(LastPlayerStanding),
            games: RwLock::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Terminal predicate for games created or loaded from now on.
    #[must_use]
    pub fn with_win_condition(mut self, condition: Arc<dyn WinCondition>) -> Self {
        self.win_condition = condition;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Ids of every game held in memory.
    pub async fn game_ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.games.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // === Lifecycle ===

    /// Create a game on `variant` and seat `players` in order.
    ///
    /// The id is the next one not held in memory or in the store, so games
    /// left by an earlier host are never overwritten. If enough players are
    /// given the game starts immediately and its initial state is saved. A
    /// failed save is logged and retried by the next `submit` or `persist`.
    #[instrument(skip(self, players), fields(seated = players.len()))]
    pub async fn create_game(&self, variant: &str, players: Vec<PlayerId>) -> Result<GameId> {
        let template = self.templates.resolve(variant)?;
        let id = self.allocate_id().await?;
        let game = Game::create(id, template, self.config.game_config.clone(), players)?
            .with_win_condition(Arc::clone(&self.win_condition));

        let mut slot = Slot {
            game,
            registered: false,
            saved: 0,
        };
        if let Err(err) = self.sync(&mut slot).await {
            warn!(game = %id, error = %err, "Initial save failed");
        }

        info!(game = %id, variant, phase = ?slot.game.phase(), "Created game");
        self.games.write().await.insert(id, Arc::new(Mutex::new(slot)));
        Ok(id)
    }

    /// Seat a player in a lobby. Returns the phase afterwards.
    #[instrument(skip(self))]
    pub async fn join(&self, game: GameId, player: PlayerId) -> Result<GamePhase> {
        let slot = self.slot(game).await?;
        let mut slot = slot.lock().await;
        let phase = slot.game.join(player)?;
        if phase == GamePhase::InProgress {
            if let Err(err) = self.sync(&mut slot).await {
                warn!(%game, error = %err, "Initial save failed");
            }
        }
        Ok(phase)
    }

    /// Remove a player from a lobby.
    #[instrument(skip(self))]
    pub async fn leave(&self, game: GameId, player: PlayerId) -> Result<()> {
        let slot = self.slot(game).await?;
        let mut slot = slot.lock().await;
        slot.game.leave(player)
    }

    /// Rehydrate a game from the store.
    ///
    /// A game already in memory is left untouched.
    #[instrument(skip(self))]
    pub async fn load_game(&self, game: GameId) -> Result<GameId> {
        if self.games.read().await.contains_key(&game) {
            return Ok(game);
        }

        let snapshot = self
            .timed("load", game, self.store.load(game))
            .await
            .map_err(|err| match err {
                StorageError::NotFound { game } => EngineError::GameNotFound { game },
                other => EngineError::Storage(other),
            })?;
        if snapshot.header.id != game {
            return Err(EngineError::corrupt(format!(
                "record for {game} is labelled {}",
                snapshot.header.id
            )));
        }

        let restored = Game::restore(snapshot, Arc::clone(&self.win_condition))?;
        let saved = restored.history().len();
        info!(%game, turns = saved, phase = ?restored.phase(), "Loaded game");

        let slot = Slot {
            game: restored,
            registered: true,
            saved,
        };
        self.games
            .write()
            .await
            .entry(game)
            .or_insert_with(|| Arc::new(Mutex::new(slot)));
        Ok(game)
    }

    /// Drop a game from memory. Stored records are kept.
    pub async fn unload(&self, game: GameId) -> bool {
        self.games.write().await.remove(&game).is_some()
    }

    // === Turns ===

    /// Submit an action for `player` in `game`.
    ///
    /// Validation errors are returned as `Err` and change nothing. Once the
    /// action applies the call succeeds, even if the save fails.
    #[instrument(skip(self, action), fields(action = %action.id))]
    pub async fn submit(&self, game: GameId, player: PlayerId, action: Action) -> Result<Submission> {
        let slot = self.slot(game).await?;
        let mut slot = slot.lock().await;

        let state = slot.game.submit(player, action)?.clone();
        let persist_error = self.sync(&mut slot).await.err();
        if let Some(err) = &persist_error {
            warn!(%game, turn = state.turn, error = %err, "State applied but not saved");
        }

        Ok(Submission {
            result: state.result.clone(),
            state,
            persist_error,
        })
    }

    /// The latest state of `game`.
    pub async fn current_state(&self, game: GameId) -> Result<State> {
        let slot = self.slot(game).await?;
        let slot = slot.lock().await;
        slot.game.current_state().cloned()
    }

    /// Every state of `game`, oldest first.
    pub async fn history(&self, game: GameId) -> Result<Vec<State>> {
        let slot = self.slot(game).await?;
        let slot = slot.lock().await;
        Ok(slot.game.history().iter().cloned().collect())
    }

    /// Save every state not yet stored.
    #[instrument(skip(self))]
    pub async fn persist(&self, game: GameId) -> Result<()> {
        let slot = self.slot(game).await?;
        let mut slot = slot.lock().await;
        self.sync(&mut slot).await?;
        Ok(())
    }

    // === Internals ===

    async fn slot(&self, game: GameId) -> Result<Arc<Mutex<Slot>>> {
        self.games
            .read()
            .await
            .get(&game)
            .cloned()
            .ok_or(EngineError::GameNotFound { game })
    }

    /// Next id held neither in memory nor in the store.
    async fn allocate_id(&self) -> Result<GameId> {
        loop {
            let id = GameId(self.next_id.fetch_add(1, Ordering::Relaxed));
            if self.games.read().await.contains_key(&id) {
                continue;
            }
            if !self.timed("contains", id, self.store.contains(id)).await? {
                return Ok(id);
            }
            debug!(game = %id, "Id already stored, skipping");
        }
    }

    /// Bring the store up to date with the game's history.
    async fn sync(&self, slot: &mut Slot) -> StorageResult<()> {
        let Some(header) = slot.game.header() else {
            return Ok(());
        };
        let id = slot.game.id();

        if !slot.registered {
            self.timed("register", id, self.store.register(id, &header)).await?;
            slot.registered = true;
        }
        while slot.saved < slot.game.history().len() {
            let Some(state) = slot.game.history().get(slot.saved) else {
                break;
            };
            self.timed("save", id, self.store.save(id, state)).await?;
            slot.saved += 1;
        }
        Ok(())
    }

    /// Run one storage call under the configured timeout, logging its duration.
    async fn timed<T>(
        &self,
        operation: &'static str,
        game: GameId,
        call: impl Future<Output = StorageResult<T>>,
    ) -> StorageResult<T> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.persist_timeout, call)
            .await
            .unwrap_or(Err(StorageError::Timeout));
        debug!(
            %game,
            operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Storage round-trip"
        );
        outcome
    }
}
