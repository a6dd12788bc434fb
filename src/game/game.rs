//! The turn-based state machine.
//!
//! ## Lifecycle
//!
//! ```text
//! AwaitingPlayers --(min players seated)--> InProgress --(terminal)--> Completed
//! ```
//!
//! While `AwaitingPlayers`, players `join` and `leave` freely. When the
//! configured minimum is reached the board is built from the template and the
//! initial state (turn 0) is appended to history.
//!
//! ## Submitting actions
//!
//! `submit` is the only way to change a started game. Each call either appends
//! exactly one `State` or returns an error and changes nothing:
//!
//! 1. `GameAlreadyComplete` / `GameNotStarted` for the wrong phase
//! 2. `WrongTurn` unless the caller is the active player
//! 3. `Action::validate` against the current board
//! 4. apply on a copy of the board, append the new state
//! 5. evaluate the `WinCondition`, then advance the turn to the next player
//!    who still has an active unit
//!
//! History is append-only; `history().len()` is always the number of applied
//! actions plus one once the game has started.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use im::Vector;
use tracing::{debug, info, instrument};

use super::snapshot::{GameHeader, GameSnapshot};
use crate::board::{Board, BoardTemplate};
use crate::core::{
    Action, ActionRecord, GameConfig, GameId, GamePhase, PlayerId, State, TurnOrder,
};
use crate::error::{EngineError, Result};
use crate::rules::{GameResult, LastPlayerStanding, WinCondition};

/// A single game.
#[derive(Clone, Debug)]
pub struct Game {
    id: GameId,
    variant: String,
    config: GameConfig,
    order: TurnOrder,
    phase: GamePhase,
    /// Template used to build the board; dropped once play starts.
    lobby: Option<BoardTemplate>,
    history: Vector<State>,
    win_condition: Arc<dyn WinCondition>,
    created_at: DateTime<Utc>,
}

impl Game {
    /// Open a lobby for `template`.
    ///
    /// Fails with `InvalidConfig` if the template cannot seat
    /// `config.min_players`.
    pub fn new(id: GameId, template: BoardTemplate, config: GameConfig) -> Result<Self> {
        template.validate()?;
        check_config(&config, &template)?;

        Ok(Self {
            id,
            variant: template.variant.clone(),
            config,
            order: TurnOrder::new(Vec::new()),
            phase: GamePhase::AwaitingPlayers,
            lobby: Some(template),
            history: Vector::new(),
            win_condition: Arc::new(LastPlayerStanding),
            created_at: Utc::now(),
        })
    }

    /// Open a lobby and seat `players` in order, starting the game if enough
    /// have joined.
    pub fn create(
        id: GameId,
        template: BoardTemplate,
        config: GameConfig,
        players: impl IntoIterator<Item = PlayerId>,
    ) -> Result<Self> {
        let mut game = Self::new(id, template, config)?;
        for player in players {
            game.seat(player)?;
        }
        game.try_start(Utc::now())?;
        Ok(game)
    }

    /// Replace the terminal predicate.
    #[must_use]
    pub fn with_win_condition(mut self, condition: Arc<dyn WinCondition>) -> Self {
        self.win_condition = condition;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Seated players in turn order.
    #[must_use]
    pub fn players(&self) -> &[PlayerId] {
        self.order.players()
    }

    /// The player expected to act next. `None` before start and after completion.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::InProgress => self.order.active(),
            _ => None,
        }
    }

    /// Outcome, once complete.
    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.history.last().and_then(|s| s.result.as_ref())
    }

    /// The latest state.
    pub fn current_state(&self) -> Result<&State> {
        self.history.last().ok_or(EngineError::GameNotStarted)
    }

    /// The current board.
    pub fn board(&self) -> Result<&Board> {
        self.current_state().map(|s| &s.board)
    }

    /// Every state since the start, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<State> {
        &self.history
    }

    /// Records of every applied action, in order.
    pub fn records(&self) -> impl Iterator<Item = &ActionRecord> {
        self.history.iter().filter_map(|s| s.record.as_ref())
    }

    /// Header for persistence. `None` until the game has started.
    #[must_use]
    pub fn header(&self) -> Option<GameHeader> {
        (!self.history.is_empty()).then(|| GameHeader {
            id: self.id,
            variant: self.variant.clone(),
            config: self.config.clone(),
            players: self.order.players().to_vec(),
            created_at: self.created_at,
        })
    }

    /// Header plus full history. `None` until the game has started.
    #[must_use]
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.header()
            .map(|header| GameSnapshot::new(header, self.history.iter().cloned().collect()))
    }

    // === Lobby ===

    /// Seat a player. Starts the game once the minimum is reached.
    ///
    /// Returns the phase after joining.
    #[instrument(skip(self), fields(game = %self.id))]
    pub fn join(&mut self, player: PlayerId) -> Result<GamePhase> {
        self.seat(player)?;
        info!(%player, seated = self.order.len(), "Player joined");
        self.try_start(Utc::now())?;
        Ok(self.phase)
    }

    /// Remove a player from the lobby.
    #[instrument(skip(self), fields(game = %self.id))]
    pub fn leave(&mut self, player: PlayerId) -> Result<()> {
        if self.phase != GamePhase::AwaitingPlayers {
            return Err(EngineError::LobbyClosed);
        }
        if !self.order.remove(player) {
            return Err(EngineError::UnknownPlayer { player });
        }
        info!(%player, seated = self.order.len(), "Player left");
        Ok(())
    }

    fn seat(&mut self, player: PlayerId) -> Result<()> {
        let template = match (&self.lobby, self.phase) {
            (Some(template), GamePhase::AwaitingPlayers) => template,
            _ => return Err(EngineError::LobbyClosed),
        };
        if self.order.contains(player) {
            return Err(EngineError::DuplicatePlayer { player });
        }
        let seats = self.config.seat_limit(template.seat_count());
        if self.order.len() >= seats {
            return Err(EngineError::GameFull { seats });
        }
        self.order.push(player);
        Ok(())
    }

    fn try_start(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.phase != GamePhase::AwaitingPlayers || self.order.len() < self.config.min_players {
            return Ok(());
        }
        let Some(template) = &self.lobby else {
            return Err(EngineError::LobbyClosed);
        };

        let board = template.build(self.order.players(), &self.config)?;
        let first = self.order.active().ok_or(EngineError::GameNotStarted)?;

        self.history
            .push_back(State::initial(board, self.order.active_seat(), first, at));
        self.phase = GamePhase::InProgress;
        self.lobby = None;
        info!(game = %self.id, variant = %self.variant, players = self.order.len(), "Game started");
        Ok(())
    }

    // === Turns ===

    /// Submit an action on behalf of `player`, timestamped now.
    pub fn submit(&mut self, player: PlayerId, action: Action) -> Result<&State> {
        self.submit_at(player, action, Utc::now())
    }

    /// Submit an action with an explicit timestamp.
    ///
    /// On error nothing changes: board, history and turn pointer are exactly
    /// as before the call.
    #[instrument(skip(self, action), fields(game = %self.id, action = %action.id))]
    pub fn submit_at(
        &mut self,
        player: PlayerId,
        action: Action,
        at: DateTime<Utc>,
    ) -> Result<&State> {
        match self.phase {
            GamePhase::Completed => return Err(EngineError::GameAlreadyComplete),
            GamePhase::AwaitingPlayers => return Err(EngineError::GameNotStarted),
            GamePhase::InProgress => {}
        }
        if self.order.active() != Some(player) {
            debug!(%player, active = ?self.order.active(), "Rejected out-of-turn action");
            return Err(EngineError::WrongTurn { player });
        }

        let previous = self.current_state()?;
        let mut board = previous.board.clone();
        let turn = previous.turn + 1;

        if let Err(err) = action.validate(&board, player, &self.config) {
            debug!(%player, error = %err, "Action failed validation");
            return Err(err);
        }
        let delta = action.apply(&mut board, &self.config)?;

        let mut order = self.order.clone();
        let result = self
            .win_condition
            .evaluate(&board, order.players(), turn)
            .or_else(|| match order.advance(|p| board.has_active_units(p)) {
                Some(_) => None,
                None => Some(GameResult::Draw),
            });

        let phase = if result.is_some() {
            GamePhase::Completed
        } else {
            GamePhase::InProgress
        };
        let state = State {
            turn,
            timestamp: at,
            active_seat: order.active_seat(),
            active_player: result.is_none().then(|| order.active()).flatten(),
            phase,
            result,
            record: Some(ActionRecord::new(player, action, turn, delta)),
            board,
        };

        self.order = order;
        self.phase = phase;
        self.history.push_back(state);

        let state = self.current_state()?;
        match &state.result {
            Some(result) => info!(turn, ?result, "Game completed"),
            None => debug!(turn, next = ?state.active_player, "Action applied"),
        }
        Ok(state)
    }

    // === Rehydration ===

    /// Rebuild a started game from its initial state by re-applying `records`.
    ///
    /// Every replayed state carries the initial state's timestamp.
    pub fn replay(
        header: &GameHeader,
        initial: State,
        records: impl IntoIterator<Item = ActionRecord>,
        win_condition: Arc<dyn WinCondition>,
    ) -> Result<Self> {
        if initial.turn != 0 || initial.record.is_some() {
            return Err(EngineError::corrupt("first state is not an initial state"));
        }
        initial.board.validate()?;

        let order = TurnOrder::with_active(header.players.clone(), initial.active_seat)
            .ok_or_else(|| {
                EngineError::corrupt(format!("active seat {} does not exist", initial.active_seat))
            })?;
        if initial.active_player != order.active() {
            return Err(EngineError::corrupt("active player does not match the seat order"));
        }
        if initial.board.variant() != header.variant {
            return Err(EngineError::corrupt(format!(
                "board variant '{}' does not match header '{}'",
                initial.board.variant(),
                header.variant
            )));
        }

        let at = initial.timestamp;
        let mut history = Vector::new();
        history.push_back(initial);
        let mut game = Self {
            id: header.id,
            variant: header.variant.clone(),
            config: header.config.clone(),
            order,
            phase: GamePhase::InProgress,
            lobby: None,
            history,
            win_condition,
            created_at: header.created_at,
        };

        for record in records {
            let turn = game.submit_at(record.player, record.action, at)?.turn;
            if turn != record.turn {
                return Err(EngineError::corrupt(format!(
                    "record for turn {} replayed as turn {turn}",
                    record.turn
                )));
            }
        }
        Ok(game)
    }

    /// Rehydrate a game from a persisted snapshot.
    ///
    /// Every stored board must satisfy the occupancy invariants and replaying
    /// the recorded actions must reproduce every stored state. Any violation
    /// is reported as `CorruptSnapshot`.
    #[instrument(skip(snapshot, win_condition), fields(game = %snapshot.header.id))]
    pub fn restore(snapshot: GameSnapshot, win_condition: Arc<dyn WinCondition>) -> Result<Self> {
        let GameSnapshot { header, history } = snapshot;
        let Some(initial) = history.first().cloned() else {
            return Err(EngineError::corrupt("snapshot has no states"));
        };

        for (index, state) in history.iter().enumerate() {
            if usize::try_from(state.turn).ok() != Some(index) {
                return Err(EngineError::corrupt(format!(
                    "state {index} is labelled turn {}",
                    state.turn
                )));
            }
            state
                .board
                .validate()
                .map_err(|e| EngineError::corrupt(format!("turn {index}: {e}")))?;
            if state.is_terminal() && index + 1 != history.len() {
                return Err(EngineError::corrupt(format!("turn {index} is terminal but play continued")));
            }
        }

        let records: Vec<ActionRecord> = history.iter().filter_map(|s| s.record.clone()).collect();
        if records.len() + 1 != history.len() {
            return Err(EngineError::corrupt("a non-initial state is missing its action record"));
        }

        let mut game = Self::replay(&header, initial, records, win_condition)
            .map_err(|e| match e {
                EngineError::CorruptSnapshot { .. } => e,
                other => EngineError::corrupt(format!("replay failed: {other}")),
            })?;

        for (stored, replayed) in history.iter().zip(game.history.iter()) {
            if !stored.same_position(replayed) {
                return Err(EngineError::corrupt(format!(
                    "turn {} does not match its recorded action",
                    stored.turn
                )));
            }
        }

        game.history = history.into_iter().collect();
        debug!(turns = game.history.len(), phase = ?game.phase, "Restored game");
        Ok(game)
    }
}

fn check_config(config: &GameConfig, template: &BoardTemplate) -> Result<()> {
    if config.min_players == 0 {
        return Err(EngineError::InvalidConfig {
            message: "min_players must be at least 1".to_string(),
        });
    }
    if let Some(max) = config.max_players {
        if max < config.min_players {
            return Err(EngineError::InvalidConfig {
                message: format!("max_players {max} is below min_players {}", config.min_players),
            });
        }
    }
    let seats = config.seat_limit(template.seat_count());
    if seats < config.min_players {
        return Err(EngineError::InvalidConfig {
            message: format!(
                "variant '{}' seats {seats} but {} players are required",
                template.variant, config.min_players
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionId, NodeId, UnitId};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    /// Line variant: P1 owns Unit(1) at Node(1) and Unit(2) at Node(2);
    /// P2 owns Unit(3) at Node(6) and Unit(4) at Node(5).
    fn line_game() -> Game {
        Game::create(GameId(1), BoardTemplate::line(), GameConfig::default(), [P1, P2]).unwrap()
    }

    #[test]
    fn test_lobby_starts_at_min_players() {
        let mut game = Game::new(GameId(1), BoardTemplate::line(), GameConfig::default()).unwrap();
        assert_eq!(game.phase(), GamePhase::AwaitingPlayers);
        assert_eq!(game.current_state().unwrap_err(), EngineError::GameNotStarted);

        assert_eq!(game.join(P1).unwrap(), GamePhase::AwaitingPlayers);
        assert_eq!(game.join(P2).unwrap(), GamePhase::InProgress);
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.current_state().unwrap().turn, 0);
        assert_eq!(game.active_player(), Some(P1));
    }

    #[test]
    fn test_lobby_errors() {
        let mut game = Game::new(GameId(1), BoardTemplate::line(), GameConfig::default()).unwrap();
        game.join(P1).unwrap();
        assert_eq!(game.join(P1), Err(EngineError::DuplicatePlayer { player: P1 }));
        assert_eq!(game.leave(P2), Err(EngineError::UnknownPlayer { player: P2 }));
        game.leave(P1).unwrap();
        assert!(game.players().is_empty());

        game.join(P1).unwrap();
        game.join(P2).unwrap();
        assert_eq!(game.join(PlayerId(3)), Err(EngineError::LobbyClosed));
        assert_eq!(game.leave(P1), Err(EngineError::LobbyClosed));
    }

    #[test]
    fn test_game_full() {
        let config = GameConfig::default().with_min_players(3).with_max_players(3);
        let mut game = Game::new(GameId(1), BoardTemplate::grid(), config).unwrap();
        game.join(P1).unwrap();
        game.join(P2).unwrap();
        game.join(PlayerId(3)).unwrap();
        assert_eq!(game.phase(), GamePhase::InProgress);

        let mut lobby = Game::new(
            GameId(2),
            BoardTemplate::line(),
            GameConfig::default().with_min_players(2),
        )
        .unwrap();
        lobby.seat(P1).unwrap();
        lobby.seat(P2).unwrap();
        assert_eq!(lobby.seat(PlayerId(3)), Err(EngineError::GameFull { seats: 2 }));
    }

    #[test]
    fn test_invalid_config() {
        let config = GameConfig::default().with_min_players(3);
        assert!(matches!(
            Game::new(GameId(1), BoardTemplate::line(), config),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_submit_before_start() {
        let mut game = Game::new(GameId(1), BoardTemplate::line(), GameConfig::default()).unwrap();
        assert_eq!(
            game.submit(P1, Action::pass(ActionId(1))).unwrap_err(),
            EngineError::GameNotStarted
        );
    }

    #[test]
    fn test_wrong_turn_changes_nothing() {
        let mut game = line_game();
        let before = game.current_state().unwrap().clone();

        let err = game
            .submit(P2, Action::move_to(ActionId(1), UnitId(4), NodeId(4)))
            .unwrap_err();
        assert_eq!(err, EngineError::WrongTurn { player: P2 });
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.current_state().unwrap(), &before);
        assert_eq!(game.active_player(), Some(P1));
    }

    #[test]
    fn test_validation_failure_changes_nothing() {
        let mut game = line_game();
        let err = game
            .submit(P1, Action::move_to(ActionId(1), UnitId(3), NodeId(4)))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.active_player(), Some(P1));
    }

    #[test]
    fn test_submit_appends_and_advances() {
        let mut game = line_game();
        let state = game
            .submit(P1, Action::move_to(ActionId(1), UnitId(2), NodeId(4)))
            .unwrap()
            .clone();

        assert_eq!(state.turn, 1);
        assert_eq!(state.active_player, Some(P2));
        assert_eq!(state.board.unit(UnitId(2)).unwrap().position, Some(NodeId(4)));
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.records().count(), 1);
    }

    #[test]
    fn test_play_to_completion() {
        let mut game = line_game();
        // P1's scout (power 2) steps next to P2's scout (power 2) and defeats it.
        game.submit(P1, Action::move_to(ActionId(1), UnitId(2), NodeId(4))).unwrap();
        game.submit(P2, Action::pass(ActionId(2))).unwrap();
        game.submit(P1, Action::attack(ActionId(3), UnitId(2), UnitId(4))).unwrap();
        assert!(!game.board().unwrap().unit(UnitId(4)).unwrap().is_active());

        // P2's vanguard (power 5) walks up and removes the scout.
        game.submit(P2, Action::move_to(ActionId(4), UnitId(3), NodeId(5))).unwrap();
        game.submit(P1, Action::pass(ActionId(5))).unwrap();
        game.submit(P2, Action::attack(ActionId(6), UnitId(3), UnitId(2))).unwrap();

        // P1's vanguard (power 5) marches and trades with P2's vanguard.
        game.submit(P1, Action::move_to(ActionId(7), UnitId(1), NodeId(3))).unwrap();
        game.submit(P2, Action::pass(ActionId(8))).unwrap();
        game.submit(P1, Action::move_to(ActionId(9), UnitId(1), NodeId(4))).unwrap();
        game.submit(P2, Action::pass(ActionId(10))).unwrap();
        let last = game
            .submit(P1, Action::attack(ActionId(11), UnitId(1), UnitId(3)))
            .unwrap()
            .clone();

        assert_eq!(last.phase, GamePhase::Completed);
        assert_eq!(last.result, Some(GameResult::Winner(P1)));
        assert_eq!(last.active_player, None);
        assert_eq!(game.phase(), GamePhase::Completed);
        assert_eq!(game.result(), Some(&GameResult::Winner(P1)));
        assert_eq!(
            game.submit(P2, Action::pass(ActionId(12))).unwrap_err(),
            EngineError::GameAlreadyComplete
        );
        assert_eq!(game.history().len(), 12);
    }

    #[test]
    fn test_turn_skips_eliminated_player() {
        let p3 = PlayerId(3);
        let config = GameConfig::default().with_min_players(3);
        let mut game = Game::create(GameId(1), BoardTemplate::grid(), config, [P1, P2, p3]).unwrap();
        // P3 (seat 2) holds Node(4) with Unit(5), knight power 4,
        // and Node(8) with Unit(6), pikeman power 3.
        let round = |game: &mut Game, id: u64, action: Action| {
            game.submit(P1, action).unwrap();
            game.submit(P2, Action::pass(ActionId(id + 1))).unwrap();
            if game.active_player() == Some(p3) {
                game.submit(p3, Action::pass(ActionId(id + 2))).unwrap();
            }
        };

        // P1's pikeman (Unit 2, power 3) walks next to the knight and wears it down.
        round(&mut game, 10, Action::move_to(ActionId(10), UnitId(2), NodeId(3)));
        round(&mut game, 20, Action::attack(ActionId(20), UnitId(2), UnitId(5)));
        assert!(game.board().unwrap().unit(UnitId(5)).unwrap().is_active());
        round(&mut game, 30, Action::attack(ActionId(30), UnitId(2), UnitId(5)));
        assert!(!game.board().unwrap().unit(UnitId(5)).unwrap().is_active());

        round(&mut game, 40, Action::move_to(ActionId(40), UnitId(2), NodeId(4)));
        game.submit(P1, Action::attack(ActionId(50), UnitId(2), UnitId(6))).unwrap();
        assert!(!game.board().unwrap().has_active_units(p3));
        assert_eq!(game.phase(), GamePhase::InProgress);

        game.submit(P2, Action::pass(ActionId(51))).unwrap();
        assert_eq!(game.active_player(), Some(P1));
        assert_eq!(
            game.submit(p3, Action::pass(ActionId(52))).unwrap_err(),
            EngineError::WrongTurn { player: p3 }
        );
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut game = line_game();
        game.submit(P1, Action::move_to(ActionId(1), UnitId(2), NodeId(4))).unwrap();
        game.submit(P2, Action::pass(ActionId(2))).unwrap();

        let snapshot = game.snapshot().unwrap();
        let restored = Game::restore(snapshot, Arc::new(LastPlayerStanding)).unwrap();
        assert_eq!(restored.history(), game.history());
        assert_eq!(restored.active_player(), Some(P1));
        assert_eq!(restored.players(), game.players());
    }

    #[test]
    fn test_restore_rejects_tampered_history() {
        let mut game = line_game();
        game.submit(P1, Action::move_to(ActionId(1), UnitId(2), NodeId(4))).unwrap();

        let mut snapshot = game.snapshot().unwrap();
        snapshot.history[1].turn = 5;
        assert!(matches!(
            Game::restore(snapshot, Arc::new(LastPlayerStanding)),
            Err(EngineError::CorruptSnapshot { .. })
        ));

        let mut snapshot = game.snapshot().unwrap();
        snapshot.history[1].board = snapshot.history[0].board.clone();
        assert!(matches!(
            Game::restore(snapshot, Arc::new(LastPlayerStanding)),
            Err(EngineError::CorruptSnapshot { .. })
        ));

        let mut snapshot = game.snapshot().unwrap();
        snapshot.history.clear();
        assert!(matches!(
            Game::restore(snapshot, Arc::new(LastPlayerStanding)),
            Err(EngineError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_lobby_has_no_snapshot() {
        let game = Game::new(GameId(1), BoardTemplate::line(), GameConfig::default()).unwrap();
        assert!(game.header().is_none());
        assert!(game.snapshot().is_none());
    }
}
