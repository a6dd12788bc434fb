//! Player identification and turn order.
//!
//! ## PlayerId
//!
//! Opaque, comparable token supplied by the hosting application. The engine
//! never sees account data; the host maps the token to its own records.
//!
//! ## TurnOrder
//!
//! Ordered seating fixed at game start, with an active-seat pointer that
//! advances round-robin.

use serde::{Deserialize, Serialize};

/// Opaque player identity supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Seating order with an active-seat pointer.
///
/// ## Example
///
/// ```
/// use nodewar::core::{PlayerId, TurnOrder};
///
/// let mut order = TurnOrder::new(vec![PlayerId::new(10), PlayerId::new(20), PlayerId::new(30)]);
/// assert_eq!(order.active(), Some(PlayerId::new(10)));
///
/// // Skip player 20
/// order.advance(|p| p != PlayerId::new(20));
/// assert_eq!(order.active(), Some(PlayerId::new(30)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrder {
    seats: Vec<PlayerId>,
    active: usize,
}

impl TurnOrder {
    /// Create a turn order with the first seat active.
    #[must_use]
    pub fn new(seats: Vec<PlayerId>) -> Self {
        Self { seats, active: 0 }
    }

    /// Restore a turn order with an explicit active seat.
    ///
    /// Returns `None` if `active` is not a valid seat.
    #[must_use]
    pub fn with_active(seats: Vec<PlayerId>, active: usize) -> Option<Self> {
        (active < seats.len()).then_some(Self { seats, active })
    }

    /// Number of seated players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Check if nobody is seated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// The active player, if anyone is seated.
    #[must_use]
    pub fn active(&self) -> Option<PlayerId> {
        self.seats.get(self.active).copied()
    }

    /// Index of the active seat.
    #[must_use]
    pub fn active_seat(&self) -> usize {
        self.active
    }

    /// Seat index of a player.
    #[must_use]
    pub fn seat_of(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|&p| p == player)
    }

    /// Check if a player is seated.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.seats.contains(&player)
    }

    /// Seated players in turn order.
    #[must_use]
    pub fn players(&self) -> &[PlayerId] {
        &self.seats
    }

    /// Add a player to the last seat.
    pub fn push(&mut self, player: PlayerId) {
        self.seats.push(player);
    }

    /// Remove a player, keeping the active pointer on the same player
    /// where possible.
    ///
    /// Returns true if the player was seated.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        let Some(seat) = self.seat_of(player) else {
            return false;
        };
        self.seats.remove(seat);
        if seat < self.active {
            self.active -= 1;
        }
        if self.active >= self.seats.len() {
            self.active = 0;
        }
        true
    }

    /// Advance round-robin to the next seat whose player satisfies
    /// `eligible`, starting after the current seat.
    ///
    /// The current player is considered last, so a lone eligible player keeps
    /// the turn. Returns the new active player, or `None` if nobody is eligible
    /// (the pointer is left unchanged).
    pub fn advance(&mut self, eligible: impl Fn(PlayerId) -> bool) -> Option<PlayerId> {
        let n = self.seats.len();
        for step in 1..=n {
            let seat = (self.active + step) % n;
            if eligible(self.seats[seat]) {
                self.active = seat;
                return Some(self.seats[seat]);
            }
        }
        None
    }
}
