//! Board state: units, occupancy, movement and combat.
//!
//! - `Unit`: owned, positioned entity with power and a movement budget
//! - `Board`: a `NodeGraph` plus units, enforcing single occupancy
//! - `BoardTemplate` / `TemplateRegistry`: named topologies that build boards

#[allow(clippy::module_inception)]
pub mod board;
pub mod template;
pub mod unit;

pub use board::{Board, BoardDelta};
pub use template::{BoardTemplate, TemplateRegistry, UnitSpec, SCATTER_PREFIX};
pub use unit::{AttackOutcome, Unit, UnitStatus};
