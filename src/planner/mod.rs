//! Action planning (dry run).
//!
//! - `action`: `MigrationAction`, `ActionStatus`, `PlanSummary`
//! - `reservation`: run-scoped target reservations
//! - `simulator`: the `Planner`
//! - `report`: JSON plan report

mod action;
mod report;
mod reservation;
mod simulator;

pub use action::*;
pub use report::*;
pub use reservation::*;
pub use simulator::*;
