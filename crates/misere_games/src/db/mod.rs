//! Match history persistence.

mod models;
mod repository;
mod schema;

pub use crate::error::DbError;
pub use models::{DRAW, GameResult, NewGameResult};
pub use repository::{HistoryRepository, MIGRATIONS};
