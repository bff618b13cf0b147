use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::grading::GradeScale;
use crate::roster::Roster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Single execution context: the roster and scale live in memory, the store
/// connection persists them after every mutation.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub roster: Roster,
    pub scale: GradeScale,
}
