use crate::grading::GradeScale;
use crate::roster::Roster;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "gradebook.sqlite3";

const ROSTER_KEY: &str = "roster";
const SCALE_KEY: &str = "gradeScale";

/// Workspace-scoped store: one table of whole-document snapshots, written
/// after every mutation and read back in full on workspace select.
pub fn open_store(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn snapshot_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let text: Option<String> = conn
        .query_row("SELECT value FROM snapshots WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match text {
        Some(t) => Ok(Some(serde_json::from_str(&t).with_context(|| {
            format!("snapshot {} is not valid JSON", key)
        })?)),
        None => Ok(None),
    }
}

pub fn snapshot_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO snapshots(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, &text, &now),
    )?;
    Ok(())
}

/// Missing snapshot loads as an empty roster.
pub fn load_roster(conn: &Connection) -> anyhow::Result<Roster> {
    match snapshot_get_json(conn, ROSTER_KEY)? {
        Some(value) => {
            serde_json::from_value(value).context("roster snapshot does not match the schema")
        }
        None => Ok(Roster::default()),
    }
}

pub fn save_roster(conn: &Connection, roster: &Roster) -> anyhow::Result<()> {
    snapshot_set_json(conn, ROSTER_KEY, &serde_json::to_value(roster)?)
}

/// Missing snapshot loads as the default scale.
pub fn load_scale(conn: &Connection) -> anyhow::Result<GradeScale> {
    match snapshot_get_json(conn, SCALE_KEY)? {
        Some(value) => {
            serde_json::from_value(value).context("grade scale snapshot does not match the schema")
        }
        None => Ok(GradeScale::default()),
    }
}

pub fn save_scale(conn: &Connection, scale: &GradeScale) -> anyhow::Result<()> {
    snapshot_set_json(conn, SCALE_KEY, &serde_json::to_value(scale)?)
}
