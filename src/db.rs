use crate::criteria::Criteria;
use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::Path;

pub const DB_FILE: &str = "feedbackd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS view_state(
            view TEXT PRIMARY KEY,
            criteria_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create view_state table")?;

    Ok(conn)
}

pub fn view_state_save(conn: &Connection, view: &str, criteria: &Criteria) -> anyhow::Result<()> {
    let json = serde_json::to_string(criteria).context("failed to serialize criteria")?;
    conn.execute(
        "INSERT INTO view_state(view, criteria_json, updated_at)
         VALUES(?1, ?2, ?3)
         ON CONFLICT(view) DO UPDATE SET
           criteria_json = excluded.criteria_json,
           updated_at = excluded.updated_at",
        params![view, json, chrono::Utc::now().to_rfc3339()],
    )
    .context("failed to save view state")?;
    Ok(())
}

/// Rows whose JSON no longer parses come back as `Err` so the caller can
/// skip them without losing the others.
pub fn view_state_load_all(
    conn: &Connection,
) -> anyhow::Result<Vec<(String, Result<Criteria, serde_json::Error>)>> {
    let mut stmt = conn
        .prepare("SELECT view, criteria_json FROM view_state ORDER BY view")
        .context("failed to prepare view state query")?;
    let rows = stmt
        .query_map([], |row| {
            let view: String = row.get(0)?;
            let json: String = row.get(1)?;
            Ok((view, json))
        })
        .context("failed to query view state")?;

    let mut out = Vec::new();
    for row in rows {
        let (view, json) = row.context("failed to read view state row")?;
        out.push((view, serde_json::from_str::<Criteria>(&json)));
    }
    Ok(out)
}
