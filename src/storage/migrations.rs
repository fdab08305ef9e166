use anyhow::{bail, Context, Result};
use rusqlite::Connection;

use crate::log_info;

const ENABLE_LOGS: bool = true;

/// Schema scripts in order; entry `n` moves the database to version `n + 1`.
const MIGRATIONS: &[&str] = &[
    include_str!("schemas/schema_v1.sql"),
];

pub const CURRENT_SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Brings the key/value schema up to [`CURRENT_SCHEMA_VERSION`] inside one
/// transaction, tracking progress in the `user_version` pragma.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let stored: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read storage schema version")?;

    if stored > CURRENT_SCHEMA_VERSION {
        bail!(
            "storage schema version {stored} was written by a newer build (supports up to {CURRENT_SCHEMA_VERSION})"
        );
    }
    if stored == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to begin storage migration")?;
    for (index, script) in MIGRATIONS.iter().enumerate().skip(stored as usize) {
        let target = index + 1;
        tx.execute_batch(script)
            .with_context(|| format!("storage migration to v{target} failed"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to record storage schema version")?;
    tx.commit().context("failed to commit storage migration")?;

    log_info!("Storage schema migrated from v{stored} to v{CURRENT_SCHEMA_VERSION}");
    Ok(())
}
