//! Schema migrations for the client store.
//!
//! # Invariants
//! - Steps are listed in ascending `version` order with no gaps.
//! - All pending steps run inside one transaction; `PRAGMA user_version`
//!   advances with each step, so a failed batch leaves the file untouched.
//! - Files stamped with a version above the newest step are refused.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub version: u32,
    pub name: &'static str,
    sql: &'static str,
}

const STEPS: &[MigrationStep] = &[MigrationStep {
    version: 1,
    name: "clients",
    sql: include_str!("0001_clients.sql"),
}];

/// Outcome of bringing a connection up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the steps that ran, in order.
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Steps newer than `version`.
pub fn pending_steps(version: u32) -> impl Iterator<Item = &'static MigrationStep> {
    STEPS.iter().filter(move |step| step.version > version)
}

/// Runs every pending step and reports what changed.
///
/// # Errors
/// - `UnsupportedSchemaVersion` for a file written by a newer build.
/// - `MigrationFailed` naming the first step whose SQL was rejected.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        applied: Vec::new(),
    };
    if from_version == latest {
        return Ok(report);
    }

    let tx = conn.transaction()?;
    for step in pending_steps(from_version) {
        run_step(&tx, step)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
        report.to_version = step.version;
        report.applied.push(step.name);
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        report.from_version,
        report.to_version,
        report.applied.len()
    );
    Ok(report)
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

fn run_step(tx: &Transaction<'_>, step: &MigrationStep) -> DbResult<()> {
    tx.execute_batch(step.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", step.version))
        .map_err(|source| DbError::MigrationFailed {
            version: step.version,
            name: step.name,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::{latest_version, pending_steps, STEPS};

    #[test]
    fn steps_are_contiguous_from_one() {
        for (index, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1);
        }
        assert_eq!(latest_version(), STEPS.len() as u32);
    }

    #[test]
    fn nothing_is_pending_at_latest_version() {
        assert_eq!(pending_steps(latest_version()).count(), 0);
        assert_eq!(pending_steps(0).count(), STEPS.len());
    }
}
