//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta store and
//! runs sequential migration functions to bring an older database up to date.

use examcert_store::{MetaStore, SCHEMA_VERSION};

use crate::LmdbError;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// Version 0 means a fresh database. A stored version higher than
    /// [`SCHEMA_VERSION`] was written by a newer release and is refused.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store
            .get_schema_version()
            .map_err(|e| LmdbError::Schema(e.to_string()))?;

        if current == SCHEMA_VERSION {
            tracing::info!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "database schema version {current} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        for version in current..SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        meta_store
            .set_schema_version(SCHEMA_VERSION)
            .map_err(|e| LmdbError::Schema(e.to_string()))?;

        tracing::info!(version = SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Schema(format!("unknown migration: {from} -> {to}"))),
    }
}
