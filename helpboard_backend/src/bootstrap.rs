use crate::config::HelpboardConfig;
use crate::database::Database;
use anyhow::{Context, Result};

pub struct Bootstrap {
    pub database: Database,
}

/// Creates the data directory, opens the database and applies migrations.
pub fn initialize(config: &HelpboardConfig) -> Result<Bootstrap> {
    std::fs::create_dir_all(&config.paths.data_dir).with_context(|| {
        format!(
            "failed to create data dir {}",
            config.paths.data_dir.display()
        )
    })?;

    let database = Database::connect(&config.paths)?;
    let newly_created = database.ensure_migrations()?;
    if newly_created {
        tracing::info!(db_path = %config.paths.db_path.display(), "created new helpboard database");
    }

    Ok(Bootstrap { database })
}
