use sqlx::migrate::Migrator;

/// Workspace `migrations/`, embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
