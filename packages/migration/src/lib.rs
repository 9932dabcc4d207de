pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

mod m20261019_000001_documents; // keep filename + module name in sync

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261019_000001_documents::Migration)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

/// Run a migration command against an open connection.
pub async fn migrate(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    let before = store_diagnostics(db).await?;
    tracing::info!("▶ cmd={command:?} store={}", before.name);
    tracing::info!(
        "▶ BEFORE: {} migration(s) defined, {} applied",
        before.defined,
        before.applied
    );

    let result = match command {
        MigrationCommand::Up => Migrator::up(db, None).await,
        MigrationCommand::Down => Migrator::down(db, None).await,
        MigrationCommand::Fresh => Migrator::fresh(db).await,
        MigrationCommand::Reset => Migrator::reset(db).await,
        MigrationCommand::Refresh => Migrator::refresh(db).await,
        MigrationCommand::Status => Migrator::status(db).await,
    };

    match result {
        Ok(()) => {
            if command != MigrationCommand::Status {
                let after = store_diagnostics(db).await?;
                tracing::info!(
                    "▶ AFTER: {} migration(s) defined, {} applied",
                    after.defined,
                    after.applied
                );
            }
            tracing::info!("✅ {command:?} OK for {}", before.name);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ {command:?} failed for {}: {e}", before.name);
            Err(e)
        }
    }
}

#[derive(Debug)]
struct StoreDiagnostics {
    name: String,
    applied: usize,
    defined: usize,
}

async fn store_diagnostics(db: &DatabaseConnection) -> Result<StoreDiagnostics, DbErr> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        String::from("SELECT file FROM pragma_database_list WHERE name = 'main'"),
    );
    let name = match db.query_one(stmt).await? {
        Some(row) => match row.try_get::<String>("", "file") {
            Ok(file) if file.is_empty() => ":memory:".to_string(),
            Ok(file) => file,
            Err(_) => "<unknown>".to_string(),
        },
        None => "<unknown>".to_string(),
    };

    Ok(StoreDiagnostics {
        name,
        applied: count_applied_migrations(db).await.unwrap_or(0),
        defined: Migrator::migrations().len(),
    })
}

/// Number of applied migrations; 0 when the migration table does not exist yet.
pub async fn count_applied_migrations(db: &DatabaseConnection) -> Result<usize, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Name of the latest applied migration, if any.
pub async fn get_latest_migration_version(
    db: &DatabaseConnection,
) -> Result<Option<String>, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.last().map(|m| m.name().to_string())),
        Err(DbErr::Exec(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
