use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement,
    sqlx::sqlite::SqliteSynchronous,
};

use crate::error::AppResult;

/// Opens the store and makes sure the catalog tables exist.
///
/// Safe to call on every start: the migrator records what it already applied and
/// the tables are created with `IF NOT EXISTS`, so a store left by an earlier
/// deployment is adopted as is.
pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(max_connections)
        .sqlx_logging(false)
        // movie_actors declares foreign keys but links to unknown actors must still insert
        .map_sqlx_sqlite_opts(|o| o.foreign_keys(false).synchronous(SqliteSynchronous::Normal));

    let db = Database::connect(opts).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA journal_mode=WAL".to_string(),
    ))
    .await?;

    ensure_schema(&db).await?;
    Ok(db)
}

pub async fn ensure_schema(db: &DatabaseConnection) -> AppResult<()> {
    Migrator::up(db, None).await?;
    tracing::debug!("catalog schema ready");
    Ok(())
}

#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:", 1).await.unwrap()
}

#[cfg(test)]
mod tests {
    use sea_orm::TransactionTrait;

    use super::*;

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let db = test_db().await;
        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn adopts_tables_created_outside_the_migrator() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        for sql in [
            "CREATE TABLE movies (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, year TEXT, director TEXT, description TEXT)",
            "CREATE TABLE actors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
            "CREATE TABLE movie_actors (movie_id INTEGER NOT NULL, actor_id INTEGER NOT NULL)",
        ] {
            db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
                .await
                .unwrap();
        }

        ensure_schema(&db).await.unwrap();
    }

    async fn synchronous<C: ConnectionTrait>(conn: &C) -> i32 {
        let row = conn
            .query_one(Statement::from_string(
                conn.get_database_backend(),
                "PRAGMA synchronous".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index(0).unwrap()
    }

    #[tokio::test]
    async fn every_pooled_connection_uses_normal_sync() {
        let path = std::env::temp_dir().join(format!("reelbase-sync-{}.db", std::process::id()));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = connect_and_migrate(&url, 2).await.unwrap();

        // the open transaction pins one connection, so the plain query runs on the other
        let held = db.begin().await.unwrap();
        assert_eq!(synchronous(&held).await, 1);
        assert_eq!(synchronous(&db).await, 1);
        held.commit().await.unwrap();

        db.close().await.unwrap();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
