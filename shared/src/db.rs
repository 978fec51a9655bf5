use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Mirrors the teacher's `accounts::db::create_pool` / `run_migrations` pair:
/// a small fixed-size pool plus hardcoded, ordered `include_str!` migrations
/// applied with `sqlx::raw_sql` at process startup.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations: &[&str] = &[include_str!("../../migrations/0001_init.sql")];

    for migration in migrations {
        sqlx::raw_sql(migration).execute(pool).await?;
    }

    Ok(())
}
