use shared::models::Instrument;
use shared::DomainError;
use sqlx::PgConnection;

const UNIQUE_VIOLATION: &str = "23505";

pub async fn list_instruments(conn: &mut PgConnection) -> Result<Vec<Instrument>, DomainError> {
    let instruments = sqlx::query_as::<_, Instrument>("SELECT ticker, name FROM instruments ORDER BY ticker")
        .fetch_all(&mut *conn)
        .await?;
    Ok(instruments)
}

pub async fn insert_instrument(conn: &mut PgConnection, ticker: &str, name: &str) -> Result<(), DomainError> {
    let result = sqlx::query("INSERT INTO instruments (ticker, name) VALUES ($1, $2)")
        .bind(ticker)
        .bind(name)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Err(DomainError::InstrumentAlreadyExists(ticker.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_for_update(conn: &mut PgConnection, ticker: &str) -> Result<Option<Instrument>, DomainError> {
    let instrument = sqlx::query_as::<_, Instrument>(
        "SELECT ticker, name FROM instruments WHERE ticker = $1 FOR UPDATE",
    )
    .bind(ticker)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(instrument)
}

pub async fn delete_instrument(conn: &mut PgConnection, ticker: &str) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM instruments WHERE ticker = $1")
        .bind(ticker)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
