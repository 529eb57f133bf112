use sqlx_core::query::query;
use sqlx_postgres::{PgConnection, Postgres};

use crate::settings::DbTxIsolation;

/// Must run before the first statement of the transaction.
pub async fn apply_tx_isolation(
    conn: &mut PgConnection,
    isolation: DbTxIsolation,
) -> Result<(), sqlx_core::Error> {
    let statement = match isolation {
        DbTxIsolation::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
        DbTxIsolation::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
        DbTxIsolation::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
    };
    query::<Postgres>(statement)
        .execute(&mut *conn)
        .await
        .map(|_| ())
}
