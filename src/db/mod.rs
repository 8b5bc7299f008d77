use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    TransactionError, TransactionTrait,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Boxed future handed to [`Store::transaction`].
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>;

/// Handle to the relational store. Cheap to clone; every service owns one.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ConnectOptions::new(config.database_url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        let db = Database::connect(options).await.map_err(|e| {
            AppError::StorageUnavailable(format!("Failed to connect to database: {}", e))
        })?;

        Ok(Self { db })
    }

    /// Applies all pending schema migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `block` inside one write transaction.
    ///
    /// Commits when the block returns `Ok`. On `Err` every write made through the
    /// transaction is rolled back and the block's error is returned unchanged.
    ///
    /// SQLite starts the transaction deferred. A block that reads and then
    /// writes fails with `database is locked` when another writer got in
    /// between, so blocks that write issue a write first (see [`lock_row`]).
    pub async fn transaction<F, T>(&self, block: F) -> AppResult<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
        T: Send,
    {
        self.db
            .transaction::<F, T, AppError>(block)
            .await
            .map_err(|err| match err {
                TransactionError::Connection(db_err) => AppError::from(db_err),
                TransactionError::Transaction(app_err) => app_err,
            })
    }
}

/// Fetches a row by primary key or fails with `NotFound`.
pub async fn find_required<E, C>(conn: &C, id: i32) -> AppResult<E::Model>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(E::default().table_name(), id))
}

/// Deletes a row by primary key. Deleting an absent row fails with `NotFound`,
/// so a repeated delete of the same id is an error.
pub async fn delete_required<E, C>(conn: &C, id: i32) -> AppResult<()>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    let result = E::delete_by_id(id).exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(E::default().table_name(), id));
    }
    Ok(())
}

/// Sets `changes` on the row with primary key `id`. Updating an absent row
/// fails with `NotFound`.
pub async fn update_required<E, C>(
    conn: &C,
    id: i32,
    changes: Vec<(E::Column, SimpleExpr)>,
) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if changes.is_empty() {
        return Err(AppError::Internal(format!(
            "empty update of {} #{id}",
            E::default().table_name()
        )));
    }

    let mut update = E::update_many().filter(primary_key_eq::<E>(id));
    for (column, value) in changes {
        update = update.col_expr(column, value);
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(E::default().table_name(), id));
    }
    Ok(())
}

/// Rewrites the row's key onto itself. As the first statement of a
/// transaction this takes SQLite's write lock before anything is read, so a
/// concurrent writer waits on the busy timeout instead of failing the lock
/// upgrade. Fails with `NotFound` when the row is absent.
///
/// Only for tables no foreign key points at.
pub async fn lock_row<E, C>(conn: &C, id: i32) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let changes = E::PrimaryKey::iter()
        .map(|key| {
            let column = key.into_column();
            (column, Expr::col(column).into())
        })
        .collect();
    update_required::<E, C>(conn, id, changes).await
}

fn primary_key_eq<E: EntityTrait>(id: i32) -> Condition {
    E::PrimaryKey::iter().fold(Condition::all(), |condition, key| {
        condition.add(key.into_column().eq(id))
    })
}
