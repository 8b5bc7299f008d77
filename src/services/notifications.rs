use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set, SqlErr, sea_query::Expr,
};

use crate::db::{Store, find_required};
use crate::entities::{notification, passenger};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends an unread notification for a passenger.
    pub async fn notify(&self, passenger_id: i32, message: &str) -> AppResult<i32> {
        let message = message.to_string();
        self.store
            .transaction(move |txn| Box::pin(insert_notification(txn, passenger_id, message)))
            .await
    }

    /// Returns the passenger's unread notifications, newest first, and marks them
    /// read in the same transaction. There is no way to peek without acknowledging.
    pub async fn fetch_unread(&self, passenger_id: i32) -> AppResult<Vec<notification::Model>> {
        let notifications = self
            .store
            .transaction(move |txn| Box::pin(take_unread(txn, passenger_id)))
            .await?;

        tracing::debug!(
            passenger_id,
            count = notifications.len(),
            "unread notifications acknowledged"
        );
        Ok(notifications)
    }
}

/// Inserts a notification using whatever connection or transaction the caller holds.
pub(crate) async fn insert_notification<C>(
    conn: &C,
    passenger_id: i32,
    message: String,
) -> AppResult<i32>
where
    C: ConnectionTrait,
{
    let notification = notification::ActiveModel {
        passenger_id: Set(passenger_id),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|err| match err.sql_err() {
        // passenger_id is the only foreign key on the row
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::not_found("passenger", passenger_id)
        }
        _ => AppError::from(err),
    })?;

    Ok(notification.id)
}

async fn take_unread(
    txn: &DatabaseTransaction,
    passenger_id: i32,
) -> AppResult<Vec<notification::Model>> {
    // No-op write so the transaction holds the write lock before it reads.
    notification::Entity::update_many()
        .col_expr(
            notification::Column::IsRead,
            Expr::col(notification::Column::IsRead).into(),
        )
        .filter(notification::Column::PassengerId.eq(passenger_id))
        .exec(txn)
        .await?;
    find_required::<passenger::Entity, _>(txn, passenger_id).await?;

    let mut unread = notification::Entity::find()
        .filter(notification::Column::PassengerId.eq(passenger_id))
        .filter(notification::Column::IsRead.eq(false))
        .all(txn)
        .await?;

    if unread.is_empty() {
        return Ok(unread);
    }

    let ids: Vec<i32> = unread.iter().map(|n| n.id).collect();
    notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::Id.is_in(ids))
        .exec(txn)
        .await?;

    // Timestamps are stored as text, so order in memory rather than in SQL.
    unread.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    for notification in &mut unread {
        notification.is_read = true;
    }

    Ok(unread)
}
