use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::{Expr, Query},
};
use serde::Serialize;

use crate::db::{Store, delete_required, find_required, lock_row};
use crate::entities::{driver, order, order_detail, passenger};
use crate::error::{AppError, AppResult};
use crate::export::{DetailsRecord, OrderRecord, PartyRecord};
use crate::services::accounts::Role;
use crate::services::notifications::insert_notification;
use crate::utils::time::requested_time_key;

/// Validated ride request: addresses, free-text time, price and distance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub pickup_address: String,
    pub dropoff_address: String,
    pub requested_time: String,
    pub price: f64,
    pub distance_km: f64,
}

impl NewOrder {
    pub fn new(
        pickup_address: impl Into<String>,
        dropoff_address: impl Into<String>,
        requested_time: impl Into<String>,
        price: f64,
        distance_km: f64,
    ) -> AppResult<Self> {
        let order = Self {
            pickup_address: pickup_address.into().trim().to_string(),
            dropoff_address: dropoff_address.into().trim().to_string(),
            requested_time: requested_time.into().trim().to_string(),
            price,
            distance_km,
        };
        order.validate()?;
        Ok(order)
    }

    /// Builds an order from raw text input, as typed by a user.
    pub fn parse(
        pickup_address: &str,
        dropoff_address: &str,
        requested_time: &str,
        price: &str,
        distance_km: &str,
    ) -> AppResult<Self> {
        let price = parse_amount("price", price)?;
        let distance_km = parse_amount("distance_km", distance_km)?;
        Self::new(pickup_address, dropoff_address, requested_time, price, distance_km)
    }

    fn validate(&self) -> AppResult<()> {
        if self.pickup_address.is_empty() {
            return Err(AppError::Validation("pickup address must not be empty".to_string()));
        }
        if self.dropoff_address.is_empty() {
            return Err(AppError::Validation("dropoff address must not be empty".to_string()));
        }
        check_amount("price", self.price)?;
        check_amount("distance_km", self.distance_km)
    }
}

fn parse_amount(field: &str, raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{} must be a number, got {:?}", field, raw)))
}

fn check_amount(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

/// An order joined with both usernames and its details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order_id: i32,
    pub passenger_id: i32,
    pub passenger_username: String,
    /// `None` means the order is still awaiting a driver.
    pub driver_id: Option<i32>,
    pub driver_username: Option<String>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub requested_time: String,
    pub price: f64,
    pub distance_km: f64,
    pub created_at: DateTime<Utc>,
}

struct JoinedOrder {
    order: order::Model,
    detail: order_detail::Model,
    passenger: passenger::Model,
    driver: Option<driver::Model>,
}

impl From<JoinedOrder> for OrderView {
    fn from(joined: JoinedOrder) -> Self {
        Self {
            order_id: joined.order.id,
            passenger_id: joined.passenger.id,
            passenger_username: joined.passenger.username,
            driver_id: joined.order.driver_id,
            driver_username: joined.driver.map(|d| d.username),
            pickup_address: joined.detail.pickup_address,
            dropoff_address: joined.detail.dropoff_address,
            requested_time: joined.detail.requested_time,
            price: joined.detail.price,
            distance_km: joined.detail.distance_km,
            created_at: joined.order.created_at,
        }
    }
}

impl From<JoinedOrder> for OrderRecord {
    fn from(joined: JoinedOrder) -> Self {
        Self {
            order_id: joined.order.id,
            driver: joined.driver.map(|d| PartyRecord {
                id: d.id,
                username: d.username,
                rating: d.rating,
            }),
            passenger: PartyRecord {
                id: joined.passenger.id,
                username: joined.passenger.username,
                rating: joined.passenger.rating,
            },
            details: DetailsRecord {
                pickup: joined.detail.pickup_address,
                dropoff: joined.detail.dropoff_address,
                time: joined.detail.requested_time,
                price: joined.detail.price,
                distance_km: joined.detail.distance_km,
            },
        }
    }
}

/// Order lifecycle: `unassigned --assign--> assigned`, either state `--delete--> gone`.
#[derive(Clone, Debug)]
pub struct OrderService {
    store: Store,
}

impl OrderService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates an unassigned order for the passenger. Detail row, order row and the
    /// passenger's notification are written together or not at all.
    pub async fn create_order(&self, passenger_id: i32, new_order: NewOrder) -> AppResult<i32> {
        new_order.validate()?;

        let order_id = self
            .store
            .transaction(move |txn| Box::pin(insert_order(txn, passenger_id, None, new_order)))
            .await?;

        tracing::info!(order_id, passenger_id, "order created");
        Ok(order_id)
    }

    /// Creates an order that already has its driver. Used for administrative seeding.
    pub async fn create_assigned_order(
        &self,
        passenger_id: i32,
        driver_id: i32,
        new_order: NewOrder,
    ) -> AppResult<i32> {
        new_order.validate()?;

        let order_id = self
            .store
            .transaction(move |txn| {
                Box::pin(insert_order(txn, passenger_id, Some(driver_id), new_order))
            })
            .await?;

        tracing::info!(order_id, passenger_id, driver_id, "pre-assigned order created");
        Ok(order_id)
    }

    /// Orders where the user is the passenger or the driver, depending on `role`.
    pub async fn list_orders_for_role(&self, role: Role, user_id: i32) -> AppResult<Vec<OrderView>> {
        let column = match role {
            Role::Driver => order::Column::DriverId,
            Role::Passenger => order::Column::PassengerId,
        };

        let orders = order::Entity::find()
            .filter(column.eq(user_id))
            .order_by_asc(order::Column::Id)
            .all(self.store.conn())
            .await?;

        let joined = join_orders(self.store.conn(), orders).await?;
        Ok(joined.into_iter().map(OrderView::from).collect())
    }

    /// Orders still waiting for a driver, earliest requested time first.
    ///
    /// Times that read as a clock (`6:44`, `15:06`) are compared numerically; other
    /// text sorts after them, lexicographically. Ties fall back to order id.
    pub async fn list_unassigned_orders(&self) -> AppResult<Vec<OrderView>> {
        let orders = order::Entity::find()
            .filter(order::Column::DriverId.is_null())
            .order_by_asc(order::Column::Id)
            .all(self.store.conn())
            .await?;

        let mut views: Vec<OrderView> = join_orders(self.store.conn(), orders)
            .await?
            .into_iter()
            .map(OrderView::from)
            .collect();

        views.sort_by_cached_key(|view| (requested_time_key(&view.requested_time), view.order_id));
        Ok(views)
    }

    /// Assigns a driver to an unassigned order. The first assignment wins; any later
    /// attempt fails with `AlreadyAssigned`.
    pub async fn assign_driver(&self, order_id: i32, driver_id: i32) -> AppResult<()> {
        self.store
            .transaction(move |txn| Box::pin(assign_in(txn, order_id, driver_id)))
            .await?;

        tracing::info!(order_id, driver_id, "driver assigned");
        Ok(())
    }

    /// Deletes an order on behalf of its driver or its passenger.
    ///
    /// The order's detail row goes with it once no other order references it, and the
    /// passenger is told who removed the order. Irreversible.
    pub async fn delete_order(
        &self,
        order_id: i32,
        requesting_user_id: i32,
        requesting_role: Role,
    ) -> AppResult<()> {
        let detail_removed = self
            .store
            .transaction(move |txn| {
                Box::pin(delete_in(txn, order_id, requesting_user_id, requesting_role))
            })
            .await?;

        tracing::info!(
            order_id,
            user_id = requesting_user_id,
            role = %requesting_role,
            detail_removed,
            "order deleted"
        );
        Ok(())
    }

    /// Full ledger for export, ordered by order id.
    pub async fn list_all_orders_joined(&self) -> AppResult<Vec<OrderRecord>> {
        let orders = order::Entity::find()
            .order_by_asc(order::Column::Id)
            .all(self.store.conn())
            .await?;

        let joined = join_orders(self.store.conn(), orders).await?;
        Ok(joined.into_iter().map(OrderRecord::from).collect())
    }
}

async fn insert_order(
    txn: &DatabaseTransaction,
    passenger_id: i32,
    driver_id: Option<i32>,
    new_order: NewOrder,
) -> AppResult<i32> {
    // Writing first takes the database write lock before any read.
    let now = Utc::now();
    let detail = order_detail::ActiveModel {
        pickup_address: Set(new_order.pickup_address),
        dropoff_address: Set(new_order.dropoff_address),
        requested_time: Set(new_order.requested_time),
        price: Set(new_order.price),
        distance_km: Set(new_order.distance_km),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    find_required::<passenger::Entity, _>(txn, passenger_id).await?;
    let driver = match driver_id {
        Some(id) => Some(find_required::<driver::Entity, _>(txn, id).await?),
        None => None,
    };

    let order = order::ActiveModel {
        driver_id: Set(driver_id),
        passenger_id: Set(passenger_id),
        order_detail_id: Set(detail.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let message = match driver {
        Some(driver) => format!(
            "Order #{} created, driver {} is on the way",
            order.id, driver.username
        ),
        None => format!("Order #{} created, awaiting a driver", order.id),
    };
    insert_notification(txn, passenger_id, message).await?;

    Ok(order.id)
}

async fn assign_in(txn: &DatabaseTransaction, order_id: i32, driver_id: i32) -> AppResult<()> {
    // Conditional update, and the transaction's first statement: only an
    // order with no driver can be claimed, and only by a driver that exists.
    let existing_driver = Query::select()
        .column(driver::Column::Id)
        .from(driver::Entity)
        .and_where(driver::Column::Id.eq(driver_id))
        .to_owned();
    let result = order::Entity::update_many()
        .col_expr(order::Column::DriverId, Expr::value(driver_id))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::DriverId.is_null())
        .filter(Expr::val(driver_id).in_subquery(existing_driver))
        .exec(txn)
        .await?;

    let order = find_required::<order::Entity, _>(txn, order_id).await?;
    let driver = find_required::<driver::Entity, _>(txn, driver_id).await?;
    if result.rows_affected == 0 {
        return Err(AppError::AlreadyAssigned { order_id });
    }

    insert_notification(
        txn,
        order.passenger_id,
        format!("Driver {} accepted your order #{}", driver.username, order.id),
    )
    .await?;

    Ok(())
}

/// Returns whether the order's detail row was removed as well.
async fn delete_in(
    txn: &DatabaseTransaction,
    order_id: i32,
    user_id: i32,
    role: Role,
) -> AppResult<bool> {
    lock_row::<order::Entity, _>(txn, order_id).await?;
    let order = find_required::<order::Entity, _>(txn, order_id).await?;

    let message = match role {
        Role::Driver if order.driver_id == Some(user_id) => {
            let driver = find_required::<driver::Entity, _>(txn, user_id).await?;
            format!("Driver {} deleted your order #{}", driver.username, order.id)
        }
        Role::Passenger if order.passenger_id == user_id => {
            format!("You deleted your order #{}", order.id)
        }
        _ => {
            return Err(AppError::Forbidden(format!(
                "{} {} is not a party to order {}",
                role, user_id, order_id
            )));
        }
    };

    delete_required::<order::Entity, _>(txn, order_id).await?;

    // Conditional delete: the detail goes only if nothing references it any more.
    let still_referenced = Query::select()
        .column(order::Column::OrderDetailId)
        .from(order::Entity)
        .to_owned();
    let removed = order_detail::Entity::delete_many()
        .filter(order_detail::Column::Id.eq(order.order_detail_id))
        .filter(order_detail::Column::Id.not_in_subquery(still_referenced))
        .exec(txn)
        .await?;

    insert_notification(txn, order.passenger_id, message).await?;

    Ok(removed.rows_affected > 0)
}

/// Batch-loads details and both parties for `orders`, preserving their order.
async fn join_orders<C>(conn: &C, orders: Vec<order::Model>) -> AppResult<Vec<JoinedOrder>>
where
    C: ConnectionTrait,
{
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let detail_ids: Vec<i32> = orders.iter().map(|o| o.order_detail_id).collect();
    let passenger_ids: Vec<i32> = orders.iter().map(|o| o.passenger_id).collect();
    let driver_ids: Vec<i32> = orders.iter().filter_map(|o| o.driver_id).collect();

    let details: HashMap<i32, order_detail::Model> = order_detail::Entity::find()
        .filter(order_detail::Column::Id.is_in(detail_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();
    let passengers: HashMap<i32, passenger::Model> = passenger::Entity::find()
        .filter(passenger::Column::Id.is_in(passenger_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let drivers: HashMap<i32, driver::Model> = driver::Entity::find()
        .filter(driver::Column::Id.is_in(driver_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    orders
        .into_iter()
        .map(|order| {
            // Several orders may share one detail row.
            let detail = details.get(&order.order_detail_id).cloned().ok_or_else(|| {
                AppError::Integrity(format!(
                    "order {} references missing order detail {}",
                    order.id, order.order_detail_id
                ))
            })?;
            let passenger = passengers.get(&order.passenger_id).cloned().ok_or_else(|| {
                AppError::Integrity(format!(
                    "order {} references missing passenger {}",
                    order.id, order.passenger_id
                ))
            })?;
            let driver = match order.driver_id {
                Some(id) => Some(drivers.get(&id).cloned().ok_or_else(|| {
                    AppError::Integrity(format!(
                        "order {} references missing driver {}",
                        order.id, id
                    ))
                })?),
                None => None,
            };

            Ok(JoinedOrder {
                order,
                detail,
                passenger,
                driver,
            })
        })
        .collect()
}
