use sea_orm::{EntityTrait, PaginatorTrait};

use crate::AppState;
use crate::entities::driver;
use crate::error::AppResult;
use crate::services::{NewOrder, Registration, Role};

const DRIVERS: [(&str, f64); 3] = [
    ("andrey.slavka", 2.3),
    ("ivan.kapitanov", 4.7),
    ("egor.khoroshikh", 3.6),
];

const PASSENGERS: [(&str, f64); 3] = [
    ("kira.raeva", 4.3),
    ("ilya.galkin", 5.0),
    ("pavel.boyarskov", 2.8),
];

/// (driver index, passenger index, pickup, time, price, dropoff, distance)
const ORDERS: [(usize, usize, &str, &str, f64, &str, f64); 3] = [
    (1, 2, "Osipenko St, 82", "19:59", 427.0, "Nizhnevolzhskaya St, 19", 5.0),
    (0, 0, "Krasnaya Polyana St, 2, entrance 1", "15:06", 654.0, "Burnakovskaya St, 75", 1.9),
    (2, 1, "Minina St, 24", "6:44", 987.0, "Rozhdestvenskaya St, 10", 2.8),
];

/// Populates an empty database with a few drivers, passengers and assigned orders.
/// Does nothing once any driver exists. Returns whether anything was written.
pub async fn seed_demo_data(state: &AppState, password: &str) -> AppResult<bool> {
    let existing = driver::Entity::find().count(state.store.conn()).await?;
    if existing > 0 {
        tracing::info!(drivers = existing, "database already populated, skipping seed");
        return Ok(false);
    }

    let mut driver_ids = Vec::with_capacity(DRIVERS.len());
    for (username, rating) in DRIVERS {
        let session = state
            .accounts
            .register(Role::Driver, Registration::new(username, password, rating))
            .await?;
        driver_ids.push(session.id);
    }

    let mut passenger_ids = Vec::with_capacity(PASSENGERS.len());
    for (username, rating) in PASSENGERS {
        let session = state
            .accounts
            .register(Role::Passenger, Registration::new(username, password, rating))
            .await?;
        passenger_ids.push(session.id);
    }

    for (driver, passenger, pickup, time, price, dropoff, distance) in ORDERS {
        let new_order = NewOrder::new(pickup, dropoff, time, price, distance)?;
        state
            .orders
            .create_assigned_order(passenger_ids[passenger], driver_ids[driver], new_order)
            .await?;
    }

    tracing::info!(
        drivers = driver_ids.len(),
        passengers = passenger_ids.len(),
        orders = ORDERS.len(),
        "demo data seeded"
    );
    Ok(true)
}
