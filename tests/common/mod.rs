#![allow(dead_code)]

use std::path::Path;

use taxi_orders::services::{NewOrder, Registration, Role};
use taxi_orders::{AppState, Config};

pub const PASSWORD: &str = "correct horse";

/// Fresh, migrated in-memory database with all services wired up.
pub async fn setup() -> AppState {
    AppState::connect(Config::in_memory())
        .await
        .expect("in-memory database should open")
}

/// Migrated SQLite file under `dir`, opened through a pool of
/// `max_connections`, so concurrent transactions really contend for the
/// database lock.
pub async fn setup_file(dir: &Path, max_connections: u32) -> AppState {
    let config = Config {
        database_url: format!("sqlite://{}?mode=rwc", dir.join("orders.db").display()),
        max_connections,
        ..Config::in_memory()
    };
    AppState::connect(config)
        .await
        .expect("file database should open")
}

pub async fn register(state: &AppState, role: Role, username: &str, rating: f64) -> i32 {
    state
        .accounts
        .register(role, Registration::new(username, PASSWORD, rating))
        .await
        .expect("registration should succeed")
        .id
}

pub async fn driver(state: &AppState, username: &str) -> i32 {
    register(state, Role::Driver, username, 4.5).await
}

pub async fn passenger(state: &AppState, username: &str) -> i32 {
    register(state, Role::Passenger, username, 4.0).await
}

pub fn ride(time: &str) -> NewOrder {
    NewOrder::new("A", "B", time, 100.0, 5.0).expect("valid order")
}
