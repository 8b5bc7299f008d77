pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod export;
pub mod seed;
pub mod services;
pub mod utils;

pub use config::Config;
pub use db::Store;
pub use error::{AppError, AppResult};

use services::{AccountService, NotificationService, OrderService};

/// The store handle plus every service built over it.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub accounts: AccountService,
    pub orders: OrderService,
    pub notifications: NotificationService,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            notifications: NotificationService::new(store.clone()),
            store,
            config,
        }
    }

    /// Connects to the configured database and brings its schema up to date.
    pub async fn connect(config: Config) -> AppResult<Self> {
        let store = Store::connect(&config).await?;
        store.migrate().await?;
        Ok(Self::new(store, config))
    }
}
