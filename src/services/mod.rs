pub mod accounts;
pub mod notifications;
pub mod orders;

pub use accounts::{AccountService, Registration, Role, UserSession};
pub use notifications::NotificationService;
pub use orders::{NewOrder, OrderService, OrderView};
