pub mod credential;
pub mod driver;
pub mod notification;
pub mod order;
pub mod order_detail;
pub mod passenger;
