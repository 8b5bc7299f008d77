pub mod password;
pub mod time;
