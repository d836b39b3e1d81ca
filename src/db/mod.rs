pub mod connection;
pub mod lots;

pub use connection::{init_db, Database};
