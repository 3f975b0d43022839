//! SQLite warehouse implementation.

mod db;

pub use db::SqliteWarehouse;
