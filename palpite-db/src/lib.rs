pub mod config;
pub mod db;
pub mod models;
pub mod usage;

pub use rusqlite;
