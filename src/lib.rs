pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod notify;
pub mod schedule;
pub mod session;
pub mod sync;
pub mod utils;

pub use session::Session;
