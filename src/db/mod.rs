pub mod keys;
pub mod migrations;
pub mod repository;

pub use keys::StorageKey;
