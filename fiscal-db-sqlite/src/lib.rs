//! SQLite storage for settings profiles and bracket schedules.

pub mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
