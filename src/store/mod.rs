mod gateway;
mod schema;
mod sqlite;

pub use gateway::{Filter, PersistenceGateway, Record};
pub use schema::{create_schema, validate_schema, ALL_TABLES};
pub use sqlite::SqliteGateway;
