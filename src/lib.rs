pub mod config;
pub mod errors;
pub mod models;
pub mod pricing;
pub mod schema;
pub mod store;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2;

use crate::config::AppConfig;
use crate::errors::StoreError;

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

pub fn establish_connection(config: &AppConfig) -> Result<PgConnection, StoreError> {
    Ok(PgConnection::establish(&config.database_url)?)
}

pub fn initialize_db_pool(config: &AppConfig) -> Result<DbPool, StoreError> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(&config.database_url);
    Ok(r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)?)
}
