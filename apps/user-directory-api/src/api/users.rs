//! User directory API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{MongoUserRepository, UserService, handlers};
use tracing::info;

use crate::state::AppState;

/// Create the users router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoUserRepository::new(state.db.clone());

    // Create the service
    let service = UserService::new(repository);

    // Return the domain's router
    handlers::router(service)
}

/// Initialize user indexes in MongoDB.
///
/// Creates the unique email index that upholds the duplicate-email
/// invariant under concurrent creates.
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    let repository = MongoUserRepository::new(db.clone());
    repository
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create user indexes: {}", e))?;
    info!("User collection indexes created");
    Ok(())
}
