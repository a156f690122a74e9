//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Directory API",
        version = "0.1.0",
        description = "MongoDB-based REST API for managing user records",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    nest(
        (path = "", api = domain_users::ApiDoc)
    ),
    tags(
        (name = "Users", description = "User directory endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;
