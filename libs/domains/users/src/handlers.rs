use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, DeleteUserRequest, UpdateUserRequest, User};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the user directory API
#[derive(OpenApi)]
#[openapi(
    paths(greeting, list_users, add_user, update_user, delete_user),
    components(
        schemas(User, CreateUser, UpdateUserRequest, DeleteUserRequest),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User directory endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the user directory router with all HTTP endpoints.
///
/// The paths are a fixed public contract shared with existing clients:
/// `/`, `/user`, `/add-user`, `/update-user`, `/delete-user`.
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(greeting))
        .route("/user", get(list_users))
        .route("/add-user", post(add_user))
        .route("/update-user", put(update_user))
        .route("/delete-user", delete(delete_user))
        .with_state(shared_service)
}

/// Static service greeting
#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    responses(
        (status = 200, description = "Service greeting", body = String)
    )
)]
async fn greeting() -> &'static str {
    "User Directory API is running"
}

/// List all users
#[utoipa::path(
    get,
    path = "/user",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
) -> UserResult<Json<Vec<User>>> {
    let users = service.list_users().await?;
    Ok(Json(users))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/add-user",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 200, description = "User added", body = String),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<String> {
    service.create_user(input).await?;
    Ok("User added".to_string())
}

/// Update the first user matching the supplied selector
#[utoipa::path(
    put,
    path = "/update-user",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated; body carries the updated record", body = String),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> UserResult<String> {
    let selector = request.selector()?;
    let user = service.update_user(&selector, request.patch()).await?;

    Ok(format!("User updated: {}", to_record_json(&user)?))
}

/// Delete the first user matching the supplied selector
#[utoipa::path(
    delete,
    path = "/delete-user",
    tag = "Users",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted; body carries the record's prior state", body = String),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(request): ValidatedJson<DeleteUserRequest>,
) -> UserResult<String> {
    let selector = request.selector()?;
    let user = service.delete_user(&selector).await?;

    Ok(format!("User deleted: {}", to_record_json(&user)?))
}

fn to_record_json(user: &User) -> UserResult<String> {
    serde_json::to_string(user).map_err(|e| UserError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryUserRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt; // for oneshot()

    fn app() -> Router {
        router(UserService::new(MemoryUserRepository::new()))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_greeting_returns_200_text() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_string(response.into_body()).await;
        assert_eq!(text, "User Directory API is running");
    }

    #[tokio::test]
    async fn test_add_user_then_list_shows_the_record() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/add-user",
                json!({"name": "Ann", "email": "ann@x.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response.into_body()).await, "User added");

        let request = Request::builder().uri("/user").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let users = body_json(response.into_body()).await;
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["name"], "Ann");
        assert_eq!(users[0]["email"], "ann@x.com");
        assert!(users[0]["_id"].is_string());
    }

    #[tokio::test]
    async fn test_add_user_duplicate_email_is_400() {
        let app = app();
        let body = json!({"name": "Ann", "email": "ann@x.com"});

        let response = app
            .clone()
            .oneshot(json_request("POST", "/add-user", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/add-user", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Still exactly one record
        let request = Request::builder().uri("/user").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let users = body_json(response.into_body()).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_user_missing_fields_is_400() {
        let response = app()
            .oneshot(json_request("POST", "/add-user", json!({"name": "Ann"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app()
            .oneshot(json_request(
                "POST",
                "/add-user",
                json!({"name": "", "email": "ann@x.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_user_by_email_renames_record() {
        let app = app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/add-user",
                json!({"name": "Ann", "email": "ann@x.com"}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                "PUT",
                "/update-user",
                json!({"email": "ann@x.com", "newName": "Annie"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_string(response.into_body()).await;
        assert!(text.starts_with("User updated: "));

        let record: serde_json::Value =
            serde_json::from_str(text.trim_start_matches("User updated: ")).unwrap();
        assert_eq!(record["name"], "Annie");
        assert_eq!(record["email"], "ann@x.com");
    }

    #[tokio::test]
    async fn test_update_user_without_selector_is_400() {
        let response = app()
            .oneshot(json_request(
                "PUT",
                "/update-user",
                json!({"newName": "Annie"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_user_unknown_selector_is_404() {
        let response = app()
            .oneshot(json_request(
                "PUT",
                "/update-user",
                json!({"email": "ghost@x.com", "newName": "Ghost"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_user_malformed_id_is_400() {
        let response = app()
            .oneshot(json_request(
                "PUT",
                "/update-user",
                json!({"id": "not-a-uuid", "newName": "Annie"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_user_by_id_returns_prior_state_and_empties_list() {
        let app = app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/add-user",
                json!({"name": "Ann", "email": "ann@x.com"}),
            ))
            .await
            .unwrap();

        // Fetch the generated id from the list endpoint
        let request = Request::builder().uri("/user").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let users = body_json(response.into_body()).await;
        let id = users[0]["_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request("DELETE", "/delete-user", json!({"id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_string(response.into_body()).await;
        assert!(text.starts_with("User deleted: "));
        let record: serde_json::Value =
            serde_json::from_str(text.trim_start_matches("User deleted: ")).unwrap();
        assert_eq!(record["email"], "ann@x.com");

        let request = Request::builder().uri("/user").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let users = body_json(response.into_body()).await;
        assert!(users.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_without_selector_is_400() {
        let response = app()
            .oneshot(json_request("DELETE", "/delete-user", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_user_unknown_selector_is_404() {
        let response = app()
            .oneshot(json_request(
                "DELETE",
                "/delete-user",
                json!({"name": "Nobody"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let request = Request::builder()
            .uri("/not-a-route")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
