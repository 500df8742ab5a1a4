use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    todo::api::v1::TodoState,
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower::ServiceBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub mod v1;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::todo::api::v1::list_todos_handler,
        crate::todo::api::v1::create_todo_handler,
        crate::todo::api::v1::show_todo_handler,
        crate::todo::api::v1::update_todo_handler,
        crate::todo::api::v1::delete_todo_handler,
    ),
    components(schemas(
        crate::todo::TodoPayload,
        crate::todo::api::v1::TodoJson,
        crate::todo::api::v1::TodoListResponse,
        crate::todo::api::v1::TodoResponse,
        crate::todo::api::v1::ValidationFailureResponse,
        crate::todo::api::v1::DuplicateTitleResponse,
        v1::Status,
        v1::MessageResponse,
        v1::FailureResponse,
    )),
    modifiers(&BearerSecurity),
    tags((name = "Todos", description = "Owner-scoped todo management"))
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Creates the JSON API routes. Every todo route requires a bearer token.
pub fn create_api_router(auth_state: Arc<AuthState>, todo_state: Arc<TodoState>) -> axum::Router {
    let todos_router = crate::todo::api::v1::create_api_router(todo_state);
    let protected_routes =
        todos_router.layer(ServiceBuilder::new().layer(from_fn(auth::require_auth_middleware)));
    Router::new()
        .merge(protected_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::auth_user_middleware,
        )))
}
