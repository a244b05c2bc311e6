use crate::transport::http::handlers::{health, identity, realtime, resources};
use crate::transport::http::types::{ApiResponse, AppState, IdentityResponse};
use axum::routing::get;
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        identity::current_identity_handler,
        resources::list_handler,
        resources::create_handler,
        resources::get_handler,
        resources::update_handler,
        resources::delete_handler,
        realtime::realtime_handler
    ),
    components(schemas(ApiResponse, IdentityResponse)),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/me", get(identity::current_identity_handler))
        .route(
            "/api/realtime/:role/:resource",
            get(realtime::realtime_handler),
        )
        .route(
            "/api/:role/:resource",
            get(resources::list_handler).post(resources::create_handler),
        )
        .route(
            "/api/:role/:resource/:id",
            get(resources::get_handler)
                .patch(resources::update_handler)
                .delete(resources::delete_handler),
        )
        .with_state(app_state)
}
