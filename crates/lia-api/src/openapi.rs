//! # OpenAPI Document Assembly
//!
//! Served at `/openapi.json`. Protected operations declare the
//! `bearer_auth` security scheme (HTTP bearer, JWT format).

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LIA Admin API",
        version = "0.1.0",
        description = "Bearer-token authenticated API for LIA Admin.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::auth::me,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::auth::MeResponse,
        crate::routes::auth::MeData,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Authenticated caller"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
