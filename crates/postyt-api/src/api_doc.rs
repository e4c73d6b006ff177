//! OpenAPI documentation, served at `/api/openapi.json` and rendered with RapiDoc at `/docs`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use postyt_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
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

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Postyt API",
        version = "0.1.0",
        description = "Publish one video to many linked social accounts (YouTube, Facebook, Instagram, X, Reddit, ...) in a single request."
    ),
    paths(
        handlers::health::health_check,
        handlers::accounts::list_accounts,
        handlers::oauth::get_auth_url,
        handlers::oauth::oauth_callback,
        handlers::upload::upload_video,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::health::HealthResponse,
        handlers::accounts::AccountsResponse,
        handlers::oauth::AuthUrlResponse,
        models::PlatformId,
        models::AccountSummary,
        models::AccountUploadResult,
        models::PlatformUploadReport,
        models::OverallStatus,
        models::OverallUploadReport,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "accounts", description = "Linked platform accounts"),
        (name = "oauth", description = "Account linking through each platform's OAuth flow"),
        (name = "upload", description = "Multi-account video upload"),
    )
)]
pub struct ApiDoc;
