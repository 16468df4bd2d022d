use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::middleware::API_KEY_HEADER;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Import Service API",
        version = "1.0.0",
        description = "Bulk-imports user accounts from an uploaded CSV into a company.\n\n**Authentication:** `/users` endpoints require the shared secret in the `X-API-Key` header.\n\n**Upload format:** a CSV whose header contains `email`, `full_name` and `password`."
    ),
    paths(
        crate::api::users::add_users,
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::ImportReport,
            crate::api::users::ImportUploadForm,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "Bulk user import."),
        (name = "Health", description = "Health check and process counters."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    API_KEY_HEADER,
                    "Shared secret configured as MY_API_KEY",
                ))),
            );
        }
    }
}
