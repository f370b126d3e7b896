use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::geocoding::{
    dtos as geocoding_dtos, handlers as geocoding_handlers, models as geocoding_models,
};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports (public)
        reports_handlers::issue_form_token,
        reports_handlers::submit_report,
        reports_handlers::get_report,
        // Geocoding (public)
        geocoding_handlers::resolve_address,
        geocoding_handlers::geocode_status,
        // Operator
        reports_handlers::list_reports,
        reports_handlers::update_report_status,
        reports_handlers::geocode_report,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reports
            reports_models::ReportStatus,
            reports_models::GeocodeState,
            reports_dtos::FormTokenResponseDto,
            reports_dtos::SubmitReportDto,
            reports_dtos::SubmissionResponseDto,
            reports_dtos::PublicReportDto,
            reports_dtos::AdminReportDto,
            reports_dtos::UpdateReportStatusDto,
            ApiResponse<reports_dtos::FormTokenResponseDto>,
            ApiResponse<reports_dtos::SubmissionResponseDto>,
            ApiResponse<reports_dtos::PublicReportDto>,
            ApiResponse<reports_dtos::AdminReportDto>,
            ApiResponse<Vec<reports_dtos::AdminReportDto>>,
            // Geocoding
            geocoding_models::GeocodeConfidence,
            geocoding_models::GeocodeFailureReason,
            geocoding_dtos::GeocodeResponseDto,
            geocoding_dtos::GeocodeStatusDto,
            ApiResponse<geocoding_dtos::GeocodeResponseDto>,
            ApiResponse<geocoding_dtos::GeocodeStatusDto>,
        )
    ),
    tags(
        (name = "reports", description = "Citizen flood report submission"),
        (name = "geocoding", description = "Address to coordinate lookup for Indonesian locations"),
        (name = "operator", description = "Report moderation (basic auth)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lapor Banjir API",
        version = "0.1.0",
        description = "API documentation for Lapor Banjir",
    )
)]
pub struct ApiDoc;

/// Adds HTTP basic security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_report_and_geocode_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/reports",
            "/api/reports/form-token",
            "/api/reports/{id}",
            "/api/geocode",
            "/api/geocode/status",
            "/api/admin/reports",
            "/api/admin/reports/{id}/status",
            "/api/admin/reports/{id}/geocode",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {}",
                expected
            );
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Banjir".to_string(),
            version: "2.0.0".to_string(),
            description: "desc".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Banjir");
        assert_eq!(doc.info.version, "2.0.0");
    }
}
