use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::geocoding::services::GeocodeResolver;
use crate::features::reports::dtos::{
    AdminReportDto, FormTokenResponseDto, PublicReportDto, SubmissionResponseDto,
    SubmitReportDto, UpdateReportStatusDto,
};
use crate::features::reports::models::{PhotoUpload, SubmissionContext, SubmissionForm};
use crate::features::reports::services::{ReportService, ReportSubmissionPipeline, SubmissionGate};
use crate::shared::constants::{FORM_TOKEN_HEADER, SESSION_COOKIE_NAME};
use crate::shared::time::now_wib;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub pipeline: Arc<ReportSubmissionPipeline>,
    pub gate: Arc<SubmissionGate>,
    pub reports: Arc<ReportService>,
    pub resolver: Option<Arc<GeocodeResolver>>,
}

/// Session id from the cookie, minting a new session when absent
fn session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let value = cookie.value().to_string();
        if !value.is_empty() {
            return (jar, value);
        }
    }

    let value = Uuid::new_v4().to_string();
    let cookie = Cookie::build((SESSION_COOKIE_NAME, value.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), value)
}

/// Issue a form token for the caller's session
#[utoipa::path(
    get,
    path = "/api/reports/form-token",
    responses(
        (status = 200, description = "Token for the next submission", body = ApiResponse<FormTokenResponseDto>)
    ),
    tag = "reports"
)]
pub async fn issue_form_token(
    State(state): State<ReportState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<FormTokenResponseDto>>) {
    let (jar, session) = session(jar);
    let form_token = state.gate.issue(&session).await;

    (
        jar,
        Json(ApiResponse::success(
            Some(FormTokenResponseDto { form_token }),
            None,
            None,
        )),
    )
}

/// Submit a flood report
///
/// Every response carries a fresh token in the `x-form-token` header,
/// to be used for the next attempt.
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body(
        content = SubmitReportDto,
        content_type = "multipart/form-data",
        description = "Report form with the flood photo",
    ),
    responses(
        (status = 201, description = "Report stored", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Missing or invalid fields or photo"),
        (status = 409, description = "Invalid or already used form token, or duplicate report"),
        (status = 429, description = "Daily report limit reached"),
        (status = 500, description = "Report could not be saved")
    ),
    tag = "reports"
)]
pub async fn submit_report(
    State(state): State<ReportState>,
    ClientIp(client_ip): ClientIp,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let (jar, session) = session(jar);
    let context = SubmissionContext { session, client_ip };

    let mut response = match submit(&state, multipart, context.clone()).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    let next_token = state.gate.issue(&context.session).await;
    if let Ok(value) = HeaderValue::from_str(&next_token) {
        response.headers_mut().insert(FORM_TOKEN_HEADER, value);
    }

    (jar, response).into_response()
}

async fn submit(
    state: &ReportState,
    multipart: Multipart,
    context: SubmissionContext,
) -> Result<Response> {
    let (form, photo) = read_submission(multipart).await?;
    let receipt = state
        .pipeline
        .submit_detached(form, photo, context)
        .await?;

    let body = ApiResponse::success(
        Some(SubmissionResponseDto::from(&receipt)),
        Some(receipt.message),
        None,
    );
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn read_submission(
    mut multipart: Multipart,
) -> Result<(SubmissionForm, Option<PhotoUpload>)> {
    let mut form = SubmissionForm::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "photo" {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                debug!("Failed to read photo bytes: {}", e);
                AppError::BadRequest(format!("Failed to read photo data: {}", e))
            })?;
            photo = Some(PhotoUpload {
                filename,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field.text().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read {} field: {}", field_name, e))
        })?;

        match field_name.as_str() {
            "form_token" => form.form_token = text,
            "address" => form.address = text,
            "flood_height" => form.flood_height = text,
            "reporter_name" => form.reporter_name = text,
            "reporter_phone" => form.reporter_phone = Some(text),
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok((form, photo))
}

/// Get the public view of a report
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<PublicReportDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<ReportState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PublicReportDto>>> {
    let report = state.reports.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// List all reports, newest first (operator)
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of reports", body = ApiResponse<Vec<AdminReportDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("basic_auth" = [])),
    tag = "operator"
)]
pub async fn list_reports(
    State(state): State<ReportState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AdminReportDto>>>> {
    let (reports, total) = state.reports.list(&pagination).await?;
    let dtos: Vec<AdminReportDto> = reports.into_iter().map(|r| r.into()).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Change a report's status (operator)
#[utoipa::path(
    patch,
    path = "/api/admin/reports/{id}/status",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    request_body = UpdateReportStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<AdminReportDto>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("basic_auth" = [])),
    tag = "operator"
)]
pub async fn update_report_status(
    State(state): State<ReportState>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateReportStatusDto>,
) -> Result<Json<ApiResponse<AdminReportDto>>> {
    let report = state.reports.update_status(id, dto.status).await?;
    tracing::info!("Report {} status set to {}", id, dto.status);
    Ok(Json(ApiResponse::success(
        Some(report.into()),
        Some("Status updated".to_string()),
        None,
    )))
}

/// Geocode a report that has no coordinates yet (operator)
#[utoipa::path(
    post,
    path = "/api/admin/reports/{id}/geocode",
    params(
        ("id" = i64, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Coordinates stored", body = ApiResponse<AdminReportDto>),
        (status = 400, description = "Geocoding disabled or address too short"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report or location not found"),
        (status = 409, description = "Report already has coordinates"),
        (status = 422, description = "Location outside Indonesia"),
        (status = 502, description = "Place search provider unavailable")
    ),
    security(("basic_auth" = [])),
    tag = "operator"
)]
pub async fn geocode_report(
    State(state): State<ReportState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminReportDto>>> {
    let resolver = state
        .resolver
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Geocoding is disabled".to_string()))?;

    let report = state.reports.get_by_id(id).await?;
    if report.has_coordinates() {
        return Err(AppError::Conflict(format!(
            "Report {} already has coordinates",
            id
        )));
    }

    match resolver.resolve(&report.address).await {
        Ok(location) => {
            state
                .reports
                .record_geocode_success(id, &location, now_wib())
                .await?;
        }
        Err(e) => {
            tracing::warn!("Operator geocoding failed for report {}: {}", id, e);
            state.reports.record_geocode_failure(id).await?;
            return Err(e.into());
        }
    }

    let report = state.reports.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(
        Some(report.into()),
        Some("Report geocoded".to_string()),
        None,
    )))
}
