//! REST endpoints for submitting and browsing incident reports.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Duration;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::geo::{Coordinates, ProximityFilter};
use super::media::{MediaStore, sanitize_filename};
use crate::error::{DatabaseError, PipelineError};
use crate::pipeline::normalizer;
use crate::pipeline::types::{RoutingDecision, Submission, TriageReport};
use crate::pipeline::TriagePipeline;
use crate::store::{IncidentStore, ReportStatus, StoredReport};

/// Upper bound on a multipart report submission.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TriagePipeline>,
    pub store: Arc<dyn IncidentStore>,
    pub media: MediaStore,
}

/// Build the Axum router with report REST routes.
pub fn report_routes(
    pipeline: Arc<TriagePipeline>,
    store: Arc<dyn IncidentStore>,
    media: MediaStore,
) -> Router {
    let state = AppState {
        pipeline,
        store,
        media,
    };

    Router::new()
        .route("/health", get(health))
        .route("/report/", post(submit_report))
        .route("/reports/", get(list_reports))
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}/status", post(update_status))
        .route("/reports/{id}/feedback", post(submit_feedback))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn database_error_response(e: DatabaseError) -> Response {
    match e {
        DatabaseError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, "Report not found"),
        other => {
            error!(error = %other, "Database operation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "suraksha-setu",
    }))
}

// ── Submission ──────────────────────────────────────────────────────

/// Parsed multipart body of `POST /report/`.
#[derive(Default)]
struct ReportForm {
    category: Option<String>,
    location: Option<String>,
    description: Option<String>,
    files: Vec<(String, Bytes)>,
}

impl ReportForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, PipelineError> {
        let mut form = Self::default();
        let bad = |e: axum::extract::multipart::MultipartError| {
            PipelineError::InvalidSubmission(e.body_text())
        };

        while let Some(field) = multipart.next_field().await.map_err(bad)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "category" => form.category = Some(field.text().await.map_err(bad)?),
                "location" => form.location = Some(field.text().await.map_err(bad)?),
                "description" => form.description = Some(field.text().await.map_err(bad)?),
                "file" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await.map_err(bad)?;
                    // Browsers send an empty part for an untouched file input.
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    sanitize_filename(&filename).map_err(|e| {
                        PipelineError::InvalidSubmission(e.to_string())
                    })?;
                    form.files.push((filename, data));
                }
                other => warn!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn required(value: Option<String>, field: &str) -> Result<String, PipelineError> {
        value.ok_or_else(|| PipelineError::InvalidSubmission(format!("missing field '{field}'")))
    }
}

async fn submit_report(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match ReportForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let fields = ReportForm::required(form.category, "category").and_then(|category| {
        let location = ReportForm::required(form.location, "location")?;
        let description = ReportForm::required(form.description, "description")?;
        Ok((category, location, description))
    });
    let (category, location, description) = match fields {
        Ok(fields) => fields,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let record = state.pipeline.run(&category, &location, &description).await;
    let report_id = StoredReport::new_id();

    let mut saved = Vec::with_capacity(form.files.len());
    for (filename, data) in &form.files {
        match state.media.save(&report_id, filename, data).await {
            Ok(path) => saved.push(path),
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Failed to save attachment");
                state.media.discard(&saved).await;
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    let media_files = saved.iter().map(|p| p.display().to_string()).collect();
    let stored = StoredReport::from_record(report_id.clone(), &record, media_files);
    if let Err(e) = state.store.insert_report(&stored).await {
        // No record will reference the attachments.
        state.media.discard(&saved).await;
        return database_error_response(e);
    }

    info!(
        report_id = %report_id,
        attachments = stored.media_files.len(),
        degraded = record.is_degraded(),
        "Report saved"
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Report saved with AI enrichment",
            "report_id": report_id,
            "ai_data": TriageReport::from(&record),
        })),
    )
        .into_response()
}

// ── Listing ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
    max_hours: Option<i64>,
}

impl ListQuery {
    /// A filter only applies when both coordinates are given. Out-of-range
    /// radius or age values are rejected.
    fn filter(&self) -> Result<Option<ProximityFilter>, String> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Ok(None);
        };

        let radius_km = self.radius_km.unwrap_or(ProximityFilter::DEFAULT_RADIUS_KM);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(format!("radius_km must be a non-negative number, got {radius_km}"));
        }

        let hours = self.max_hours.unwrap_or(ProximityFilter::DEFAULT_MAX_HOURS);
        let max_age = (hours > 0)
            .then(|| Duration::try_hours(hours))
            .flatten()
            .ok_or_else(|| format!("max_hours out of range: {hours}"))?;

        Ok(Some(ProximityFilter {
            centre: Coordinates::new(lat, lng),
            radius_km,
            max_age,
        }))
    }
}

async fn list_reports(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let filter = match query.filter() {
        Ok(filter) => filter,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let reports = match state.store.list_reports().await {
        Ok(reports) => reports,
        Err(e) => return database_error_response(e),
    };

    let reports = match filter {
        Some(filter) => filter.apply(reports, normalizer::region_now()),
        None => reports,
    };

    Json(reports).into_response()
}

async fn get_report(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_report(&id).await {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Report not found"),
        Err(e) => database_error_response(e),
    }
}

// ── Status ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusRequest {
    status: String,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Response {
    let status: ReportStatus = match body.status.parse() {
        Ok(status) => status,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.store.update_status(&id, status).await {
        Ok(()) => Json(serde_json::json!({ "report_id": id, "status": status })).into_response(),
        Err(e) => database_error_response(e),
    }
}

// ── Feedback ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedbackRequest {
    feedback: String,
}

async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Response {
    let report = match state.store.get_report(&id).await {
        Ok(Some(report)) => report,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Report not found"),
        Err(e) => return database_error_response(e),
    };

    let submission = Submission {
        submitted_at: normalizer::parse_timestamp(&report.timestamp)
            .unwrap_or_else(normalizer::region_now),
        category: report.category,
        location: report.location,
        description: report.description,
    };
    let classification = state
        .pipeline
        .reparse_classification(&report.classification, &submission);
    let routing = RoutingDecision::from_text(&report.routing);

    let revision = state
        .pipeline
        .revise(&submission, &classification, &routing, &body.feedback)
        .await;

    if let Err(e) = state.store.insert_feedback(&id, &body.feedback, &revision).await {
        return database_error_response(e);
    }

    Json(serde_json::json!({
        "report_id": id,
        "revision": revision,
    }))
    .into_response()
}
