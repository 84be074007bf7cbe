//! Ingest endpoints.
//!
//! - `POST /v1/ingest`     : exposition text body
//! - `POST /v1/cloudwatch` : CloudWatch Logs subscription record (gzip or plain JSON)
//!
//! Both answer with an `IngestReport`. 207 means some families were rejected
//! while the rest of the batch was applied.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use promerge_core::error::MergeError;
use promerge_core::protocol::cloudwatch::extract_exposition;
use promerge_core::{BatchError, IngestError, IngestSummary};

use crate::app_state::AppState;
use crate::transport::codec;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub msg: String,
}

impl From<&MergeError> for ErrorBody {
    fn from(e: &MergeError) -> Self {
        Self {
            code: e.client_code().as_str(),
            msg: e.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub merged: usize,
    pub dropped: usize,
    pub failed: usize,
    pub errors: Vec<ErrorBody>,
}

impl IngestReport {
    fn absorb(&mut self, result: Result<IngestSummary, BatchError>) {
        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                self.failed += e.failures.len();
                self.errors.extend(e.failures.iter().map(ErrorBody::from));
                e.summary
            }
        };
        self.inserted += summary.inserted;
        self.merged += summary.merged;
        self.dropped += summary.dropped;
    }
}

impl IntoResponse for IngestReport {
    fn into_response(self) -> Response {
        let status = if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::MULTI_STATUS
        };
        (status, Json(self)).into_response()
    }
}

pub fn status_for(e: &MergeError) -> StatusCode {
    match e {
        MergeError::BadRequest(_) | MergeError::UnsupportedVersion => StatusCode::BAD_REQUEST,
        MergeError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        MergeError::UnsupportedMetricType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MergeError::NameMismatch { .. } | MergeError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(e: &MergeError) -> Response {
    (status_for(e), Json(ErrorBody::from(e))).into_response()
}

pub async fn ingest_exposition(State(app): State<AppState>, body: Bytes) -> Response {
    let max = app.cfg().server.max_body_bytes;

    let text = match codec::decode_exposition(body, max) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "exposition body rejected");
            app.metrics().record_decode_error("exposition", e.client_code().as_str());
            return error_response(&e);
        }
    };

    let result = match app.aggregator().ingest_text(&text) {
        Ok(summary) => Ok(summary),
        Err(IngestError::Batch(e)) => Err(e),
        Err(IngestError::Decode(e)) => {
            tracing::warn!(error = %e, "exposition text rejected");
            app.metrics().record_decode_error("exposition", e.client_code().as_str());
            return error_response(&e);
        }
    };
    app.metrics().record_batch("exposition", &result);

    let mut report = IngestReport::default();
    report.absorb(result);
    tracing::debug!(
        source = "exposition",
        inserted = report.inserted,
        merged = report.merged,
        failed = report.failed,
        "batch ingested"
    );
    report.into_response()
}

pub async fn ingest_cloudwatch(State(app): State<AppState>, body: Bytes) -> Response {
    let max = app.cfg().server.max_body_bytes;

    let envelope = match codec::decode_cloudwatch(body, max) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(error = %e, "cloudwatch record rejected");
            app.metrics().record_decode_error("cloudwatch", e.client_code().as_str());
            return error_response(&e);
        }
    };

    if !envelope.is_data() {
        tracing::debug!(message_type = %envelope.message_type, "skipping non-data record");
        return IngestReport::default().into_response();
    }

    tracing::info!(
        group = %envelope.log_group,
        stream = %envelope.log_stream,
        events = envelope.log_events.len(),
        "cloudwatch record"
    );

    let aggregator = app.aggregator();
    let mut report = IngestReport::default();
    for text in extract_exposition(&envelope, &app.cfg().cloudwatch.payload_field) {
        let result = match aggregator.ingest_text(&text) {
            Ok(summary) => Ok(summary),
            Err(IngestError::Batch(e)) => Err(e),
            Err(IngestError::Decode(e)) => {
                tracing::warn!(error = %e, group = %envelope.log_group, "log event text rejected");
                app.metrics().record_decode_error("cloudwatch", e.client_code().as_str());
                report.failed += 1;
                report.errors.push(ErrorBody::from(&e));
                continue;
            }
        };
        app.metrics().record_batch("cloudwatch", &result);
        report.absorb(result);
    }

    tracing::debug!(
        source = "cloudwatch",
        inserted = report.inserted,
        merged = report.merged,
        failed = report.failed,
        "record ingested"
    );
    report.into_response()
}
