// src/services/api_server.rs
//! REST API for the certificate anchoring system.
//!
//! Thin glue over the service layer: handlers validate input, delegate to
//! the anchoring and verification services, and shape JSON responses. Both
//! verification entry points of the institution's workflow (manual hash
//! entry and QR scan) converge on `GET /verify/:hash`: a QR code is just
//! another carrier for the hash, so issuance returns the verification URL
//! as the QR payload.

use crate::error::VerifyError;
use crate::models::certificate::NewCertificate;
use crate::services::anchoring::AnchoringService;
use crate::services::verification::VerificationService;
use crate::storage::anchor_log::AnchorLog;
use crate::storage::record_store::CertificateStore;
use crate::utils::commitment::{compute_hash, CertificateFields};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Request payload for issuing a certificate
#[derive(Serialize, Deserialize)]
pub struct IssueCertificateRequest {
    pub student_name: String,
    pub department: String,
    pub registration_number: String,
    #[serde(default)]
    pub join_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub final_score: String,
}

/// Response for certificate issuance operation
#[derive(Serialize, Deserialize)]
pub struct IssueCertificateResponse {
    pub certificate_hash: String,
    pub anchor_ref: String,
    pub ledger_backed: bool,
    /// QR payload: scanning it resolves to the verification endpoint.
    pub verification_url: String,
}

/// API server state containing the service dependencies
pub struct ApiServer {
    /// Service for hashing and anchoring certificates
    anchoring: Arc<AnchoringService>,

    /// Service for verifying certificates
    verification: Arc<VerificationService>,

    /// Store of issued certificate records
    record_store: Arc<dyn CertificateStore>,

    /// Append-only anchor log, exposed for administrative browsing
    anchor_log: Arc<dyn AnchorLog>,

    /// Public base URL embedded in verification links
    app_url: String,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `anchoring` - Service for certificate anchoring
    /// * `verification` - Service for certificate verification
    /// * `record_store` - Certificate record storage
    /// * `anchor_log` - Append-only anchor log
    /// * `app_url` - Public base URL for verification links
    pub fn new(
        anchoring: AnchoringService,
        verification: VerificationService,
        record_store: Arc<dyn CertificateStore>,
        anchor_log: Arc<dyn AnchorLog>,
        app_url: String,
    ) -> Self {
        ApiServer {
            anchoring: Arc::new(anchoring),
            verification: Arc::new(verification),
            record_store,
            anchor_log,
            app_url,
        }
    }

    /// Configures the route table. Split from [`run`](Self::run) so tests
    /// can drive the router without binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/issue-certificate", post(Self::issue_certificate_handler))
            .route("/verify/:hash", get(Self::verify_handler))
            .route("/anchors", get(Self::anchors_handler))
            .route("/verifications", get(Self::verifications_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    // =====================
    // Issuance Handlers
    // =====================

    /// Issues a certificate: builds the field mapping, stores the record,
    /// and anchors its hash.
    ///
    /// # Endpoint
    /// POST /issue-certificate
    ///
    /// # Request Body
    /// JSON payload containing the student's certificate details
    ///
    /// # Responses
    /// - 200 OK: Returns hash, anchor reference, and verification URL
    /// - 400 Bad Request: Missing required certificate information
    /// - 409 Conflict: Identical certificate already issued
    /// - 500 Internal Server Error: Anchoring failed
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssueCertificateRequest>,
    ) -> Response {
        if payload.student_name.trim().is_empty()
            || payload.department.trim().is_empty()
            || payload.registration_number.trim().is_empty()
        {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "missing required certificate information" })),
            )
                .into_response();
        }

        let issued_at = Utc::now();
        let mut fields = CertificateFields::new();
        fields.insert("studentName".into(), payload.student_name.clone());
        fields.insert("department".into(), payload.department);
        fields.insert("registrationNumber".into(), payload.registration_number);
        fields.insert("joinDate".into(), payload.join_date);
        fields.insert("endDate".into(), payload.end_date);
        fields.insert("academicYear".into(), payload.academic_year);
        fields.insert("finalScore".into(), payload.final_score);
        fields.insert("issuedAt".into(), issued_at.to_rfc3339());

        let certificate_hash = compute_hash(&fields);
        let new_certificate = NewCertificate {
            student_ref: payload.student_name,
            issue_date: issued_at,
            fields: fields.clone(),
            certificate_hash: certificate_hash.clone(),
        };
        if let Err(e) = state.record_store.insert(new_certificate).await {
            error!("failed to store certificate record: {}", e);
            return (
                StatusCode::CONFLICT,
                Json(json!({ "message": format!("failed to store certificate: {}", e) })),
            )
                .into_response();
        }

        match state.anchoring.anchor(&fields).await {
            Ok((hash, anchor_ref)) => (
                StatusCode::OK,
                Json(IssueCertificateResponse {
                    verification_url: format!("{}/verify/{}", state.app_url, hash),
                    certificate_hash: hash,
                    ledger_backed: anchor_ref.is_ledger_backed(),
                    anchor_ref: anchor_ref.tx().to_string(),
                }),
            )
                .into_response(),
            Err(e) => {
                error!("anchoring failed for {}: {}", certificate_hash, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": format!("anchoring failed: {}", e) })),
                )
                    .into_response()
            }
        }
    }

    // =====================
    // Verification Handlers
    // =====================

    /// Verifies a certificate by its content hash
    ///
    /// # Endpoint
    /// GET /verify/:hash
    ///
    /// # Parameters
    /// * `hash` - Hex-encoded certificate hash (path parameter)
    ///
    /// # Responses
    /// - 200 OK: Returns the verdict, including negative verdicts
    /// - 503 Service Unavailable: No anchor source could be consulted
    /// - 500 Internal Server Error: Record store failure
    async fn verify_handler(
        Path(hash): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> Response {
        match state.verification.verify(&hash).await {
            Ok(result) => (StatusCode::OK, Json(result)).into_response(),
            Err(VerifyError::Unavailable(reason)) => {
                error!("verification unavailable for {}: {}", hash, reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "message": "verification temporarily unavailable" })),
                )
                    .into_response()
            }
            Err(VerifyError::RecordStore(e)) => {
                error!("record store failure verifying {}: {}", hash, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "failed to verify certificate" })),
                )
                    .into_response()
            }
        }
    }

    // =====================
    // Audit & Administration
    // =====================

    /// Lists all anchor log entries
    ///
    /// # Endpoint
    /// GET /anchors
    ///
    /// # Responses
    /// - 200 OK: Returns the anchor entries in append order
    /// - 500 Internal Server Error: Anchor log unreadable
    async fn anchors_handler(State(state): State<Arc<ApiServer>>) -> Response {
        match state.anchor_log.list_all().await {
            Ok(entries) => {
                let anchors: Vec<_> = entries
                    .iter()
                    .map(|entry| {
                        json!({
                            "hash": entry.hash,
                            "anchor_ref": entry.anchor_ref.tx(),
                            "ledger_backed": entry.anchor_ref.is_ledger_backed(),
                            "timestamp": entry.timestamp,
                        })
                    })
                    .collect();
                (StatusCode::OK, Json(json!({ "anchors": anchors }))).into_response()
            }
            Err(e) => {
                error!("failed to list anchors: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "failed to list anchors" })),
                )
                    .into_response()
            }
        }
    }

    /// Returns the verification audit history
    ///
    /// # Endpoint
    /// GET /verifications
    ///
    /// # Responses
    /// - 200 OK: Returns the audit records in append order
    /// - 500 Internal Server Error: Audit log unreadable
    async fn verifications_handler(State(state): State<Arc<ApiServer>>) -> Response {
        match state.verification.history().await {
            Ok(records) => {
                (StatusCode::OK, Json(json!({ "verifications": records }))).into_response()
            }
            Err(e) => {
                error!("failed to read verification history: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "failed to read verification history" })),
                )
                    .into_response()
            }
        }
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            anchoring: Arc::clone(&self.anchoring),
            verification: Arc::clone(&self.verification),
            record_store: Arc::clone(&self.record_store),
            anchor_log: Arc::clone(&self.anchor_log),
            app_url: self.app_url.clone(),
        }
    }
}
