// src/main.rs

//! # Certificate Anchoring System - Main Entry Point
//!
//! Initializes all core components and starts the API server.
//!
//! ## Architecture Overview
//! 1. **Blockchain Layer**: `Web3LedgerClient` for the CertificateRegistry contract
//! 2. **Services Layer**: Anchoring, verification, and API endpoints
//! 3. **Storage Layer**: Append-only anchor and audit logs plus the record store
//! 4. **Proof Layer**: Optional Groth16 binding-proof checker
//!
//! ## Environment Variables
//! - `CERTIFY_CONTRACT_ADDRESS`: Deployed CertificateRegistry contract address (required)
//! - `CERTIFY_RPC_URL`: Ledger JSON-RPC endpoint (default: http://127.0.0.1:8545)
//! - `CERTIFY_LEDGER_ACCOUNT`: (Optional) account to transact from
//! - `CERTIFY_ANCHOR_LOG_PATH` / `CERTIFY_AUDIT_LOG_PATH`: log file locations
//! - `CERTIFY_LISTEN_ADDR` / `CERTIFY_APP_URL`: API bind address and public URL
//! - `CERTIFY_BINDING_KEY_PATH`: (Optional) Groth16 verifying key for binding proofs

use crate::blockchain::ledger_client::{ConnectionState, LedgerClient, Web3LedgerClient};
use crate::config::Settings;
use crate::services::anchoring::AnchoringService;
use crate::services::api_server::ApiServer;
use crate::services::verification::VerificationService;
use crate::storage::anchor_log::{AnchorLog, FileAnchorLog};
use crate::storage::audit_log::{FileVerificationLog, VerificationLog};
use crate::storage::record_store::{CertificateStore, InMemoryCertificateStore};
use crate::zkp::binding::BindingProofChecker;
use anyhow::Context;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod blockchain; // Ledger interactions
mod config; // Layered runtime settings
mod error; // Error taxonomy
mod models; // Data structures
mod services; // Business logic and API
mod storage; // Anchor log, audit log, record store
mod utils; // Commitment hashing
mod zkp; // Binding-proof verification

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Build the ledger client and probe the connection
/// 3. Open the anchor and audit logs
/// 4. Wire the services and start the API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::load().context("failed to load configuration")?;

    let ledger: Arc<dyn LedgerClient> = Arc::new(
        Web3LedgerClient::new(
            &settings.rpc_url,
            &settings.contract_address,
            settings.ledger_account(),
        )
        .context("failed to build ledger client")?,
    );
    match ledger.connect().await {
        ConnectionState::Connected => info!("ledger reachable at {}", settings.rpc_url),
        state => warn!(
            "ledger at {} not reachable ({:?}), anchors will be recorded locally",
            settings.rpc_url, state
        ),
    }

    let anchor_log: Arc<dyn AnchorLog> =
        Arc::new(FileAnchorLog::new(settings.anchor_log_path.clone()));
    let audit_log: Arc<dyn VerificationLog> =
        Arc::new(FileVerificationLog::new(settings.audit_log_path.clone()));
    let record_store: Arc<dyn CertificateStore> = Arc::new(InMemoryCertificateStore::new());

    let binding_checker = Arc::new(BindingProofChecker::from_key_file(
        settings.binding_key_path.as_deref(),
    ));
    if binding_checker.is_enabled() {
        info!("binding-proof checker enabled");
    }

    let anchoring = AnchoringService::new(Arc::clone(&ledger), Arc::clone(&anchor_log));
    let verification = VerificationService::new(
        Arc::clone(&record_store),
        Arc::clone(&anchor_log),
        Arc::clone(&ledger),
        Arc::clone(&audit_log),
        binding_checker,
    );

    let api_server = ApiServer::new(
        anchoring,
        verification,
        record_store,
        anchor_log,
        settings.app_url.clone(),
    );

    info!("API server running at http://{}", settings.listen_addr);
    api_server.run(settings.listen_addr).await
}
