// src/blockchain/ledger_client.rs
//! External ledger adapter.
//!
//! Wraps an Ethereum-compatible chain holding the `CertificateRegistry`
//! contract (`storeCertificate(hash)` / `certificateExists(hash)`). The
//! client owns its connection state and is injected into the anchoring and
//! verification services, so a fake implementation can stand in for tests.
//!
//! Connection state machine:
//!
//! ```text
//! Uninitialized -> Connecting -> { Connected, Degraded }
//! Connected -> Degraded          (on any transaction/query failure)
//! Degraded -> Uninitialized      (only via explicit reset)
//! ```
//!
//! The `Connected -> Degraded` transition is one-way within a process
//! lifetime: once a call fails, the client stops attempting live
//! connections so the hot path stays bounded. Every network call carries a
//! 3-second timeout and is never awaited without one.

use crate::error::LedgerError;
use async_trait::async_trait;
use log::{info, warn};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::Address;

/// Bound on every ledger-facing network call.
pub const LEDGER_TIMEOUT: Duration = Duration::from_secs(3);

/// Observable connection state of a ledger client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected,
    /// The ledger is unreachable; the client will not retry until reset.
    Degraded,
}

/// Adapter to the external distributed ledger. Stateless beyond the
/// connection flag; degrades gracefully and never blocks indefinitely.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Probes the ledger once with a bounded timeout. Returns `Connected`
    /// or `Degraded`; a degraded client stays degraded until `reset`.
    async fn connect(&self) -> ConnectionState;

    /// Current state without touching the network.
    fn state(&self) -> ConnectionState;

    /// Submits the hash to the registry contract. Returns the transaction
    /// hash, or `LedgerError::Unavailable` when degraded or timed out.
    async fn anchor(&self, hash: &str) -> Result<String, LedgerError>;

    /// Asks the registry whether the hash is anchored. A successful `false`
    /// means "not found on chain" and is distinct from `Unavailable`.
    async fn check(&self, hash: &str) -> Result<bool, LedgerError>;

    /// Returns the client to `Uninitialized` so the next call may probe
    /// the ledger again.
    fn reset(&self);
}

const STATE_UNINITIALIZED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_CONNECTED: u8 = 2;
const STATE_DEGRADED: u8 = 3;

fn state_from_u8(raw: u8) -> ConnectionState {
    match raw {
        STATE_CONNECTING => ConnectionState::Connecting,
        STATE_CONNECTED => ConnectionState::Connected,
        STATE_DEGRADED => ConnectionState::Degraded,
        _ => ConnectionState::Uninitialized,
    }
}

/// Production ledger client over JSON-RPC (`web3` crate).
pub struct Web3LedgerClient {
    web3: web3::Web3<Http>,
    contract: Contract<Http>,
    /// Account to send anchoring transactions from; when absent, the first
    /// node-managed account is used.
    account: Option<Address>,
    state: AtomicU8,
}

impl Web3LedgerClient {
    /// Builds a client for the registry at `contract_address`. Does not
    /// touch the network; the first `connect`/`anchor`/`check` does.
    pub fn new(
        rpc_url: &str,
        contract_address: &str,
        account: Option<&str>,
    ) -> anyhow::Result<Self> {
        let transport = Http::new(rpc_url)?;
        let web3 = web3::Web3::new(transport);
        let address = Address::from_str(contract_address.trim_start_matches("0x"))
            .map_err(|e| anyhow::anyhow!("invalid contract address: {}", e))?;
        let contract = Contract::from_json(
            web3.eth(),
            address,
            include_bytes!("abi/CertificateRegistry.json"),
        )?;
        let account = account
            .map(|a| Address::from_str(a.trim_start_matches("0x")))
            .transpose()
            .map_err(|e| anyhow::anyhow!("invalid ledger account: {}", e))?;

        Ok(Self {
            web3,
            contract,
            account,
            state: AtomicU8::new(STATE_UNINITIALIZED),
        })
    }

    /// One-way degrade. Benign under races: the worst case is one extra
    /// wasted connection attempt.
    fn degrade(&self, reason: &str) {
        warn!("ledger client degraded: {}", reason);
        self.state.store(STATE_DEGRADED, Ordering::SeqCst);
    }

    /// Resolves the account to transact from, degrading on failure.
    async fn sender(&self) -> Result<Address, LedgerError> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        let accounts = tokio::time::timeout(LEDGER_TIMEOUT, self.web3.eth().accounts())
            .await
            .map_err(|_| {
                self.degrade("timeout fetching accounts");
                LedgerError::Unavailable("timeout fetching accounts".into())
            })?
            .map_err(|e| {
                self.degrade(&format!("account fetch failed: {}", e));
                LedgerError::Unavailable(format!("account fetch failed: {}", e))
            })?;
        accounts.first().copied().ok_or_else(|| {
            self.degrade("no ledger account available");
            LedgerError::Unavailable("no ledger account available".into())
        })
    }

    /// Ensures a connection probe happened; errors when degraded.
    async fn ensure_connected(&self) -> Result<(), LedgerError> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Degraded => {
                Err(LedgerError::Unavailable("ledger client is degraded".into()))
            }
            _ => match self.connect().await {
                ConnectionState::Connected => Ok(()),
                _ => Err(LedgerError::Unavailable("ledger unreachable".into())),
            },
        }
    }
}

#[async_trait]
impl LedgerClient for Web3LedgerClient {
    async fn connect(&self) -> ConnectionState {
        match self.state() {
            ConnectionState::Connected => return ConnectionState::Connected,
            ConnectionState::Degraded => return ConnectionState::Degraded,
            _ => {}
        }

        // Compare-and-set into Connecting; losing the race just means
        // another task is probing, in which case we probe too; extra
        // attempts are harmless and bounded by the timeout.
        let _ = self.state.compare_exchange(
            STATE_UNINITIALIZED,
            STATE_CONNECTING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        match tokio::time::timeout(LEDGER_TIMEOUT, self.web3.eth().block_number()).await {
            Ok(Ok(block)) => {
                info!("connected to ledger, current block {}", block);
                self.state.store(STATE_CONNECTED, Ordering::SeqCst);
                ConnectionState::Connected
            }
            Ok(Err(e)) => {
                self.degrade(&format!("connection probe failed: {}", e));
                ConnectionState::Degraded
            }
            Err(_) => {
                self.degrade("connection probe timed out");
                ConnectionState::Degraded
            }
        }
    }

    fn state(&self) -> ConnectionState {
        state_from_u8(self.state.load(Ordering::SeqCst))
    }

    async fn anchor(&self, hash: &str) -> Result<String, LedgerError> {
        self.ensure_connected().await?;
        let from = self.sender().await?;

        let call = self.contract.call(
            "storeCertificate",
            (hash.to_string(),),
            from,
            Options::with(|options| options.gas = Some(500_000.into())),
        );
        match tokio::time::timeout(LEDGER_TIMEOUT, call).await {
            Ok(Ok(tx_hash)) => Ok(format!("{:#x}", tx_hash)),
            Ok(Err(e)) => {
                self.degrade(&format!("storeCertificate failed: {}", e));
                Err(LedgerError::Unavailable(format!(
                    "storeCertificate failed: {}",
                    e
                )))
            }
            Err(_) => {
                self.degrade("storeCertificate timed out");
                Err(LedgerError::Unavailable("storeCertificate timed out".into()))
            }
        }
    }

    async fn check(&self, hash: &str) -> Result<bool, LedgerError> {
        self.ensure_connected().await?;

        let query = self.contract.query(
            "certificateExists",
            (hash.to_string(),),
            None,
            Options::default(),
            None,
        );
        match tokio::time::timeout(LEDGER_TIMEOUT, query).await {
            Ok(Ok(exists)) => Ok(exists),
            Ok(Err(e)) => {
                self.degrade(&format!("certificateExists failed: {}", e));
                Err(LedgerError::Unavailable(format!(
                    "certificateExists failed: {}",
                    e
                )))
            }
            Err(_) => {
                self.degrade("certificateExists timed out");
                Err(LedgerError::Unavailable(
                    "certificateExists timed out".into(),
                ))
            }
        }
    }

    fn reset(&self) {
        self.state.store(STATE_UNINITIALIZED, Ordering::SeqCst);
    }
}
