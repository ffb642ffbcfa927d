// src/storage/mod.rs
pub mod anchor_log;
pub mod audit_log;
pub mod record_store;
