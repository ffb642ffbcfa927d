// src/services/mod.rs
pub mod anchoring;
pub mod api_server;
pub mod verification;

#[cfg(test)]
pub(crate) mod testing;
