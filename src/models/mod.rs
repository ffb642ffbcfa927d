// src/models/mod.rs
pub mod anchor;
pub mod certificate;
