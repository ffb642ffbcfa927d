// src/utils/mod.rs
pub mod commitment;
