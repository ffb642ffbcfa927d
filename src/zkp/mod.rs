// src/zkp/mod.rs
pub mod binding;
