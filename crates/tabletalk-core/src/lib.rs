//! Core types, configuration, and errors shared across the Tabletalk system.

pub mod config;
pub mod error;
pub mod types;
