//! Core domain types and logic.

pub mod table;
pub mod timestamp;
pub mod dataset;
pub mod sentiment;
pub mod trade;
pub mod aggregate;
pub mod join;
pub mod returns;
pub mod merger;
pub mod export;
pub mod analysis;
pub mod config_validation;
pub mod error;
