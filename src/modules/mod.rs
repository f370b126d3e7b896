//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for photo storage and the spreadsheet mirror.

pub mod sheets;
pub mod storage;
