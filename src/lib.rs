//! Bulk question ingestion for the edu-game admin platform.
//!
//! Spreadsheets and hand-authored batches are normalized into one question
//! model, validated per type, saved through the REST API, and every new
//! question is then attached to every existing game.

pub mod api;
pub mod config;
pub mod ingest;
pub mod logging;
