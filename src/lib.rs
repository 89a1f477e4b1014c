//! Brokerage Intake API Library
//!
//! Intake service for a trade brokerage site: public forms submit service
//! requests (import, export, logistics, supplier sourcing) which are
//! classified, normalized, validated and stored as documents for the admin
//! console.
//!
//! # Modules
//!
//! - `api`: HTTP layer (handlers and routes).
//! - `core`: Request pipeline stages, models and errors.
//! - `data`: Storage and database access.
//! - `assembler`: Builds the stored entity from a validated submission.
//! - `classifier`: Request kind classification.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and schema bootstrap.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `intake`: The submission pipeline.
//! - `models`: Core data models.
//! - `normalizer`: Field alias normalization.
//! - `routes`: Router assembly.
//! - `schema`: Schema registry and validator.
//! - `storage`: Catalog and request store traits with Postgres implementations.

pub mod api;
pub mod core;
pub mod data;

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod normalizer;
pub mod routes;
pub mod schema;
pub mod storage;
