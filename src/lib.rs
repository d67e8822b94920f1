//! Core library of the forum backend.
//!
//! Domain entities, Diesel persistence, validated forms and the service layer
//! that keeps denormalized counters, read tracking, the search vocabulary and
//! the vote ledger consistent across thread and post mutations.

pub mod access;
pub mod cache;
pub mod db;
pub mod domain;
pub mod error_conversions;
pub mod forms;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
