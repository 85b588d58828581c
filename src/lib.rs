//! `bcb-etl` library crate.
//!
//! Pulls economic indicator series from the Banco Central do Brasil SGS API,
//! normalizes them, and appends them to a SQLite table without duplicating
//! periods that are already loaded.
//!
//! The binary (`bcb-etl`) is a thin wrapper around this library so the
//! pipeline can be driven from tests with an in-memory source and store.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod store;
