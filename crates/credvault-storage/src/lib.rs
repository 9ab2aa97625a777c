// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLCipher persistence layer for credvault.
//!
//! An encrypted SQLite file behind a single `tokio-rusqlite` connection,
//! a versioned migration runner, and typed queries for credentials, the
//! rotation audit trail and the config table.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use migrations::MigrationReport;
pub use models::*;
