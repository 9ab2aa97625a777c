// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries. Every function takes `&Database` and runs through its
//! single connection.

pub mod config;
pub mod credentials;
pub mod rotations;
