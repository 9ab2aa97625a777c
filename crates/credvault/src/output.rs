// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of vault data for the terminal.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use colored::Colorize;
use credvault_core::{Credential, CredentialSummary, RotationRecord};
use credvault_rotation::PluginInfo;

/// Value selected by `credvault get --field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Field {
    Secret,
    Public,
    Url,
    /// Every field, one per line.
    All,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Secret => "secret",
            Field::Public => "public",
            Field::Url => "url",
            Field::All => "all",
        };
        f.write_str(name)
    }
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

fn presence(has: bool) -> &'static str {
    if has { "yes" } else { "-" }
}

/// The `list` table.
pub fn credentials_table(rows: &[CredentialSummary]) -> String {
    if rows.is_empty() {
        return "No credentials stored.\n".to_string();
    }
    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let type_width = rows
        .iter()
        .map(|r| r.provider_type.len())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!(
        "{:<name_width$}  {:<type_width$}  {:<8}  {:<6}  {:<6}  {}\n",
        "NAME", "TYPE", "ENV", "SECRET", "PUBLIC", "LAST ROTATED"
    );
    for row in rows {
        let rotated = row
            .last_rotated_at
            .map(format_time)
            .unwrap_or_else(|| "never".to_string());
        out.push_str(&format!(
            "{:<name_width$}  {:<type_width$}  {:<8}  {:<6}  {:<6}  {}\n",
            row.name,
            row.provider_type,
            row.environment.as_deref().unwrap_or("-"),
            presence(row.has_secret),
            presence(row.has_public),
            rotated
        ));
    }
    out
}

/// The `history` listing.
pub fn history_lines(name: &str, records: &[RotationRecord]) -> String {
    if records.is_empty() {
        return format!("No rotations recorded for `{name}`.\n");
    }
    let mut out = String::new();
    for record in records {
        let fields: Vec<String> = record.rotated_fields.iter().map(|f| f.to_string()).collect();
        out.push_str(&format!(
            "{}  {}  by {}  [{}]\n",
            format_time(record.rotated_at),
            record.plugin_name.bold(),
            record.rotated_by,
            fields.join(", ")
        ));
        if record.old_key_id.is_some() || record.new_key_id.is_some() {
            out.push_str(&format!(
                "    key: {} -> {}\n",
                record.old_key_id.as_deref().unwrap_or("-"),
                record.new_key_id.as_deref().unwrap_or("-")
            ));
        }
        if let Some(grace) = record.grace_period {
            out.push_str(&format!("    grace: {}\n", format_duration(grace)));
        }
        for (key, value) in &record.metadata {
            out.push_str(&format!("    {key}: {value}\n"));
        }
    }
    out
}

pub fn history_json(records: &[RotationRecord]) -> serde_json::Value {
    serde_json::Value::Array(
        records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "credential": r.credential_name,
                    "rotated_fields": r.rotated_fields,
                    "old_key_id": r.old_key_id,
                    "new_key_id": r.new_key_id,
                    "plugin": r.plugin_name,
                    "rotated_by": r.rotated_by.to_string(),
                    "rotated_at": r.rotated_at.to_rfc3339(),
                    "grace_period_secs": r.grace_period.map(|d| d.as_secs()),
                    "metadata": r.metadata,
                })
            })
            .collect(),
    )
}

pub fn plugin_lines(plugins: &[PluginInfo]) -> String {
    let mut out = String::new();
    for plugin in plugins {
        let fields: Vec<String> = plugin.rotatable_fields.iter().map(|f| f.to_string()).collect();
        out.push_str(&format!("{}  rotates: {}", plugin.name.bold(), fields.join(", ")));
        if !plugin.required_config.is_empty() {
            out.push_str(&format!("  requires: {}", plugin.required_config.join(", ")));
        }
        out.push('\n');
    }
    out
}

/// Confirmation after `add`. Names the stored fields, never their values.
pub fn stored_message(credential: &Credential) -> String {
    let mut held = Vec::new();
    if credential.secret_value.is_some() {
        held.push("secret");
    }
    if credential.public_value.is_some() {
        held.push("public");
    }
    if credential.endpoint_url.is_some() {
        held.push("url");
    }
    format!(
        "stored `{}` ({}) with {}",
        credential.name,
        credential.id,
        held.join(", ")
    )
}

pub fn success(message: &str) {
    eprintln!("{} {message}", "✓".green());
}
