// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rotate`, `history` and `plugins`.

use std::sync::Arc;
use std::time::Duration;

use credvault_config::CredvaultConfig;
use credvault_core::{RotatedBy, RotationContext, VaultError};
use credvault_rotation::{Rotator, builtin_registry};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::open_vault;
use crate::output;

pub async fn rotate(
    config: &CredvaultConfig,
    name: &str,
    timeout: Option<u64>,
    actor: &str,
) -> Result<(), VaultError> {
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.rotation.timeout());
    let actor: RotatedBy = actor.parse().unwrap_or_else(|never| match never {});

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling rotation");
            on_signal.cancel();
        }
    });

    let rotator = Rotator::from_config(Arc::new(builtin_registry()), &config.rotation);
    let ctx = RotationContext::new(timeout, actor).with_cancel(cancel);

    let vault = open_vault(config).await?;
    let result = rotator.rotate(&vault, name, &ctx).await;
    watcher.abort();
    vault.close().await?;
    let report = result?;

    let fields: Vec<String> = report
        .record
        .rotated_fields
        .iter()
        .map(|f| f.to_string())
        .collect();
    output::success(&format!(
        "rotated {} of `{name}` via {}",
        fields.join(", "),
        report.record.plugin_name
    ));
    if let Some(key_id) = &report.record.new_key_id {
        eprintln!("  new key id: {key_id}");
    }
    if let Some(grace) = report.grace_period {
        eprintln!(
            "  the previous value stays valid for {}",
            output::format_duration(grace)
        );
    }
    Ok(())
}

pub async fn history(
    config: &CredvaultConfig,
    name: &str,
    limit: Option<u32>,
    json: bool,
) -> Result<(), VaultError> {
    let limit = limit.unwrap_or(config.rotation.history_limit);

    let vault = open_vault(config).await?;
    let records = vault.history(name, limit).await;
    vault.close().await?;
    let records = records?;

    if json {
        let text = serde_json::to_string_pretty(&output::history_json(&records))
            .map_err(|e| VaultError::Internal(format!("failed to encode history: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", output::history_lines(name, &records));
    }
    Ok(())
}

pub fn plugins() {
    print!("{}", output::plugin_lines(&builtin_registry().list()));
}
