// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for provider plugins.

use std::time::Duration;

use credvault_core::VaultError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Build a client that authenticates with `token` as a bearer credential.
pub(crate) fn bearer_client(
    credential: &str,
    token: &str,
    timeout: Duration,
    extra_headers: &[(&'static str, &str)],
) -> Result<reqwest::Client, VaultError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        VaultError::rotation_failed(credential, "admin token is not a valid header value")
    })?;
    auth.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth);
    for (name, value) in extra_headers {
        let value = HeaderValue::from_str(value).map_err(|_| {
            VaultError::rotation_failed(credential, format!("invalid `{name}` header value"))
        })?;
        headers.insert(*name, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| VaultError::rotation_failed(credential, e))
}

/// Send `request` and decode a 2xx JSON body.
///
/// Non-2xx responses fail with the status only; bodies from key management
/// endpoints may contain key material and are never echoed.
pub(crate) async fn send_json<T: DeserializeOwned>(
    credential: &str,
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, VaultError> {
    let response = request
        .send()
        .await
        .map_err(|e| VaultError::rotation_failed(credential, e.without_url()))?;
    let status = response.status();
    debug!(provider, status = %status, "provider response received");

    if !status.is_success() {
        return Err(VaultError::rotation_failed(
            credential,
            format!("{provider} API returned {status}"),
        ));
    }
    response.json::<T>().await.map_err(|_| {
        VaultError::rotation_failed(credential, format!("{provider} API returned an unexpected body"))
    })
}

/// Trim one trailing slash so paths can be appended.
pub(crate) fn base_url(value: Option<&str>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_falls_back_and_trims() {
        assert_eq!(base_url(None, "https://api.example.com"), "https://api.example.com");
        assert_eq!(base_url(Some("http://localhost:1/"), "x"), "http://localhost:1");
        assert_eq!(base_url(Some(""), "https://d"), "https://d");
    }

    #[test]
    fn newline_token_is_rejected() {
        let err = bearer_client("svc", "bad\ntoken", Duration::from_secs(1), &[]).unwrap_err();
        assert!(matches!(err, VaultError::RotationFailed { .. }));
        assert!(!err.to_string().contains("bad"));
    }
}
