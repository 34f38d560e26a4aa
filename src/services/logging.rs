// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Logging setup and redaction of sensitive data.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call (e.g. from tests) leaves the first subscriber in place
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Strip credentials from a URL for logging: "http://elastic:pw@host" -> "http://***@host".
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.username().is_empty() && url.password().is_none() {
                return url.to_string();
            }
            let _ = url.set_password(None);
            let _ = url.set_username("***");
            url.to_string()
        }
        // Unparseable URLs may still embed secrets
        Err(_) => "***".to_string(),
    }
}
