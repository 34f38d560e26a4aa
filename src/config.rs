// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::services::elasticsearch::ElasticsearchConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Service settings, read from flags or environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "docsearch", version = env!("DOCSEARCH_VERSION"), about = "REST API over an Elasticsearch index")]
pub struct Settings {
    /// Elasticsearch endpoint (scheme optional)
    #[arg(long, env = "ELASTICSEARCH_HOST", default_value = "http://localhost:9200")]
    pub elasticsearch_host: String,

    #[arg(long, env = "ELASTICSEARCH_USER")]
    pub elasticsearch_user: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_PASSWORD", hide_env_values = true)]
    pub elasticsearch_password: Option<String>,

    /// Set to false to accept self-signed certificates
    #[arg(
        long,
        env = "ELASTICSEARCH_VERIFY_CERTS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub elasticsearch_verify_certs: bool,

    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub app_host: String,

    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    pub app_port: u16,

    /// Index used when a request does not name one
    #[arg(long, env = "DEFAULT_INDEX", default_value = "documents")]
    pub default_index: String,
}

impl Settings {
    pub fn elasticsearch(&self) -> ElasticsearchConfig {
        ElasticsearchConfig {
            host: self.elasticsearch_host.clone(),
            username: self.elasticsearch_user.clone(),
            password: self.elasticsearch_password.clone(),
            verify_certs: self.elasticsearch_verify_certs,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .app_host
            .parse()
            .with_context(|| format!("APP_HOST must be an IP address, got '{}'", self.app_host))?;
        Ok(SocketAddr::new(ip, self.app_port))
    }
}
