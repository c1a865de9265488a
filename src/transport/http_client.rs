//! reqwest-backed repository client
//!
//! All authenticated calls use HTTP Basic authentication. The upload body is
//! streamed from the open file.

use crate::core::error::TransportError;
use crate::core::traits::{Credentials, RepositoryClient};
use async_trait::async_trait;
use reqwest::{Body, Client, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

const USER_AGENT: &str = concat!("plasma-publish/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestRepositoryClient {
    client: Client,
}

impl ReqwestRepositoryClient {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RepositoryClient for ReqwestRepositoryClient {
    async fn probe(&self, url: &str, timeout: Duration) -> Result<StatusCode, TransportError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        Ok(response.status())
    }

    async fn head(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .head(url)
            .basic_auth(&credentials.username, Some(credentials.password.expose_secret()))
            .send()
            .await?;

        Ok(response.status())
    }

    async fn put_file(
        &self,
        url: &str,
        credentials: &Credentials,
        file: tokio::fs::File,
    ) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .put(url)
            .basic_auth(&credentials.username, Some(credentials.password.expose_secret()))
            .body(Body::from(file))
            .send()
            .await?;

        Ok(response.status())
    }
}
