//! Scripted repository client for orchestration tests

use crate::core::error::TransportError;
use crate::core::traits::{Credentials, RepositoryClient};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy)]
enum Reply {
    Status(StatusCode),
    Unreachable,
}

impl Reply {
    fn into_result(self) -> Result<StatusCode, TransportError> {
        match self {
            Reply::Status(status) => Ok(status),
            Reply::Unreachable => Err(TransportError::new("connection refused")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub username: Option<String>,
    pub body: Option<Vec<u8>>,
}

pub struct FakeRepositoryClient {
    probe: Reply,
    head: Reply,
    put: Reply,
    calls: Mutex<Vec<RecordedCall>>,
    probe_timeout: Mutex<Option<Duration>>,
}

impl FakeRepositoryClient {
    /// Every endpoint answers: probe 200, HEAD 200, PUT 201
    pub fn new() -> Self {
        Self {
            probe: Reply::Status(StatusCode::OK),
            head: Reply::Status(StatusCode::OK),
            put: Reply::Status(StatusCode::CREATED),
            calls: Mutex::new(Vec::new()),
            probe_timeout: Mutex::new(None),
        }
    }

    pub fn probe_status(mut self, status: StatusCode) -> Self {
        self.probe = Reply::Status(status);
        self
    }

    pub fn probe_unreachable(mut self) -> Self {
        self.probe = Reply::Unreachable;
        self
    }

    pub fn head_status(mut self, status: StatusCode) -> Self {
        self.head = Reply::Status(status);
        self
    }

    pub fn head_unreachable(mut self) -> Self {
        self.head = Reply::Unreachable;
        self
    }

    pub fn put_status(mut self, status: StatusCode) -> Self {
        self.put = Reply::Status(status);
        self
    }

    pub fn put_unreachable(mut self) -> Self {
        self.put = Reply::Unreachable;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.method).collect()
    }

    pub fn last_probe_timeout(&self) -> Option<Duration> {
        *self.probe_timeout.lock().unwrap()
    }

    fn record(&self, method: &'static str, url: &str, username: Option<&str>, body: Option<Vec<u8>>) {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            username: username.map(str::to_string),
            body,
        });
    }
}

#[async_trait]
impl RepositoryClient for FakeRepositoryClient {
    async fn probe(&self, url: &str, timeout: Duration) -> Result<StatusCode, TransportError> {
        *self.probe_timeout.lock().unwrap() = Some(timeout);
        self.record("GET", url, None, None);
        self.probe.into_result()
    }

    async fn head(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<StatusCode, TransportError> {
        self.record("HEAD", url, Some(&credentials.username), None);
        self.head.into_result()
    }

    async fn put_file(
        &self,
        url: &str,
        credentials: &Credentials,
        mut file: tokio::fs::File,
    ) -> Result<StatusCode, TransportError> {
        let mut body = Vec::new();
        file.read_to_end(&mut body)
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        self.record("PUT", url, Some(&credentials.username), Some(body));
        self.put.into_result()
    }
}
