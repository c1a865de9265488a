//! HTTP access to the artifact repository

pub mod http_client;

pub use http_client::ReqwestRepositoryClient;
