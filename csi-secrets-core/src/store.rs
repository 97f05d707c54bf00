use crate::errors::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Coordinates for one Secrets Manager read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretRequest<'a> {
    pub secret_id: &'a str,
    pub version_id: Option<&'a str>,
    pub version_stage: Option<&'a str>,
}

/// A secret payload and the version it was read at.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSecret {
    pub version_id: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for RemoteSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSecret")
            .field("version_id", &self.version_id)
            .field("bytes", &"<REDACTED>")
            .finish()
    }
}

/// The low-latency store: cheap metadata reads, one value per call.
#[async_trait]
pub trait SecretsManagerApi: Send + Sync {
    /// Version id to staging labels for the named secret.
    async fn version_stages(&self, secret_id: &str)
    -> Result<HashMap<String, Vec<String>>, StoreError>;

    async fn get_secret_value(&self, request: SecretRequest<'_>)
    -> Result<RemoteSecret, StoreError>;
}

/// One parameter returned by a batched read.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteParameter {
    pub name: String,
    pub arn: Option<String>,
    /// The `:version` or `:label` suffix echoed back when one was requested.
    pub selector: Option<String>,
    pub value: String,
    pub version: i64,
}

impl fmt::Debug for RemoteParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteParameter")
            .field("name", &self.name)
            .field("arn", &self.arn)
            .field("selector", &self.selector)
            .field("value", &"<REDACTED>")
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBatch {
    pub parameters: Vec<RemoteParameter>,
    /// Requested names the store did not recognise.
    pub invalid: Vec<String>,
}

/// The rate-limited store that supports multi-key reads.
#[async_trait]
pub trait ParameterStoreApi: Send + Sync {
    /// Read several parameters, decrypted, in one call. Names may carry a
    /// `:version` or `:label` suffix.
    async fn get_parameters(&self, names: &[String]) -> Result<ParameterBatch, StoreError>;
}

/// A store client bound to one region.
pub struct RegionClient<A: ?Sized> {
    pub region: String,
    pub is_failover: bool,
    pub api: Arc<A>,
}

impl<A: ?Sized> RegionClient<A> {
    pub fn new(region: impl Into<String>, is_failover: bool, api: Arc<A>) -> Self {
        Self {
            region: region.into(),
            is_failover,
            api,
        }
    }
}

impl<A: ?Sized> Clone for RegionClient<A> {
    fn clone(&self) -> Self {
        Self {
            region: self.region.clone(),
            is_failover: self.is_failover,
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: ?Sized> fmt::Debug for RegionClient<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionClient")
            .field("region", &self.region)
            .field("is_failover", &self.is_failover)
            .finish_non_exhaustive()
    }
}
