use crate::store::{ParameterStoreApi, SecretsManagerApi};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The pod-level identity a mount runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub namespace: String,
    pub service_account: String,
    /// Binds minted tokens to one pod when set.
    pub pod_name: Option<String>,
}

/// Which address family to reach the identity agent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressPreference {
    /// IPv4 first, then IPv6.
    #[default]
    Auto,
    Ipv4,
    Ipv6,
}

impl AddressPreference {
    /// Parse the `preferredAddressType` mount attribute. Empty or unknown
    /// values select [`AddressPreference::Auto`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ipv4" => Self::Ipv4,
            "ipv6" => Self::Ipv6,
            _ => Self::Auto,
        }
    }
}

/// How base credentials are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Web-identity exchange using the role annotated on the service account.
    Federated,
    /// Token exchange against the node-local identity agent.
    Agent { preference: AddressPreference },
}

/// Optional second hop into another role once base credentials exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRole {
    pub role_arn: String,
    pub duration: Option<Duration>,
    pub external_id: Option<String>,
}

/// Everything needed to resolve credentials for one mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub identity: WorkloadIdentity,
    pub strategy: AuthStrategy,
    pub assume_role: Option<AssumeRole>,
}

/// Both store clients for one region, sharing one set of credentials.
#[derive(Clone)]
pub struct RegionStores {
    pub secrets_manager: Arc<dyn SecretsManagerApi>,
    pub parameter_store: Arc<dyn ParameterStoreApi>,
}

impl fmt::Debug for RegionStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionStores").finish_non_exhaustive()
    }
}

/// Resolves credentials for a region and hands back store clients using
/// them.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, identity: &IdentityContext, region: &str)
    -> anyhow::Result<RegionStores>;
}
