//! AWS side of the CSI secrets provider.
//!
//! [`AwsConnector`] resolves credentials for a workload identity and hands
//! the core engines Secrets Manager and SSM Parameter Store clients bound to
//! one region.

pub mod auth;
pub mod clients;
pub mod tokens;
pub mod user_agent;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_types::SdkConfig;
use aws_types::region::Region;
use csi_secrets_core::{IdentityContext, ProviderSettings, RegionStores, StoreConnector};
use std::sync::Arc;
use tracing::{debug, instrument};

pub use auth::{
    AgentClient, AgentEndpoints, AuthError, CredentialResolver, RoleAnnotations, SdkSts,
    SecurityTokenService, TokenRequest, TokenSource,
};
pub use clients::{SdkParameterStore, SdkSecretsManager};
pub use tokens::ServiceAccountTokens;
pub use user_agent::UserAgentInterceptor;

/// Builds per-region store clients from resolved credentials.
pub struct AwsConnector {
    resolver: CredentialResolver,
    user_agent: UserAgentInterceptor,
}

impl AwsConnector {
    pub fn new(resolver: CredentialResolver, settings: &ProviderSettings) -> Self {
        Self {
            resolver,
            user_agent: UserAgentInterceptor::new(settings.addon()),
        }
    }

    /// Connector using the SDK for STS and the default agent endpoints.
    pub fn from_settings(
        tokens: Arc<dyn TokenSource>,
        roles: Arc<dyn RoleAnnotations>,
        settings: &ProviderSettings,
    ) -> Result<Self, AuthError> {
        let agent = AgentClient::new(settings.effective_agent_timeout())?;
        let resolver = CredentialResolver::new(tokens, roles, Arc::new(SdkSts::new()), agent);
        Ok(Self::new(resolver, settings))
    }

    pub fn user_agent(&self) -> &UserAgentInterceptor {
        &self.user_agent
    }

    fn secrets_manager(&self, shared: &SdkConfig) -> aws_sdk_secretsmanager::Client {
        let config = aws_sdk_secretsmanager::config::Builder::from(shared)
            .interceptor(self.user_agent.clone())
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }

    fn parameter_store(&self, shared: &SdkConfig) -> aws_sdk_ssm::Client {
        let config = aws_sdk_ssm::config::Builder::from(shared)
            .interceptor(self.user_agent.clone())
            .build();
        aws_sdk_ssm::Client::from_conf(config)
    }
}

#[async_trait]
impl StoreConnector for AwsConnector {
    #[instrument(skip_all, fields(region = %region, namespace = %identity.identity.namespace))]
    async fn connect(
        &self,
        identity: &IdentityContext,
        region: &str,
    ) -> anyhow::Result<RegionStores> {
        let credentials = self
            .resolver
            .resolve(identity, region)
            .await
            .with_context(|| format!("failed to resolve credentials for region {region}"))?;

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;
        debug!(region, "store clients ready");

        Ok(RegionStores {
            secrets_manager: Arc::new(SdkSecretsManager::new(self.secrets_manager(&shared))),
            parameter_store: Arc::new(SdkParameterStore::new(self.parameter_store(&shared))),
        })
    }
}
