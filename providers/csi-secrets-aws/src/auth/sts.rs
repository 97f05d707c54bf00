use anyhow::{Context, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sts::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_types::region::Region;
use csi_secrets_core::AssumeRole;
use std::time::SystemTime;

/// Session name reported to STS for every exchange.
pub const SESSION_NAME: &str = csi_secrets_core::PROVIDER_NAME;

/// The two STS calls credential resolution needs.
#[async_trait]
pub trait SecurityTokenService: Send + Sync {
    /// Exchange a service account token for credentials of `role_arn`.
    async fn assume_role_with_web_identity(
        &self,
        region: &str,
        role_arn: &str,
        token: &str,
    ) -> anyhow::Result<Credentials>;

    /// Assume `role` using `base` credentials.
    async fn assume_role(
        &self,
        region: &str,
        base: Credentials,
        role: &AssumeRole,
    ) -> anyhow::Result<Credentials>;
}

/// STS through the AWS SDK.
#[derive(Debug, Clone, Default)]
pub struct SdkSts {
    endpoint_url: Option<String>,
}

impl SdkSts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send STS calls to `endpoint` instead of the regional default.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    fn client(&self, shared: &aws_types::SdkConfig) -> Client {
        let mut builder = aws_sdk_sts::config::Builder::from(shared);
        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone());
        }
        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl SecurityTokenService for SdkSts {
    async fn assume_role_with_web_identity(
        &self,
        region: &str,
        role_arn: &str,
        token: &str,
    ) -> anyhow::Result<Credentials> {
        // The web identity call is unsigned.
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;
        let output = self
            .client(&shared)
            .assume_role_with_web_identity()
            .role_arn(role_arn)
            .role_session_name(SESSION_NAME)
            .web_identity_token(token)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))?;
        convert(output.credentials(), "WebIdentityToken")
    }

    async fn assume_role(
        &self,
        region: &str,
        base: Credentials,
        role: &AssumeRole,
    ) -> anyhow::Result<Credentials> {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(base)
            .load()
            .await;
        let duration = role
            .duration
            .map(|duration| i32::try_from(duration.as_secs()))
            .transpose()
            .context("assume role duration out of range")?;
        let output = self
            .client(&shared)
            .assume_role()
            .role_arn(&role.role_arn)
            .role_session_name(SESSION_NAME)
            .set_duration_seconds(duration)
            .set_external_id(role.external_id.clone())
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))?;
        convert(output.credentials(), "AssumeRole")
    }
}

fn convert(
    credentials: Option<&aws_sdk_sts::types::Credentials>,
    provider: &'static str,
) -> anyhow::Result<Credentials> {
    let credentials = credentials.ok_or_else(|| anyhow!("STS response carried no credentials"))?;
    let expiry = SystemTime::try_from(*credentials.expiration()).ok();
    Ok(Credentials::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        Some(credentials.session_token().to_string()),
        expiry,
        provider,
    ))
}
