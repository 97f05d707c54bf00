//! Turning a workload identity into AWS credentials.

pub mod agent;
pub mod assume_role;
pub mod federated;
pub mod sts;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use csi_secrets_core::{AuthStrategy, IdentityContext};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use agent::{AgentClient, AgentEndpoints};
pub use sts::{SdkSts, SecurityTokenService};

/// Audience for tokens exchanged through STS web identity.
pub const FEDERATED_AUDIENCE: &str = "sts.amazonaws.com";
/// Audience for tokens exchanged with the pod identity agent.
pub const AGENT_AUDIENCE: &str = "pods.eks.amazonaws.com";
/// Service account annotation naming the role to assume.
pub const ROLE_ARN_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to fetch token for audience {audience}: {reason:#}")]
    Token {
        audience: String,
        reason: anyhow::Error,
    },
    #[error("failed to read service account {service_account} (namespace: {namespace}): {reason:#}")]
    Annotations {
        namespace: String,
        service_account: String,
        reason: anyhow::Error,
    },
    #[error(
        "an IAM role must be associated with service account {service_account} (namespace: {namespace})"
    )]
    MissingRoleAnnotation {
        namespace: String,
        service_account: String,
    },
    #[error("web identity exchange for role {role_arn} failed: {reason:#}")]
    WebIdentity {
        role_arn: String,
        reason: anyhow::Error,
    },
    #[error("failed to assume role {role_arn}: {reason:#}")]
    AssumeRole {
        role_arn: String,
        reason: anyhow::Error,
    },
    #[error("invalid pod identity agent endpoint {endpoint}: {reason}")]
    AgentEndpoint { endpoint: String, reason: String },
    #[error("HTTP request to pod identity agent failed: {0}")]
    AgentRequest(String),
    #[error("pod identity agent returned error - status: {status}, body: {body}")]
    AgentStatus { status: u16, body: String },
    #[error("failed to decode credentials from pod identity agent: {0}")]
    AgentDecode(String),
    #[error("received invalid credentials from pod identity agent")]
    AgentInvalidCredentials,
    #[error("serviceAccount.tokens not provided - ensure tokenRequests is configured in CSIDriver")]
    TokensMissing,
    #[error("failed to parse serviceAccount.tokens: {0}")]
    TokensMalformed(String),
    #[error(
        "token for audience {0:?} not found - ensure tokenRequests includes this audience in CSIDriver"
    )]
    AudienceMissing(String),
}

/// A request for a service account token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRequest<'a> {
    pub namespace: &'a str,
    pub service_account: &'a str,
    pub audience: &'a str,
    /// Bind the token to this pod.
    pub pod_name: Option<&'a str>,
}

/// Mints service account tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self, request: TokenRequest<'_>) -> anyhow::Result<String>;
}

/// Reads the annotations of a service account.
#[async_trait]
pub trait RoleAnnotations: Send + Sync {
    async fn annotations(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> anyhow::Result<HashMap<String, String>>;
}

/// Resolves credentials with the strategy named by the mount request, then
/// applies the optional role assumption.
pub struct CredentialResolver {
    tokens: Arc<dyn TokenSource>,
    roles: Arc<dyn RoleAnnotations>,
    sts: Arc<dyn SecurityTokenService>,
    agent: AgentClient,
}

impl CredentialResolver {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        roles: Arc<dyn RoleAnnotations>,
        sts: Arc<dyn SecurityTokenService>,
        agent: AgentClient,
    ) -> Self {
        Self {
            tokens,
            roles,
            sts,
            agent,
        }
    }

    pub async fn resolve(
        &self,
        context: &IdentityContext,
        region: &str,
    ) -> Result<Credentials, AuthError> {
        let identity = &context.identity;
        let base = match context.strategy {
            AuthStrategy::Federated => {
                info!(
                    namespace = %identity.namespace,
                    service_account = %identity.service_account,
                    "using IAM roles for service accounts"
                );
                federated::resolve(
                    self.tokens.as_ref(),
                    self.roles.as_ref(),
                    self.sts.as_ref(),
                    identity,
                    region,
                )
                .await?
            }
            AuthStrategy::Agent { preference } => {
                info!(
                    namespace = %identity.namespace,
                    service_account = %identity.service_account,
                    "using pod identity"
                );
                let token = fetch_token(
                    self.tokens.as_ref(),
                    TokenRequest {
                        namespace: &identity.namespace,
                        service_account: &identity.service_account,
                        audience: AGENT_AUDIENCE,
                        pod_name: identity.pod_name.as_deref(),
                    },
                )
                .await?;
                self.agent.fetch(&token, preference).await?
            }
        };

        match &context.assume_role {
            Some(role) => assume_role::assume(self.sts.as_ref(), region, base, role).await,
            None => Ok(base),
        }
    }
}

pub(crate) async fn fetch_token(
    tokens: &dyn TokenSource,
    request: TokenRequest<'_>,
) -> Result<String, AuthError> {
    tokens
        .token(request)
        .await
        .map_err(|reason| AuthError::Token {
            audience: request.audience.to_string(),
            reason,
        })
}
