use super::{
    AuthError, FEDERATED_AUDIENCE, ROLE_ARN_ANNOTATION, RoleAnnotations, SecurityTokenService,
    TokenRequest, TokenSource, fetch_token,
};
use aws_credential_types::Credentials;
use csi_secrets_core::WorkloadIdentity;
use tracing::debug;

/// Web identity exchange for the role annotated on the service account.
pub async fn resolve(
    tokens: &dyn TokenSource,
    roles: &dyn RoleAnnotations,
    sts: &dyn SecurityTokenService,
    identity: &WorkloadIdentity,
    region: &str,
) -> Result<Credentials, AuthError> {
    let role_arn = role_arn(roles, identity).await?;
    let token = fetch_token(
        tokens,
        TokenRequest {
            namespace: &identity.namespace,
            service_account: &identity.service_account,
            audience: FEDERATED_AUDIENCE,
            pod_name: None,
        },
    )
    .await?;

    debug!(%role_arn, region, "exchanging web identity token");
    sts.assume_role_with_web_identity(region, &role_arn, &token)
        .await
        .map_err(|reason| AuthError::WebIdentity { role_arn, reason })
}

async fn role_arn(
    roles: &dyn RoleAnnotations,
    identity: &WorkloadIdentity,
) -> Result<String, AuthError> {
    let annotations = roles
        .annotations(&identity.namespace, &identity.service_account)
        .await
        .map_err(|reason| AuthError::Annotations {
            namespace: identity.namespace.clone(),
            service_account: identity.service_account.clone(),
            reason,
        })?;

    annotations
        .get(ROLE_ARN_ANNOTATION)
        .map(|arn| arn.trim())
        .filter(|arn| !arn.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AuthError::MissingRoleAnnotation {
            namespace: identity.namespace.clone(),
            service_account: identity.service_account.clone(),
        })
}
