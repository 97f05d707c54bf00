use super::{AuthError, SecurityTokenService};
use aws_credential_types::Credentials;
use csi_secrets_core::AssumeRole;
use tracing::debug;

/// Second hop: assume `role` on top of the base credentials.
pub async fn assume(
    sts: &dyn SecurityTokenService,
    region: &str,
    base: Credentials,
    role: &AssumeRole,
) -> Result<Credentials, AuthError> {
    debug!(
        role_arn = %role.role_arn,
        region,
        duration = ?role.duration,
        external_id = role.external_id.is_some(),
        "assuming role"
    );
    sts.assume_role(region, base, role)
        .await
        .map_err(|reason| AuthError::AssumeRole {
            role_arn: role.role_arn.clone(),
            reason,
        })
}
