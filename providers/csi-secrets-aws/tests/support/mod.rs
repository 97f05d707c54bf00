#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use csi_secrets_aws::{RoleAnnotations, SecurityTokenService, TokenRequest, TokenSource};
use csi_secrets_core::{
    AddressPreference, AssumeRole, AuthStrategy, IdentityContext, WorkloadIdentity,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/payments-api";
pub const REGION: &str = "us-west-2";

pub fn identity(strategy: AuthStrategy) -> IdentityContext {
    IdentityContext {
        identity: WorkloadIdentity {
            namespace: "payments".into(),
            service_account: "api".into(),
            pod_name: Some("api-7d9f".into()),
        },
        strategy,
        assume_role: None,
    }
}

pub fn agent_identity(preference: AddressPreference) -> IdentityContext {
    identity(AuthStrategy::Agent { preference })
}

pub fn credentials(key: &str) -> Credentials {
    Credentials::new(key, "secret", Some("session".into()), None, "test")
}

/// Returns a token named after the audience and remembers each request.
#[derive(Default)]
pub struct RecordingTokens {
    fail: bool,
    pub requests: Mutex<Vec<(String, String, Option<String>)>>,
}

impl RecordingTokens {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenSource for RecordingTokens {
    async fn token(&self, request: TokenRequest<'_>) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push((
            request.service_account.to_string(),
            request.audience.to_string(),
            request.pod_name.map(str::to_string),
        ));
        if self.fail {
            return Err(anyhow!("token request forbidden"));
        }
        Ok(format!("token-for-{}", request.audience))
    }
}

/// The same annotations for every service account. They can be changed
/// between resolutions.
#[derive(Default)]
pub struct StaticAnnotations(Mutex<HashMap<String, String>>);

impl StaticAnnotations {
    pub fn with_role(role_arn: &str) -> Self {
        let annotations = Self::default();
        annotations.set_role(role_arn);
        annotations
    }

    pub fn set_role(&self, role_arn: &str) {
        self.0.lock().unwrap().insert(
            "eks.amazonaws.com/role-arn".to_string(),
            role_arn.to_string(),
        );
    }
}

#[async_trait]
impl RoleAnnotations for StaticAnnotations {
    async fn annotations(
        &self,
        _namespace: &str,
        _service_account: &str,
    ) -> anyhow::Result<HashMap<String, String>> {
        Ok(self.0.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StsCall {
    WebIdentity {
        region: String,
        role_arn: String,
        token: String,
    },
    AssumeRole {
        region: String,
        base_key: String,
        role: AssumeRole,
    },
}

/// Records STS calls and hands back credentials tagged by call kind.
#[derive(Default)]
pub struct FakeSts {
    pub deny_web_identity: bool,
    pub calls: Mutex<Vec<StsCall>>,
}

impl FakeSts {
    pub fn calls(&self) -> Vec<StsCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecurityTokenService for FakeSts {
    async fn assume_role_with_web_identity(
        &self,
        region: &str,
        role_arn: &str,
        token: &str,
    ) -> anyhow::Result<Credentials> {
        self.calls.lock().unwrap().push(StsCall::WebIdentity {
            region: region.into(),
            role_arn: role_arn.into(),
            token: token.into(),
        });
        if self.deny_web_identity {
            return Err(anyhow!("AccessDenied: not authorized to perform sts:AssumeRoleWithWebIdentity"));
        }
        Ok(credentials("WEBIDENTITY"))
    }

    async fn assume_role(
        &self,
        region: &str,
        base: Credentials,
        role: &AssumeRole,
    ) -> anyhow::Result<Credentials> {
        self.calls.lock().unwrap().push(StsCall::AssumeRole {
            region: region.into(),
            base_key: base.access_key_id().to_string(),
            role: role.clone(),
        });
        Ok(credentials("ASSUMED"))
    }
}
