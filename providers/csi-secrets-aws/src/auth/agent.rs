//! Client for the node-local pod identity agent.
//!
//! The agent listens on a link-local address in both families. A service
//! account token goes in the `Authorization` header and the agent answers
//! with temporary credentials for the pod's association.

use super::AuthError;
use aws_credential_types::Credentials;
use aws_smithy_types::DateTime;
use aws_smithy_types::date_time::Format;
use csi_secrets_core::AddressPreference;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_IPV4_ENDPOINT: &str = "http://169.254.170.23/v1/credentials";
pub const DEFAULT_IPV6_ENDPOINT: &str = "http://[fd00:ec2::23]/v1/credentials";

const PROVIDER: &str = "PodIdentityAgent";

/// Agent credential endpoints, one per address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoints {
    ipv4: Url,
    ipv6: Url,
}

impl AgentEndpoints {
    pub fn new(ipv4: &str, ipv6: &str) -> Result<Self, AuthError> {
        Ok(Self {
            ipv4: parse_endpoint(ipv4)?,
            ipv6: parse_endpoint(ipv6)?,
        })
    }

    pub fn defaults() -> Result<Self, AuthError> {
        Self::new(DEFAULT_IPV4_ENDPOINT, DEFAULT_IPV6_ENDPOINT)
    }

    /// Endpoints to try, in order.
    pub fn for_preference(&self, preference: AddressPreference) -> Vec<&Url> {
        match preference {
            AddressPreference::Auto => vec![&self.ipv4, &self.ipv6],
            AddressPreference::Ipv4 => vec![&self.ipv4],
            AddressPreference::Ipv6 => vec![&self.ipv6],
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, AuthError> {
    Url::parse(endpoint).map_err(|err| AuthError::AgentEndpoint {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct AgentCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: Option<String>,
}

impl AgentCredentials {
    fn into_credentials(self) -> Result<Credentials, AuthError> {
        if self.access_key_id.is_empty()
            || self.secret_access_key.is_empty()
            || self.token.is_empty()
        {
            return Err(AuthError::AgentInvalidCredentials);
        }
        let expiry = self
            .expiration
            .as_deref()
            .and_then(|raw| DateTime::from_str(raw, Format::DateTime).ok())
            .and_then(|at| SystemTime::try_from(at).ok());
        Ok(Credentials::new(
            self.access_key_id,
            self.secret_access_key,
            Some(self.token),
            expiry,
            PROVIDER,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    endpoints: AgentEndpoints,
}

impl AgentClient {
    /// Client for the default link-local endpoints, bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::AgentRequest(err.to_string()))?;
        Ok(Self {
            http,
            endpoints: AgentEndpoints::defaults()?,
        })
    }

    pub fn with_endpoints(mut self, endpoints: AgentEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &AgentEndpoints {
        &self.endpoints
    }

    /// Exchange `token` for credentials. Under [`AddressPreference::Auto`] a
    /// transport failure on IPv4 moves on to IPv6. A response from the agent,
    /// good or bad, ends the attempt.
    pub async fn fetch(
        &self,
        token: &str,
        preference: AddressPreference,
    ) -> Result<Credentials, AuthError> {
        let mut failures = Vec::new();
        for endpoint in self.endpoints.for_preference(preference) {
            match self.request(endpoint, token).await {
                Err(AuthError::AgentRequest(reason)) => {
                    warn!(%endpoint, error = %reason, "pod identity agent unreachable");
                    failures.push(format!("{endpoint}: {reason}"));
                }
                other => return other,
            }
        }
        Err(AuthError::AgentRequest(failures.join("; ")))
    }

    async fn request(&self, endpoint: &Url, token: &str) -> Result<Credentials, AuthError> {
        debug!(%endpoint, "requesting credentials from pod identity agent");
        let response = self
            .http
            .get(endpoint.clone())
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(|err| AuthError::AgentRequest(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::AgentStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AuthError::AgentRequest(err.to_string()))?;
        let credentials: AgentCredentials =
            serde_json::from_slice(&body).map_err(|err| AuthError::AgentDecode(err.to_string()))?;
        credentials.into_credentials()
    }
}
