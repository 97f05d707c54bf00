//! Tokens handed over by the CSI driver in the mount attributes.

use crate::auth::{AuthError, TokenRequest, TokenSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Mount attribute carrying the tokens requested by the CSIDriver object.
pub const TOKENS_ATTRIBUTE: &str = "csi.storage.k8s.io/serviceAccount.tokens";

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    token: String,
    #[serde(default)]
    expiration_timestamp: Option<String>,
}

/// Pre-minted service account tokens keyed by audience.
#[derive(Clone, Default)]
pub struct ServiceAccountTokens {
    tokens: HashMap<String, IssuedToken>,
}

impl ServiceAccountTokens {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        if raw.trim().is_empty() {
            return Err(AuthError::TokensMissing);
        }
        let tokens: HashMap<String, IssuedToken> =
            serde_json::from_str(raw).map_err(|err| AuthError::TokensMalformed(err.to_string()))?;
        Ok(Self { tokens })
    }

    pub fn token_for(&self, audience: &str) -> Result<&str, AuthError> {
        self.tokens
            .get(audience)
            .map(|issued| issued.token.as_str())
            .ok_or_else(|| AuthError::AudienceMissing(audience.to_string()))
    }

    pub fn expires_at(&self, audience: &str) -> Option<&str> {
        self.tokens
            .get(audience)
            .and_then(|issued| issued.expiration_timestamp.as_deref())
    }

    pub fn audiences(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut audiences: Vec<&str> = self.audiences().collect();
        audiences.sort_unstable();
        f.debug_struct("ServiceAccountTokens")
            .field("audiences", &audiences)
            .finish()
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn token(&self, request: TokenRequest<'_>) -> anyhow::Result<String> {
        Ok(self.token_for(request.audience)?.to_string())
    }
}
