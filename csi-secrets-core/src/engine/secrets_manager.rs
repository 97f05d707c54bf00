use super::record_versions;
use crate::errors::{MountError, StoreError};
use crate::failover;
use crate::local::LocalCopy;
use crate::store::{RegionClient, SecretRequest, SecretsManagerApi};
use crate::transform;
use csi_secrets_spec::{SecretDescriptor, SecretValue, VersionCache};
use std::sync::Arc;
use tracing::{debug, warn};

/// Label a cached version must carry when the descriptor names none.
pub const DEFAULT_STAGE: &str = "AWSCURRENT";

/// Latency-oriented engine: one secret per call, skipping the value read
/// when the cached version is still the one wanted.
pub struct SecretsManagerEngine {
    clients: Vec<RegionClient<dyn SecretsManagerApi>>,
    local: Arc<dyn LocalCopy>,
}

struct Fetched {
    version: String,
    bytes: Vec<u8>,
}

impl SecretsManagerEngine {
    pub fn new(clients: Vec<RegionClient<dyn SecretsManagerApi>>, local: Arc<dyn LocalCopy>) -> Self {
        Self { clients, local }
    }

    pub async fn fetch_all(
        &self,
        descriptors: &[SecretDescriptor],
        cache: &mut VersionCache,
    ) -> Result<Vec<SecretValue>, MountError> {
        let mut values = Vec::new();
        for descriptor in descriptors {
            let snapshot: &VersionCache = cache;
            let (region, fetched) =
                failover::run(&self.clients, descriptor.object_name(), |client| {
                    self.fetch_from(client, descriptor, snapshot)
                })
                .await?;

            let derived = transform::derive_values(fetched.bytes, descriptor)?;
            record_versions(cache, &derived, &fetched.version);
            debug!(
                region = %region,
                object = %descriptor.object_name(),
                outputs = derived.len(),
                "secret resolved"
            );
            values.extend(derived);
        }
        Ok(values)
    }

    async fn fetch_from(
        &self,
        client: &RegionClient<dyn SecretsManagerApi>,
        descriptor: &SecretDescriptor,
        cache: &VersionCache,
    ) -> Result<Fetched, StoreError> {
        // Rendered output on disk can not be fed back through the template.
        if !descriptor.is_templated() {
            if let Some(version) = self.current_version(client, descriptor, cache).await? {
                let path = descriptor.mount_path();
                match self.local.read(&path).await {
                    Ok(bytes) => {
                        debug!(region = %client.region, file = %descriptor.file_name(), "version is current, reusing local copy");
                        return Ok(Fetched { version, bytes });
                    }
                    Err(err) => warn!(
                        region = %client.region,
                        file = %path.display(),
                        error = %err,
                        "local copy unavailable, fetching live"
                    ),
                }
            }
        }

        let use_failover = client.is_failover;
        let request = SecretRequest {
            secret_id: descriptor.secret_name(use_failover),
            version_id: descriptor.version_id(use_failover),
            version_stage: descriptor.version_label(use_failover),
        };
        let secret = client
            .api
            .get_secret_value(request)
            .await
            .map_err(|err| err.context(format!("failed fetching secret {}", descriptor.object_name())))?;
        Ok(Fetched {
            version: secret.version_id,
            bytes: secret.bytes,
        })
    }

    /// The cached version if it is still the one the descriptor asks for.
    async fn current_version(
        &self,
        client: &RegionClient<dyn SecretsManagerApi>,
        descriptor: &SecretDescriptor,
        cache: &VersionCache,
    ) -> Result<Option<String>, StoreError> {
        let Some(cached) = cache.version_of(&descriptor.file_name()) else {
            return Ok(None);
        };
        let use_failover = client.is_failover;

        if let Some(pinned) = descriptor.version_id(use_failover) {
            return Ok((cached == pinned).then(|| cached.to_string()));
        }

        let stages = client
            .api
            .version_stages(descriptor.secret_name(use_failover))
            .await
            .map_err(|err| err.context(format!("failed to describe secret {}", descriptor.object_name())))?;
        let label = descriptor.version_label(use_failover).unwrap_or(DEFAULT_STAGE);
        let current = stages
            .get(cached)
            .is_some_and(|labels| labels.iter().any(|l| l == label));
        Ok(current.then(|| cached.to_string()))
    }
}
