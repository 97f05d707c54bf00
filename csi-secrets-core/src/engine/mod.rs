//! The two fetch strategies, one per store kind.

mod parameter_store;
mod secrets_manager;

pub use parameter_store::{BATCH_SIZE, ParameterStoreEngine};
pub use secrets_manager::{DEFAULT_STAGE, SecretsManagerEngine};

use crate::credentials::RegionStores;
use crate::errors::MountError;
use crate::local::LocalCopy;
use crate::store::RegionClient;
use csi_secrets_spec::{SecretDescriptor, SecretType, SecretValue, VersionCache};
use std::sync::Arc;

/// A fetch engine selected by store kind.
pub enum FetchEngine {
    SecretsManager(SecretsManagerEngine),
    ParameterStore(ParameterStoreEngine),
}

impl FetchEngine {
    /// Build the engine for `kind` over the connected regions. The first
    /// region is the primary, any later one is a failover.
    pub fn for_kind(
        kind: SecretType,
        regions: &[(String, RegionStores)],
        local: Arc<dyn LocalCopy>,
    ) -> Self {
        match kind {
            SecretType::SecretsManager => {
                let clients = regions
                    .iter()
                    .enumerate()
                    .map(|(index, (region, stores))| {
                        RegionClient::new(region.clone(), index > 0, stores.secrets_manager.clone())
                    })
                    .collect();
                Self::SecretsManager(SecretsManagerEngine::new(clients, local))
            }
            SecretType::SsmParameter => {
                let clients = regions
                    .iter()
                    .enumerate()
                    .map(|(index, (region, stores))| {
                        RegionClient::new(region.clone(), index > 0, stores.parameter_store.clone())
                    })
                    .collect();
                Self::ParameterStore(ParameterStoreEngine::new(clients))
            }
        }
    }

    pub fn secret_type(&self) -> SecretType {
        match self {
            Self::SecretsManager(_) => SecretType::SecretsManager,
            Self::ParameterStore(_) => SecretType::SsmParameter,
        }
    }

    /// Fetch every descriptor and its derived outputs, recording the version
    /// of each output in `cache`.
    pub async fn fetch_all(
        &self,
        descriptors: &[SecretDescriptor],
        cache: &mut VersionCache,
    ) -> Result<Vec<SecretValue>, MountError> {
        match self {
            Self::SecretsManager(engine) => engine.fetch_all(descriptors, cache).await,
            Self::ParameterStore(engine) => engine.fetch_all(descriptors, cache).await,
        }
    }
}

fn record_versions(cache: &mut VersionCache, values: &[SecretValue], version: &str) {
    for value in values {
        cache.record(value.descriptor().file_name(), version);
    }
}
