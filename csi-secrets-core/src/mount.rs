use crate::config::ProviderSettings;
use crate::credentials::{IdentityContext, RegionStores, StoreConnector};
use crate::engine::FetchEngine;
use crate::errors::MountError;
use crate::local::{FsLocalCopy, LocalCopy};
use crate::transform;
use csi_secrets_spec::{GlobalParams, ObjectVersion, ParseOptions, SecretValue, VersionCache};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One mount call as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct MountRequest {
    /// The `objects` document.
    pub objects: String,
    pub mount_dir: PathBuf,
    pub region: Option<String>,
    pub failover_region: Option<String>,
    pub path_translation: Option<String>,
    pub identity: IdentityContext,
    /// Versions reported by the previous mount, empty on the first one.
    pub current_versions: Vec<ObjectVersion>,
    pub deadline: Option<Duration>,
}

/// A file to be written by the transport layer.
#[derive(Clone, PartialEq, Eq)]
pub struct MountedFile {
    /// Path relative to the mount directory.
    pub path: String,
    pub mode: u32,
    pub contents: Vec<u8>,
}

impl fmt::Debug for MountedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedFile")
            .field("path", &self.path)
            .field("mode", &format_args!("{:04o}", self.mode))
            .field("contents", &"<REDACTED>")
            .finish()
    }
}

impl From<SecretValue> for MountedFile {
    fn from(value: SecretValue) -> Self {
        let (contents, descriptor) = value.into_parts();
        Self {
            path: descriptor.file_name(),
            mode: descriptor.file_permission().mode(),
            contents,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountResponse {
    pub files: Vec<MountedFile>,
    pub versions: Vec<ObjectVersion>,
}

/// Runs mount requests end to end: parse, connect, fetch, transform.
pub struct MountOrchestrator {
    connector: Arc<dyn StoreConnector>,
    local: Arc<dyn LocalCopy>,
    settings: ProviderSettings,
}

impl MountOrchestrator {
    pub fn new(connector: Arc<dyn StoreConnector>, settings: ProviderSettings) -> Self {
        Self {
            connector,
            local: Arc::new(FsLocalCopy),
            settings,
        }
    }

    /// Replace the source of previously mounted file contents.
    pub fn with_local_copy(mut self, local: Arc<dyn LocalCopy>) -> Self {
        self.local = local;
        self
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Mount every requested object. Either all outputs are returned or a
    /// single error is.
    pub async fn mount(&self, request: MountRequest) -> Result<MountResponse, MountError> {
        match request.deadline.or(self.settings.deadline()) {
            Some(deadline) => tokio::time::timeout(deadline, self.run(request))
                .await
                .map_err(|_| MountError::DeadlineExceeded(deadline))?,
            None => self.run(request).await,
        }
    }

    async fn run(&self, request: MountRequest) -> Result<MountResponse, MountError> {
        let regions = self.regions(&request)?;
        info!(
            namespace = %request.identity.identity.namespace,
            service_account = %request.identity.identity.service_account,
            region = %regions[0],
            "mount started"
        );

        let options = ParseOptions {
            mount_dir: &request.mount_dir,
            path_translation: request.path_translation.as_deref(),
            regions: &regions,
            default_permission: self.settings.permission(),
        };
        let params = GlobalParams::parse(&request.objects, &options)?;
        let (groups, join_name) = params.into_parts();

        let mut cache: VersionCache = request.current_versions.into_iter().collect();
        let mut values = Vec::new();

        if !groups.is_empty() {
            let stores = self.connect(&request.identity, &regions).await?;
            for (kind, descriptors) in &groups {
                let engine = FetchEngine::for_kind(*kind, &stores, self.local.clone());
                debug!(secret_type = %kind, count = descriptors.len(), "fetching group");
                values.extend(engine.fetch_all(descriptors, &mut cache).await?);
            }
        }

        if let Some(join_name) = join_name.as_deref() {
            values = transform::join_templated(values, join_name);
        }

        let files: Vec<MountedFile> = values.into_iter().map(MountedFile::from).collect();
        info!(files = files.len(), "mount complete");
        Ok(MountResponse {
            files,
            versions: cache.into_versions(),
        })
    }

    fn regions(&self, request: &MountRequest) -> Result<Vec<String>, MountError> {
        let primary = request
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or(self.settings.region())
            .ok_or(MountError::MissingRegion)?
            .to_string();

        let mut regions = vec![primary];
        if let Some(failover) = request
            .failover_region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            if failover == regions[0] {
                return Err(MountError::FailoverSameAsPrimary(failover.to_string()));
            }
            regions.push(failover.to_string());
        }
        Ok(regions)
    }

    async fn connect(
        &self,
        identity: &IdentityContext,
        regions: &[String],
    ) -> Result<Vec<(String, RegionStores)>, MountError> {
        let mut stores = Vec::with_capacity(regions.len());
        for region in regions {
            let connected = self
                .connector
                .connect(identity, region)
                .await
                .map_err(|reason| MountError::Identity {
                    region: region.clone(),
                    reason,
                })?;
            stores.push((region.clone(), connected));
        }
        Ok(stores)
    }
}
