use anyhow::anyhow;
use async_trait::async_trait;
use csi_secrets_core::{
    IdentityContext, LocalCopy, ParameterBatch, ParameterStoreApi, RegionStores, RemoteParameter,
    RemoteSecret, SecretRequest, SecretsManagerApi, StoreConnector, StoreError,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct StoredSecret {
    version_id: String,
    bytes: Vec<u8>,
    stages: HashMap<String, Vec<String>>,
}

/// In-memory secret store that counts every call.
#[derive(Default)]
pub struct FakeSecretsManager {
    secrets: Mutex<HashMap<String, StoredSecret>>,
    failure: Mutex<Option<StoreError>>,
    delay: Mutex<Option<Duration>>,
    describes: AtomicUsize,
    gets: AtomicUsize,
}

impl FakeSecretsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store `value` at `version`, labelled `AWSCURRENT`.
    pub fn put(&self, id: &str, version: &str, value: &str) {
        self.put_with_stages(id, version, value, &[(version, "AWSCURRENT")]);
    }

    /// Store `value` at `version` with explicit `(version, label)` pairs.
    pub fn put_with_stages(&self, id: &str, version: &str, value: &str, stages: &[(&str, &str)]) {
        let mut labels: HashMap<String, Vec<String>> = HashMap::new();
        for (v, label) in stages {
            labels.entry(v.to_string()).or_default().push(label.to_string());
        }
        let stages = labels;
        self.secrets.lock().unwrap().insert(
            id.to_string(),
            StoredSecret {
                version_id: version.to_string(),
                bytes: value.as_bytes().to_vec(),
                stages,
            },
        );
    }

    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn describe_calls(&self) -> usize {
        self.describes.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<StoreError> {
        self.failure.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::from_status(
            Some(400),
            format!("ResourceNotFoundException: Secrets Manager can't find the specified secret {id}"),
        )
    }
}

#[async_trait]
impl SecretsManagerApi for FakeSecretsManager {
    async fn version_stages(
        &self,
        secret_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, StoreError> {
        self.describes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(error) = self.failure() {
            return Err(error);
        }
        let secrets = self.secrets.lock().unwrap();
        let secret = secrets.get(secret_id).ok_or_else(|| Self::not_found(secret_id))?;
        Ok(secret.stages.clone())
    }

    async fn get_secret_value(
        &self,
        request: SecretRequest<'_>,
    ) -> Result<RemoteSecret, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(error) = self.failure() {
            return Err(error);
        }
        let secrets = self.secrets.lock().unwrap();
        let secret = secrets
            .get(request.secret_id)
            .ok_or_else(|| Self::not_found(request.secret_id))?;
        if let Some(version) = request.version_id {
            if version != secret.version_id {
                return Err(Self::not_found(request.secret_id));
            }
        }
        Ok(RemoteSecret {
            version_id: secret.version_id.clone(),
            bytes: secret.bytes.clone(),
        })
    }
}

/// In-memory parameter store recording every batch it receives.
#[derive(Default)]
pub struct FakeParameterStore {
    parameters: Mutex<HashMap<String, (String, i64)>>,
    failure: Mutex<Option<StoreError>>,
    omitted: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeParameterStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, name: &str, value: &str, version: i64) {
        self.parameters
            .lock()
            .unwrap()
            .insert(name.to_string(), (value.to_string(), version));
    }

    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Leave `name` out of responses without reporting it as invalid.
    pub fn omit(&self, name: &str) {
        self.omitted.lock().unwrap().push(name.to_string());
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParameterStoreApi for FakeParameterStore {
    async fn get_parameters(&self, names: &[String]) -> Result<ParameterBatch, StoreError> {
        self.batches.lock().unwrap().push(names.to_vec());
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        let parameters = self.parameters.lock().unwrap();
        let omitted = self.omitted.lock().unwrap();
        let mut batch = ParameterBatch::default();
        for requested in names {
            if omitted.contains(requested) {
                continue;
            }
            let (name, selector) = match requested.rsplit_once(':') {
                Some((name, selector)) if !requested.starts_with("arn:") => {
                    (name, Some(format!(":{selector}")))
                }
                _ => (requested.as_str(), None),
            };
            match parameters.get(name) {
                Some((value, version)) => batch.parameters.push(RemoteParameter {
                    name: name.to_string(),
                    arn: Some(format!("arn:aws:ssm:us-west-2:123456789012:parameter{name}")),
                    selector,
                    value: value.clone(),
                    version: *version,
                }),
                None => batch.invalid.push(requested.clone()),
            }
        }
        Ok(batch)
    }
}

/// Hands out pre-built stores per region.
#[derive(Default)]
pub struct FakeConnector {
    regions: HashMap<String, RegionStores>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(
        mut self,
        region: &str,
        secrets_manager: Arc<FakeSecretsManager>,
        parameter_store: Arc<FakeParameterStore>,
    ) -> Self {
        self.regions.insert(
            region.to_string(),
            RegionStores {
                secrets_manager,
                parameter_store,
            },
        );
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for FakeConnector {
    async fn connect(
        &self,
        _identity: &IdentityContext,
        region: &str,
    ) -> anyhow::Result<RegionStores> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.regions
            .get(region)
            .cloned()
            .ok_or_else(|| anyhow!("no role annotation for region {region}"))
    }
}

/// Previously mounted files kept in memory.
#[derive(Default)]
pub struct MemoryLocalCopy {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryLocalCopy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn write(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.as_bytes().to_vec());
    }
}

#[async_trait]
impl LocalCopy for MemoryLocalCopy {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not mounted"))
    }
}
