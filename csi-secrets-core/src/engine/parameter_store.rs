use super::record_versions;
use crate::errors::{MountError, StoreError};
use crate::failover;
use crate::store::{ParameterStoreApi, RegionClient, RemoteParameter};
use crate::transform;
use csi_secrets_spec::{SecretDescriptor, SecretValue, VersionCache};
use tracing::debug;

/// Most parameters the store accepts in one read.
pub const BATCH_SIZE: usize = 10;

/// Rate-oriented engine: parameters are read in batches, each batch failing
/// over as a unit.
pub struct ParameterStoreEngine {
    clients: Vec<RegionClient<dyn ParameterStoreApi>>,
}

struct Fetched {
    version: String,
    bytes: Vec<u8>,
}

struct Requested {
    name: String,
    selector: Option<String>,
}

impl Requested {
    fn for_descriptor(descriptor: &SecretDescriptor, use_failover: bool) -> Self {
        let selector = descriptor
            .version_id(use_failover)
            .or_else(|| descriptor.version_label(use_failover))
            .map(|s| format!(":{s}"));
        Self {
            name: descriptor.secret_name(use_failover).to_string(),
            selector,
        }
    }

    fn qualified(&self) -> String {
        format!("{}{}", self.name, self.selector.as_deref().unwrap_or(""))
    }

    fn find<'p>(&self, parameters: &'p [RemoteParameter]) -> Option<&'p RemoteParameter> {
        let selector = self.selector.as_deref();
        let arn_matches = |p: &RemoteParameter| p.arn.as_deref() == Some(self.name.as_str());
        parameters
            .iter()
            .find(|p| p.name == self.name && p.selector.as_deref() == selector)
            .or_else(|| {
                parameters
                    .iter()
                    .find(|p| arn_matches(p) && p.selector.as_deref() == selector)
            })
            .or_else(|| parameters.iter().find(|p| p.name == self.name || arn_matches(p)))
    }
}

impl ParameterStoreEngine {
    pub fn new(clients: Vec<RegionClient<dyn ParameterStoreApi>>) -> Self {
        Self { clients }
    }

    pub async fn fetch_all(
        &self,
        descriptors: &[SecretDescriptor],
        cache: &mut VersionCache,
    ) -> Result<Vec<SecretValue>, MountError> {
        let mut values = Vec::new();
        for (index, batch) in descriptors.chunks(BATCH_SIZE).enumerate() {
            let subject = batch
                .iter()
                .map(SecretDescriptor::object_name)
                .collect::<Vec<_>>()
                .join(", ");
            let (region, fetched) =
                failover::run(&self.clients, &subject, |client| fetch_batch(client, batch)).await?;
            debug!(region = %region, batch = index, size = batch.len(), "parameter batch resolved");

            for (descriptor, fetched) in batch.iter().zip(fetched) {
                let derived = transform::derive_values(fetched.bytes, descriptor)?;
                record_versions(cache, &derived, &fetched.version);
                values.extend(derived);
            }
        }
        Ok(values)
    }
}

async fn fetch_batch(
    client: &RegionClient<dyn ParameterStoreApi>,
    batch: &[SecretDescriptor],
) -> Result<Vec<Fetched>, StoreError> {
    let requested: Vec<Requested> = batch
        .iter()
        .map(|descriptor| Requested::for_descriptor(descriptor, client.is_failover))
        .collect();
    let names: Vec<String> = requested.iter().map(Requested::qualified).collect();

    let response = client
        .api
        .get_parameters(&names)
        .await
        .map_err(|err| err.context("failed fetching parameters"))?;

    if !response.invalid.is_empty() {
        return Err(StoreError::fatal(format!(
            "invalid parameters: {}",
            response.invalid.join(", ")
        )));
    }

    requested
        .iter()
        .map(|request| {
            let parameter = request.find(&response.parameters).ok_or_else(|| {
                StoreError::fatal(format!(
                    "parameter {} missing from response",
                    request.qualified()
                ))
            })?;
            Ok(Fetched {
                version: parameter.version.to_string(),
                bytes: parameter.value.as_bytes().to_vec(),
            })
        })
        .collect()
}
