//! Fetch engines, value transforms and the mount orchestrator.
//!
//! The core never talks to a cloud SDK directly. Remote stores sit behind
//! [`store::SecretsManagerApi`] and [`store::ParameterStoreApi`], and the
//! per-region instances of both come from a [`credentials::StoreConnector`].

pub mod config;
pub mod credentials;
pub mod engine;
pub mod errors;
pub mod failover;
pub mod local;
pub mod mount;
pub mod store;
pub mod telemetry;
pub mod transform;

pub use config::ProviderSettings;
pub use credentials::{
    AddressPreference, AssumeRole, AuthStrategy, IdentityContext, RegionStores, StoreConnector,
    WorkloadIdentity,
};
pub use engine::FetchEngine;
pub use errors::{ErrorClass, FetchError, MountError, StoreError, TransformError};
pub use local::{FsLocalCopy, LocalCopy};
pub use mount::{MountOrchestrator, MountRequest, MountResponse, MountedFile};
pub use store::{
    ParameterBatch, ParameterStoreApi, RegionClient, RemoteParameter, RemoteSecret,
    SecretRequest, SecretsManagerApi,
};

/// Name reported to the driver and used in the outbound user-agent marker.
pub const PROVIDER_NAME: &str = "secrets-store-csi-driver-provider-aws";

/// Version reported to the driver alongside [`PROVIDER_NAME`].
pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");
