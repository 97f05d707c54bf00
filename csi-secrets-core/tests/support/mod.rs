#![allow(dead_code)]

pub mod stores;

use csi_secrets_core::{AuthStrategy, IdentityContext, MountRequest, WorkloadIdentity};
use std::path::PathBuf;

pub const PRIMARY: &str = "us-west-2";
pub const SECONDARY: &str = "us-east-1";
pub const MOUNT_DIR: &str = "/var/lib/kubelet/pods/p/volumes/secrets-store";

pub fn identity() -> IdentityContext {
    IdentityContext {
        identity: WorkloadIdentity {
            namespace: "payments".into(),
            service_account: "api".into(),
            pod_name: Some("api-7d9f".into()),
        },
        strategy: AuthStrategy::Federated,
        assume_role: None,
    }
}

pub fn request(objects: &str) -> MountRequest {
    MountRequest {
        objects: objects.to_string(),
        mount_dir: PathBuf::from(MOUNT_DIR),
        region: Some(PRIMARY.into()),
        failover_region: None,
        path_translation: None,
        identity: identity(),
        current_versions: Vec::new(),
        deadline: None,
    }
}

pub fn failover_request(objects: &str) -> MountRequest {
    MountRequest {
        failover_region: Some(SECONDARY.into()),
        ..request(objects)
    }
}
