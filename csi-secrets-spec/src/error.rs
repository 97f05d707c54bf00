use thiserror::Error;

/// Result alias for descriptor parsing and validation.
pub type Result<T> = core::result::Result<T, Error>;

/// Configuration and validation failures detected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to load SecretProviderClass: {0}")]
    MalformedDocument(String),
    #[error("at least one region must be configured")]
    NoRegions,
    #[error("pathTranslation must be either 'False' or a single character string")]
    InvalidPathTranslation,
    #[error("object name must be specified")]
    MissingObjectName,
    #[error("path must be specified for JMES object: {object}")]
    MissingJmesPath { object: String },
    #[error("object alias must be specified for JMES object: {object}")]
    MissingJmesAlias { object: String },
    #[error("invalid file permission: {0}")]
    InvalidFilePermission(String),
    #[error("unsupported encoding type {encoding} for JMES path {path}")]
    InvalidEncoding { encoding: String, path: String },
    #[error("invalid ARN format in object name: {0}")]
    InvalidArn(String),
    #[error("ARN region must match region {region}: {object}")]
    RegionMismatch { region: String, object: String },
    #[error("must use objectType when a full ARN is not specified: {0}")]
    MissingObjectType(String),
    #[error("invalid service in ARN: {0}")]
    InvalidService(String),
    #[error("invalid objectType: {0}")]
    InvalidObjectType(String),
    #[error("objectType does not match ARN: {0}")]
    TypeMismatch(String),
    #[error("ssm parameters can not specify both objectVersion and objectVersionLabel: {0}")]
    VersionConflict(String),
    #[error("path can not contain ../: {0}")]
    PathTraversal(String),
    #[error("object alias must be specified for objects with failover entries: {0}")]
    FailoverAliasRequired(String),
    #[error("failover object allowed only when failover region is defined: {0}")]
    FailoverRegionRequired(String),
    #[error("object versions must match between primary and failover regions: {0}")]
    FailoverVersionMismatch(String),
    #[error("{}", duplicate_name_message(.name, .alias.as_deref(), .label.as_deref()))]
    DuplicateName {
        name: String,
        alias: Option<String>,
        label: Option<String>,
    },
    #[error("found duplicate object alias {0}")]
    DuplicateAlias(String),
    #[error(
        "name already in use for objectAlias: found duplicate object alias {alias} in JMES path entry {path}"
    )]
    DuplicateJmesAlias { alias: String, path: String },
}

fn duplicate_name_message(name: &str, alias: Option<&str>, label: Option<&str>) -> String {
    let alias = match alias {
        Some(alias) => format!("duplicate object alias {alias}"),
        None => "no object alias".to_string(),
    };
    let label = match label {
        Some(label) => format!("duplicate version label {label}"),
        None => "no version label".to_string(),
    };
    format!("found descriptor with duplicate object name {name}, {alias}, and {label}")
}
