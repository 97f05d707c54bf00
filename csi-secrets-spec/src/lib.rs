//! Request model shared by the mount orchestrator and the store providers.
//!
//! A mount request carries a YAML document describing which remote secrets and
//! parameters to fetch. This crate parses that document, validates every entry
//! and groups the resulting [`SecretDescriptor`]s by [`SecretType`] so the
//! fetch engines can batch requests against the same store.

pub mod arn;
pub mod descriptor;
pub mod error;
pub mod params;
pub mod types;
pub mod value;
pub mod version;

pub use descriptor::{
    DescriptorGroups, DescriptorSpec, FailoverObject, FailoverObjectSpec, JmesPathEntry,
    JmesPathSpec, ParseOptions, SecretDescriptor, parse_descriptors,
};
pub use error::{Error, Result};
pub use params::GlobalParams;
pub use types::{FilePermission, ObjectEncoding, PathTranslation, SecretType};
pub use value::SecretValue;
pub use version::{ObjectVersion, VersionCache};
