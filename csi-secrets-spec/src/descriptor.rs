use crate::arn;
use crate::error::{Error, Result};
use crate::types::{FilePermission, ObjectEncoding, PathTranslation, SecretType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// One entry of the `objects` list exactly as it appears in the request
/// document. Nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptorSpec {
    pub object_name: String,
    pub object_alias: Option<String>,
    pub object_version: Option<String>,
    pub object_version_label: Option<String>,
    pub object_type: Option<String>,
    pub file_permission: Option<String>,
    pub jmes_path: Vec<JmesPathSpec>,
    pub failover_object: Option<FailoverObjectSpec>,
    pub object_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JmesPathSpec {
    pub path: String,
    pub object_alias: String,
    pub file_permission: Option<String>,
    pub object_encoding: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailoverObjectSpec {
    pub object_name: String,
    pub object_version: Option<String>,
    pub object_version_label: Option<String>,
}

/// A validated key extraction entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JmesPathEntry {
    pub path: String,
    pub alias: String,
    pub permission: Option<FilePermission>,
    pub encoding: Option<ObjectEncoding>,
}

/// The secondary-region coordinate of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverObject {
    pub object_name: String,
    pub version_id: Option<String>,
    pub version_label: Option<String>,
}

/// Inputs to descriptor validation that come from the mount request rather
/// than from the document itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'a> {
    pub mount_dir: &'a Path,
    pub path_translation: Option<&'a str>,
    /// Primary region first, optional failover region second.
    pub regions: &'a [String],
    pub default_permission: FilePermission,
}

/// Validated descriptors keyed by store kind, each list in document order.
pub type DescriptorGroups = BTreeMap<SecretType, Vec<SecretDescriptor>>;

/// A requested object after validation, carrying the request-local settings
/// (translation, mount directory, resolved store kind) it was validated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDescriptor {
    object_name: String,
    alias: Option<String>,
    version_id: Option<String>,
    version_label: Option<String>,
    secret_type: SecretType,
    permission: FilePermission,
    translation: PathTranslation,
    mount_dir: PathBuf,
    jmes: Vec<JmesPathEntry>,
    failover: Option<FailoverObject>,
    template: Option<String>,
}

impl SecretDescriptor {
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Output file name: the alias if set, otherwise the object name, with
    /// path translation applied.
    pub fn file_name(&self) -> String {
        let base = self.alias.as_deref().unwrap_or(&self.object_name);
        self.translation.apply(base)
    }

    pub fn mount_dir(&self) -> &Path {
        &self.mount_dir
    }

    pub fn mount_path(&self) -> PathBuf {
        self.mount_dir.join(self.file_name())
    }

    pub fn secret_type(&self) -> SecretType {
        self.secret_type
    }

    pub fn path_translation(&self) -> PathTranslation {
        self.translation
    }

    pub fn file_permission(&self) -> FilePermission {
        self.permission
    }

    pub fn jmes_entries(&self) -> &[JmesPathEntry] {
        &self.jmes
    }

    pub fn failover(&self) -> Option<&FailoverObject> {
        self.failover.as_ref()
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn is_templated(&self) -> bool {
        self.template.is_some()
    }

    /// Remote name to request. The failover region uses the failover
    /// coordinate when one is configured.
    pub fn secret_name(&self, use_failover: bool) -> &str {
        match self.failover.as_ref() {
            Some(failover) if use_failover => &failover.object_name,
            _ => &self.object_name,
        }
    }

    pub fn version_id(&self, use_failover: bool) -> Option<&str> {
        let failover = self
            .failover
            .as_ref()
            .filter(|_| use_failover)
            .and_then(|f| f.version_id.as_deref());
        failover.or(self.version_id.as_deref())
    }

    pub fn version_label(&self, use_failover: bool) -> Option<&str> {
        let failover = self
            .failover
            .as_ref()
            .filter(|_| use_failover)
            .and_then(|f| f.version_label.as_deref());
        failover.or(self.version_label.as_deref())
    }

    /// Descriptor for a value extracted by one of this descriptor's JMES
    /// entries. It has no object name of its own.
    pub fn jmes_child(&self, entry: &JmesPathEntry) -> SecretDescriptor {
        SecretDescriptor {
            object_name: String::new(),
            alias: Some(entry.alias.clone()),
            version_id: None,
            version_label: None,
            secret_type: self.secret_type,
            permission: entry.permission.unwrap_or(self.permission),
            translation: self.translation,
            mount_dir: self.mount_dir.clone(),
            jmes: Vec::new(),
            failover: None,
            template: None,
        }
    }

    /// Descriptor for the synthetic output produced by joining templated
    /// values, modelled on the first contributor.
    pub fn joined(first: &SecretDescriptor, name: &str) -> SecretDescriptor {
        SecretDescriptor {
            object_name: String::new(),
            alias: Some(name.to_string()),
            version_id: None,
            version_label: None,
            secret_type: first.secret_type,
            permission: first.permission,
            translation: first.translation,
            mount_dir: first.mount_dir.clone(),
            jmes: Vec::new(),
            failover: None,
            template: None,
        }
    }
}

/// Validate every entry and group the result by store kind.
///
/// Either every descriptor is valid and all groups are returned, or the
/// first failure is returned and nothing else.
pub fn parse_descriptors(
    specs: Vec<DescriptorSpec>,
    options: &ParseOptions<'_>,
) -> Result<DescriptorGroups> {
    let translation = PathTranslation::parse(options.path_translation)?;
    if options.regions.is_empty() {
        return Err(Error::NoRegions);
    }

    let mut groups = DescriptorGroups::new();
    let mut seen_names: HashSet<(String, Option<String>, Option<String>)> = HashSet::new();
    let mut seen_aliases: HashSet<String> = HashSet::new();

    for spec in specs {
        let descriptor = validate(spec, translation, options)?;

        let key = (
            descriptor.object_name.clone(),
            descriptor.alias.clone(),
            descriptor.version_label.clone(),
        );
        if !seen_names.insert(key) {
            return Err(Error::DuplicateName {
                name: descriptor.object_name.clone(),
                alias: descriptor.alias.clone(),
                label: descriptor.version_label.clone(),
            });
        }

        if let Some(alias) = &descriptor.alias {
            if !seen_aliases.insert(alias.clone()) {
                return Err(Error::DuplicateAlias(alias.clone()));
            }
        }
        for entry in &descriptor.jmes {
            if !seen_aliases.insert(entry.alias.clone()) {
                return Err(Error::DuplicateJmesAlias {
                    alias: entry.alias.clone(),
                    path: entry.path.clone(),
                });
            }
        }

        groups
            .entry(descriptor.secret_type)
            .or_default()
            .push(descriptor);
    }

    Ok(groups)
}

fn validate(
    spec: DescriptorSpec,
    translation: PathTranslation,
    options: &ParseOptions<'_>,
) -> Result<SecretDescriptor> {
    if spec.object_name.is_empty() {
        return Err(Error::MissingObjectName);
    }
    let object_name = spec.object_name;
    let object_type = non_empty(spec.object_type);
    let alias = non_empty(spec.object_alias);
    let version_id = non_empty(spec.object_version);
    let version_label = non_empty(spec.object_version_label);

    let secret_type =
        resolve_object_type(&object_name, object_type.as_deref(), &options.regions[0])?;

    if secret_type == SecretType::SsmParameter && version_id.is_some() && version_label.is_some() {
        return Err(Error::VersionConflict(object_name));
    }

    check_output_name(alias.as_deref().unwrap_or(&object_name), translation)
        .map_err(|_| Error::PathTraversal(object_name.clone()))?;

    let permission = match non_empty(spec.file_permission) {
        Some(value) => FilePermission::parse(&value)?,
        None => options.default_permission,
    };

    let mut jmes = Vec::with_capacity(spec.jmes_path.len());
    for entry in spec.jmes_path {
        jmes.push(validate_jmes_entry(entry, &object_name, translation)?);
    }

    let failover = match spec.failover_object {
        Some(failover) if !failover.object_name.is_empty() => Some(validate_failover(
            failover,
            &object_name,
            alias.as_deref(),
            object_type.as_deref(),
            secret_type,
            version_id.as_deref(),
            options.regions,
        )?),
        _ => None,
    };

    Ok(SecretDescriptor {
        object_name,
        alias,
        version_id,
        version_label,
        secret_type,
        permission,
        translation,
        mount_dir: options.mount_dir.to_path_buf(),
        jmes,
        failover,
        template: non_empty(spec.object_template),
    })
}

fn validate_jmes_entry(
    entry: JmesPathSpec,
    object: &str,
    translation: PathTranslation,
) -> Result<JmesPathEntry> {
    if entry.path.is_empty() {
        return Err(Error::MissingJmesPath {
            object: object.to_string(),
        });
    }
    if entry.object_alias.is_empty() {
        return Err(Error::MissingJmesAlias {
            object: object.to_string(),
        });
    }
    check_output_name(&entry.object_alias, translation)?;
    let permission = non_empty(entry.file_permission)
        .map(|value| FilePermission::parse(&value))
        .transpose()?;
    let encoding = match non_empty(entry.object_encoding) {
        Some(encoding) => Some(ObjectEncoding::parse(&encoding).ok_or_else(|| {
            Error::InvalidEncoding {
                encoding,
                path: entry.path.clone(),
            }
        })?),
        None => None,
    };
    Ok(JmesPathEntry {
        path: entry.path,
        alias: entry.object_alias,
        permission,
        encoding,
    })
}

fn validate_failover(
    spec: FailoverObjectSpec,
    object_name: &str,
    alias: Option<&str>,
    object_type: Option<&str>,
    primary_type: SecretType,
    primary_version: Option<&str>,
    regions: &[String],
) -> Result<FailoverObject> {
    if alias.is_none() {
        return Err(Error::FailoverAliasRequired(object_name.to_string()));
    }
    let Some(region) = regions.get(1) else {
        return Err(Error::FailoverRegionRequired(object_name.to_string()));
    };

    resolve_object_type(&spec.object_name, object_type, region)?;

    let version_id = non_empty(spec.object_version);
    let version_label = non_empty(spec.object_version_label);
    if primary_type == SecretType::SsmParameter && version_id.is_some() && version_label.is_some()
    {
        return Err(Error::VersionConflict(object_name.to_string()));
    }
    if version_id.as_deref() != primary_version {
        return Err(Error::FailoverVersionMismatch(object_name.to_string()));
    }

    Ok(FailoverObject {
        object_name: spec.object_name,
        version_id,
        version_label,
    })
}

/// Cross-check an object name against the explicit type and the region of
/// the slot it is used in, returning the store kind it resolves to.
fn resolve_object_type(name: &str, object_type: Option<&str>, region: &str) -> Result<SecretType> {
    let parsed = if arn::is_arn(name) {
        let parsed = arn::parse(name).ok_or_else(|| Error::InvalidArn(name.to_string()))?;
        if parsed.region != region {
            return Err(Error::RegionMismatch {
                region: region.to_string(),
                object: name.to_string(),
            });
        }
        Some(parsed)
    } else {
        None
    };

    match (object_type, parsed) {
        (None, None) => Err(Error::MissingObjectType(name.to_string())),
        (None, Some(parsed)) => SecretType::from_arn_service(parsed.service)
            .ok_or_else(|| Error::InvalidService(parsed.service.to_string())),
        (Some(object_type), parsed) => {
            let explicit = SecretType::from_object_type(object_type)
                .ok_or_else(|| Error::InvalidObjectType(object_type.to_string()))?;
            match parsed {
                Some(parsed) if SecretType::from_arn_service(parsed.service) != Some(explicit) => {
                    Err(Error::TypeMismatch(name.to_string()))
                }
                _ => Ok(explicit),
            }
        }
    }
}

/// Reject an output name whose translated file name would land outside the
/// mount directory.
pub(crate) fn check_output_name(name: &str, translation: PathTranslation) -> Result<()> {
    if escapes_mount_dir(&translation.apply(name)) {
        return Err(Error::PathTraversal(name.to_string()));
    }
    Ok(())
}

// `Path::join` drops the base for absolute names.
fn escapes_mount_dir(file_name: &str) -> bool {
    file_name.is_empty() || file_name.starts_with('/') || is_traversal(file_name)
}

fn is_traversal(file_name: &str) -> bool {
    file_name == ".."
        || file_name.contains("/../")
        || file_name.starts_with("../")
        || file_name.ends_with("/..")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
