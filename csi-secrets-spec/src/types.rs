use crate::error::{Error, Result};
use std::fmt;

/// The two backing stores a descriptor can target.
///
/// Ordering is significant: the orchestrator fetches groups in this order so
/// mount behaviour is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecretType {
    /// Secrets Manager, fetched one object at a time with conditional re-fetch.
    SecretsManager,
    /// SSM Parameter Store, fetched in batches.
    SsmParameter,
}

impl SecretType {
    /// Resolve an explicit `objectType` value. `ssm` is only accepted as an ARN
    /// service, never as an explicit type.
    pub fn from_object_type(value: &str) -> Option<Self> {
        match value {
            "secretsmanager" => Some(Self::SecretsManager),
            "ssmparameter" => Some(Self::SsmParameter),
            _ => None,
        }
    }

    /// Resolve the service segment of a fully-qualified ARN.
    pub fn from_arn_service(service: &str) -> Option<Self> {
        match service {
            "secretsmanager" => Some(Self::SecretsManager),
            "ssm" | "ssmparameter" => Some(Self::SsmParameter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecretsManager => "secretsmanager",
            Self::SsmParameter => "ssmparameter",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unix permission bits applied to a mounted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilePermission(u32);

impl FilePermission {
    pub const DEFAULT: FilePermission = FilePermission(0o644);

    /// Parse a four digit octal string such as `0640`.
    pub fn parse(value: &str) -> Result<Self> {
        let valid = value.len() == 4 && value.chars().all(|c| matches!(c, '0'..='7'));
        if !valid {
            return Err(Error::InvalidFilePermission(value.to_string()));
        }
        u32::from_str_radix(value, 8)
            .map(FilePermission)
            .map_err(|_| Error::InvalidFilePermission(value.to_string()))
    }

    pub const fn from_mode(mode: u32) -> Self {
        FilePermission(mode & 0o7777)
    }

    pub const fn mode(self) -> u32 {
        self.0
    }
}

impl Default for FilePermission {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FilePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// How path separators in object names map onto mounted file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTranslation {
    /// Replace every `/` with the given character.
    Replace(char),
    /// Keep separators, stripping a single leading `/`.
    Disabled,
}

impl PathTranslation {
    pub const DEFAULT_CHAR: char = '_';

    /// Interpret the `pathTranslation` mount attribute.
    ///
    /// Unset or empty selects `_`, `False` (any case) disables translation and
    /// any other value must be exactly one character.
    pub fn parse(value: Option<&str>) -> Result<Self> {
        let value = match value {
            None | Some("") => return Ok(Self::Replace(Self::DEFAULT_CHAR)),
            Some(value) => value,
        };
        if value.eq_ignore_ascii_case("false") {
            return Ok(Self::Disabled);
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            // Replacing the separator with itself would keep absolute names.
            (Some('/'), None) => Err(Error::InvalidPathTranslation),
            (Some(c), None) => Ok(Self::Replace(c)),
            _ => Err(Error::InvalidPathTranslation),
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Replace(c) => name.replace('/', &c.to_string()),
            Self::Disabled => name.strip_prefix('/').unwrap_or(name).to_string(),
        }
    }
}

impl Default for PathTranslation {
    fn default() -> Self {
        Self::Replace(Self::DEFAULT_CHAR)
    }
}

/// Transport encoding declared on a JMES entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEncoding {
    Base64,
}

impl ObjectEncoding {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }
}
