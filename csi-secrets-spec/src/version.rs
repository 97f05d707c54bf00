use std::collections::HashMap;

/// Last fetched version of one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    /// Output file name, also the cache key.
    pub id: String,
    /// Remote version identifier.
    pub version: String,
}

/// Map of output file name to last fetched version, threaded through a
/// single mount cycle. The transport layer persists it between mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCache {
    entries: HashMap<String, ObjectVersion>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&ObjectVersion> {
        self.entries.get(file_name)
    }

    pub fn version_of(&self, file_name: &str) -> Option<&str> {
        self.get(file_name).map(|entry| entry.version.as_str())
    }

    /// Record the version fetched for `file_name`, replacing any earlier entry.
    pub fn record(&mut self, file_name: impl Into<String>, version: impl Into<String>) {
        let id = file_name.into();
        self.entries.insert(
            id.clone(),
            ObjectVersion {
                id,
                version: version.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectVersion> {
        self.entries.values()
    }

    /// Drain the cache into a list sorted by file name.
    pub fn into_versions(self) -> Vec<ObjectVersion> {
        let mut versions: Vec<_> = self.entries.into_values().collect();
        versions.sort_by(|a, b| a.id.cmp(&b.id));
        versions
    }
}

impl FromIterator<ObjectVersion> for VersionCache {
    fn from_iter<I: IntoIterator<Item = ObjectVersion>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
        }
    }
}
