use crate::descriptor::{
    DescriptorGroups, DescriptorSpec, ParseOptions, check_output_name, parse_descriptors,
};
use crate::types::PathTranslation;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParamsDocument {
    #[serde(default)]
    objects: Vec<DescriptorSpec>,
    #[serde(default)]
    join_name: Option<String>,
}

/// The parsed top-level request: validated descriptors grouped by store
/// kind plus the optional join target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalParams {
    groups: DescriptorGroups,
    join_name: Option<String>,
}

impl GlobalParams {
    /// Parse a request document. It may be a bare list of descriptors or a
    /// mapping with `objects` and an optional `joinName`.
    pub fn parse(document: &str, options: &ParseOptions<'_>) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(document).map_err(malformed)?;
        let parsed = match raw {
            Value::Null => ParamsDocument::default(),
            Value::Sequence(_) => ParamsDocument {
                objects: serde_yaml::from_value(raw).map_err(malformed)?,
                join_name: None,
            },
            Value::Mapping(_) => serde_yaml::from_value(raw).map_err(malformed)?,
            _ => {
                return Err(Error::MalformedDocument(
                    "expected a list of objects or a mapping with an objects key".into(),
                ));
            }
        };

        let groups = parse_descriptors(parsed.objects, options)?;
        let join_name = parsed.join_name.filter(|name| !name.is_empty());
        if let Some(name) = &join_name {
            check_output_name(name, PathTranslation::parse(options.path_translation)?)?;
        }
        Ok(Self { groups, join_name })
    }

    pub fn groups(&self) -> &DescriptorGroups {
        &self.groups
    }

    pub fn join_name(&self) -> Option<&str> {
        self.join_name.as_deref()
    }

    pub fn into_parts(self) -> (DescriptorGroups, Option<String>) {
        (self.groups, self.join_name)
    }

    /// Total number of validated descriptors across all store kinds.
    pub fn descriptor_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

fn malformed(err: serde_yaml::Error) -> Error {
    Error::MalformedDocument(err.to_string())
}
