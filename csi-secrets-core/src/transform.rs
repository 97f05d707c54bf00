//! Post-fetch transforms: JMES extraction, base64 decoding, templating and
//! joining.

use crate::errors::TransformError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use csi_secrets_spec::{JmesPathEntry, ObjectEncoding, SecretDescriptor, SecretValue};
use handlebars::Handlebars;
use jmespath::{Rcvar, Variable};
use tracing::warn;

/// Turn one fetched payload into every output it produces: the primary value
/// (rendered if the descriptor carries a template) followed by one value per
/// JMES entry.
pub fn derive_values(
    raw: Vec<u8>,
    descriptor: &SecretDescriptor,
) -> Result<Vec<SecretValue>, TransformError> {
    let entries = descriptor.jmes_entries();
    let mut values = Vec::with_capacity(1 + entries.len());

    let extracted = if entries.is_empty() {
        Vec::new()
    } else {
        extract(&raw, descriptor)?
    };

    let primary = match descriptor.template() {
        Some(template) => render(template, &raw, descriptor.object_name())?,
        None => raw,
    };
    values.push(SecretValue::new(primary, descriptor.clone()));
    values.extend(extracted);
    Ok(values)
}

fn extract(raw: &[u8], descriptor: &SecretDescriptor) -> Result<Vec<SecretValue>, TransformError> {
    let secret = descriptor.object_name();
    let invalid_json = || TransformError::InvalidJson {
        secret: secret.to_string(),
    };
    let text = std::str::from_utf8(raw).map_err(|_| invalid_json())?;
    let data = Rcvar::new(Variable::from_json(text).map_err(|_| invalid_json())?);

    descriptor
        .jmes_entries()
        .iter()
        .map(|entry| {
            let bytes = search(&data, entry)?;
            let bytes = decode(bytes, entry, secret)?;
            Ok(SecretValue::new(bytes, descriptor.jmes_child(entry)))
        })
        .collect()
}

fn search(data: &Rcvar, entry: &JmesPathEntry) -> Result<Vec<u8>, TransformError> {
    let expression = jmespath::compile(&entry.path).map_err(|_| TransformError::InvalidPath {
        path: entry.path.clone(),
    })?;
    let found = expression
        .search(data.clone())
        .map_err(|_| TransformError::InvalidPath {
            path: entry.path.clone(),
        })?;
    if found.is_null() {
        return Err(TransformError::PathNotFound {
            path: entry.path.clone(),
            alias: entry.alias.clone(),
        });
    }
    match found.as_string() {
        Some(value) => Ok(value.as_bytes().to_vec()),
        None => Err(TransformError::NonStringResult {
            path: entry.path.clone(),
        }),
    }
}

fn decode(bytes: Vec<u8>, entry: &JmesPathEntry, secret: &str) -> Result<Vec<u8>, TransformError> {
    match entry.encoding {
        None => Ok(bytes),
        Some(ObjectEncoding::Base64) => {
            STANDARD
                .decode(&bytes)
                .map_err(|err| TransformError::Decode {
                    path: entry.path.clone(),
                    secret: secret.to_string(),
                    reason: err.to_string(),
                })
        }
    }
}

fn render(template: &str, raw: &[u8], secret: &str) -> Result<Vec<u8>, TransformError> {
    let data: serde_json::Value =
        serde_json::from_slice(raw).map_err(|_| TransformError::TemplateJson {
            secret: secret.to_string(),
        })?;
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .render_template(template, &data)
        .map(String::into_bytes)
        .map_err(|err| TransformError::Template {
            secret: secret.to_string(),
            reason: err.to_string(),
        })
}

/// Concatenate every templated value, in order, into one output named
/// `join_name` and drop the individual templated outputs.
pub fn join_templated(values: Vec<SecretValue>, join_name: &str) -> Vec<SecretValue> {
    let (templated, mut rest): (Vec<_>, Vec<_>) = values
        .into_iter()
        .partition(|value| value.descriptor().is_templated());

    let Some(first) = templated.first() else {
        warn!(join = %join_name, "joinName set but no templated objects to join");
        return rest;
    };

    let descriptor = SecretDescriptor::joined(first.descriptor(), join_name);
    let bytes: Vec<u8> = templated
        .iter()
        .flat_map(|value| value.bytes().iter().copied())
        .collect();
    rest.push(SecretValue::new(bytes, descriptor));
    rest
}
