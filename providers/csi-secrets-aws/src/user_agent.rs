use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::interceptors::context::BeforeTransmitInterceptorContextMut;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::ConfigBag;
use csi_secrets_core::{PROVIDER_NAME, PROVIDER_VERSION};

const USER_AGENT: &str = "user-agent";

/// `name/version`, followed by the add-on version when one is configured.
pub fn marker(addon_version: Option<&str>) -> String {
    let base = format!("{PROVIDER_NAME}/{PROVIDER_VERSION}");
    match addon_version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(addon) => format!("{base} {addon}"),
        None => base,
    }
}

/// Appends the provider marker to the SDK's own user agent.
#[derive(Debug, Clone)]
pub struct UserAgentInterceptor {
    marker: String,
}

impl UserAgentInterceptor {
    pub fn new(addon_version: Option<&str>) -> Self {
        Self {
            marker: marker(addon_version),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    fn append(&self, existing: Option<&str>) -> String {
        match existing {
            Some(existing) if !existing.is_empty() => format!("{existing} {}", self.marker),
            _ => self.marker.clone(),
        }
    }
}

impl Intercept for UserAgentInterceptor {
    fn name(&self) -> &'static str {
        "CsiProviderUserAgent"
    }

    // User agent is not part of the signature, so the SDK's value is final
    // by now.
    fn modify_before_transmit(
        &self,
        context: &mut BeforeTransmitInterceptorContextMut<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let headers = context.request_mut().headers_mut();
        let value = self.append(headers.get(USER_AGENT));
        headers.insert(USER_AGENT, value);
        Ok(())
    }
}
