//! Store traits implemented over the AWS SDK clients.

use async_trait::async_trait;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use csi_secrets_core::{
    ParameterBatch, ParameterStoreApi, RemoteParameter, RemoteSecret, SecretRequest,
    SecretsManagerApi, StoreError,
};
use std::collections::HashMap;
use std::error::Error as StdError;

/// Classify an SDK failure by the HTTP status of the raw response. No
/// response at all (timeouts, dispatch failures) counts as transient.
pub(crate) fn classify<E>(operation: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: StdError + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    StoreError::from_status(status, format!("{operation}: {}", DisplayErrorContext(&err)))
}

#[derive(Debug, Clone)]
pub struct SdkSecretsManager {
    client: aws_sdk_secretsmanager::Client,
}

impl SdkSecretsManager {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretsManagerApi for SdkSecretsManager {
    async fn version_stages(
        &self,
        secret_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, StoreError> {
        let output = self
            .client
            .describe_secret()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| classify("DescribeSecret", err))?;
        Ok(output.version_ids_to_stages().cloned().unwrap_or_default())
    }

    async fn get_secret_value(
        &self,
        request: SecretRequest<'_>,
    ) -> Result<RemoteSecret, StoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(request.secret_id)
            .set_version_id(request.version_id.map(str::to_string))
            .set_version_stage(request.version_stage.map(str::to_string))
            .send()
            .await
            .map_err(|err| classify("GetSecretValue", err))?;

        let version_id = output
            .version_id()
            .ok_or_else(|| StoreError::transient("GetSecretValue: response missing version id"))?
            .to_string();
        let bytes = match (output.secret_string(), output.secret_binary()) {
            (Some(text), _) => text.as_bytes().to_vec(),
            (None, Some(binary)) => binary.as_ref().to_vec(),
            (None, None) => {
                return Err(StoreError::transient(
                    "GetSecretValue: response carried no secret value",
                ));
            }
        };
        Ok(RemoteSecret { version_id, bytes })
    }
}

#[derive(Debug, Clone)]
pub struct SdkParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SdkParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStoreApi for SdkParameterStore {
    async fn get_parameters(&self, names: &[String]) -> Result<ParameterBatch, StoreError> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| classify("GetParameters", err))?;

        let parameters = output
            .parameters()
            .iter()
            .map(|parameter| RemoteParameter {
                name: parameter.name().unwrap_or_default().to_string(),
                arn: parameter.arn().map(str::to_string),
                selector: parameter.selector().map(str::to_string),
                value: parameter.value().unwrap_or_default().to_string(),
                version: parameter.version(),
            })
            .collect();
        Ok(ParameterBatch {
            parameters,
            invalid: output.invalid_parameters().to_vec(),
        })
    }
}
