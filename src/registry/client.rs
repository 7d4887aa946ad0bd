//! Client for a Terraform-Cloud-compatible private module registry.
//!
//! The description pipeline is a chain of dependent requests (module ->
//! versions -> version detail -> configuration version -> files) where
//! every step past the first degrades to an empty portion of the result
//! instead of failing the whole call.

use crate::config::RegistryConfig;
use crate::error::ApiError;
use crate::terraform::model::{
    display_provider, readme_excerpt, ModuleDescription, OutputDeclaration, TfValue,
    VariableDeclaration, MODULE_FILE_ALLOWLIST,
};
use crate::terraform::scaffold;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed timeout for every registry request. No retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on the version list carried in a module description.
const VERSION_LIST_LIMIT: usize = 10;

/// Result of a module existence probe.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleCheck {
    pub module_exists: bool,
    pub module_name: String,
    pub provider: String,
    pub provider_code: String,
    pub organization: String,
    pub status: String,
    pub current_version: String,
    pub created_at: String,
    pub repository_url: String,
}

pub struct RegistryClient {
    client: Client,
    base_url: String,
    token: String,
    organization: String,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("tfscaffold/", env!("CARGO_PKG_VERSION")))
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            organization: config.organization.clone(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    fn module_url(&self, name: &str, provider: &str) -> String {
        format!(
            "{}/organizations/{}/registry-modules/private/{}/{}/{}",
            self.base_url, self.organization, self.organization, name, provider
        )
    }

    /// GET a registry URL and parse the body. 404 and 401 become
    /// structured errors; connection failures and timeouts map to
    /// transport errors.
    async fn get_json(&self, url: &str, resource: &str) -> Result<Value, ApiError> {
        debug!(url, "registry request");
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/vnd.api+json")
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        if status == 401 {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Unexpected(format!("HTTP {} for {}", status, url)));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(ApiError::from)
    }

    /// Best-effort GET for optional sub-fetches: any failure is logged and
    /// collapses to None so the caller can carry on with a partial result.
    async fn get_json_opt(&self, url: &str, resource: &str) -> Option<Value> {
        match self.get_json(url, resource).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(resource, error = %e, "optional registry fetch failed, continuing without it");
                None
            }
        }
    }

    /// Probe whether a module exists in the private registry.
    pub async fn check_module(&self, name: &str, provider: &str) -> Result<ModuleCheck, ApiError> {
        // Accept the display name and normalize to the registry code.
        let code = crate::terraform::model::provider_code(provider).to_string();
        let url = self.module_url(name, &code);
        let module = self
            .get_json(&url, &format!("module {}/{}/{}", self.organization, name, code))
            .await?;

        let attributes = &module["data"]["attributes"];
        let current_version = attributes["version-statuses"][0]["version"]
            .as_str()
            .unwrap_or("")
            .to_string();

        info!(module = name, provider = %code, "module found in private registry");
        Ok(ModuleCheck {
            module_exists: true,
            module_name: name.to_string(),
            provider: display_provider(&code).to_string(),
            provider_code: code,
            organization: self.organization.clone(),
            status: attributes["status"].as_str().unwrap_or("").to_string(),
            current_version,
            created_at: attributes["created-at"].as_str().unwrap_or("").to_string(),
            repository_url: attributes["vcs-repo"]["repository-http-url"]
                .as_str()
                .unwrap_or("")
                .to_string(),
        })
    }

    /// Fetch the full module description: attributes, version list, version
    /// detail, and module files, reshaped into a flat record.
    pub async fn describe_module(
        &self,
        name: &str,
        provider: &str,
        version: &str,
    ) -> Result<ModuleDescription, ApiError> {
        let module_url = self.module_url(name, provider);
        let module = self
            .get_json(
                &module_url,
                &format!("module {}/{}/{}", self.organization, name, provider),
            )
            .await?;
        let attributes = module["data"]["attributes"].clone();

        let versions_url = format!("{}/versions", module_url);
        let versions_data = self.get_json_opt(&versions_url, "module versions").await;

        let target_version = if version == "latest" {
            attributes["version-statuses"][0]["version"]
                .as_str()
                .unwrap_or("")
                .to_string()
        } else {
            version.to_string()
        };

        let version_detail_url = format!("{}/{}", versions_url, target_version);
        let version_attributes = self
            .get_json_opt(&version_detail_url, "module version detail")
            .await
            .map(|v| v["data"]["attributes"].clone())
            .unwrap_or(Value::Null);

        // Files hang off the configuration version of the resolved version.
        // Both fetches are optional.
        let files_data = if version_attributes.is_null() {
            None
        } else {
            let config_version_url = format!("{}/configuration-version", version_detail_url);
            let _config_data = self
                .get_json_opt(&config_version_url, "configuration version")
                .await;
            self.get_json_opt(
                &format!("{}/configuration-version-files", config_version_url),
                "configuration version files",
            )
            .await
        };

        let input_variables = extract_inputs(&version_attributes);
        let output_variables = extract_outputs(&version_attributes);
        let module_files = extract_module_files(files_data.as_ref());

        let available_versions: Vec<String> = versions_data
            .as_ref()
            .and_then(|v| v["data"].as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e["attributes"]["version"].as_str())
                    .map(|s| s.to_string())
                    .take(VERSION_LIST_LIMIT)
                    .collect()
            })
            .unwrap_or_default();

        let usage_example =
            scaffold::render_usage_example(&self.organization, name, provider, &input_variables);

        let readme_source = version_attributes["readme"]
            .as_str()
            .map(|s| s.to_string())
            .or_else(|| module_files.get("README.md").cloned())
            .unwrap_or_default();

        info!(
            module = name,
            provider,
            version = %target_version,
            inputs = input_variables.len(),
            outputs = output_variables.len(),
            "assembled module description"
        );

        Ok(ModuleDescription {
            organization: self.organization.clone(),
            module: format!("{}/{}/{}", self.organization, name, provider),
            name: attributes["name"].as_str().unwrap_or(name).to_string(),
            provider: display_provider(provider).to_string(),
            provider_code: provider.to_string(),
            description: version_attributes["description"]
                .as_str()
                .unwrap_or("No description available")
                .to_string(),
            source: version_attributes["source"].as_str().unwrap_or("").to_string(),
            status: attributes["status"].as_str().unwrap_or("").to_string(),
            version_requested: version.to_string(),
            current_version: target_version,
            available_versions,
            created_at: attributes["created-at"].as_str().unwrap_or("").to_string(),
            updated_at: attributes["updated-at"].as_str().unwrap_or("").to_string(),
            vcs_repo: attributes["vcs-repo"].clone(),
            input_variables,
            output_variables,
            module_files,
            usage_example,
            terraform_version: version_attributes["terraform-version"]
                .as_str()
                .unwrap_or("")
                .to_string(),
            providers: version_attributes["providers"]
                .as_array()
                .cloned()
                .unwrap_or_default(),
            dependencies: version_attributes["dependencies"]
                .as_array()
                .cloned()
                .unwrap_or_default(),
            readme: readme_excerpt(&readme_source),
        })
    }
}

/// Reshape the registry's `inputs` array into variable declarations.
fn extract_inputs(version_attributes: &Value) -> Vec<VariableDeclaration> {
    version_attributes["inputs"]
        .as_array()
        .map(|inputs| {
            inputs
                .iter()
                .map(|input| {
                    let default = TfValue::from_json(&input["default"]);
                    VariableDeclaration {
                        name: input["name"].as_str().unwrap_or("").to_string(),
                        description: input["description"].as_str().unwrap_or("").to_string(),
                        var_type: input["type"]
                            .as_str()
                            .filter(|t| !t.is_empty())
                            .unwrap_or("string")
                            .to_string(),
                        required: input["required"].as_bool().unwrap_or(default.is_none()),
                        default,
                        sensitive: input["sensitive"].as_bool().unwrap_or(false),
                        has_validation: false,
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reshape the registry's `outputs` array into output declarations.
fn extract_outputs(version_attributes: &Value) -> Vec<OutputDeclaration> {
    version_attributes["outputs"]
        .as_array()
        .map(|outputs| {
            outputs
                .iter()
                .map(|output| OutputDeclaration {
                    name: output["name"].as_str().unwrap_or("").to_string(),
                    description: output["description"].as_str().unwrap_or("").to_string(),
                    value_reference: String::new(),
                    sensitive: output["sensitive"].as_bool().unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Keep only the well-known module files from the configuration-version
/// file listing.
fn extract_module_files(files_data: Option<&Value>) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    if let Some(entries) = files_data.and_then(|v| v["data"].as_array()) {
        for entry in entries {
            let attrs = &entry["attributes"];
            let filename = attrs["filename"].as_str().unwrap_or("");
            if MODULE_FILE_ALLOWLIST.contains(&filename) {
                files.insert(
                    filename.to_string(),
                    attrs["content"].as_str().unwrap_or("").to_string(),
                );
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_inputs_reshapes_registry_records() {
        let attrs = json!({
            "inputs": [
                {"name": "function_name", "type": "string", "description": "Name", "required": true},
                {"name": "memory", "type": "number", "default": 128, "required": false}
            ]
        });
        let inputs = extract_inputs(&attrs);
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].required);
        assert!(inputs[0].default.is_none());
        assert_eq!(inputs[1].default, Some(TfValue::Int(128)));
        assert!(!inputs[1].required);
    }

    #[test]
    fn extract_inputs_degrades_to_empty_when_detail_missing() {
        // A failed version-detail sub-fetch leaves Value::Null here; the
        // description must still assemble with empty variable lists.
        assert!(extract_inputs(&Value::Null).is_empty());
        assert!(extract_outputs(&Value::Null).is_empty());
    }

    #[test]
    fn module_files_respect_allowlist() {
        let files = json!({
            "data": [
                {"attributes": {"filename": "main.tf", "content": "# main"}},
                {"attributes": {"filename": "terraform.tfstate", "content": "{}"}},
                {"attributes": {"filename": "README.md", "content": "docs"}}
            ]
        });
        let extracted = extract_module_files(Some(&files));
        assert_eq!(extracted.len(), 2);
        assert!(extracted.contains_key("main.tf"));
        assert!(!extracted.contains_key("terraform.tfstate"));
    }
}
