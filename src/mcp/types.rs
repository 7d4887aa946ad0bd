//! Input types for RMCP tools with automatic JSON Schema generation.

use schemars::JsonSchema;
use serde::Deserialize;

fn default_provider() -> String {
    "aws".to_string()
}

fn default_version() -> String {
    "latest".to_string()
}

/// Input for the registry existence probe
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckModuleInput {
    /// Module name as registered (e.g., "lambda", "s3-bucket")
    pub module_name: String,
    /// Provider name: "aws" or "azure" (default: "aws")
    #[serde(default = "default_provider")]
    pub provider: String,
}

/// Input for module details lookup
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModuleDetailsInput {
    /// Module name as registered
    pub name: String,
    /// Provider code used by the registry (e.g., "aws", "azu")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Specific version, or "latest" (default)
    #[serde(default = "default_version")]
    pub version: String,
}

/// Input for repository file retrieval
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RepositoryFilesInput {
    /// Module name; the repository is resolved as terraform-<provider>-<module>
    pub module_name: String,
    /// Provider name: "aws" or "azure" (default: "aws")
    #[serde(default = "default_provider")]
    pub provider: String,
}

/// Input for scaffold population
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PopulateInput {
    /// Module name as registered
    pub module_name: String,
    /// Provider name: "aws" or "azure" (default: "aws")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Absolute path to the target infrastructure config repository
    pub repo_path: String,
    /// Module details JSON as returned by get_module_details
    pub module_details: String,
}
