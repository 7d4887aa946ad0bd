//! Rendering and writing of the fixed Terraform scaffold: module call,
//! variable/output declarations, per-environment tfvars and backend and
//! provider files.
//!
//! Writing is all-or-partial: the first failed write aborts the rest, and
//! the error reports exactly which files were created before it.

use crate::terraform::model::{Environment, OutputDeclaration, VariableDeclaration};
use crate::terraform::synth;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
        /// Files created before the failure, in creation order.
        created: Vec<String>,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
        created: Vec<String>,
    },
}

impl ScaffoldError {
    pub fn created_files(&self) -> &[String] {
        match self {
            ScaffoldError::Write { created, .. } => created,
            ScaffoldError::CreateDir { created, .. } => created,
        }
    }
}

/// Outcome of a successful scaffold write.
#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldReport {
    pub module: String,
    pub version: String,
    pub created_files: Vec<String>,
    pub terraform_directory: String,
    pub environments_configured: Vec<String>,
}

/// Render the module-call block for main.tf. Only required variables are
/// wired up; everything else stays inside the module defaults.
pub fn render_main_tf(
    organization: &str,
    module_name: &str,
    provider_code: &str,
    version: &str,
    inputs: &[VariableDeclaration],
) -> String {
    let mut content = format!(
        "# Main Terraform configuration\n# Generated by tfscaffold\n\nmodule \"{}\" {{\n  source  = \"app.terraform.io/{}/{}/{}\"\n  version = \"{}\"\n\n",
        module_name, organization, module_name, provider_code, version
    );
    for var in inputs.iter().filter(|v| v.required) {
        content.push_str(&format!(
            "  {} = var.{}  # {}\n",
            var.name, var.name, var.description
        ));
    }
    content.push_str("}\n");
    content
}

/// Render variables.tf with one block per module input, carrying type,
/// default and sensitivity through unchanged.
pub fn render_variables_tf(inputs: &[VariableDeclaration]) -> String {
    let mut content = String::from(
        "# Variables for Terraform configuration\n# Generated by tfscaffold\n# These variables match the module's declared inputs\n\n",
    );
    if inputs.is_empty() {
        content.push_str("# No input variables found in the module\n");
        return content;
    }
    for var in inputs {
        let description = if var.description.is_empty() {
            "No description available"
        } else {
            &var.description
        };
        content.push_str(&format!("variable \"{}\" {{\n", var.name));
        content.push_str(&format!("  description = \"{}\"\n", description));
        content.push_str(&format!("  type        = {}\n", var.var_type));
        if let Some(default) = &var.default {
            content.push_str(&format!("  default     = {}\n", default.to_hcl()));
        }
        if var.sensitive {
            content.push_str("  sensitive   = true\n");
        }
        content.push_str("}\n\n");
    }
    content
}

/// Render outputs.tf re-exporting every module output.
pub fn render_outputs_tf(module_name: &str, outputs: &[OutputDeclaration]) -> String {
    let mut content = format!(
        "# Outputs for {} module\n# Generated by tfscaffold\n\n",
        module_name
    );
    for output in outputs {
        let description = if output.description.is_empty() {
            "No description"
        } else {
            &output.description
        };
        content.push_str(&format!("output \"{}\" {{\n", output.name));
        content.push_str(&format!("  description = \"{}\"\n", description));
        content.push_str(&format!(
            "  value       = module.{}.{}\n",
            module_name, output.name
        ));
        if output.sensitive {
            content.push_str("  sensitive   = true\n");
        }
        content.push_str("}\n\n");
    }
    content
}

/// Render a per-environment tfvars file. Synthesized literals are assigned
/// only to variables that are required and defaultless; variables with
/// defaults are emitted as comments for a human to opt into.
pub fn render_tfvars(inputs: &[VariableDeclaration], env: Environment) -> String {
    let mut content = format!(
        "# {} environment variables\n# Generated by tfscaffold\n# Only includes variables declared by the module\n\n",
        env.as_str().to_uppercase()
    );
    if inputs.is_empty() {
        content.push_str("# No input variables found in the module\n");
        return content;
    }
    for var in inputs {
        match &var.default {
            None if var.required => {
                let value = synth::synthesize(&var.name, &var.var_type, env);
                content.push_str(&format!("{} = {}  # {}\n", var.name, value, var.description));
            }
            Some(default) => {
                content.push_str(&format!(
                    "# {} = {}  # Optional: {}\n",
                    var.name,
                    default.to_hcl(),
                    var.description
                ));
            }
            None => {}
        }
    }
    content
}

/// Render backend.tf pointing at the remote backend with a module-scoped
/// workspace prefix.
pub fn render_backend_tf(organization: &str, module_name: &str) -> String {
    format!(
        "# Backend configuration\n# Generated by tfscaffold\n\nterraform {{\n  backend \"remote\" {{\n    organization = \"{}\"\n\n    workspaces {{\n      prefix = \"{}-\"\n    }}\n  }}\n}}\n",
        organization, module_name
    )
}

/// Render providers.tf for the given provider code. Azure modules carry
/// their provider configuration inside the module, so callers skip this
/// file entirely for `azu`.
pub fn render_providers_tf(provider_code: &str) -> String {
    if provider_code == "azu" || provider_code == "azure" {
        "# Provider configurations for Azure\n# Generated by tfscaffold\n\nterraform {\n  required_version = \">= 1.0\"\n\n  required_providers {\n    azurerm = {\n      source  = \"hashicorp/azurerm\"\n      version = \"~> 3.0\"\n    }\n  }\n}\n\nprovider \"azurerm\" {\n  features {}\n\n  subscription_id = var.subscription_id\n}\n"
            .to_string()
    } else {
        "# Provider configurations\n# Generated by tfscaffold\n\nterraform {\n  required_version = \">= 1.0\"\n\n  required_providers {\n    aws = {\n      source  = \"hashicorp/aws\"\n      version = \"~> 5.0\"\n    }\n  }\n}\n\nprovider \"aws\" {\n  region = var.aws_region\n\n  default_tags {\n    tags = var.common_tags\n  }\n}\n"
            .to_string()
    }
}

/// Render a usage example for a module description: required variables as
/// `var.` references, optional ones as commented defaults.
pub fn render_usage_example(
    organization: &str,
    module_name: &str,
    provider_code: &str,
    inputs: &[VariableDeclaration],
) -> String {
    let mut config = format!(
        "# Configuration for {}/{}/{} module\nmodule \"{}\" {{\n  source = \"app.terraform.io/{}/{}/{}\"\n\n",
        organization, module_name, provider_code, module_name, organization, module_name, provider_code
    );
    if inputs.is_empty() {
        config.push_str("  # No input variables found in module\n");
    } else {
        for var in inputs {
            match &var.default {
                None if var.required => {
                    config.push_str(&format!(
                        "  {} = var.{}  # {}\n",
                        var.name, var.name, var.description
                    ));
                }
                Some(default) => {
                    config.push_str(&format!(
                        "  # {} = {}  # Optional: {}\n",
                        var.name,
                        default.to_hcl(),
                        var.description
                    ));
                }
                None => {}
            }
        }
    }
    config.push_str("}\n");
    config
}

fn ensure_dir(path: &Path, created: &[String]) -> Result<(), ScaffoldError> {
    std::fs::create_dir_all(path).map_err(|source| ScaffoldError::CreateDir {
        path: path.display().to_string(),
        source,
        created: created.to_vec(),
    })
}

fn write_file(path: &Path, content: &str, created: &mut Vec<String>) -> Result<(), ScaffoldError> {
    std::fs::write(path, content).map_err(|source| ScaffoldError::Write {
        path: path.display().to_string(),
        source,
        created: created.clone(),
    })?;
    created.push(path.display().to_string());
    Ok(())
}

/// Write the complete scaffold under the repository root:
/// `terraform/{main,variables,outputs,backend[,providers]}.tf` plus
/// `environment/<env>/<env>.auto.tfvars` for each fixed environment.
/// Existing files are overwritten unconditionally.
pub fn write_scaffold(
    repo_path: &Path,
    organization: &str,
    module_name: &str,
    provider_code: &str,
    version: &str,
    inputs: &[VariableDeclaration],
    outputs: &[OutputDeclaration],
) -> Result<ScaffoldReport, ScaffoldError> {
    let terraform_dir = repo_path.join("terraform");
    let mut created: Vec<String> = Vec::new();

    ensure_dir(&terraform_dir, &created)?;

    write_file(
        &terraform_dir.join("main.tf"),
        &render_main_tf(organization, module_name, provider_code, version, inputs),
        &mut created,
    )?;
    write_file(
        &terraform_dir.join("variables.tf"),
        &render_variables_tf(inputs),
        &mut created,
    )?;
    write_file(
        &terraform_dir.join("outputs.tf"),
        &render_outputs_tf(module_name, outputs),
        &mut created,
    )?;

    for env in Environment::ALL {
        let env_dir: PathBuf = repo_path.join("environment").join(env.as_str());
        ensure_dir(&env_dir, &created)?;
        write_file(
            &env_dir.join(format!("{}.auto.tfvars", env)),
            &render_tfvars(inputs, env),
            &mut created,
        )?;
    }

    write_file(
        &terraform_dir.join("backend.tf"),
        &render_backend_tf(organization, module_name),
        &mut created,
    )?;

    // Azure modules configure their provider inside the module itself.
    if provider_code != "azu" {
        write_file(
            &terraform_dir.join("providers.tf"),
            &render_providers_tf(provider_code),
            &mut created,
        )?;
    }

    info!(
        module = module_name,
        files = created.len(),
        "scaffold written"
    );

    Ok(ScaffoldReport {
        module: format!("{}/{}/{}", organization, module_name, provider_code),
        version: version.to_string(),
        created_files: created,
        terraform_directory: terraform_dir.display().to_string(),
        environments_configured: Environment::ALL.iter().map(|e| e.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::model::TfValue;

    fn required_var(name: &str, var_type: &str) -> VariableDeclaration {
        VariableDeclaration {
            name: name.to_string(),
            description: format!("{} input", name),
            var_type: var_type.to_string(),
            default: None,
            required: true,
            sensitive: false,
            has_validation: false,
        }
    }

    fn optional_var(name: &str, default: TfValue) -> VariableDeclaration {
        VariableDeclaration {
            name: name.to_string(),
            description: String::new(),
            var_type: "string".to_string(),
            default: Some(default),
            required: false,
            sensitive: false,
            has_validation: false,
        }
    }

    #[test]
    fn main_tf_emits_only_required_variables() {
        let inputs = vec![
            required_var("function_name", "string"),
            optional_var("memory_size", TfValue::Int(128)),
        ];
        let content = render_main_tf("acme", "lambda", "aws", "1.2.3", &inputs);
        assert!(content.contains("source  = \"app.terraform.io/acme/lambda/aws\""));
        assert!(content.contains("version = \"1.2.3\""));
        assert!(content.contains("function_name = var.function_name"));
        assert!(!content.contains("memory_size = var.memory_size"));
    }

    #[test]
    fn variables_tf_carries_defaults_and_sensitivity() {
        let mut secret = required_var("db_password", "string");
        secret.sensitive = true;
        let inputs = vec![secret, optional_var("region", TfValue::Str("us-east-1".into()))];
        let content = render_variables_tf(&inputs);
        assert!(content.contains("variable \"db_password\""));
        assert!(content.contains("sensitive   = true"));
        assert!(content.contains("default     = \"us-east-1\""));
    }

    #[test]
    fn tfvars_synthesizes_only_required_defaultless() {
        let inputs = vec![
            required_var("bucket_name", "string"),
            optional_var("region", TfValue::Str("us-east-1".into())),
        ];
        let content = render_tfvars(&inputs, Environment::Dev);
        assert!(content.contains("bucket_name = \"acme-dev-bucket\""));
        assert!(content.contains("# region = \"us-east-1\"  # Optional:"));
    }

    #[test]
    fn outputs_reference_the_module() {
        let outputs = vec![OutputDeclaration {
            name: "arn".to_string(),
            description: "resource ARN".to_string(),
            value_reference: "aws_thing.this.arn".to_string(),
            sensitive: false,
        }];
        let content = render_outputs_tf("lambda", &outputs);
        assert!(content.contains("value       = module.lambda.arn"));
    }

    #[test]
    fn write_scaffold_creates_full_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = vec![
            required_var("function_name", "string"),
            required_var("memory_limit", "number"),
            optional_var("timeout", TfValue::Int(60)),
        ];
        let report = write_scaffold(dir.path(), "acme", "lambda", "aws", "0.9.23", &inputs, &[])
            .expect("scaffold");

        // 5 terraform files (providers.tf included for aws) + 4 tfvars.
        assert_eq!(report.created_files.len(), 9);
        for file in ["main.tf", "variables.tf", "outputs.tf", "backend.tf", "providers.tf"] {
            assert!(dir.path().join("terraform").join(file).exists(), "{}", file);
        }
        let dev_tfvars =
            std::fs::read_to_string(dir.path().join("environment/dev/dev.auto.tfvars")).unwrap();
        assert!(dev_tfvars.contains("function_name = "));
        assert!(dev_tfvars.contains("memory_limit = 128"));
        assert!(dev_tfvars.contains("# timeout = 60"));
    }

    #[test]
    fn azure_scaffold_omits_providers_tf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report =
            write_scaffold(dir.path(), "acme", "aks", "azu", "2.0.0", &[], &[]).expect("scaffold");
        assert!(!dir.path().join("terraform/providers.tf").exists());
        // 4 terraform files + 4 tfvars.
        assert_eq!(report.created_files.len(), 8);
    }
}
