use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed `default =` literal. Lists and maps are kept as raw bracketed
/// text rather than deep-parsed, matching what the declaration parser can
/// actually recover from HCL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TfValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl TfValue {
    /// Render the value as an HCL literal suitable for variables.tf and
    /// tfvars output. Strings that already look like bracketed raw text
    /// (list/map defaults) are emitted as-is.
    pub fn to_hcl(&self) -> String {
        match self {
            TfValue::Str(s) => {
                if s.starts_with('[') || s.starts_with('{') {
                    s.clone()
                } else {
                    format!("\"{}\"", s)
                }
            }
            TfValue::Bool(b) => b.to_string(),
            TfValue::Int(n) => n.to_string(),
            TfValue::Float(n) => n.to_string(),
        }
    }
}

impl TfValue {
    /// Convert a JSON default (as returned by the registry API) into a
    /// literal. Nulls carry no default; composite values are kept as their
    /// serialized text.
    pub fn from_json(value: &serde_json::Value) -> Option<TfValue> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(TfValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(TfValue::Int(i))
                } else {
                    n.as_f64().map(TfValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(TfValue::Str(s.clone())),
            other => Some(TfValue::Str(other.to_string())),
        }
    }
}

impl fmt::Display for TfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hcl())
    }
}

/// A `variable "<name>" { ... }` block extracted from configuration text.
///
/// `required` is derived from the absence of a default and is never set
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_type")]
    pub var_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TfValue>,
    pub required: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub has_validation: bool,
}

fn default_type() -> String {
    "string".to_string()
}

/// An `output "<name>" { ... }` block. The value reference is the raw
/// right-hand side expression, unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value_reference: String,
    #[serde(default)]
    pub sensitive: bool,
}

/// Flat description of a registry module assembled from the module record,
/// its version list, the version detail and the configuration-version files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDescription {
    pub organization: String,
    pub module: String,
    pub name: String,
    pub provider: String,
    pub provider_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: String,
    pub version_requested: String,
    pub current_version: String,
    #[serde(default)]
    pub available_versions: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub vcs_repo: serde_json::Value,
    #[serde(default)]
    pub input_variables: Vec<VariableDeclaration>,
    #[serde(default)]
    pub output_variables: Vec<OutputDeclaration>,
    #[serde(default)]
    pub module_files: BTreeMap<String, String>,
    #[serde(default)]
    pub usage_example: String,
    #[serde(default)]
    pub terraform_version: String,
    #[serde(default)]
    pub providers: Vec<serde_json::Value>,
    #[serde(default)]
    pub dependencies: Vec<serde_json::Value>,
    #[serde(default)]
    pub readme: String,
}

/// Module file names worth carrying in a description result.
pub const MODULE_FILE_ALLOWLIST: [&str; 5] = [
    "main.tf",
    "variables.tf",
    "outputs.tf",
    "versions.tf",
    "README.md",
];

/// Hard cap on readme excerpts carried in results.
pub const README_EXCERPT_LIMIT: usize = 2000;

/// Truncate a readme to the excerpt limit, marking truncation with an
/// ellipsis.
pub fn readme_excerpt(readme: &str) -> String {
    if readme.chars().count() > README_EXCERPT_LIMIT {
        let head: String = readme.chars().take(README_EXCERPT_LIMIT).collect();
        format!("{}...", head)
    } else {
        readme.to_string()
    }
}

/// Deployment environment. The ordering dev < qa < uat < prod is by scale
/// and is relied upon by the value synthesis tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Qa,
    Uat,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Dev,
        Environment::Qa,
        Environment::Uat,
        Environment::Prod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Qa => "qa",
            Environment::Uat => "uat",
            Environment::Prod => "prod",
        }
    }

    /// Cloud region assignment: lower environments stay in us-east-1,
    /// uat/prod run in us-west-2.
    pub fn region(&self) -> &'static str {
        match self {
            Environment::Dev | Environment::Qa => "us-east-1",
            Environment::Uat | Environment::Prod => "us-west-2",
        }
    }

    /// Base scale factor used for count/size style numeric variables.
    pub fn scale_factor(&self) -> i64 {
        match self {
            Environment::Dev => 1,
            Environment::Qa => 2,
            Environment::Uat => 3,
            Environment::Prod => 5,
        }
    }

    pub fn memory_mb(&self) -> i64 {
        match self {
            Environment::Dev => 128,
            Environment::Qa => 256,
            Environment::Uat => 512,
            Environment::Prod => 1024,
        }
    }

    pub fn cpu_units(&self) -> i64 {
        match self {
            Environment::Dev => 256,
            Environment::Qa => 512,
            Environment::Uat => 1024,
            Environment::Prod => 2048,
        }
    }

    pub fn timeout_secs(&self) -> i64 {
        match self {
            Environment::Dev => 60,
            Environment::Qa => 120,
            Environment::Uat => 300,
            Environment::Prod => 600,
        }
    }

    /// Two /24 blocks per environment, carved from a per-environment /16.
    pub fn cidr_blocks(&self) -> [&'static str; 2] {
        match self {
            Environment::Dev => ["10.0.1.0/24", "10.0.2.0/24"],
            Environment::Qa => ["10.1.1.0/24", "10.1.2.0/24"],
            Environment::Uat => ["10.2.1.0/24", "10.2.2.0/24"],
            Environment::Prod => ["10.3.1.0/24", "10.3.2.0/24"],
        }
    }

    /// Prod gets a third subnet for cross-AZ redundancy.
    pub fn subnet_count(&self) -> usize {
        match self {
            Environment::Prod => 3,
            _ => 2,
        }
    }

    /// Availability zones for the environment's region.
    pub fn availability_zones(&self) -> [&'static str; 3] {
        match self.region() {
            "us-west-2" => ["us-west-2a", "us-west-2b", "us-west-2c"],
            _ => ["us-east-1a", "us-east-1b", "us-east-1c"],
        }
    }

    pub fn parse(value: &str) -> Option<Environment> {
        match value.to_lowercase().as_str() {
            "dev" => Some(Environment::Dev),
            "qa" => Some(Environment::Qa),
            "uat" => Some(Environment::Uat),
            "prod" => Some(Environment::Prod),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a provider code to its human-facing display name.
pub fn display_provider(provider_code: &str) -> &str {
    if provider_code == "azu" {
        "azure"
    } else {
        provider_code
    }
}

/// Map a display name back to the provider code used by the registry and
/// repository naming.
pub fn provider_code(provider: &str) -> &str {
    if provider == "azure" {
        "azu"
    } else {
        provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_ordering_follows_scale() {
        let factors: Vec<i64> = Environment::ALL.iter().map(|e| e.scale_factor()).collect();
        let mut sorted = factors.clone();
        sorted.sort();
        assert_eq!(factors, sorted);
    }

    #[test]
    fn provider_display_mapping() {
        assert_eq!(display_provider("azu"), "azure");
        assert_eq!(display_provider("aws"), "aws");
        assert_eq!(provider_code("azure"), "azu");
        assert_eq!(provider_code("aws"), "aws");
    }

    #[test]
    fn readme_excerpt_truncates_with_marker() {
        let long = "x".repeat(2500);
        let excerpt = readme_excerpt(&long);
        assert_eq!(excerpt.len(), README_EXCERPT_LIMIT + 3);
        assert!(excerpt.ends_with("..."));

        let short = "short readme";
        assert_eq!(readme_excerpt(short), short);
    }

    #[test]
    fn tf_value_hcl_rendering() {
        assert_eq!(TfValue::Str("us-east-1".into()).to_hcl(), "\"us-east-1\"");
        assert_eq!(TfValue::Bool(false).to_hcl(), "false");
        assert_eq!(TfValue::Int(3).to_hcl(), "3");
        assert_eq!(TfValue::Str("[\"a\", \"b\"]".into()).to_hcl(), "[\"a\", \"b\"]");
    }

    #[test]
    fn environment_parse_round_trip() {
        for env in Environment::ALL {
            assert_eq!(Environment::parse(env.as_str()), Some(env));
        }
        assert_eq!(Environment::parse("staging"), None);
    }
}
