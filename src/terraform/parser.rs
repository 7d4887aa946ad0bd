//! Extraction of variable and output declarations from raw Terraform
//! configuration text.
//!
//! Blocks are matched with a balanced-brace pattern that tolerates one
//! level of nesting (a validation block or an object default). Blocks
//! nested deeper than one level are not guaranteed to parse correctly.

use crate::terraform::model::{OutputDeclaration, TfValue, VariableDeclaration};
use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)variable\s+"([^"]+)"\s*\{([^{}]*(?:\{[^{}]*\}[^{}]*)*)\}"#)
        .expect("invalid variable block regex")
});

static OUTPUT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)output\s+"([^"]+)"\s*\{([^{}]*(?:\{[^{}]*\}[^{}]*)*)\}"#)
        .expect("invalid output block regex")
});

static DESC_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"description\s*=\s*"([^"]*)""#).expect("invalid description regex"));

static DESC_HEREDOC_EOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)description\s*=\s*<<-?EOT[ \t]*\n(.*?)\n\s*EOT").expect("invalid heredoc regex")
});

static DESC_HEREDOC_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"description\s*=\s*<<-?([A-Z]+)[ \t]*\n").expect("invalid heredoc open regex")
});

static TYPE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"type\s*=\s*([^\n\r]+)").expect("invalid type regex"));

static DEFAULT_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"default\s*=\s*"([^"]*)""#).expect("invalid default regex"));

static DEFAULT_BOOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default\s*=\s*(true|false)").expect("invalid default regex"));

static DEFAULT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default\s*=\s*(\d+(?:\.\d+)?)").expect("invalid default regex"));

static DEFAULT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)default\s*=\s*\[(.*?)\]").expect("invalid default regex"));

static DEFAULT_MAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default\s*=\s*\{([^}]*)\}").expect("invalid default regex"));

static DEFAULT_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default\s*=\s*([^\n\r#]+)").expect("invalid default regex"));

static SENSITIVE_TRUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sensitive\s*=\s*true").expect("invalid sensitive regex"));

static VALUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"value\s*=\s*([^\n\r]+)").expect("invalid value regex"));

/// Parse all `variable` blocks from the content, in source order.
pub fn parse_variables(content: &str) -> Vec<VariableDeclaration> {
    VARIABLE_BLOCK
        .captures_iter(content)
        .map(|captures| {
            let name = captures[1].to_string();
            let block = &captures[2];

            let default = extract_default(block);
            VariableDeclaration {
                name,
                description: extract_description(block),
                var_type: extract_type(block),
                required: default.is_none(),
                default,
                sensitive: SENSITIVE_TRUE.is_match(block),
                has_validation: block.contains("validation"),
            }
        })
        .collect()
}

/// Parse all `output` blocks from the content, in source order.
pub fn parse_outputs(content: &str) -> Vec<OutputDeclaration> {
    OUTPUT_BLOCK
        .captures_iter(content)
        .map(|captures| {
            let name = captures[1].to_string();
            let block = &captures[2];

            OutputDeclaration {
                name,
                description: extract_description(block),
                value_reference: VALUE_LINE
                    .captures(block)
                    .map(|c| c[1].trim().to_string())
                    .unwrap_or_default(),
                sensitive: SENSITIVE_TRUE.is_match(block),
            }
        })
        .collect()
}

/// Description extraction tries a quoted single-line value, then an EOT
/// heredoc, then a heredoc with a custom uppercase delimiter. First match
/// wins; no match yields an empty string.
fn extract_description(block: &str) -> String {
    if let Some(captures) = DESC_QUOTED.captures(block) {
        return captures[1].trim().to_string();
    }
    if let Some(captures) = DESC_HEREDOC_EOT.captures(block) {
        return captures[1].trim().to_string();
    }
    if let Some(captures) = DESC_HEREDOC_OPEN.captures(block) {
        let token = captures[1].to_string();
        if token != "EOT" {
            if let Some(body) = heredoc_body(block, captures.get(0).map(|m| m.end()).unwrap_or(0), &token) {
                return body;
            }
        }
    }
    String::new()
}

/// Collect heredoc lines until a line containing only the delimiter token.
/// The regex crate has no backreferences, so the closing line is found by
/// scanning.
fn heredoc_body(block: &str, body_start: usize, token: &str) -> Option<String> {
    let rest = block.get(body_start..)?;
    let mut lines = Vec::new();
    for line in rest.lines() {
        if line.trim() == token {
            return Some(lines.join("\n").trim().to_string());
        }
        lines.push(line);
    }
    None
}

/// Text after `type =` up to end of line, with any trailing `#` comment
/// stripped. Absent type falls back to "string".
fn extract_type(block: &str) -> String {
    TYPE_LINE
        .captures(block)
        .map(|captures| {
            let raw = &captures[1];
            let uncommented = raw.split('#').next().unwrap_or(raw);
            uncommented.trim().to_string()
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "string".to_string())
}

/// Default extraction tries each pattern in strict order against the whole
/// block and stops at the first match. Because patterns are not anchored to
/// a single `default =` site, a coincidental match elsewhere in the block
/// (a description mentioning `default = "x"`, say) governs. That
/// first-match-wins-over-whole-block order is a known fragility carried
/// over deliberately; see DESIGN.md.
fn extract_default(block: &str) -> Option<TfValue> {
    if let Some(captures) = DEFAULT_STRING.captures(block) {
        return Some(TfValue::Str(captures[1].to_string()));
    }
    if let Some(captures) = DEFAULT_BOOL.captures(block) {
        return Some(TfValue::Bool(&captures[1] == "true"));
    }
    if let Some(captures) = DEFAULT_NUMBER.captures(block) {
        let text = &captures[1];
        // Narrowest exact type first; literals wider than i64 degrade to
        // f64 and then to raw text rather than dropping the default.
        if !text.contains('.') {
            if let Ok(int) = text.parse::<i64>() {
                return Some(TfValue::Int(int));
            }
        }
        if let Ok(float) = text.parse::<f64>() {
            return Some(TfValue::Float(float));
        }
        return Some(TfValue::Str(text.to_string()));
    }
    if let Some(captures) = DEFAULT_LIST.captures(block) {
        return Some(TfValue::Str(format!("[{}]", &captures[1])));
    }
    if let Some(captures) = DEFAULT_MAP.captures(block) {
        return Some(TfValue::Str(format!("{{{}}}", &captures[1])));
    }
    if let Some(captures) = DEFAULT_ANY.captures(block) {
        let text = captures[1].trim();
        if !text.is_empty() {
            return Some(TfValue::Str(text.to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_variable_round_trip() {
        let content = r#"
variable "region" {
  description = "AWS region"
  type        = string
  default     = "us-east-1"
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 1);
        let var = &variables[0];
        assert_eq!(var.name, "region");
        assert_eq!(var.description, "AWS region");
        assert_eq!(var.var_type, "string");
        assert_eq!(var.default, Some(TfValue::Str("us-east-1".into())));
        assert!(!var.required);
        assert!(!var.sensitive);
        assert!(!var.has_validation);
    }

    #[test]
    fn required_iff_default_absent() {
        let content = r#"
variable "with_default" {
  type    = number
  default = 3
}

variable "without_default" {
  type = string
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 2);
        for var in &variables {
            assert_eq!(var.required, var.default.is_none());
        }
        assert!(!variables[0].required);
        assert!(variables[1].required);
    }

    #[test]
    fn missing_type_defaults_to_string() {
        let content = r#"
variable "untyped" {
  description = "no type given"
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables[0].var_type, "string");
    }

    #[test]
    fn type_line_comment_is_stripped() {
        let content = r#"
variable "count" {
  type = number # instances
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables[0].var_type, "number");
    }

    #[test]
    fn default_value_kinds() {
        let content = r#"
variable "flag" {
  type    = bool
  default = false
}

variable "size" {
  type    = number
  default = 42
}

variable "ratio" {
  type    = number
  default = 0.5
}

variable "zones" {
  type    = list(string)
  default = ["a", "b"]
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables[0].default, Some(TfValue::Bool(false)));
        assert_eq!(variables[1].default, Some(TfValue::Int(42)));
        assert_eq!(variables[2].default, Some(TfValue::Float(0.5)));
        assert_eq!(variables[3].default, Some(TfValue::Str("[\"a\", \"b\"]".into())));
    }

    #[test]
    fn integer_default_wider_than_i64_is_preserved() {
        let content = r#"
variable "account_id" {
  type    = number
  default = 99999999999999999999
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 1);
        match &variables[0].default {
            Some(TfValue::Float(f)) => assert!(*f > 9.9e18),
            other => panic!("expected widened numeric default, got {:?}", other),
        }
        assert!(!variables[0].required);
    }

    #[test]
    fn sensitive_and_validation_flags() {
        let content = r#"
variable "db_password" {
  type      = string
  sensitive = true

  validation {
    condition     = length(var.db_password) > 8
    error_message = "Too short."
  }
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 1);
        assert!(variables[0].sensitive);
        assert!(variables[0].has_validation);
        assert!(variables[0].required);
    }

    #[test]
    fn heredoc_descriptions() {
        let content = r#"
variable "a" {
  description = <<-EOT
    Multi line
    description text
  EOT
  type = string
}

variable "b" {
  description = <<DESC
custom delimited body
DESC
  type = string
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 2);
        assert!(variables[0].description.contains("Multi line"));
        assert!(variables[0].description.contains("description text"));
        assert_eq!(variables[1].description, "custom delimited body");
    }

    #[test]
    fn first_matching_default_pattern_governs() {
        // Patterns are tried in order against the whole block, so the
        // quoted-string pattern matching inside the heredoc description
        // wins over the real numeric default below it. Pinned behavior;
        // see DESIGN.md.
        let content = r#"
variable "fragile" {
  description = <<-EOT
    Set default = "none" to disable.
  EOT
  type    = number
  default = 7
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables[0].default, Some(TfValue::Str("none".into())));
        assert!(!variables[0].required);
    }

    #[test]
    fn parse_outputs_with_values() {
        let content = r#"
output "function_arn" {
  description = "ARN of the function"
  value       = aws_lambda_function.this.arn
}

output "secret" {
  value     = aws_secretsmanager_secret.this.arn
  sensitive = true
}
"#;
        let outputs = parse_outputs(content);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "function_arn");
        assert_eq!(outputs[0].description, "ARN of the function");
        assert_eq!(outputs[0].value_reference, "aws_lambda_function.this.arn");
        assert!(!outputs[0].sensitive);
        assert!(outputs[1].sensitive);
    }

    #[test]
    fn nested_object_default_block_is_tolerated() {
        let content = r#"
variable "tags" {
  type = map(string)
  default = {
    Team = "platform"
  }
}
"#;
        let variables = parse_variables(content);
        assert_eq!(variables.len(), 1);
        match &variables[0].default {
            Some(TfValue::Str(raw)) => assert!(raw.contains("Team")),
            other => panic!("expected raw map default, got {:?}", other),
        }
    }

    #[test]
    fn source_order_is_preserved() {
        let content = r#"
variable "zeta" { type = string }
variable "alpha" { type = string }
"#;
        let names: Vec<String> = parse_variables(content).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
