use tfscaffold::terraform::model::{Environment, ModuleDescription, TfValue};
use tfscaffold::terraform::{parser, scaffold, synth};

const SAMPLE_VARIABLES_TF: &str = r#"
variable "function_name" {
  description = "Name of the Lambda function"
  type        = string
}

variable "memory_limit" {
  description = "Memory limit in MB"
  type        = number
}

variable "timeout" {
  description = "Execution timeout in seconds"
  type        = number
  default     = 60
}

variable "enable_encryption" {
  description = "Whether to encrypt the function environment"
  type        = bool
  default     = true
}

variable "db_password" {
  description = "Database password"
  type        = string
  sensitive   = true
}
"#;

const SAMPLE_OUTPUTS_TF: &str = r#"
output "function_arn" {
  description = "ARN of the deployed function"
  value       = aws_lambda_function.this.arn
}

output "function_url" {
  value     = aws_lambda_function_url.this.function_url
  sensitive = true
}
"#;

#[test]
fn test_parser_recovers_declarations_from_real_configuration() {
    let variables = parser::parse_variables(SAMPLE_VARIABLES_TF);
    assert_eq!(variables.len(), 5);

    let function_name = &variables[0];
    assert_eq!(function_name.name, "function_name");
    assert_eq!(function_name.var_type, "string");
    assert!(function_name.required);
    assert!(function_name.default.is_none());

    let timeout = &variables[2];
    assert_eq!(timeout.default, Some(TfValue::Int(60)));
    assert!(!timeout.required);

    let encryption = &variables[3];
    assert_eq!(encryption.default, Some(TfValue::Bool(true)));

    let password = &variables[4];
    assert!(password.sensitive);
    assert!(password.required);

    let outputs = parser::parse_outputs(SAMPLE_OUTPUTS_TF);
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].name, "function_arn");
    assert!(outputs[1].sensitive);
    assert!(outputs[1].value_reference.contains("function_url"));
}

#[test]
fn test_synthesis_is_deterministic_across_calls() {
    for env in Environment::ALL {
        for (name, ty) in [
            ("bucket_name", "string"),
            ("instance_count", "number"),
            ("enable_logging", "bool"),
            ("subnet_cidrs", "list(string)"),
        ] {
            let first = synth::synthesize(name, ty, env);
            let second = synth::synthesize(name, ty, env);
            assert_eq!(first, second, "{} in {}", name, env);
        }
    }
}

#[test]
fn test_numeric_synthesis_scales_with_environment() {
    let mut last = 0;
    for env in Environment::ALL {
        let value: i64 = synth::synthesize("instance_count", "number", env)
            .parse()
            .expect("count literal");
        assert!(value >= last, "scaling regressed at {}", env);
        last = value;
    }
}

#[test]
fn test_scaffold_end_to_end_from_parsed_declarations() {
    let variables = parser::parse_variables(SAMPLE_VARIABLES_TF);
    let outputs = parser::parse_outputs(SAMPLE_OUTPUTS_TF);

    let dir = tempfile::tempdir().expect("tempdir");
    let report = scaffold::write_scaffold(
        dir.path(),
        "acme",
        "lambda",
        "aws",
        "1.4.0",
        &variables,
        &outputs,
    )
    .expect("scaffold");

    // 5 terraform files + one tfvars per environment.
    assert_eq!(report.created_files.len(), 9);
    assert_eq!(
        report.environments_configured,
        vec!["dev", "qa", "uat", "prod"]
    );

    let main_tf = std::fs::read_to_string(dir.path().join("terraform/main.tf")).expect("main.tf");
    assert!(main_tf.contains("source  = \"app.terraform.io/acme/lambda/aws\""));
    assert!(main_tf.contains("version = \"1.4.0\""));
    assert!(main_tf.contains("function_name = var.function_name"));
    // Optional variables stay on module defaults.
    assert!(!main_tf.contains("timeout = var.timeout"));

    let variables_tf =
        std::fs::read_to_string(dir.path().join("terraform/variables.tf")).expect("variables.tf");
    assert!(variables_tf.contains("variable \"db_password\""));
    assert!(variables_tf.contains("sensitive   = true"));

    let outputs_tf =
        std::fs::read_to_string(dir.path().join("terraform/outputs.tf")).expect("outputs.tf");
    assert!(outputs_tf.contains("value       = module.lambda.function_arn"));

    for env in Environment::ALL {
        let tfvars = std::fs::read_to_string(
            dir.path()
                .join("environment")
                .join(env.as_str())
                .join(format!("{}.auto.tfvars", env)),
        )
        .expect("tfvars");
        // Required and defaultless variables get literals, optional ones
        // appear only as comments.
        assert!(tfvars.contains("function_name = "));
        assert!(tfvars.contains(&format!("memory_limit = {}", env.memory_mb())));
        assert!(tfvars.contains("# timeout = 60"));
    }
}

#[test]
fn test_module_description_json_round_trip_feeds_populate() {
    // The populate tool consumes get_module_details output as a JSON
    // string; the description must survive serialization unchanged.
    let variables = parser::parse_variables(SAMPLE_VARIABLES_TF);
    let description = ModuleDescription {
        organization: "acme".to_string(),
        module: "acme/lambda/aws".to_string(),
        name: "lambda".to_string(),
        provider: "aws".to_string(),
        provider_code: "aws".to_string(),
        version_requested: "latest".to_string(),
        current_version: "1.4.0".to_string(),
        input_variables: variables,
        ..Default::default()
    };

    let json = serde_json::to_string(&description).expect("serialize");
    let restored: ModuleDescription = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.current_version, "1.4.0");
    assert_eq!(restored.input_variables.len(), 5);
    assert_eq!(
        restored.input_variables[0].name,
        description.input_variables[0].name
    );
    assert!(restored.input_variables[4].sensitive);
}

#[test]
fn test_environment_value_tables_are_consistent() {
    assert_eq!(Environment::Dev.region(), "us-east-1");
    assert_eq!(Environment::Prod.region(), "us-west-2");
    assert_eq!(Environment::Prod.subnet_count(), 3);
    // Each environment owns a distinct second octet, in scale order.
    for (octet, env) in Environment::ALL.iter().enumerate() {
        assert_eq!(env.cidr_blocks()[0], format!("10.{}.1.0/24", octet));
        assert_eq!(env.cidr_blocks()[1], format!("10.{}.2.0/24", octet));
    }
}
