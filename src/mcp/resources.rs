//! Static resource content exposed by the MCP server.

pub const SCAFFOLD_LAYOUT_GUIDE: &str = r#"# Infrastructure Config Repository Layout

The populate_infra_config_repo tool writes the following structure into the
target repository:

```
terraform/
  main.tf        # module call pinned to the registry source and version
  variables.tf   # one variable block per module input
  outputs.tf     # re-exports every module output
  backend.tf     # remote backend with a module-scoped workspace prefix
  providers.tf   # provider requirements (omitted for Azure modules)
environment/
  dev/dev.auto.tfvars
  qa/qa.auto.tfvars
  uat/uat.auto.tfvars
  prod/prod.auto.tfvars
```

## Variable handling

- Required variables (no default in the module) are wired through main.tf as
  `var.` references and given a synthesized value in every tfvars file.
- Optional variables appear in the tfvars files as comments carrying the
  module default, for a human to opt into.
- Sensitive markings are carried through unchanged.

## Environment conventions

| environment | region    | scale | memory (MB) | cpu | timeout (s) |
|-------------|-----------|-------|-------------|-----|-------------|
| dev         | us-east-1 | 1     | 128         | 256 | 60          |
| qa          | us-east-1 | 2     | 256         | 512 | 120         |
| uat         | us-west-2 | 3     | 512         | 1024| 300         |
| prod        | us-west-2 | 5     | 1024        | 2048| 600         |

Values that cannot be derived from the variable name are emitted as
`PLEASE_UPDATE_<NAME>_FOR_<ENV>` placeholders and must be reviewed before
applying.
"#;
