//! Deterministic, environment-aware synthesis of plausible variable values.
//!
//! `synthesize` is a pure function of the variable name, its type hint and
//! the target environment. Dispatch happens in two stages: a coarse type
//! category chosen by substring match on the type hint, then an ordered
//! table of naming patterns inside each branch. Table order is load-bearing
//! because patterns overlap (`db_name` matches both a `db` and a `name`
//! pattern); the first matching entry wins.

use crate::terraform::model::Environment;

/// Organization slug baked into synthesized resource names. Values are
/// placeholders for a human to review, so a fixed slug keeps the function
/// pure and the output deterministic.
const ORG_SLUG: &str = "acme";

/// Base DNS zone used for synthesized domain values.
const ORG_DOMAIN: &str = "acme.com";

/// Synthesize an HCL literal for a variable in the given environment.
///
/// The type-hint categories are tried in a fixed order (string, bool,
/// number, list, map/object), so a composite hint like `list(string)`
/// resolves to the string branch. Unrecognized hints produce a string
/// placeholder that is clearly marked as requiring manual update.
pub fn synthesize(name: &str, type_hint: &str, env: Environment) -> String {
    let hint = type_hint.to_lowercase();
    if hint.contains("string") {
        format!("\"{}\"", string_value(name, env))
    } else if hint.contains("bool") {
        bool_value(name, env).to_string()
    } else if hint.contains("number") {
        number_value(name, env).to_string()
    } else if hint.contains("list") {
        list_value(name, env)
    } else if hint.contains("map") || hint.contains("object") {
        object_value(name, env)
    } else {
        format!("\"UPDATE_THIS_VALUE_FOR_{}\"", name.to_uppercase())
    }
}

type StringRule = fn(&str, Environment) -> String;

/// Ordered naming-pattern table for the string branch. Evaluated top to
/// bottom; the first entry whose pattern list matches governs.
const STRING_RULES: &[(&[&str], StringRule)] = &[
    (&["name"], |name, env| {
        let cleaned = name.replace("_name", "").replace('_', "-");
        format!("{}-{}-{}", ORG_SLUG, env, cleaned)
    }),
    (&["region"], |_, env| env.region().to_string()),
    (&["environment", "env"], |_, env| env.to_string()),
    (&["bucket"], |_, env| format!("{}-{}-storage-bucket", ORG_SLUG, env)),
    (&["role"], |_, env| format!("{}-{}-execution-role", ORG_SLUG, env)),
    (&["policy"], |_, env| format!("{}-{}-access-policy", ORG_SLUG, env)),
    (&["key"], |_, env| format!("{}-{}-encryption-key", ORG_SLUG, env)),
    (&["domain"], |_, env| match env {
        Environment::Prod => format!("api.{}", ORG_DOMAIN),
        _ => format!("{}-api.{}", env, ORG_DOMAIN),
    }),
    (&["prefix"], |_, env| format!("{}-{}", ORG_SLUG, env)),
    (&["suffix"], |_, env| format!("{}-{}", env, ORG_SLUG)),
];

/// String branch: environment-prefixed resource names, region/domain
/// lookups, or a loud placeholder when no pattern applies. Returned without
/// surrounding quotes.
pub fn string_value(name: &str, env: Environment) -> String {
    let lower = name.to_lowercase();
    for (patterns, rule) in STRING_RULES {
        if patterns.iter().any(|p| lower.contains(p)) {
            return rule(name, env);
        }
    }
    format!(
        "PLEASE_UPDATE_{}_FOR_{}",
        name.to_uppercase(),
        env.as_str().to_uppercase()
    )
}

/// Boolean branch policy:
/// - enable*/enabled* default to true, except monitoring/logging toggles
///   which only hold in uat and prod;
/// - public access is denied in prod only;
/// - deletion/destruction toggles hold in dev and qa only.
pub fn bool_value(name: &str, env: Environment) -> bool {
    let lower = name.to_lowercase();
    if lower.contains("enable") || lower.contains("enabled") {
        if lower.contains("monitor") || lower.contains("log") {
            return matches!(env, Environment::Uat | Environment::Prod);
        }
        // Encryption stays on everywhere.
        return true;
    }
    if lower.contains("public") {
        return env != Environment::Prod;
    }
    if lower.contains("delete") || lower.contains("destroy") {
        return matches!(env, Environment::Dev | Environment::Qa);
    }
    true
}

/// Numeric branch. Count/size variables scale with the environment factor
/// (min = factor, max = 3x factor); memory, cpu and timeout come from the
/// per-environment tables; ports use well-known numbers.
pub fn number_value(name: &str, env: Environment) -> i64 {
    let lower = name.to_lowercase();
    if lower.contains("count") || lower.contains("size") {
        let base = env.scale_factor();
        if lower.contains("min") {
            return base;
        }
        if lower.contains("max") {
            return base * 3;
        }
        return base;
    }
    if lower.contains("memory") {
        return env.memory_mb();
    }
    if lower.contains("cpu") {
        return env.cpu_units();
    }
    if lower.contains("timeout") {
        return env.timeout_secs();
    }
    if lower.contains("port") {
        return port_for(&lower);
    }
    1
}

fn port_for(lower: &str) -> i64 {
    if lower.contains("https") {
        443
    } else if lower.contains("http") {
        80
    } else if lower.contains("ssh") {
        22
    } else {
        8080
    }
}

/// List branch: subnets (three private entries in prod, two elsewhere),
/// security groups, availability zones, CIDR blocks and tag lists.
pub fn list_value(name: &str, env: Environment) -> String {
    let lower = name.to_lowercase();
    if lower.contains("subnet") {
        let entries: Vec<String> = (1..=env.subnet_count())
            .map(|i| {
                if env == Environment::Prod {
                    format!("\"{}-{}-private-subnet-{}\"", ORG_SLUG, env, i)
                } else {
                    format!("\"{}-{}-subnet-{}\"", ORG_SLUG, env, i)
                }
            })
            .collect();
        return format!("[{}]", entries.join(", "));
    }
    if lower.contains("sg") || lower.contains("security") {
        return format!("[\"{}-{}-security-group\"]", ORG_SLUG, env);
    }
    if lower.contains("az") || lower.contains("availability") {
        let zones = env.availability_zones();
        return format!("[\"{}\", \"{}\"]", zones[0], zones[1]);
    }
    if lower.contains("cidr") {
        let blocks = env.cidr_blocks();
        return format!("[\"{}\", \"{}\"]", blocks[0], blocks[1]);
    }
    if lower.contains("tag") {
        return format!("[\"{}\", \"managed\", \"terraform\"]", env);
    }
    format!(
        "[\"UPDATE_{}_LIST_FOR_{}\"]",
        name.to_uppercase(),
        env.as_str().to_uppercase()
    )
}

/// Map/object branch: tag maps and config maps get concrete shapes,
/// everything else gets a placeholder object marked for manual update.
pub fn object_value(name: &str, env: Environment) -> String {
    let lower = name.to_lowercase();
    if lower.contains("tag") {
        return format!(
            "{{\n    Environment = \"{}\"\n    Project     = \"{}-infrastructure\"\n    ManagedBy   = \"terraform\"\n    Owner       = \"platform-team\"\n  }}",
            env, ORG_SLUG
        );
    }
    if lower.contains("config") {
        return format!(
            "{{\n    environment = \"{}\"\n    region      = \"{}\"\n  }}",
            env,
            env.region()
        );
    }
    format!(
        "{{\n    # UPDATE_THIS_OBJECT_FOR_{}\n    environment = \"{}\"\n  }}",
        name.to_uppercase(),
        env
    )
}
