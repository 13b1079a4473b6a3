//! Point d'entrée de gfxblock.
//!
//! Usage :
//!   gfxblock <environment.toml> [--feature NAME] [--config PATH]
//!
//! Exemples :
//!   gfxblock laptop.toml                      → évalue toutes les features
//!   gfxblock laptop.toml --feature webgl      → évalue seulement WebGL
//!   RUST_LOG=debug gfxblock laptop.toml       → trace les règles qui matchent

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use gfxblock::blocklist;
use gfxblock::config::Config;
use gfxblock::environment::Environment;
use gfxblock::rule::Feature;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    // ── 1. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 2. Parse command-line flags ────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(env_path) = positional_arg(&args) else {
        eprintln!("Usage: gfxblock <environment.toml> [--feature NAME] [--config PATH]");
        return Ok(ExitCode::from(2));
    };

    let feature = match flag_value(&args, "--feature") {
        Some(name) => match Feature::from_name(&name) {
            Some(feature) => Some(feature),
            None => {
                eprintln!("Unknown feature {name:?}. Known features:");
                for feature in Feature::ALL {
                    eprintln!("  {}", feature.as_str());
                }
                return Ok(ExitCode::from(2));
            }
        },
        None => None,
    };

    // ── 3. Configuration ───────────────────────────────────────────────
    let config = match flag_value(&args, "--config") {
        Some(path) => Config::load_from(&PathBuf::from(path)),
        None => Config::load(),
    };

    // ── 4. Environment snapshot ────────────────────────────────────────
    let content = fs::read_to_string(&env_path)?;
    let environment: Environment = toml::from_str(&content)?;

    // ── 5. Build the table and evaluate ────────────────────────────────
    let table = blocklist::build_table(&config);
    let default_status = config.engine.default_status;

    let features: Vec<Feature> = match feature {
        Some(f) => vec![f],
        None => Feature::ALL.to_vec(),
    };

    let mut any_failure = false;
    for feature in features {
        let decision = table.evaluate(&environment, feature, default_status);
        any_failure |= decision.is_failure();
        print_decision(&decision);
    }

    // Exit code 1 when anything is blocked, for scripting.
    Ok(if any_failure {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_decision(decision: &gfxblock::table::Decision) {
    let mut line = format!("{:<26} {:?}", decision.feature.as_str(), decision.status);
    if let Some(rule_id) = &decision.rule_id {
        line.push_str(&format!("  [{rule_id}]"));
    }
    if let Some(suggested) = &decision.suggested_version {
        line.push_str(&format!("  (upgrade to {suggested})"));
    }
    println!("{line}");
}

/// First argument that is not a flag or a flag value.
fn positional_arg(args: &[String]) -> Option<String> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = matches!(arg.as_str(), "--feature" | "--config");
            continue;
        }
        return Some(arg.clone());
    }
    None
}

/// Value following a `--flag`, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_arg_skips_flags() {
        assert_eq!(
            positional_arg(&args(&["--feature", "webgl", "env.toml"])),
            Some("env.toml".to_string())
        );
        assert_eq!(
            positional_arg(&args(&["env.toml", "--feature", "webgl"])),
            Some("env.toml".to_string())
        );
        assert_eq!(positional_arg(&args(&["--feature", "webgl"])), None);
    }

    #[test]
    fn test_flag_value() {
        let a = args(&["env.toml", "--feature", "webgl", "--config", "c.toml"]);
        assert_eq!(flag_value(&a, "--feature"), Some("webgl".to_string()));
        assert_eq!(flag_value(&a, "--config"), Some("c.toml".to_string()));
        assert_eq!(flag_value(&a, "--missing"), None);
    }
}
