//! mapcheck CLI - Command-line interface
//!
//! Commands:
//!   check    - Analyze mapping registrations
//!   fix      - Apply code fixes
//!   rules    - List rules
//!   schema   - Print JSON schemas
//!   sexp     - Dump a syntax tree

mod cli;

use cli::*;
use mapcheck::VERSION;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`MAPCHECK_LOG=debug`)
const LOG_ENV: &str = "MAPCHECK_LOG";

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "fix" => cmd_fix(&args[2..]),
        "rules" => cmd_rules(&args[2..]),
        "schema" => cmd_schema(&args[2..]),
        "sexp" => cmd_sexp(&args[2..]),
        "version" | "--version" | "-v" => {
            println!("mapcheck {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_usage() {
    println!(
        r#"
mapcheck - AutoMapper configuration analysis

USAGE:
    mapcheck <COMMAND> [OPTIONS]

COMMANDS:
    check [paths...]                 Analyze C# files and directories (default: .)
    fix [paths...]                   Apply fixes and write the changed files
    rules [--json]                   List rule ids, severities and titles
    schema [config|report|fix]       Print JSON schema
    sexp <file.cs>                   Print the syntax tree of a file
    version                          Print version

OPTIONS:
    --config, -c <file>              Configuration file (default: nearest .mapcheck.yaml)
    --json                           JSON output (check, fix, rules)
    --all                            Also apply low-confidence fixes (fix)
    --rule, -r <id>                  Only fix findings of this rule; repeatable (fix)
    --dry-run                        Print fixed files instead of writing them (fix)

ENVIRONMENT:
    MAPCHECK_LOG                     Log filter, e.g. debug or mapcheck=trace

EXAMPLES:
    mapcheck check src/Mapping
    mapcheck check . --json > findings.json
    mapcheck fix src --rule AM050 --dry-run
"#
    );
}
