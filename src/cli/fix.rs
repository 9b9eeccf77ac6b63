//! `fix`: apply fixes and write the changed files

use super::util::{flag_values, has_flag, load_compilation, load_config};
use mapcheck::{fix_all, CheckReport, Engine, Error, FixOptions, FixReport, Result};
use std::fs;

pub fn cmd_fix(args: &[String]) -> Result<()> {
    let json_output = has_flag(args, "--json");
    let dry_run = has_flag(args, "--dry-run");
    let rules = flag_values(args, "--rule", "-r");
    let options = FixOptions {
        apply_all: has_flag(args, "--all"),
        rules: if rules.is_empty() { None } else { Some(rules) },
        ..FixOptions::default()
    };

    let config = load_config(args)?;
    let compilation = load_compilation(args)?;
    let engine = Engine::new(config);
    let (fixed, result) = fix_all(&engine, &compilation, &options)?;

    let mut changed = Vec::new();
    for (before, after) in compilation.documents().iter().zip(fixed.documents()) {
        if before.text == after.text {
            continue;
        }
        changed.push(after.path.clone());
        if dry_run {
            if !json_output {
                println!("--- {} (fixed)", after.path);
                println!("{}", after.text);
            }
        } else {
            fs::write(&after.path, after.text.as_bytes()).map_err(Error::Io)?;
        }
    }

    let remaining = CheckReport::new(&fixed, &engine.analyze(&fixed)?);
    let report = FixReport::new(result, changed, remaining);
    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_report());
    }

    if report.remaining.passed() {
        Ok(())
    } else {
        Err("Errors remain after fixing".into())
    }
}
