//! Informational commands: rules, schema, sexp

use mapcheck::*;
use std::fs;

pub fn cmd_rules(args: &[String]) -> Result<()> {
    if args.contains(&"--json".to_string()) {
        let rules: Vec<_> = ALL_RULES
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "title": r.title,
                    "category": r.category,
                    "severity": r.default_severity,
                    "message": r.template,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    for rule in ALL_RULES {
        println!(
            "{}  {:<8} {:<17} {}",
            rule.id,
            rule.default_severity.to_string(),
            rule.category.to_string(),
            rule.title
        );
    }
    Ok(())
}

pub fn cmd_schema(args: &[String]) -> Result<()> {
    let schema_name = args.first().map(|s| s.as_str()).unwrap_or("list");

    match schema_name {
        "list" => {
            println!("Available schemas: config, report, fix");
            Ok(())
        }
        "config" => print_schema::<AnalyzerConfig>(),
        "report" => print_schema::<CheckReport>(),
        "fix" => print_schema::<FixReport>(),
        _ => Err(format!("Unknown schema: {}", schema_name).into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Dump the tree-sitter syntax tree of a C# file
pub fn cmd_sexp(args: &[String]) -> Result<()> {
    let path = args.first().ok_or("Usage: mapcheck sexp <file.cs>")?;
    let source = fs::read_to_string(path).map_err(Error::Io)?;
    println!("{}", to_sexp(&source)?);
    Ok(())
}
