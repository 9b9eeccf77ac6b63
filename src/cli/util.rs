//! CLI utility helpers

use mapcheck::{AnalyzerConfig, Compilation, Error, Result};
use std::path::PathBuf;

/// Flags that take a value
const VALUE_FLAGS: &[&str] = &["--config", "-c", "--rule", "-r"];

/// Value following `flag` (or its short form), first occurrence
pub fn flag_value<'a>(args: &'a [String], flag: &str, short: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag || a == short)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Every value of a repeatable flag
pub fn flag_values(args: &[String], flag: &str, short: &str) -> Vec<String> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| *a == flag || *a == short)
        .filter_map(|(i, _)| args.get(i + 1).cloned())
        .collect()
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values; `.` when there are none
pub fn path_args(args: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        paths.push(PathBuf::from(arg));
    }
    if paths.is_empty() {
        paths.push(PathBuf::from("."));
    }
    paths
}

/// `--config <file>`, or the nearest `.mapcheck.yaml` above the working directory
pub fn load_config(args: &[String]) -> Result<AnalyzerConfig> {
    match flag_value(args, "--config", "-c") {
        Some(path) => AnalyzerConfig::load(PathBuf::from(path).as_path()),
        None => {
            let current_dir = std::env::current_dir().map_err(Error::Io)?;
            AnalyzerConfig::discover(&current_dir)
        }
    }
}

pub fn load_compilation(args: &[String]) -> Result<Compilation> {
    let compilation = Compilation::load(&path_args(args))?;
    if compilation.documents().is_empty() {
        return Err("No C# files found".into());
    }
    Ok(compilation)
}
