//! `check`: analyze and report

use super::util::{has_flag, load_compilation, load_config};
use mapcheck::{CheckReport, Engine, Result};

pub fn cmd_check(args: &[String]) -> Result<()> {
    let json_output = has_flag(args, "--json");
    let config = load_config(args)?;
    let compilation = load_compilation(args)?;

    let analysis = Engine::new(config).analyze(&compilation)?;
    let report = CheckReport::new(&compilation, &analysis);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_report());
    }

    if report.passed() {
        Ok(())
    } else {
        Err("Analysis found errors".into())
    }
}
