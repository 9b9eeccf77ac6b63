//! Rule engine
//!
//! One analysis pass:
//!
//! 1. extract every registration of the compilation
//! 2. build the registry (the barrier: read-only from here on)
//! 3. run the enabled rules over each registration, optionally on several
//!    threads, checking for cancellation between registrations and rules
//! 4. apply configured severities and sort by location
//!
//! A rule that errors or panics is logged and skipped; the others still run.

use super::{default_rules, Rule, RuleContext};
use crate::compilation::Compilation;
use crate::config::AnalyzerConfig;
use crate::diagnostic::{Finding, Severity};
use crate::error::{Error, Result};
use crate::model::{extract_model, MemberConstraints};
use crate::registration::{build_registry, MappingRegistration, MappingRegistry};
use crate::symbols::SymbolTable;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of one analysis pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub registrations: Vec<MappingRegistration>,
    pub registry: MappingRegistry,
    pub findings: Vec<Finding>,
}

impl Analysis {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn registration(&self, id: usize) -> Option<&MappingRegistration> {
        self.registrations.get(id)
    }
}

pub struct Engine {
    rules: Vec<Box<dyn Rule>>,
    config: AnalyzerConfig,
}

impl Engine {
    pub fn new(config: AnalyzerConfig) -> Engine {
        let rules = default_rules(config.performance.mode, config.performance.max_projection_depth);
        Engine { rules, config }
    }

    /// Engine over a custom rule list
    pub fn with_rules(rules: Vec<Box<dyn Rule>>, config: AnalyzerConfig) -> Engine {
        Engine { rules, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn analyze(&self, compilation: &Compilation) -> Result<Analysis> {
        self.analyze_with(compilation, &CancellationToken::new())
    }

    /// Analyze, giving up with [`Error::Cancelled`] once `cancel` is set
    ///
    /// A cancelled pass returns no findings at all.
    pub fn analyze_with(&self, compilation: &Compilation, cancel: &CancellationToken) -> Result<Analysis> {
        cancel.check()?;
        let table = compilation.table();
        let registrations = compilation.registrations();
        let registry = build_registry(&registrations, table);

        let active: Vec<&dyn Rule> = self
            .rules
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| r.produces().iter().any(|info| self.config.is_enabled(info.id)))
            .collect();
        debug!(
            registrations = registrations.len(),
            rules = active.len(),
            "analyzing compilation"
        );

        let unit = Unit {
            registrations: &registrations,
            registry: &registry,
            table,
            rules: &active,
            cancel,
        };
        let workers = if self.config.parallel {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(registrations.len())
        } else {
            1
        };
        let per_registration = if workers > 1 {
            unit.run_parallel(workers)?
        } else {
            unit.run_range(0..registrations.len())?
        };
        cancel.check()?;

        let mut findings: Vec<Finding> = per_registration
            .into_iter()
            .flatten()
            .filter(|f| self.config.is_enabled(&f.rule_id))
            .map(|mut f| {
                f.severity = self.config.severity_for(&f.rule_id, f.severity);
                f
            })
            .collect();
        findings.sort_by_key(|f| {
            let file_index = f
                .registration
                .and_then(|id| registrations.get(id))
                .map(|r| r.file_index)
                .unwrap_or(usize::MAX);
            (file_index, f.span.start_byte)
        });

        Ok(Analysis {
            registrations,
            registry,
            findings,
        })
    }
}

/// Shared, read-only inputs of the per-registration work
struct Unit<'a> {
    registrations: &'a [MappingRegistration],
    registry: &'a MappingRegistry,
    table: &'a SymbolTable,
    rules: &'a [&'a dyn Rule],
    cancel: &'a CancellationToken,
}

impl Unit<'_> {
    fn run_range(&self, range: std::ops::Range<usize>) -> Result<Vec<Vec<Finding>>> {
        let mut out = Vec::with_capacity(range.len());
        for index in range {
            self.cancel.check()?;
            out.push(self.run_one(&self.registrations[index])?);
        }
        Ok(out)
    }

    /// Split the registrations into contiguous chunks, one thread each;
    /// results keep registration order
    fn run_parallel(&self, workers: usize) -> Result<Vec<Vec<Finding>>> {
        let total = self.registrations.len();
        let chunk = total.div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..total)
                .step_by(chunk)
                .map(|start| {
                    let end = (start + chunk).min(total);
                    scope.spawn(move || self.run_range(start..end))
                })
                .collect();
            let mut out = Vec::with_capacity(total);
            for handle in handles {
                let part = handle
                    .join()
                    .map_err(|_| Error::Other("analysis worker panicked".to_string()))??;
                out.extend(part);
            }
            Ok(out)
        })
    }

    fn run_one(&self, registration: &MappingRegistration) -> Result<Vec<Finding>> {
        let ns = registration.namespace.as_deref();
        let source = extract_model(&registration.source, self.table, ns, MemberConstraints::Readable);
        let destination = extract_model(&registration.destination, self.table, ns, MemberConstraints::Writable);
        if source.is_none() || destination.is_none() {
            debug!(
                registration = %registration.title(),
                "type could not be resolved; member rules will report nothing"
            );
        }
        let ctx = RuleContext {
            registration,
            registrations: self.registrations,
            source: source.as_ref(),
            destination: destination.as_ref(),
            registry: self.registry,
            table: self.table,
        };

        let mut findings = Vec::new();
        for rule in self.rules {
            self.cancel.check()?;
            let found = run_isolated(*rule, &ctx);
            debug!(
                rule = rule.name(),
                registration = %registration.title(),
                findings = found.len(),
                "rule finished"
            );
            findings.extend(found);
        }
        Ok(findings)
    }
}

/// Run a rule so that its failure cannot take the others down
fn run_isolated(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<Finding> {
    match catch_unwind(AssertUnwindSafe(|| rule.detect(ctx))) {
        Ok(Ok(findings)) => findings,
        Ok(Err(err)) => {
            warn!(rule = rule.name(), registration = %ctx.registration.title(), %err, "rule failed; skipped");
            Vec::new()
        }
        Err(_) => {
            warn!(rule = rule.name(), registration = %ctx.registration.title(), "rule panicked; skipped");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{RuleInfo, TYPE_MISMATCH};

    const SOURCE: &str = r#"using AutoMapper;
namespace Shop
{
    public class Person { public string Age { get; set; } public string Name { get; set; } }
    public class PersonDto { public int Age { get; set; } public string Name { get; set; } }
    public class ShopProfile : Profile
    {
        public ShopProfile()
        {
            CreateMap<Person, PersonDto>();
            CreateMap<Person, PersonDto>();
        }
    }
}
"#;

    fn compilation() -> Compilation {
        Compilation::from_sources([("Profile.cs", SOURCE)]).unwrap()
    }

    struct Failing;

    impl Rule for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn produces(&self) -> &'static [RuleInfo] {
            &[TYPE_MISMATCH]
        }
        fn detect(&self, _ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
            Err(Error::Rule {
                rule: "failing".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct Panicking;

    impl Rule for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn produces(&self) -> &'static [RuleInfo] {
            &[TYPE_MISMATCH]
        }
        fn detect(&self, _ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
            panic!("rule bug")
        }
    }

    #[test]
    fn test_findings_sorted_and_attributed() {
        let analysis = Engine::new(AnalyzerConfig::default()).analyze(&compilation()).unwrap();
        let ids: Vec<&str> = analysis.findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["AM001", "AM001", "AM041"]);
        assert_eq!(analysis.findings[2].registration, Some(1));
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let parallel = Engine::new(AnalyzerConfig::default()).analyze(&compilation()).unwrap();
        let sequential = Engine::new(AnalyzerConfig {
            parallel: false,
            ..AnalyzerConfig::default()
        })
        .analyze(&compilation())
        .unwrap();
        assert_eq!(parallel.findings, sequential.findings);
    }

    #[test]
    fn test_config_disables_and_remaps() {
        let mut config = AnalyzerConfig::from_yaml("rules:\n  AM001:\n    severity: info\n").unwrap();
        config.set_enabled("AM041", false);
        let analysis = Engine::new(config).analyze(&compilation()).unwrap();
        assert_eq!(analysis.findings.len(), 2);
        assert!(analysis.findings.iter().all(|f| f.severity == Severity::Info));
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_failing_rules_are_isolated() {
        let engine = Engine::with_rules(
            vec![
                Box::new(Failing),
                Box::new(Panicking),
                Box::new(super::super::DuplicateRule),
            ],
            AnalyzerConfig::default(),
        );
        let analysis = engine.analyze(&compilation()).unwrap();
        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].rule_id, "AM041");
    }

    #[test]
    fn test_cancelled_pass_has_no_findings() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Engine::new(AnalyzerConfig::default()).analyze_with(&compilation(), &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
