//! Property-based tests over generated type pairs
//!
//! Uses proptest to generate member lists and check analysis invariants

use mapcheck::diagnostic::props;
use mapcheck::{fix_all, AnalyzerConfig, Compilation, Engine, FixOptions, Severity};
use proptest::prelude::*;
use std::collections::BTreeMap;

const NAMES: &[&str] = &["Id", "Name", "Age", "Code", "Total", "Created", "Active"];
const TYPES: &[&str] = &["int", "long", "string", "bool", "decimal", "double", "DateTime", "Guid", "int?"];

fn members() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(NAMES).prop_map(str::to_string),
        prop::sample::select(TYPES).prop_map(str::to_string),
        1..6,
    )
}

fn class(name: &str, members: &BTreeMap<String, String>, required: Option<&str>) -> String {
    let body: Vec<String> = members
        .iter()
        .map(|(member, ty)| {
            let modifier = if required == Some(member.as_str()) { "required " } else { "" };
            format!("public {}{} {} {{ get; set; }}", modifier, ty, member)
        })
        .collect();
    format!("    public class {} {{ {} }}", name, body.join(" "))
}

fn profile_with(src: &str, dst: &str, registration: &str) -> String {
    format!(
        "using System;\nusing AutoMapper;\nnamespace Shop\n{{\n{}\n{}\n    public class ShopProfile : Profile\n    {{\n        public ShopProfile()\n        {{\n            {}\n        }}\n    }}\n}}\n",
        src, dst, registration
    )
}

fn source(src: &BTreeMap<String, String>, dst: &BTreeMap<String, String>) -> String {
    profile_with(&class("Src", src, None), &class("Dst", dst, None), "CreateMap<Src, Dst>();")
}

fn compile(text: &str) -> Compilation {
    Compilation::from_sources([("Profile.cs", text)]).unwrap()
}

proptest! {
    #[test]
    fn test_identical_types_have_no_findings(shape in members()) {
        let compilation = compile(&source(&shape, &shape));
        let analysis = Engine::new(AnalyzerConfig::default()).analyze(&compilation).unwrap();
        prop_assert!(analysis.findings.is_empty(), "{:?}", analysis.findings);
    }

    #[test]
    fn test_parallel_and_sequential_agree(src in members(), dst in members()) {
        let text = source(&src, &dst);
        let doubled = text.replace(
            "CreateMap<Src, Dst>();",
            "CreateMap<Src, Dst>();\n            CreateMap<Dst, Src>();",
        );
        let compilation = compile(&doubled);
        let parallel = Engine::new(AnalyzerConfig::default()).analyze(&compilation).unwrap();
        let sequential = Engine::new(AnalyzerConfig { parallel: false, ..AnalyzerConfig::default() })
            .analyze(&compilation)
            .unwrap();
        prop_assert_eq!(parallel.findings, sequential.findings);
    }

    #[test]
    fn test_findings_point_into_the_registration(src in members(), dst in members()) {
        let text = source(&src, &dst);
        let compilation = compile(&text);
        let analysis = Engine::new(AnalyzerConfig::default()).analyze(&compilation).unwrap();
        for finding in &analysis.findings {
            prop_assert_eq!(finding.registration, Some(0));
            prop_assert_eq!(&text[finding.span.range()], "CreateMap<Src, Dst>()");
            prop_assert!(!finding.message.contains('{'), "unfilled template in {:?}", finding.message);
        }
    }

    #[test]
    fn test_disabled_rules_never_report(src in members(), dst in members()) {
        let mut config = AnalyzerConfig::from_yaml("rules:\n  AM006:\n    severity: error\n").unwrap();
        config.set_enabled("AM001", false);
        let analysis = Engine::new(config).analyze(&compilation_of(&src, &dst)).unwrap();
        prop_assert!(analysis.findings.iter().all(|f| f.rule_id != "AM001"));
        prop_assert!(analysis
            .findings
            .iter()
            .filter(|f| f.rule_id == "AM006")
            .all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn test_ignored_member_is_never_reported(
        src in members(),
        dst in members(),
        pick in any::<prop::sample::Index>(),
        required in any::<bool>(),
    ) {
        let names: Vec<&String> = dst.keys().collect();
        let ignored = pick.get(&names).as_str();
        let text = profile_with(
            &class("Src", &src, None),
            &class("Dst", &dst, required.then_some(ignored)),
            &format!("CreateMap<Src, Dst>().ForMember(d => d.{}, o => o.Ignore());", ignored),
        );
        let analysis = Engine::new(AnalyzerConfig::default()).analyze(&compile(&text)).unwrap();
        for finding in &analysis.findings {
            let about_ignored = finding.property(props::MEMBER) == Some(ignored);
            let missing_or_incompatible =
                matches!(finding.rule_id.as_str(), "AM001" | "AM002" | "AM006" | "AM011");
            prop_assert!(
                !(about_ignored && missing_or_incompatible),
                "{} reported for ignored '{}'",
                finding.rule_id,
                ignored
            );
        }
    }

    #[test]
    fn test_fix_all_reaches_a_fixed_point(src in members(), dst in members()) {
        let engine = Engine::new(AnalyzerConfig::default());
        let (once, first) = fix_all(&engine, &compilation_of(&src, &dst), &FixOptions::default()).unwrap();
        prop_assert!(first.errors.is_empty(), "{:?}", first.errors);

        let (twice, second) = fix_all(&engine, &once, &FixOptions::default()).unwrap();
        prop_assert!(second.applied.is_empty());
        prop_assert_eq!(&*once.documents()[0].text, &*twice.documents()[0].text);
    }
}

fn compilation_of(src: &BTreeMap<String, String>, dst: &BTreeMap<String, String>) -> Compilation {
    compile(&source(src, dst))
}
