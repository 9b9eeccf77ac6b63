//! End-to-end analysis and fix scenarios

use mapcheck::diagnostic::props;
use mapcheck::{
    apply_action, fix_all, synthesize_fixes, AnalyzerConfig, Compilation, Engine, FixConfidence,
    FixContext, FixOptions,
};
use pretty_assertions::assert_eq;

fn profile(types: &str, body: &str) -> String {
    format!(
        "using AutoMapper;\nusing System.Collections.Generic;\nnamespace Shop\n{{\n{}\n    public class ShopProfile : Profile\n    {{\n        public ShopProfile()\n        {{\n{}\n        }}\n    }}\n}}\n",
        types, body
    )
}

fn compile(text: &str) -> Compilation {
    Compilation::from_sources([("Profile.cs", text)]).unwrap()
}

fn engine() -> Engine {
    Engine::new(AnalyzerConfig::default())
}

fn text_of(compilation: &Compilation) -> String {
    compilation.documents()[0].text.to_string()
}

#[test]
fn test_redundant_map_from_is_removed() {
    let text = profile(
        "    public class User { public string Name { get; set; } }\n    public class UserDto { public string Name { get; set; } }",
        "            CreateMap<User, UserDto>()\n                .ForMember(d => d.Name, o => o.MapFrom(s => s.Name));",
    );
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    assert_eq!(analysis.findings.len(), 1);
    let finding = &analysis.findings[0];
    assert_eq!(finding.rule_id, "AM050");
    let directive = text.find(".ForMember").unwrap() + 1;
    assert_eq!(finding.span.start_byte, directive);

    let ctx = FixContext {
        compilation: &compilation,
        analysis: &analysis,
    };
    let actions = synthesize_fixes(finding, &ctx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].confidence, FixConfidence::High);

    let fixed = apply_action(&compilation, &actions[0]).unwrap();
    let expected = profile(
        "    public class User { public string Name { get; set; } }\n    public class UserDto { public string Name { get; set; } }",
        "            CreateMap<User, UserDto>();",
    );
    assert_eq!(text_of(&fixed), expected);
    assert!(engine().analyze(&fixed).unwrap().findings.is_empty());
}

#[test]
fn test_string_to_int_offers_conversion_and_ignore() {
    let text = profile(
        "    public class Person { public string Age { get; set; } }\n    public class PersonDto { public int Age { get; set; } }",
        "            CreateMap<Person, PersonDto>();",
    );
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    assert_eq!(analysis.findings.len(), 1);
    let finding = &analysis.findings[0];
    assert_eq!(finding.rule_id, "AM001");
    assert!(finding.message.contains("'Age'"));
    assert!(finding.message.contains("'string'"));
    assert!(finding.message.contains("'int'"));

    let ctx = FixContext {
        compilation: &compilation,
        analysis: &analysis,
    };
    let actions = synthesize_fixes(finding, &ctx);
    let titles: Vec<&str> = actions.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Map 'Age' with int.Parse(src.Age)", "Ignore 'Age'"]);

    for action in &actions {
        let fixed = apply_action(&compilation, action).unwrap();
        assert!(engine().analyze(&fixed).unwrap().findings.is_empty(), "{}", action.title);
    }
}

#[test]
fn test_missing_nested_mapping_is_registered() {
    let types = "    public class Address { public string City { get; set; } }\n    public class AddressDto { public string City { get; set; } }\n    public class User { public string Name { get; set; } public Address Address { get; set; } }\n    public class UserDto { public string Name { get; set; } public AddressDto Address { get; set; } }";
    let text = profile(types, "            CreateMap<User, UserDto>();");
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].rule_id, "AM020");
    assert_eq!(
        analysis.findings[0].property(props::MISSING_PAIRS),
        Some("Address=>AddressDto")
    );

    let (fixed, result) = fix_all(&engine(), &compilation, &FixOptions::default()).unwrap();
    assert_eq!(result.applied.len(), 1);
    let expected = profile(
        types,
        "            CreateMap<User, UserDto>();\n            CreateMap<Address, AddressDto>();",
    );
    assert_eq!(text_of(&fixed), expected);
    assert!(engine().analyze(&fixed).unwrap().findings.is_empty());
}

#[test]
fn test_reverse_map_duplicate_reported_once_at_later_site() {
    let types = "    public class Order { public int Id { get; set; } }\n    public class OrderDto { public int Id { get; set; } }";
    let text = profile(
        types,
        "            CreateMap<Order, OrderDto>().ReverseMap();\n            CreateMap<OrderDto, Order>();",
    );
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    assert_eq!(analysis.findings.len(), 1);
    let finding = &analysis.findings[0];
    assert_eq!(finding.rule_id, "AM041");
    assert_eq!(finding.span.start_byte, text.find("CreateMap<OrderDto, Order>").unwrap());
    assert_eq!(finding.property(props::REVERSE_REGISTRATION), Some("0"));

    let ctx = FixContext {
        compilation: &compilation,
        analysis: &analysis,
    };
    let actions = synthesize_fixes(finding, &ctx);
    assert_eq!(actions.len(), 2);

    let without_reverse = apply_action(&compilation, &actions[0]).unwrap();
    assert_eq!(
        text_of(&without_reverse),
        profile(
            types,
            "            CreateMap<Order, OrderDto>();\n            CreateMap<OrderDto, Order>();"
        )
    );
    let without_statement = apply_action(&compilation, &actions[1]).unwrap();
    assert_eq!(
        text_of(&without_statement),
        profile(types, "            CreateMap<Order, OrderDto>().ReverseMap();")
    );
    for fixed in [&without_reverse, &without_statement] {
        assert!(engine().analyze(fixed).unwrap().findings.is_empty());
    }
}

#[test]
fn test_collection_fixes() {
    let types = "    public class Bag { public HashSet<string> Tags { get; set; } public List<string> Codes { get; set; } public List<int> Numbers { get; set; } }\n    public class BagDto { public List<string> Tags { get; set; } public List<int> Codes { get; set; } public List<string> Numbers { get; set; } }";
    let text = profile(types, "            CreateMap<Bag, BagDto>();");
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    let ids: Vec<&str> = analysis.findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["AM003", "AM021", "AM021"]);

    let ctx = FixContext {
        compilation: &compilation,
        analysis: &analysis,
    };
    let first_call = |index: usize| synthesize_fixes(&analysis.findings[index], &ctx)[0].edits[0].replacement.clone();
    assert_eq!(
        first_call(0),
        ".ForMember(dest => dest.Tags, opt => opt.MapFrom(src => src.Tags.ToList()))"
    );
    assert_eq!(
        first_call(1),
        ".ForMember(dest => dest.Codes, opt => opt.MapFrom(src => src.Codes.Select(x => int.Parse(x)).ToList()))"
    );
    assert_eq!(
        first_call(2),
        ".ForMember(dest => dest.Numbers, opt => opt.MapFrom(src => src.Numbers.Select(x => x.ToString()).ToList()))"
    );

    let (fixed, result) = fix_all(&engine(), &compilation, &FixOptions::default()).unwrap();
    assert_eq!(result.applied.len(), 3);
    assert!(result.errors.is_empty());
    assert!(engine().analyze(&fixed).unwrap().findings.is_empty());
}

#[test]
fn test_complex_elements_offer_registration_alternative() {
    let types = "    public class Item { public int Id { get; set; } }\n    public class ItemDto { public int Id { get; set; } }\n    public class Cart { public List<Item> Items { get; set; } }\n    public class CartDto { public List<ItemDto> Items { get; set; } }";
    let text = profile(types, "            CreateMap<Cart, CartDto>();");
    let compilation = compile(&text);
    let analysis = engine().analyze(&compilation).unwrap();
    assert_eq!(analysis.findings.len(), 1);

    let ctx = FixContext {
        compilation: &compilation,
        analysis: &analysis,
    };
    let actions = synthesize_fixes(&analysis.findings[0], &ctx);
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].confidence, FixConfidence::Low);
    assert_eq!(actions[1].edits[0].replacement, "\n            CreateMap<Item, ItemDto>();");

    // the identity projection needs review, so only the registration is applied
    let (fixed, result) = fix_all(&engine(), &compilation, &FixOptions::default()).unwrap();
    assert!(result.skipped.is_empty());
    assert_eq!(result.applied, vec!["AM020:register-nested:Item=>ItemDto"]);
    assert!(engine().analyze(&fixed).unwrap().findings.is_empty());
}

#[test]
fn test_fix_all_is_idempotent() {
    let text = profile(
        "    public class A { public string N { get; set; } public int? Score { get; set; } public int Extra { get; set; } }\n    public class B { public int N { get; set; } public int Score { get; set; } public string Missing { get; set; } }",
        "            CreateMap<A, B>()\n                .ReverseMap();",
    );
    let compilation = compile(&text);
    let (once, first) = fix_all(&engine(), &compilation, &FixOptions::default()).unwrap();
    assert!(!first.applied.is_empty());
    assert!(first.errors.is_empty());

    let (twice, second) = fix_all(&engine(), &once, &FixOptions::default()).unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(text_of(&twice), text_of(&once));
    assert!(text_of(&once).ends_with(".ReverseMap();\n        }\n    }\n}\n"));
}
