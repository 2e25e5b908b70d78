//! Integration tests for the rule engine.

use refactor_rules::prelude::*;
use tempfile::TempDir;

fn param(name: &str, ty: &str) -> ParamSource {
    ParamSource::new(name, ty)
}

fn string(body: &str) -> TemplateSource {
    TemplateSource::new(body).param(param("s", "String"))
}

fn string_is_empty() -> RuleDefinition {
    RuleDefinition::new("StringIsEmpty")
        .display_name("Use String.isEmpty()")
        .tag("strings")
        .before(string("s.length() == 0"))
        .before(string("s.equals(\"\")"))
        .after(string("s.isEmpty()"))
}

fn compile(config: &RuleSetConfig) -> RuleRegistry {
    let (registry, errors) = RuleRegistry::compile(config).unwrap();
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    registry
}

fn find(node: &NodeRef, pred: &dyn Fn(&Node) -> bool) -> Option<NodeRef> {
    if pred(node) {
        return Some(node.clone());
    }
    node.children.iter().find_map(|child| find(child, pred))
}

#[test]
fn test_string_is_empty_variants() {
    let registry = compile(&RuleSetConfig::new("strings").with_rule(string_is_empty()));
    let source = "\
class Test {
    boolean a(String x) { return x.length() == 0; }
    boolean b(String x) { return x.equals(\"\"); }
    boolean c(String x) { return x.length() == 1; }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();

    assert_eq!(
        result.source,
        "\
class Test {
    boolean a(String x) { return x.isEmpty(); }
    boolean b(String x) { return x.isEmpty(); }
    boolean c(String x) { return x.length() == 1; }
}
"
    );
    let variants: Vec<usize> = result.rewrites.iter().map(|r| r.variant).collect();
    assert_eq!(variants, vec![0, 1]);
    assert_eq!(result.rewrites[0].title, "Use String.isEmpty()");
    assert_eq!(result.rewrites[0].tags, vec!["strings"]);

    let diff = result.diff();
    assert!(diff.contains("-    boolean a(String x) { return x.length() == 0; }"));
    assert!(diff.contains("+    boolean a(String x) { return x.isEmpty(); }"));
}

#[test]
fn test_mixed_primitive_and_reference_variants() {
    let print = |ty: &str| TemplateSource::new("System.out.println(x)").param(param("x", ty));
    let config = RuleSetConfig::new("printing").with_import("java.util.Map").with_rule(
        RuleDefinition::new("PrintWithoutNewline")
            .before(print("double"))
            .before(print("int"))
            .before(print("Map<?, ?>"))
            .after(TemplateSource::new("System.out.print(x)").param(param("x", "Object"))),
    );
    let registry = compile(&config);
    let rule = &registry.rules()[0];

    let facts = rule.precondition.facts();
    assert!(!facts.contains(&Fact::uses_type("java.util.Map")));
    assert!(facts.iter().all(|f| matches!(f, Fact::UsesMember { .. })));

    let source = "class Test {\n    void f(int n) {\n        System.out.println(n);\n    }\n}\n";
    let unit = Java.parse_unit("Test.java", source, registry.catalog()).unwrap();
    let index = SymbolIndex::build(&unit.root, registry.catalog());
    assert!(rule.precondition.evaluate(&index));

    let result = Dispatcher::new(&registry).apply(&unit).unwrap();
    assert!(result.source.contains("        System.out.print(n);\n"), "{}", result.source);
}

#[test]
fn test_operand_order_variants_share_after_form() {
    let template = |body: &str| {
        TemplateSource::new(body)
            .param(param("list", "List<T>"))
            .param(param("x", "T"))
    };
    let config = RuleSetConfig::new("collections").with_import("java.util.List").with_rule(
        RuleDefinition::new("ListContains")
            .type_parameter("T")
            .before(template("list.indexOf(x) >= 0"))
            .before(template("0 <= list.indexOf(x)"))
            .after(template("list.contains(x)")),
    );
    let registry = compile(&config);
    let source = "\
import java.util.List;

class Test {
    boolean a(List<String> names, String y) { return names.indexOf(y) >= 0; }
    boolean b(List<String> names, String y) { return 0 <= names.indexOf(y); }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    assert_eq!(result.rewrites.len(), 2);
    assert_eq!(result.source.matches("return names.contains(y);").count(), 2, "{}", result.source);
}

#[test]
fn test_empty_after_signals_delete() {
    let config = RuleSetConfig::new("cleanup").with_rule(
        RuleDefinition::new("DropDebugPrint")
            .before(string("System.out.println(s);"))
            .after(TemplateSource::new("").param(param("s", "String"))),
    );
    let registry = compile(&config);
    let source = "class Test {\n    void f(String msg) {\n        System.out.println(msg);\n        msg.trim();\n    }\n}\n";
    let unit = Java.parse_unit("Test.java", source, registry.catalog()).unwrap();

    let dispatcher = Dispatcher::new(&registry);
    let call = find(&unit.root, &|n| n.kind == NodeKind::MethodInvocation && n.text() == "println").unwrap();
    let mut state = dispatcher.pass_state(&unit.root);
    let dispatched = dispatcher.dispatch(&call, &mut state).unwrap().unwrap();
    assert!(dispatched.outcome.is_delete());
    assert_eq!(dispatched.rule.name, "DropDebugPrint");

    let result = dispatcher.apply(&unit).unwrap();
    assert_eq!(
        result.source,
        "class Test {\n    void f(String msg) {\n        msg.trim();\n    }\n}\n"
    );
}

#[test]
fn test_throw_statement_rule() {
    let throw = |body: &str| TemplateSource::new(body).param(param("message", "String"));
    let config = RuleSetConfig::new("exceptions").with_rule(
        RuleDefinition::new("PreferIllegalArgument")
            .static_imports()
            .before(throw("throw new IllegalStateException(message);"))
            .after(throw("throw new IllegalArgumentException(message);")),
    );
    let registry = compile(&config);
    assert_eq!(
        registry.rules()[0].classifications(),
        std::collections::BTreeSet::from([NodeClassification::Statement])
    );

    let source = "\
class Test {
    void check(String reason) {
        throw new IllegalStateException(reason);
    }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    assert_eq!(
        result.source,
        "\
class Test {
    void check(String reason) {
        throw new IllegalArgumentException(reason);
    }
}
"
    );
    assert!(result.rewrites[0].hints.contains(&EmissionHint::StaticImportAlways));
    assert!(result.rewrites[0].hints.contains(&EmissionHint::ShortenNames));
}

#[test]
fn test_predicate_rejects_earlier_variant() {
    let config = RuleSetConfig::new("order").with_rule(
        RuleDefinition::new("LengthFirst")
            .before(
                TemplateSource::new("s.length() == n")
                    .param(param("s", "String"))
                    .param(param("n", "int").matches("constant")),
            )
            .before(
                TemplateSource::new("s.length() == n")
                    .param(param("s", "String"))
                    .param(param("n", "int")),
            )
            .after(
                TemplateSource::new("n == s.length()")
                    .param(param("s", "String"))
                    .param(param("n", "int")),
            ),
    );
    let registry = compile(&config);
    let source = "\
class Test {
    boolean a(String x) { return x.length() == 3; }
    boolean b(String x, int k) { return x.length() == k; }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    let variants: Vec<usize> = result.rewrites.iter().map(|r| r.variant).collect();
    assert_eq!(variants, vec![0, 1]);
    assert!(result.source.contains("return 3 == x.length();"));
    assert!(result.source.contains("return k == x.length();"));
}

#[test]
fn test_first_variant_wins_when_both_match() {
    let config = RuleSetConfig::new("order").with_rule(
        RuleDefinition::new("CharSequenceIsEmpty")
            .before(string("s.length() == 0"))
            .before(TemplateSource::new("s.length() == 0").param(param("s", "CharSequence")))
            .after(TemplateSource::new("s.isEmpty()").param(param("s", "CharSequence"))),
    );
    let registry = compile(&config);
    let source = "\
class Test {
    boolean a(String x) { return x.length() == 0; }
    boolean b(StringBuilder x) { return x.length() == 0; }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    let variants: Vec<usize> = result.rewrites.iter().map(|r| r.variant).collect();
    assert_eq!(variants, vec![0, 1]);
}

#[test]
fn test_rewritten_output_is_stable() {
    let registry = compile(&RuleSetConfig::new("strings").with_rule(string_is_empty()));
    let dispatcher = Dispatcher::new(&registry);
    let source = "class Test {\n    boolean f(String x) { return x.length() == 0 || x.equals(\"\"); }\n}\n";

    let first = dispatcher.apply_source("Test.java", source).unwrap();
    assert_eq!(first.rewrites.len(), 2);
    assert!(first.source.contains("return x.isEmpty() || x.isEmpty();"));

    let second = dispatcher.apply_source("Test.java", &first.source).unwrap();
    assert!(!second.changed());
    assert_eq!(second.source, first.source);
}

#[test]
fn test_repeated_parameter_requires_equal_operands() {
    let config = RuleSetConfig::new("logic").with_rule(
        RuleDefinition::new("SelfEquality")
            .before(TemplateSource::new("o == o").param(param("o", "int")))
            .after(TemplateSource::new("true").param(param("o", "int"))),
    );
    let registry = compile(&config);
    let source = "\
class Test {
    boolean p(int a, int b) { return a == a; }
    boolean q(int a, int b) { return a == b; }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    assert_eq!(result.rewrites.len(), 1);
    assert!(result.source.contains("boolean p(int a, int b) { return true; }"));
    assert!(result.source.contains("boolean q(int a, int b) { return a == b; }"));
}

#[test]
fn test_varargs_run_is_moved_to_after() {
    let config = RuleSetConfig::new("collections")
        .with_import("java.util.Arrays")
        .with_import("java.util.List")
        .with_rule(
            RuleDefinition::new("ListOf")
                .before(TemplateSource::new("Arrays.asList(items)").param(param("items", "Object[]").repeated()))
                .after(TemplateSource::new("List.of(items)").param(param("items", "Object[]").repeated())),
        );
    let registry = compile(&config);
    let source = "\
import java.util.Arrays;
import java.util.List;

class Test {
    void f(String a, String b) {
        List<String> three = Arrays.asList(a, b, \"c\");
        List<String> none = Arrays.asList();
    }
}
";
    let result = Dispatcher::new(&registry).apply_source("Test.java", source).unwrap();
    assert!(result.source.contains("List<String> three = List.of(a, b, \"c\");"), "{}", result.source);
    assert!(result.source.contains("List<String> none = List.of();"), "{}", result.source);
}

#[test]
fn test_units_are_processed_in_parallel() {
    let registry = compile(&RuleSetConfig::new("strings").with_rule(string_is_empty()));
    let units: Vec<SourceUnit> = (0..4)
        .map(|i| {
            let source = if i % 2 == 0 {
                format!("class Unit{i} {{ boolean f(String s) {{ return s.length() == 0; }} }}")
            } else {
                format!("class Unit{i} {{ int f(String s) {{ return s.length(); }} }}")
            };
            Java.parse_unit(&format!("Unit{i}.java"), &source, registry.catalog()).unwrap()
        })
        .collect();

    let results = Dispatcher::new(&registry).apply_all(&units);
    assert_eq!(results.len(), 4);
    let mut total = DiffSummary::default();
    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        assert_eq!(result.name, format!("Unit{i}.java"));
        assert_eq!(result.changed(), i % 2 == 0);
        total.merge(&result.summary());
    }
    assert_eq!(total.to_string(), "2 unit(s) changed, 2 insertions(+), 2 deletions(-)");
}

#[test]
fn test_yaml_rule_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.yaml");

    let config = RuleSetConfig::new("strings").with_rule(string_is_empty());
    config.to_yaml(&path).unwrap();
    let loaded = RuleSetConfig::from_yaml(&path).unwrap();
    assert_eq!(loaded, config);

    let registry = compile(&loaded);
    let result = Dispatcher::new(&registry)
        .apply_source("Test.java", "class Test { boolean f(String x) { return x.equals(\"\"); } }")
        .unwrap();
    assert!(result.source.contains("return x.isEmpty();"));
}

#[test]
fn test_malformed_rules_are_reported_by_name() {
    let yaml = r#"
name: mixed
rules:
  - name: Good
    before:
      - params: [{ name: s, type: String }]
        body: s.length() == 0
    after:
      params: [{ name: s, type: String }]
      body: s.isEmpty()
  - name: Unbound
    before:
      - params: [{ name: s, type: String }]
        body: s.trim()
    after:
      params: [{ name: s, type: String }, { name: t, type: String }]
      body: s.concat(t)
  - name: TwoAfters
    before:
      - params: [{ name: s, type: String }]
        body: s.trim()
    after:
      - params: [{ name: s, type: String }]
        body: s.strip()
      - params: [{ name: s, type: String }]
        body: s
  - name: UnknownPredicate
    before:
      - params: [{ name: s, type: String, matches: regex }]
        body: s.trim()
    after:
      params: [{ name: s, type: String }]
      body: s.strip()
  - name: BadType
    before:
      - params: [{ name: m, type: "Map<String" }]
        body: m.isEmpty()
    after:
      params: [{ name: m, type: "Map<String" }]
      body: m.isEmpty()
  - name: Narrowing
    before:
      - params: [{ name: s, type: Object }]
        body: s.hashCode()
    after:
      params: [{ name: s, type: String }]
      body: s.length()
"#;
    let config = RuleSetConfig::from_yaml_str(yaml).unwrap();
    let (registry, errors) = RuleRegistry::compile(&config).unwrap();

    assert_eq!(registry.len(), 1);
    let names: Vec<_> = errors.iter().filter_map(|e| e.rule_name()).collect();
    assert_eq!(
        names,
        vec!["Unbound", "TwoAfters", "UnknownPredicate", "BadType", "Narrowing"]
    );
    assert!(errors.iter().all(|e| matches!(e, RuleError::MalformedRule { .. })));
    assert!(matches!(
        &errors[0],
        RuleError::MalformedRule {
            reason: MalformedReason::UnboundAfterParameter(name),
            ..
        } if name == "t"
    ));
    assert!(matches!(
        &errors[1],
        RuleError::MalformedRule {
            reason: MalformedReason::MultipleAfterTemplates,
            ..
        }
    ));
}
