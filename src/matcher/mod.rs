//! Structural matching of compiled templates against attributed trees.

mod bindings;

pub use bindings::{BindingSet, Captured};

use crate::template::{Parameter, Pattern, Template};
use crate::tree::catalog::{TypeBindings, TypeCatalog};
use crate::tree::types::{JavaType, TypeParam};
use crate::tree::{Node, NodeKind, NodeRef, Symbol};

/// Matches templates of one rule.
///
/// Matching is total: "no match" is `None`, never an error.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    catalog: &'a TypeCatalog,
    type_params: &'a [TypeParam],
}

struct Attempt<'t> {
    template: &'t Template,
    bindings: BindingSet,
    types: TypeBindings<'t>,
}

impl<'a> Matcher<'a> {
    pub fn new(catalog: &'a TypeCatalog, type_params: &'a [TypeParam]) -> Self {
        Self { catalog, type_params }
    }

    /// Matches one template against `node`.
    ///
    /// Structure and parameter types are checked first; predicates run
    /// afterwards in parameter declaration order and any failure rejects the
    /// whole template.
    pub fn match_template(&self, template: &'a Template, node: &NodeRef) -> Option<BindingSet> {
        let pattern = template.pattern.as_ref()?;
        let mut attempt = Attempt {
            template,
            bindings: BindingSet::new(),
            types: TypeBindings::new(self.type_params),
        };
        if !self.match_pattern(pattern, node, &mut attempt) {
            return None;
        }

        for param in &template.params {
            let Some(predicate) = &param.predicate else {
                continue;
            };
            let accepted = match attempt.bindings.get(&param.name) {
                Some(Captured::Single(node)) => predicate.test(node),
                Some(Captured::Repeated(nodes)) => nodes.iter().all(|n| predicate.test(n)),
                None => true,
            };
            if !accepted {
                return None;
            }
        }

        let mut bindings = attempt.bindings;
        bindings.set_types(attempt.types.into_map());
        Some(bindings)
    }

    /// Tries `templates` in order and returns the index and bindings of the
    /// first one that matches.
    pub fn match_first(&self, templates: &'a [Template], node: &NodeRef) -> Option<(usize, BindingSet)> {
        templates
            .iter()
            .enumerate()
            .find_map(|(i, template)| self.match_template(template, node).map(|b| (i, b)))
    }

    fn match_pattern(&self, pattern: &Pattern, node: &NodeRef, attempt: &mut Attempt<'a>) -> bool {
        match pattern {
            Pattern::MetaRef(name) => {
                let template = attempt.template;
                let Some(param) = template.param(name) else {
                    return false;
                };
                !param.repeated
                    && is_capturable(node)
                    && self.has_type(node, param, attempt)
                    && attempt.bindings.bind(name, node)
            }
            Pattern::Literal(expected) => node.children.is_empty() && self.same_leaf(expected, node),
            Pattern::Structural {
                kind,
                text,
                symbol,
                children,
            } => {
                if *kind != node.kind {
                    return false;
                }
                let header_matches = match kind {
                    NodeKind::NewObject => self.symbols_agree(symbol.as_ref(), node.symbol.as_ref()),
                    NodeKind::MethodInvocation | NodeKind::FieldAccess => {
                        *text == node.text && self.symbols_agree(symbol.as_ref(), node.symbol.as_ref())
                    }
                    _ => *text == node.text,
                };
                if !header_matches {
                    return false;
                }
                if *kind == NodeKind::Arguments {
                    if let Some(at) = self.repeated_position(children, attempt) {
                        return self.match_run(children, at, &node.children, attempt);
                    }
                }
                children.len() == node.children.len()
                    && children
                        .iter()
                        .zip(&node.children)
                        .all(|(p, n)| self.match_pattern(p, n, attempt))
            }
        }
    }

    fn repeated_position(&self, children: &[Pattern], attempt: &Attempt) -> Option<usize> {
        children.iter().position(|child| {
            matches!(child, Pattern::MetaRef(name)
                if attempt.template.param(name).is_some_and(|p| p.repeated))
        })
    }

    /// Matches an argument list whose pattern holds a repeated parameter at
    /// `at`: fixed patterns on both sides, the run in between.
    fn match_run(&self, patterns: &[Pattern], at: usize, nodes: &[NodeRef], attempt: &mut Attempt<'a>) -> bool {
        let (prefix, rest) = patterns.split_at(at);
        let (repeated, suffix) = match rest.split_first() {
            Some((Pattern::MetaRef(name), suffix)) => (name, suffix),
            _ => return false,
        };
        if nodes.len() < prefix.len() + suffix.len() {
            return false;
        }
        let run_end = nodes.len() - suffix.len();
        let fixed_match = prefix
            .iter()
            .zip(&nodes[..at])
            .chain(suffix.iter().zip(&nodes[run_end..]))
            .all(|(p, n)| self.match_pattern(p, n, attempt));
        if !fixed_match {
            return false;
        }

        let template = attempt.template;
        let Some(param) = template.param(repeated) else {
            return false;
        };
        let run = &nodes[at..run_end];
        run.iter()
            .all(|n| is_capturable(n) && self.has_type(n, param, attempt))
            && attempt.bindings.bind_repeated(repeated, run.to_vec())
    }

    fn has_type(&self, node: &Node, param: &Parameter, attempt: &mut Attempt<'a>) -> bool {
        // a null literal says nothing about the type it stands for
        let ty = match &node.ty {
            JavaType::Null => &JavaType::Unknown,
            ty => ty,
        };
        self.catalog.is_assignable(ty, &param.ty, &mut attempt.types)
    }

    fn same_leaf(&self, expected: &Node, node: &Node) -> bool {
        if expected.kind != node.kind {
            return false;
        }
        match (&expected.symbol, &node.symbol) {
            (Some(Symbol::Type(a)), Some(Symbol::Type(b))) => a == b,
            (Some(Symbol::Type(_)), _) => false,
            (expected_symbol, node_symbol) => {
                expected.text == node.text && self.symbols_agree(expected_symbol.as_ref(), node_symbol.as_ref())
            }
        }
    }

    /// Template symbols constrain the tree when both sides resolved; an
    /// unresolved tree symbol is accepted since its receiver type was
    /// already checked.
    fn symbols_agree(&self, expected: Option<&Symbol>, actual: Option<&Symbol>) -> bool {
        let (Some(expected), Some(actual)) = (expected, actual) else {
            return true;
        };
        match (expected, actual) {
            (Symbol::Method { owner: a, name: x }, Symbol::Method { owner: b, name: y })
            | (Symbol::Field { owner: a, name: x }, Symbol::Field { owner: b, name: y }) => {
                x == y && (self.catalog.is_subclass(a, b) || self.catalog.is_subclass(b, a))
            }
            (Symbol::Type(a), Symbol::Type(b)) => a == b,
            (Symbol::Local(a), Symbol::Local(b)) => a == b,
            _ => false,
        }
    }
}

/// Only value-producing expressions can be captured.
fn is_capturable(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Empty | NodeKind::Arguments | NodeKind::LambdaParams => false,
        kind if kind.is_statement() => false,
        NodeKind::Other(kind) => !kind.ends_with("_statement") && !kind.ends_with("_declaration"),
        _ => !matches!(node.symbol, Some(Symbol::Type(_))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Java;
    use crate::template::{Predicate, TemplateContext, compile_template};
    use crate::tree::types::{Primitive, TypeNames};
    use crate::tree::unparenthesize;

    struct Fixture {
        catalog: TypeCatalog,
        names: TypeNames,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: TypeCatalog::builtin(),
                names: TypeNames::new().with_import("java.util.List"),
            }
        }

        fn template(&self, params: &[Parameter], body: &str, type_params: &[TypeParam]) -> Vec<Template> {
            let ctx = TemplateContext {
                names: &self.names,
                type_params,
                catalog: &self.catalog,
            };
            compile_template(params, body, &ctx).unwrap()
        }

        /// Lowers `expr` inside a method with the given locals and returns it.
        fn expr(&self, locals: &str, expr: &str) -> NodeRef {
            let source = format!(
                "import java.util.List;\nclass T {{ Object run({locals}) {{ return {expr}; }} }}"
            );
            let unit = Java.parse_unit("T.java", &source, &self.catalog).unwrap();
            let mut found = None;
            unit.root.walk(&mut |node: &Node| {
                if found.is_none() && node.kind == NodeKind::Return {
                    found = node.children.first().cloned();
                }
            });
            unparenthesize(&found.unwrap())
        }
    }

    fn string(name: &str) -> Parameter {
        Parameter::new(name, JavaType::string())
    }

    #[test]
    fn test_binary_match_captures_receiver() {
        let fx = Fixture::new();
        let templates = fx.template(&[string("s")], "s.length() == 0", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);

        let bindings = matcher
            .match_template(&templates[0], &fx.expr("String x", "x.length() == 0"))
            .unwrap();
        assert_eq!(bindings.node("s").map(|n| n.text()), Some("x"));

        assert!(matcher.match_template(&templates[0], &fx.expr("String x", "x.length() == 1")).is_none());
    }

    #[test]
    fn test_parameter_type_must_be_assignable() {
        let fx = Fixture::new();
        let templates = fx.template(&[string("s")], "s.isEmpty()", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);
        assert!(matcher.match_template(&templates[0], &fx.expr("List<String> x", "x.isEmpty()")).is_none());
        assert!(matcher.match_template(&templates[0], &fx.expr("String x", "x.isEmpty()")).is_some());
    }

    #[test]
    fn test_reused_parameter_needs_equal_captures() {
        let fx = Fixture::new();
        let templates = fx.template(&[Parameter::new("o", JavaType::Primitive(Primitive::Int))], "o == o", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);
        assert!(matcher.match_template(&templates[0], &fx.expr("int x", "x == x")).is_some());
        assert!(matcher.match_template(&templates[0], &fx.expr("int x, int y", "x == y")).is_none());
    }

    #[test]
    fn test_type_variables_bind_consistently() {
        let fx = Fixture::new();
        let type_params = [TypeParam::new("T")];
        let t = JavaType::TypeVar("T".into());
        let names = fx.names.clone().with_type_var("T");
        let ctx = TemplateContext {
            names: &names,
            type_params: &type_params,
            catalog: &fx.catalog,
        };
        let templates = compile_template(
            &[Parameter::new("a", t.clone()), Parameter::new("b", t)],
            "a.equals(b)",
            &ctx,
        )
        .unwrap();
        let matcher = Matcher::new(&fx.catalog, &type_params);

        let bindings = matcher
            .match_template(&templates[0], &fx.expr("String x, String y", "x.equals(y)"))
            .unwrap();
        assert_eq!(bindings.type_of("T"), Some(&JavaType::string()));
        assert!(matcher
            .match_template(&templates[0], &fx.expr("String x, Integer y", "x.equals(y)"))
            .is_none());
    }

    #[test]
    fn test_repeated_parameter_captures_run() {
        let fx = Fixture::new();
        let args = Parameter::new("args", JavaType::Array(Box::new(JavaType::object()))).repeated();
        let templates = fx.template(&[string("fmt"), args], "String.format(fmt, args)", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);

        let bindings = matcher
            .match_template(&templates[0], &fx.expr("String f, int a", "String.format(f, a, \"b\")"))
            .unwrap();
        match bindings.get("args") {
            Some(Captured::Repeated(run)) => assert_eq!(run.len(), 2),
            other => panic!("expected repeated capture, got {:?}", other),
        }

        let bindings = matcher
            .match_template(&templates[0], &fx.expr("String f", "String.format(f)"))
            .unwrap();
        assert!(matches!(bindings.get("args"), Some(Captured::Repeated(run)) if run.is_empty()));
    }

    #[test]
    fn test_predicates_reject_after_structure() {
        let fx = Fixture::new();
        let param = string("s").with_predicate(Predicate::IsCall.negate());
        let templates = fx.template(&[param], "s.length() == 0", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);
        assert!(matcher.match_template(&templates[0], &fx.expr("String x", "x.length() == 0")).is_some());
        assert!(matcher
            .match_template(&templates[0], &fx.expr("String x", "x.trim().length() == 0"))
            .is_none());
    }

    #[test]
    fn test_first_matching_template_wins() {
        let fx = Fixture::new();
        let mut templates = fx.template(&[string("s").with_predicate(Predicate::IsConstant)], "s.isEmpty()", &[]);
        templates.extend(fx.template(&[string("s")], "s.isEmpty()", &[]));
        let matcher = Matcher::new(&fx.catalog, &[]);

        let (index, _) = matcher.match_first(&templates, &fx.expr("String x", "x.isEmpty()")).unwrap();
        assert_eq!(index, 1);
        let (index, _) = matcher.match_first(&templates, &fx.expr("", "\"a\".isEmpty()")).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_null_only_matches_object() {
        let fx = Fixture::new();
        let templates = fx.template(&[string("s")], "java.util.Objects.isNull(s)", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);
        assert!(matcher
            .match_template(&templates[0], &fx.expr("", "java.util.Objects.isNull(null)"))
            .is_none());
    }

    #[test]
    fn test_static_receiver_compares_by_symbol() {
        let fx = Fixture::new();
        let templates = fx.template(&[string("s")], "String.valueOf(s)", &[]);
        let matcher = Matcher::new(&fx.catalog, &[]);
        assert!(matcher
            .match_template(&templates[0], &fx.expr("String x", "java.lang.String.valueOf(x)"))
            .is_some());
        assert!(matcher.match_template(&templates[0], &fx.expr("String x", "x.valueOf(x)")).is_none());
    }
}
