//! One rewrite pass over a compilation unit.

use crate::diff::{DiffSummary, unified_diff};
use crate::error::Result;
use crate::index::SymbolIndex;
use crate::lang::{Java, SourceUnit};
use crate::precondition::ApplicabilityIndex;
use crate::registry::RuleRegistry;
use crate::rewrite::{RewriteOutcome, rewrite, simplify_booleans};
use crate::rule::{EmissionHint, Rule};
use crate::template::NodeClassification;
use crate::tree::catalog::TypeCatalog;
use crate::tree::print::{Edit, apply_edits, deletion_span, precedence, render};
use crate::tree::{Node, NodeKind, NodeRef, Symbol, unparenthesize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Mutable state of a single pass: the unit's symbol index and the
/// precondition result of every rule consulted so far.
#[derive(Debug)]
pub struct PassState<'r> {
    index: SymbolIndex<'r>,
    cache: HashMap<usize, bool>,
}

impl<'r> PassState<'r> {
    pub fn new(root: &Node, catalog: &'r TypeCatalog) -> Self {
        Self {
            index: SymbolIndex::build(root, catalog),
            cache: HashMap::new(),
        }
    }

    /// Evaluates a rule's precondition at most once per pass.
    fn applicable(&mut self, id: usize, rule: &Rule) -> bool {
        if let Some(known) = self.cache.get(&id) {
            return *known;
        }
        let applicable = rule.precondition.evaluate(&self.index);
        trace!(rule = %rule.name, applicable, "evaluated precondition");
        self.cache.insert(id, applicable);
        applicable
    }

    pub fn index(&self) -> &dyn ApplicabilityIndex {
        &self.index
    }

    /// Number of rules whose precondition has been evaluated.
    pub fn evaluated(&self) -> usize {
        self.cache.len()
    }
}

/// The first accepted rewrite for a node.
#[derive(Debug, Clone)]
pub struct Dispatched<'r> {
    pub rule_id: usize,
    pub rule: &'r Rule,
    /// Index of the matching before variant.
    pub variant: usize,
    pub outcome: RewriteOutcome,
}

/// A rewrite applied during a pass.
#[derive(Debug, Clone)]
pub struct AppliedRewrite {
    pub rule: String,
    pub title: String,
    pub tags: Vec<String>,
    pub variant: usize,
    /// Byte range of the source text that was replaced or removed.
    pub span: Range<usize>,
    pub outcome: RewriteOutcome,
    pub hints: Vec<EmissionHint>,
}

/// Result of rewriting one compilation unit.
#[derive(Debug, Clone)]
pub struct UnitRewrite {
    pub name: String,
    /// The rewritten tree; untouched subtrees are shared with the input.
    pub tree: NodeRef,
    pub rewrites: Vec<AppliedRewrite>,
    pub edits: Vec<Edit>,
    pub original: String,
    /// Source text with every edit applied.
    pub source: String,
}

impl UnitRewrite {
    pub fn changed(&self) -> bool {
        !self.rewrites.is_empty()
    }

    /// Unified diff between the original and rewritten source.
    pub fn diff(&self) -> String {
        unified_diff(&self.original, &self.source, &self.name)
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diff(&self.original, &self.source)
    }
}

/// Runs a [`RuleRegistry`] over compilation units.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn pass_state(&self, root: &Node) -> PassState<'r> {
        PassState::new(root, self.registry.catalog())
    }

    /// Offers `node` to the candidate rules of its classification in
    /// declaration order and returns the first accepted rewrite.
    ///
    /// Rules whose precondition is false for the unit are never matched.
    pub fn dispatch(&self, node: &NodeRef, state: &mut PassState<'r>) -> Result<Option<Dispatched<'r>>> {
        let Some(classification) = NodeClassification::of(node) else {
            return Ok(None);
        };
        let catalog = self.registry.catalog();
        for &rule_id in self.registry.candidates(classification) {
            let Some(rule) = self.registry.rule(rule_id) else {
                continue;
            };
            if !state.applicable(rule_id, rule) {
                continue;
            }
            if let Some((variant, bindings)) = rule.matcher(catalog).match_first(&rule.variants, node) {
                let outcome = rewrite(&rule.after, &bindings)?;
                return Ok(Some(Dispatched {
                    rule_id,
                    rule,
                    variant,
                    outcome,
                }));
            }
        }
        Ok(None)
    }

    /// Rewrites one parsed unit.
    pub fn apply(&self, unit: &SourceUnit) -> Result<UnitRewrite> {
        let mut state = self.pass_state(&unit.root);
        let mut pass = Pass {
            dispatcher: *self,
            state: &mut state,
            source: &unit.source,
            imports: unit.imports.iter().map(String::as_str).collect(),
            edits: Vec::new(),
            rewrites: Vec::new(),
        };
        let tree = match pass.visit(&unit.root, None, None)? {
            Visited::Kept(tree) => tree,
            Visited::Deleted => Node::new(NodeKind::CompilationUnit).into_ref(),
        };
        let Pass { edits, rewrites, .. } = pass;

        let source = apply_edits(&unit.source, &edits);
        debug!(
            unit = %unit.name,
            rewrites = rewrites.len(),
            preconditions = state.evaluated(),
            "finished pass"
        );
        Ok(UnitRewrite {
            name: unit.name.clone(),
            tree,
            rewrites,
            edits,
            original: unit.source.clone(),
            source,
        })
    }

    /// Parses Java source against the registry's catalog and rewrites it.
    pub fn apply_source(&self, name: &str, source: &str) -> Result<UnitRewrite> {
        let unit = Java.parse_unit(name, source, self.registry.catalog())?;
        self.apply(&unit)
    }

    /// Rewrites several units concurrently, one thread per unit. Results
    /// come back in input order.
    pub fn apply_all(&self, units: &[SourceUnit]) -> Vec<Result<UnitRewrite>> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = units
                .iter()
                .map(|unit| scope.spawn(move || self.apply(unit)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}

enum Visited {
    Kept(NodeRef),
    Deleted,
}

struct Pass<'p, 'r> {
    dispatcher: Dispatcher<'r>,
    state: &'p mut PassState<'r>,
    source: &'p str,
    imports: HashSet<&'p str>,
    edits: Vec<Edit>,
    rewrites: Vec<AppliedRewrite>,
}

impl Pass<'_, '_> {
    /// Top-down: a node that gets rewritten is not descended into, and the
    /// result is not offered to any rule again in this pass.
    ///
    /// `removable` is the source range to delete when this node is removed,
    /// or `None` where removal would leave broken syntax.
    fn visit(&mut self, node: &NodeRef, parent: Option<(&Node, usize)>, removable: Option<Range<usize>>) -> Result<Visited> {
        if let Some(dispatched) = self.dispatcher.dispatch(node, self.state)? {
            let rule = dispatched.rule;
            match &dispatched.outcome {
                RewriteOutcome::Replace(replacement) => {
                    let replacement = self.emit(rule, replacement, parent);
                    if let Some(span) = node.span.clone() {
                        self.edits.push(Edit::new(span.clone(), render(&replacement, self.source)));
                        self.record(&dispatched, span);
                    }
                    return Ok(Visited::Kept(replacement));
                }
                RewriteOutcome::Delete => match removable.clone() {
                    Some(span) => {
                        let span = deletion_span(self.source, span);
                        self.edits.push(Edit::new(span.clone(), ""));
                        self.record(&dispatched, span);
                        return Ok(Visited::Deleted);
                    }
                    None => {
                        warn!(
                            rule = %rule.name,
                            kind = ?node.kind,
                            "cannot delete a node outside a statement list, keeping it"
                        );
                    }
                },
            }
        }

        let mut children = Vec::with_capacity(node.children.len());
        let mut changed = false;
        for (slot, child) in node.children.iter().enumerate() {
            let child_removable = match &node.kind {
                NodeKind::Block if child.kind.is_statement() => child.span.clone(),
                NodeKind::ExpressionStatement if slot == 0 => removable.clone(),
                _ => None,
            };
            match self.visit(child, Some((node.as_ref(), slot)), child_removable)? {
                Visited::Kept(kept) => {
                    changed |= !Arc::ptr_eq(&kept, child);
                    children.push(kept);
                }
                Visited::Deleted if node.kind == NodeKind::ExpressionStatement => return Ok(Visited::Deleted),
                Visited::Deleted => changed = true,
            }
        }
        if !changed {
            return Ok(Visited::Kept(node.clone()));
        }
        let mut rebuilt = node.rebuilt(children);
        rebuilt.span = node.span.clone();
        Ok(Visited::Kept(rebuilt.into_ref()))
    }

    /// Applies the rule's emission hints, then parenthesizes the result if
    /// its parent binds tighter.
    fn emit(&self, rule: &Rule, replacement: &NodeRef, parent: Option<(&Node, usize)>) -> NodeRef {
        let mut node = replacement.clone();
        if rule.has_hint(EmissionHint::RemoveParens) {
            node = unparenthesize(&node);
            let stripped = match (&node.kind, node.child(0)) {
                (NodeKind::Unary(_), Some(operand)) if operand.kind == NodeKind::Parenthesized => {
                    Some(node.rebuilt(vec![unparenthesize(operand)]).into_ref())
                }
                _ => None,
            };
            if let Some(stripped) = stripped {
                node = stripped;
            }
        }
        if rule.has_hint(EmissionHint::SimplifyBooleans) {
            node = simplify_booleans(&node);
        }
        if rule.has_hint(EmissionHint::ShortenNames) {
            node = self.shorten_names(&node);
        }
        let required = parent.map_or(0, |(parent, slot)| required_precedence(parent, slot));
        if node.kind.is_expression() && precedence(&node) < required {
            let ty = node.ty.clone();
            node = Node::new(NodeKind::Parenthesized)
                .with_type(ty)
                .with_children(vec![node])
                .into_ref();
        }
        node
    }

    /// Prints class names introduced by the rule in short form when the unit
    /// can resolve them, and fully qualified otherwise.
    fn shorten_names(&self, node: &NodeRef) -> NodeRef {
        if node.span.is_some() {
            return node.clone();
        }
        if let (NodeKind::Identifier, Some(Symbol::Type(fqn))) = (&node.kind, &node.symbol) {
            let simple = fqn.rsplit('.').next().unwrap_or(fqn);
            let visible = self.imports.contains(fqn.as_str())
                || fqn.strip_prefix("java.lang.").is_some_and(|rest| !rest.contains('.'));
            let text = if visible { simple } else { fqn.as_str() };
            if node.text() == text {
                return node.clone();
            }
            let mut shortened = (**node).clone();
            shortened.text = Some(text.to_string());
            return shortened.into_ref();
        }
        let children: Vec<NodeRef> = node.children.iter().map(|c| self.shorten_names(c)).collect();
        if children.iter().zip(&node.children).all(|(a, b)| Arc::ptr_eq(a, b)) {
            return node.clone();
        }
        node.rebuilt(children).into_ref()
    }

    fn record(&mut self, dispatched: &Dispatched, span: Range<usize>) {
        let rule = dispatched.rule;
        debug!(
            rule = %rule.name,
            variant = dispatched.variant,
            start = span.start,
            end = span.end,
            delete = dispatched.outcome.is_delete(),
            "applied rewrite"
        );
        self.rewrites.push(AppliedRewrite {
            rule: rule.name.clone(),
            title: rule.title().to_string(),
            tags: rule.tags.clone(),
            variant: dispatched.variant,
            span,
            outcome: dispatched.outcome.clone(),
            hints: rule.hints.clone(),
        });
    }
}

/// Minimum precedence an expression needs to sit in `slot` of `parent`
/// without parentheses.
fn required_precedence(parent: &Node, slot: usize) -> u8 {
    match &parent.kind {
        NodeKind::Binary(op) if slot == 0 => op.precedence(),
        NodeKind::Binary(op) => op.precedence() + 1,
        NodeKind::Unary(op) if op.is_postfix() => 15,
        NodeKind::Unary(_) => 14,
        NodeKind::MethodInvocation | NodeKind::FieldAccess if slot == 0 => 16,
        NodeKind::Ternary if slot == 0 => 3,
        NodeKind::Ternary => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ParamSource, RuleDefinition, RuleSetConfig, TemplateSource};

    fn string(body: &str) -> TemplateSource {
        TemplateSource::new(body).param(ParamSource::new("s", "String"))
    }

    fn registry(config: RuleSetConfig) -> RuleRegistry {
        let (registry, errors) = RuleRegistry::compile(&config).unwrap();
        assert!(errors.is_empty(), "{:?}", errors);
        registry
    }

    fn unit(body: &str) -> String {
        format!("class Test {{\n    void run(String x, String y) {{\n{}\n    }}\n}}\n", body)
    }

    #[test]
    fn test_rewrite_is_parenthesized_for_parent() {
        let registry = registry(RuleSetConfig::new("r").with_rule(
            RuleDefinition::new("ConcatToPlus")
                .before(
                    TemplateSource::new("a.concat(b)")
                        .param(ParamSource::new("a", "String"))
                        .param(ParamSource::new("b", "String")),
                )
                .after(
                    TemplateSource::new("a + b")
                        .param(ParamSource::new("a", "String"))
                        .param(ParamSource::new("b", "String")),
                ),
        ));
        let result = Dispatcher::new(&registry)
            .apply_source("Test.java", &unit("        int n = x.concat(y).length();"))
            .unwrap();
        assert!(result.source.contains("int n = (x + y).length();"), "{}", result.source);
        assert_eq!(result.rewrites.len(), 1);
    }

    #[test]
    fn test_remove_parens_keeps_only_needed_operand_parens() {
        let pair = |body: &str| {
            TemplateSource::new(body)
                .param(ParamSource::new("a", "String"))
                .param(ParamSource::new("b", "String"))
        };
        let registry = registry(
            RuleSetConfig::new("r")
                .with_rule(
                    RuleDefinition::new("NeitherEmpty")
                        .before(pair("!a.isEmpty() && !b.isEmpty()"))
                        .after(pair("!(a.isEmpty() || b.isEmpty())")),
                )
                .with_rule(
                    RuleDefinition::new("NotEmpty")
                        .before(string("s.length() != 0"))
                        .after(string("!(s.isEmpty())")),
                ),
        );
        let result = Dispatcher::new(&registry)
            .apply_source(
                "Test.java",
                &unit("        boolean both = !x.isEmpty() && !y.isEmpty();
        boolean any = x.length() != 0;"),
            )
            .unwrap();
        assert!(
            result.source.contains("boolean both = !(x.isEmpty() || y.isEmpty());"),
            "{}",
            result.source
        );
        assert!(result.source.contains("boolean any = !x.isEmpty();"), "{}", result.source);
    }

    #[test]
    fn test_precondition_is_cached_per_pass() {
        let registry = registry(RuleSetConfig::new("r").with_rule(
            RuleDefinition::new("StringIsEmpty")
                .before(string("s.length() == 0"))
                .after(string("s.isEmpty()")),
        ));
        let dispatcher = Dispatcher::new(&registry);
        let parsed = Java
            .parse_unit(
                "Test.java",
                &unit("        boolean a = x.length() == 0;\n        boolean b = y.length() == 0;"),
                registry.catalog(),
            )
            .unwrap();
        let mut state = dispatcher.pass_state(&parsed.root);
        let mut binaries = Vec::new();
        collect_binaries(&parsed.root, &mut binaries);
        assert_eq!(binaries.len(), 2);
        for node in &binaries {
            assert!(dispatcher.dispatch(node, &mut state).unwrap().is_some());
        }
        assert_eq!(state.evaluated(), 1);
    }

    fn collect_binaries(node: &NodeRef, out: &mut Vec<NodeRef>) {
        if matches!(node.kind, NodeKind::Binary(_)) {
            out.push(node.clone());
        }
        for child in &node.children {
            collect_binaries(child, out);
        }
    }

    #[test]
    fn test_false_precondition_skips_rule() {
        let registry = registry(RuleSetConfig::new("r").with_rule(
            RuleDefinition::new("StringIsEmpty")
                .before(string("s.length() == 0"))
                .after(string("s.isEmpty()")),
        ));
        let result = Dispatcher::new(&registry)
            .apply_source("Test.java", "class Test { int f(int[] a) { return a.length; } }")
            .unwrap();
        assert!(!result.changed());
        assert_eq!(result.source, result.original);
    }

    #[test]
    fn test_delete_removes_statement_line() {
        let registry = registry(RuleSetConfig::new("r").with_rule(
            RuleDefinition::new("DropPrint")
                .before(string("System.out.println(s);"))
                .after(TemplateSource::new("").param(ParamSource::new("s", "String"))),
        ));
        let source = unit("        System.out.println(x);\n        x.trim();");
        let result = Dispatcher::new(&registry).apply_source("Test.java", &source).unwrap();
        assert_eq!(result.rewrites.len(), 1);
        assert!(result.rewrites[0].outcome.is_delete());
        assert_eq!(result.source, unit("        x.trim();"));
    }

    #[test]
    fn test_delete_outside_statement_list_keeps_node() {
        let registry = registry(RuleSetConfig::new("r").with_rule(
            RuleDefinition::new("DropTrim")
                .before(string("s.trim()"))
                .after(TemplateSource::new("").param(ParamSource::new("s", "String"))),
        ));
        let source = unit("        String z = x.trim();");
        let result = Dispatcher::new(&registry).apply_source("Test.java", &source).unwrap();
        assert!(!result.changed());
        assert_eq!(result.source, source);
    }

    #[test]
    fn test_shorten_names_qualifies_unimported_class() {
        let registry = registry(
            RuleSetConfig::new("r").with_import("java.util.Objects").with_rule(
                RuleDefinition::new("NullSafeEquals")
                    .before(
                        TemplateSource::new("a.equals(b)")
                            .param(ParamSource::new("a", "String"))
                            .param(ParamSource::new("b", "String")),
                    )
                    .after(
                        TemplateSource::new("Objects.equals(a, b)")
                            .param(ParamSource::new("a", "String"))
                            .param(ParamSource::new("b", "String")),
                    ),
            ),
        );
        let dispatcher = Dispatcher::new(&registry);
        let bare = dispatcher
            .apply_source("Test.java", &unit("        boolean e = x.equals(y);"))
            .unwrap();
        assert!(bare.source.contains("java.util.Objects.equals(x, y)"), "{}", bare.source);

        let imported = format!("import java.util.Objects;\n{}", unit("        boolean e = x.equals(y);"));
        let short = dispatcher.apply_source("Test.java", &imported).unwrap();
        assert!(short.source.contains("boolean e = Objects.equals(x, y);"), "{}", short.source);
    }

    #[test]
    fn test_required_precedence() {
        let binary = Node::new(NodeKind::Binary(crate::tree::BinaryOp::Mul));
        assert_eq!(required_precedence(&binary, 1), crate::tree::BinaryOp::Mul.precedence() + 1);
        assert_eq!(required_precedence(&Node::new(NodeKind::FieldAccess), 0), 16);
        assert_eq!(required_precedence(&Node::new(NodeKind::Arguments), 0), 0);
    }
}
