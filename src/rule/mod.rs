//! Rules: before variants, one after template and a synthesized precondition.

mod config;

pub use config::{ParamSource, RuleDefinition, RuleSetConfig, TemplateSource};

use crate::error::{MalformedReason, Result};
use crate::facts::extract_facts;
use crate::matcher::Matcher;
use crate::precondition::Precondition;
use crate::template::{NodeClassification, Parameter, Predicate, Template, TemplateContext, compile_template};
use crate::tree::catalog::{TypeBindings, TypeCatalog};
use crate::tree::types::{JavaType, TypeNames, TypeParam, WildcardBound};
use crate::tree::{Node, NodeKind, UnaryOp};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

/// Presentation hints handed to whatever renders the rewritten tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmissionHint {
    /// Print imported names in short form.
    ShortenNames,
    /// Drop parentheses the surrounding expression does not need.
    RemoveParens,
    /// Fold boolean literals out of the result.
    SimplifyBooleans,
    /// Import static members instead of qualifying them.
    StaticImportAlways,
}

/// A compiled, immutable rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub type_params: Vec<TypeParam>,
    /// Before variants in declaration order, `anyOf` alternatives expanded.
    pub variants: Vec<Template>,
    pub after: Template,
    pub precondition: Precondition,
    pub hints: Vec<EmissionHint>,
}

impl Rule {
    /// The classifications this rule's variants are routed under.
    pub fn classifications(&self) -> BTreeSet<NodeClassification> {
        self.variants.iter().map(|v| v.classification).collect()
    }

    pub fn matcher<'a>(&'a self, catalog: &'a TypeCatalog) -> Matcher<'a> {
        Matcher::new(catalog, &self.type_params)
    }

    pub fn has_hint(&self, hint: EmissionHint) -> bool {
        self.hints.contains(&hint)
    }

    /// The name to show users.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Compiles one rule definition.
///
/// Every problem is reported as [`crate::error::RuleError::MalformedRule`]
/// carrying the rule's name.
pub fn compile_rule(definition: &RuleDefinition, names: &TypeNames, catalog: &TypeCatalog) -> Result<Rule> {
    compile(definition, names, catalog).map_err(|e| e.in_rule(&definition.name))
}

fn compile(definition: &RuleDefinition, names: &TypeNames, catalog: &TypeCatalog) -> Result<Rule> {
    if definition.before.is_empty() {
        return Err(MalformedReason::NoBeforeTemplate.into());
    }
    let after_source = match definition.after.as_slice() {
        [] => return Err(MalformedReason::NoAfterTemplate.into()),
        [after] => after,
        _ => return Err(MalformedReason::MultipleAfterTemplates.into()),
    };

    let mut names = names.clone();
    let type_params = parse_type_params(&definition.type_parameters, &mut names)?;
    let ctx = TemplateContext {
        names: &names,
        type_params: &type_params,
        catalog,
    };

    let mut declared_returns = Vec::new();
    let mut variants = Vec::new();
    for source in &definition.before {
        if source.body.trim().is_empty() {
            return Err(MalformedReason::EmptyBody.into());
        }
        let params = parameters(&source.params, &names)?;
        if let Some(returns) = &source.returns {
            declared_returns.push(names.parse(returns)?);
        }
        variants.extend(compile_template(&params, &source.body, &ctx)?);
    }

    let after_params = parameters(&after_source.params, &names)?;
    if let Some(returns) = &after_source.returns {
        declared_returns.push(names.parse(returns)?);
    }
    let mut after = compile_template(&after_params, &after_source.body, &ctx)?;
    if after.len() != 1 {
        return Err(MalformedReason::MultipleAfterTemplates.into());
    }
    let after = after.remove(0);

    check_declared_returns(&declared_returns)?;
    check_after_bindings(&variants, &after, catalog)?;
    check_shapes(&variants, &after, catalog)?;

    let facts: Vec<_> = variants.iter().map(extract_facts).collect();
    let precondition = Precondition::synthesize(&facts);
    let mut hints = emission_hints(&after);
    if definition.static_imports {
        hints.push(EmissionHint::StaticImportAlways);
    }

    Ok(Rule {
        name: definition.name.clone(),
        display_name: definition.display_name.clone(),
        description: definition.description.clone(),
        tags: definition.tags.clone(),
        type_params,
        variants,
        after,
        precondition,
        hints,
    })
}

/// Parses `T` / `T extends A & B` declarations. All names are registered
/// before any bound is parsed so bounds may refer to each other.
fn parse_type_params(declarations: &[String], names: &mut TypeNames) -> Result<Vec<TypeParam>> {
    let split: Vec<(&str, Option<&str>)> = declarations
        .iter()
        .map(|d| match d.trim().split_once(" extends ") {
            Some((name, bounds)) => (name.trim(), Some(bounds)),
            None => (d.trim(), None),
        })
        .collect();

    for (name, _) in &split {
        if !IDENTIFIER.is_match(name) {
            return Err(MalformedReason::InvalidParameter(format!("invalid type parameter `{}`", name)).into());
        }
        names.add_type_var(name);
    }

    split
        .into_iter()
        .map(|(name, bounds)| {
            let mut param = TypeParam::new(name);
            if let Some(bounds) = bounds {
                for bound in names.parse_bounds(bounds)? {
                    param = param.with_bound(bound);
                }
            }
            Ok(param)
        })
        .collect()
}

fn parameters(sources: &[ParamSource], names: &TypeNames) -> Result<Vec<Parameter>> {
    sources
        .iter()
        .map(|source| {
            if !IDENTIFIER.is_match(&source.name) {
                return Err(MalformedReason::InvalidParameter(format!("invalid parameter name `{}`", source.name)).into());
            }
            let mut param = Parameter::new(source.name.clone(), names.parse(&source.ty)?);
            if source.repeated {
                param = param.repeated();
            }
            let predicate = match (&source.matches, &source.not_matches) {
                (Some(_), Some(_)) => {
                    return Err(MalformedReason::ConflictingPredicates(source.name.clone()).into());
                }
                (Some(name), None) => Some(predicate(name)?),
                (None, Some(name)) => Some(predicate(name)?.negate()),
                (None, None) => None,
            };
            if let Some(predicate) = predicate {
                param = param.with_predicate(predicate);
            }
            Ok(param)
        })
        .collect()
}

fn predicate(name: &str) -> Result<Predicate> {
    Predicate::from_name(name)
        .ok_or_else(|| MalformedReason::InvalidParameter(format!("unknown predicate `{}`", name)).into())
}

fn check_declared_returns(declared: &[JavaType]) -> Result<()> {
    match declared.split_first() {
        Some((first, rest)) => match rest.iter().find(|ty| *ty != first) {
            Some(other) => Err(MalformedReason::InconsistentSignature(format!(
                "declared return types {} and {} differ",
                first, other
            ))
            .into()),
            None => Ok(()),
        },
        None => Ok(()),
    }
}

/// Every parameter the after body uses must be captured by every variant,
/// with the same repetition and a type the after parameter accepts.
fn check_after_bindings(variants: &[Template], after: &Template, catalog: &TypeCatalog) -> Result<()> {
    let Some(pattern) = &after.pattern else {
        return Ok(());
    };
    for name in pattern.meta_refs() {
        let repeated = after.param(name).is_some_and(|p| p.repeated);
        for variant in variants {
            let captured = variant
                .pattern
                .as_ref()
                .is_some_and(|p| p.meta_refs().contains(&name));
            if !captured {
                return Err(MalformedReason::UnboundAfterParameter(name.to_string()).into());
            }
            let Some(param) = variant.param(name) else {
                continue;
            };
            if param.repeated != repeated {
                return Err(MalformedReason::InconsistentSignature(format!(
                    "parameter `{}` is repeated in only some templates",
                    name
                ))
                .into());
            }
            if let Some(after_param) = after.param(name) {
                check_param_type(name, &param.ty, &after_param.ty, catalog)?;
            }
        }
    }
    Ok(())
}

fn check_param_type(name: &str, before: &JavaType, after: &JavaType, catalog: &TypeCatalog) -> Result<()> {
    if before == after || !is_concrete(before) || !is_concrete(after) {
        return Ok(());
    }
    let mut bindings = TypeBindings::new(&[]);
    if catalog.is_assignable(before, after, &mut bindings) {
        return Ok(());
    }
    Err(MalformedReason::InconsistentSignature(format!(
        "parameter `{}` is {} before but {} after",
        name, before, after
    ))
    .into())
}

/// Variants and the after template must all be expressions or all be
/// statements, and a concrete after type must fit each variant's type.
fn check_shapes(variants: &[Template], after: &Template, catalog: &TypeCatalog) -> Result<()> {
    let statement = variants.first().is_some_and(|v| v.body.is_statement());
    if variants.iter().any(|v| v.body.is_statement() != statement) {
        return Err(MalformedReason::InconsistentSignature("mixes expression and statement templates".into()).into());
    }
    if after.body.root().is_some() && after.body.is_statement() != statement {
        return Err(MalformedReason::InconsistentSignature(
            "after template shape differs from before templates".into(),
        )
        .into());
    }

    if statement || !is_concrete(&after.result_type) {
        return Ok(());
    }
    for variant in variants.iter().filter(|v| is_concrete(&v.result_type)) {
        let mut bindings = TypeBindings::new(&[]);
        if !catalog.is_assignable(&after.result_type, &variant.result_type, &mut bindings) {
            return Err(MalformedReason::InconsistentSignature(format!(
                "after type {} does not fit before type {}",
                after.result_type, variant.result_type
            ))
            .into());
        }
    }
    Ok(())
}

/// A fully resolved type without type variables.
fn is_concrete(ty: &JavaType) -> bool {
    match ty {
        JavaType::Primitive(_) => true,
        JavaType::Class { args, .. } => args.iter().all(is_concrete),
        JavaType::Array(elem) => is_concrete(elem),
        JavaType::Wildcard(WildcardBound::Unbounded) => true,
        JavaType::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => is_concrete(b),
        _ => false,
    }
}

fn emission_hints(after: &Template) -> Vec<EmissionHint> {
    let mut hints = vec![EmissionHint::ShortenNames];
    let Some(root) = after.body.root() else {
        return hints;
    };
    let parenthesized_operand = matches!(root.kind, NodeKind::Unary(_))
        && root.child(0).is_some_and(|operand| operand.kind == NodeKind::Parenthesized);
    if root.kind == NodeKind::Parenthesized || parenthesized_operand {
        hints.push(EmissionHint::RemoveParens);
    }
    let mut boolean_logic = false;
    root.walk(&mut |node: &Node| {
        boolean_logic |= matches!(node.kind, NodeKind::Unary(UnaryOp::Not))
            || (node.kind == NodeKind::Literal && matches!(node.text(), "true" | "false"));
    });
    if boolean_logic {
        hints.push(EmissionHint::SimplifyBooleans);
    }
    hints
}
