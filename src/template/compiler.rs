use super::{NodeClassification, Parameter, Pattern, Template, TemplateBody};
use crate::error::{MalformedReason, Result};
use crate::lang::{Java, TemplateEnv};
use crate::tree::catalog::TypeCatalog;
use crate::tree::types::{JavaType, TypeNames, TypeParam};
use crate::tree::{NodeKind, NodeRef, Symbol};
use std::collections::HashSet;
use std::sync::Arc;

/// Name resolution context shared by all templates of one rule.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub names: &'a TypeNames,
    pub type_params: &'a [TypeParam],
    pub catalog: &'a TypeCatalog,
}

/// Compiles one template.
///
/// Usually yields a single [`Template`]; a body containing
/// `Refaster.anyOf(e1, ..., en)` yields one template per alternative, in
/// argument order.
pub fn compile_template(params: &[Parameter], body: &str, ctx: &TemplateContext) -> Result<Vec<Template>> {
    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(MalformedReason::DuplicateParameter(param.name.clone()).into());
        }
    }

    let body = body.trim();
    if body.is_empty() {
        return Ok(vec![Template {
            params: params.to_vec(),
            body: TemplateBody::Empty,
            pattern: None,
            classification: NodeClassification::Statement,
            result_type: JavaType::Void,
        }]);
    }

    let env_params: Vec<(String, JavaType)> = params.iter().map(|p| (p.name.clone(), p.ty.clone())).collect();
    let env = TemplateEnv {
        params: &env_params,
        type_params: ctx.type_params,
        names: ctx.names,
        catalog: ctx.catalog,
    };

    let statement = body.ends_with(';') || body.ends_with('}');
    let root = if statement {
        let lowered = Java.lower_statement_template(body, &env)?;
        match lowered.kind {
            NodeKind::ExpressionStatement => lowered.children.first().cloned().ok_or(MalformedReason::EmptyBody)?,
            _ => lowered,
        }
    } else {
        Java.lower_expression_template(body, &env)?
    };

    expand_any_of(&root)?
        .into_iter()
        .map(|alternative| finish(params, alternative, statement))
        .collect()
}

fn finish(params: &[Parameter], root: NodeRef, statement: bool) -> Result<Template> {
    let pattern = Pattern::from_tree(&root);
    check_repeated(&pattern, params)?;

    let classification = match &pattern {
        Pattern::MetaRef(_) => NodeClassification::Expression,
        _ => NodeClassification::of(&root).unwrap_or(if statement {
            NodeClassification::Statement
        } else {
            NodeClassification::Expression
        }),
    };
    let (body, result_type) = if statement {
        (TemplateBody::Statement(root), JavaType::Void)
    } else {
        let ty = root.ty.clone();
        (TemplateBody::Expression(root), ty)
    };
    Ok(Template {
        params: params.to_vec(),
        body,
        pattern: Some(pattern),
        classification,
        result_type,
    })
}

/// Repeated parameters may only be captured directly inside an argument
/// list, and at most once per list.
fn check_repeated(pattern: &Pattern, params: &[Parameter]) -> Result<()> {
    let repeated: HashSet<&str> = params.iter().filter(|p| p.repeated).map(|p| p.name.as_str()).collect();
    if repeated.is_empty() {
        return Ok(());
    }

    let mut error = None;
    pattern.visit(None, &mut |node, parent| {
        if error.is_some() {
            return;
        }
        match node {
            Pattern::MetaRef(name) if repeated.contains(name.as_str()) => {
                let in_arguments = matches!(
                    parent,
                    Some(Pattern::Structural {
                        kind: NodeKind::Arguments,
                        ..
                    })
                );
                if !in_arguments {
                    error = Some(MalformedReason::MisplacedRepeated(name.clone()));
                }
            }
            Pattern::Structural {
                kind: NodeKind::Arguments,
                children,
                ..
            } => {
                let captured = children
                    .iter()
                    .filter(|c| matches!(c, Pattern::MetaRef(n) if repeated.contains(n.as_str())))
                    .count();
                if captured > 1 {
                    error = Some(MalformedReason::MultipleRepeatedInList);
                }
            }
            _ => {}
        }
    });
    match error {
        Some(reason) => Err(reason.into()),
        None => Ok(()),
    }
}

fn is_any_of(node: &NodeRef) -> bool {
    node.kind == NodeKind::MethodInvocation
        && node.text() == "anyOf"
        && node.child(0).is_some_and(|receiver| {
            matches!(&receiver.symbol, Some(Symbol::Type(t)) if t == "Refaster" || t.ends_with(".Refaster"))
        })
}

fn expand_any_of(root: &NodeRef) -> Result<Vec<NodeRef>> {
    let mut found: Vec<NodeRef> = Vec::new();
    collect_any_of(root, &mut found);
    match found.as_slice() {
        [] => Ok(vec![root.clone()]),
        [any_of] => {
            let alternatives = any_of.child(1).map(|args| args.children.clone()).unwrap_or_default();
            Ok(alternatives.iter().map(|alt| replace(root, any_of, alt)).collect())
        }
        _ => Err(MalformedReason::MultipleAnyOf.into()),
    }
}

fn collect_any_of(node: &NodeRef, out: &mut Vec<NodeRef>) {
    if is_any_of(node) {
        out.push(node.clone());
    }
    for child in &node.children {
        collect_any_of(child, out);
    }
}

/// Copies `node` with `target` (by identity) swapped for `with`.
fn replace(node: &NodeRef, target: &NodeRef, with: &NodeRef) -> NodeRef {
    if Arc::ptr_eq(node, target) {
        return with.clone();
    }
    let children: Vec<NodeRef> = node.children.iter().map(|c| replace(c, target, with)).collect();
    if children.iter().zip(&node.children).all(|(a, b)| Arc::ptr_eq(a, b)) {
        return node.clone();
    }
    node.rebuilt(children).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::tree::types::Primitive;

    fn compile(params: &[Parameter], body: &str) -> Result<Vec<Template>> {
        let catalog = TypeCatalog::builtin();
        let names = TypeNames::new().with_import("java.util.Map");
        let ctx = TemplateContext {
            names: &names,
            type_params: &[],
            catalog: &catalog,
        };
        compile_template(params, body, &ctx)
    }

    fn string_param(name: &str) -> Parameter {
        Parameter::new(name, JavaType::string())
    }

    fn malformed(result: Result<Vec<Template>>) -> MalformedReason {
        match result {
            Err(RuleError::MalformedTemplate(reason)) => reason,
            other => panic!("expected malformed template, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_compile_binary_template() {
        let templates = compile(&[string_param("s")], "s.length() == 0").unwrap();
        assert_eq!(templates.len(), 1);
        let template = &templates[0];
        assert_eq!(template.classification, NodeClassification::Binary);
        assert_eq!(template.result_type, JavaType::Primitive(Primitive::Boolean));
        assert_eq!(template.pattern.as_ref().unwrap().meta_refs(), vec!["s"]);
    }

    #[test]
    fn test_expression_statement_unwraps_to_invocation() {
        let templates = compile(&[string_param("s")], "System.out.println(s);").unwrap();
        let template = &templates[0];
        assert!(template.body.is_statement());
        assert_eq!(template.classification, NodeClassification::MethodInvocation);
        assert_eq!(template.result_type, JavaType::Void);
    }

    #[test]
    fn test_empty_body_is_noop() {
        let templates = compile(&[string_param("s")], "  ").unwrap();
        assert_eq!(templates[0].body, TemplateBody::Empty);
        assert!(templates[0].pattern.is_none());
    }

    #[test]
    fn test_any_of_expands_in_argument_order() {
        let templates = compile(
            &[string_param("s")],
            "Refaster.anyOf(s.length() == 0, s.equals(\"\"))",
        )
        .unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].classification, NodeClassification::Binary);
        assert_eq!(templates[1].classification, NodeClassification::MethodInvocation);
    }

    #[test]
    fn test_any_of_nested_in_expression() {
        let templates = compile(&[string_param("s")], "!Refaster.anyOf(s.isEmpty(), s.isBlank())").unwrap();
        assert_eq!(templates.len(), 2);
        assert!(templates.iter().all(|t| t.classification == NodeClassification::Unary));
    }

    #[test]
    fn test_multiple_any_of_rejected() {
        let reason = malformed(compile(
            &[string_param("s")],
            "Refaster.anyOf(s, s).length() == Refaster.anyOf(0, 1)",
        ));
        assert_eq!(reason, MalformedReason::MultipleAnyOf);
    }

    #[test]
    fn test_duplicate_parameters_rejected() {
        let reason = malformed(compile(&[string_param("s"), string_param("s")], "s.isEmpty()"));
        assert_eq!(reason, MalformedReason::DuplicateParameter("s".into()));
    }

    #[test]
    fn test_repeated_parameter_placement() {
        let args = Parameter::new("args", JavaType::Array(Box::new(JavaType::object()))).repeated();
        assert!(compile(&[string_param("fmt"), args.clone()], "String.format(fmt, args)").is_ok());

        let reason = malformed(compile(&[args.clone()], "args"));
        assert_eq!(reason, MalformedReason::MisplacedRepeated("args".into()));

        let more = Parameter::new("more", JavaType::object()).repeated();
        let reason = malformed(compile(&[args, more], "String.format(\"%s\", args, more)"));
        assert_eq!(reason, MalformedReason::MultipleRepeatedInList);
    }

    #[test]
    fn test_unresolvable_body_rejected() {
        let reason = malformed(compile(&[], "s.isEmpty()"));
        assert!(matches!(reason, MalformedReason::UnresolvableBody(_)));
    }
}
