//! Java language support.

use super::lower::{Lowerer, named};
use super::{Language, SourceUnit};
use crate::error::{MalformedReason, Result, RuleError};
use crate::tree::NodeRef;
use crate::tree::catalog::TypeCatalog;
use crate::tree::types::{JavaType, TypeNames, TypeParam};
use streaming_iterator::StreamingIterator;
use tracing::trace;
use tree_sitter::{Language as TsLanguage, Node as TsNode, QueryCursor};

/// Java programming language.
pub struct Java;

impl Language for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_java::LANGUAGE.into()
    }
}

/// Everything a template body may refer to.
#[derive(Debug, Clone, Copy)]
pub struct TemplateEnv<'a> {
    pub params: &'a [(String, JavaType)],
    pub type_params: &'a [TypeParam],
    pub names: &'a TypeNames,
    pub catalog: &'a TypeCatalog,
}

const WRAPPER_CLASS: &str = "__Template";

impl Java {
    /// Parses and attributes a compilation unit.
    pub fn parse_unit(&self, name: &str, source: &str, catalog: &TypeCatalog) -> Result<SourceUnit> {
        let tree = self.parse(source).map_err(|e| match e {
            RuleError::Parse { message, .. } => RuleError::Parse {
                source_name: name.to_string(),
                message,
            },
            other => other,
        })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(RuleError::Parse {
                source_name: name.to_string(),
                message: format!("syntax error near line {}", first_error_line(root)),
            });
        }

        let imports = self.collect_imports(&tree, source, catalog)?;
        let mut names = TypeNames::new();
        for import in &imports {
            names.add_import(import);
        }
        trace!(unit = name, imports = imports.len(), "lowering compilation unit");

        let mut lowerer = Lowerer::for_unit(source, names, catalog);
        let root = lowerer.lower_any(root);
        Ok(SourceUnit {
            name: name.to_string(),
            source: source.to_string(),
            imports,
            root,
        })
    }

    fn collect_imports(&self, tree: &tree_sitter::Tree, source: &str, catalog: &TypeCatalog) -> Result<Vec<String>> {
        let query = self.query("(import_declaration) @import")?;
        let mut cursor = QueryCursor::new();
        let source_bytes = source.as_bytes();
        let mut imports = Vec::new();

        let mut matches = cursor.matches(&query, tree.root_node(), source_bytes);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let text = capture.node.utf8_text(source_bytes).unwrap_or("");
                let body = text
                    .trim()
                    .trim_start_matches("import")
                    .trim_end_matches(';')
                    .trim();
                if body.starts_with("static ") {
                    continue;
                }
                let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
                match body.strip_suffix(".*") {
                    Some(package) => imports.extend(catalog.classes_in_package(package)),
                    None => imports.push(body),
                }
            }
        }
        Ok(imports)
    }

    /// Lowers a template body that is a single expression.
    pub fn lower_expression_template(&self, body: &str, env: &TemplateEnv) -> Result<NodeRef> {
        let wrapped = format!(
            "class {WRAPPER_CLASS} {{ void __template() {{ Object __value = {body}; }} }}"
        );
        self.lower_template(&wrapped, body, env, |lowerer, block| {
            let declaration = single_statement(block)?;
            let value = declaration
                .child_by_field_name("declarator")
                .and_then(|d| d.child_by_field_name("value"))
                .ok_or(MalformedReason::EmptyBody)?;
            Ok(lowerer.lower_expr(value))
        })
    }

    /// Lowers a template body that is a single statement.
    pub fn lower_statement_template(&self, body: &str, env: &TemplateEnv) -> Result<NodeRef> {
        let wrapped = format!("class {WRAPPER_CLASS} {{ void __template() {{ {body} }} }}");
        self.lower_template(&wrapped, body, env, |lowerer, block| {
            let statement = single_statement(block)?;
            match statement.kind() {
                "local_variable_declaration" | "class_declaration" | "local_class_declaration" => Err(
                    MalformedReason::UnsupportedStatement(statement.kind().replace('_', " ")),
                ),
                _ => Ok(lowerer.lower_any(statement)),
            }
        })
    }

    fn lower_template(
        &self,
        wrapped: &str,
        body: &str,
        env: &TemplateEnv,
        lower: impl FnOnce(&mut Lowerer, TsNode) -> std::result::Result<NodeRef, MalformedReason>,
    ) -> Result<NodeRef> {
        let tree = self.parse(wrapped)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(MalformedReason::UnresolvableBody(format!("syntax error in `{}`", body.trim())).into());
        }
        let block = method_body(root).ok_or(MalformedReason::EmptyBody)?;

        let mut lowerer = Lowerer::for_template(wrapped, env);
        let node = lower(&mut lowerer, block)?;
        if !lowerer.unresolved.is_empty() {
            return Err(MalformedReason::UnresolvableBody(lowerer.unresolved.join(", ")).into());
        }
        Ok(node)
    }
}

fn method_body(root: TsNode<'_>) -> Option<TsNode<'_>> {
    let class = named(root).into_iter().find(|n| n.kind() == "class_declaration")?;
    let body = class.child_by_field_name("body")?;
    let method = named(body)
        .into_iter()
        .find(|n| n.kind() == "method_declaration")?;
    method.child_by_field_name("body")
}

fn single_statement(block: TsNode<'_>) -> std::result::Result<TsNode<'_>, MalformedReason> {
    let statements = named(block);
    match statements.as_slice() {
        [] => Err(MalformedReason::EmptyBody),
        [only] => Ok(*only),
        _ => Err(MalformedReason::MultipleStatements),
    }
}

fn first_error_line(node: TsNode<'_>) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find(|c| c.has_error())
        .map(first_error_line)
        .unwrap_or(node.start_position().row + 1)
}
