//! Language front ends: parsing source text into attributed trees.

pub mod java;
mod lower;

pub use java::{Java, TemplateEnv};

use crate::error::{Result, RuleError};
use crate::tree::NodeRef;
use tree_sitter::{Language as TsLanguage, Parser, Query, Tree};

/// A programming language the engine can parse.
pub trait Language: Send + Sync {
    /// Returns the name of the language.
    fn name(&self) -> &'static str;

    /// Returns the file extensions associated with this language.
    fn extensions(&self) -> &[&'static str];

    /// Returns the tree-sitter language grammar.
    fn grammar(&self) -> TsLanguage;

    /// Parses source code into a tree-sitter syntax tree.
    fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| RuleError::Parse {
                source_name: "<source>".to_string(),
                message: format!("Failed to set language: {e}"),
            })?;

        parser.parse(source, None).ok_or_else(|| RuleError::Parse {
            source_name: "<source>".to_string(),
            message: "Failed to parse source".to_string(),
        })
    }

    /// Creates a tree-sitter query for this language.
    fn query(&self, pattern: &str) -> Result<Query> {
        Ok(Query::new(&self.grammar(), pattern)?)
    }

    /// Checks if this language handles the given file extension.
    fn matches_extension(&self, ext: &str) -> bool {
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A parsed and attributed compilation unit.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Display name, usually the file path.
    pub name: String,
    pub source: String,
    /// Single-type imports in effect, fully qualified.
    pub imports: Vec<String>,
    pub root: NodeRef,
}
