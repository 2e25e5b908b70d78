//! # Refactor Rules
//!
//! A rule engine for before/after rewrite templates over Java source.
//!
//! A rule lists one or more *before* templates (the surface forms to look
//! for) and a single *after* template (the canonical replacement). This
//! crate provides:
//! - Compiling templates with typed parameters into tree patterns
//! - Synthesizing a cheap precondition per rule from the symbols its
//!   templates use, so units that cannot match are skipped
//! - Matching patterns against attributed trees with type-checked captures
//! - Rewriting matches into after-template instances and source edits
//! - Dispatching a whole rule set over many compilation units
//!
//! ## Quick Start
//!
//! ```rust
//! use refactor_rules::prelude::*;
//!
//! let string = |body: &str| TemplateSource::new(body).param(ParamSource::new("s", "String"));
//! let config = RuleSetConfig::new("strings").with_rule(
//!     RuleDefinition::new("StringIsEmpty")
//!         .before(string("s.length() == 0"))
//!         .before(string("s.equals(\"\")"))
//!         .after(string("s.isEmpty()")),
//! );
//!
//! let (registry, errors) = RuleRegistry::compile(&config)?;
//! assert!(errors.is_empty());
//!
//! let result = Dispatcher::new(&registry).apply_source(
//!     "Test.java",
//!     "class Test { boolean f(String x) { return x.length() == 0; } }",
//! )?;
//! assert!(result.source.contains("return x.isEmpty();"));
//! println!("{}", result.diff());
//! # Ok::<(), refactor_rules::error::RuleError>(())
//! ```
//!
//! ## Rule Files
//!
//! Rule sets are plain serde data and load from YAML or JSON:
//!
//! ```rust,no_run
//! use refactor_rules::prelude::*;
//!
//! let config = RuleSetConfig::from_yaml("rules/strings.yaml")?;
//! let (registry, errors) = RuleRegistry::compile(&config)?;
//! for error in &errors {
//!     eprintln!("skipped: {}", error);
//! }
//! println!("{} rules ready", registry.len());
//! # Ok::<(), refactor_rules::error::RuleError>(())
//! ```
//!
//! ## Preconditions
//!
//! ```rust
//! use refactor_rules::prelude::*;
//!
//! let config = RuleSetConfig::new("strings").with_rule(
//!     RuleDefinition::new("StringIsEmpty")
//!         .before(TemplateSource::new("s.length() == 0").param(ParamSource::new("s", "String")))
//!         .after(TemplateSource::new("s.isEmpty()").param(ParamSource::new("s", "String"))),
//! );
//! let (registry, _) = RuleRegistry::compile(&config)?;
//! assert_eq!(
//!     registry.rules()[0].precondition.to_string(),
//!     "UsesMember(java.lang.String length(..))"
//! );
//! # Ok::<(), refactor_rules::error::RuleError>(())
//! ```

pub mod diff;
pub mod dispatch;
pub mod error;
pub mod facts;
pub mod index;
pub mod lang;
pub mod matcher;
pub mod precondition;
pub mod registry;
pub mod rewrite;
pub mod rule;
pub mod template;
pub mod tree;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diff::{DiffSummary, unified_diff};
    pub use crate::dispatch::{AppliedRewrite, Dispatched, Dispatcher, PassState, UnitRewrite};
    pub use crate::error::{MalformedReason, Result, RuleError};
    pub use crate::facts::{Fact, extract_facts};
    pub use crate::index::SymbolIndex;
    pub use crate::lang::{Java, Language, SourceUnit};
    pub use crate::matcher::{BindingSet, Captured, Matcher};
    pub use crate::precondition::{ApplicabilityIndex, Precondition};
    pub use crate::registry::RuleRegistry;
    pub use crate::rewrite::{RewriteOutcome, rewrite};
    pub use crate::rule::{
        EmissionHint, ParamSource, Rule, RuleDefinition, RuleSetConfig, TemplateSource, compile_rule,
    };
    pub use crate::template::{
        NodeClassification, Parameter, Pattern, Predicate, Template, TemplateBody, TemplateContext,
        compile_template,
    };
    pub use crate::tree::catalog::{ClassSpec, MemberSpec, TypeCatalog};
    pub use crate::tree::types::{JavaType, TypeNames, TypeParam};
    pub use crate::tree::{Node, NodeKind, NodeRef, Symbol};
}

pub use prelude::*;
