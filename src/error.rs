//! Error types for rule compilation and application.

use thiserror::Error;

/// A structural problem found while compiling a template or a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("rule has no before template")]
    NoBeforeTemplate,

    #[error("rule has more than one after template")]
    MultipleAfterTemplates,

    #[error("rule has no after template")]
    NoAfterTemplate,

    #[error("template body is empty")]
    EmptyBody,

    #[error("template body could not be resolved: {0}")]
    UnresolvableBody(String),

    #[error("after template references `{0}`, which is not bound by every before template")]
    UnboundAfterParameter(String),

    #[error("inconsistent template signatures: {0}")]
    InconsistentSignature(String),

    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),

    #[error("repeated parameter `{0}` may only appear directly in an argument list")]
    MisplacedRepeated(String),

    #[error("argument list captures more than one repeated parameter")]
    MultipleRepeatedInList,

    #[error("Refaster.anyOf() can only be used once per template")]
    MultipleAnyOf,

    #[error("parameter `{0}` declares both `matches` and `not_matches`")]
    ConflictingPredicates(String),

    #[error("{0} is not supported in templates")]
    UnsupportedStatement(String),

    #[error("template body holds more than one statement")]
    MultipleStatements,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid type `{0}`")]
    InvalidType(String),
}

/// The main error type for the rule engine.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Malformed rule `{rule}`: {reason}")]
    MalformedRule { rule: String, reason: MalformedReason },

    #[error("Malformed template: {0}")]
    MalformedTemplate(MalformedReason),

    #[error("Unbound parameter `{name}` during rewrite")]
    UnboundParameter { name: String },

    #[error("Parse error in {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Invalid type syntax: {0}")]
    TypeSyntax(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuleError {
    /// Attaches a rule identity to an error raised while compiling that rule.
    pub fn in_rule(self, rule: &str) -> Self {
        let reason = match self {
            RuleError::MalformedTemplate(reason) => reason,
            RuleError::TypeSyntax(text) => MalformedReason::InvalidType(text),
            other => return other,
        };
        RuleError::MalformedRule {
            rule: rule.to_string(),
            reason,
        }
    }

    /// Returns the name of the offending rule, if this error is tied to one.
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            RuleError::MalformedRule { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

impl From<MalformedReason> for RuleError {
    fn from(reason: MalformedReason) -> Self {
        RuleError::MalformedTemplate(reason)
    }
}

/// A specialized Result type for rule engine operations.
pub type Result<T> = std::result::Result<T, RuleError>;
