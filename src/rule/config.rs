//! Serializable rule sources.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{Result, RuleError};
use crate::tree::catalog::{ClassSpec, TypeCatalog};
use crate::tree::types::TypeNames;

/// A template parameter as written in a rule source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSource {
    pub name: String,

    /// Declared type in Java syntax; for repeated parameters an array type.
    #[serde(rename = "type")]
    pub ty: String,

    /// Captures zero or more arguments.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,

    /// Predicate the capture must satisfy (`constant`, `call`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    /// Predicate the capture must not satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_matches: Option<String>,
}

impl ParamSource {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            repeated: false,
            matches: None,
            not_matches: None,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn matches(mut self, predicate: impl Into<String>) -> Self {
        self.matches = Some(predicate.into());
        self
    }

    pub fn not_matches(mut self, predicate: impl Into<String>) -> Self {
        self.not_matches = Some(predicate.into());
        self
    }
}

/// One before or after template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateSource {
    #[serde(default)]
    pub params: Vec<ParamSource>,

    /// Declared result type; checked for agreement across the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,

    /// An expression, a statement ending in `;`, or empty for the no-op.
    #[serde(default)]
    pub body: String,
}

impl TemplateSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, param: ParamSource) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.returns = Some(ty.into());
        self
    }
}

/// A rule as written by its author.
///
/// `after` accepts a single template or a list so that a rule with several
/// after templates can be reported instead of silently truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Type parameters such as `T` or `T extends Comparable<T>`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,

    #[serde(default)]
    pub before: Vec<TemplateSource>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub after: Vec<TemplateSource>,

    /// Ask the emitter to import static members rather than qualify them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub static_imports: bool,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<TemplateSource>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(TemplateSource),
        Many(Vec<TemplateSource>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(template) => vec![template],
        OneOrMany::Many(templates) => templates,
    })
}

impl RuleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            tags: Vec::new(),
            type_parameters: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            static_imports: false,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn type_parameter(mut self, declaration: impl Into<String>) -> Self {
        self.type_parameters.push(declaration.into());
        self
    }

    pub fn before(mut self, template: TemplateSource) -> Self {
        self.before.push(template);
        self
    }

    pub fn after(mut self, template: TemplateSource) -> Self {
        self.after.push(template);
        self
    }

    pub fn static_imports(mut self) -> Self {
        self.static_imports = true;
        self
    }
}

/// A set of rules plus the names and library classes they rely on.
///
/// # Example YAML
///
/// ```yaml
/// name: string-cleanups
/// imports:
///   - java.util.Map
/// rules:
///   - name: StringIsEmpty
///     before:
///       - params: [{ name: s, type: String }]
///         body: s.length() == 0
///       - params: [{ name: s, type: String }]
///         body: s.equals("")
///     after:
///       params: [{ name: s, type: String }]
///       body: s.isEmpty()
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Fully qualified names that short names in templates resolve to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    /// Library classes added to the built-in catalog.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library: Vec<ClassSpec>,

    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            name: "unnamed-rules".to_string(),
            description: String::new(),
            imports: Vec::new(),
            library: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl RuleSetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_import(mut self, fqn: impl Into<String>) -> Self {
        self.imports.push(fqn.into());
        self
    }

    pub fn with_class(mut self, class: ClassSpec) -> Self {
        self.library.push(class);
        self
    }

    pub fn add_rule(&mut self, rule: RuleDefinition) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    /// Name resolution for templates of this set.
    pub fn type_names(&self) -> TypeNames {
        let mut names = TypeNames::new();
        for import in &self.imports {
            names.add_import(import);
        }
        names
    }

    /// The built-in catalog extended with this set's library classes.
    pub fn catalog(&self) -> Result<TypeCatalog> {
        let mut catalog = TypeCatalog::builtin();
        catalog.extend(&self.library)?;
        Ok(catalog)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| RuleError::InvalidConfig(format!("Failed to parse YAML config: {}", e)))
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| RuleError::InvalidConfig(format!("Failed to parse JSON config: {}", e)))
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&read(path.as_ref())?)
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    /// Save config to a YAML file.
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| RuleError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        write(path.as_ref(), content)
    }

    /// Save config to a JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write(path.as_ref(), content)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RuleError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file: {}", e),
        ))
    })
}

fn write(path: &Path, content: String) -> Result<()> {
    std::fs::write(path, content).map_err(|e| {
        RuleError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write config file: {}", e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: string-cleanups
imports:
  - java.util.Map
rules:
  - name: StringIsEmpty
    tags: [strings]
    before:
      - params: [{ name: s, type: String }]
        body: s.length() == 0
      - params: [{ name: s, type: String }]
        body: s.equals("")
    after:
      params: [{ name: s, type: String }]
      body: s.isEmpty()
"#;

    #[test]
    fn test_parse_yaml_with_single_after() {
        let config = RuleSetConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.name, "string-cleanups");
        let rule = &config.rules[0];
        assert_eq!(rule.before.len(), 2);
        assert_eq!(rule.after.len(), 1);
        assert_eq!(rule.after[0].body, "s.isEmpty()");
        assert_eq!(rule.tags, vec!["strings"]);
    }

    #[test]
    fn test_after_list_is_kept() {
        let yaml = r#"
name: r
rules:
  - name: Twice
    before: [{ body: "1" }]
    after: [{ body: "2" }, { body: "3" }]
"#;
        let config = RuleSetConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.rules[0].after.len(), 2);
    }

    #[test]
    fn test_static_imports_flag() {
        let yaml = r#"
name: r
rules:
  - name: Statics
    static_imports: true
    before: [{ body: "1" }]
    after: { body: "2" }
"#;
        let config = RuleSetConfig::from_yaml_str(yaml).unwrap();
        assert!(config.rules[0].static_imports);
        assert!(!RuleSetConfig::from_yaml_str(YAML).unwrap().rules[0].static_imports);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = RuleSetConfig::from_yaml_str("rules: [").unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfig(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = RuleSetConfig::new("set").with_import("java.util.List").with_rule(
            RuleDefinition::new("R")
                .before(TemplateSource::new("l.size() == 0").param(ParamSource::new("l", "List<?>")))
                .after(TemplateSource::new("l.isEmpty()").param(ParamSource::new("l", "List<?>"))),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RuleSetConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_type_names_use_imports() {
        let config = RuleSetConfig::new("set").with_import("java.util.Map");
        assert_eq!(config.type_names().qualify("Map"), "java.util.Map");
    }
}
