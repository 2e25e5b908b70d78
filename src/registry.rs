//! The compiled, read-only rule set.

use crate::error::{Result, RuleError};
use crate::rule::{Rule, RuleSetConfig, compile_rule};
use crate::template::NodeClassification;
use crate::tree::catalog::TypeCatalog;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Rules grouped by the node classification they apply to.
///
/// Built once, then shared freely between concurrent passes.
#[derive(Debug)]
pub struct RuleRegistry {
    catalog: TypeCatalog,
    rules: Vec<Rule>,
    /// Candidate rule ids per classification, fallback tier merged in,
    /// ordered by declaration.
    table: HashMap<NodeClassification, Vec<usize>>,
}

impl RuleRegistry {
    /// Compiles every rule of a rule set.
    ///
    /// A malformed rule is skipped and its error returned alongside the
    /// registry; the remaining rules still compile. Only a broken catalog
    /// fails the whole set.
    pub fn compile(config: &RuleSetConfig) -> Result<(Self, Vec<RuleError>)> {
        let catalog = config.catalog()?;
        let names = config.type_names();

        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for definition in &config.rules {
            match compile_rule(definition, &names, &catalog) {
                Ok(rule) => {
                    debug!(
                        rule = %rule.name,
                        variants = rule.variants.len(),
                        classifications = ?rule.classifications(),
                        precondition = %rule.precondition,
                        "compiled rule"
                    );
                    rules.push(rule);
                }
                Err(e) => {
                    warn!(rule = %definition.name, error = %e, "skipping rule");
                    errors.push(e);
                }
            }
        }
        Ok((Self::from_rules(rules, catalog), errors))
    }

    /// Builds a registry from already compiled rules.
    pub fn from_rules(rules: Vec<Rule>, catalog: TypeCatalog) -> Self {
        let mut direct: HashMap<NodeClassification, Vec<usize>> = HashMap::new();
        for (id, rule) in rules.iter().enumerate() {
            for classification in rule.classifications() {
                direct.entry(classification).or_default().push(id);
            }
        }

        let table = NodeClassification::ALL
            .iter()
            .map(|classification| {
                let mut ids: Vec<usize> = direct.get(classification).cloned().unwrap_or_default();
                let fallback = classification.fallback();
                if fallback != *classification {
                    ids.extend(direct.get(&fallback).into_iter().flatten());
                }
                ids.sort_unstable();
                ids.dedup();
                (*classification, ids)
            })
            .collect();

        Self { catalog, rules, table }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: usize) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Rule ids to consult for a node of `classification`, in priority order.
    pub fn candidates(&self, classification: NodeClassification) -> &[usize] {
        self.table.get(&classification).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ParamSource, RuleDefinition, TemplateSource};

    fn string(body: &str) -> TemplateSource {
        TemplateSource::new(body).param(ParamSource::new("s", "String"))
    }

    fn config() -> RuleSetConfig {
        RuleSetConfig::new("strings")
            .with_rule(
                RuleDefinition::new("StringIsEmpty")
                    .before(string("s.length() == 0"))
                    .before(string("s.equals(\"\")"))
                    .after(string("s.isEmpty()")),
            )
            .with_rule(RuleDefinition::new("Broken").after(string("s.isEmpty()")))
            .with_rule(
                RuleDefinition::new("TrimIdentity")
                    .before(string("s"))
                    .after(string("s")),
            )
    }

    #[test]
    fn test_malformed_rule_does_not_abort_set() {
        let (registry, errors) = RuleRegistry::compile(&config()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule_name(), Some("Broken"));
        assert_eq!(registry.rule(1).map(|r| r.name.as_str()), Some("TrimIdentity"));
    }

    #[test]
    fn test_candidates_include_fallback_tier() {
        let (registry, _) = RuleRegistry::compile(&config()).unwrap();
        assert_eq!(registry.candidates(NodeClassification::Binary), &[0, 1]);
        assert_eq!(registry.candidates(NodeClassification::MethodInvocation), &[0, 1]);
        assert_eq!(registry.candidates(NodeClassification::Expression), &[1]);
        assert_eq!(registry.candidates(NodeClassification::Lambda), &[1]);
        assert!(registry.candidates(NodeClassification::Statement).is_empty());
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleRegistry>();
    }
}
