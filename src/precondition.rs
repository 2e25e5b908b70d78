//! Precondition synthesis over symbol facts.
//!
//! A rule's precondition is a cheap over-approximation: when it evaluates
//! false for a unit, no variant of the rule can match anywhere in that unit.

use crate::facts::Fact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Answers fact queries for one compilation unit.
///
/// `None` means the index cannot tell; callers treat it as `true`.
pub trait ApplicabilityIndex {
    fn uses_type(&self, name: &str) -> Option<bool>;
    fn uses_member(&self, owner: &str, member: &str) -> Option<bool>;
}

/// A boolean expression over [`Fact`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precondition {
    True,
    Fact(Fact),
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
}

impl Precondition {
    /// Conjunction, flattened; `True` operands are dropped.
    pub fn and(parts: impl IntoIterator<Item = Precondition>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Precondition::True => {}
                Precondition::And(inner) => {
                    for operand in inner {
                        push_unique(&mut flat, operand);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        match flat.len() {
            0 => Precondition::True,
            1 => flat.remove(0),
            _ => Precondition::And(flat),
        }
    }

    /// Disjunction, flattened; any `True` operand makes the whole thing true.
    pub fn or(parts: impl IntoIterator<Item = Precondition>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Precondition::True => return Precondition::True,
                Precondition::Or(inner) => {
                    for operand in inner {
                        push_unique(&mut flat, operand);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        match flat.len() {
            0 => Precondition::True,
            1 => flat.remove(0),
            _ => Precondition::Or(flat),
        }
    }

    /// Combines the fact sets of all before-variants of a rule.
    ///
    /// A type fact survives only when every variant has it, and is then
    /// hoisted into the outer conjunction unless every variant already
    /// invokes a member of that type. Member facts shared by every variant
    /// are hoisted too; the remaining member facts form one conjunction per
    /// variant under a disjunction, which is true as soon as one variant has
    /// nothing left.
    pub fn synthesize(variants: &[BTreeSet<Fact>]) -> Self {
        if variants.is_empty() {
            return Precondition::True;
        }

        let split: Vec<(BTreeSet<&str>, BTreeSet<&Fact>)> = variants
            .iter()
            .map(|facts| {
                let types = facts
                    .iter()
                    .filter_map(|f| match f {
                        Fact::UsesType(name) => Some(name.as_str()),
                        _ => None,
                    })
                    .collect();
                let members = facts.iter().filter(|f| matches!(f, Fact::UsesMember { .. })).collect();
                (types, members)
            })
            .collect();

        let common_types = intersect(split.iter().map(|(types, _)| types));
        let hoisted_types = common_types.into_iter().filter(|ty| {
            !split
                .iter()
                .all(|(_, members)| members.iter().any(|m| m.owner() == *ty))
        });

        let common_members = intersect(split.iter().map(|(_, members)| members));
        let remainders: Vec<Vec<&Fact>> = split
            .iter()
            .map(|(_, members)| members.difference(&common_members).copied().collect())
            .collect();
        let alternatives = if remainders.iter().any(|r| r.is_empty()) {
            Precondition::True
        } else {
            Precondition::or(
                remainders
                    .into_iter()
                    .map(|r| Precondition::and(r.into_iter().cloned().map(Precondition::Fact))),
            )
        };

        Precondition::and(
            hoisted_types
                .map(|ty| Precondition::Fact(Fact::uses_type(ty)))
                .chain(common_members.into_iter().cloned().map(Precondition::Fact))
                .chain(std::iter::once(alternatives)),
        )
    }

    /// Evaluates against a unit's index; unknown answers count as true.
    pub fn evaluate(&self, index: &dyn ApplicabilityIndex) -> bool {
        match self {
            Precondition::True => true,
            Precondition::Fact(Fact::UsesType(name)) => index.uses_type(name).unwrap_or(true),
            Precondition::Fact(Fact::UsesMember { owner, member }) => {
                index.uses_member(owner, member).unwrap_or(true)
            }
            Precondition::And(parts) => parts.iter().all(|p| p.evaluate(index)),
            Precondition::Or(parts) => parts.iter().any(|p| p.evaluate(index)),
        }
    }

    /// All facts mentioned anywhere in the expression.
    pub fn facts(&self) -> BTreeSet<&Fact> {
        let mut out = BTreeSet::new();
        self.collect_facts(&mut out);
        out
    }

    fn collect_facts<'a>(&'a self, out: &mut BTreeSet<&'a Fact>) {
        match self {
            Precondition::True => {}
            Precondition::Fact(fact) => {
                out.insert(fact);
            }
            Precondition::And(parts) | Precondition::Or(parts) => {
                for part in parts {
                    part.collect_facts(out);
                }
            }
        }
    }
}

fn push_unique(flat: &mut Vec<Precondition>, operand: Precondition) {
    if !flat.contains(&operand) {
        flat.push(operand);
    }
}

fn intersect<'s, T: Ord + Clone + 's>(mut sets: impl Iterator<Item = &'s BTreeSet<T>>) -> BTreeSet<T> {
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first.clone(), |acc, set| acc.intersection(set).cloned().collect())
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |f: &mut fmt::Formatter<'_>, name: &str, parts: &[Precondition]| {
            write!(f, "{}(", name)?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", part)?;
            }
            write!(f, ")")
        };
        match self {
            Precondition::True => write!(f, "true"),
            Precondition::Fact(fact) => write!(f, "{}", fact),
            Precondition::And(parts) => list(f, "and", parts),
            Precondition::Or(parts) => list(f, "or", parts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn println() -> Fact {
        Fact::uses_member("java.io.PrintStream", "println")
    }

    fn map() -> Fact {
        Fact::uses_type("java.util.Map")
    }

    fn list() -> Fact {
        Fact::uses_type("java.util.List")
    }

    fn set(facts: &[Fact]) -> BTreeSet<Fact> {
        facts.iter().cloned().collect()
    }

    struct FakeIndex {
        types: HashSet<String>,
        members: HashSet<(String, String)>,
    }

    impl ApplicabilityIndex for FakeIndex {
        fn uses_type(&self, name: &str) -> Option<bool> {
            Some(self.types.contains(name))
        }

        fn uses_member(&self, owner: &str, member: &str) -> Option<bool> {
            Some(self.members.contains(&(owner.to_string(), member.to_string())))
        }
    }

    struct Unknown;

    impl ApplicabilityIndex for Unknown {
        fn uses_type(&self, _: &str) -> Option<bool> {
            None
        }

        fn uses_member(&self, _: &str, _: &str) -> Option<bool> {
            None
        }
    }

    #[test]
    fn test_synthesis_table() {
        let length = Fact::uses_member("java.lang.String", "length");
        let equals = Fact::uses_member("java.lang.String", "equals");
        let cases: Vec<(Vec<BTreeSet<Fact>>, Precondition)> = vec![
            // primitive variant and Map variant share only the member
            (
                vec![set(&[println()]), set(&[map(), println()])],
                Precondition::Fact(println()),
            ),
            // every variant uses Map
            (
                vec![set(&[map(), println()]), set(&[map(), println()])],
                Precondition::And(vec![Precondition::Fact(map()), Precondition::Fact(println())]),
            ),
            // List in one variant, Map in the other
            (
                vec![set(&[list(), println()]), set(&[map(), println()])],
                Precondition::Fact(println()),
            ),
            // distinct members stay alternatives, in variant order
            (
                vec![set(&[length.clone()]), set(&[equals.clone()])],
                Precondition::Or(vec![Precondition::Fact(length), Precondition::Fact(equals)]),
            ),
            // nothing to filter on
            (vec![set(&[]), set(&[println()])], Precondition::True),
        ];
        for (variants, expected) in cases {
            assert_eq!(Precondition::synthesize(&variants), expected, "{:?}", variants);
        }
    }

    #[test]
    fn test_member_owner_entails_hoisted_type() {
        let get = Fact::uses_member("java.util.Map", "get");
        let put = Fact::uses_member("java.util.Map", "put");
        let pre = Precondition::synthesize(&[set(&[map(), get.clone()]), set(&[map(), put.clone()])]);
        assert_eq!(
            pre,
            Precondition::Or(vec![Precondition::Fact(get), Precondition::Fact(put)])
        );
    }

    #[test]
    fn test_evaluate() {
        let pre = Precondition::and([Precondition::Fact(map()), Precondition::Fact(println())]);
        let index = FakeIndex {
            types: HashSet::from(["java.util.Map".to_string()]),
            members: HashSet::new(),
        };
        assert!(!pre.evaluate(&index));
        assert!(pre.evaluate(&Unknown));
        assert!(Precondition::True.evaluate(&index));
    }

    #[test]
    fn test_constructors_normalize() {
        assert_eq!(Precondition::and([]), Precondition::True);
        assert_eq!(
            Precondition::or([Precondition::Fact(map()), Precondition::True]),
            Precondition::True
        );
        assert_eq!(
            Precondition::and([Precondition::Fact(map()), Precondition::Fact(map())]),
            Precondition::Fact(map())
        );
    }

    #[test]
    fn test_nested_operands_are_deduplicated() {
        let nested_and = Precondition::and([
            Precondition::Fact(map()),
            Precondition::And(vec![Precondition::Fact(map()), Precondition::Fact(println())]),
        ]);
        assert_eq!(
            nested_and,
            Precondition::And(vec![Precondition::Fact(map()), Precondition::Fact(println())])
        );

        let nested_or = Precondition::or([
            Precondition::Or(vec![Precondition::Fact(list()), Precondition::Fact(map())]),
            Precondition::Fact(list()),
        ]);
        assert_eq!(
            nested_or,
            Precondition::Or(vec![Precondition::Fact(list()), Precondition::Fact(map())])
        );
    }

    #[test]
    fn test_display() {
        let pre = Precondition::and([
            Precondition::Fact(println()),
            Precondition::or([Precondition::Fact(list()), Precondition::Fact(map())]),
        ]);
        assert_eq!(
            pre.to_string(),
            "and(UsesMember(java.io.PrintStream println(..)), or(UsesType(java.util.List), UsesType(java.util.Map)))"
        );
    }
}
