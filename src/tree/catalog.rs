//! Known library classes: supertypes, members and assignability.
//!
//! The catalog stands in for the host compiler's symbol tables. It ships with
//! a small slice of the JDK and can be extended from rule-set configuration.

use super::types::{JavaType, OBJECT, TypeNames, TypeParam, WildcardBound};
use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A serializable description of a library class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    /// Fully qualified class name.
    pub name: String,

    /// Declared type parameter names, in order.
    #[serde(default)]
    pub type_params: Vec<String>,

    /// Direct supertypes in Java syntax, fully qualified.
    #[serde(default)]
    pub supertypes: Vec<String>,

    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

/// A method or field of a [`ClassSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,

    /// Return type (or field type) in Java syntax.
    pub returns: String,

    #[serde(default, rename = "static")]
    pub is_static: bool,

    #[serde(default)]
    pub field: bool,

    /// Method-level type parameters used in `returns`.
    #[serde(default)]
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone)]
struct MemberInfo {
    name: String,
    returns: JavaType,
    is_static: bool,
    is_field: bool,
}

#[derive(Debug, Clone, Default)]
struct ClassInfo {
    type_params: Vec<String>,
    supertypes: Vec<JavaType>,
    members: Vec<MemberInfo>,
}

/// A member found by [`TypeCatalog::find_member`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    /// The class that declares the member.
    pub declaring: String,
    /// The member type with the owner's type arguments substituted.
    pub returns: JavaType,
    pub is_static: bool,
}

/// Type-variable bindings accumulated during one match attempt.
#[derive(Debug, Clone)]
pub struct TypeBindings<'a> {
    declared: &'a [TypeParam],
    bound: HashMap<String, JavaType>,
}

impl<'a> TypeBindings<'a> {
    pub fn new(declared: &'a [TypeParam]) -> Self {
        Self {
            declared,
            bound: HashMap::new(),
        }
    }

    fn param(&self, name: &str) -> Option<&'a TypeParam> {
        self.declared.iter().find(|p| p.name == name)
    }

    fn is_unbounded(&self, name: &str) -> bool {
        self.param(name).is_none_or(|p| p.is_unbounded())
    }

    pub fn get(&self, name: &str) -> Option<&JavaType> {
        self.bound.get(name)
    }

    pub fn into_map(self) -> HashMap<String, JavaType> {
        self.bound
    }
}

/// Registry of known classes.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    classes: HashMap<String, ClassInfo>,
}

impl TypeCatalog {
    /// Creates a catalog that knows no classes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalog preloaded with common `java.lang`, `java.util` and
    /// `java.io` classes.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for spec in builtin_specs() {
            catalog.insert(&spec);
        }
        catalog
    }

    /// Adds (or replaces) classes described by configuration.
    pub fn extend(&mut self, specs: &[ClassSpec]) -> Result<()> {
        for spec in specs {
            self.validate(spec)?;
        }
        for spec in specs {
            self.insert(spec);
        }
        Ok(())
    }

    fn names_for(spec: &ClassSpec) -> TypeNames {
        let mut names = TypeNames::new();
        for param in &spec.type_params {
            names.add_type_var(param);
        }
        names
    }

    fn validate(&self, spec: &ClassSpec) -> Result<()> {
        if spec.name.trim().is_empty() {
            return Err(RuleError::InvalidConfig("class spec without a name".into()));
        }
        let names = Self::names_for(spec);
        for sup in &spec.supertypes {
            names.parse(sup)?;
        }
        for member in &spec.members {
            Self::member_names(&names, member).parse(&member.returns)?;
        }
        Ok(())
    }

    fn member_names(class_names: &TypeNames, member: &MemberSpec) -> TypeNames {
        let mut names = class_names.clone();
        for param in &member.type_params {
            names.add_type_var(param);
        }
        names
    }

    fn insert(&mut self, spec: &ClassSpec) {
        let names = Self::names_for(spec);
        let info = ClassInfo {
            type_params: spec.type_params.clone(),
            supertypes: spec
                .supertypes
                .iter()
                .map(|s| names.parse_or_unknown(s))
                .collect(),
            members: spec
                .members
                .iter()
                .map(|m| MemberInfo {
                    name: m.name.clone(),
                    returns: Self::member_names(&names, m).parse_or_unknown(&m.returns),
                    is_static: m.is_static,
                    is_field: m.field,
                })
                .collect(),
        };
        self.classes.insert(spec.name.clone(), info);
    }

    /// Returns true if the class is known to the catalog.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Classes of the catalog declared directly in `package`.
    pub fn classes_in_package(&self, package: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .classes
            .keys()
            .filter(|name| {
                name.strip_prefix(package)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|simple| !simple.contains('.'))
            })
            .cloned()
            .collect();
        found.sort();
        found
    }

    /// Returns the class itself followed by all of its transitive supertypes.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.classes.get(&current) {
                for sup in &info.supertypes {
                    if let Some(sup_name) = sup.class_name() {
                        queue.push_back(sup_name.to_string());
                    }
                }
            }
            order.push(current);
        }
        if !seen.contains(OBJECT) {
            order.push(OBJECT.to_string());
        }
        order
    }

    /// Returns true if `sub` is `sup` or one of its subtypes.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        sub == sup || sup == OBJECT || self.ancestors(sub).iter().any(|a| a == sup)
    }

    /// Views `ty` as an instance of `target`, carrying type arguments through
    /// the supertype chain (`ArrayList<String>` as `List` is `List<String>`).
    pub fn as_super(&self, ty: &JavaType, target: &str) -> Option<JavaType> {
        if target == OBJECT {
            return Some(JavaType::object());
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(view) = queue.pop_front() {
            let JavaType::Class { name, args } = &view else {
                continue;
            };
            if name == target {
                return Some(view.clone());
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(info) = self.classes.get(name) {
                let subst = Self::substitution(info, args);
                for sup in &info.supertypes {
                    queue.push_back(sup.substitute(&subst));
                }
            }
        }
        None
    }

    fn substitution(info: &ClassInfo, args: &[JavaType]) -> HashMap<String, JavaType> {
        info.type_params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let arg = if args.len() == info.type_params.len() {
                    args[i].clone()
                } else {
                    // raw use of a generic class
                    JavaType::Unknown
                };
                (param.clone(), arg)
            })
            .collect()
    }

    /// Finds a method (or a field when `field` is set) on `owner` or its supertypes.
    pub fn find_member(&self, owner: &JavaType, name: &str, field: bool) -> Option<ResolvedMember> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([owner.clone()]);
        if owner.class_name().is_some_and(|n| n != OBJECT) {
            queue.push_back(JavaType::object());
        }
        while let Some(view) = queue.pop_front() {
            let JavaType::Class { name: class, args } = &view else {
                continue;
            };
            if !seen.insert(class.clone()) {
                continue;
            }
            let Some(info) = self.classes.get(class) else {
                continue;
            };
            let subst = Self::substitution(info, args);
            if let Some(member) = info
                .members
                .iter()
                .find(|m| m.name == name && m.is_field == field)
            {
                return Some(ResolvedMember {
                    declaring: class.clone(),
                    returns: erase_free_vars(&member.returns.substitute(&subst)),
                    is_static: member.is_static,
                });
            }
            for sup in &info.supertypes {
                queue.push_back(sup.substitute(&subst));
            }
        }
        None
    }

    /// Checks assignment compatibility of `from` into `to`, binding type
    /// variables of `to` consistently in `bindings`.
    pub fn is_assignable(&self, from: &JavaType, to: &JavaType, bindings: &mut TypeBindings) -> bool {
        use JavaType::*;
        match (from, to) {
            (_, Unknown) => true,
            (Unknown, TypeVar(v)) => bindings.is_unbounded(v),
            (Unknown, to) => to.is_object(),
            (Void, _) | (_, Void) => false,
            (_, TypeVar(v)) => self.bind_var(v, from, bindings),
            (Null, Primitive(_)) => false,
            (Null, _) => true,
            (Primitive(a), Primitive(c)) => a.widens_to(*c),
            (Primitive(_), _) => self.is_assignable(&from.boxed(), to, bindings),
            (Class { .. }, Primitive(p)) => from.as_primitive().is_some_and(|a| a.widens_to(*p)),
            (Array(a), Array(c)) => {
                if a.is_primitive() || c.is_primitive() {
                    a == c
                } else {
                    self.is_assignable(a, c, bindings)
                }
            }
            (Array(_), Class { name, .. }) => {
                name == OBJECT || name == "java.lang.Cloneable" || name == "java.io.Serializable"
            }
            (Wildcard(WildcardBound::Extends(bound)), _) => self.is_assignable(bound, to, bindings),
            (TypeVar(_) | Wildcard(_), _) => to.is_object(),
            (Class { .. }, Class { name, args }) => {
                let Some(JavaType::Class { args: actual, .. }) = self.as_super(from, name) else {
                    return false;
                };
                if args.is_empty() || actual.is_empty() || args.len() != actual.len() {
                    return true;
                }
                actual
                    .iter()
                    .zip(args)
                    .all(|(a, f)| self.contains_arg(a, f, bindings))
            }
            _ => false,
        }
    }

    /// Type argument containment (JLS 4.5.1).
    fn contains_arg(&self, actual: &JavaType, formal: &JavaType, bindings: &mut TypeBindings) -> bool {
        use JavaType::Wildcard;
        match formal {
            Wildcard(WildcardBound::Unbounded) => true,
            Wildcard(WildcardBound::Extends(bound)) => match actual {
                Wildcard(WildcardBound::Extends(x)) => self.is_assignable(x, bound, bindings),
                Wildcard(_) => bound.is_object(),
                other => self.is_assignable(other, bound, bindings),
            },
            Wildcard(WildcardBound::Super(bound)) => match actual {
                Wildcard(WildcardBound::Super(x)) => self.is_assignable(bound, x, bindings),
                Wildcard(_) => false,
                other => self.is_assignable(bound, other, bindings),
            },
            _ => self.unify_exact(actual, formal, bindings),
        }
    }

    fn unify_exact(&self, actual: &JavaType, formal: &JavaType, bindings: &mut TypeBindings) -> bool {
        use JavaType::*;
        match (actual, formal) {
            (Unknown, _) | (_, Unknown) => true,
            (_, TypeVar(v)) => self.bind_var(v, actual, bindings),
            (Class { name: a, args: aa }, Class { name: f, args: fa }) => {
                a == f
                    && (aa.is_empty()
                        || fa.is_empty()
                        || (aa.len() == fa.len()
                            && aa
                                .iter()
                                .zip(fa)
                                .all(|(x, y)| self.contains_arg(x, y, bindings))))
            }
            (Array(a), Array(f)) => self.unify_exact(a, f, bindings),
            (a, f) => a == f,
        }
    }

    fn bind_var(&self, var: &str, ty: &JavaType, bindings: &mut TypeBindings) -> bool {
        let Some(param) = bindings.param(var) else {
            // not one of the rule's type variables
            return true;
        };
        if !ty.is_known() {
            return param.is_unbounded();
        }
        let ty = ty.boxed();
        if let Some(existing) = bindings.bound.get(var) {
            return existing.same_as(&ty);
        }
        bindings.bound.insert(var.to_string(), ty.clone());
        param
            .bounds
            .iter()
            .all(|bound| self.is_assignable(&ty, bound, bindings))
    }
}

/// Replaces type variables left over after substitution (method-level
/// generics) with `Unknown`.
fn erase_free_vars(ty: &JavaType) -> JavaType {
    match ty {
        JavaType::TypeVar(_) => JavaType::Unknown,
        JavaType::Class { name, args } => JavaType::Class {
            name: name.clone(),
            args: args.iter().map(erase_free_vars).collect(),
        },
        JavaType::Array(elem) => JavaType::Array(Box::new(erase_free_vars(elem))),
        JavaType::Wildcard(WildcardBound::Extends(b)) => {
            JavaType::Wildcard(WildcardBound::Extends(Box::new(erase_free_vars(b))))
        }
        JavaType::Wildcard(WildcardBound::Super(b)) => {
            JavaType::Wildcard(WildcardBound::Super(Box::new(erase_free_vars(b))))
        }
        other => other.clone(),
    }
}

fn class(name: &str, params: &[&str], supers: &[&str], members: Vec<MemberSpec>) -> ClassSpec {
    ClassSpec {
        name: name.to_string(),
        type_params: params.iter().map(|s| s.to_string()).collect(),
        supertypes: supers.iter().map(|s| s.to_string()).collect(),
        members,
    }
}

fn methods(list: &[(&str, &str)]) -> Vec<MemberSpec> {
    list.iter()
        .map(|(name, returns)| MemberSpec {
            name: name.to_string(),
            returns: returns.to_string(),
            is_static: false,
            field: false,
            type_params: Vec::new(),
        })
        .collect()
}

fn generic(members: Vec<MemberSpec>, vars: &[&str]) -> Vec<MemberSpec> {
    members
        .into_iter()
        .map(|mut m| {
            m.type_params = vars.iter().map(|v| v.to_string()).collect();
            m
        })
        .collect()
}

fn statics(list: &[(&str, &str)]) -> Vec<MemberSpec> {
    methods(list)
        .into_iter()
        .map(|mut m| {
            m.is_static = true;
            m
        })
        .collect()
}

fn static_fields(list: &[(&str, &str)]) -> Vec<MemberSpec> {
    statics(list)
        .into_iter()
        .map(|mut m| {
            m.field = true;
            m
        })
        .collect()
}

fn builtin_specs() -> Vec<ClassSpec> {
    let chain = |parts: Vec<Vec<MemberSpec>>| parts.into_iter().flatten().collect::<Vec<_>>();
    vec![
        class(
            "java.lang.Object",
            &[],
            &[],
            methods(&[
                ("equals", "boolean"),
                ("hashCode", "int"),
                ("toString", "java.lang.String"),
                ("getClass", "java.lang.Class<?>"),
            ]),
        ),
        class("java.io.Serializable", &[], &[], vec![]),
        class("java.lang.Cloneable", &[], &[], vec![]),
        class("java.lang.Class", &["T"], &[], methods(&[("getName", "java.lang.String")])),
        class(
            "java.lang.CharSequence",
            &[],
            &[],
            methods(&[("length", "int"), ("charAt", "char"), ("isEmpty", "boolean")]),
        ),
        class("java.lang.Comparable", &["T"], &[], methods(&[("compareTo", "int")])),
        class(
            "java.lang.Throwable",
            &[],
            &["java.io.Serializable"],
            methods(&[("getMessage", "java.lang.String"), ("getCause", "java.lang.Throwable")]),
        ),
        class("java.lang.Exception", &[], &["java.lang.Throwable"], vec![]),
        class("java.lang.RuntimeException", &[], &["java.lang.Exception"], vec![]),
        class("java.lang.IllegalArgumentException", &[], &["java.lang.RuntimeException"], vec![]),
        class("java.lang.IllegalStateException", &[], &["java.lang.RuntimeException"], vec![]),
        class(
            "java.lang.String",
            &[],
            &[
                "java.lang.CharSequence",
                "java.lang.Comparable<java.lang.String>",
                "java.io.Serializable",
            ],
            chain(vec![
                methods(&[
                    ("length", "int"),
                    ("isEmpty", "boolean"),
                    ("isBlank", "boolean"),
                    ("equals", "boolean"),
                    ("equalsIgnoreCase", "boolean"),
                    ("contains", "boolean"),
                    ("startsWith", "boolean"),
                    ("endsWith", "boolean"),
                    ("charAt", "char"),
                    ("indexOf", "int"),
                    ("substring", "java.lang.String"),
                    ("trim", "java.lang.String"),
                    ("strip", "java.lang.String"),
                    ("toUpperCase", "java.lang.String"),
                    ("toLowerCase", "java.lang.String"),
                    ("concat", "java.lang.String"),
                    ("replace", "java.lang.String"),
                    ("split", "java.lang.String[]"),
                    ("toCharArray", "char[]"),
                ]),
                statics(&[
                    ("valueOf", "java.lang.String"),
                    ("copyValueOf", "java.lang.String"),
                    ("format", "java.lang.String"),
                    ("join", "java.lang.String"),
                ]),
            ]),
        ),
        class(
            "java.lang.StringBuilder",
            &[],
            &["java.lang.CharSequence"],
            methods(&[
                ("append", "java.lang.StringBuilder"),
                ("length", "int"),
                ("reverse", "java.lang.StringBuilder"),
            ]),
        ),
        class(
            "java.lang.System",
            &[],
            &[],
            chain(vec![
                static_fields(&[("out", "java.io.PrintStream"), ("err", "java.io.PrintStream")]),
                statics(&[
                    ("currentTimeMillis", "long"),
                    ("nanoTime", "long"),
                    ("lineSeparator", "java.lang.String"),
                ]),
            ]),
        ),
        class(
            "java.io.PrintStream",
            &[],
            &[],
            methods(&[("println", "void"), ("print", "void"), ("flush", "void")]),
        ),
        class(
            "java.lang.Number",
            &[],
            &["java.io.Serializable"],
            methods(&[
                ("intValue", "int"),
                ("longValue", "long"),
                ("doubleValue", "double"),
            ]),
        ),
        class(
            "java.lang.Integer",
            &[],
            &["java.lang.Number", "java.lang.Comparable<java.lang.Integer>"],
            chain(vec![
                statics(&[
                    ("valueOf", "java.lang.Integer"),
                    ("parseInt", "int"),
                    ("compare", "int"),
                ]),
                static_fields(&[("MAX_VALUE", "int"), ("MIN_VALUE", "int")]),
            ]),
        ),
        class(
            "java.lang.Long",
            &[],
            &["java.lang.Number", "java.lang.Comparable<java.lang.Long>"],
            statics(&[("valueOf", "java.lang.Long"), ("parseLong", "long")]),
        ),
        class(
            "java.lang.Double",
            &[],
            &["java.lang.Number", "java.lang.Comparable<java.lang.Double>"],
            statics(&[("valueOf", "java.lang.Double"), ("parseDouble", "double")]),
        ),
        class(
            "java.lang.Boolean",
            &[],
            &["java.lang.Comparable<java.lang.Boolean>", "java.io.Serializable"],
            chain(vec![
                methods(&[("booleanValue", "boolean")]),
                statics(&[("valueOf", "java.lang.Boolean"), ("parseBoolean", "boolean")]),
                static_fields(&[("TRUE", "java.lang.Boolean"), ("FALSE", "java.lang.Boolean")]),
            ]),
        ),
        class(
            "java.lang.Character",
            &[],
            &["java.lang.Comparable<java.lang.Character>", "java.io.Serializable"],
            statics(&[("isDigit", "boolean"), ("isLetter", "boolean")]),
        ),
        class(
            "java.lang.Iterable",
            &["T"],
            &[],
            methods(&[("iterator", "java.util.Iterator<T>"), ("forEach", "void")]),
        ),
        class(
            "java.util.Iterator",
            &["E"],
            &[],
            methods(&[("next", "E"), ("hasNext", "boolean")]),
        ),
        class(
            "java.util.Collection",
            &["E"],
            &["java.lang.Iterable<E>"],
            methods(&[
                ("size", "int"),
                ("isEmpty", "boolean"),
                ("contains", "boolean"),
                ("containsAll", "boolean"),
                ("add", "boolean"),
                ("addAll", "boolean"),
                ("remove", "boolean"),
                ("clear", "void"),
                ("stream", "java.util.stream.Stream<E>"),
                ("toArray", "java.lang.Object[]"),
            ]),
        ),
        class(
            "java.util.List",
            &["E"],
            &["java.util.Collection<E>"],
            chain(vec![
                methods(&[
                    ("get", "E"),
                    ("set", "E"),
                    ("indexOf", "int"),
                    ("subList", "java.util.List<E>"),
                ]),
                statics(&[("of", "java.util.List<E>"), ("copyOf", "java.util.List<E>")]),
            ]),
        ),
        class("java.util.ArrayList", &["E"], &["java.util.List<E>"], vec![]),
        class("java.util.LinkedList", &["E"], &["java.util.List<E>"], vec![]),
        class(
            "java.util.Set",
            &["E"],
            &["java.util.Collection<E>"],
            statics(&[("of", "java.util.Set<E>")]),
        ),
        class("java.util.HashSet", &["E"], &["java.util.Set<E>"], vec![]),
        class(
            "java.util.Map",
            &["K", "V"],
            &[],
            chain(vec![
                methods(&[
                    ("get", "V"),
                    ("put", "V"),
                    ("remove", "V"),
                    ("getOrDefault", "V"),
                    ("containsKey", "boolean"),
                    ("containsValue", "boolean"),
                    ("size", "int"),
                    ("isEmpty", "boolean"),
                    ("keySet", "java.util.Set<K>"),
                    ("values", "java.util.Collection<V>"),
                    ("entrySet", "java.util.Set<java.util.Map.Entry<K, V>>"),
                ]),
                statics(&[("of", "java.util.Map<K, V>")]),
            ]),
        ),
        class(
            "java.util.Map.Entry",
            &["K", "V"],
            &[],
            methods(&[("getKey", "K"), ("getValue", "V")]),
        ),
        class("java.util.HashMap", &["K", "V"], &["java.util.Map<K, V>"], vec![]),
        class("java.util.TreeMap", &["K", "V"], &["java.util.Map<K, V>"], vec![]),
        class(
            "java.util.Collections",
            &[],
            &[],
            generic(
                statics(&[
                    ("emptyList", "java.util.List<T>"),
                    ("emptySet", "java.util.Set<T>"),
                    ("emptyMap", "java.util.Map<K, V>"),
                    ("singletonList", "java.util.List<T>"),
                    ("unmodifiableList", "java.util.List<T>"),
                ]),
                &["T", "K", "V"],
            ),
        ),
        class(
            "java.util.Arrays",
            &[],
            &[],
            generic(
                statics(&[("asList", "java.util.List<T>"), ("stream", "java.util.stream.Stream<T>")]),
                &["T"],
            ),
        ),
        class(
            "java.util.Objects",
            &[],
            &[],
            generic(
                statics(&[
                    ("equals", "boolean"),
                    ("isNull", "boolean"),
                    ("nonNull", "boolean"),
                    ("hash", "int"),
                    ("requireNonNull", "T"),
                ]),
                &["T"],
            ),
        ),
        class(
            "java.util.Optional",
            &["T"],
            &[],
            chain(vec![
                methods(&[
                    ("get", "T"),
                    ("isPresent", "boolean"),
                    ("isEmpty", "boolean"),
                    ("orElse", "T"),
                    ("orElseGet", "T"),
                    ("orElseThrow", "T"),
                ]),
                statics(&[
                    ("of", "java.util.Optional<T>"),
                    ("ofNullable", "java.util.Optional<T>"),
                    ("empty", "java.util.Optional<T>"),
                ]),
            ]),
        ),
        class(
            "java.util.stream.Stream",
            &["T"],
            &[],
            chain(vec![
                methods(&[
                    ("toList", "java.util.List<T>"),
                    ("filter", "java.util.stream.Stream<T>"),
                    ("count", "long"),
                    ("findFirst", "java.util.Optional<T>"),
                    ("min", "java.util.Optional<T>"),
                    ("max", "java.util.Optional<T>"),
                    ("anyMatch", "boolean"),
                ]),
                statics(&[("of", "java.util.stream.Stream<T>")]),
            ]),
        ),
        class(
            "java.util.Comparator",
            &["T"],
            &[],
            methods(&[("compare", "int"), ("reversed", "java.util.Comparator<T>")]),
        ),
    ]
}
