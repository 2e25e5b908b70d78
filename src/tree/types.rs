//! Java type model and type-string parsing.

use crate::error::{Result, RuleError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Names under `java.lang` that resolve without an import.
const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Comparable",
    "Double",
    "Enum",
    "Exception",
    "Float",
    "IllegalArgumentException",
    "IllegalStateException",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Runnable",
    "RuntimeException",
    "Short",
    "String",
    "StringBuilder",
    "System",
    "Throwable",
    "Void",
];

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";

static TYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\.\.|[A-Za-z_$][A-Za-z0-9_$]*(?:\s*\.\s*[A-Za-z_$][A-Za-z0-9_$]*)*|[<>,?&\[\]]")
        .expect("type token pattern is valid")
});

/// A Java primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// Parses a primitive type keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "char" => Primitive::Char,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// The wrapper class for this primitive.
    pub fn boxed_name(&self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Char => "java.lang.Character",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }

    /// Looks up the primitive a wrapper class unboxes to.
    pub fn unboxed_from(class: &str) -> Option<Self> {
        [
            Primitive::Boolean,
            Primitive::Byte,
            Primitive::Short,
            Primitive::Char,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ]
        .into_iter()
        .find(|p| p.boxed_name() == class)
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Primitive::Boolean)
    }

    fn rank(&self) -> u8 {
        match self {
            Primitive::Boolean => 0,
            Primitive::Byte => 1,
            Primitive::Short | Primitive::Char => 2,
            Primitive::Int => 3,
            Primitive::Long => 4,
            Primitive::Float => 5,
            Primitive::Double => 6,
        }
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(&self, target: Primitive) -> bool {
        if *self == target {
            return true;
        }
        if !self.is_numeric() || !target.is_numeric() {
            return false;
        }
        match (self, target) {
            // char and short do not widen into each other, and nothing widens into char
            (_, Primitive::Char) => false,
            (Primitive::Char, Primitive::Short) | (Primitive::Char, Primitive::Byte) => false,
            _ => self.rank() < target.rank(),
        }
    }

    /// Binary numeric promotion (JLS 5.6.2).
    pub fn promote(a: Primitive, b: Primitive) -> Primitive {
        let widest = if a.rank() >= b.rank() { a } else { b };
        if widest.rank() < Primitive::Int.rank() {
            Primitive::Int
        } else {
            widest
        }
    }
}

/// Bound on a wildcard type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<JavaType>),
    Super(Box<JavaType>),
}

/// A resolved Java type.
///
/// Class names are fully qualified. `Unknown` marks an expression whose type
/// the front end could not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(Primitive),
    Class { name: String, args: Vec<JavaType> },
    Array(Box<JavaType>),
    TypeVar(String),
    Wildcard(WildcardBound),
    Null,
    Void,
    Unknown,
}

impl JavaType {
    /// A class type without type arguments.
    pub fn class(name: impl Into<String>) -> Self {
        JavaType::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A parameterized class type.
    pub fn generic(name: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Class {
            name: name.into(),
            args,
        }
    }

    pub fn string() -> Self {
        JavaType::class(STRING)
    }

    pub fn object() -> Self {
        JavaType::class(OBJECT)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JavaType::Class { name, .. } if name == STRING)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JavaType::Class { name, .. } if name == OBJECT)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JavaType::Unknown)
    }

    /// The fully qualified class name, for class types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The primitive this type denotes, directly or by unboxing.
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            JavaType::Primitive(p) => Some(*p),
            JavaType::Class { name, .. } => Primitive::unboxed_from(name),
            _ => None,
        }
    }

    /// Boxes primitives; reference types are returned unchanged.
    pub fn boxed(&self) -> JavaType {
        match self {
            JavaType::Primitive(p) => JavaType::class(p.boxed_name()),
            other => other.clone(),
        }
    }

    /// Class names referenced anywhere in this type, including type arguments.
    pub fn referenced_classes(&self, out: &mut BTreeSet<String>) {
        match self {
            JavaType::Class { name, args } => {
                out.insert(name.clone());
                for arg in args {
                    arg.referenced_classes(out);
                }
            }
            JavaType::Array(elem) => elem.referenced_classes(out),
            JavaType::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => {
                b.referenced_classes(out)
            }
            _ => {}
        }
    }

    /// Replaces type variables using `subst`; unmapped variables are kept.
    pub fn substitute(&self, subst: &HashMap<String, JavaType>) -> JavaType {
        match self {
            JavaType::TypeVar(v) => subst.get(v).cloned().unwrap_or_else(|| self.clone()),
            JavaType::Class { name, args } => JavaType::Class {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(subst)).collect(),
            },
            JavaType::Array(elem) => JavaType::Array(Box::new(elem.substitute(subst))),
            JavaType::Wildcard(WildcardBound::Extends(b)) => {
                JavaType::Wildcard(WildcardBound::Extends(Box::new(b.substitute(subst))))
            }
            JavaType::Wildcard(WildcardBound::Super(b)) => {
                JavaType::Wildcard(WildcardBound::Super(Box::new(b.substitute(subst))))
            }
            other => other.clone(),
        }
    }

    /// Equality that treats `Unknown` and raw types as compatible with anything.
    pub fn same_as(&self, other: &JavaType) -> bool {
        match (self, other) {
            (JavaType::Unknown, _) | (_, JavaType::Unknown) => true,
            (
                JavaType::Class { name: a, args: aa },
                JavaType::Class { name: b, args: ba },
            ) => {
                a == b
                    && (aa.is_empty()
                        || ba.is_empty()
                        || (aa.len() == ba.len() && aa.iter().zip(ba).all(|(x, y)| x.same_as(y))))
            }
            (JavaType::Array(a), JavaType::Array(b)) => a.same_as(b),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => write!(f, "{}", p.keyword()),
            JavaType::Class { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            JavaType::Array(elem) => write!(f, "{}[]", elem),
            JavaType::TypeVar(v) => write!(f, "{}", v),
            JavaType::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
            JavaType::Wildcard(WildcardBound::Extends(b)) => write!(f, "? extends {}", b),
            JavaType::Wildcard(WildcardBound::Super(b)) => write!(f, "? super {}", b),
            JavaType::Null => write!(f, "null"),
            JavaType::Void => write!(f, "void"),
            JavaType::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// A declared type variable with its upper bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<JavaType>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn with_bound(mut self, bound: JavaType) -> Self {
        self.bounds.push(bound);
        self
    }

    /// True when no bound narrows the variable below `Object`.
    pub fn is_unbounded(&self) -> bool {
        self.bounds.iter().all(|b| b.is_object())
    }
}

/// Resolves simple type names against imports and type variables.
#[derive(Debug, Clone, Default)]
pub struct TypeNames {
    imports: HashMap<String, String>,
    type_vars: BTreeSet<String>,
}

impl TypeNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single-type import such as `java.util.Map`.
    pub fn with_import(mut self, fqn: impl AsRef<str>) -> Self {
        self.add_import(fqn.as_ref());
        self
    }

    pub fn add_import(&mut self, fqn: &str) {
        let fqn = fqn.trim();
        if let Some(simple) = fqn.rsplit('.').next() {
            self.imports.insert(simple.to_string(), fqn.to_string());
        }
    }

    pub fn with_type_var(mut self, name: impl Into<String>) -> Self {
        self.type_vars.insert(name.into());
        self
    }

    pub fn add_type_var(&mut self, name: &str) {
        self.type_vars.insert(name.to_string());
    }

    pub fn is_type_var(&self, name: &str) -> bool {
        self.type_vars.contains(name)
    }

    /// Resolves a (possibly qualified) class name to its fully qualified form.
    pub fn qualify(&self, name: &str) -> String {
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name.as_str(), None),
        };
        let starts_upper = head.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        if !starts_upper {
            // already a package-qualified name
            return name.clone();
        }
        let base = if let Some(fqn) = self.imports.get(head) {
            fqn.clone()
        } else if JAVA_LANG.contains(&head) {
            format!("java.lang.{}", head)
        } else {
            head.to_string()
        };
        match rest {
            Some(rest) => format!("{}.{}", base, rest),
            None => base,
        }
    }

    /// Resolves a name appearing in type position.
    pub fn resolve(&self, name: &str) -> JavaType {
        if let Some(p) = Primitive::from_keyword(name) {
            return JavaType::Primitive(p);
        }
        if name == "void" {
            return JavaType::Void;
        }
        if self.type_vars.contains(name) {
            return JavaType::TypeVar(name.to_string());
        }
        JavaType::class(self.qualify(name))
    }

    /// Parses Java type syntax such as `Map<String, ? extends List<T>>[]`.
    pub fn parse(&self, text: &str) -> Result<JavaType> {
        let tokens: Vec<&str> = TYPE_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
        let significant = text.chars().filter(|c| !c.is_whitespace()).count();
        let token_chars: usize = tokens
            .iter()
            .map(|t| t.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        if tokens.is_empty() || token_chars != significant {
            return Err(RuleError::TypeSyntax(text.to_string()));
        }
        let mut parser = TypeParser {
            names: self,
            tokens,
            pos: 0,
            source: text,
        };
        let ty = parser.parse_type()?;
        if parser.pos != parser.tokens.len() {
            return Err(RuleError::TypeSyntax(text.to_string()));
        }
        Ok(ty)
    }

    /// Parses a `&`-separated bound list such as `Comparable<T> & Serializable`.
    pub fn parse_bounds(&self, text: &str) -> Result<Vec<JavaType>> {
        let mut bounds = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (i, c) in text.char_indices() {
            match c {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                '&' if depth == 0 => {
                    bounds.push(self.parse(&text[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if !text[start..].trim().is_empty() {
            bounds.push(self.parse(&text[start..])?);
        }
        Ok(bounds)
    }

    /// Parses a type, falling back to `Unknown` on malformed input.
    pub(crate) fn parse_or_unknown(&self, text: &str) -> JavaType {
        self.parse(text).unwrap_or(JavaType::Unknown)
    }
}

struct TypeParser<'a> {
    names: &'a TypeNames,
    tokens: Vec<&'a str>,
    pos: usize,
    source: &'a str,
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<&'a str> {
        let tok = self.tokens.get(self.pos).copied();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        if self.bump() == Some(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn error(&self) -> RuleError {
        RuleError::TypeSyntax(self.source.to_string())
    }

    fn parse_type(&mut self) -> Result<JavaType> {
        let mut ty = self.parse_base()?;
        loop {
            match self.peek() {
                Some("[") => {
                    self.bump();
                    self.expect("]")?;
                    ty = JavaType::Array(Box::new(ty));
                }
                Some("...") => {
                    self.bump();
                    ty = JavaType::Array(Box::new(ty));
                }
                _ => return Ok(ty),
            }
        }
    }

    fn parse_base(&mut self) -> Result<JavaType> {
        let tok = self.bump().ok_or_else(|| self.error())?;
        if tok == "?" {
            let bound = match self.peek() {
                Some("extends") => {
                    self.bump();
                    WildcardBound::Extends(Box::new(self.parse_type()?))
                }
                Some("super") => {
                    self.bump();
                    WildcardBound::Super(Box::new(self.parse_type()?))
                }
                _ => WildcardBound::Unbounded,
            };
            return Ok(JavaType::Wildcard(bound));
        }
        if !tok.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
            return Err(self.error());
        }
        let mut ty = self.names.resolve(tok);
        if self.peek() == Some("<") {
            self.bump();
            let mut args = Vec::new();
            if self.peek() != Some(">") {
                loop {
                    args.push(self.parse_type()?);
                    match self.bump() {
                        Some(",") => continue,
                        Some(">") => break,
                        _ => return Err(self.error()),
                    }
                }
            } else {
                self.bump();
            }
            match &mut ty {
                JavaType::Class { args: slot, .. } => *slot = args,
                _ => return Err(self.error()),
            }
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_and_string() {
        let names = TypeNames::new();
        assert_eq!(names.parse("int").unwrap(), JavaType::Primitive(Primitive::Int));
        assert_eq!(names.parse("String").unwrap(), JavaType::string());
    }

    #[test]
    fn test_parse_generic_with_wildcards() {
        let names = TypeNames::new().with_import("java.util.Map");
        let ty = names.parse("Map<?, ? extends Number>").unwrap();
        assert_eq!(ty.to_string(), "java.util.Map<?, ? extends java.lang.Number>");
    }

    #[test]
    fn test_parse_type_vars_and_arrays() {
        let names = TypeNames::new().with_type_var("T").with_import("java.util.List");
        let ty = names.parse("List<T>[]").unwrap();
        assert_eq!(
            ty,
            JavaType::Array(Box::new(JavaType::generic(
                "java.util.List",
                vec![JavaType::TypeVar("T".into())]
            )))
        );
        assert_eq!(
            names.parse("char...").unwrap(),
            JavaType::Array(Box::new(JavaType::Primitive(Primitive::Char)))
        );
    }

    #[test]
    fn test_parse_nested_member_type() {
        let names = TypeNames::new().with_import("java.util.Map");
        let ty = names.parse("Map.Entry<K, V>").unwrap();
        assert_eq!(ty.class_name(), Some("java.util.Map.Entry"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let names = TypeNames::new();
        assert!(names.parse("List<").is_err());
        assert!(names.parse("Map<String>>").is_err());
        assert!(names.parse("").is_err());
        assert!(names.parse("int %").is_err());
    }

    #[test]
    fn test_parse_bounds() {
        let names = TypeNames::new().with_type_var("T");
        let bounds = names.parse_bounds("Comparable<? super T> & java.io.Serializable").unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[1].class_name(), Some("java.io.Serializable"));
    }

    #[test]
    fn test_widening() {
        assert!(Primitive::Int.widens_to(Primitive::Double));
        assert!(Primitive::Char.widens_to(Primitive::Int));
        assert!(!Primitive::Double.widens_to(Primitive::Int));
        assert!(!Primitive::Short.widens_to(Primitive::Char));
        assert!(!Primitive::Boolean.widens_to(Primitive::Int));
    }

    #[test]
    fn test_promote() {
        assert_eq!(Primitive::promote(Primitive::Byte, Primitive::Short), Primitive::Int);
        assert_eq!(Primitive::promote(Primitive::Int, Primitive::Double), Primitive::Double);
    }

    #[test]
    fn test_same_as_tolerates_raw_and_unknown() {
        let raw = JavaType::class("java.util.List");
        let typed = JavaType::generic("java.util.List", vec![JavaType::string()]);
        assert!(raw.same_as(&typed));
        assert!(JavaType::Unknown.same_as(&typed));
        assert!(!JavaType::string().same_as(&JavaType::object()));
    }
}
