//! Core term representation for the rewriting machine. The main enum,
//! [`Value`], is the closed set of shapes the reducer ever inspects:
//! the empty program, primitive combinators, dictionary names,
//! sequential composition, quoted subprograms, and the two literal
//! atoms (text and prompt). Construction of compositions goes through
//! the [`catenate`] smart constructor, which maintains the flatness
//! invariant the reducer relies on. Rendering back to source text is
//! the `Display` implementation; parse → print → parse is a fixed
//! point.

use std::fmt;

/// Characters allowed in names after the initial letter, for both
/// combinator and dictionary identifiers.
pub(crate) const NAME_TAIL_CHARS: &str = "_-";

fn is_name_tail(c: char) -> bool {
    c.is_ascii_alphanumeric() || NAME_TAIL_CHARS.contains(c)
}

/// Check if a word is a valid combinator name: `[A-Z][A-Za-z0-9_-]*`.
/// Note: This function is exercised by the reader tests in reader.rs.
pub(crate) fn is_constant_name(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.is_ascii_uppercase() && chars.all(is_name_tail),
        None => false,
    }
}

/// Check if a word is a valid dictionary name: `[a-z][A-Za-z0-9_-]*`.
pub(crate) fn is_variable_name(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.is_ascii_lowercase() && chars.all(is_name_tail),
        None => false,
    }
}

/// A term of the command language.
///
/// Values are immutable once constructed; ownership is tree-shaped and
/// the machine's stacks hold whole subtrees. `Catenate` is kept flat:
/// none of its children is `Id` or another `Catenate`, and it always
/// holds at least two children. Build compositions with [`catenate`]
/// rather than the variant itself to preserve this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The empty program, identity under catenation. Renders as "".
    Id,
    /// A primitive combinator, named with an uppercase initial.
    Constant(String),
    /// A name resolved through the session dictionary.
    Variable(String),
    /// Sequential composition of at least two terms.
    Catenate(Vec<Value>),
    /// A deferred program carried as a first-class datum.
    Quote(Box<Value>),
    /// A string literal. The payload is opaque: no escape processing.
    Text(String),
    /// An inert natural-language message, never reduced.
    Prompt(String),
}

impl Value {
    /// The quoted program inside a `Quote`, if this is one.
    pub fn quote_body(&self) -> Option<&Value> {
        match self {
            Value::Quote(body) => Some(body),
            _ => None,
        }
    }

    /// The payload of a `Text`, if this is one.
    pub fn text_payload(&self) -> Option<&str> {
        match self {
            Value::Text(payload) => Some(payload),
            _ => None,
        }
    }

    /// True for the empty program.
    pub fn is_id(&self) -> bool {
        matches!(self, Value::Id)
    }
}

/// Compose terms sequentially, maintaining the flatness invariant:
/// children of nested `Catenate`s are spliced in place and `Id`s are
/// dropped. Zero surviving elements give `Id`; one gives that element
/// back unchanged.
pub fn catenate(values: Vec<Value>) -> Value {
    let mut buf = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Id => {}
            Value::Catenate(children) => buf.extend(children),
            other => buf.push(other),
        }
    }
    match buf.len() {
        0 => Value::Id,
        1 => buf.pop().unwrap_or(Value::Id),
        _ => Value::Catenate(buf),
    }
}

/// Helper for building combinator terms in tests and fixtures.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn con<S: AsRef<str>>(name: S) -> Value {
    Value::Constant(name.as_ref().to_owned())
}

/// Helper for building dictionary-name terms.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn var<S: AsRef<str>>(name: S) -> Value {
    Value::Variable(name.as_ref().to_owned())
}

/// Helper for quoting a term.
pub(crate) fn quo(body: Value) -> Value {
    Value::Quote(Box::new(body))
}

/// Helper for text literals.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn txt<S: AsRef<str>>(payload: S) -> Value {
    Value::Text(payload.as_ref().to_owned())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Id => Ok(()),
            Value::Constant(name) | Value::Variable(name) => write!(f, "{name}"),
            Value::Catenate(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Value::Quote(body) => write!(f, "[{body}]"),
            Value::Text(payload) => write!(f, "\"{payload}\""),
            Value::Prompt(payload) => write!(f, "{{{payload}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catenate_flattening_data_driven() {
        // (input, expected) pairs exercising the smart constructor
        let test_cases = vec![
            // Empty and identity cases
            (vec![], Value::Id),
            (vec![Value::Id], Value::Id),
            (vec![Value::Id, Value::Id], Value::Id),
            // Single survivor is returned unwrapped
            (vec![con("Copy")], con("Copy")),
            (vec![Value::Id, var("x"), Value::Id], var("x")),
            // Nested catenations are spliced, not nested
            (
                vec![catenate(vec![var("a"), var("b")]), var("c")],
                Value::Catenate(vec![var("a"), var("b"), var("c")]),
            ),
            (
                vec![
                    var("a"),
                    catenate(vec![var("b"), catenate(vec![var("c"), var("d")])]),
                ],
                Value::Catenate(vec![var("a"), var("b"), var("c"), var("d")]),
            ),
            // Ids interleaved with real children disappear
            (
                vec![Value::Id, var("a"), Value::Id, var("b")],
                Value::Catenate(vec![var("a"), var("b")]),
            ),
            // Quotes are opaque: an Id inside a quote body survives
            (
                vec![quo(Value::Id), var("a")],
                Value::Catenate(vec![quo(Value::Id), var("a")]),
            ),
        ];

        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let actual = catenate(input);
            assert_eq!(actual, expected, "catenate case #{} mismatch", i + 1);
        }
    }

    #[test]
    fn test_catenate_never_nests() {
        // Splicing one flat catenation into another stays flat.
        let inner = catenate(vec![var("a"), var("b")]);
        let outer = catenate(vec![inner.clone(), inner]);
        match outer {
            Value::Catenate(children) => {
                assert_eq!(children.len(), 4);
                for child in &children {
                    assert!(!matches!(child, Value::Catenate(_) | Value::Id));
                }
            }
            other => panic!("expected a catenation, got {other:?}"),
        }
    }

    #[test]
    fn test_display_data_driven() {
        let test_cases = vec![
            (Value::Id, ""),
            (con("Copy"), "Copy"),
            (var("greet"), "greet"),
            (txt("Hello, world."), "\"Hello, world.\""),
            (
                Value::Prompt(" Summarize this. ".into()),
                "{ Summarize this. }",
            ),
            (quo(Value::Id), "[]"),
            (quo(var("foo")), "[foo]"),
            (quo(quo(var("foo"))), "[[foo]]"),
            (
                catenate(vec![quo(var("foo")), quo(var("bar")), con("Swap")]),
                "[foo] [bar] Swap",
            ),
            (quo(catenate(vec![var("a"), con("Copy")])), "[a Copy]"),
        ];

        for (i, (value, expected)) in test_cases.into_iter().enumerate() {
            assert_eq!(value.to_string(), expected, "display case #{}", i + 1);
        }
    }

    #[test]
    fn test_facet_accessors() {
        assert_eq!(quo(var("x")).quote_body(), Some(&var("x")));
        assert_eq!(txt("x").quote_body(), None);
        assert_eq!(txt("x").text_payload(), Some("x"));
        assert_eq!(quo(var("x")).text_payload(), None);
        assert!(Value::Id.is_id());
        assert!(!quo(Value::Id).is_id());
    }
}
