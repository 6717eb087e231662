//! Catena - a rewriting interpreter for a small concatenative
//! combinator language, meant as the execution substrate of a
//! programmable command channel.
//!
//! A client submits a program as text. The interpreter reads it into a
//! term, reduces the term under a gas budget against the session's
//! dictionary of named definitions, and renders the residual term back
//! to text. The residual may be partially reduced: unresolved names,
//! prompts, and instructions that lack data are preserved in the
//! output instead of failing the request.
//!
//! ```text
//! [foo] Copy                      ⇒  [foo] [foo]
//! [foo] [bar] Cat                 ⇒  [foo bar]
//! ["Hello"] "greet" Define greet  ⇒  "Hello"
//! [handler] Shift a b Reset       ⇒  [a b] handler
//! { Summarize the log. }          ⇒  { Summarize the log. }
//! ```
//!
//! Square brackets quote a subprogram as a first-class datum, double
//! quotes delimit opaque text, and curly braces delimit prompts:
//! inert natural-language messages that ride through reduction
//! untouched. Reduction never runs more than the given number of
//! steps; a budget cut leaves a residual that can be resumed by
//! evaluating it again.
//!
//! ## Totality
//!
//! Reduction is total over user programs. A configuration the machine
//! cannot advance: a name with no definition, a prompt, a combinator
//! whose arguments are missing or the wrong shape, suspends into the
//! residual rather than erroring. The only failures a caller sees are
//! [`Error::Unreadable`] from the reader and [`Error::Unknown`] for a
//! combinator name that does not exist.
//!
//! ## Modules
//!
//! - `ast`: the term representation and the printer
//! - `reader`: source text to terms
//! - `evaluator`: the three-stack machine, dictionary, and gas loop
//! - `combinators`: the primitive instruction registry
//! - `wire` (feature `wire`): JSON worker protocol for one
//!   dictionary-backed session

use std::fmt;

/// Default step budget for one reduction.
pub const DEFAULT_GAS: u64 = 1_000_000;

/// Maximum quotation nesting the reader accepts. Keeps the recursive
/// descent stack-safe on adversarial input.
pub const MAX_READ_DEPTH: usize = 64;

/// Errors surfaced to callers. Everything else the machine encounters
/// is demoted to a residual by the suspension protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The source text could not be read. `reason` names the
    /// unbalanced delimiter or the offending word.
    Unreadable { reason: String, source: String },
    /// A combinator name with no entry in the instruction registry.
    Unknown { name: String },
}

impl Error {
    pub(crate) fn unreadable(source: &str, reason: impl Into<String>) -> Self {
        Error::Unreadable {
            reason: reason.into(),
            source: source.to_owned(),
        }
    }
}

/// Shorten a source excerpt for error display: first 80 characters,
/// newlines made visible.
fn excerpt(source: &str) -> String {
    const MAX_EXCERPT: usize = 80;
    let mut shown: String = source.chars().take(MAX_EXCERPT).collect();
    if source.chars().count() > MAX_EXCERPT {
        shown.push_str("[...]");
    }
    shown.replace('\n', "\\n").replace('\r', "")
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unreadable { reason, source } => {
                write!(f, "Unreadable: {reason}")?;
                if !source.is_empty() {
                    write!(f, "\nSource: {}", excerpt(source))?;
                }
                Ok(())
            }
            Error::Unknown { name } => write!(f, "Unknown combinator: {name}"),
        }
    }
}

pub mod ast;
pub mod combinators;
pub mod evaluator;
pub mod reader;

#[cfg(feature = "wire")]
pub mod wire;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let unreadable = Error::unreadable("[foo", "Unbalanced brackets");
        let message = format!("{unreadable}");
        assert!(message.contains("Unbalanced brackets"));
        assert!(message.contains("[foo"));

        let unknown = Error::Unknown {
            name: "Bogus".into(),
        };
        assert_eq!(format!("{unknown}"), "Unknown combinator: Bogus");
    }

    #[test]
    fn test_error_excerpt_truncates() {
        let long = "x".repeat(200);
        let err = Error::unreadable(&long, "Unknown symbol: x");
        let message = format!("{err}");
        assert!(message.contains("[...]"));
        assert!(message.len() < 200);
    }

    #[test]
    fn test_error_excerpt_escapes_newlines() {
        let err = Error::unreadable("a\nb", "Unknown symbol: a");
        assert!(format!("{err}").contains("a\\nb"));
    }
}
