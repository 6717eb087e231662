//! Reader for the surface syntax: a flat token stream with square
//! brackets for quotation, double quotes for text literals, and curly
//! braces for prompts.
//!
//! ```text
//! program ::= token*
//! token   ::= "[" program "]" | '"' … '"' | "{" … "}" | CONST | VAR
//! CONST   ::= [A-Z][A-Za-z0-9_-]*
//! VAR     ::= [a-z][A-Za-z0-9_-]*
//! ```
//!
//! Whitespace and the brackets `[` `]` separate word tokens; text and
//! prompt payloads are taken verbatim with no escape processing. The
//! reader produces the catenation of the top-level tokens, so empty
//! input reads as the empty program.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    multi::many0,
    sequence::{preceded, terminated},
};

use crate::Error;
use crate::MAX_READ_DEPTH;
use crate::ast::{Value, catenate, is_constant_name, is_variable_name, quo};

/// Why a piece of input could not be read. Carried through nom's error
/// channel so the failing position is still known at the top level.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reason {
    UnbalancedBrackets,
    UnbalancedQuotes,
    UnbalancedBraces,
    UnknownSymbol,
    TooDeep,
}

/// Reader-internal error: the offending position plus, when one of the
/// committed branches failed, the reason to report.
#[derive(Debug, PartialEq)]
struct SyntaxError<'a> {
    input: &'a str,
    reason: Option<Reason>,
}

impl<'a> nom::error::ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: nom::error::ErrorKind) -> Self {
        SyntaxError { input, reason: None }
    }

    fn append(_input: &'a str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

type ReadResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Abort the whole read with a reason; `Failure` stops backtracking.
fn abort(input: &str, reason: Reason) -> nom::Err<SyntaxError<'_>> {
    nom::Err::Failure(SyntaxError {
        input,
        reason: Some(reason),
    })
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '[' || c == ']'
}

/// Parse a bracketed subprogram into a quotation. `[]` is the quoted
/// empty program.
fn parse_quotation(input: &str, depth: usize) -> ReadResult<'_, Value> {
    let (rest, _) = char('[').parse(input)?;
    if depth >= MAX_READ_DEPTH {
        return Err(abort(input, Reason::TooDeep));
    }
    let (rest, body) = parse_program(rest, depth + 1)?;
    let (rest, _) = preceded(multispace0, char(']'))
        .parse(rest)
        .map_err(|_: nom::Err<SyntaxError<'_>>| abort(input, Reason::UnbalancedBrackets))?;
    Ok((rest, quo(body)))
}

/// Parse a text literal. The payload is everything up to the next
/// double quote, verbatim.
fn parse_text(input: &str) -> ReadResult<'_, Value> {
    let (rest, _) = char('"').parse(input)?;
    match rest.find('"') {
        Some(end) => Ok((&rest[end + 1..], Value::Text(rest[..end].to_owned()))),
        None => Err(abort(input, Reason::UnbalancedQuotes)),
    }
}

/// Parse a prompt. The payload is everything up to the closing brace,
/// verbatim, inner whitespace included.
fn parse_prompt(input: &str) -> ReadResult<'_, Value> {
    let (rest, _) = char('{').parse(input)?;
    match rest.find('}') {
        Some(end) => Ok((&rest[end + 1..], Value::Prompt(rest[..end].to_owned()))),
        None => Err(abort(input, Reason::UnbalancedBraces)),
    }
}

/// Parse a bare word and classify it by its initial: uppercase words
/// are combinator constants, lowercase words are dictionary names, and
/// anything else is unreadable.
fn parse_word(input: &str) -> ReadResult<'_, Value> {
    let (rest, word) = take_while1(|c: char| !is_separator(c)).parse(input)?;
    if is_constant_name(word) {
        Ok((rest, Value::Constant(word.to_owned())))
    } else if is_variable_name(word) {
        Ok((rest, Value::Variable(word.to_owned())))
    } else {
        Err(abort(input, Reason::UnknownSymbol))
    }
}

fn parse_token(input: &str, depth: usize) -> ReadResult<'_, Value> {
    alt((
        |input| parse_quotation(input, depth),
        parse_text,
        parse_prompt,
        parse_word,
    ))
    .parse(input)
}

/// Parse a whitespace-separated run of tokens into their catenation.
fn parse_program(input: &str, depth: usize) -> ReadResult<'_, Value> {
    let (rest, tokens) =
        many0(preceded(multispace0, |input| parse_token(input, depth))).parse(input)?;
    Ok((rest, catenate(tokens)))
}

/// Render the reason for an unreadable input, including the offending
/// word where there is one.
fn describe(error: &SyntaxError<'_>) -> String {
    match error.reason {
        Some(Reason::UnbalancedBrackets) => "Unbalanced brackets".to_owned(),
        Some(Reason::UnbalancedQuotes) => "Unbalanced quotes".to_owned(),
        Some(Reason::UnbalancedBraces) => "Unbalanced braces".to_owned(),
        Some(Reason::TooDeep) => {
            format!("Quotations nested too deeply (max depth: {MAX_READ_DEPTH})")
        }
        Some(Reason::UnknownSymbol) => {
            let word: String = error
                .input
                .chars()
                .take_while(|c| !is_separator(*c))
                .collect();
            format!("Unknown symbol: {word}")
        }
        None => "Unreadable input".to_owned(),
    }
}

/// Read a source string into a term.
///
/// Empty input reads as [`Value::Id`]. On failure the error names the
/// unbalanced delimiter or the offending word.
pub fn read(src: &str) -> Result<Value, Error> {
    match terminated(|input| parse_program(input, 0), multispace0).parse(src) {
        Ok(("", value)) => Ok(value),
        Ok((remaining, _)) => {
            // The token parsers consume every word shape, so leftover
            // input can only start with a stray closing bracket.
            let reason = if remaining.starts_with(']') {
                "Unbalanced brackets".to_owned()
            } else {
                format!("Unexpected input: {remaining}")
            };
            Err(Error::unreadable(src, reason))
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(Error::unreadable(src, describe(&e))),
        Err(nom::Err::Incomplete(_)) => Err(Error::unreadable(src, "Incomplete input".to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{con, txt, var};

    /// Expected outcomes for the data-driven reader tests.
    #[derive(Debug)]
    enum ReadTestResult {
        /// Reading should succeed with this term.
        Success(Value),
        /// Reading should fail with a reason containing this string.
        SpecificError(&'static str),
    }
    use ReadTestResult::*;

    /// Run reader cases; successful reads are also round-tripped
    /// through the printer and must re-read to the same term.
    fn run_read_tests(test_cases: Vec<(&str, ReadTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            match (read(input), expected) {
                (Ok(actual), Success(expected_value)) => {
                    assert_eq!(&actual, expected_value, "{test_id}: term mismatch");

                    let printed = actual.to_string();
                    let reread = read(&printed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip read failed for '{printed}': {e:?}")
                    });
                    assert_eq!(
                        reread, actual,
                        "{test_id}: round-trip mismatch for '{input}'"
                    );
                }
                (Err(err), SpecificError(expected_text)) => {
                    let message = format!("{err}");
                    assert!(
                        message.contains(expected_text),
                        "{test_id}: error should contain '{expected_text}', got: {message}"
                    );
                }
                (Ok(actual), SpecificError(expected_text)) => {
                    panic!("{test_id}: expected error containing '{expected_text}', got {actual:?}")
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: expected success, got error {err:?}")
                }
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_reader_comprehensive() {
        let test_cases = vec![
            // ===== EMPTY INPUT =====
            ("", Success(Value::Id)),
            ("   ", Success(Value::Id)),
            ("\t\r\n", Success(Value::Id)),
            // ===== WORDS =====
            ("Copy", Success(con("Copy"))),
            ("foo", Success(var("foo"))),
            ("foo-bar_2", Success(var("foo-bar_2"))),
            ("Shift-K2", Success(con("Shift-K2"))),
            (
                "foo bar",
                Success(catenate(vec![var("foo"), var("bar")])),
            ),
            (
                "  [foo]   Copy ",
                Success(catenate(vec![quo(var("foo")), con("Copy")])),
            ),
            // ===== QUOTATIONS =====
            ("[]", Success(quo(Value::Id))),
            ("[ ]", Success(quo(Value::Id))),
            ("[foo]", Success(quo(var("foo")))),
            ("[[foo]]", Success(quo(quo(var("foo"))))),
            (
                "[foo bar]",
                Success(quo(catenate(vec![var("foo"), var("bar")]))),
            ),
            // A single child collapses; no one-element catenations
            ("[[a] ]", Success(quo(quo(var("a"))))),
            // Brackets separate words without whitespace
            (
                "[foo][bar]",
                Success(catenate(vec![quo(var("foo")), quo(var("bar"))])),
            ),
            (
                "foo[bar]Copy",
                Success(catenate(vec![var("foo"), quo(var("bar")), con("Copy")])),
            ),
            // ===== TEXT LITERALS =====
            ("\"Hello\"", Success(txt("Hello"))),
            ("\"\"", Success(txt(""))),
            ("\"spaces kept \"", Success(txt("spaces kept "))),
            // No escape processing: backslashes are payload bytes
            ("\"a\\n\"", Success(txt("a\\n"))),
            // Brackets and braces inside text are payload
            ("\"[x] {y}\"", Success(txt("[x] {y}"))),
            (
                "\"Hello\" \"world\" Swap",
                Success(catenate(vec![txt("Hello"), txt("world"), con("Swap")])),
            ),
            // ===== PROMPTS =====
            (
                "{ Hello, world. }",
                Success(Value::Prompt(" Hello, world. ".into())),
            ),
            ("{}", Success(Value::Prompt(String::new()))),
            ("{Quit}", Success(Value::Prompt("Quit".into()))),
            // Quotes inside a prompt are payload
            ("{say \"hi\"}", Success(Value::Prompt("say \"hi\"".into()))),
            // ===== MIXED PROGRAMS =====
            (
                "[greet] \"greeting\" Define",
                Success(catenate(vec![
                    quo(var("greet")),
                    txt("greeting"),
                    con("Define"),
                ])),
            ),
            (
                "[handler] Shift body Reset",
                Success(catenate(vec![
                    quo(var("handler")),
                    con("Shift"),
                    var("body"),
                    con("Reset"),
                ])),
            ),
            // ===== UNBALANCED DELIMITERS =====
            ("[foo", SpecificError("Unbalanced brackets")),
            ("[", SpecificError("Unbalanced brackets")),
            ("[[a]", SpecificError("Unbalanced brackets")),
            ("]", SpecificError("Unbalanced brackets")),
            ("foo]", SpecificError("Unbalanced brackets")),
            ("[a]]", SpecificError("Unbalanced brackets")),
            ("\"unterminated", SpecificError("Unbalanced quotes")),
            ("[\"x]", SpecificError("Unbalanced quotes")),
            ("{no closer", SpecificError("Unbalanced braces")),
            // ===== UNKNOWN SYMBOLS =====
            ("9lives", SpecificError("Unknown symbol: 9lives")),
            ("_private", SpecificError("Unknown symbol: _private")),
            ("-dash", SpecificError("Unknown symbol: -dash")),
            ("foo?", SpecificError("Unknown symbol: foo?")),
            // A word absorbs stray quotes and braces that follow it
            ("foo\"bar", SpecificError("Unknown symbol: foo\"bar")),
            ("}", SpecificError("Unknown symbol: }")),
            // Errors inside quotations are reported too
            ("[a 9lives]", SpecificError("Unknown symbol: 9lives")),
        ];

        run_read_tests(test_cases);
    }

    #[test]
    fn test_reader_depth_limit() {
        let under = format!(
            "{}x{}",
            "[".repeat(MAX_READ_DEPTH - 1),
            "]".repeat(MAX_READ_DEPTH - 1)
        );
        let over = format!(
            "{}x{}",
            "[".repeat(MAX_READ_DEPTH + 1),
            "]".repeat(MAX_READ_DEPTH + 1)
        );

        assert!(read(&under).is_ok(), "just under the depth limit reads");
        let err = read(&over).expect_err("over the depth limit must fail");
        assert!(format!("{err}").contains("nested too deeply"));
    }

    #[test]
    fn test_print_read_fixed_point() {
        // Printing a read term and reading it back is the identity,
        // including the normalising cases.
        let sources = [
            "",
            "[]",
            "[foo] [bar] Cat",
            "\"Hello\" {ask me} name",
            "[[a] b [c d]] App",
            "[handler] Shift b0 b1 Reset",
        ];
        for source in sources {
            let first = read(source).expect("source must read");
            let printed = first.to_string();
            let second = read(&printed).expect("printed form must read");
            assert_eq!(first, second, "fixed point failed for '{source}'");
        }
    }
}
