//! Primitive combinator registry.
//!
//! Every instruction of the language is a named combinator over the
//! machine state: it checks its preconditions on the data stack (and,
//! for the dictionary instructions, the presence of a dictionary) and
//! either fires or reports a [`Suspend`] condition for the step loop
//! to turn into a thunk. Each entry also records what the loop does
//! after a suspension: the stack-starved shufflers keep reducing the
//! rest of the program (`Continue`), while the control and dictionary
//! instructions freeze it (`Stop`).
//!
//! ## Precondition discipline
//!
//! A combinator body reads and validates everything it needs before
//! mutating anything, so a suspension always leaves the stacks exactly
//! as they were. Peek with `get_data`/`get_code`, then pop and push.
//!
//! ## Adding a combinator
//!
//! 1. Implement the body with the signature
//!    `fn(&mut State, Option<&mut Dictionary>) -> Result<(), Suspend>`
//! 2. Add a row to `COMBINATORS` with its name, arity and failure mode
//! 3. Add law and suspension cases to the evaluator tests

use crate::ast::{Value, catenate, quo};
use crate::evaluator::{Dictionary, State, Suspend};

/// What the step loop does after this combinator suspends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Keep reducing the rest of the program; later instructions may
    /// still produce useful work.
    Continue,
    /// Stop the loop; the rest of the program survives in the
    /// residual untouched.
    Stop,
}

pub(crate) type RunFn = fn(&mut State, Option<&mut Dictionary>) -> Result<(), Suspend>;

/// One row of the instruction set.
#[derive(Debug, Clone, Copy)]
pub struct Combinator {
    /// The uppercase-initial name dispatched by the reducer.
    pub name: &'static str,
    /// How many data-stack values the instruction consumes or
    /// inspects when it fires.
    pub arity: usize,
    /// Loop behaviour after a suspension.
    pub on_fail: FailMode,
    pub(crate) run: RunFn,
}

fn run_copy(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let value = state.get_data(0)?.clone();
    state.push_data(value);
    Ok(())
}

fn run_drop(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    state.pop_data(1)
}

fn run_swap(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let top = state.get_data(0)?.clone();
    let below = state.get_data(1)?.clone();
    state.pop_data(2)?;
    state.push_data(top);
    state.push_data(below);
    Ok(())
}

/// `[a] [b] → [a b]`: concatenate two quoted programs.
fn run_cat(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let lhs = state
        .get_data(1)?
        .quote_body()
        .ok_or(Suspend::NotAQuote)?
        .clone();
    let rhs = state
        .get_data(0)?
        .quote_body()
        .ok_or(Suspend::NotAQuote)?
        .clone();
    state.pop_data(2)?;
    state.push_data(quo(catenate(vec![lhs, rhs])));
    Ok(())
}

fn run_abs(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let value = state.get_data(0)?.clone();
    state.pop_data(1)?;
    state.push_data(quo(value));
    Ok(())
}

/// `[a] →` with `a` scheduled: run the quoted program.
fn run_app(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let body = state
        .get_data(0)?
        .quote_body()
        .ok_or(Suspend::NotAQuote)?
        .clone();
    state.pop_data(1)?;
    state.push_code(body);
    Ok(())
}

/// `[l] [r] a → a [l]`: keep the left branch for a following `App`,
/// discard the right. Both branches must be quotations.
fn run_inl(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    state.get_data(2)?.quote_body().ok_or(Suspend::NotAQuote)?;
    state.get_data(1)?.quote_body().ok_or(Suspend::NotAQuote)?;
    let branch = state.get_data(2)?.clone();
    let value = state.get_data(0)?.clone();
    state.pop_data(3)?;
    state.push_data(value);
    state.push_data(branch);
    Ok(())
}

/// `[l] [r] a → a [r]`: the right-branch mirror of `Inl`.
fn run_inr(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    state.get_data(2)?.quote_body().ok_or(Suspend::NotAQuote)?;
    state.get_data(1)?.quote_body().ok_or(Suspend::NotAQuote)?;
    let branch = state.get_data(1)?.clone();
    let value = state.get_data(0)?.clone();
    state.pop_data(3)?;
    state.push_data(value);
    state.push_data(branch);
    Ok(())
}

/// `a b → [a b]`: wrap the two values in one quotation, in order.
fn run_pair(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let fst = state.get_data(1)?.clone();
    let snd = state.get_data(0)?.clone();
    state.pop_data(2)?;
    state.push_data(quo(catenate(vec![fst, snd])));
    Ok(())
}

/// Capture the code between here and the nearest `Reset` as a
/// quotation, hand it to the quoted handler from the data stack, and
/// run the handler. The delimiter is consumed but not captured.
fn run_shift(state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let handler = state
        .get_data(0)?
        .quote_body()
        .ok_or(Suspend::NotAQuote)?
        .clone();
    let mut captured = Vec::new();
    let mut span = 0;
    loop {
        let item = state
            .get_code(span)
            .map_err(|_| Suspend::NoMatchingReset)?;
        if matches!(item, Value::Constant(name) if name == "Reset") {
            break;
        }
        captured.push(item.clone());
        span += 1;
    }
    state.pop_data(1)?;
    state.pop_code(span + 1)?;
    state.push_data(quo(catenate(captured)));
    state.push_code(handler);
    Ok(())
}

/// A delimiter reached directly is one the machine was not asked to
/// cross; it suspends and survives in the residual.
fn run_reset(_state: &mut State, _dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    Err(Suspend::BareDelimiter)
}

/// `[body] "name" →`: bind the name to the quoted body.
fn run_define(state: &mut State, dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let dictionary = dictionary.ok_or(Suspend::NoDictionary)?;
    let name = state
        .get_data(0)?
        .text_payload()
        .ok_or(Suspend::NotAText)?
        .to_owned();
    let body = state
        .get_data(1)?
        .quote_body()
        .ok_or(Suspend::NotAQuote)?
        .clone();
    state.pop_data(2)?;
    dictionary.define(name, body);
    Ok(())
}

/// `"name" →`: remove the binding. Removing an unbound name is not an
/// error; the instruction still consumes its argument.
fn run_delete(state: &mut State, dictionary: Option<&mut Dictionary>) -> Result<(), Suspend> {
    let dictionary = dictionary.ok_or(Suspend::NoDictionary)?;
    let name = state
        .get_data(0)?
        .text_payload()
        .ok_or(Suspend::NotAText)?
        .to_owned();
    state.pop_data(1)?;
    dictionary.delete(&name);
    Ok(())
}

/// The instruction set, kept as a single contiguous table for ease of
/// auditing. Order follows the language reference: stack shufflers,
/// quotation operators, sum and pair encoders, delimited control,
/// dictionary effects.
static COMBINATORS: &[Combinator] = &[
    Combinator {
        name: "Copy",
        arity: 1,
        on_fail: FailMode::Continue,
        run: run_copy,
    },
    Combinator {
        name: "Drop",
        arity: 1,
        on_fail: FailMode::Continue,
        run: run_drop,
    },
    Combinator {
        name: "Swap",
        arity: 2,
        on_fail: FailMode::Continue,
        run: run_swap,
    },
    Combinator {
        name: "Cat",
        arity: 2,
        on_fail: FailMode::Continue,
        run: run_cat,
    },
    Combinator {
        name: "Abs",
        arity: 1,
        on_fail: FailMode::Continue,
        run: run_abs,
    },
    Combinator {
        name: "App",
        arity: 1,
        on_fail: FailMode::Stop,
        run: run_app,
    },
    Combinator {
        name: "Inl",
        arity: 3,
        on_fail: FailMode::Stop,
        run: run_inl,
    },
    Combinator {
        name: "Inr",
        arity: 3,
        on_fail: FailMode::Stop,
        run: run_inr,
    },
    Combinator {
        name: "Pair",
        arity: 2,
        on_fail: FailMode::Continue,
        run: run_pair,
    },
    Combinator {
        name: "Shift",
        arity: 1,
        on_fail: FailMode::Stop,
        run: run_shift,
    },
    Combinator {
        name: "Reset",
        arity: 0,
        on_fail: FailMode::Stop,
        run: run_reset,
    },
    Combinator {
        name: "Define",
        arity: 2,
        on_fail: FailMode::Stop,
        run: run_define,
    },
    Combinator {
        name: "Delete",
        arity: 1,
        on_fail: FailMode::Stop,
        run: run_delete,
    },
];

/// Look up a combinator by its dispatch name.
pub fn find_combinator(name: &str) -> Option<&'static Combinator> {
    COMBINATORS.iter().find(|op| op.name == name)
}

/// The full instruction set, for session tooling.
pub fn combinators() -> &'static [Combinator] {
    COMBINATORS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        for name in [
            "Copy", "Drop", "Swap", "Cat", "Abs", "App", "Inl", "Inr", "Pair", "Shift", "Reset",
            "Define", "Delete",
        ] {
            let op = find_combinator(name)
                .unwrap_or_else(|| panic!("combinator {name} missing from registry"));
            assert_eq!(op.name, name);
        }
        assert!(find_combinator("Bogus").is_none());
        // Dispatch names are exact, not case-folded
        assert!(find_combinator("copy").is_none());
    }

    #[test]
    fn test_registry_metadata() {
        let cases = [
            ("Copy", 1, FailMode::Continue),
            ("Swap", 2, FailMode::Continue),
            ("App", 1, FailMode::Stop),
            ("Inl", 3, FailMode::Stop),
            ("Shift", 1, FailMode::Stop),
            ("Reset", 0, FailMode::Stop),
            ("Define", 2, FailMode::Stop),
        ];
        for (name, arity, on_fail) in cases {
            let op = find_combinator(name).expect("known combinator");
            assert_eq!(op.arity, arity, "{name} arity");
            assert_eq!(op.on_fail, on_fail, "{name} failure mode");
        }
        assert_eq!(combinators().len(), 13);
    }
}
