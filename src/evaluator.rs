//! The rewriting machine: a three-stack state, a per-session
//! dictionary of named definitions, and the gas-bounded small-step
//! loop that reduces a term to its residual.
//!
//! The machine is total over user programs. Whenever an instruction
//! cannot fire (missing data, an unresolved name, a prompt, a
//! combinator handed the wrong shape) the configuration is *suspended*
//! rather than failed: pending data and the offending instruction are
//! flushed into the sink, and the residual term keeps them in
//! evaluation order. Feeding a gas-cut residual back into
//! [`evaluate`] with a fresh budget resumes the reduction. The only
//! hard failure at this layer is a combinator name missing from the
//! registry, which surfaces as [`Error::Unknown`].

use std::collections::HashMap;

use crate::Error;
use crate::ast::{Value, catenate};
use crate::combinators::{FailMode, find_combinator};
use crate::reader::read;

/// Per-session mapping from names to definition bodies.
///
/// One dictionary serves one machine; there are no concurrent writers.
/// Entries are never evicted and the size is unbounded here; bounding
/// adversarial definition streams is the transport's concern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    bindings: HashMap<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary {
            bindings: HashMap::new(),
        }
    }

    /// Bind `name` to a definition body, replacing any previous one.
    pub fn define(&mut self, name: impl Into<String>, body: Value) {
        self.bindings.insert(name.into(), body);
    }

    /// Remove a binding, returning the old body if there was one.
    pub fn delete(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// All bindings sorted by name, for session inspection.
    pub fn bindings(&self) -> Vec<(&str, &Value)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, body)| (name.as_str(), body))
            .collect();
        all.sort_by_key(|(name, _)| *name);
        all
    }
}

/// Conditions that suspend reduction instead of failing it. These
/// never cross the public API; the step loop catches them and thunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Suspend {
    /// A stack getter ran past the top of the code stack.
    NoMoreCode,
    /// A combinator asked for data the stack cannot supply.
    NoMoreData,
    /// A combinator needed a quotation and got something else.
    NotAQuote,
    /// A combinator needed a text literal and got something else.
    NotAText,
    /// A dictionary operation ran without a dictionary.
    NoDictionary,
    /// A capture found no matching delimiter on the code stack.
    NoMatchingReset,
    /// A delimiter was executed directly instead of being captured.
    BareDelimiter,
}

/// The machine configuration: three stacks whose top is the last
/// element. `code` holds pending instructions, `data` holds produced
/// values, and `sink` accumulates residual values that could not
/// reduce.
#[derive(Debug, Default)]
pub(crate) struct State {
    code: Vec<Value>,
    data: Vec<Value>,
    sink: Vec<Value>,
}

impl State {
    fn new(init: Value) -> Self {
        State {
            code: vec![init],
            data: Vec::new(),
            sink: Vec::new(),
        }
    }

    /// Take the next instruction off the code stack.
    fn next_instruction(&mut self) -> Option<Value> {
        self.code.pop()
    }

    /// Peek at the i-th item from the top of the code stack.
    ///
    /// Note: the Shift capture scan is the only caller that peeks at
    /// code today, and it remaps the overrun to `NoMatchingReset`, so
    /// `NoMoreCode` never reaches the step loop as itself. A second
    /// caller should not assume the raw error has coverage elsewhere.
    pub(crate) fn get_code(&self, index: usize) -> Result<&Value, Suspend> {
        let len = self.code.len();
        if index >= len {
            return Err(Suspend::NoMoreCode);
        }
        Ok(&self.code[len - 1 - index])
    }

    /// Remove the top `count` items from the code stack.
    pub(crate) fn pop_code(&mut self, count: usize) -> Result<(), Suspend> {
        if count > self.code.len() {
            return Err(Suspend::NoMoreCode);
        }
        self.code.truncate(self.code.len() - count);
        Ok(())
    }

    /// Push a program onto the code stack. A catenation is spliced so
    /// its first child becomes the next instruction; the empty program
    /// pushes nothing.
    pub(crate) fn push_code(&mut self, value: Value) {
        match value {
            Value::Id => {}
            Value::Catenate(children) => self.code.extend(children.into_iter().rev()),
            other => self.code.push(other),
        }
    }

    /// Peek at the i-th item from the top of the data stack.
    pub(crate) fn get_data(&self, index: usize) -> Result<&Value, Suspend> {
        let len = self.data.len();
        if index >= len {
            return Err(Suspend::NoMoreData);
        }
        Ok(&self.data[len - 1 - index])
    }

    /// Remove the top `count` items from the data stack.
    pub(crate) fn pop_data(&mut self, count: usize) -> Result<(), Suspend> {
        if count > self.data.len() {
            return Err(Suspend::NoMoreData);
        }
        self.data.truncate(self.data.len() - count);
        Ok(())
    }

    pub(crate) fn push_data(&mut self, value: Value) {
        self.data.push(value);
    }

    /// Suspend on `hand`: flush the data stack into the sink in order,
    /// then the instruction itself. The residual keeps evaluation
    /// order while refusing to invent values.
    fn thunk(&mut self, hand: Value) {
        self.sink.append(&mut self.data);
        self.sink.push(hand);
    }

    /// Assemble the residual: sink, then data bottom to top, then the
    /// remaining code in reading order.
    fn into_residual(self) -> Value {
        let State { code, data, sink } = self;
        let mut parts = sink;
        parts.extend(data);
        parts.extend(code.into_iter().rev());
        catenate(parts)
    }
}

/// Reduce a term against an optional dictionary under a gas budget,
/// returning the residual term.
///
/// Every dispatch step costs one unit of gas; when the budget runs out
/// the un-run suffix of the program survives in the residual, and
/// evaluating that residual with more gas picks up where the cut
/// happened. Without a dictionary every name suspends, as do `Define`
/// and `Delete`.
///
/// The sole error is [`Error::Unknown`], for a combinator name that is
/// not in the registry.
pub fn evaluate(
    init: Value,
    mut dictionary: Option<&mut Dictionary>,
    gas: u64,
) -> Result<Value, Error> {
    let mut state = State::new(init);
    let mut gas = gas;
    while gas > 0 {
        let Some(hand) = state.next_instruction() else {
            break;
        };
        gas -= 1;
        match hand {
            Value::Id => {}
            Value::Catenate(_) => state.push_code(hand),
            Value::Quote(_) | Value::Text(_) => state.push_data(hand),
            Value::Prompt(_) => {
                state.thunk(hand);
                gas = 0;
            }
            Value::Variable(name) => {
                let binding = dictionary.as_ref().and_then(|d| d.get(&name)).cloned();
                match binding {
                    Some(binding) => state.push_code(binding),
                    None => {
                        state.thunk(Value::Variable(name));
                        gas = 0;
                    }
                }
            }
            Value::Constant(name) => {
                let Some(op) = find_combinator(&name) else {
                    return Err(Error::Unknown { name });
                };
                match (op.run)(&mut state, dictionary.as_deref_mut()) {
                    Ok(()) => {}
                    Err(_) => {
                        state.thunk(Value::Constant(name));
                        if op.on_fail == FailMode::Stop {
                            gas = 0;
                        }
                    }
                }
            }
        }
    }
    Ok(state.into_residual())
}

/// Read a source string and reduce it. Composes [`read`] and
/// [`evaluate`], so both `Unreadable` and `Unknown` can surface.
pub fn evaluate_source(
    src: &str,
    dictionary: Option<&mut Dictionary>,
    gas: u64,
) -> Result<Value, Error> {
    let init = read(src)?;
    evaluate(init, dictionary, gas)
}
