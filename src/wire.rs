//! JSON worker protocol for one dictionary-backed session.
//!
//! The transport delivers one request per client message and expects
//! exactly one response; this module owns everything in between. A
//! request is an object with an `id` the worker echoes back verbatim
//! and a `code` string holding the program:
//!
//! ```json
//! {"id": 7, "code": "[\"Hello\"] \"greet\" Define greet"}
//! ```
//!
//! The response carries either the rendered residual or an error
//! message:
//!
//! ```json
//! {"id": 7, "result": "\"Hello\""}
//! {"id": 7, "error": "Unknown combinator: Bogus"}
//! ```
//!
//! A [`Worker`] pins one [`Dictionary`] to one client and serializes
//! calls to the reducer, so definitions persist across that client's
//! requests and never leak to another client. Malformed requests get
//! an error response rather than a panic or a dropped message. The
//! bare `{Quit}` prompt is the out-of-band session terminator; the
//! transport is expected to test for it with [`is_quit`] before
//! handing the message to the worker.

use serde_json::{Value as Json, json};

use crate::ast::Value;
use crate::evaluator::{Dictionary, evaluate_source};
use crate::reader::read;
use crate::{DEFAULT_GAS, Error};

/// One client's evaluation session: a dictionary plus the gas budget
/// applied to each request.
#[derive(Debug)]
pub struct Worker {
    dictionary: Dictionary,
    gas: u64,
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker {
    pub fn new() -> Self {
        Self::with_gas(DEFAULT_GAS)
    }

    /// A worker whose requests each get the given step budget.
    pub fn with_gas(gas: u64) -> Self {
        Worker {
            dictionary: Dictionary::new(),
            gas,
        }
    }

    /// The session dictionary, for inspection.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Reduce one program against the session dictionary and render
    /// the residual.
    pub fn run(&mut self, source: &str) -> Result<String, Error> {
        let residual = evaluate_source(source, Some(&mut self.dictionary), self.gas)?;
        Ok(residual.to_string())
    }

    /// Answer one protocol message. Always produces a response; every
    /// failure mode becomes an `error` field.
    pub fn handle(&mut self, request: &str) -> String {
        let parsed: Json = match serde_json::from_str(request) {
            Ok(parsed) => parsed,
            Err(e) => return error_response(Json::Null, format!("Invalid JSON: {e}")),
        };
        let Json::Object(mut fields) = parsed else {
            return error_response(Json::Null, "Request must be a JSON object".to_owned());
        };
        let id = fields.get("id").cloned().unwrap_or(Json::Null);
        let code = match fields.remove("code") {
            Some(Json::String(code)) => code,
            Some(_) => return error_response(id, "Request field 'code' must be a string".to_owned()),
            None => return error_response(id, "Request is missing field 'code'".to_owned()),
        };
        match self.run(&code) {
            Ok(result) => json!({ "id": id, "result": result }).to_string(),
            Err(err) => error_response(id, err.to_string()),
        }
    }
}

fn error_response(id: Json, message: String) -> String {
    json!({ "id": id, "error": message }).to_string()
}

/// True when a message is the bare session terminator: a single
/// prompt whose trimmed payload is `Quit`, as in `{Quit}` or
/// `{ Quit }`.
pub fn is_quit(source: &str) -> bool {
    matches!(read(source), Ok(Value::Prompt(payload)) if payload.trim() == "Quit")
}
