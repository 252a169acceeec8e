// ConfigSynth: Synthesizing Resilient Network Security Configurations
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # SMT-LIB Backend
//!
//! Drives an external solver process over its standard input and output, using the SMT-LIB 2
//! command language. The solver is started in incremental mode with `:print-success` enabled, such
//! that every command is acknowledged and errors are reported right where they happen.

use super::{Assertion, Model, SatResult, Solver, SolverError, Sort, Value, Var};

use log::*;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Default solver command
pub const DEFAULT_SOLVER_CMD: &str = "z3";
/// Default arguments of the solver command
pub const DEFAULT_SOLVER_ARGS: [&str; 2] = ["-in", "-smt2"];

/// S-expression as returned by the solver
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    /// Symbol, keyword or numeral. Quoted symbols (`|x|`) are stored without the bars.
    Atom(String),
    /// String literal
    Str(String),
    /// List
    List(Vec<SExpr>),
}

impl SExpr {
    fn atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(a) => Some(a.as_str()),
            _ => None,
        }
    }
}

/// # SMT-LIB Solver
///
/// Solver talking SMT-LIB 2 over a pair of streams. Use [`SmtLibSolver::spawn`] to start an
/// external process, or [`SmtLibSolver::from_streams`] to use arbitrary streams.
pub struct SmtLibSolver<W: Write = ChildStdin, R: BufRead = BufReader<ChildStdout>> {
    child: Option<Child>,
    input: W,
    output: R,
}

impl SmtLibSolver {
    /// Start the solver process `cmd` with `args`, and configure it with the timeout (in
    /// milliseconds) for every check.
    pub fn spawn(cmd: &str, args: &[String], timeout_ms: u64) -> Result<Self, SolverError> {
        info!("Starting solver: {} {}", cmd, args.join(" "));
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| SolverError::Spawn { cmd: cmd.to_string(), source })?;
        let input = child.stdin.take().ok_or(SolverError::Closed)?;
        let output = BufReader::new(child.stdout.take().ok_or(SolverError::Closed)?);
        let mut solver = Self { child: Some(child), input, output };
        solver.setup(timeout_ms)?;
        Ok(solver)
    }

    /// Start the default solver (`z3 -in -smt2`).
    pub fn spawn_default(timeout_ms: u64) -> Result<Self, SolverError> {
        let args: Vec<String> = DEFAULT_SOLVER_ARGS.iter().map(|s| s.to_string()).collect();
        Self::spawn(DEFAULT_SOLVER_CMD, &args, timeout_ms)
    }
}

impl<W: Write, R: BufRead> SmtLibSolver<W, R> {
    /// Use an already connected pair of streams. Commands are written to `input`, and responses
    /// are read from `output`.
    pub fn from_streams(input: W, output: R, timeout_ms: u64) -> Result<Self, SolverError> {
        let mut solver = Self { child: None, input, output };
        solver.setup(timeout_ms)?;
        Ok(solver)
    }

    /// Reference to the command stream
    pub fn input(&self) -> &W {
        &self.input
    }

    fn setup(&mut self, timeout_ms: u64) -> Result<(), SolverError> {
        self.command("(set-option :print-success true)")?;
        self.command("(set-option :produce-models true)")?;
        self.command("(set-option :produce-unsat-cores true)")?;
        self.command(&format!("(set-option :timeout {})", timeout_ms))
    }

    fn send(&mut self, cmd: &str) -> Result<(), SolverError> {
        trace!("smt <- {}", cmd);
        writeln!(self.input, "{}", cmd)?;
        self.input.flush()?;
        Ok(())
    }

    /// Read one complete s-expression from the solver.
    fn read(&mut self) -> Result<SExpr, SolverError> {
        let mut buf = String::new();
        loop {
            let n = self.output.read_line(&mut buf)?;
            if n == 0 {
                return Err(SolverError::Closed);
            }
            if !buf.trim().is_empty() && depth(&buf) <= 0 {
                break;
            }
        }
        trace!("smt -> {}", buf.trim());
        let expr = parse_sexpr(buf.trim())?;
        if let SExpr::List(items) = &expr {
            if items.first().and_then(SExpr::atom) == Some("error") {
                let msg = match items.get(1) {
                    Some(SExpr::Str(s)) | Some(SExpr::Atom(s)) => s.clone(),
                    _ => buf.trim().to_string(),
                };
                return Err(SolverError::Reported(msg));
            }
        }
        Ok(expr)
    }

    /// Send a command that is acknowledged with `success`.
    fn command(&mut self, cmd: &str) -> Result<(), SolverError> {
        self.send(cmd)?;
        match self.read()? {
            SExpr::Atom(a) if a == "success" => Ok(()),
            SExpr::Atom(a) if a == "unsupported" => {
                warn!("Solver does not support: {}", cmd);
                Ok(())
            }
            e => Err(SolverError::Protocol(format!("{:?}", e))),
        }
    }

    /// Send a command that returns a value.
    fn query(&mut self, cmd: &str) -> Result<SExpr, SolverError> {
        self.send(cmd)?;
        self.read()
    }

    fn reason_unknown(&mut self) -> String {
        match self.query("(get-info :reason-unknown)") {
            Ok(SExpr::List(items)) if items.len() == 2 => match &items[1] {
                SExpr::Str(s) | SExpr::Atom(s) => s.clone(),
                e => format!("{:?}", e),
            },
            _ => String::from("unknown"),
        }
    }
}

impl<W: Write, R: BufRead> Solver for SmtLibSolver<W, R> {
    fn declare(&mut self, var: &Var) -> Result<(), SolverError> {
        self.command(&var.declaration())
    }

    fn assert(&mut self, assertion: &Assertion) -> Result<(), SolverError> {
        self.command(&assertion.to_string())
    }

    fn check(&mut self) -> Result<SatResult, SolverError> {
        match self.query("(check-sat)")? {
            SExpr::Atom(a) if a == "sat" => Ok(SatResult::Sat),
            SExpr::Atom(a) if a == "unsat" => Ok(SatResult::Unsat),
            SExpr::Atom(a) if a == "unknown" => Ok(SatResult::Unknown(self.reason_unknown())),
            e => Err(SolverError::Protocol(format!("{:?}", e))),
        }
    }

    fn model(&mut self, vars: &[Var]) -> Result<Model, SolverError> {
        let mut model = Model::new();
        if vars.is_empty() {
            return Ok(model);
        }
        let names: Vec<&str> = vars.iter().map(|v| v.name()).collect();
        let response = self.query(&format!("(get-value ({}))", names.join(" ")))?;
        let pairs = match response {
            SExpr::List(pairs) => pairs,
            e => return Err(SolverError::Protocol(format!("{:?}", e))),
        };
        if pairs.len() != vars.len() {
            return Err(SolverError::Protocol(format!(
                "expected {} values, got {}",
                vars.len(),
                pairs.len()
            )));
        }
        for (var, pair) in vars.iter().zip(pairs.iter()) {
            let value = match pair {
                SExpr::List(kv) if kv.len() == 2 => parse_value(&kv[1], var.sort())
                    .ok_or_else(|| SolverError::MissingValue(var.name().to_string()))?,
                e => return Err(SolverError::Protocol(format!("{:?}", e))),
            };
            model.set(var, value);
        }
        Ok(model)
    }

    fn unsat_core(&mut self) -> Result<Vec<String>, SolverError> {
        match self.query("(get-unsat-core)")? {
            SExpr::List(items) => items
                .into_iter()
                .map(|i| match i {
                    SExpr::Atom(a) => Ok(a),
                    e => Err(SolverError::Protocol(format!("{:?}", e))),
                })
                .collect(),
            e => Err(SolverError::Protocol(format!("{:?}", e))),
        }
    }
}

impl<W: Write, R: BufRead> Drop for SmtLibSolver<W, R> {
    fn drop(&mut self) {
        let _ = writeln!(self.input, "(exit)");
        let _ = self.input.flush();
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Parenthesis depth at the end of `s`, ignoring string literals and quoted symbols.
fn depth(s: &str) -> i64 {
    let mut depth = 0;
    let mut in_str = false;
    let mut in_quote = false;
    for c in s.chars() {
        match c {
            '"' if !in_quote => in_str = !in_str,
            '|' if !in_str => in_quote = !in_quote,
            '(' if !in_str && !in_quote => depth += 1,
            ')' if !in_str && !in_quote => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Parse a single s-expression.
pub fn parse_sexpr(s: &str) -> Result<SExpr, SolverError> {
    let mut chars = s.chars().peekable();
    let mut stack: Vec<Vec<SExpr>> = Vec::new();
    let mut result: Option<SExpr> = None;

    while let Some(c) = chars.next() {
        let item = match c {
            c if c.is_whitespace() => continue,
            '(' => {
                stack.push(Vec::new());
                continue;
            }
            ')' => match stack.pop() {
                Some(items) => SExpr::List(items),
                None => return Err(SolverError::Protocol(format!("unbalanced: {}", s))),
            },
            '"' => {
                let mut lit = String::new();
                loop {
                    match chars.next() {
                        // `""` is an escaped quote
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            lit.push('"');
                        }
                        Some('"') => break,
                        Some(c) => lit.push(c),
                        None => return Err(SolverError::Protocol(format!("unterminated: {}", s))),
                    }
                }
                SExpr::Str(lit)
            }
            '|' => {
                let mut sym = String::new();
                loop {
                    match chars.next() {
                        Some('|') => break,
                        Some(c) => sym.push(c),
                        None => return Err(SolverError::Protocol(format!("unterminated: {}", s))),
                    }
                }
                SExpr::Atom(sym)
            }
            c => {
                let mut atom = c.to_string();
                while let Some(&n) = chars.peek() {
                    if n.is_whitespace() || n == '(' || n == ')' {
                        break;
                    }
                    atom.push(n);
                    chars.next();
                }
                SExpr::Atom(atom)
            }
        };
        match stack.last_mut() {
            Some(list) => list.push(item),
            None if result.is_none() => result = Some(item),
            None => return Err(SolverError::Protocol(format!("trailing data: {}", s))),
        }
    }
    if !stack.is_empty() {
        return Err(SolverError::Protocol(format!("unbalanced: {}", s)));
    }
    result.ok_or_else(|| SolverError::Protocol(String::from("empty response")))
}

/// Parse the value of a variable of the given sort. Integers and reals may be negated with
/// `(- x)`, and reals may be given as fractions `(/ a b)`.
fn parse_value(expr: &SExpr, sort: Sort) -> Option<Value> {
    match sort {
        Sort::Bool => match expr.atom()? {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Sort::Int => parse_int(expr).map(Value::Int),
        Sort::Real => parse_real(expr).map(Value::Real),
    }
}

fn parse_int(expr: &SExpr) -> Option<i64> {
    match expr {
        SExpr::Atom(a) => a.parse().ok(),
        SExpr::List(items) if items.len() == 2 && items[0].atom() == Some("-") => {
            parse_int(&items[1]).map(|x| -x)
        }
        _ => None,
    }
}

fn parse_real(expr: &SExpr) -> Option<f64> {
    match expr {
        SExpr::Atom(a) => a.parse().ok(),
        SExpr::List(items) if items.len() == 2 && items[0].atom() == Some("-") => {
            parse_real(&items[1]).map(|x| -x)
        }
        SExpr::List(items) if items.len() == 3 && items[0].atom() == Some("/") => {
            let num = parse_real(&items[1])?;
            let den = parse_real(&items[2])?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        _ => None,
    }
}
