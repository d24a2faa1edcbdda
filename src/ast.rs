//! Command tree produced by the parser (§4.8).
//!
//! Parsed once into this tree rather than re-split at each precedence
//! level on every execution, so the precedence order is expressed once,
//! in the parser, instead of being re-derived by every consumer.

use crate::redirect::RedirectSpec;

/// A parsed command, in precedence order from outermost (`Seq`) to
/// innermost (`Simple`).
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// `a ; b` — run `a`, then `b` regardless of `a`'s status.
    Seq(Box<Cmd>, Box<Cmd>),
    /// `a && b` — run `b` only if `a` succeeded.
    And(Box<Cmd>, Box<Cmd>),
    /// `a || b` — run `b` only if `a` failed.
    Or(Box<Cmd>, Box<Cmd>),
    /// `a | b` — connect `a`'s stdout to `b`'s stdin.
    Pipe(Box<Cmd>, Box<Cmd>),
    /// A single external or builtin command, with its redirections.
    Simple(Simple),
    /// `if ( [-]* COND ) BODY [else ELSE]`. `negate` is true when an odd
    /// number of leading `-` markers preceded `COND`.
    If { negate: bool, cond: Box<Cmd>, body: Box<Cmd>, else_branch: Option<Box<Cmd>> },
    /// `while ( [-]* COND ) BODY`
    While { negate: bool, cond: Box<Cmd>, body: Box<Cmd> },
    /// `repeat (N) BODY`. `count_expr` is kept as text rather than a
    /// pre-evaluated number because it may name a variable (§4.7) whose
    /// value is only known once substitution runs.
    Repeat { count_expr: String, body: Box<Cmd> },
    /// `cmd &`
    Background(Box<Cmd>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Simple {
    pub words: Vec<String>,
    pub redirects: Vec<RedirectSpec>,
}
