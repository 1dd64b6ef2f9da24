// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line driver: directive dispatch, emission and output-buffer routing.
//!
//! The driver walks the input one physical line at a time. Each line runs
//! through macro substitution first, so a define can appear in directive
//! expressions (`#if DEBUG`) as well as in ordinary text. Directive lines
//! update the conditional stack or the output selection; everything else
//! is appended to the currently selected output buffer, provided the
//! innermost conditional level allows it.

use crate::core::conditional::ConditionalStack;
use crate::core::error::{PreprocessError, PreprocessErrorKind};
use crate::core::expr;
use crate::core::macro_expander::expand_line;
use crate::core::symbol_table::{DefineValue, SymbolTable};
use crate::core::text_utils::skip_spaces;

/// Default directive prefix.
pub const DEFAULT_DIRECTIVE_PREFIX: char = '#';

/// Upper bound on `#output` indices, so a stray index cannot balloon the
/// buffer vector.
pub const MAX_OUTPUT_BUFFERS: usize = 4096;

/// Policy for directive lines whose keyword is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownDirectivePolicy {
    /// Fail the parse (default).
    #[default]
    Fail,
    /// Treat the whole line as ordinary appendable text.
    PassThrough,
}

/// Line-oriented conditional text preprocessor.
///
/// Construction-time state is the ordered define list plus the directive
/// syntax configuration; [`Preprocessor::parse`] takes `&self` and keeps
/// all per-run state call-local, so one instance can serve concurrent
/// parses.
///
/// ```
/// use lineforge::core::preprocess::Preprocessor;
/// use lineforge::core::symbol_table::DefineValue;
///
/// let mut pp = Preprocessor::new();
/// pp.define("DEBUG", DefineValue::Number(1));
/// let outputs = pp.parse("#if DEBUG\ntrace on\n#endif\n").unwrap();
/// assert_eq!(outputs[0], "trace on\n");
/// ```
#[derive(Debug, Clone)]
pub struct Preprocessor {
    defines: Vec<(String, DefineValue)>,
    directive_prefix: char,
    unknown_directives: UnknownDirectivePolicy,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-parse mutable state, dropped when `parse` returns.
struct ParseState {
    conditionals: ConditionalStack,
    outputs: Vec<String>,
    current_output: usize,
    current_line: u32,
}

impl ParseState {
    fn new() -> Self {
        Self {
            conditionals: ConditionalStack::new(),
            outputs: vec![String::new()],
            current_output: 0,
            current_line: 0,
        }
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            defines: Vec::new(),
            directive_prefix: DEFAULT_DIRECTIVE_PREFIX,
            unknown_directives: UnknownDirectivePolicy::default(),
        }
    }

    pub fn with_defines(defines: impl IntoIterator<Item = (String, DefineValue)>) -> Self {
        let mut pp = Self::new();
        pp.defines.extend(defines);
        pp
    }

    /// Append a define. Duplicates are kept; the first occurrence of a
    /// name wins at lookup time.
    pub fn define(&mut self, name: impl Into<String>, value: DefineValue) {
        self.defines.push((name.into(), value));
    }

    pub fn set_directive_prefix(&mut self, prefix: char) {
        self.directive_prefix = prefix;
    }

    pub fn set_unknown_directives(&mut self, policy: UnknownDirectivePolicy) {
        self.unknown_directives = policy;
    }

    pub fn directive_prefix(&self) -> char {
        self.directive_prefix
    }

    /// Run the preprocessor over `input` and return the output buffers,
    /// indexed from 0.
    ///
    /// The first failure aborts the whole parse; there is no partial
    /// output. Errors carry the 1-based source line they occurred on.
    pub fn parse(&self, input: &str) -> Result<Vec<String>, PreprocessError> {
        if input.is_empty() {
            return Err(PreprocessError::new(
                PreprocessErrorKind::EmptyInput,
                "empty input buffer",
            ));
        }

        let symbols = SymbolTable::from_defines(&self.defines);
        let mut state = ParseState::new();

        // A trailing newline terminates the last line rather than opening
        // an empty one after it.
        let body = input.strip_suffix('\n').unwrap_or(input);
        for line in body.split('\n') {
            state.current_line += 1;
            self.process_line(line, &symbols, &mut state)
                .map_err(|err| err.with_line(state.current_line))?;
        }

        if !state.conditionals.is_empty() {
            return Err(PreprocessError::new(
                PreprocessErrorKind::UnterminatedConditional,
                "unterminated conditional directive",
            )
            .with_line(state.current_line));
        }
        Ok(state.outputs)
    }

    fn process_line(
        &self,
        line: &str,
        symbols: &SymbolTable,
        state: &mut ParseState,
    ) -> Result<(), PreprocessError> {
        let expanded = expand_line(line, symbols);
        let line = expanded.as_deref().unwrap_or(line);

        let append = match line.strip_prefix(self.directive_prefix) {
            Some(rest) => self.parse_directive(skip_spaces(rest), state)?,
            None => true,
        };

        if append && state.conditionals.emitting() {
            let buffer = &mut state.outputs[state.current_output];
            buffer.push_str(line);
            buffer.push('\n');
        }
        Ok(())
    }

    /// Dispatch a directive line (prefix already stripped). Returns
    /// whether the line should still be treated as appendable text, which
    /// is only the case for unknown directives under the pass-through
    /// policy.
    fn parse_directive(
        &self,
        directive: &str,
        state: &mut ParseState,
    ) -> Result<bool, PreprocessError> {
        if let Some(rest) = directive.strip_prefix("if") {
            let condition = evaluate_condition(require_value(rest)?)?;
            state.conditionals.push_if(condition);
            return Ok(false);
        }
        if let Some(rest) = directive.strip_prefix("elif") {
            let value = require_value(rest)?;
            state
                .conditionals
                .elif_branch(|| evaluate_condition(value))?;
            return Ok(false);
        }
        // `else` and `endif` tolerate trailing text.
        if directive.starts_with("else") {
            state.conditionals.else_branch()?;
            return Ok(false);
        }
        if directive.starts_with("endif") {
            state.conditionals.end_branch()?;
            return Ok(false);
        }
        if let Some(rest) = directive.strip_prefix("output") {
            let index = parse_output_index(require_value(rest)?)?;
            if index >= state.outputs.len() {
                state.outputs.resize(index + 1, String::new());
            }
            state.current_output = index;
            return Ok(false);
        }

        match self.unknown_directives {
            UnknownDirectivePolicy::PassThrough => Ok(true),
            UnknownDirectivePolicy::Fail => Err(PreprocessError::new(
                PreprocessErrorKind::UnknownDirective,
                format!("unknown directive in {directive}"),
            )),
        }
    }
}

/// A value-carrying directive keyword must be followed by a space.
fn require_value(rest: &str) -> Result<&str, PreprocessError> {
    if !rest.starts_with(' ') {
        return Err(PreprocessError::new(
            PreprocessErrorKind::DirectiveSyntax,
            "expected value in directive",
        ));
    }
    Ok(rest)
}

fn evaluate_condition(expr_text: &str) -> Result<bool, PreprocessError> {
    Ok(expr::evaluate(skip_spaces(expr_text))? != 0)
}

/// Parse the index of an `output` directive: left whitespace is
/// tolerated, anything after the digits (trailing whitespace included)
/// is not.
fn parse_output_index(rest: &str) -> Result<usize, PreprocessError> {
    let value = skip_spaces(rest);
    let index = value.parse::<usize>().map_err(|_| {
        PreprocessError::new(
            PreprocessErrorKind::DirectiveSyntax,
            format!("invalid output index: {value}"),
        )
    })?;
    if index >= MAX_OUTPUT_BUFFERS {
        return Err(PreprocessError::new(
            PreprocessErrorKind::DirectiveSyntax,
            format!("output index out of range: {index}"),
        ));
    }
    Ok(index)
}
