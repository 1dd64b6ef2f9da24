// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::preprocess::UnknownDirectivePolicy;
use crate::core::symbol_table::DefineValue;
use crate::core::text_utils::is_word_char;

use super::RunError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Line-oriented text preprocessor.

Reads a single input buffer, applies named-value macro substitution and
#if/#elif/#else/#endif conditionals with integer expressions, and routes
the surviving lines into one or more output buffers via #output <n>.

Without -o the buffers stream to stdout in index order. With -o, buffer 0
is written to PATH and buffer n to PATH with -n inserted before the
extension.";

#[derive(Parser, Debug)]
#[command(
    name = "lineforge",
    version = VERSION,
    about = "Line-oriented text preprocessor with conditionals, macros and output routing",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "INPUT",
        long_help = "Input file to preprocess. Use - to read from stdin."
    )]
    pub input: PathBuf,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=VALUE]",
        action = ArgAction::Append,
        long_help = "Define a macro. NAME must be a run of letters, digits and \
underscores. VALUE defaults to 1 when omitted; an integer VALUE substitutes \
as its decimal form, anything else substitutes verbatim. Repeatable; the \
first definition of a name wins."
    )]
    pub defines: Vec<String>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "PATH",
        long_help = "Write output buffers to files instead of stdout. Buffer 0 \
goes to PATH, buffer n to PATH with -n inserted before the extension."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        long = "prefix",
        value_name = "CHAR",
        default_value = "#",
        long_help = "Directive prefix character. Must be a single ASCII character \
that cannot start a macro word."
    )]
    pub prefix: String,
    #[arg(
        long = "keep-unknown",
        action = ArgAction::SetTrue,
        long_help = "Treat unknown directives as ordinary text instead of failing \
the parse."
    )]
    pub keep_unknown: bool,
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select CLI output format. text is default; json wraps buffers \
and diagnostics in machine-readable objects."
    )]
    pub format: OutputFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress the per-file summary for successful runs. Errors are \
still reported."
    )]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Validated run configuration derived from the raw CLI arguments.
#[derive(Debug)]
pub struct RunConfig {
    pub defines: Vec<(String, DefineValue)>,
    pub prefix: char,
    pub unknown_directives: UnknownDirectivePolicy,
}

/// Parse one `-D NAME[=VALUE]` specification.
pub fn parse_define(spec: &str) -> Result<(String, DefineValue), RunError> {
    let (name, value) = match spec.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (spec, None),
    };
    if name.is_empty() || !name.bytes().all(is_word_char) {
        return Err(RunError::Usage(format!("invalid define name: {name:?}")));
    }
    let value = match value {
        None => DefineValue::Number(1),
        Some(text) => match text.parse::<i32>() {
            Ok(number) => DefineValue::Number(number),
            Err(_) => DefineValue::Text(text.to_string()),
        },
    };
    Ok((name.to_string(), value))
}

fn validate_prefix(prefix: &str) -> Result<char, RunError> {
    let mut chars = prefix.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii() && !c.is_ascii_whitespace() && !is_word_char(c as u8) {
            return Ok(c);
        }
    }
    Err(RunError::Usage(format!(
        "directive prefix must be a single ASCII punctuation character, got {prefix:?}"
    )))
}

/// Validate raw arguments into a [`RunConfig`].
pub fn validate_cli(cli: &Cli) -> Result<RunConfig, RunError> {
    let prefix = validate_prefix(&cli.prefix)?;
    let defines = cli
        .defines
        .iter()
        .map(|spec| parse_define(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let unknown_directives = if cli.keep_unknown {
        UnknownDirectivePolicy::PassThrough
    } else {
        UnknownDirectivePolicy::Fail
    };
    Ok(RunConfig {
        defines,
        prefix,
        unknown_directives,
    })
}
