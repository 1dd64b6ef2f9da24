// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CLI driver: input loading, output delivery and diagnostics rendering.

pub mod cli;


use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::core::error::PreprocessError;
use crate::core::preprocess::Preprocessor;

use self::cli::{Cli, OutputFormat};

/// Errors surfaced by a CLI run: bad arguments, I/O trouble, or a failed
/// parse.
#[derive(Debug)]
pub enum RunError {
    Usage(String),
    Io { context: String, source: io::Error },
    Parse(PreprocessError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Usage(_) => None,
        }
    }
}

impl From<PreprocessError> for RunError {
    fn from(err: PreprocessError) -> Self {
        Self::Parse(err)
    }
}

/// Run the preprocessor for the given CLI arguments; returns the process
/// exit code.
pub fn run(cli: &Cli) -> i32 {
    match try_run(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err, cli.format);
            1
        }
    }
}

fn try_run(cli: &Cli) -> Result<(), RunError> {
    let config = cli::validate_cli(cli)?;
    let input = read_input(&cli.input)?;

    let mut preprocessor = Preprocessor::with_defines(config.defines);
    preprocessor.set_directive_prefix(config.prefix);
    preprocessor.set_unknown_directives(config.unknown_directives);

    let outputs = preprocessor.parse(&input)?;
    deliver_outputs(cli, &outputs)
}

fn read_input(path: &Path) -> Result<String, RunError> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| RunError::Io {
                context: "<stdin>".to_string(),
                source,
            })?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|source| RunError::Io {
        context: path.display().to_string(),
        source,
    })
}

fn deliver_outputs(cli: &Cli, outputs: &[String]) -> Result<(), RunError> {
    let Some(base) = &cli.outfile else {
        if cli.format == OutputFormat::Json {
            println!("{}", json!({ "outputs": outputs }));
            return Ok(());
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for buffer in outputs {
            handle
                .write_all(buffer.as_bytes())
                .map_err(|source| RunError::Io {
                    context: "<stdout>".to_string(),
                    source,
                })?;
        }
        return Ok(());
    };

    for (index, buffer) in outputs.iter().enumerate() {
        let path = output_path(base, index);
        fs::write(&path, buffer).map_err(|source| RunError::Io {
            context: path.display().to_string(),
            source,
        })?;
        if !cli.quiet {
            eprintln!("lineforge: wrote {} ({} bytes)", path.display(), buffer.len());
        }
    }
    Ok(())
}

/// File path for one output buffer: buffer 0 keeps the base path, buffer
/// n gets `-n` inserted before the extension.
fn output_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("out");
    let name = match base.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}-{index}.{ext}"),
        None => format!("{stem}-{index}"),
    };
    base.with_file_name(name)
}

fn report_error(err: &RunError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let payload = match err {
                RunError::Parse(parse) => json!({
                    "error": {
                        "code": parse.kind().code(),
                        "message": parse.message(),
                        "line": parse.line(),
                    }
                }),
                RunError::Usage(message) => json!({
                    "error": { "code": "usage", "message": message }
                }),
                RunError::Io { context, source } => json!({
                    "error": {
                        "code": "io",
                        "message": source.to_string(),
                        "path": context,
                    }
                }),
            };
            eprintln!("{payload}");
        }
        OutputFormat::Text => eprintln!("lineforge: {err}"),
    }
}
