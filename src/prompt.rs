// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator input: overwrite confirmations and payload values.

use std::io::{self, BufRead, Write};

use crate::error::Result;
use crate::types::identity::ResourceIdentity;

/// Source of operator decisions and values
pub trait Prompter {
    /// Ask whether an existing resource may be overwritten
    fn confirm_overwrite(&mut self, identity: &ResourceIdentity) -> Result<bool>;

    /// Ask for a single value, without the trailing newline
    fn prompt_value(&mut self, label: &str) -> Result<String>;
}

/// Prompter reading answers from `input` and writing questions to `output`
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm_overwrite(&mut self, identity: &ResourceIdentity) -> Result<bool> {
        let question = format!(
            "{} '{}' already exists in namespace '{}'. Overwrite? (y/n): ",
            identity.kind(),
            identity.name(),
            identity.namespace_name().unwrap_or_default()
        );

        // closed input declines
        Ok(self
            .ask(&question)?
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
    }

    fn prompt_value(&mut self, label: &str) -> Result<String> {
        self.ask(&format!("{}: ", label))?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input closed while waiting for '{}'", label),
            )
            .into()
        })
    }
}
