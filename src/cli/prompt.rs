//! Interactive terminal prompts.
//!
//! Implements the bootstrap [`Prompt`] trait against stdin/stdout, plus
//! the small line/confirmation helpers other commands share. Everything
//! interactive lives here so command logic stays testable.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::bootstrap::{Prompt, Resolution};

/// Prompt implementation backed by the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Prompt for TerminalPrompt {
    fn remote_url(&mut self, default: Option<&str>) -> Result<String> {
        loop {
            let answer = prompt_line("Knowledge repository URL", default)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            println!("{}", "A remote URL is required.".yellow());
        }
    }

    fn resolution(&mut self) -> Result<Resolution> {
        println!();
        println!("{}", "The remote already has content.".yellow());
        println!("  [1] overwrite - replace the remote with the fresh template");
        println!("  [2] merge     - keep the remote's history, fold the template in");
        println!("  [3] cancel    - use a different URL");

        loop {
            print!("{}", "Resolution [1/2/3]: ".cyan());
            io::stdout().flush()?;

            let mut input = String::new();
            let read = io::stdin()
                .read_line(&mut input)
                .context("Failed to read resolution choice")?;
            if read == 0 {
                bail!("Input stream closed before a resolution was chosen");
            }

            match input.trim().to_lowercase().as_str() {
                "1" | "o" | "overwrite" => return Ok(Resolution::Overwrite),
                "2" | "m" | "merge" => return Ok(Resolution::Merge),
                "3" | "c" | "cancel" => return Ok(Resolution::Cancel),
                other => println!("{}: '{}' is not an option", "Warning".yellow(), other),
            }
        }
    }
}

/// Prompts for a single line, returning `default` on empty input.
pub fn prompt_line(prompt: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{prompt} [{d}]: "),
        None => print!("{prompt}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;
    // Zero bytes means stdin is closed, not an empty answer; re-prompting
    // would loop forever in non-interactive runs.
    if read == 0 {
        bail!("Input stream closed while waiting for a response");
    }
    let input = input.trim();

    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input.to_string())
    }
}
