//! Command substitution.
//!
//! `$(command)` inside a string is replaced by the trimmed stdout of running
//! `command` in a shell. The first `)` closes the command, so commands cannot
//! contain parentheses. A failing command aborts resolution.

use crate::walk::{StringPass, Walk};
use crate::{ConfigError, ConfigResult};
use cacts_executor::ShellCommand;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// Regex for matching $(...) command substitutions, non-greedy
static CMD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\((.*?)\)").unwrap());

/// Runs `$(...)` substitutions found in string leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandEvaluator;

impl CommandEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every command substitution in `input`, left to right.
    ///
    /// Returns `None` when `input` contains no substitution.
    pub fn evaluate(&self, input: &str) -> ConfigResult<Option<String>> {
        if !CMD_REGEX.is_match(input) {
            return Ok(None);
        }

        let mut output = String::with_capacity(input.len());
        let mut last = 0;
        for caps in CMD_REGEX.captures_iter(input) {
            let (Some(whole), Some(command)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            output.push_str(&input[last..whole.start()]);
            output.push_str(&self.run(input, command.as_str())?);
            last = whole.end();
        }
        output.push_str(&input[last..]);
        Ok(Some(output))
    }

    fn run(&self, original: &str, command: &str) -> ConfigResult<String> {
        debug!(command = %command, "Evaluating command substitution");
        let result = ShellCommand::new(command).run()?;
        if !result.success() {
            return Err(ConfigError::CommandSubstitution {
                original: original.to_string(),
                command: command.to_string(),
                error: result.error_text().to_string(),
            });
        }
        Ok(result.stdout)
    }
}

impl StringPass for CommandEvaluator {
    fn apply(&self, text: &str) -> ConfigResult<Option<String>> {
        self.evaluate(text)
    }
}

/// Evaluate every `$(...)` substitution reachable from `target`.
pub fn evaluate_commands<T: Walk + ?Sized>(target: &mut T) -> ConfigResult<()> {
    target.walk(&CommandEvaluator::new())
}
