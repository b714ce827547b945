//! Running (or printing) the assembled command.

use std::io::ErrorKind;
use std::process::Command;

use crate::error::{Error, Result};

/// Execute `cmd`, inheriting stdio, and return the child's exit code.
/// With `dry_run` the command is printed shell-quoted instead and 0 is
/// returned.
pub fn run_command(cmd: &[String], dry_run: bool) -> Result<i32> {
    let (program, args) = match cmd.split_first() {
        Some(split) => split,
        None => return Err(Error::CommandBuilder(String::from("Empty command"))),
    };

    if dry_run {
        println!("Would execute: {}", shell_quote(cmd));
        return Ok(0);
    }

    debug!("Executing: {}", shell_quote(cmd));

    let status = Command::new(program).args(args).status().map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            Error::ThinktankNotFound
        } else {
            Error::Io(err)
        }
    })?;

    // Death by signal has no exit code; report a generic failure.
    Ok(status.code().unwrap_or(1))
}

fn shell_quote(cmd: &[String]) -> String {
    cmd.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let needs_quoting = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || "'\"\\$`!*?[](){}<>|;&#~".contains(c));

    if needs_quoting {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        String::from(arg)
    }
}
