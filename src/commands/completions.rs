//! # Completions Command Implementation
//!
//! Prints a shell completion script for `ecosystem-ci`, generated by
//! `clap_complete` from the CLI definition.
//!
//! ```bash
//! ecosystem-ci completions bash > ~/.local/share/bash-completion/completions/ecosystem-ci
//! ecosystem-ci completions zsh > ~/.zfunc/_ecosystem-ci
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}
