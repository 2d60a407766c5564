use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `gd completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate the completion script for `gd` to stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_completions(shell, command, &mut out);
    out.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    generate(shell, command, "gd", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> clap::Command {
        clap::Command::new("gd")
            .subcommand(clap::Command::new("list").arg(clap::Arg::new("collection")))
            .subcommand(clap::Command::new("period"))
    }

    #[test]
    fn bash_script_names_the_binary_and_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command(), &mut buf);
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("_gd()"));
        assert!(script.contains("list"));
        assert!(script.contains("period"));
    }

    #[test]
    fn every_shell_produces_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            let mut buf = Vec::new();
            write_completions(shell, &mut command(), &mut buf);
            assert!(!buf.is_empty(), "{shell} produced nothing");
        }
    }
}
