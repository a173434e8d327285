use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Arguments for `tq completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate shell completion script to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout().lock();
    write_completions(shell, command, &mut out);
    out.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    generate(shell, command, "tq", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_names_binary_and_subcommands() {
        let mut cmd = clap::Command::new("tq")
            .subcommand(clap::Command::new("answer"))
            .subcommand(clap::Command::new("undo"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut cmd, &mut buf);
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("_tq"));
        assert!(script.contains("answer"));
        assert!(script.contains("undo"));
    }
}
