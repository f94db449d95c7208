//! Built-in commands.

use crate::shell::{Container, Context, Dispatcher};
use async_trait::async_trait;
use clap::{error::ErrorKind, Parser, Subcommand};
use std::io::{self, Write};
use yansi::Paint;

/// A line typed at the prompt.
#[derive(Debug, Parser)]
#[command(
    name = "wog",
    no_binary_name = true,
    disable_version_flag = true,
    override_usage = "<command> [options]"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exit the application
    Exit,
    /// Prints version information
    Version,
}

/// The built-in command set.
#[derive(Debug, Default)]
pub struct Commands;

impl Commands {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dispatcher for Commands {
    async fn dispatch(&mut self, args: Vec<String>, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        let line = match Line::try_parse_from(&args) {
            Ok(line) => line,
            Err(e) => {
                // Help text and usage errors are for the user, not failures.
                match e.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {}
                    kind => log::debug!("rejected {:?}: {}", args, kind),
                }

                e.print()?;
                return Ok(());
            }
        };

        log::debug!("dispatching {:?}", line.command);

        match line.command {
            Command::Exit => ctx.reader.close(),
            Command::Version => {
                let stdout = io::stdout();
                version(&mut stdout.lock(), ctx.container)?;
            }
        }

        Ok(())
    }
}

/// Print the banner shown when the shell starts.
pub fn banner(out: &mut impl Write, container: &Container) -> io::Result<()> {
    writeln!(
        out,
        "{} {} v{} {}",
        Paint::new("=====").dimmed(),
        Paint::new("wog cli").bold(),
        Paint::cyan(&container.cli_version).bold(),
        Paint::new("=====").dimmed(),
    )?;
    writeln!(out)?;
    writeln!(out, "Welcome! Type \"help\" for help.")?;
    writeln!(out)
}

fn version(out: &mut impl Write, container: &Container) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} v{}",
        Paint::new("wog").bold(),
        Paint::cyan(&container.app_version).bold()
    )?;
    writeln!(
        out,
        "{} v{}",
        Paint::new("wog cli").bold(),
        Paint::cyan(&container.cli_version).bold()
    )?;
    writeln!(out)
}
