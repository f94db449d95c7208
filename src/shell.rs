//! The read-dispatch loop.

use crate::reader::{LineReader, ReadError, ReadLine};
use async_trait::async_trait;

/// Application-scoped values available to every command.
#[derive(Clone, Debug)]
pub struct Container {
    /// Version of the wog application this shell manages.
    pub app_version: String,
    /// Version of the shell itself.
    pub cli_version: String,
}

impl Container {
    /// Create a container for the given application version. The shell's own
    /// version is filled in from the package.
    pub fn new(app_version: impl Into<String>) -> Self {
        Self {
            app_version: app_version.into(),
            cli_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

/// What a command handler is given besides its arguments.
pub struct Context<'a> {
    pub reader: &'a mut LineReader,
    pub container: &'a Container,
}

/// Routes a tokenized line to a command handler.
#[async_trait]
pub trait Dispatcher: Send {
    async fn dispatch(&mut self, args: Vec<String>, ctx: &mut Context<'_>) -> anyhow::Result<()>;
}

/// Split a line into whitespace-separated arguments.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// Read lines and dispatch them until the reader is closed.
pub async fn run<D: Dispatcher>(reader: &mut LineReader, dispatcher: &mut D, container: &Container) {
    while reader.is_running() {
        let line = match reader.next_line().await {
            Ok(ReadLine::Input(line)) => line,
            Ok(ReadLine::Interrupted) => continue,
            Ok(ReadLine::AlreadyClosed) | Err(ReadError::SessionClosed) => break,
        };

        let args = tokenize(&line);
        if args.is_empty() {
            continue;
        }

        let mut ctx = Context {
            reader: &mut *reader,
            container,
        };

        if let Err(e) = dispatcher.dispatch(args, &mut ctx).await {
            log::error!("{:#}", e);
        }
    }

    log::debug!("shell loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        assert_eq!(
            tokenize("  accounts:find \t alice  bob "),
            vec!["accounts:find", "alice", "bob"]
        );
    }

    #[test]
    fn container_keeps_app_and_shell_versions_apart() {
        let container = Container::new("1.4.0");

        assert_eq!(container.app_version, "1.4.0");
        assert_eq!(container.cli_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn tokenize_blank_line_is_empty() {
        assert!(tokenize("   ").is_empty());
    }
}
