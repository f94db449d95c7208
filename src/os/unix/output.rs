use crate::editor::command::Command;
use std::{
    io,
    os::unix::io::{AsRawFd, RawFd},
    pin::Pin,
    task::{Context, Poll},
};
use termios::Termios;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Saved terminal attributes for switching in and out of raw mode.
#[derive(Clone, Copy)]
struct Modes {
    fd: RawFd,
    normal: Termios,
    raw: Termios,
}

/// Output side of the terminal.
///
/// Raw mode is only available when the stream is attached to a terminal;
/// otherwise mode switches are ignored and output is written as-is.
pub struct TerminalOutput<O> {
    stdout: O,
    modes: Option<Modes>,
    is_raw: bool,
}

impl<O> TerminalOutput<O> {
    /// Wrap a stream that is never switched into raw mode.
    pub fn new(stdout: O) -> Self {
        Self {
            stdout,
            modes: None,
            is_raw: false,
        }
    }

    pub fn supports_raw_mode(&self) -> bool {
        self.modes.is_some()
    }

    pub fn set_raw_mode(&mut self, raw: bool) -> io::Result<()> {
        if let Some(modes) = self.modes {
            if raw != self.is_raw {
                let termios = if raw { &modes.raw } else { &modes.normal };
                termios::tcsetattr(modes.fd, termios::TCSANOW, termios)?;
                self.is_raw = raw;
            }
        }

        Ok(())
    }
}

impl<O: AsRawFd> TerminalOutput<O> {
    /// Wrap a stream that may be a terminal, enabling raw mode support if it is.
    pub fn terminal(stdout: O) -> Self {
        let fd = stdout.as_raw_fd();
        let mut output = Self::new(stdout);

        match Termios::from_fd(fd) {
            Ok(normal) => {
                let mut raw = normal;
                termios::cfmakeraw(&mut raw);
                output.modes = Some(Modes { fd, normal, raw });
            }
            Err(e) => {
                log::debug!("output is not a terminal, raw mode disabled: {}", e);
            }
        }

        output
    }
}

impl<O: AsyncWrite + Unpin> TerminalOutput<O> {
    pub async fn command(&mut self, command: Command) -> io::Result<()> {
        self.write_all(command.sequence().as_bytes()).await
    }
}

impl<O: AsyncWrite + Unpin> AsyncWrite for TerminalOutput<O> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stdout).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_shutdown(cx)
    }
}

impl<O> Drop for TerminalOutput<O> {
    fn drop(&mut self) {
        let _ = self.set_raw_mode(false);
    }
}
