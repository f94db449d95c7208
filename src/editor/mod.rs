//! The line-editing facility: keystroke handling, cursor rendering and history
//! recall for a single line of terminal input.

use self::{buffer::Buffer, command::Command, event::Event};
use crate::os::{TerminalInput, TerminalOutput};
use std::{collections::VecDeque, io};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

pub mod buffer;
pub mod command;
pub mod event;

/// How a single call to [`Editor::read_line`] ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Signal {
    Submitted(String),
    Interrupted,
    Eof,
}

/// Controls the interactive command line editor.
pub struct Editor<I, O> {
    stdin: TerminalInput<I>,
    stdout: TerminalOutput<O>,
    buffer: Buffer,
    // Most recent entry first.
    history: VecDeque<String>,
    history_size: usize,
    history_cursor: Option<usize>,
    // What the user had typed before browsing history.
    draft: Option<String>,
}

impl<I, O> Editor<I, O> {
    /// Create an editor. `history` is given oldest first.
    pub fn new(
        stdin: I,
        stdout: TerminalOutput<O>,
        history: Vec<String>,
        history_size: usize,
    ) -> Self {
        let mut history = history.into_iter().rev().collect::<VecDeque<_>>();
        history.truncate(history_size);

        Self {
            stdin: TerminalInput::new(stdin),
            stdout,
            buffer: Buffer::new(),
            history,
            history_size,
            history_cursor: None,
            draft: None,
        }
    }

    /// Recallable history, oldest first.
    #[cfg(test)]
    fn history(&self) -> Vec<String> {
        self.history.iter().rev().cloned().collect()
    }

    /// Forget the partially typed line. Keystrokes that have not been handled
    /// yet are kept for the next read.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.history_cursor = None;
        self.draft = None;
    }

    fn remember(&mut self, line: &str) {
        if line.trim().is_empty() || self.history.front().map(String::as_str) == Some(line) {
            return;
        }

        self.history.push_front(line.to_owned());
        self.history.truncate(self.history_size);
    }

    fn recall_older(&mut self) {
        let next = self.history_cursor.map_or(0, |i| i + 1);

        if let Some(entry) = self.history.get(next) {
            if self.history_cursor.is_none() {
                self.draft = Some(self.buffer.text().to_owned());
            }

            self.buffer.set_text(entry.clone());
            self.history_cursor = Some(next);
        }
    }

    fn recall_newer(&mut self) {
        match self.history_cursor {
            Some(0) => {
                self.history_cursor = None;
                let draft = self.draft.take().unwrap_or_default();
                self.buffer.set_text(draft);
            }
            Some(i) => {
                self.history_cursor = Some(i - 1);
                self.buffer.set_text(self.history[i - 1].clone());
            }
            None => {}
        }
    }
}

impl<I: AsyncRead + Unpin, O: AsyncWrite + Unpin> Editor<I, O> {
    /// Show a command prompt to the user and wait for the user to submit a
    /// line, cancel it, or end the input stream.
    pub async fn read_line(&mut self, prompt: &str) -> io::Result<Signal> {
        self.stdout.write_all(prompt.as_bytes()).await?;
        self.stdout.flush().await?;

        let mut editor = scopeguard::guard(self, |editor| {
            if let Err(e) = editor.stdout.set_raw_mode(false) {
                log::warn!("failed to restore terminal mode: {}", e);
            }
        });

        editor.stdout.set_raw_mode(true)?;

        let result = loop {
            let event = editor.stdin.next_event().await?;
            log::trace!("event: {:?}", event);

            match event {
                Event::Enter => {
                    // Without raw mode the terminal echoes the newline itself.
                    if editor.stdout.supports_raw_mode() {
                        editor.stdout.write_all(b"\r\n").await?;
                    }

                    if !editor.buffer.is_empty() {
                        break Signal::Submitted(editor.buffer.take_text());
                    }

                    editor.stdout.write_all(prompt.as_bytes()).await?;
                    editor.stdout.flush().await?;
                    continue;
                }
                Event::Left | Event::Ctrl('b') => editor.buffer.move_left(),
                Event::Right | Event::Ctrl('f') => editor.buffer.move_right(),
                Event::Up | Event::Ctrl('p') => editor.recall_older(),
                Event::Down | Event::Ctrl('n') => editor.recall_newer(),
                Event::Home | Event::Ctrl('a') => editor.buffer.move_to_start_of_line(),
                Event::End | Event::Ctrl('e') => editor.buffer.move_to_end_of_line(),
                Event::Char(c) => editor.buffer.insert_char(c),
                Event::Backspace => editor.buffer.delete_before_cursor(),
                Event::Delete => editor.buffer.delete_after_cursor(),
                Event::Ctrl('u') => editor.buffer.delete_to_start_of_line(),
                Event::Ctrl('c') => {
                    editor.buffer.clear();
                    break Signal::Interrupted;
                }
                Event::Ctrl('d') => {
                    if editor.buffer.is_empty() {
                        break Signal::Eof;
                    }

                    editor.buffer.delete_after_cursor();
                }
                Event::Eof => {
                    if editor.buffer.is_empty() {
                        break Signal::Eof;
                    }

                    // Trailing text without a newline still counts as a line.
                    break Signal::Submitted(editor.buffer.take_text());
                }
                _ => continue,
            }

            if editor.stdout.supports_raw_mode() {
                editor.redraw(prompt).await?;
            }
        };

        editor.history_cursor = None;
        editor.draft = None;

        if let Signal::Submitted(line) = &result {
            editor.remember(line);
        }

        Ok(result)
    }

    /// Erase the line the cursor is on.
    pub async fn clear_line(&mut self) -> io::Result<()> {
        self.stdout.command(Command::ClearLine).await?;
        self.stdout.flush().await
    }

    /// Redraw the prompt and buffer.
    async fn redraw(&mut self, prompt: &str) -> io::Result<()> {
        self.stdout.write_all(b"\r").await?;
        self.stdout.command(Command::ClearAfterCursor).await?;
        self.stdout
            .write_all(format!("{}{}", prompt, self.buffer.text()).as_bytes())
            .await?;

        let diff = self.buffer.columns_after_cursor();
        if diff > 0 {
            self.stdout.command(Command::MoveCursorLeft(diff)).await?;
        }

        self.stdout.flush().await
    }
}
