//! Pull-based line reading on top of a push-based terminal.
//!
//! A [`LineReader`] owns one [`LineSource`] for the lifetime of the session.
//! Every call to [`LineReader::next_line`] arms a single read, resumes the
//! source, and waits for the first event the source reports for that read:
//! a submitted line, an interrupt, or the end of the input stream. The source
//! is paused again before the call returns.

use crate::history::{HistoryStore, HISTORY_KEY};
use futures::future::{self, BoxFuture};
use std::io;

mod bridge;

pub use self::bridge::{Emitter, Generation, SessionEvent};

/// The terminal facility a [`LineReader`] drives.
///
/// Implementations report the outcome of each resumed read through the
/// [`Emitter`] they were created with, tagged with the generation passed to
/// [`LineSource::resume`].
pub trait LineSource: Send {
    /// Show `prompt` and start consuming input for the read `generation`.
    fn resume(&mut self, generation: Generation, prompt: &str) -> io::Result<()>;

    /// Stop consuming input until the next call to `resume`.
    fn pause(&mut self);

    /// Erase the line the cursor is on.
    fn clear_line(&mut self);

    /// Release the terminal. Called at most once.
    fn close(&mut self);

    /// Wait until the terminal has been released after [`LineSource::close`].
    fn closed(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(future::ready(()))
    }
}

/// Result of a call to [`LineReader::next_line`] that did not end the session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadLine {
    /// A line was submitted.
    Input(String),

    /// The user cancelled the line they were typing.
    Interrupted,

    /// The reader was closed before this call; nothing was read.
    AlreadyClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The input stream ended and the session has been closed.
    #[error("session closed")]
    SessionClosed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Active,
    Closed,
}

/// Interactive line reader that owns the session lifecycle.
pub struct LineReader {
    state: State,
    prompt: String,
    source: Box<dyn LineSource>,
    emitter: Emitter,
    history: HistoryStore,
    history_size: usize,
}

impl LineReader {
    /// Create a reader over `source`, which must report its events through
    /// `emitter`.
    pub fn new(
        prompt: impl Into<String>,
        source: impl LineSource + 'static,
        emitter: Emitter,
        history: HistoryStore,
        history_size: usize,
    ) -> Self {
        Self {
            state: State::Active,
            prompt: prompt.into(),
            source: Box::new(source),
            emitter,
            history,
            history_size,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Active
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Wait for the next line of input.
    ///
    /// Returns [`ReadLine::AlreadyClosed`] without touching the terminal if the
    /// reader has been closed. If the input stream ends during the call the
    /// reader closes itself and [`ReadError::SessionClosed`] is returned.
    pub async fn next_line(&mut self) -> Result<ReadLine, ReadError> {
        if self.state == State::Closed {
            return Ok(ReadLine::AlreadyClosed);
        }

        let ticket = self.emitter.arm();
        let generation = ticket.generation();

        // Detach the read even if this future is dropped before it resolves.
        let emitter = scopeguard::guard(self.emitter.clone(), |emitter| emitter.disarm());

        let event = match self.source.resume(generation, &self.prompt) {
            Ok(()) => ticket.resolve().await,
            Err(e) => {
                log::warn!("line source failed to resume: {}", e);
                SessionEvent::Close
            }
        };

        drop(emitter);
        log::trace!("read {} resolved: {:?}", generation, event);

        match event {
            SessionEvent::Line(line) => {
                self.source.pause();
                self.history.push(HISTORY_KEY, &line, self.history_size);
                Ok(ReadLine::Input(line))
            }
            SessionEvent::Interrupt => {
                self.source.pause();
                self.clear();
                Ok(ReadLine::Interrupted)
            }
            SessionEvent::Close => {
                self.close();
                Err(ReadError::SessionClosed)
            }
        }
    }

    /// Erase the current terminal line. Does nothing once closed.
    pub fn clear(&mut self) {
        if self.state == State::Closed {
            return;
        }

        self.source.clear_line();
    }

    /// End the session: release the terminal and flush history to disk.
    ///
    /// Only the first call has any effect.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }

        self.state = State::Closed;
        self.emitter.disarm();
        self.source.clear_line();
        self.source.close();

        if let Err(e) = self.history.save() {
            log::warn!("history was not saved: {}", e);
        }
    }

    /// Close the session and wait for the terminal to be handed back.
    pub async fn shutdown(&mut self) {
        self.close();
        self.source.closed().await;
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.close();
    }
}
