//! The production [`LineSource`]: an [`Editor`] on the process's standard
//! streams, run on a background task.
//!
//! The task sits idle until the reader resumes it, runs one `read_line`, and
//! reports the result through the [`Emitter`]. If the read is detached before
//! the editor finishes it, because SIGINT interrupted it or the reader gave up
//! on it, the editor stops reading at once and drops the partial line. Input
//! typed after that stays queued for the next read. A second task listens for
//! SIGINT so that Ctrl+C interrupts the pending read instead of killing the
//! process.

use crate::{
    editor::{Editor, Signal},
    history::HistoryStore,
    os::TerminalOutput,
    reader::{Emitter, Generation, LineReader, LineSource, SessionEvent},
};
use futures::future::BoxFuture;
use std::io;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    signal::unix::{signal, SignalKind},
    task::JoinHandle,
};

#[derive(Debug)]
enum Control {
    Resume {
        generation: Generation,
        prompt: String,
    },
    Pause,
    ClearLine,
    Close,
}

/// Line source backed by a terminal editor task.
pub struct TerminalSource {
    control: flume::Sender<Control>,
    editor: Option<JoinHandle<()>>,
    signals: Option<JoinHandle<()>>,
}

impl TerminalSource {
    /// Spawn an editor over stdin and stdout.
    ///
    /// `history` seeds the editor's recall list, oldest first. Must be called
    /// from within a Tokio runtime.
    pub fn stdio(emitter: Emitter, history: Vec<String>, history_size: usize) -> io::Result<Self> {
        let stdout = TerminalOutput::terminal(tokio::io::stdout());
        let editor = Editor::new(tokio::io::stdin(), stdout, history, history_size);

        Self::spawn(editor, emitter)
    }

    /// Spawn the task that drives `editor`.
    pub fn spawn<I, O>(editor: Editor<I, O>, emitter: Emitter) -> io::Result<Self>
    where
        I: AsyncRead + Send + Unpin + 'static,
        O: AsyncWrite + Send + Unpin + 'static,
    {
        let mut sigint = signal(SignalKind::interrupt())?;
        let (control, commands) = flume::unbounded();

        let signals = {
            let emitter = emitter.clone();

            tokio::spawn(async move {
                while sigint.recv().await.is_some() {
                    if emitter.emit_pending(SessionEvent::Interrupt) {
                        log::debug!("SIGINT interrupted the pending read");
                    } else {
                        log::debug!("SIGINT ignored, no read is pending");
                    }
                }
            })
        };

        let editor = tokio::spawn(run(editor, commands, emitter));

        Ok(Self {
            control,
            editor: Some(editor),
            signals: Some(signals),
        })
    }

    fn send(&self, control: Control) -> io::Result<()> {
        self.control
            .send(control)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "terminal editor has stopped"))
    }
}

impl LineSource for TerminalSource {
    fn resume(&mut self, generation: Generation, prompt: &str) -> io::Result<()> {
        self.send(Control::Resume {
            generation,
            prompt: prompt.to_owned(),
        })
    }

    fn pause(&mut self) {
        let _ = self.send(Control::Pause);
    }

    fn clear_line(&mut self) {
        let _ = self.send(Control::ClearLine);
    }

    fn close(&mut self) {
        let _ = self.send(Control::Close);

        if let Some(signals) = self.signals.take() {
            signals.abort();
        }
    }

    fn closed(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            // The editor task restores the terminal mode as it exits.
            if let Some(editor) = self.editor.take() {
                if let Err(e) = editor.await {
                    log::warn!("terminal editor task failed: {}", e);
                }
            }
        })
    }
}

impl LineReader {
    /// Create a reader on the process's standard streams.
    ///
    /// The editor's recall list is seeded from the `history` key of `history`.
    pub fn stdio(
        prompt: impl Into<String>,
        history: HistoryStore,
        history_size: usize,
    ) -> io::Result<Self> {
        let emitter = Emitter::new();
        let lines = history
            .get(crate::history::HISTORY_KEY)
            .unwrap_or_default();
        let source = TerminalSource::stdio(emitter.clone(), lines, history_size)?;

        Ok(Self::new(prompt, source, emitter, history, history_size))
    }
}

/// Body of the editor task.
async fn run<I, O>(mut editor: Editor<I, O>, commands: flume::Receiver<Control>, emitter: Emitter)
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    loop {
        let control = match commands.recv_async().await {
            Ok(control) => control,
            // The reader dropped its handle without closing.
            Err(_) => break,
        };

        log::trace!("editor control: {:?}", control);

        match control {
            Control::Resume { generation, prompt } => {
                tokio::select! {
                    // Checked first so that a read resolved elsewhere never
                    // consumes another keystroke.
                    biased;

                    _ = emitter.detached(generation) => {
                        log::debug!("read {} was resolved elsewhere, cancelling it", generation);
                        editor.reset();
                    }
                    result = editor.read_line(&prompt) => {
                        let event = match result {
                            Ok(Signal::Submitted(line)) => SessionEvent::Line(line),
                            Ok(Signal::Interrupted) => SessionEvent::Interrupt,
                            Ok(Signal::Eof) => SessionEvent::Close,
                            Err(e) => {
                                log::warn!("failed to read from terminal: {}", e);
                                SessionEvent::Close
                            }
                        };

                        emitter.emit(generation, event);
                    }
                }
            }
            Control::Pause => {}
            Control::ClearLine => {
                if let Err(e) = editor.clear_line().await {
                    log::warn!("failed to clear terminal line: {}", e);
                }
            }
            Control::Close => break,
        }
    }

    log::debug!("terminal editor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        history::DEFAULT_DEBOUNCE,
        reader::{ReadError, ReadLine},
    };
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::{
        io::{AsyncWriteExt, DuplexStream},
        time::timeout,
    };

    const PATIENCE: Duration = Duration::from_secs(2);

    /// A reader on an in-memory terminal.
    struct Session {
        reader: LineReader,
        emitter: Emitter,
        keyboard: DuplexStream,
        _dir: TempDir,
    }

    impl Session {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let (keyboard, stdin) = tokio::io::duplex(1024);
            let editor = Editor::new(stdin, TerminalOutput::new(tokio::io::sink()), Vec::new(), 100);
            let emitter = Emitter::new();
            let source = TerminalSource::spawn(editor, emitter.clone()).unwrap();
            let history = HistoryStore::open(dir.path().join(".cli.json"), DEFAULT_DEBOUNCE);

            Self {
                reader: LineReader::new("$ ", source, emitter.clone(), history, 100),
                emitter,
                keyboard,
                _dir: dir,
            }
        }

        async fn type_keys(&mut self, keys: &str) {
            self.keyboard.write_all(keys.as_bytes()).await.unwrap();
        }

        async fn next_line(&mut self) -> Result<ReadLine, ReadError> {
            timeout(PATIENCE, self.reader.next_line())
                .await
                .expect("read did not finish")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_lines_are_returned_in_order() {
        let mut session = Session::new();

        session.type_keys("accounts:list\r").await;
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("accounts:list".into())
        );

        session.type_keys("version\r").await;
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("version".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn typeahead_carries_over_to_later_reads() {
        let mut session = Session::new();

        session.type_keys("version\rexit\r").await;

        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("version".into())
        );
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("exit".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_drops_partial_line_without_swallowing_the_next() {
        let mut session = Session::new();

        session.type_keys("accounts:list\r").await;
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("accounts:list".into())
        );

        session.type_keys("half").await;

        let emitter = session.emitter.clone();
        let (read, ()) = tokio::join!(session.reader.next_line(), async {
            // Let the editor take in the partial line before interrupting.
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(emitter.emit_pending(SessionEvent::Interrupt));
        });
        assert_eq!(read.unwrap(), ReadLine::Interrupted);

        session.type_keys("version\r").await;
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::Input("version".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_read_does_not_consume_input() {
        let mut session = Session::new();

        session.type_keys("half").await;
        assert!(timeout(Duration::from_millis(10), session.reader.next_line())
            .await
            .is_err());
        assert!(!session.emitter.is_armed());

        session.type_keys("ls\r").await;
        assert_eq!(session.next_line().await.unwrap(), ReadLine::Input("ls".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_closes_the_session() {
        let mut session = Session::new();

        session.keyboard.shutdown().await.unwrap();

        assert!(matches!(
            session.next_line().await,
            Err(ReadError::SessionClosed)
        ));
        assert!(!session.reader.is_running());
        assert_eq!(
            session.next_line().await.unwrap(),
            ReadLine::AlreadyClosed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_the_editor_to_stop() {
        let mut session = Session::new();

        session.type_keys("half").await;
        assert!(timeout(Duration::from_millis(10), session.reader.next_line())
            .await
            .is_err());

        timeout(PATIENCE, session.reader.shutdown())
            .await
            .expect("editor did not stop");

        // The editor owned the other end of the keyboard.
        assert!(session.keyboard.write_all(b"ls\r").await.is_err());
    }
}
