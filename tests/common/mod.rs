use std::{collections::VecDeque, io, path::Path};
use wog_cli::{
    history::{HistoryStore, DEFAULT_DEBOUNCE},
    reader::{Emitter, Generation, SessionEvent},
    LineReader, LineSource,
};

/// A line source that answers each read with the next scripted event, and
/// reports the end of input once the script runs out.
pub struct ScriptedSource {
    emitter: Emitter,
    script: VecDeque<SessionEvent>,
}

impl LineSource for ScriptedSource {
    fn resume(&mut self, generation: Generation, _prompt: &str) -> io::Result<()> {
        let event = self.script.pop_front().unwrap_or(SessionEvent::Close);
        self.emitter.emit(generation, event);
        Ok(())
    }

    fn pause(&mut self) {}

    fn clear_line(&mut self) {}

    fn close(&mut self) {}
}

pub fn line(text: &str) -> SessionEvent {
    SessionEvent::Line(text.to_owned())
}

/// Build a reader whose history lives at `history`.
pub fn reader(history: &Path, script: Vec<SessionEvent>) -> LineReader {
    let emitter = Emitter::new();
    let source = ScriptedSource {
        emitter: emitter.clone(),
        script: script.into(),
    };

    LineReader::new(
        "wog $ ",
        source,
        emitter,
        HistoryStore::open(history, DEFAULT_DEBOUNCE),
        100,
    )
}
