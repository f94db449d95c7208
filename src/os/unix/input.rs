use crate::editor::event::Event;
use std::{collections::VecDeque, io};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Decodes raw terminal input into key events.
pub struct TerminalInput<I> {
    stdin: I,
    events: VecDeque<Event>,
    parser: vte::Parser,
    eof: bool,
}

impl<I> TerminalInput<I> {
    pub fn new(stdin: I) -> Self {
        Self {
            stdin,
            events: VecDeque::default(),
            parser: vte::Parser::new(),
            eof: false,
        }
    }

    fn parse_input(&mut self, byte: u8) {
        struct Perform<'a> {
            events: &'a mut VecDeque<Event>,
        }

        impl<'a> vte::Perform for Perform<'a> {
            fn print(&mut self, c: char) {
                self.events.push_back(match c {
                    '\x7f' => Event::Backspace,
                    c => Event::Char(c),
                });
            }

            fn execute(&mut self, byte: u8) {
                let event = match byte {
                    0x08 | 0x7f => Some(Event::Backspace),
                    b'\r' | b'\n' => Some(Event::Enter),
                    0x01..=0x1a => Some(Event::Ctrl((byte - 0x01 + b'a') as char)),
                    0x1c..=0x1f => Some(Event::Ctrl((byte - 0x1c + b'4') as char)),
                    _ => None,
                };

                match event {
                    Some(event) => self.events.push_back(event),
                    None => log::debug!("unknown control byte: {:#04x}", byte),
                }
            }

            fn csi_dispatch(
                &mut self,
                params: &vte::Params,
                intermediates: &[u8],
                _ignore: bool,
                action: char,
            ) {
                let params = params.iter().map(|param| param[0]).collect::<Vec<u16>>();

                let event = match (action, params.as_slice()) {
                    ('A', _) => Event::Up,
                    ('B', _) => Event::Down,
                    ('C', _) => Event::Right,
                    ('D', _) => Event::Left,
                    ('F', _) | ('~', [4]) | ('~', [8]) => Event::End,
                    ('H', _) | ('~', [1]) | ('~', [7]) => Event::Home,
                    ('~', [2]) => Event::Insert,
                    ('~', [3]) => Event::Delete,
                    ('~', [5]) => Event::PageUp,
                    ('~', [6]) => Event::PageDown,
                    _ => {
                        log::debug!("CSI {:?} / {:?} / {}", params, intermediates, action);
                        return;
                    }
                };

                self.events.push_back(event);
            }

            fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
                log::trace!("ESC {:?} / {}", intermediates, byte);
            }
        }

        let mut perform = Perform {
            events: &mut self.events,
        };

        self.parser.advance(&mut perform, byte);
    }
}

impl<I: AsyncRead + Unpin> TerminalInput<I> {
    /// Wait for the next key event.
    ///
    /// Once the underlying stream reaches its end, `Event::Eof` is returned for
    /// this and every later call.
    pub async fn next_event(&mut self) -> io::Result<Event> {
        let mut buf = [0; 1024];

        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(event);
            }

            if self.eof {
                return Ok(Event::Eof);
            }

            let count = self.stdin.read(&mut buf).await?;

            if count == 0 {
                self.eof = true;
                continue;
            }

            for &byte in &buf[..count] {
                self.parse_input(byte);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode(bytes: &[u8]) -> Vec<Event> {
        let mut input = TerminalInput::new(bytes);
        let mut events = Vec::new();

        loop {
            match input.next_event().await.unwrap() {
                Event::Eof => break,
                event => events.push(event),
            }
        }

        events
    }

    #[tokio::test]
    async fn printable_and_enter() {
        assert_eq!(
            decode(b"ls\r").await,
            vec![Event::Char('l'), Event::Char('s'), Event::Enter]
        );
    }

    #[tokio::test]
    async fn arrow_keys_and_delete() {
        assert_eq!(
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1b[3~").await,
            vec![Event::Up, Event::Down, Event::Right, Event::Left, Event::Delete]
        );
    }

    #[tokio::test]
    async fn control_chords() {
        assert_eq!(
            decode(b"\x01\x03\x05\x7f").await,
            vec![
                Event::Ctrl('a'),
                Event::Ctrl('c'),
                Event::Ctrl('e'),
                Event::Backspace,
            ]
        );
    }

    #[tokio::test]
    async fn ctrl_d_is_a_chord_not_end_of_stream() {
        let mut input = TerminalInput::new(&b"\x04"[..]);
        assert_eq!(input.next_event().await.unwrap(), Event::Ctrl('d'));
        assert_eq!(input.next_event().await.unwrap(), Event::Eof);
    }

    #[tokio::test]
    async fn end_of_stream_repeats_eof() {
        let mut input = TerminalInput::new(&b""[..]);
        assert_eq!(input.next_event().await.unwrap(), Event::Eof);
        assert_eq!(input.next_event().await.unwrap(), Event::Eof);
    }
}
