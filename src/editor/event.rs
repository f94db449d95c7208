/// Enumeration of key events that can be decoded from terminal input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    Char(char),
    Enter,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Backspace,
    Delete,
    Ctrl(char),
    Eof,
}
