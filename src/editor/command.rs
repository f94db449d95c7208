/// Terminal control sequences the editor emits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    ClearLine,
    ClearAfterCursor,
    MoveCursorLeft(usize),
}

impl Command {
    pub fn sequence(self) -> String {
        match self {
            Command::ClearLine => String::from("\r\x1b[2K"),
            Command::ClearAfterCursor => String::from("\x1b[J"),
            Command::MoveCursorLeft(n) => format!("\x1b[{}D", n),
        }
    }
}
