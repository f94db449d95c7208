mod input;
mod output;

pub use self::{input::TerminalInput, output::TerminalOutput};
