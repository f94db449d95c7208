//! Interactive command shell for wog.
//!
//! The interesting part lives in [`reader`]: a [`LineReader`] turns terminal
//! events into one awaitable answer per prompt and owns the session from start
//! to shutdown, while [`history`] keeps submitted lines across runs.

pub mod commands;
pub mod config;
pub mod editor;
pub mod history;
pub mod logger;
pub mod os;
pub mod paths;
pub mod reader;
pub mod shell;
pub mod terminal;

pub use crate::{
    history::HistoryStore,
    reader::{LineReader, LineSource, ReadError, ReadLine},
    shell::{Container, Context, Dispatcher},
};
