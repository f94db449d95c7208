//! Diagnostic output on stderr through the `log` facade.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};
use yansi::{Color, Paint};

struct Logger {
    pretty: bool,
}

impl Logger {
    fn label(&self, level: Level) -> String {
        let (name, color) = match level {
            Level::Error => ("error", Color::Red),
            Level::Warn => ("warn", Color::Magenta),
            Level::Info => ("info", Color::Yellow),
            Level::Debug => ("debug", Color::Cyan),
            Level::Trace => ("trace", Color::Blue),
        };

        if self.pretty {
            Paint::new(name).fg(color).bold().to_string()
        } else {
            name.to_owned()
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let stderr = io::stderr();
        let mut out = stderr.lock();
        let _ = writeln!(out, "{}: {}", self.label(record.level()), record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the logger. Only warnings and errors are shown until the level is
/// changed with [`verbose`] or [`quiet`].
pub fn init() {
    let pretty = atty::is(atty::Stream::Stderr);

    if log::set_boxed_logger(Box::new(Logger { pretty })).is_err() {
        return;
    }

    log::set_max_level(LevelFilter::Warn);
    log_panics::init();

    if pretty {
        log::debug!("tty detected, pretty logging is enabled");
    } else {
        log::debug!("stderr is not a tty, pretty logging is disabled");
    }
}

pub fn verbose(verbosity: u8) {
    log::set_max_level(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
}

pub fn quiet() {
    log::set_max_level(LevelFilter::Off);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels_have_no_escapes() {
        let logger = Logger { pretty: false };

        assert_eq!(logger.label(Level::Warn), "warn");
        assert_eq!(logger.label(Level::Error), "error");
    }

    #[test]
    fn pretty_labels_are_colored() {
        let logger = Logger { pretty: true };

        let label = logger.label(Level::Info);
        assert!(label.contains("info"));
        assert!(label.starts_with("\x1b["));
    }
}
