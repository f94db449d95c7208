use clap::{ArgAction, Parser, ValueEnum};
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};
use wog_cli::{
    commands::{self, Commands},
    config::Config,
    logger, shell, Container, HistoryStore, LineReader,
};
use yansi::Paint;

#[derive(Debug, Parser)]
#[command(name = "wog", version, about = "Interactive command shell for wog")]
struct Options {
    /// Read configuration from this file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File used to persist input history
    #[arg(long, value_name = "FILE")]
    history_file: Option<PathBuf>,

    /// Maximum number of history entries to keep
    #[arg(long, value_name = "N")]
    history_size: Option<usize>,

    /// Text shown before each line of input
    #[arg(long)]
    prompt: Option<String>,

    /// Version of the wog application this shell is attached to
    #[arg(long, value_name = "VERSION", env = "WOG_VERSION", default_value = "unknown")]
    app_version: String,

    /// When to color the prompt and command output
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Enable verbose logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self, stdout_is_tty: bool) -> bool {
        match self {
            ColorChoice::Auto => stdout_is_tty,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

fn main() {
    logger::init();

    let options = Options::parse();

    if options.quiet {
        logger::quiet();
    } else {
        logger::verbose(options.verbose);
    }

    if !options.color.enabled(atty::is(atty::Stream::Stdout)) {
        Paint::disable();
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to start runtime: {}", e);
            process::exit(exitcode::OSERR);
        }
    };

    let code = runtime.block_on(run(options));

    // Exit without waiting on the runtime: a cancelled stdin read may still be
    // parked on a blocking thread.
    process::exit(code);
}

async fn run(options: Options) -> i32 {
    let config = match &options.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return exitcode::CONFIG;
        }
    };

    if let Some(file) = options.history_file {
        config.history.file = file;
    }
    if let Some(size) = options.history_size {
        config.history.size = size;
    }

    let prompt = options
        .prompt
        .or(config.prompt)
        .unwrap_or_else(|| format!("{} $ ", Paint::green("wog")));

    let container = Container::new(options.app_version);

    {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        if let Err(e) = commands::banner(&mut stdout, &container).and_then(|_| stdout.flush()) {
            log::error!("failed to write to stdout: {}", e);
            return exitcode::IOERR;
        }
    }

    let history = HistoryStore::open(&config.history.file, config.history.debounce());

    let mut reader = match LineReader::stdio(prompt, history, config.history.size) {
        Ok(reader) => reader,
        Err(e) => {
            log::error!("failed to set up terminal: {}", e);
            return exitcode::IOERR;
        }
    };

    shell::run(&mut reader, &mut Commands::new(), &container).await;
    reader.shutdown().await;

    exitcode::OK
}
