mod common;

use async_trait::async_trait;
use common::line;
use wog_cli::{
    commands::Commands, reader::SessionEvent, shell, Container, Context, Dispatcher, ReadLine,
};

/// Records every dispatched line and fails on `boom`.
#[derive(Default)]
struct Recorder {
    dispatched: Vec<Vec<String>>,
}

#[async_trait]
impl Dispatcher for Recorder {
    async fn dispatch(&mut self, args: Vec<String>, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.dispatched.push(args.clone());

        match args[0].as_str() {
            "boom" => anyhow::bail!("handler failed"),
            "exit" => ctx.reader.close(),
            _ => {}
        }

        Ok(())
    }
}

#[tokio::test]
async fn lines_are_tokenized_and_dispatched_until_input_ends() {
    let dir = tempfile::tempdir().unwrap();
    let mut reader = common::reader(
        &dir.path().join(".cli.json"),
        vec![
            line("accounts:list"),
            SessionEvent::Interrupt,
            line("   "),
            line("accounts:find  alice"),
        ],
    );
    let mut recorder = Recorder::default();

    shell::run(&mut reader, &mut recorder, &Container::new("1.0.0")).await;

    assert!(!reader.is_running());
    assert_eq!(
        recorder.dispatched,
        vec![vec!["accounts:list"], vec!["accounts:find", "alice"]]
    );
}

#[tokio::test]
async fn dispatch_errors_do_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let mut reader = common::reader(
        &dir.path().join(".cli.json"),
        vec![line("boom"), line("version")],
    );
    let mut recorder = Recorder::default();

    shell::run(&mut reader, &mut recorder, &Container::new("1.0.0")).await;

    assert_eq!(recorder.dispatched, vec![vec!["boom"], vec!["version"]]);
}

#[tokio::test]
async fn handler_can_close_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut reader = common::reader(
        &dir.path().join(".cli.json"),
        vec![line("exit"), line("never read")],
    );
    let mut recorder = Recorder::default();

    shell::run(&mut reader, &mut recorder, &Container::new("1.0.0")).await;

    assert_eq!(recorder.dispatched, vec![vec!["exit"]]);
    assert_eq!(reader.next_line().await.unwrap(), ReadLine::AlreadyClosed);
}

#[tokio::test]
async fn builtin_exit_command_closes_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".cli.json");
    let mut reader = common::reader(&path, vec![line("exit"), line("never read")]);

    shell::run(&mut reader, &mut Commands::new(), &Container::new("1.0.0")).await;

    assert!(!reader.is_running());
    assert_eq!(reader.history().get("history"), Some(vec!["exit".to_owned()]));
    assert!(path.exists());
}
