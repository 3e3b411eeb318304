use anyhow::Context as _;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mapty::domains::FormValues;
use mapty::types::Command;
use mapty::{
    Collaborators, Event, FilePersistence, LoggingMiddleware, MaptyResult, RecordingView, Session,
    SessionConfig,
};
use mapty_client::http_client::ReqwestMapClient;

type DriverSession = Session<RecordingView, FilePersistence>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|a| a == "--schema") {
        let schema = schemars::schema_for!(Command);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    // Configure logging from env var `MAPTY_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("MAPTY_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep HTTP internals quiet by default
    let combined_filter = format!("{},hyper=warn,reqwest=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("mapty: log filter: {}", log_env);

    let config = SessionConfig::from_env().context("reading session configuration")?;
    let client_config =
        mapty_client::config::Config::from_env().context("reading map service configuration")?;
    let client = LoggingMiddleware::new(ReqwestMapClient::new(&client_config));

    let persistence = FilePersistence::new(&config.data_dir);
    tracing::info!("mapty: storing workouts in {}", persistence.path().display());
    let mut session = Session::new(
        &config,
        persistence,
        RecordingView::new(),
        Collaborators::from_client(client),
    );

    let mut stdout = tokio::io::stdout();
    session.start();
    flush(&mut session, &mut stdout).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            Some(event) = session.next_event() => Input::Event(event),
        };
        let outcome = match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) if line.trim().is_empty() => continue,
            Input::Line(Some(line)) => handle_line(&mut session, &line),
            Input::Event(event) => session.dispatch(event).map_err(anyhow::Error::from),
        };
        if let Err(e) = outcome {
            write_json(&mut stdout, &ErrorReply::new(e)).await?;
        }
        flush(&mut session, &mut stdout).await?;
    }

    tracing::info!("mapty: input closed, finishing pending work");
    session.settle().await?;
    flush(&mut session, &mut stdout).await?;
    Ok(())
}

enum Input {
    Line(Option<String>),
    Event(Event),
}

#[derive(Serialize)]
struct ErrorReply {
    event: &'static str,
    message: String,
}

impl ErrorReply {
    fn new(error: impl std::fmt::Display) -> Self {
        Self {
            event: "error",
            message: error.to_string(),
        }
    }
}

fn handle_line(session: &mut DriverSession, line: &str) -> anyhow::Result<()> {
    let command: Command = serde_json::from_str(line).context("unrecognised command")?;
    tracing::debug!(?command, "command received");
    apply(session, command)?;
    Ok(())
}

fn apply(session: &mut DriverSession, command: Command) -> MaptyResult<()> {
    match command {
        Command::Click { lng, lat } => session.click(mapty_client::Coordinate::new(lng, lat)),
        Command::Type { workout_type } => session.select_type(workout_type),
        Command::Confirm(fields) => {
            let values: Option<FormValues> = match session.draft() {
                Some(draft) if !fields.is_empty() => Some(fields.values_for(draft)),
                _ => None,
            };
            session.dispatch(Event::Confirmed(values))
        }
        Command::Decline => session.dispatch(Event::Declined),
        Command::Remove { id } => session.remove(id.into()),
        Command::Clear => session.clear(),
        Command::Go { id } => session.go_to(id.into()),
        Command::Home => {
            session.go_home();
            Ok(())
        }
        Command::List => {
            session.render_list();
            Ok(())
        }
    }
}

async fn write_json<T: Serialize>(stdout: &mut tokio::io::Stdout, value: &T) -> anyhow::Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    Ok(())
}

/// Write every view update recorded since the last flush.
async fn flush(session: &mut DriverSession, stdout: &mut tokio::io::Stdout) -> anyhow::Result<()> {
    for event in session.view_mut().take_events() {
        write_json(stdout, &event).await?;
    }
    stdout.flush().await?;
    Ok(())
}
