use std::io::{self, Write};

use eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time;
use tracing_subscriber::EnvFilter;

use parley_client::config::ClientConfig;
use parley_client::consumer::{ChatState, SharedState, lock, status_label};
use parley_client::reveal::TICK_INTERVAL;
use parley_client::session::ChatSession;
use parley_client::stream::RelayClient;
use parley_core::feedback::ThumbsDownReason;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = ClientConfig::from_env();
    let client = RelayClient::new(&config.relay_url)?;
    let mut session = ChatSession::new(client);

    println!("parley-chat connected to {}", config.relay_url);
    println!("commands: /up  /down <reason> [comment]  /regen  /reasons  /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Send(text) => converse(&mut session, &text).await?,
            Command::Up => match last_answer(&session) {
                Some(id) => report(session.thumbs_up(id).await, "thanks for the feedback"),
                None => println!("nothing to rate yet"),
            },
            Command::Down { reason, comment } => {
                let Some(reason) = ThumbsDownReason::parse(&reason) else {
                    println!("unknown reason {reason:?}; see /reasons");
                    prompt()?;
                    continue;
                };
                match last_answer(&session) {
                    Some(id) => report(
                        session.thumbs_down(id, reason, comment.as_deref()).await,
                        "thanks for the feedback",
                    ),
                    None => println!("nothing to rate yet"),
                }
            }
            Command::Regen => {
                let question = last_answer(&session).and_then(|id| session.regenerate(id));
                match question {
                    Some(question) => {
                        println!("> {question}");
                        converse(&mut session, &question).await?;
                    }
                    None => println!("nothing to regenerate"),
                }
            }
            Command::Reasons => {
                for reason in ThumbsDownReason::ALL {
                    println!("  {:<28} {}", reason.as_str(), reason.label());
                }
            }
            Command::Unknown(cmd) => println!("unknown command {cmd}"),
        }
        prompt()?;
    }
    Ok(())
}

enum Command {
    Empty,
    Quit,
    Send(String),
    Up,
    Down {
        reason: String,
        comment: Option<String>,
    },
    Regen,
    Reasons,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        match name {
            "quit" | "exit" => Command::Quit,
            "up" => Command::Up,
            "regen" => Command::Regen,
            "reasons" => Command::Reasons,
            "down" => {
                let args = args.trim();
                let (reason, comment) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                let comment = comment.trim();
                Command::Down {
                    reason: reason.to_string(),
                    comment: (!comment.is_empty()).then(|| comment.to_string()),
                }
            }
            other => Command::Unknown(format!("/{other}")),
        }
    }
}

/// Answers only accept actions after their reveal has finished.
fn last_answer(session: &ChatSession) -> Option<uuid::Uuid> {
    let state = session.state();
    let state = lock(&state);
    state
        .last_assistant_id()
        .filter(|id| state.actions_available(*id))
}

fn report(outcome: Result<(), parley_client::error::ClientError>, ok: &str) {
    match outcome {
        Ok(()) => println!("{ok}"),
        Err(e) => println!("feedback failed: {e}"),
    }
}

fn prompt() -> io::Result<()> {
    print!("you> ");
    io::stdout().flush()
}

/// Send one message and draw the transcript while it streams and reveals.
async fn converse(session: &mut ChatSession, text: &str) -> Result<()> {
    let state = session.state();
    let mut renderer = Renderer::new(&lock(&state));
    let mut ticker = time::interval(TICK_INTERVAL);
    let mut out = io::stdout();

    {
        let send = session.send(text);
        tokio::pin!(send);
        loop {
            tokio::select! {
                _ = &mut send => break,
                _ = ticker.tick() => renderer.draw(&state, &mut out)?,
            }
        }
    }

    while session.is_revealing() {
        ticker.tick().await;
        renderer.draw(&state, &mut out)?;
    }
    renderer.draw(&state, &mut out)?;
    Ok(())
}

/// Prints messages incrementally as they become visible.
struct Renderer {
    next: usize,
    printed: usize,
    status: Option<String>,
}

impl Renderer {
    fn new(state: &ChatState) -> Self {
        Self {
            next: state.messages().len(),
            printed: 0,
            status: None,
        }
    }

    fn draw(&mut self, shared: &SharedState, out: &mut impl Write) -> io::Result<()> {
        let state = lock(shared);

        if state.status() != self.status.as_deref() {
            if let Some(status) = state.status() {
                writeln!(out, "  [{}]", status_label(status))?;
            }
            self.status = state.status().map(str::to_string);
        }

        while let Some(message) = state.messages().get(self.next) {
            if !message.is_assistant() {
                self.next += 1;
                continue;
            }
            let shown = state.display_content(message);
            if self.printed == 0 && !shown.is_empty() {
                write!(out, "bot> ")?;
            }
            let fresh: String = shown.chars().skip(self.printed).collect();
            self.printed += fresh.chars().count();
            write!(out, "{fresh}")?;

            let revealing = state.reveal().is_some_and(|r| r.message_id == message.id);
            let growing = state.is_loading() && self.next + 1 == state.messages().len();
            if revealing || growing {
                break;
            }
            writeln!(out)?;
            self.next += 1;
            self.printed = 0;
        }
        out.flush()
    }
}
