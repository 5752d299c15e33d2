mod loader;
mod ppm;
mod transport;

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas::config::{BoardConfig, ConfigError};
use canvas::consts::LEADERBOARD_ROWS;
use canvas::engine::{Action, EngineCore, Notice};
use canvas::placement::{Author, Color, UsernameError};
use canvas::queue::{Dispatch, SubmitError};
use clap::{Args, Parser, Subcommand};
use frames::Envelope;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::loader::Loader;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("payload decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for a realtime message")]
    Timeout,
    #[error("invalid board configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid username: {0}")]
    Username(#[from] UsernameError),
    #[error("({x}, {y}) is outside the board")]
    OutOfBounds { x: i64, y: i64 },
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
    #[error("pixel was not placed ({rejected} rejected)")]
    NotPlaced { rejected: u64 },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "place", about = "Shared pixel canvas client")]
struct Cli {
    #[arg(long, env = "PLACE_BASE_URL", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Realtime endpoint. Derived from the base URL when unset.
    #[arg(long, env = "PLACE_WS_URL")]
    ws_url: Option<String>,

    #[arg(long, env = "PLACE_BOARD_WIDTH", default_value_t = 1000)]
    width: u32,

    #[arg(long, env = "PLACE_BOARD_HEIGHT", default_value_t = 1000)]
    height: u32,

    #[arg(long, env = "PLACE_AUTHOR")]
    author: Option<String>,

    /// Records per bulk-load page; 0 loads the whole board in one request.
    #[arg(long, env = "PLACE_PAGE_SIZE", default_value_t = 0)]
    page_size: usize,

    #[command(subcommand)]
    command: Command,
}

struct Context {
    base_url: String,
    ws_url: Option<String>,
    config: BoardConfig,
    author: Option<String>,
    page_size: usize,
    client: reqwest::Client,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the leaderboard.
    Stats(StatsArgs),
    /// Write the board to a PPM image.
    Render(RenderArgs),
    /// Show who placed the visible pixel at a cell, and when.
    Inspect(InspectArgs),
    /// Place one pixel.
    Place(PlaceArgs),
    /// Follow realtime placements.
    Watch(WatchArgs),
}

/// Which slice of history to show.
#[derive(Args, Debug)]
struct ViewArgs {
    /// Show the board as of this many log entries.
    #[arg(long)]
    at: Option<usize>,

    /// Only count placements by this author.
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    view: ViewArgs,

    #[arg(long, default_value_t = LEADERBOARD_ROWS)]
    top: usize,

    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    view: ViewArgs,

    #[arg(long, short)]
    output: PathBuf,

    /// Fill for cells nobody has painted.
    #[arg(long, default_value = "FFFFFF")]
    background: Color,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    view: ViewArgs,

    #[arg(long)]
    x: i64,

    #[arg(long)]
    y: i64,
}

#[derive(Args, Debug)]
struct PlaceArgs {
    #[arg(long)]
    x: i64,

    #[arg(long)]
    y: i64,

    #[arg(long)]
    color: Color,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Stop after this many realtime messages.
    #[arg(long)]
    count: Option<usize>,

    /// Stop when no message arrives for this many seconds.
    #[arg(long)]
    idle_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    if let Err(error) = dotenv {
        if !error.not_found() {
            warn!(%error, "ignoring unreadable .env");
        }
    }

    let cli = Cli::parse();
    let ctx = Context {
        base_url: cli.base_url,
        ws_url: cli.ws_url,
        config: BoardConfig::new(cli.width, cli.height)?,
        author: cli.author,
        page_size: cli.page_size,
        client: reqwest::Client::builder().build()?,
    };

    match cli.command {
        Command::Stats(args) => run_stats(&ctx, args).await,
        Command::Render(args) => run_render(&ctx, args).await,
        Command::Inspect(args) => run_inspect(&ctx, args).await,
        Command::Place(args) => run_place(&ctx, args).await,
        Command::Watch(args) => run_watch(&ctx, args).await,
    }
}

impl Context {
    /// Build an engine and bulk-load the board into it.
    async fn load(&self) -> Result<EngineCore, CliError> {
        let mut engine = EngineCore::new(self.config.clone());
        if let Some(name) = &self.author {
            engine.set_author(name)?;
        }
        let loader = Loader::new(&self.client, &self.base_url);
        match loader.load(&mut engine, self.page_size).await {
            Ok(actions) => {
                report(actions);
                Ok(engine)
            }
            Err(error) => {
                report(engine.fail_load(&error.to_string()));
                Err(error)
            }
        }
    }

    fn realtime_url(&self) -> Result<String, CliError> {
        match &self.ws_url {
            Some(url) => Ok(url.clone()),
            None => transport::ws_url(&self.base_url),
        }
    }
}

async fn run_stats(ctx: &Context, args: StatsArgs) -> Result<(), CliError> {
    let mut engine = ctx.load().await?;
    apply_view(&mut engine, &args.view);
    let board = engine.leaderboard();
    let rows = board.top(args.top);

    if args.json {
        let standings: Vec<Value> = rows
            .iter()
            .map(|s| {
                json!({
                    "rank": s.rank,
                    "author": s.author.as_str(),
                    "count": s.count,
                    "share": board.share_percent(s),
                })
            })
            .collect();
        let value = json!({
            "position": engine.position(),
            "ceiling": engine.ceiling(),
            "total": board.total,
            "standings": standings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", timeline_line(&engine));
    for s in rows {
        println!("{:>3}. {:<16} {:>8} {:>6.2}%", s.rank, s.author.as_str(), s.count, board.share_percent(s));
    }
    Ok(())
}

async fn run_render(ctx: &Context, args: RenderArgs) -> Result<(), CliError> {
    let mut engine = ctx.load().await?;
    apply_view(&mut engine, &args.view);
    let image = ppm::encode(engine.snapshot(), args.background);
    std::fs::write(&args.output, image)?;
    info!(path = %args.output.display(), painted = engine.snapshot().painted_count(), "board written");
    println!("{}", timeline_line(&engine));
    Ok(())
}

async fn run_inspect(ctx: &Context, args: InspectArgs) -> Result<(), CliError> {
    let mut engine = ctx.load().await?;
    apply_view(&mut engine, &args.view);
    let cell = ctx
        .config
        .cell_at(args.x, args.y)
        .ok_or(CliError::OutOfBounds { x: args.x, y: args.y })?;

    match engine.inspect(cell) {
        Some(placement) => {
            let when = match placement.ts {
                Some(ts) => frames::format_timestamp(ts)?,
                None => "unknown time".to_owned(),
            };
            println!("({}, {}) #{} {} at {when}", args.x, args.y, placement.color, placement.author);
        }
        None => println!("({}, {}) unpainted", args.x, args.y),
    }
    Ok(())
}

async fn run_place(ctx: &Context, args: PlaceArgs) -> Result<(), CliError> {
    let mut engine = ctx.load().await?;
    let cell = ctx
        .config
        .cell_at(args.x, args.y)
        .ok_or(CliError::OutOfBounds { x: args.x, y: args.y })?;
    let author = engine.author().clone();

    let actions = match engine.submit(cell, args.color, author, now_ms()) {
        Ok(actions) => actions,
        Err(error) if error.is_silent() => {
            info!(%error, "nothing to place");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };

    let mut pending = report(actions);
    loop {
        for dispatch in std::mem::take(&mut pending) {
            let request = dispatch.request(now_ms())?;
            info!(id = %dispatch.id, x = request.x, y = request.y, color = %request.c, "submitting");
            let response = transport::submit(&ctx.client, &ctx.base_url, &request).await;
            pending.extend(report(engine.on_submit_result(dispatch.id, &response, now_ms())?));
        }
        if !pending.is_empty() {
            continue;
        }
        let Some(retry_at) = engine.next_retry_at() else {
            break;
        };
        let wait = u64::try_from(retry_at - now_ms()).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(wait)).await;
        pending = report(engine.poll_retries(now_ms()));
    }

    let stats = engine.queue().stats();
    if stats.acknowledged == 0 {
        return Err(CliError::NotPlaced {
            rejected: stats.rejected,
        });
    }
    println!("placed #{} at ({}, {})", args.color, args.x, args.y);
    Ok(())
}

async fn run_watch(ctx: &Context, args: WatchArgs) -> Result<(), CliError> {
    let url = ctx.realtime_url()?;
    let mut socket = transport::connect(&url).await?;
    info!(%url, "realtime connected");

    let mut engine = ctx.load().await?;
    let idle = args.idle_secs.map(Duration::from_secs);
    let mut seen = 0_usize;
    loop {
        let envelope = match transport::recv_next(&mut socket, idle).await {
            Ok(envelope) => envelope,
            Err(CliError::WsClosed | CliError::Timeout) => break,
            Err(error) => return Err(error),
        };
        seen += 1;
        match &envelope {
            Envelope::Placement(record) => println!(
                "{},{} #{} {}",
                record.x,
                record.y,
                record.color.as_deref().unwrap_or("?"),
                record.author.as_deref().unwrap_or_default()
            ),
            Envelope::Chat { username, message, .. } => println!("<{username}> {message}"),
            Envelope::Broadcast { .. } | Envelope::UserCount(_) => {}
        }
        report(engine.on_envelope(envelope));
        if args.count.is_some_and(|n| seen >= n) {
            break;
        }
    }

    info!(messages = seen, entries = engine.log().len(), "realtime stopped");
    for s in engine.leaderboard().top(LEADERBOARD_ROWS) {
        println!("{:>3}. {:<16} {:>8}", s.rank, s.author.as_str(), s.count);
    }
    Ok(())
}

/// Apply `--at` and `--filter` to a loaded engine.
fn apply_view(engine: &mut EngineCore, view: &ViewArgs) {
    if let Some(name) = &view.filter {
        report(engine.set_author_filter(Some(Author::named(name))));
    }
    if let Some(at) = view.at {
        report(engine.begin_scrub());
        report(engine.scrub_to(at));
    }
}

fn timeline_line(engine: &EngineCore) -> String {
    let mut line = format!("{}/{}", engine.position(), engine.ceiling());
    if let Some(ts) = engine.timeline_label().and_then(|p| p.ts) {
        match frames::format_timestamp(ts) {
            Ok(text) => line.push_str(&format!(" at {text}")),
            Err(error) => debug!(%error, "unprintable timestamp"),
        }
    }
    if let Some(author) = engine.filter() {
        line.push_str(&format!(" (only {author})"));
    }
    line
}

/// Surface notices and hand back submissions to dispatch.
fn report(actions: Vec<Action>) -> Vec<Dispatch> {
    let mut dispatches = Vec::new();
    for action in actions {
        match action {
            Action::Dispatch(dispatch) => dispatches.push(dispatch),
            Action::Notice(Notice::Wait { secs }) => warn!(secs, "rate limited"),
            Action::Notice(Notice::Error(message)) => warn!(%message, "submission rejected"),
            Action::Notice(Notice::LoadFailed(message)) => warn!(%message, "board load failed"),
            Action::Broadcast { info } => println!("broadcast: {info}"),
            Action::UserCountChanged(count) => info!(count, "users online"),
            other => debug!(action = ?other, "engine action"),
        }
    }
    dispatches
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}
