mod cmd;
mod output;
mod root;
mod session;

use clap::{Parser, Subcommand};
use cmd::run::RunArgs;
use routecap_core::CaptureError;
use session::Session;
use std::path::PathBuf;

/// Exit status for a run stopped by Ctrl+C.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "routecap",
    about = "Resumable capture campaigns: scripted routes, per-config recordings, rollback-safe counters",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory with routecap.yaml)
    #[arg(long, global = true, env = "ROUTECAP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Device profile (huaweipura, huaweimate, oppofindx)
    #[arg(long, global = true, short = 'p')]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every active route's campaign, moving between routes via portals
    Run(RunArgs),

    /// Roll counters back to a route:record_start checkpoint, then run
    Rollback {
        /// Checkpoint as ROUTE:ORDINAL, e.g. 7:17
        checkpoint: String,

        /// Only rewrite the counters; do not run
        #[arg(long)]
        only: bool,
    },

    /// Show the recording slots a run would use, without touching the device
    Plan {
        /// Plan a single route
        #[arg(long)]
        route: Option<u32>,
    },

    /// Show the point catalog resolved for the device profile
    Points,

    /// Transform a teleport coordinate into the device frame
    Portal {
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        y: i32,
    },

    /// Show persisted action counters
    Counters,

    /// Rehearse route transitions without recording
    DebugRoutes {
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = Session::load(&root, cli.profile.as_deref()).and_then(|session| {
        match cli.command {
            Commands::Run(args) => cmd::run::run(session, args, cli.json),
            Commands::Rollback { checkpoint, only } => {
                cmd::rollback::run(session, &checkpoint, only, cli.json)
            }
            Commands::Plan { route } => cmd::plan::run(&session, route, cli.json),
            Commands::Points => cmd::points::run(&session, cli.json),
            Commands::Portal { x, y } => cmd::portal::run(&session, x, y, cli.json),
            Commands::Counters => cmd::counters::run(&session, cli.json),
            Commands::DebugRoutes { start, end } => {
                cmd::debug_routes::run(session, start, end, cli.json)
            }
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let interrupted = e
            .chain()
            .any(|c| matches!(c.downcast_ref::<CaptureError>(), Some(CaptureError::Interrupted)));
        std::process::exit(if interrupted { EXIT_INTERRUPTED } else { 1 });
    }
}
