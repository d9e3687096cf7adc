use affinity_core::{AffinityConfig, BranchStore, Message, TracingObserver};
use affinity_memory::SqliteBranchStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod repl;
mod session;

use session::Session;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "AFFINITY_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the branch state database (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Conversation branch to operate on
    #[arg(short, long, default_value = "main")]
    branch: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one message and print the resulting directive
    Say {
        text: String,
        /// The message comes from the agent, not the user
        #[arg(long)]
        agent: bool,
        /// Print the full turn outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show stage, affection and progress
    Status,
    /// Show recent analysis entries, newest first
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Copy the branch to a new one
    Fork { to: String },
    /// Forget the branch's state
    Reset,
    /// List saved branches
    Branches,
    /// Interactive session (default)
    Repl,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("affinity").join("config.toml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = match args.config.clone().or_else(default_config_path) {
        Some(path) => AffinityConfig::load_or_default(path),
        None => AffinityConfig::default(),
    };
    let engine = config.build_engine(Arc::new(TracingObserver))?;

    let db_path = args.db.clone().unwrap_or_else(|| config.storage.db_path.clone());
    info!("Opening branch store at {}...", db_path);
    let store: Arc<dyn BranchStore> = Arc::new(SqliteBranchStore::new(&db_path).await?);

    let mut session = Session::open(engine, store, &args.branch).await?;

    match args.command.unwrap_or(Command::Repl) {
        Command::Say { text, agent, json } => {
            let message = if agent { Message::agent(text) } else { Message::user(text) };
            let out = session.say(message).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if let Some(directive) = out.directive {
                println!("{}", directive);
            }
        }
        Command::Status => println!("{}", session.status_report()),
        Command::History { limit } => println!("{}", session.history_report(limit)),
        Command::Fork { to } => {
            session.fork(&to).await?;
            println!("Forked '{}' -> '{}'", args.branch, to);
        }
        Command::Reset => {
            session.reset().await?;
            println!("Reset '{}'", args.branch);
        }
        Command::Branches => {
            for name in session.branches().await? {
                println!("{}", name);
            }
        }
        Command::Repl => repl::run(&mut session).await?,
    }

    Ok(())
}
