use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quiz_forms::data::load_forms_from_json;
use quiz_forms::services::FormService;
use quiz_forms::storage::Storage;
use quiz_forms::{Config, ResultsDashboard};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding users.json, forms.json and responses.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Leave an empty data directory empty instead of adding sample data
    #[arg(long, global = true)]
    no_seed: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the WebSocket server
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import forms from a JSON file
    Import {
        /// JSON file holding an array of forms
        file: PathBuf,
    },
    /// Show the results of a form in the terminal
    Results {
        /// ID of the form
        form_id: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> quiz_forms::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.no_seed {
        config.seed = false;
    }

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(quiz_forms::server::run(&config))
        }
        Command::Import { file } => {
            let forms = load_forms_from_json(&file)?;
            let storage = open_storage(&config)?;
            let count = FormService::new(storage).import_forms(forms)?;
            info!("Imported {} forms from {}", count, file.display());
            Ok(())
        }
        Command::Results { form_id } => ResultsDashboard::open(&config.data_dir, &form_id)?.run(),
    }
}

fn open_storage(config: &Config) -> quiz_forms::Result<Arc<Storage>> {
    let storage = Storage::open(&config.data_dir)?;
    if config.seed {
        storage.initialize()?;
    } else {
        storage.initialize_empty()?;
    }
    Ok(Arc::new(storage))
}
