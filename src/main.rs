use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use yt_scraper::config::{Config, get_config_dir};
use yt_scraper::pipeline::{DEFAULT_MAX_RESULTS, PipelineMode};
use yt_scraper::{Result, ScraperError, commands};

// Extra modes are flags rather than subcommands so any word stays a valid keyword
#[derive(Parser)]
#[command(name = "yt-scraper")]
#[command(about = "Search YouTube for a keyword and print normalized video metadata as JSON")]
#[command(version)]
struct Cli {
    /// Search keyword
    #[arg(required_unless_present_any = ["serve", "similar"])]
    keyword: Option<String>,
    /// Maximum number of search results (capped at 50)
    #[arg(default_value_t = DEFAULT_MAX_RESULTS, value_parser = clap::value_parser!(u32).range(1..))]
    max_results: u32,
    /// Embed each result and upsert it into the local vector store
    #[arg(long)]
    index: bool,
    /// Serve `POST /scrape` over HTTP instead of running one search
    #[arg(long, conflicts_with_all = ["keyword", "similar"])]
    serve: bool,
    /// Address to bind, overrides config.toml
    #[arg(long, requires = "serve")]
    host: Option<String>,
    /// Port to bind, overrides config.toml
    #[arg(long, requires = "serve")]
    port: Option<u16>,
    /// Find indexed videos closest to TEXT
    #[arg(long, value_name = "TEXT", conflicts_with_all = ["keyword", "index"])]
    similar: Option<String>,
    /// Number of similar videos to print
    #[arg(long, default_value_t = 5, requires = "similar")]
    limit: usize,
    /// Application home directory holding config.toml and the vector store
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn mode(index: bool) -> PipelineMode {
    if index {
        PipelineMode::Indexing
    } else {
        PipelineMode::Plain
    }
}

fn print_error(message: &str) {
    println!("{}", json!({ "error": message }));
}

fn missing_keyword(err: &clap::Error) -> bool {
    err.kind() == ErrorKind::MissingRequiredArgument
        && matches!(
            err.get(ContextKind::InvalidArg),
            Some(ContextValue::Strings(args)) if args.iter().any(|arg| arg.contains("KEYWORD"))
        )
}

fn parse_error_message(err: &clap::Error) -> String {
    if missing_keyword(err) {
        return "Keyword argument is required".to_string();
    }
    err.to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}

async fn run(cli: Cli) -> Result<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().map_err(|e| ScraperError::Config(e.to_string()))?,
    };
    let config =
        Config::load(&config_dir).map_err(|e| ScraperError::Config(format!("{:#}", e)))?;

    if cli.serve {
        return commands::serve(config, cli.host, cli.port, mode(cli.index)).await;
    }
    if let Some(text) = cli.similar {
        return commands::similar(&config, &text, cli.limit).await;
    }

    let keyword = cli.keyword.unwrap_or_default();
    commands::scrape(config, &keyword, cli.max_results, mode(cli.index)).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // stdout carries the JSON result, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = err.print();
                return ExitCode::SUCCESS;
            }
            print_error(&parse_error_message(&err));
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
