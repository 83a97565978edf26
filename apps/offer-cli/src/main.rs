//! # offer-desk
//!
//! ```text
//! offer-desk complete --input offers.json --output completed.json --assign-article-numbers
//! offer-desk article peek
//! offer-desk article allocate 5
//! offer-desk article reset 1000
//! offer-desk config init
//! offer-desk config show
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use offer_cli::batch::{read_records, run_batch, write_records};
use offer_cli::config::DeskConfig;
use offer_cli::init_tracing;
use offer_store::ArticleNumberStore;

#[derive(Parser)]
#[command(name = "offer-desk")]
#[command(about = "Complete packaging and availability data on supplier offers", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir / offer-desk.toml)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Article number state file (overrides config)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    article_state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in missing packaging and availability fields
    Complete {
        /// JSON array of offer records
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Where to write the completed records (default: stdout)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Goods are double-stackable: double the availability counts
        #[arg(long)]
        double_stackable: bool,

        /// Maximum completion passes per record (1-32)
        #[arg(long, allow_negative_numbers = true)]
        max_iterations: Option<i64>,

        /// Give records without an article number a fresh one
        #[arg(long)]
        assign_article_numbers: bool,
    },

    /// Inspect or manage the article number counter
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },

    /// Create or inspect the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration (file, environment and flags)
    Show,
}

#[derive(Subcommand)]
enum ArticleAction {
    /// Show the next article number without allocating it
    Peek,

    /// Allocate article numbers and print them, one per line
    Allocate {
        /// How many numbers to allocate
        count: u64,
    },

    /// Set the next counter value
    Reset {
        /// New next value
        start: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let Cli {
        config: config_path,
        article_state,
        command,
    } = cli;

    // config init has to work even when the existing file does not load
    let load_config = || -> Result<DeskConfig> {
        let mut config = DeskConfig::load(config_path.clone()).context("Failed to load configuration")?;
        if let Some(path) = &article_state {
            config.article_number.state_path = path.clone();
        }
        Ok(config)
    };

    match command {
        Commands::Complete {
            input,
            output,
            double_stackable,
            max_iterations,
            assign_article_numbers,
        } => {
            let mut config = load_config()?;
            if double_stackable {
                config.completion.double_stackable = true;
            }
            if let Some(max) = max_iterations {
                config.completion.max_iterations = max;
            }

            let options = config.completion_options()?;
            let store = if assign_article_numbers {
                Some(open_store(&config)?)
            } else {
                None
            };

            let records = read_records(&input)?;
            let (completed, _summary) = run_batch(records, &options, store.as_ref())?;
            write_records(&completed, output.as_deref())
        }

        Commands::Article { action } => {
            let store = open_store(&load_config()?)?;
            match action {
                ArticleAction::Peek => println!("{}", store.peek_next()?),
                ArticleAction::Allocate { count } => {
                    for number in store.allocate(count)? {
                        println!("{}", number);
                    }
                }
                ArticleAction::Reset { start } => {
                    store.reset(start)?;
                    info!(next = %store.peek_next()?, "Counter reset");
                }
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                let path = config_path
                    .clone()
                    .or_else(DeskConfig::default_config_path)
                    .context("No config directory on this platform, pass --config")?;
                DeskConfig::write_default(&path, force)?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigAction::Show => {
                let rendered = toml::to_string_pretty(&load_config()?).context("Failed to render configuration")?;
                print!("{}", rendered);
                Ok(())
            }
        },
    }
}

fn open_store(config: &DeskConfig) -> Result<ArticleNumberStore> {
    let settings = &config.article_number;
    ArticleNumberStore::open(&settings.state_path, settings.format_config())
        .with_context(|| format!("Failed to open article number store {}", settings.state_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_complete() {
        let cli = Cli::try_parse_from([
            "offer-desk",
            "complete",
            "--input",
            "in.json",
            "--double-stackable",
            "--max-iterations",
            "-1",
        ])
        .unwrap();

        match cli.command {
            Commands::Complete {
                input,
                output,
                double_stackable,
                max_iterations,
                assign_article_numbers,
            } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert!(output.is_none());
                assert!(double_stackable);
                assert_eq!(max_iterations, Some(-1));
                assert!(!assign_article_numbers);
            }
            _ => panic!("expected complete"),
        }
    }

    #[test]
    fn test_parse_article_allocate_with_global_state() {
        let cli = Cli::try_parse_from(["offer-desk", "article", "allocate", "3", "--article-state", "c.json"]).unwrap();
        assert_eq!(cli.article_state, Some(PathBuf::from("c.json")));
        assert!(matches!(
            cli.command,
            Commands::Article {
                action: ArticleAction::Allocate { count: 3 }
            }
        ));
    }

    #[test]
    fn test_parse_config_init_and_show() {
        let cli = Cli::try_parse_from(["offer-desk", "config", "init", "--force", "--config", "desk.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("desk.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));

        let cli = Cli::try_parse_from(["offer-desk", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
