use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "docstyle",
    about = "Index styled documents and retrieve formatting references"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Collection (template set) to operate on
    #[arg(short = 'c', long, global = true)]
    pub collection: Option<String>,

    /// Embedding backend
    #[arg(
        long,
        value_enum,
        global = true,
        default_value_t = EmbedderKind::Colbert
    )]
    pub embedder: EmbedderKind,

    /// Override the ColBERT model ID or local model path
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Late-interaction ColBERT model
    Colbert,
    /// Model-free word hashing
    Hashing,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse .docx files and add them to the collection
    Ingest(IngestArgs),
    /// Find the paragraphs most similar to a query
    Search(SearchArgs),
    /// Build a style reference from the best-matching document
    Reference(ReferenceArgs),
    /// Remove a document from the collection
    Remove(RemoveArgs),
    /// List documents in the collection
    List(ListArgs),
    /// Record measured generation throughput (tokens/second)
    Calibrate(CalibrateArgs),
    /// Show system status and statistics
    Status(StatusArgs),
    /// Manage stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Config --

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Default ColBERT model ID or local path
    Model,
    /// Collection used when --collection is not given
    Collection,
    /// Calibrated generation throughput (tokens/second)
    Throughput,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show stored settings and the values in effect
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist a setting in config.redb
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        value: String,
    },
    /// Clear a stored setting (revert to default)
    Clear {
        #[arg(value_enum)]
        key: SettingKey,
    },
}

// -- Commands --

#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Replace documents that are already indexed
    #[arg(long)]
    pub replace: bool,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct ReferenceArgs {
    /// Text describing the content to be formatted
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct RemoveArgs {
    /// Document name as shown by `list`
    pub document: String,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CalibrateArgs {
    /// Measured tokens per second
    pub tokens_per_second: f64,
}

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docstyle",
            &mut std::io::stdout(),
        );
    }
}
