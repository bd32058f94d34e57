//! Aluminum CLI - browser history, data store, system report and utility tools

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use aluminum_core::Config;

#[derive(Parser)]
#[command(name = "aluminum")]
#[command(version)]
#[command(about = "Aluminum browser tools")]
#[command(long_about = r#"
Tools around an Aluminum browser profile:
  history   read, search and export the profile's History database
  wipe      back up and securely remove browsing history
  store     manage the local data store (history, bookmarks, cache, settings)
  sysdata   compile and inspect system reports
  calc      expression calculator, unit conversion and solvers
  code      source code helpers

Example usage:
  aluminum history search --keyword rust
  aluminum wipe --yes
  aluminum calc eval "2 * pi * 3"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to <config dir>/aluminum/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Browser profile directory, overriding configuration and detection
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the browser profile's History database
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Back up, then securely remove browsing history
    Wipe {
        /// Also remove saved logins and autofill data
        #[arg(long)]
        include_credentials: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the local data store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Compile and inspect system reports
    Sysdata {
        #[command(subcommand)]
        action: SysdataAction,
    },

    /// Calculator
    Calc {
        #[command(subcommand)]
        action: CalcAction,
    },

    /// Source code helpers
    Code {
        #[command(subcommand)]
        action: CodeAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List entries, most recently visited first
    List {
        /// Maximum number of entries (all when omitted)
        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Search titles and URLs
    Search {
        #[arg(short, long)]
        keyword: String,

        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Most visited URLs
    Top {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Aggregate browsing statistics
    Stats,

    /// Delete one entry by id
    Delete { id: i64 },

    /// Delete every entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export all entries to a file
    Export {
        output: PathBuf,

        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Visits per domain
    Domains,

    /// URLs per day of last visit
    Timeline {
        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Record a page visit
    Visit {
        url: String,
        #[arg(short, long, default_value = "")]
        title: String,
    },

    /// Recently visited pages
    Recent {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Search stored history
    Search {
        query: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Most visited stored pages
    Top {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Forget one URL
    Forget { url: String },

    /// Clear stored history
    Clear {
        /// Only entries older than this many days
        #[arg(long)]
        older_than_days: Option<u32>,
    },

    /// Add a bookmark
    Bookmark {
        url: String,
        #[arg(short, long, default_value = "")]
        title: String,
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// List bookmarks
    Bookmarks {
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Write bookmarks to a JSON file
    ExportBookmarks { output: PathBuf },

    /// Read bookmarks from a JSON file
    ImportBookmarks { input: PathBuf },

    /// Set a setting
    Set { key: String, value: String },

    /// Read a setting
    Get { key: String },

    /// Cache a file's contents under a URL
    CachePut { url: String, file: PathBuf },

    /// Read cached content
    CacheGet { url: String },

    /// Drop all cached pages
    CacheClear,

    /// Reclaim unused space
    Optimize,

    /// Copy the data store to a file
    Backup { output: PathBuf },

    /// Replace the data store with a backup
    Restore { input: PathBuf },

    /// Data store statistics
    Stats,
}

#[derive(Subcommand)]
enum SysdataAction {
    /// Collect and store a system report
    Collect {
        /// Upload this report even if uploading is disabled in configuration
        #[arg(long)]
        upload: bool,

        /// Print the full report
        #[arg(long)]
        print: bool,
    },

    /// Previously stored reports
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum CalcAction {
    /// Evaluate an expression
    Eval {
        expression: String,

        /// Extra constants as NAME=VALUE
        #[arg(long = "constant", value_name = "NAME=VALUE")]
        constants: Vec<String>,
    },

    /// Convert between units
    #[command(allow_negative_numbers = true)]
    Convert { value: f64, from: String, to: String },

    /// Percentage breakdown of a value
    #[command(allow_negative_numbers = true)]
    Percent { value: f64, percentage: f64 },

    /// Solve a*x^2 + b*x + c = 0
    #[command(allow_negative_numbers = true)]
    Quadratic { a: f64, b: f64, c: f64 },

    /// Descriptive statistics
    #[command(allow_negative_numbers = true)]
    Stats { values: Vec<f64> },
}

#[derive(Subcommand)]
enum CodeAction {
    /// Guess the language of a file ("-" reads stdin)
    Detect { file: PathBuf },

    /// Line and nesting metrics
    Metrics { file: PathBuf },

    /// Whitespace and line length checks
    Lint { file: PathBuf },

    /// Identifier similarity of two files
    Similarity { first: PathBuf, second: PathBuf },

    /// Commit message for a unified diff ("-" reads stdin)
    CommitMessage { diff: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    aluminum_core::init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.profile.is_some() {
        config.profile_dir = cli.profile;
    }
    tracing::debug!(
        database = %config.database_path().display(),
        profile = ?config.profile_dir,
        "Configuration ready"
    );

    match cli.command {
        Commands::History { action } => commands::history(&config, action),
        Commands::Wipe {
            include_credentials,
            yes,
        } => commands::wipe(&config, include_credentials, yes),
        Commands::Store { action } => commands::store(&config, action),
        Commands::Sysdata { action } => commands::sysdata(&config, action).await,
        Commands::Calc { action } => commands::calc(action),
        Commands::Code { action } => commands::code(action),
    }
}
