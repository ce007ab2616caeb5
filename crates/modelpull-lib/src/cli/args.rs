use crate::config::TransportKind;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    List {
        config_path: Option<String>,
        url: String,
    },
    Download {
        config_path: Option<String>,
        url: String,
        output_dir: Option<String>,
        assume_yes: bool,
        no_update: bool,
        exclude_extensions: Vec<String>,
        parallelism: Option<usize>,
        max_retries: Option<usize>,
        transport: Option<TransportKind>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "modelpull",
    version,
    about = "Download every file of a model repository from a mirror, resuming interrupted transfers"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Optional config file (YAML, TOML or JSON)",
        global = true
    )]
    config: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Resolve the full file listing of a repository and print it
    List {
        #[arg(
            value_name = "URL",
            help = "\"Files and versions\" URL, e.g. https://huggingface.co/org/model/tree/main"
        )]
        url: String,
    },

    /// Resolve the file listing and download every file
    Download {
        #[arg(
            value_name = "URL",
            help = "\"Files and versions\" URL, e.g. https://huggingface.co/org/model/tree/main"
        )]
        url: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Destination directory (default: ./<owner>/<repo>)"
        )]
        output_dir: Option<String>,

        #[arg(
            short = 'y',
            long = "yes",
            help = "Start downloading without asking for confirmation"
        )]
        yes: bool,

        #[arg(
            long = "no-update",
            help = "Download weight files again even if they already exist locally"
        )]
        no_update: bool,

        #[arg(
            short = 'x',
            long = "exclude",
            value_name = "EXT",
            help = "Overrides excluded extensions (repeat or use comma-separated values)",
            action = ArgAction::Append,
            value_delimiter = ','
        )]
        exclude_extensions: Vec<String>,

        #[arg(
            long = "parallelism",
            value_name = "N",
            help = "Maximum number of simultaneous downloads"
        )]
        parallelism: Option<usize>,

        #[arg(
            long = "max-retries",
            value_name = "N",
            help = "Maximum resume attempts per file after a failed transfer"
        )]
        max_retries: Option<usize>,

        #[arg(long = "transport", value_name = "KIND", help = "How files are transferred")]
        transport: Option<TransportKind>,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap())
                .add_directive("html5ever=warn".parse().unwrap()),
        )
        .init();

    let config_path = cli.config;
    let command = match cli.command {
        CliCommand::List { url } => Command::List { config_path, url },
        CliCommand::Download {
            url,
            output_dir,
            yes,
            no_update,
            exclude_extensions,
            parallelism,
            max_retries,
            transport,
        } => Command::Download {
            config_path,
            url,
            output_dir,
            assume_yes: yes,
            no_update,
            exclude_extensions,
            parallelism,
            max_retries,
            transport,
        },
    };

    Args { command, log_level }
}
