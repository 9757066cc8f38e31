use clap::{error::ErrorKind, Parser, ValueEnum};
use contract_replay::{
    replay_files, DiagnosticSink, OutputFormat, ReplayConfiguration, SkipPolicy, TracingSink,
};
use std::{path::PathBuf, process};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: contract-replay <requests.json> <openapi.yaml>";
const EXAMPLE: &str = "Example: contract-replay recorded_requests.json openapi.yaml";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "contract-replay",
    version,
    about = "Replay recorded HTTP exchanges against an OpenAPI contract"
)]
struct Cli {
    /// JSON array of recorded request/response pairs
    requests_file: PathBuf,

    /// OpenAPI 3.0 or 3.1 contract, YAML or JSON
    openapi_file: PathBuf,

    /// Exit with status 2 when any entry is invalid
    #[arg(long)]
    fail_on_invalid: bool,

    /// Count an entry invalid when its request failed and its response could not be rebuilt
    #[arg(long)]
    keep_request_errors: bool,

    /// Summary format written to stdout
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn configuration(&self) -> ReplayConfiguration {
        let mut configuration = ReplayConfiguration::new();
        configuration.set_fail_if_invalid(self.fail_on_invalid);
        if self.keep_request_errors {
            configuration.set_skip_policy(SkipPolicy::KeepRequestErrors);
        }
        configuration.set_output_format(match self.format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        });
        configuration
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{}", USAGE);
            eprintln!("{}", EXAMPLE);
            process::exit(1);
        }
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    process::exit(run(&cli, &mut TracingSink::new()));
}

/// Exit status: 0 on completion, 1 on a fatal error, 2 for invalid entries with `--fail-on-invalid`.
fn run<S: DiagnosticSink>(cli: &Cli, sink: &mut S) -> i32 {
    let configuration = cli.configuration();

    let summary = match replay_files(&cli.requests_file, &cli.openapi_file, &configuration, sink) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("{}", e);
            return 1;
        }
    };

    match configuration.output_format() {
        OutputFormat::Json => match serde_json::to_string(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Failed to encode summary: {}", e);
                return 1;
            }
        },
        OutputFormat::Text => println!("{}", summary),
    }

    if configuration.fail_if_invalid() && summary.invalid > 0 {
        2
    } else {
        0
    }
}
