use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use glassprobe_cli::{commands, MeasureOpts, ReportFormat};
use glassprobe_config::DEFAULT_BATCH_JOBS;
use tokio_util::sync::CancellationToken;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(short, long, global = true, help = "Hide progress bars")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure one candidate link, falling back to its companion on timeout
    Measure {
        #[arg(long)]
        link: String,
        #[arg(long, help = "Detail page or secondary link used when the primary times out")]
        companion: Option<String>,
        #[command(flatten)]
        opts: MeasureOpts,
    },
    /// Measure every candidate in a JSON file and write a ranked report
    Batch {
        #[arg(short, long)]
        input: Utf8PathBuf,
        #[arg(short, long, default_value = "result.csv")]
        output: Utf8PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
        #[arg(short, long, default_value_t = DEFAULT_BATCH_JOBS)]
        jobs: usize,
        #[command(flatten)]
        opts: MeasureOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling in-flight measurements");
                token.cancel();
            }
        });
    }

    match cli.command {
        Commands::Measure {
            link,
            companion,
            opts,
        } => {
            commands::cmd_measure(link, companion, opts, cli.quiet, token).await?;
        }
        Commands::Batch {
            input,
            output,
            format,
            jobs,
            opts,
        } => {
            commands::cmd_batch(input, output, format, jobs, opts, cli.quiet, token).await?;
        }
    }

    Ok(())
}
