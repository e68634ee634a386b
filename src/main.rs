use clap::Parser;
use small_basic::{filesystem, Config, Executor, StdConsole};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Small BASIC interpreter")]
struct Cli {
    /// Program file to run
    file: PathBuf,

    /// Column stop used by `,` in PRINT lists
    #[arg(long, default_value_t = 8)]
    tab_width: usize,

    /// Fail if the program defines more than this many labels
    #[arg(long, value_name = "N")]
    max_labels: Option<usize>,

    /// Log every statement and jump to stderr
    #[arg(long)]
    trace: bool,
}

/// Install the log subscriber when `RUST_LOG` is set or `--trace` is given
fn init_tracing(trace: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if trace {
        EnvFilter::new("small_basic=trace")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    let program = match filesystem::load_program(&cli.file) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut config = Config::default().with_tab_width(cli.tab_width);
    if let Some(max_labels) = cli.max_labels {
        config = config.with_label_capacity(max_labels);
    }

    let mut executor = Executor::with_config(program, StdConsole::new(), config);
    match executor.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {} (line {})", e, executor.line_number());
            ExitCode::FAILURE
        }
    }
}
