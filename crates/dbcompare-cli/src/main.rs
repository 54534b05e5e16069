use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use dbcompare::{Comparison, Console, DirectorySink, MssqlCatalog, ScriptSink};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::process::ExitCode;

mod config;

use config::{ConfigError, ScriptDir, Settings};

const HELP: &str = "\
Will compare source with target and report missing
tables and columns from the target database.

 Source:
 -sh <hostname>
 -su <username>
 -sp <password>
 -sd <database>

 Target:
 -th <hostname>
 -tu <username>
 -tp <password>
 -td <database>

 Options:
 -cf               Create SQL files for missing tables and columns.
 --out-dir <dir>   Directory for SQL files (default: current directory).
 --trust-cert      Accept the server certificate without validation.
 -h, --help        Print this help.
 -V, --version     Print the version.

 Hostnames take an optional port: host,1433 or host:1433.
 Every value can also be set through DBCOMPARE_* environment variables.
";

/// Flags that keep their historical single-dash spelling. All but `cf`
/// take a value.
const SHORT_FLAGS: &[&str] = &["sh", "su", "sp", "sd", "th", "tu", "tp", "td", "cf"];

/// Compare two SQL Server databases and report what the target is missing.
#[derive(Parser, Debug)]
#[command(name = "dbcompare", version, override_help = HELP)]
pub struct Cli {
    #[arg(long = "sh", allow_hyphen_values = true, env = "DBCOMPARE_SOURCE_HOST")]
    pub source_host: Option<String>,

    #[arg(long = "su", allow_hyphen_values = true, env = "DBCOMPARE_SOURCE_USER")]
    pub source_user: Option<String>,

    #[arg(
        long = "sp",
        allow_hyphen_values = true,
        env = "DBCOMPARE_SOURCE_PASSWORD",
        hide_env_values = true
    )]
    pub source_password: Option<String>,

    #[arg(long = "sd", allow_hyphen_values = true, env = "DBCOMPARE_SOURCE_DATABASE")]
    pub source_database: Option<String>,

    #[arg(long = "th", allow_hyphen_values = true, env = "DBCOMPARE_TARGET_HOST")]
    pub target_host: Option<String>,

    #[arg(long = "tu", allow_hyphen_values = true, env = "DBCOMPARE_TARGET_USER")]
    pub target_user: Option<String>,

    #[arg(
        long = "tp",
        allow_hyphen_values = true,
        env = "DBCOMPARE_TARGET_PASSWORD",
        hide_env_values = true
    )]
    pub target_password: Option<String>,

    #[arg(long = "td", allow_hyphen_values = true, env = "DBCOMPARE_TARGET_DATABASE")]
    pub target_database: Option<String>,

    /// Create SQL files for missing tables and columns
    #[arg(long = "cf", env = "DBCOMPARE_CREATE_FILES")]
    pub create_files: bool,

    /// Directory for SQL files
    #[arg(long, allow_hyphen_values = true, env = "DBCOMPARE_OUT_DIR")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Accept the server certificate without validation
    #[arg(long)]
    pub trust_cert: bool,
}

fn main() -> ExitCode {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let banner = format!("DbCompare v{}", env!("CARGO_PKG_VERSION"));
    if std::io::stdout().is_terminal() {
        println!("{}", banner.bold());
    } else {
        println!("{}", banner);
    }

    let args = normalize_args(std::env::args());
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => match dangling_flag(&args) {
            Some(flag)
                if !matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                return usage(&[flag]);
            }
            _ => err.exit(),
        },
    };

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(ConfigError::Missing(flags)) => return usage(&flags),
        Err(err) => {
            print_error(&err);
            return ExitCode::from(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            print_error(&err);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::from(1)
        }
    }
}

async fn run(settings: Settings) -> dbcompare::Result<()> {
    let mut sink = match &settings.scripts {
        Some(ScriptDir::Path(dir)) => Some(DirectorySink::new(dir.clone())),
        Some(ScriptDir::CurrentDir) => Some(DirectorySink::current_dir()?),
        None => None,
    };

    if let Some(sink) = &sink {
        println!();
        println!("Writing SQL files to {}", sink.location());
    }

    println!();
    let mut source = MssqlCatalog::connect(&settings.source).await?;
    println!("Connected to {}", settings.source.endpoint());
    println!();
    let mut target = MssqlCatalog::connect(&settings.target).await?;
    println!("Connected to {}", settings.target.endpoint());

    let mut console = Console;
    let mut comparison = Comparison::new(&mut source, &mut target, &mut console);
    if let Some(sink) = sink.as_mut() {
        comparison = comparison.with_scripts(sink);
    }
    let report = comparison.run().await?;

    tracing::info!(
        missing_tables = report.tables.missing.len(),
        missing_columns = report.missing_column_count(),
        scripts_written = report.scripts_written.len(),
        script_failures = report.script_failures.len(),
        "comparison finished"
    );

    source.close().await?;
    target.close().await?;
    Ok(())
}

/// Rewrite the single-dash two-letter flags (`-sh`) to their long form
/// (`--sh`) so clap does not read them as bundled short flags. Flag values
/// are passed through untouched.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    let mut value_next = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }

        let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'));
        match name.filter(|n| SHORT_FLAGS.contains(n)) {
            Some(name) => {
                value_next = name != "cf";
                out.push(format!("--{}", name));
            }
            None => {
                value_next = arg == "--out-dir";
                out.push(arg);
            }
        }
    }

    out
}

/// The value flag that ends the command line without its value, if any.
///
/// Expects arguments already passed through [`normalize_args`]. The flag is
/// returned in the spelling the help screen uses.
fn dangling_flag(args: &[String]) -> Option<&'static str> {
    const VALUE_FLAGS: &[(&str, &str)] = &[
        ("--sh", "-sh"),
        ("--su", "-su"),
        ("--sp", "-sp"),
        ("--sd", "-sd"),
        ("--th", "-th"),
        ("--tu", "-tu"),
        ("--tp", "-tp"),
        ("--td", "-td"),
        ("--out-dir", "--out-dir"),
    ];

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if let Some((_, shown)) = VALUE_FLAGS.iter().find(|(long, _)| *long == arg.as_str()) {
            if rest.next().is_none() {
                return Some(*shown);
            }
        }
    }
    None
}

/// Print the help screen with the flags that still need a value.
fn usage(missing: &[&str]) -> ExitCode {
    println!();
    print!("{}", HELP);
    println!();
    println!("Missing: {}", missing.join(" "));
    ExitCode::from(2)
}

/// Print a fatal error and its causes to stderr.
fn print_error(err: &dyn std::error::Error) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}", "ERROR!".red().bold());
    } else {
        eprintln!("ERROR!");
    }

    let message = err.to_string();
    eprintln!("{}", message);

    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        // Most messages already end with their immediate cause.
        if !message.contains(&text) {
            eprintln!("  caused by: {}", text);
        }
        cause = inner.source();
    }
}
