use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use proxy_harvest::extract::sources;
use proxy_harvest::{FetchConfig, Fetcher, ProxyRecord, Source};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Collects public proxy listings and normalizes them into uniform records
#[derive(Parser)]
#[command(name = "proxy-harvest")]
#[command(about = "Collects public proxy listings and normalizes them into uniform records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch sources and emit normalized records
    Scrape {
        /// Sources to run, by name (all registered sources when omitted)
        #[arg(short, long)]
        source: Vec<String>,
        /// Output file for records
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (jsonl, text)
        #[arg(short, long, default_value = "jsonl")]
        format: String,
        /// Timeout in seconds for HTTP requests
        #[arg(long, default_value = "30")]
        timeout: u64,
        /// Challenge-solving service endpoint (FlareSolverr compatible)
        #[arg(long)]
        solver: Option<String>,
        /// Write raw response bodies to this directory instead of extracting
        #[arg(long)]
        dump_body: Option<PathBuf>,
    },
    /// List the registered sources
    Sources,
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Jsonl,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Scrape {
            source,
            output,
            format,
            timeout,
            solver,
            dump_body,
        } => {
            let format = parse_format(&format)?;
            let selected = select_sources(&source)?;

            let mut config = FetchConfig::new().with_timeout(Duration::from_secs(timeout));
            if let Some(url) = solver {
                config = config.with_solver_url(url);
            }
            if let Some(dir) = dump_body {
                config = config.with_dump_dir(dir);
            }
            let fetcher = Fetcher::with_config(config)?;

            println!("Scraping {} source(s)...", selected.len());
            let results = fetcher.run_sources(selected).await;

            let mut records = Vec::new();
            for result in results {
                if result.is_success() {
                    println!(
                        "Found {} records from {}",
                        result.records.len(),
                        result.source
                    );
                    records.extend(result.records);
                } else if let Some(error) = result.error {
                    eprintln!("Error scraping {}: {}", result.source, error);
                }
            }

            println!("\nTotal records: {}", records.len());
            write_records(&records, output.as_ref(), format)?;
        }
        Commands::Sources => {
            for source in sources::all()? {
                let mut flags = Vec::new();
                if source.render {
                    flags.push("render");
                }
                if source.challenge {
                    flags.push("challenge");
                }
                if source.follow_up.is_some() {
                    flags.push("follow-up");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                println!("{} - {} start url(s){}", source.name, source.urls.len(), flags);
            }
        }
    }

    Ok(())
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s.to_lowercase().as_str() {
        "jsonl" => Ok(OutputFormat::Jsonl),
        "text" => Ok(OutputFormat::Text),
        _ => Err(anyhow!("Invalid format: {}. Use: jsonl, text", s)),
    }
}

fn select_sources(names: &[String]) -> Result<Vec<Source>> {
    let registered = sources::all()?;
    if names.is_empty() {
        return Ok(registered);
    }

    let mut selected = Vec::new();
    for name in names {
        match registered.iter().find(|source| source.name == name.as_str()) {
            Some(source) => selected.push(source.clone()),
            None => {
                let known: Vec<_> = registered.iter().map(|source| source.name).collect();
                return Err(anyhow!("Unknown source: {}. Use: {}", name, known.join(", ")));
            }
        }
    }
    Ok(selected)
}

fn write_records(
    records: &[ProxyRecord],
    output: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut lines = Vec::with_capacity(records.len());
    for record in records {
        match format {
            OutputFormat::Jsonl => lines.push(serde_json::to_string(record)?),
            OutputFormat::Text => lines.push(record.to_simple_string()),
        }
    }

    match output {
        Some(path) => {
            std::fs::write(path, lines.join("\n") + "\n")?;
            println!("Saved {} records to {:?}", records.len(), path);
        }
        None => {
            for line in &lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
