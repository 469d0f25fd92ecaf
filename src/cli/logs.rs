use crate::config;
use crate::error::Result;
use crate::logging;
use clap::Args;
use std::fs;
use std::io::{BufRead, BufReader};

#[derive(Args)]
pub struct LogsArgs {
    /// Show logs from a specific date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Number of lines to show
    #[arg(short, long, default_value = "100")]
    pub lines: usize,
}

pub async fn run(args: LogsArgs) -> Result<()> {
    let log_dir = config::load()?.log_dir()?;

    // The rolling appender suffixes every file with its date
    let date = args
        .date
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
    let log_file = logging::log_file_for(&log_dir, &date);

    if !log_file.exists() {
        eprintln!("Log file not found: {}", log_file.display());
        return Ok(());
    }

    let file = fs::File::open(&log_file)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<std::result::Result<_, _>>()?;

    let start = lines.len().saturating_sub(args.lines);

    for line in &lines[start..] {
        println!("{}", line);
    }

    Ok(())
}
