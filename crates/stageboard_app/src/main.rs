mod platform;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;

use platform::logging::{self, LogDestination};

/// Terminal progress board mirroring an orchestrator's stage snapshot.
#[derive(Debug, Parser)]
#[command(name = "stageboard", version, about)]
struct Cli {
    /// Path to the JSON command payload; read from stdin when omitted.
    payload: Option<PathBuf>,

    /// Where log output goes. The board owns the terminal while it runs, so
    /// the default is the log file.
    #[arg(long, value_enum, default_value = "file")]
    log: LogChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogChoice {
    File,
    Terminal,
    Both,
}

impl From<LogChoice> for LogDestination {
    fn from(choice: LogChoice) -> Self {
        match choice {
            LogChoice::File => LogDestination::File,
            LogChoice::Terminal => LogDestination::Terminal,
            LogChoice::Both => LogDestination::Both,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log.into());

    match run(&cli) {
        Ok(succeeded) => {
            if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("stageboard: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let text = match &cli.payload {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read payload {}", path.display()))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("read payload from stdin")?;
            buffer
        }
    };
    let payload: Value = serde_json::from_str(&text).context("payload is not valid JSON")?;

    let report = stageboard_engine::main_json(&payload, Some(Box::new(platform::run_board)));
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(report.get("status").and_then(Value::as_str) == Some("success"))
}
