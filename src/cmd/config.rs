use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{AppConfig, StoredConfig, config_file_path};
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored and effective configuration.
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring ticket-desk.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    apply_prompt(
        "Ticket API base URL (e.g., http://localhost:8000/api)",
        &mut cfg.api_base_url,
    )?;
    apply_number_prompt("Suggestion debounce in milliseconds", &mut cfg.debounce_ms)?;
    apply_number_prompt(
        "Request timeout in seconds",
        &mut cfg.request_timeout_secs,
    )?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let effective = AppConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("API base URL: {}", display_value(&cfg.api_base_url));
    println!(
        "Debounce (ms): {}",
        display_value(&cfg.debounce_ms.map(|ms| ms.to_string()))
    );
    println!(
        "Request timeout (s): {}",
        display_value(&cfg.request_timeout_secs.map(|secs| secs.to_string()))
    );
    println!();
    println!("Effective API base URL: {}", effective.api_base_url);
    println!("Effective debounce: {} ms", effective.debounce.as_millis());
    println!(
        "Effective request timeout: {} s",
        effective.request_timeout.as_secs()
    );

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>) -> AppResult<()> {
    match prompt(field, target.as_deref())? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn apply_number_prompt(field: &str, target: &mut Option<u64>) -> AppResult<()> {
    let current = target.map(|value| value.to_string());
    match prompt(field, current.as_deref())? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => {
            let parsed = value.parse().map_err(|_| {
                AppError::Configuration(format!("{field} must be a whole number, got '{value}'"))
            })?;
            *target = Some(parsed);
        }
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match current {
        Some(value) => write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?,
        None => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(PromptAction::parse(&input))
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

#[derive(Debug, PartialEq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}
