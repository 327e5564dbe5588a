use std::io::{self, Write};

use clap::{Args, Subcommand};

use relchain::config::{ReleaseConfig, config_file_path};
use relchain::error::{ReleaseError, ReleaseResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the effective stored configuration.
    Show,
}

pub fn run(command: ConfigCommand) -> ReleaseResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> ReleaseResult<()> {
    let path = config_file_path()?;
    let mut cfg = ReleaseConfig::load_stored()?;

    println!("Configuring relchain.");
    println!("Press Enter to keep the current value.");
    println!();

    prompt_string("Ollama endpoint", &mut cfg.ai.endpoint)?;
    prompt_string("Model", &mut cfg.ai.model)?;
    prompt_bool("AI generation enabled", &mut cfg.ai.enabled)?;
    prompt_u64("AI timeout (seconds)", &mut cfg.ai.timeout_secs)?;
    prompt_bool("Fall back to templates on AI failure", &mut cfg.ai.fallback_on_error)?;
    prompt_string("Tag prefix", &mut cfg.git.tag_prefix)?;
    prompt_bool(
        "Require clean working tree",
        &mut cfg.git.require_clean_working_tree,
    )?;

    cfg.save()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> ReleaseResult<()> {
    let path = config_file_path()?;
    let cfg = ReleaseConfig::load_stored()?;

    println!("Configuration file: {}", path.display());
    println!("Ollama endpoint: {}", cfg.ai.endpoint);
    println!("Model: {}", cfg.ai.model);
    println!("AI enabled: {}", cfg.ai.enabled);
    println!("AI timeout: {}s", cfg.ai.timeout_secs);
    println!("Max tokens: {}", cfg.ai.max_tokens);
    println!("Max retries: {}", cfg.ai.max_retries);
    println!("Fallback on error: {}", cfg.ai.fallback_on_error);
    println!("Tag prefix: {}", cfg.git.tag_prefix);
    println!(
        "Require clean working tree: {}",
        cfg.git.require_clean_working_tree
    );
    let files: Vec<String> = cfg
        .version
        .files
        .iter()
        .map(|f| f.display().to_string())
        .collect();
    println!("Version files: {}", files.join(", "));

    Ok(())
}

fn prompt_string(field: &str, target: &mut String) -> ReleaseResult<()> {
    if let Some(value) = prompt(field, target)? {
        *target = value;
    }
    Ok(())
}

fn prompt_bool(field: &str, target: &mut bool) -> ReleaseResult<()> {
    if let Some(value) = prompt(field, &target.to_string())? {
        *target = value.parse().map_err(|_| {
            ReleaseError::Configuration(format!("expected true or false for {field}"))
        })?;
    }
    Ok(())
}

fn prompt_u64(field: &str, target: &mut u64) -> ReleaseResult<()> {
    if let Some(value) = prompt(field, &target.to_string())? {
        *target = value.parse().map_err(|_| {
            ReleaseError::Configuration(format!("expected a number for {field}"))
        })?;
    }
    Ok(())
}

fn prompt(field: &str, current: &str) -> ReleaseResult<Option<String>> {
    let mut stdout = io::stdout();
    write!(stdout, "{field} [{current}]: ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
