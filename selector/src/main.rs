//! Incremental test selector CLI.
//!
//! With no subcommand, collects the working diff, lets the model pick spec
//! files and test cases at 80%, 95%, 99% and 99.9% confidence, and runs them
//! level by level until a level fails.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use selector::collect::{collect_diff, enumerate_spec_files};
use selector::core::confidence::ConfidenceLevel;
use selector::drive::{DriveInput, LevelOutcome, RunOutcome, drive};
use selector::exit_codes;
use selector::io::config::{DEFAULT_CONFIG_PATH, SelectorConfig, load_config};
use selector::io::gh::GhCli;
use selector::io::git::Git;
use selector::io::llm::OpenAiClient;
use selector::io::preflight::check_tools;
use selector::io::prompt::PromptBuilder;
use selector::io::test_runner::CommandTestRunner;
use selector::logging;
use selector::select::Selector;

#[derive(Parser)]
#[command(
    name = "selector",
    version,
    about = "Run the tests a language model picks for your current changes"
)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Select and run tests at every confidence level (default).
    Run,
    /// Print the filtered diff that would be sent to the model.
    Diff,
    /// Print the spec files the model can choose from.
    Specs,
    /// Select tests for one confidence level and print them without running.
    Select {
        /// Confidence level: 80, 95, 99 or 99.9.
        #[arg(short, long, default_value = "80")]
        level: ConfidenceLevel,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve working directory")?;
    let cfg = load_config(&root.join(&cli.config))?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&cfg, &root),
        Command::Diff => cmd_diff(&cfg, &root),
        Command::Specs => cmd_specs(&cfg, &root),
        Command::Select { level } => cmd_select(&cfg, &root, level),
    }
}

fn cmd_run(cfg: &SelectorConfig, root: &Path) -> Result<i32> {
    check_tools(&["git", "gh", cfg.test_program()], root)?;
    let client = model_client(cfg, root)?;
    let git = Git::new(root);
    let diff = collect_diff(&git, &GhCli::new(root), &cfg.diff_prefixes)?;
    let spec_files = enumerate_spec_files(&git, &cfg.spec_dir, &cfg.spec_suffix)?;

    let selector = Selector::new(
        &client,
        cfg.model.as_str(),
        PromptBuilder::new(cfg.diff_budget_bytes),
        root,
    );
    let runner = CommandTestRunner::new(
        root,
        cfg.test.command.clone(),
        Duration::from_secs(cfg.test.timeout_secs),
    );
    let input = DriveInput {
        diff: &diff,
        spec_files: &spec_files,
    };
    let outcome = drive(&selector, &runner, &input, &ConfidenceLevel::ALL)?;
    print_summary(&outcome)?;
    Ok(outcome.exit_code())
}

fn cmd_diff(cfg: &SelectorConfig, root: &Path) -> Result<i32> {
    check_tools(&["git", "gh"], root)?;
    let diff = collect_diff(&Git::new(root), &GhCli::new(root), &cfg.diff_prefixes)?;
    print!("{diff}");
    Ok(exit_codes::OK)
}

fn cmd_specs(cfg: &SelectorConfig, root: &Path) -> Result<i32> {
    check_tools(&["git"], root)?;
    for path in enumerate_spec_files(&Git::new(root), &cfg.spec_dir, &cfg.spec_suffix)? {
        println!("{path}");
    }
    Ok(exit_codes::OK)
}

fn cmd_select(cfg: &SelectorConfig, root: &Path, level: ConfidenceLevel) -> Result<i32> {
    check_tools(&["git", "gh"], root)?;
    let client = model_client(cfg, root)?;
    let git = Git::new(root);
    let diff = collect_diff(&git, &GhCli::new(root), &cfg.diff_prefixes)?;
    let spec_files = enumerate_spec_files(&git, &cfg.spec_dir, &cfg.spec_suffix)?;

    let selector = Selector::new(
        &client,
        cfg.model.as_str(),
        PromptBuilder::new(cfg.diff_budget_bytes),
        root,
    );
    let files = selector.select_files(level, &diff, &spec_files)?;
    let tests = selector.select_tests(level, &diff, &files)?;
    if tests.is_empty() {
        eprintln!("no tests selected at {level}");
        return Ok(exit_codes::FAILED);
    }
    for test in &tests {
        println!("{test}");
    }
    Ok(exit_codes::OK)
}

fn model_client(cfg: &SelectorConfig, root: &Path) -> Result<OpenAiClient> {
    let api_key = cfg.resolve_api_key(root)?;
    let client = OpenAiClient::new(
        &cfg.api_base_url,
        api_key,
        Duration::from_secs(cfg.request_timeout_secs),
    )?;
    Ok(client.with_temperature(cfg.temperature))
}

fn print_summary(outcome: &RunOutcome) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for level in &outcome.levels {
        let line = match level {
            LevelOutcome::Passed {
                level,
                files,
                tests,
            } => format!(
                "{level}: passed ({} files, {} tests)",
                files.len(),
                tests.len()
            ),
            LevelOutcome::NoFiles { level } => format!("{level}: FAILED, no spec files selected"),
            LevelOutcome::NoTests { level, files } => format!(
                "{level}: FAILED, no test cases selected from {} files",
                files.len()
            ),
            LevelOutcome::TestsFailed { level, outcome } => {
                format!("{level}: FAILED, tests did not pass ({outcome:?})")
            }
        };
        writeln!(out, "{line}").context("write summary")?;
    }
    Ok(())
}
