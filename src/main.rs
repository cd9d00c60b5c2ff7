use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};
use is_terminal::IsTerminal;

mod config;
mod diff;
mod engine;
mod error;
mod fsops;
mod logging;
mod mapper;
mod prompt;
mod run;
mod state;
mod walk;

use config::Config;
use fsops::{DryRunFs, LinkFs, RealFs};
use logging::ChangeLog;
use prompt::{AlwaysConfirm, Confirm, NeverConfirm, TerminalConfirm};
use run::RunStats;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.debug)?;
    let config = Config::resolve(&cli, |key| std::env::var_os(key))?.verify()?;
    config.log_debug();
    execute(&config)
}

fn execute(config: &Config) -> Result<ExitCode> {
    let fs: &dyn LinkFs = if config.dry_run { &DryRunFs } else { &RealFs };
    let mut confirm = confirmation_policy(config);
    let change_log = config.change_log.as_ref().map(ChangeLog::new);

    let reports = run::link_tree(config, fs, confirm.as_mut(), change_log.as_ref())?;
    let stats = RunStats::tally(&reports);
    if !config.json {
        stats.print(config.dry_run);
    }

    if reports.iter().any(|report| report.outcome.is_failure()) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// `--force` answers yes, a dry run answers no, otherwise the user is asked.
fn confirmation_policy(config: &Config) -> Box<dyn Confirm> {
    if config.force {
        return Box::new(AlwaysConfirm);
    }
    if config.dry_run {
        return Box::new(NeverConfirm);
    }
    if !io::stdin().is_terminal() {
        tracing::debug!("stdin is not a terminal; answers are read from piped input");
    }
    if config.json || !io::stdout().is_terminal() {
        return Box::new(TerminalConfirm::new(io::stdin().lock(), io::stderr()));
    }
    Box::new(TerminalConfirm::stdio())
}

#[derive(Debug, Parser)]
#[command(
    name = "linker",
    version,
    about = "Mirror a source tree into a target directory as symbolic links"
)]
struct Cli {
    /// Directory whose files are linked [default: $PWD]
    #[arg(short, long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    source: Option<PathBuf>,
    /// Directory the links are created in [default: $HOME]
    #[arg(short, long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    target: Option<PathBuf>,
    /// Report what would happen without touching the filesystem
    #[arg(short = 'n', long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Answer yes to every replace prompt
    #[arg(short, long, action = ArgAction::SetTrue)]
    force: bool,
    /// Print debugging information to stderr
    #[arg(short, long, action = ArgAction::SetTrue)]
    debug: bool,
    /// Emit one JSON object per source file on stdout
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Show a diff before asking to replace a differing file
    #[arg(long = "show-diff", action = ArgAction::SetTrue)]
    show_diff: bool,
    /// Link files inside .git, .hg and .svn directories too
    #[arg(long = "include-vcs", action = ArgAction::SetTrue)]
    include_vcs: bool,
    /// Skip source paths matching this glob (relative to the source root)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,
    /// Append a JSON line per created or replaced link to this file
    #[arg(long = "change-log", value_name = "FILE", value_hint = ValueHint::FilePath)]
    change_log: Option<PathBuf>,
}
