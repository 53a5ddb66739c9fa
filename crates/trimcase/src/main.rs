//! trimcase CLI
//!
//! Thin wrapper over `trimcase-core`: resolve settings, initialize logging,
//! open the session directory and dispatch one command. Human-facing
//! messages go to stderr, as does judge output; stdout carries only
//! `status` output.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use trimcase_core::config::Settings;
use trimcase_core::driver::{RunReport, drive, run_scripted};
use trimcase_core::judge::CommandJudge;
use trimcase_core::lines::read_lines;
use trimcase_core::logging::{LogConfig, init_logging};
use trimcase_core::session::SessionStatus;
use trimcase_core::store::FsSessionStore;
use trimcase_core::{Session, StepReport};

use crate::cli::{Cli, Commands};

/// Exit code for failures outside the core error taxonomy.
const EXIT_OTHER: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    eprintln!("error: {err:#}");
    match err.downcast_ref::<trimcase_core::Error>() {
        Some(core) => {
            if let Some(remediation) = core.remediation() {
                eprintln!();
                eprint!("{}", remediation.render_plain());
            }
            ExitCode::from(core.exit_code())
        }
        None => ExitCode::from(EXIT_OTHER),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    init_logging(&LogConfig::from(&settings.general)).context("failed to initialize logging")?;
    debug!(?settings, "Resolved settings");

    let store = FsSessionStore::from_settings(&settings.session);
    let mut session = Session::new(store, settings.engine_config());

    match cli.command {
        Commands::Start { file } => {
            let initial = read_input(&file)?;
            let report = session.start(initial)?;
            print_step(&session, &report);
        }
        Commands::Mark { verdict } => {
            if let Some(report) = session.recover()? {
                eprintln!("Finished an interrupted commit; {verdict} was not recorded.");
                print_step(&session, &report);
                return Ok(());
            }
            let report = session.mark(verdict)?;
            eprintln!("Recorded {verdict}.");
            print_step(&session, &report);
        }
        Commands::Abandon => {
            session.abandon()?;
            eprintln!("Abandoned session in {}.", session.store().dir().display());
        }
        Commands::Status { json } => {
            let status = session.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
        Commands::Script { judge, file, resume, .. } => {
            let mut judge = CommandJudge::new(judge)
                .with_invalid_exit_code(settings.judge.invalid_exit_code)
                .with_timeout(settings.judge.timeout());

            let report = match file {
                Some(file) if !resume => {
                    let initial = read_input(&file)?;
                    run_scripted(&mut session, &mut judge, initial)?
                }
                _ => drive(&mut session, &mut judge)?,
            };
            print_run(&session, report);
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<String>> {
    read_lines(path)
        .map_err(trimcase_core::Error::from)
        .with_context(|| format!("failed to read {}", path.display()))
}

fn print_step(session: &Session<FsSessionStore>, report: &StepReport) {
    let store = session.store();
    match report {
        StepReport::Continue(state) => eprintln!(
            "{} lines left, bucket size {}. Judge {} and run `trimcase mark <verdict>`.",
            state.smallest_len,
            state.bucket_size,
            store.candidate_path().display()
        ),
        StepReport::Complete { smallest_len } => eprintln!(
            "Done. Smallest failing input ({smallest_len} lines) written to {}.",
            store.output_path().display()
        ),
    }
}

fn print_run(session: &Session<FsSessionStore>, report: RunReport) {
    eprintln!(
        "Done after {} judge runs. Smallest failing input ({} lines) written to {}.",
        report.steps,
        report.smallest_len,
        session.store().output_path().display()
    );
}

fn print_status(status: &SessionStatus) {
    let state = &status.state;
    println!(
        "Session:       {}",
        if status.finished { "finished" } else { "in progress" }
    );
    println!("Lines left:    {}", status.lines_left);
    println!("Bucket size:   {}", state.bucket_size);
    println!("Cut index:     {}", state.cut_idx);
    println!("Pass drops:    {}", state.drop_count);
    println!("Min test size: {}", status.min_test_size);
    println!(
        "Steps logged:  {} ({} pass, {} fail, {} invalid)",
        status.log.steps, status.log.passes, status.log.fails, status.log.invalids
    );
}
