//! Run command: drive one timing session from stdin.
//!
//! A single task multiplexes command lines and a refresh interval, so every
//! clock mutation happens on one thread of control.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use heat_core::{
    MonotonicTimeSource, ResultOrder, SessionConfig, SessionCoordinator, SessionResults,
    TimeSource,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::driver::{Flow, SessionDriver};
use crate::render;
use crate::roster_file::load_roster;
use crate::{Config, RunArgs};

/// Runs a session against the process's stdin and stdout.
pub fn run(args: &RunArgs, config: &Config) -> Result<()> {
    let roster = load_roster(&args.roster, config.max_competitors)?;
    let discipline = args.discipline.unwrap_or(config.discipline);
    let gap = args.gap.unwrap_or(config.gap_seconds);
    let session_config =
        SessionConfig::new(discipline, Some(gap)).context("invalid session configuration")?;
    let order = args.order.unwrap_or(config.results_order);

    let session = SessionCoordinator::new(roster, session_config, MonotonicTimeSource::new())
        .context("failed to create session")?;
    let mut driver = SessionDriver::new(session);
    let tick = Duration::from_millis(config.tick_interval_ms.max(1));

    tracing::info!(
        discipline = %discipline,
        gap_seconds = ?session_config.gap_seconds(),
        competitors = driver.session().roster().len(),
        "session ready"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;

    let stdin = BufReader::new(tokio::io::stdin());
    // Live feedback goes to stderr when stdout is reserved for JSON.
    let results = if args.json {
        let mut feedback = std::io::stderr().lock();
        runtime.block_on(drive(&mut driver, stdin, &mut feedback, tick))?;
        driver.finish()
    } else {
        let mut out = std::io::stdout().lock();
        writeln!(out, "type 'help' for commands")?;
        runtime.block_on(drive(&mut driver, stdin, &mut out, tick))?;
        driver.finish()
    };

    let mut out = std::io::stdout().lock();
    write_results(&mut out, &results, order, args.json)
}

/// Feeds command lines to the driver until `end` or end of input,
/// refreshing every `tick`.
pub async fn drive<T, R, W>(
    driver: &mut SessionDriver<T>,
    input: R,
    writer: &mut W,
    tick: Duration,
) -> Result<()>
where
    T: TimeSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command")? else {
                    tracing::debug!("input closed, ending session");
                    break;
                };
                if driver.handle(&line, writer)? == Flow::End {
                    break;
                }
            }
            _ = ticker.tick() => driver.tick(writer)?,
        }
        writer.flush()?;
    }
    Ok(())
}

/// Prints final results as a table or as JSON.
pub fn write_results<W: Write>(
    writer: &mut W,
    results: &SessionResults,
    order: ResultOrder,
    json: bool,
) -> Result<()> {
    if json {
        let ordered = results.ordered(order);
        let payload = serde_json::json!({
            "discipline": results.discipline,
            "gap_seconds": results.gap_seconds,
            "started_at": results.started_at,
            "ended_at": results.ended_at,
            "order": order,
            "results": ordered,
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        render::write_results(writer, results, order)?;
    }
    Ok(())
}
