//! Plain-text rendering of live clocks and final results.

use std::io::{self, Write};

use heat_core::{ClockView, Countdown, ResultOrder, Roster, SessionResults, format_elapsed};

/// Writes one line per competitor, then the countdown if one is pending.
pub fn write_status<W: Write>(
    writer: &mut W,
    views: &[ClockView],
    countdown: Option<&Countdown>,
    roster: &Roster,
) -> io::Result<()> {
    let name_width = views
        .iter()
        .map(|v| v.competitor.name.chars().count())
        .max()
        .unwrap_or(0);

    for view in views {
        let mut line = format!(
            "{:<3}  {:<name_width$}  {}  {}",
            view.competitor.start_order + 1,
            view.competitor.name,
            format_elapsed(view.elapsed_ms),
            view.status,
        );
        if view.can_start {
            line.push_str(" (ready)");
        }
        if !view.splits.is_empty() {
            line.push_str("  splits ");
            line.push_str(&join_splits(&view.splits));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    if let Some(countdown) = countdown {
        write_countdown(writer, countdown, roster)?;
    }
    Ok(())
}

pub fn write_countdown<W: Write>(
    writer: &mut W,
    countdown: &Countdown,
    roster: &Roster,
) -> io::Result<()> {
    let name = roster
        .get(&countdown.competitor)
        .map_or(countdown.competitor.as_str(), |c| c.name.as_str());
    writeln!(
        writer,
        "next start: {name} in {}s",
        countdown.seconds_remaining
    )
}

/// Writes the results table in the requested order.
pub fn write_results<W: Write>(
    writer: &mut W,
    results: &SessionResults,
    order: ResultOrder,
) -> io::Result<()> {
    let rows = results.ordered(order);
    let name_width = rows
        .iter()
        .map(|r| r.name.chars().count())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(0);
    let times: Vec<String> = rows
        .iter()
        .map(|r| r.final_elapsed_ms.map_or_else(|| "DNF".to_string(), format_elapsed))
        .collect();
    let time_width = times
        .iter()
        .map(String::len)
        .chain(std::iter::once("Time".len()))
        .max()
        .unwrap_or(0);

    let header = format!(
        "{:<3}  {:<name_width$}  {:<time_width$}  Splits",
        "Pos", "Name", "Time"
    );
    writeln!(writer, "{}", header.trim_end())?;

    for (position, (row, time)) in rows.iter().zip(&times).enumerate() {
        let line = format!(
            "{:<3}  {:<name_width$}  {:<time_width$}  {}",
            position + 1,
            row.name,
            time,
            join_splits(&row.splits),
        );
        writeln!(writer, "{}", line.trim_end())?;
    }

    writeln!(
        writer,
        "{}/{} finished",
        results.finished(),
        results.results.len()
    )
}

fn join_splits(splits: &[u64]) -> String {
    splits
        .iter()
        .map(|&ms| format_elapsed(ms))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use heat_core::{ManualTimeSource, SessionConfig, SessionCoordinator};
    use insta::assert_snapshot;

    fn roster() -> Roster {
        crate::roster_file::parse_roster("Anna\nBo\nCleo\n", 30).unwrap()
    }

    fn id(s: &str) -> heat_core::CompetitorId {
        heat_core::CompetitorId::new(s).unwrap()
    }

    #[test]
    fn status_lists_every_clock() {
        let time = ManualTimeSource::new();
        let mut session =
            SessionCoordinator::new(roster(), SessionConfig::manual(), time.clone()).unwrap();
        session.start(&id("anna")).unwrap();
        time.set(4_250);
        session.record_split(&id("anna")).unwrap();
        time.set(6_000);

        let mut output = Vec::new();
        write_status(&mut output, &session.snapshot(), None, session.roster()).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output.trim_end(), @r"
        1    Anna  00:06.00  running  splits 00:04.25
        2    Bo    00:00.00  idle (ready)
        3    Cleo  00:00.00  idle
        ");
    }

    #[test]
    fn status_shows_countdown() {
        let time = ManualTimeSource::new();
        let mut session =
            SessionCoordinator::new(roster(), SessionConfig::automatic(10).unwrap(), time.clone())
                .unwrap();
        session.start(&id("anna")).unwrap();
        time.set(2_500);

        let countdown = session.countdown().unwrap();
        let mut output = Vec::new();
        write_countdown(&mut output, &countdown, session.roster()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "next start: Bo in 8s\n");
    }

    #[test]
    fn results_table_by_start_and_by_time() {
        let time = ManualTimeSource::new();
        let mut session =
            SessionCoordinator::new(roster(), SessionConfig::manual(), time.clone()).unwrap();
        session.start(&id("anna")).unwrap();
        time.set(5_000);
        session.start(&id("bo")).unwrap();
        session.record_split(&id("anna")).unwrap();
        time.set(12_000);
        let results = session.end_session();

        let mut by_start = Vec::new();
        write_results(&mut by_start, &results, ResultOrder::Start).unwrap();
        assert_snapshot!(String::from_utf8(by_start).unwrap().trim_end(), @r"
        Pos  Name  Time      Splits
        1    Anna  00:12.00  00:05.00
        2    Bo    00:07.00
        3    Cleo  DNF
        2/3 finished
        ");

        let mut by_time = Vec::new();
        write_results(&mut by_time, &results, ResultOrder::Time).unwrap();
        assert_snapshot!(String::from_utf8(by_time).unwrap().trim_end(), @r"
        Pos  Name  Time      Splits
        1    Bo    00:07.00
        2    Anna  00:12.00  00:05.00
        3    Cleo  DNF
        2/3 finished
        ");
    }
}
