//! Check command: validate a roster file and print the start list.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::Config;
use crate::roster_file::load_roster;

pub fn run<W: Write>(writer: &mut W, path: &Path, config: &Config) -> Result<()> {
    let roster = load_roster(path, config.max_competitors)?;

    writeln!(writer, "{} competitors", roster.len())?;
    for competitor in &roster {
        writeln!(
            writer,
            "{:>2}. {} [{}]",
            competitor.start_order + 1,
            competitor.name,
            competitor.id
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn check_command_lists_start_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("heat.txt");
        std::fs::write(&path, "# lane order\nAnna Berg\nBo\nbo\n").unwrap();

        let mut output = Vec::new();
        run(&mut output, &path, &Config::default()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        3 competitors
         1. Anna Berg [anna-berg]
         2. Bo [bo]
         3. bo [bo-2]
        ");
    }

    #[test]
    fn check_command_respects_limit() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("heat.txt");
        std::fs::write(&path, "A\nB\nC\n").unwrap();

        let config = Config {
            max_competitors: 2,
            ..Config::default()
        };
        let err = run(&mut Vec::new(), &path, &config).unwrap_err();
        assert!(format!("{err:#}").contains("roster is full (2 competitors max)"));
    }
}
