use crate::cli::ReplayArgs;
use crate::config;
use anyhow::Context;
use sqlprom::{
    CompositeListener, MetricsRegistry, QueryEvent, QueryListener, SlowQueryLogger, install,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// One parsed `<seconds><TAB><sql>` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry<'a> {
    pub seconds: f64,
    pub sql: &'a str,
}

/// Parse a query log line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<LogEntry<'_>>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let Some((secs, sql)) = trimmed.split_once('\t') else {
        anyhow::bail!("expected `<seconds><TAB><sql>`");
    };
    let seconds: f64 = secs
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid duration {secs:?}: {e}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("duration must be a non-negative number of seconds, got {secs:?}");
    }

    Ok(Some(LogEntry { seconds, sql }))
}

/// Feed every entry of `reader` to `listener`, returning how many were replayed.
pub fn replay(reader: impl BufRead, listener: &dyn QueryListener) -> anyhow::Result<usize> {
    let mut replayed = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let Some(entry) = parse_line(&line).with_context(|| format!("line {line_no}"))? else {
            continue;
        };
        listener.on_query(&QueryEvent::from_secs_f64(entry.sql, entry.seconds));
        replayed += 1;
    }
    Ok(replayed)
}

pub fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = config::load(args.config.as_deref())?;
    if args.full_query {
        config = config.enable_full_query();
    }

    let registry = MetricsRegistry::new();
    let observer = install(&registry, &config)?;

    let mut listener = CompositeListener::new().add(observer);
    if let Some(threshold) = config.slow_query_threshold {
        listener = listener.add(SlowQueryLogger::new(threshold));
    }

    let replayed = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            replay(BufReader::new(file), &listener)
                .with_context(|| format!("in {}", path.display()))?
        }
        None => replay(io::stdin().lock(), &listener).context("in <stdin>")?,
    };
    tracing::info!(target: "sqlprom", statements = replayed, "replay finished");

    print!("{}", registry.encode_text()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlprom::ObserverConfig;

    #[test]
    fn parses_tab_separated_line() {
        let entry = parse_line("0.013\tSELECT * FROM users WHERE id = 42")
            .unwrap()
            .unwrap();
        assert_eq!(entry.seconds, 0.013);
        assert_eq!(entry.sql, "SELECT * FROM users WHERE id = 42");
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# captured from staging").unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("SELECT 1").is_err());
        assert!(parse_line("fast\tSELECT 1").is_err());
        assert!(parse_line("-0.5\tSELECT 1").is_err());
        assert!(parse_line("inf\tSELECT 1").is_err());
    }

    #[test]
    fn replays_into_histogram() {
        let registry = MetricsRegistry::new();
        let observer = install(&registry, &ObserverConfig::new().enable_full_query()).unwrap();

        let log = "\
# seconds\tsql
0.010\tSELECT * FROM t WHERE id IN (1, 2)
0.020\tSELECT * FROM t WHERE id IN (3)

0.5\tINSERT INTO t VALUES (1, 'a'), (2, 'b')
";
        let replayed = replay(log.as_bytes(), &observer).unwrap();
        assert_eq!(replayed, 3);

        assert_eq!(
            observer
                .sink()
                .sample_count(&["select * from t where id in (?)", "SELECT"])
                .unwrap(),
            2
        );
        assert_eq!(
            observer
                .sink()
                .sample_count(&["insert into t values (?)", "INSERT"])
                .unwrap(),
            1
        );
    }

    #[test]
    fn replay_error_names_the_line() {
        let registry = MetricsRegistry::new();
        let observer = install(&registry, &ObserverConfig::new()).unwrap();

        let err = replay("0.1\tSELECT 1\nbogus\n".as_bytes(), &observer).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
