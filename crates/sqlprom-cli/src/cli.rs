use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Normalize,
    Replay,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Normalize(NormalizeArgs),
    Replay(ReplayArgs),
}

#[derive(Debug, Clone)]
pub struct NormalizeArgs {
    pub statements: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReplayArgs {
    /// Explicit config file. `None` falls back to `sqlprom.toml` when present.
    pub config: Option<PathBuf>,
    pub full_query: bool,
    /// Query log to read. `None` reads stdin.
    pub input: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "normalize" => parse_normalize(it.map(|s| s.as_str())),
        "replay" => parse_replay(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_normalize<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut statements = Vec::new();
    let mut positional_only = false;

    for token in it {
        match token {
            "--" if !positional_only => positional_only = true,
            "-h" | "--help" if !positional_only => {
                return Ok(Command::Help(HelpTopic::Normalize));
            }
            _ => statements.push(token.to_string()),
        }
    }

    if statements.is_empty() {
        anyhow::bail!("normalize requires at least one SQL statement");
    }
    Ok(Command::Normalize(NormalizeArgs { statements }))
}

fn parse_replay<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config: Option<PathBuf> = None;
    let mut full_query = false;
    let mut input: Option<PathBuf> = None;
    let mut seen_input = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Replay)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--full-query" => full_query = true,
            _ if token.starts_with('-') && token != "-" => {
                anyhow::bail!("unknown option: {token}")
            }
            _ => {
                if seen_input {
                    anyhow::bail!("replay accepts a single input");
                }
                seen_input = true;
                input = (token != "-").then(|| PathBuf::from(token));
            }
        }
    }

    Ok(Command::Replay(ReplayArgs {
        config,
        full_query,
        input,
    }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlprom - SQL normalization and query duration histograms

USAGE:
  sqlprom <COMMAND> [OPTIONS]

COMMANDS:
  normalize     Print the query type and normalized form of SQL statements
  replay        Replay a query log and print Prometheus metrics

Run `sqlprom <command> --help` for more."
            );
        }
        HelpTopic::Normalize => {
            println!(
                "\
USAGE:
  sqlprom normalize [--] <SQL>...

Prints one `<QUERY_TYPE><TAB><normalized>` line per statement.

OPTIONS:
  -h, --help            Print help"
            );
        }
        HelpTopic::Replay => {
            println!(
                "\
USAGE:
  sqlprom replay [OPTIONS] [FILE|-]

Reads `<seconds><TAB><sql>` lines (default: stdin), records each into the
sql_query_duration histogram and prints the Prometheus text exposition.
Blank lines and lines starting with `#` are skipped.

OPTIONS:
  --config <FILE>       Config file path (default: sqlprom.toml if present)
  --full-query          Record the normalized statement as the `query` label
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sqlprom")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn no_args_prints_root_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_normalize_statements() {
        let cmd = parse_args(&args(&["normalize", "SELECT 1", "SELECT 2"])).unwrap();
        let Command::Normalize(n) = cmd else {
            panic!("expected normalize");
        };
        assert_eq!(n.statements, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn normalize_after_double_dash_keeps_flags_as_sql() {
        let cmd = parse_args(&args(&["normalize", "--", "--help"])).unwrap();
        let Command::Normalize(n) = cmd else {
            panic!("expected normalize");
        };
        assert_eq!(n.statements, vec!["--help"]);
    }

    #[test]
    fn normalize_requires_a_statement() {
        assert!(parse_args(&args(&["normalize"])).is_err());
    }

    #[test]
    fn parse_replay_with_options() {
        let cmd = parse_args(&args(&[
            "replay",
            "--config",
            "metrics.toml",
            "--full-query",
            "queries.log",
        ]))
        .unwrap();
        let Command::Replay(r) = cmd else {
            panic!("expected replay");
        };
        assert_eq!(r.config, Some(PathBuf::from("metrics.toml")));
        assert!(r.full_query);
        assert_eq!(r.input, Some(PathBuf::from("queries.log")));
    }

    #[test]
    fn parse_replay_defaults_to_stdin() {
        let cmd = parse_args(&args(&["replay", "--config=x.toml", "-"])).unwrap();
        let Command::Replay(r) = cmd else {
            panic!("expected replay");
        };
        assert_eq!(r.config, Some(PathBuf::from("x.toml")));
        assert!(!r.full_query);
        assert!(r.input.is_none());
    }

    #[test]
    fn replay_rejects_unknown_options_and_extra_inputs() {
        assert!(parse_args(&args(&["replay", "--verbose"])).is_err());
        assert!(parse_args(&args(&["replay", "a.log", "b.log"])).is_err());
        assert!(parse_args(&args(&["replay", "--config"])).is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_args(&args(&["serve"])).is_err());
    }
}
