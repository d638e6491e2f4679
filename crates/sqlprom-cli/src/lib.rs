mod cli;
mod config;
mod normalize_cmd;
mod replay;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Normalize(args) => normalize_cmd::run(args),
        cli::Command::Replay(args) => replay::run(args),
    }
}
