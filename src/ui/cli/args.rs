// Thu Jan 15 2026 - Alex

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskline")]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Single-threaded cooperative task scheduler", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Raises the log level once per flag; overrides --log-level.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Scheduler configuration (JSON).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one of the built-in scenarios against a real clock.
    Demo(DemoArgs),
    /// Print the effective configuration, or write it to a file.
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct DemoArgs {
    #[arg(value_enum)]
    pub scenario: Scenario,

    #[arg(long)]
    pub max_live_tasks: Option<usize>,

    /// Dump the final task snapshots as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Sequence,
    FanOut,
    FailFast,
    Loop,
    Delay,
    Trigger,
}

impl Scenario {
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Sequence => "sequence",
            Scenario::FanOut => "fan-out",
            Scenario::FailFast => "fail-fast",
            Scenario::Loop => "loop",
            Scenario::Delay => "delay",
            Scenario::Trigger => "trigger",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_args() {
        let args = Args::parse_from(["taskline", "-vv", "demo", "fan-out", "--max-live-tasks", "8"]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Demo(demo) => {
                assert_eq!(demo.scenario, Scenario::FanOut);
                assert_eq!(demo.max_live_tasks, Some(8));
                assert!(!demo.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["taskline", "config", "--no-color", "--log-level", "debug"]);
        assert!(args.no_color);
        assert_eq!(args.log_level, "debug");
        assert!(matches!(args.command, Command::Config(ConfigArgs { output: None })));
    }
}
