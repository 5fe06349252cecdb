// Thu Jan 15 2026 - Alex

use super::args::{Args, Command, ConfigArgs, DemoArgs};
use super::demos;
use crate::config::SchedulerConfig;
use crate::engine::{Scheduler, TaskStatus};
use crate::utils::logging::LoggingUtils;
use crate::utils::{format_duration, measure_time, pluralize};
use anyhow::Context as _;
use colored::Colorize;

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, args: Args) -> anyhow::Result<()> {
        self.setup_logging(&args);

        if args.no_color {
            colored::control::set_override(false);
        }

        let config = match &args.config {
            Some(path) => SchedulerConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SchedulerConfig::default(),
        };

        match args.command {
            Command::Demo(demo_args) => self.handle_demo(demo_args, config),
            Command::Config(config_args) => self.handle_config(config_args, config),
        }
    }

    fn setup_logging(&self, args: &Args) {
        let level = if args.verbose > 0 {
            LoggingUtils::level_from_verbosity(args.verbose)
        } else {
            LoggingUtils::level_from_str(&args.log_level)
        };
        LoggingUtils::init_logger(level);
    }

    fn handle_demo(&self, args: DemoArgs, config: SchedulerConfig) -> anyhow::Result<()> {
        let config = match args.max_live_tasks {
            Some(max) => config.with_max_live_tasks(Some(max)),
            None => config,
        };
        config.validate()?;

        println!("{} Running {} scenario", "[*]".blue(), args.scenario.to_string().bold());

        let mut scheduler = Scheduler::new(config);
        let root = demos::build(args.scenario, &mut scheduler)?;
        let (turns, elapsed) = measure_time(|| scheduler.run());
        let turns = turns?;

        println!(
            "{} Dispatched {} in {}",
            "[*]".blue(),
            pluralize(turns, "step", "steps"),
            format_duration(elapsed)
        );

        let snapshots = scheduler.snapshots();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        } else {
            for snapshot in &snapshots {
                let marker = match snapshot.status {
                    TaskStatus::Success => "[+]".green(),
                    TaskStatus::Failure => "[-]".red(),
                    _ => "[~]".yellow(),
                };
                println!("  {} {}", marker, snapshot);
            }
        }

        match scheduler.status(root) {
            Some(TaskStatus::Success) => {
                let result = scheduler.last_result(root).cloned().unwrap_or_default();
                println!("{} {} finished: {}", "[+]".green(), root, result);
                Ok(())
            }
            Some(TaskStatus::Failure) => {
                let reason = scheduler
                    .last_error(root)
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown fault".to_string());
                anyhow::bail!("task {} failed: {}", root, reason)
            }
            other => anyhow::bail!(
                "task {} did not finish (status {})",
                root,
                other.map(|s| s.name()).unwrap_or("unknown")
            ),
        }
    }

    fn handle_config(&self, args: ConfigArgs, config: SchedulerConfig) -> anyhow::Result<()> {
        config.validate()?;

        match args.output {
            Some(path) => {
                config
                    .save(&path)
                    .with_context(|| format!("Failed to write config to {}", path.display()))?;
                println!("{} Config written to {}", "[+]".green(), path.display());
            }
            None => println!("{}", config.to_json()?),
        }

        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
