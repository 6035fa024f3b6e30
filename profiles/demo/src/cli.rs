//! # Command Line

use clap::{ArgAction, Parser, ValueEnum};
use core::time::Duration;
use helix_uthread::{SchedulerConfig, ThreadSpec};

use crate::workload;

/// Selection policy to run the workload under
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// First come first served, shortest run time among equal ids
    Fcfs,
    /// Highest response ratio next
    Hrrn,
}

/// uthread - run a workload on cooperative user-level threads
#[derive(Debug, Parser)]
#[command(name = "uthread", version, about, long_about = None)]
pub struct Cli {
    /// Selection policy.
    #[arg(short, long, value_enum, default_value_t = PolicyKind::Fcfs)]
    pub policy: PolicyKind,

    /// Thread to create, as ID:ENTER:RUN. Repeatable; defaults to the built-in workload of the policy.
    #[arg(short, long = "thread", value_name = "ID:ENTER:RUN", value_parser = parse_thread)]
    pub threads: Vec<ThreadSpec>,

    /// Pool slots, the calling thread included.
    #[arg(long, default_value_t = SchedulerConfig::DEFAULT_MAX_THREADS)]
    pub max_threads: usize,

    /// Stack size of each thread, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = SchedulerConfig::DEFAULT_STACK_SIZE)]
    pub stack_size: usize,

    /// Real time slept per simulated tick of work, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub tick_delay_ms: u64,

    /// FCFS only: serve equal ids in slot order instead of shortest run first.
    #[arg(long)]
    pub no_tie_break: bool,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Scheduler configuration from the flags
    pub fn config(&self) -> SchedulerConfig {
        SchedulerConfig::new()
            .with_max_threads(self.max_threads)
            .with_stack_size(self.stack_size)
            .with_tick_delay(Duration::from_millis(self.tick_delay_ms))
    }

    /// Threads to create, in creation order
    pub fn workload(&self) -> Vec<ThreadSpec> {
        if !self.threads.is_empty() {
            return self.threads.clone();
        }
        match self.policy {
            PolicyKind::Fcfs => workload::FCFS_WORKLOAD.to_vec(),
            PolicyKind::Hrrn => workload::HRRN_WORKLOAD.to_vec(),
        }
    }

    /// Log level for the helix crates
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Parse `ID:ENTER:RUN`
fn parse_thread(raw: &str) -> Result<ThreadSpec, String> {
    let fields: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [id, enter, run] = fields.as_slice() else {
        return Err(format!("expected ID:ENTER:RUN, got `{raw}`"));
    };

    let id = id.parse::<u32>().map_err(|e| format!("bad thread id `{id}`: {e}"))?;
    let enter = enter.parse::<u64>().map_err(|e| format!("bad enter time `{enter}`: {e}"))?;
    let run = run.parse::<u64>().map_err(|e| format!("bad run time `{run}`: {e}"))?;
    Ok(ThreadSpec::new(id, enter, run))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thread() {
        assert_eq!(parse_thread("3:5:15"), Ok(ThreadSpec::new(3, 5, 15)));
        assert_eq!(parse_thread(" 1 : 0 : 20 "), Ok(ThreadSpec::new(1, 0, 20)));
        assert!(parse_thread("3:5").is_err());
        assert!(parse_thread("3:5:15:1").is_err());
        assert!(parse_thread("a:5:15").is_err());
        assert!(parse_thread("3:-1:15").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["uthread"]).unwrap();
        assert_eq!(cli.policy, PolicyKind::Fcfs);
        assert_eq!(cli.config(), SchedulerConfig::new());
        assert_eq!(cli.workload(), workload::FCFS_WORKLOAD.to_vec());
        assert_eq!(cli.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_explicit_threads_replace_workload() {
        let cli = Cli::try_parse_from([
            "uthread", "--policy", "hrrn", "-t", "7:0:3", "--thread", "8:2:4", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.policy, PolicyKind::Hrrn);
        assert_eq!(cli.workload(), vec![ThreadSpec::new(7, 0, 3), ThreadSpec::new(8, 2, 4)]);
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_config_flags() {
        let cli = Cli::try_parse_from([
            "uthread", "--max-threads", "3", "--stack-size", "32768", "--tick-delay-ms", "5",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.max_threads, 3);
        assert_eq!(config.stack_size, 32768);
        assert_eq!(config.tick_delay, Duration::from_millis(5));
    }
}
