//! # Helix uthread Demo
//!
//! Registers the calling thread as the host, creates the workload and hands
//! the CPU to the scheduler once. The run always ends through the
//! "no runnable threads" halt, reported with a non-zero exit status.

mod cli;
mod workload;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64")))]
compile_error!("the uthread demo needs native context switching (x86_64, aarch64 or riscv64)");

use anyhow::Context as _;
use clap::Parser;
use helix_scheduler_fcfs::FcfsConfig;
use helix_uthread::{NativeTransfer, Scheduler};
use std::process::ExitCode;

use crate::cli::{Cli, PolicyKind};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // -v raises the helix crates to debug, -vv to trace; RUST_LOG overrides
    let level = cli.log_level();
    env_logger::Builder::new()
        .filter_module("uthread", level)
        .filter_module("helix_uthread", level)
        .filter_module("helix_scheduler_fcfs", level)
        .filter_module("helix_scheduler_hrrn", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    let sched = build_scheduler(&cli)?;
    workload::spawn_all(&sched, &cli.workload())?;

    let summary = workload::drive(&sched)?;
    print!("{summary}");

    if summary.is_drained() {
        log::error!("no runnable threads: workload drained at t={}", summary.end_time);
    } else {
        log::error!(
            "no runnable threads: {} threads can never run (t={})",
            summary.unfinished,
            summary.end_time
        );
    }
    Ok(ExitCode::FAILURE)
}

fn build_scheduler(cli: &Cli) -> anyhow::Result<Scheduler> {
    let config = cli.config();
    let transfer = NativeTransfer::new();

    let sched = match cli.policy {
        PolicyKind::Fcfs => {
            let fcfs = if cli.no_tie_break {
                FcfsConfig::arrival_only()
            } else {
                FcfsConfig::default()
            };
            Scheduler::new(config, helix_scheduler_fcfs::create_policy_with_config(fcfs), transfer)
        }
        PolicyKind::Hrrn => {
            if cli.no_tie_break {
                log::warn!("--no-tie-break only applies to the FCFS policy");
            }
            Scheduler::new(config, helix_scheduler_hrrn::create_policy(), transfer)
        }
    };

    sched.context("invalid scheduler configuration")
}
