mod cli;

use std::sync::atomic::AtomicU64;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, Command};
use primecore::{PrimeCursor, SieveConfig};

fn main() {
    let cli = Cli::parse();

    let mut cfg = SieveConfig::default();
    if let Some(kib) = cli.sieve_size_kib {
        if let Err(e) = cfg.set_sieve_size(kib) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
    if let Some(threads) = cli.threads {
        if let Err(e) = cfg.set_num_threads(threads) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let result = match cli.command {
        Command::Count { tuplet_k } => run_count(&cfg, cli.start, cli.stop, tuplet_k),
        Command::Print { tuplet_k } => run_print(&cfg, cli.start, cli.stop, tuplet_k),
        Command::NthPrime { n } => run_nth_prime(&cfg, n, cli.start),
        Command::Iterate { count } => run_iterate(&cfg, cli.start, count),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn progress_bar(start: u64, stop: u64) -> ProgressBar {
    let bar = ProgressBar::new(stop.saturating_sub(start).max(1));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] segments {pos} ({eta})")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn run_count(cfg: &SieveConfig, start: u64, stop: u64, tuplet_k: Option<usize>) -> primecore::Result<()> {
    let progress = AtomicU64::new(0);
    let bar = progress_bar(start, stop);

    let count = match tuplet_k {
        Some(k) => {
            // Single-threaded, like `print_tuplets_k`: a tuplet whose
            // members straddle a parallel worker's shard boundary would
            // otherwise never be seen whole by any one worker.
            let mut serial = *cfg;
            serial.set_num_threads(1)?;
            let opts = primecore::dispatch::RunOptions {
                progress: Some(&progress),
                ..primecore::dispatch::RunOptions::default()
            };
            let counts = primecore::dispatch::run(&serial, start, stop, &opts)?;
            counts.get(k - 1).copied().unwrap_or(0)
        }
        None => primecore::count_primes_with_progress(cfg, start, stop, &progress, None)?,
    };

    bar.finish_and_clear();
    println!("{count}");
    Ok(())
}

fn run_print(cfg: &SieveConfig, start: u64, stop: u64, tuplet_k: Option<usize>) -> primecore::Result<()> {
    match tuplet_k {
        Some(k) => primecore::print_tuplets_k(cfg, start, stop, k),
        None => primecore::print_primes(cfg, start, stop),
    }
}

fn run_nth_prime(cfg: &SieveConfig, n: i64, start: u64) -> primecore::Result<()> {
    let p = primecore::nth_prime(cfg, n, start)?;
    println!("{p}");
    Ok(())
}

fn run_iterate(cfg: &SieveConfig, start: u64, count: i64) -> primecore::Result<()> {
    let mut cursor = PrimeCursor::new(cfg);
    cursor.skipto(start)?;

    if count >= 0 {
        for _ in 0..count {
            println!("{}", cursor.next_prime()?);
        }
    } else {
        for _ in 0..count.unsigned_abs() {
            println!("{}", cursor.prev_prime()?);
        }
    }
    Ok(())
}
