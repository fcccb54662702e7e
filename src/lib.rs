//! Segmented, wheel-factorized sieve of Eratosthenes.
//!
//! Counts and prints primes and dense prime k-tuplets over arbitrary
//! `[start, stop]` ranges of `u64`, finds the n-th prime relative to a
//! reference point, and offers a restartable forward/backward iterator.
//! See the module-level docs on [`dispatch`], [`segment`] and [`scanner`]
//! for the sieve's internal pipeline.

pub mod buckets;
pub mod config;
pub mod cpuinfo;
pub mod crossers;
pub mod dispatch;
pub mod error;
pub mod iter;
pub mod nth_prime;
pub mod presieve;
pub mod scanner;
pub mod segment;
pub mod sieving_primes;
pub mod wheel;

use std::sync::atomic::AtomicU64;

use dispatch::RunOptions;

pub use config::SieveConfig;
pub use error::{Result, SieveError};
pub use iter::PrimeCursor;

/// Number of primes in `[start, stop]` (spec.md §6, §8 property 1).
pub fn count_primes(cfg: &SieveConfig, start: u64, stop: u64) -> Result<u64> {
    let counts = dispatch::run(cfg, start, stop, &RunOptions::default())?;
    Ok(counts[0])
}

/// Number of k-tuplets fully contained in `[start, stop]`, `k` in `2..=7`
/// (spec.md §6, §8 property 2). Forces single-threaded dispatch, like
/// [`print_tuplets_k`]: a worker only ever sees the primes in its own
/// contiguous shard, so a tuplet whose members straddle a shard boundary
/// would otherwise go uncounted by every worker.
pub fn count_tuplets_k(cfg: &SieveConfig, start: u64, stop: u64, k: usize) -> Result<u64> {
    let mut serial = *cfg;
    serial.set_num_threads(1)?;
    let counts = dispatch::run(&serial, start, stop, &RunOptions::default())?;
    Ok(counts.get(k - 1).copied().unwrap_or(0))
}

/// Writes one prime per line to stdout, in strictly ascending order
/// (spec.md §6 "Print format"). Forces single-threaded dispatch so the
/// emitted lines are globally ordered rather than merely ordered within
/// each worker's own shard (spec.md §5, "Ordering").
pub fn print_primes(cfg: &SieveConfig, start: u64, stop: u64) -> Result<()> {
    let mut serial = *cfg;
    serial.set_num_threads(1)?;
    let emit = |p: u64| println!("{p}");
    let opts = RunOptions {
        emit_prime: Some(&emit),
        ..RunOptions::default()
    };
    dispatch::run(&serial, start, stop, &opts)?;
    Ok(())
}

/// Writes one `(p1, p2, …, pk)` per line to stdout for every k-tuplet
/// fully contained in `[start, stop]`, in strictly ascending order of
/// anchor (spec.md §6 "Print format"). Also forces single-threaded
/// dispatch, for the same reason as [`print_primes`].
pub fn print_tuplets_k(cfg: &SieveConfig, start: u64, stop: u64, k: usize) -> Result<()> {
    let mut serial = *cfg;
    serial.set_num_threads(1)?;
    let emit = |members: &[u64]| {
        let joined: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        println!("({})", joined.join(", "));
    };
    let opts = RunOptions {
        emit_tuplet: Some(&emit),
        tuplet_k: Some(k),
        ..RunOptions::default()
    };
    dispatch::run(&serial, start, stop, &opts)?;
    Ok(())
}

/// The n-th prime relative to `start` (spec.md §4.10, §6).
pub fn nth_prime(cfg: &SieveConfig, n: i64, start: u64) -> Result<u64> {
    nth_prime::nth_prime(cfg, n, start)
}

/// Like [`count_primes`], but reports progress (segments completed) via
/// `progress` and honors `abort` at segment boundaries (spec.md §5
/// "Cancellation").
pub fn count_primes_with_progress(
    cfg: &SieveConfig,
    start: u64,
    stop: u64,
    progress: &AtomicU64,
    abort: Option<&std::sync::atomic::AtomicBool>,
) -> Result<u64> {
    let opts = RunOptions {
        progress: Some(progress),
        abort,
        ..RunOptions::default()
    };
    let counts = dispatch::run(cfg, start, stop, &opts)?;
    Ok(counts[0])
}
