//! Parallel dispatcher (component I, spec.md §4.9 & §5).
//!
//! Splits `[start, stop]` into contiguous, segment-aligned sub-intervals
//! and runs an independent sieving-prime generator (G), segment driver
//! (F) and scanner (H) per worker, on a scoped `rayon` thread pool built
//! fresh for this call and joined before returning (spec.md §5:
//! "Workers are created at the start of each public sieve/count call and
//! joined before return"). Per-worker counts are summed; this is the
//! only cross-thread merge point besides the progress counter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::SieveConfig;
use crate::error::{validate_range, Result, SieveError};
use crate::presieve::PreSieve;
use crate::scanner::{scan_primes, small_prime_prelist_emitting, TupletScanner};
use crate::segment::Erat;
use crate::sieving_primes::generate_sieving_primes;

/// Seven counters: index 0 = primes, index `k-1` = k-tuplets (k = 2..=7).
pub type Counts = [u64; 7];

/// Per-call knobs that don't belong in [`SieveConfig`] because they're
/// one-shot rather than persistent (progress reporting, cancellation,
/// and the print callbacks used by `print_primes`/`print_tuplets_k`).
pub struct RunOptions<'a> {
    pub progress: Option<&'a AtomicU64>,
    pub abort: Option<&'a AtomicBool>,
    pub emit_prime: Option<&'a (dyn Fn(u64) + Sync)>,
    /// When set together with `tuplet_k`, every matched `tuplet_k`-tuplet's
    /// ascending member list is passed to this callback (spec.md §6
    /// `print_tuplets_k`).
    pub emit_tuplet: Option<&'a (dyn Fn(&[u64]) + Sync)>,
    pub tuplet_k: Option<usize>,
}

impl<'a> Default for RunOptions<'a> {
    fn default() -> Self {
        RunOptions {
            progress: None,
            abort: None,
            emit_prime: None,
            emit_tuplet: None,
            tuplet_k: None,
        }
    }
}

fn div_ceil(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

fn split_segments(total: u64, workers: u64) -> Vec<(u64, u64)> {
    let workers = workers.max(1);
    let base = total / workers;
    let rem = total % workers;
    let mut out = Vec::with_capacity(workers as usize);
    let mut from = 0u64;
    for i in 0..workers {
        let len = base + u64::from(i < rem);
        if len == 0 {
            continue;
        }
        out.push((from, from + len));
        from += len;
    }
    out
}

/// Runs the full sieve over `[start, stop]`, tiling segments across
/// `cfg.num_threads()` workers, and returns the merged counts vector.
pub fn run(cfg: &SieveConfig, start: u64, stop: u64, opts: &RunOptions) -> Result<Counts> {
    validate_range(start, stop)?;

    let mut totals = [0u64; 7];
    let mut prelist_tuplets = [0u64; 6];
    let target_k_and_emit = match (opts.tuplet_k, opts.emit_tuplet) {
        (Some(k), Some(emit)) => Some((k, emit as &dyn Fn(&[u64]))),
        _ => None,
    };
    small_prime_prelist_emitting(
        start,
        stop,
        &mut totals[0],
        &mut prelist_tuplets,
        opts.emit_prime.map(|f| f as &dyn Fn(u64)),
        target_k_and_emit,
    );
    for i in 0..6 {
        totals[i + 1] += prelist_tuplets[i];
    }

    let wheel_start = start.max(7);
    if wheel_start > stop {
        return Ok(totals);
    }

    let seg_bytes = (cfg.sieve_size_bytes() as u64).max(8);
    let aligned_low = (wheel_start / 30) * 30;
    let total_segments = div_ceil(stop - aligned_low + 1, 30 * seg_bytes).max(1);
    let num_threads = cfg.num_threads().max(1) as u64;
    let n_workers = num_threads.min(total_segments).max(1);
    let sqrt_stop = (stop as f64).sqrt() as u64 + 2;

    let chunks = split_segments(total_segments, n_workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(chunks.len().max(1))
        .build()
        .map_err(|_| SieveError::AllocationFailure {
            detail: "failed to start worker thread pool",
        })?;

    let results: Vec<Result<Counts>> = pool.install(|| {
        use rayon::prelude::*;
        chunks
            .par_iter()
            .map(|&(seg_from, seg_to)| {
                run_worker(
                    cfg,
                    aligned_low,
                    stop,
                    seg_bytes,
                    sqrt_stop,
                    seg_from,
                    seg_to,
                    start,
                    opts,
                )
            })
            .collect()
    });

    let mut first_err = None;
    for r in results {
        match r {
            Ok(c) => {
                for i in 0..7 {
                    totals[i] += c[i];
                }
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    Ok(totals)
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    cfg: &SieveConfig,
    base_low: u64,
    stop: u64,
    seg_bytes: u64,
    sqrt_stop: u64,
    seg_from: u64,
    seg_to: u64,
    start: u64,
    opts: &RunOptions,
) -> Result<Counts> {
    let presieve = PreSieve::new(cfg.presieve_limit());
    let worker_low = base_low + seg_from * 30 * seg_bytes;
    let mut erat = Erat::new(seg_bytes, worker_low, stop, sqrt_stop, presieve);
    generate_sieving_primes(sqrt_stop, |p| erat.add_sieving_prime(p));

    let mut counts = [0u64; 7];
    let mut scanner = TupletScanner::new();
    let n_segments = seg_to - seg_from;

    for seg_idx in 0..n_segments {
        if let Some(abort) = opts.abort {
            if abort.load(Ordering::Relaxed) {
                break;
            }
        }

        let (buf, low, high_excl) = erat.sieve_segment(seg_idx, start);
        let lo_bound = start.max(low);
        let hi_bound = stop.min(high_excl.saturating_sub(1));

        scan_primes(buf, low, |p| {
            if p < lo_bound || p > hi_bound {
                return;
            }
            counts[0] += 1;
            let mut tup = [0u64; 6];
            match (opts.tuplet_k, opts.emit_tuplet) {
                (Some(k), Some(emit)) => scanner.push_emitting(p, &mut tup, k, emit),
                _ => scanner.push(p, &mut tup),
            }
            for i in 0..6 {
                counts[i + 1] += tup[i];
            }
            if let Some(emit) = opts.emit_prime {
                emit(p);
            }
        });

        if let Some(progress) = opts.progress {
            progress.fetch_add(1, Ordering::Relaxed);
        }
    }

    let mut tup = [0u64; 6];
    match (opts.tuplet_k, opts.emit_tuplet) {
        (Some(k), Some(emit)) => scanner.finish_emitting(&mut tup, k, emit),
        _ => scanner.finish(&mut tup),
    }
    for i in 0..6 {
        counts[i + 1] += tup[i];
    }

    Ok(counts)
}

/// Sieves `[lo, hi]` single-threaded and returns the ascending list of
/// primes found, stopping early once `cap` primes have been collected (if
/// given). Shared by the nth-prime search (J) and the forward/backward
/// iterator (K), both of which need a strictly ordered prime sequence
/// rather than `run`'s per-worker-only ordering (spec.md §5).
pub(crate) fn collect_range(cfg: &SieveConfig, lo: u64, hi: u64, cap: Option<usize>) -> Result<Vec<u64>> {
    validate_range(lo, hi)?;
    let mut out = Vec::new();

    for &p in &[2u64, 3, 5] {
        if lo <= p && p <= hi {
            out.push(p);
        }
    }

    let wheel_lo = lo.max(7);
    if wheel_lo > hi {
        return Ok(out);
    }

    let seg_bytes = (cfg.sieve_size_bytes() as u64).max(8);
    let aligned_low = (wheel_lo / 30) * 30;
    let sqrt_hi = (hi as f64).sqrt() as u64 + 2;
    let presieve = PreSieve::new(cfg.presieve_limit());
    let mut erat = Erat::new(seg_bytes, aligned_low, hi, sqrt_hi, presieve);
    generate_sieving_primes(sqrt_hi, |p| erat.add_sieving_prime(p));

    let mut seg_idx = 0u64;
    loop {
        let (buf, low, high_excl) = erat.sieve_segment(seg_idx, wheel_lo);
        let lo_bound = wheel_lo.max(low);
        let hi_bound = hi.min(high_excl.saturating_sub(1));
        let mut reached_cap = false;

        scan_primes(buf, low, |p| {
            if p < lo_bound || p > hi_bound || reached_cap {
                return;
            }
            out.push(p);
            if let Some(c) = cap {
                if out.len() >= c {
                    reached_cap = true;
                }
            }
        });

        if reached_cap || high_excl > hi {
            break;
        }
        seg_idx += 1;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_segments_covers_the_whole_range_without_overlap() {
        let chunks = split_segments(17, 4);
        let mut covered = 0u64;
        let mut prev_end = 0u64;
        for (from, to) in &chunks {
            assert_eq!(*from, prev_end);
            assert!(to > from);
            covered += to - from;
            prev_end = *to;
        }
        assert_eq!(covered, 17);
    }

    #[test]
    fn split_segments_never_produces_more_chunks_than_segments() {
        let chunks = split_segments(3, 16);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn count_primes_small_known_range_single_threaded() {
        let mut cfg = SieveConfig::default();
        cfg.set_num_threads(1).unwrap();
        let counts = run(&cfg, 0, 100, &RunOptions::default()).unwrap();
        // pi(100) = 25
        assert_eq!(counts[0], 25);
    }

    #[test]
    fn count_primes_deterministic_across_thread_counts() {
        let mut single = SieveConfig::default();
        single.set_num_threads(1).unwrap();
        let c1 = run(&single, 0, 50_000, &RunOptions::default()).unwrap();

        let mut multi = SieveConfig::default();
        multi.set_num_threads(8).unwrap();
        let c2 = run(&multi, 0, 50_000, &RunOptions::default()).unwrap();

        assert_eq!(c1[0], c2[0]);
    }

    #[test]
    fn partition_equivalence_holds() {
        let cfg = SieveConfig::default();
        let whole = run(&cfg, 0, 10_000, &RunOptions::default()).unwrap();
        let left = run(&cfg, 0, 5_000, &RunOptions::default()).unwrap();
        let right = run(&cfg, 5_001, 10_000, &RunOptions::default()).unwrap();
        assert_eq!(whole[0], left[0] + right[0]);
    }
}
