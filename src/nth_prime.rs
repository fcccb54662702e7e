//! Nth-prime search (component J, spec.md §4.10).
//!
//! Jumps straight to an asymptotic estimate of the target prime's location,
//! then sieves just that neighborhood with the dispatcher's single-threaded
//! collection path (I/F/H) and walks to the exact answer, widening and
//! retrying if the first estimate undershoots.

use crate::config::SieveConfig;
use crate::dispatch::collect_range;
use crate::error::{Result, SieveError, MAX_STOP};

/// Safety factor applied to the `√n · 20` margin suggested by spec.md
/// §4.10. The asymptotic `x/ln(x)` estimate for `pi(x)` is only accurate to
/// within a few percent for moderate `x`, so a bare `√n · 20` window can
/// undershoot for small `n`; `MARGIN_SAFETY` widens it enough that the
/// retry loop below almost never needs a second pass in practice, while
/// the loop itself is still the correctness backstop (open question in
/// spec.md §9: "document the chosen safety factor as a runtime constant").
const MARGIN_SAFETY: f64 = 3.0;

/// Caps retry widening so a pathological estimate can't spin forever.
const MAX_ATTEMPTS: u32 = 32;

fn margin_for(n: i64) -> u64 {
    let an = n.unsigned_abs().max(1);
    ((an as f64).sqrt() * 20.0 * MARGIN_SAFETY) as u64 + 16
}

/// Asymptotic estimate of the position `n` primes away from `start`
/// (spec.md §4.10: `p_n ≈ start + n·ln(start + |n|·ln(start + …))`,
/// fixed-point refined a few rounds).
fn estimate(start: u64, n: i64) -> f64 {
    let x0 = (start as f64).max(2.0);
    let an = n.unsigned_abs() as f64;
    let mut inner = x0;
    for _ in 0..4 {
        inner = (x0 + an * inner.max(2.0).ln()).max(2.0);
    }
    x0 + n as f64 * inner.max(2.0).ln()
}

/// Finds the prime `n` positions away from `start`: `n > 0` walks forward
/// (the 1st prime `>= start` onward), `n < 0` walks backward, `n == 0`
/// returns the first prime `>= start`.
pub fn nth_prime(cfg: &SieveConfig, n: i64, start: u64) -> Result<u64> {
    if n == 0 {
        let found = collect_range(cfg, start, start.saturating_add(1_000_000), Some(1))?;
        return found
            .first()
            .copied()
            .ok_or(SieveError::NthPrimeOutOfRange { n, guess: start });
    }

    let forward = n > 0;
    let mut attempt = 0u32;
    let mut margin = margin_for(n);

    loop {
        let est = estimate(start, n);
        let (lo, hi) = if forward {
            let guess = (est + margin as f64) as u64;
            if guess > MAX_STOP {
                return Err(SieveError::NthPrimeOutOfRange { n, guess });
            }
            (start, guess)
        } else {
            let guess = (est - margin as f64).max(0.0) as u64;
            (guess, start)
        };

        let primes = collect_range(cfg, lo, hi, None)?;
        let target_count = n.unsigned_abs() as usize;

        if forward {
            if primes.len() > target_count {
                return Ok(primes[target_count]);
            }
        } else if primes.len() >= target_count + 1 {
            return Ok(primes[primes.len() - 1 - target_count]);
        }

        attempt += 1;
        if attempt >= MAX_ATTEMPTS {
            return Err(SieveError::NthPrimeOutOfRange {
                n,
                guess: if forward { hi } else { lo },
            });
        }
        margin *= 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_prime_zero_returns_first_prime_at_or_after_start() {
        let cfg = SieveConfig::default();
        assert_eq!(nth_prime(&cfg, 0, 10).unwrap(), 11);
        assert_eq!(nth_prime(&cfg, 0, 11).unwrap(), 11);
    }

    #[test]
    fn nth_prime_forward_from_two_reaches_known_small_primes() {
        let cfg = SieveConfig::default();
        // primes: 2,3,5,7,11,13,17,19,23,29 -> nth_prime(4, 2) should be 11.
        assert_eq!(nth_prime(&cfg, 4, 2).unwrap(), 11);
    }

    #[test]
    fn nth_prime_forward_then_backward_is_consistent() {
        let cfg = SieveConfig::default();
        let p = nth_prime(&cfg, 1, 101).unwrap();
        assert_eq!(p, 103);
        let back = nth_prime(&cfg, -1, p).unwrap();
        assert_eq!(back, 101);
    }

    #[test]
    fn nth_prime_rejects_guess_beyond_max_stop() {
        let cfg = SieveConfig::default();
        let err = nth_prime(&cfg, i64::MAX, MAX_STOP - 1);
        assert!(err.is_err());
    }
}
