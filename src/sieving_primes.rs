//! Sieving-prime generator (component G, spec.md §4.7): produces every
//! prime `p <= limit` in ascending order, for feeding to a driver's
//! crosser classifier. Implemented as the same segmented, wheel-sieved
//! shape as the main driver, but with its own small, bucket-less window
//! — seeded by trial division up to `sqrt(limit)` on a small table, per
//! spec.md's "16-bit table" — so memory stays bounded even when `limit`
//! itself is large (up to `2^32`, i.e. `sqrt(stop)` for `stop` near the
//! domain's ceiling).

use crate::crossers::SievingPrime;
use crate::wheel::{locate, WHEEL30_RESIDUES};

/// Window size for G's own internal sieve, in bytes (64 KiB ~ 2M
/// integers per window — large enough to amortize the per-window
/// overhead, small enough to bound memory for any `limit`).
const GEN_SEG_BYTES: u64 = 1 << 16;

/// Primes `<= limit` via direct trial division (spec.md: "straightforward
/// trial division on a 16-bit table"); only ever called with
/// `limit <= 65_535`.
fn trial_division_primes(limit: u32) -> Vec<u64> {
    let mut out = vec![2, 3, 5];
    let mut n = 7u64;
    while n <= limit as u64 {
        if out.iter().take_while(|&&p| p * p <= n).all(|&p| n % p != 0) {
            out.push(n);
        }
        n += 2;
    }
    out
}

/// Generates every prime `p` with `7 <= p <= limit` in ascending order,
/// calling `on_prime(p as u32)` for each one. Primes 2, 3 and 5 are never
/// produced — the wheel never represents them, and spec.md §4.8 assigns
/// their handling to the scanner's explicit small-prime prelist.
pub fn generate_sieving_primes<F: FnMut(u32)>(limit: u64, mut on_prime: F) {
    if limit < 7 {
        return;
    }

    let sqrt_limit = ((limit as f64).sqrt() as u64) + 1;
    let seeds = trial_division_primes(sqrt_limit.min(65_535) as u32);

    let mut low = 0u64;
    let mut carried: Vec<SievingPrime> = seeds
        .iter()
        .filter(|&&p| p > 5)
        .map(|&p| SievingPrime::new(p as u32, p * p))
        .collect();

    'windows: while low <= limit {
        let window_high = low + 30 * GEN_SEG_BYTES;
        let mut buf = vec![0xFFu8; GEN_SEG_BYTES as usize];

        for sp in &mut carried {
            while sp.next_multiple < window_high {
                if let Some((byte, bit)) = locate(sp.next_multiple) {
                    let idx = (byte - low / 30) as usize;
                    if idx < buf.len() {
                        buf[idx] &= !(1 << bit);
                    }
                }
                sp.next_multiple += sp.wheel.next_diff();
            }
        }

        for (byte_idx, &b) in buf.iter().enumerate() {
            if b == 0 {
                continue;
            }
            let block_low = low + 30 * byte_idx as u64;
            if block_low > limit {
                break 'windows;
            }
            for (bit, &r) in WHEEL30_RESIDUES.iter().enumerate() {
                if b & (1 << bit) == 0 {
                    continue;
                }
                let n = block_low + r;
                if n > limit {
                    continue;
                }
                on_prime(n as u32);
                // Primes already in `seeds` (<= sqrt_limit) are already
                // carried from the start; only register genuinely new
                // ones to avoid scheduling the same prime twice.
                if n > sqrt_limit && n.saturating_mul(n) <= limit {
                    carried.push(SievingPrime::new(n as u32, n * n));
                }
            }
        }

        low = window_high;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2u64;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    #[test]
    fn matches_trial_division_up_to_a_few_thousand() {
        let mut generated = Vec::new();
        generate_sieving_primes(5000, |p| generated.push(p as u64));

        let expected: Vec<u64> = (7..=5000).filter(|&n| is_prime(n)).collect();
        assert_eq!(generated, expected);
    }

    #[test]
    fn ascending_and_no_duplicates() {
        let mut generated = Vec::new();
        generate_sieving_primes(20_000, |p| generated.push(p as u64));
        for w in generated.windows(2) {
            assert!(w[0] < w[1], "not strictly ascending: {} then {}", w[0], w[1]);
        }
    }

    #[test]
    fn empty_below_seven() {
        let mut generated = Vec::new();
        generate_sieving_primes(6, |p| generated.push(p));
        assert!(generated.is_empty());
    }
}
