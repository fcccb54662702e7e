//! Forward/backward restartable prime iterator (component K, spec.md
//! §4.11).
//!
//! Holds a contiguous buffer of primes already generated plus an absolute
//! position into the conceptual infinite prime sequence. `base` is the
//! absolute position of `buf[0]`, so `pos - base` is always the buffer
//! index of the "current" prime regardless of how many times the window
//! has been refilled from either end — this is what makes an equal number
//! of `next_prime`/`prev_prime` calls round-trip exactly (spec.md §8
//! property 5) rather than merely by accident of refill timing.

use crate::config::SieveConfig;
use crate::dispatch::collect_range;
use crate::error::Result;

const INITIAL_WINDOW: u64 = 1024;
const GROWTH_FACTOR: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Forward,
    Backward,
}

/// A single-threaded, restartable cursor over the ascending prime
/// sequence. Not `Sync`; each thread that wants its own iteration state
/// constructs its own `PrimeCursor`.
pub struct PrimeCursor<'a> {
    cfg: &'a SieveConfig,
    state: State,
    buf: Vec<u64>,
    /// Absolute index of `buf[0]` in the prime sequence; `pos` is the
    /// absolute index of the cursor's current prime.
    base: i64,
    pos: i64,
    window: u64,
    anchor: u64,
}

impl<'a> PrimeCursor<'a> {
    pub fn new(cfg: &'a SieveConfig) -> PrimeCursor<'a> {
        PrimeCursor {
            cfg,
            state: State::Uninitialized,
            buf: Vec::new(),
            base: 0,
            pos: -1,
            window: INITIAL_WINDOW,
            anchor: 0,
        }
    }

    /// Resets the cursor to a fresh window anchored at `x` (spec.md §4.11:
    /// "`skipto(x)` resets state to a fresh window around x").
    pub fn skipto(&mut self, x: u64) -> Result<()> {
        self.window = INITIAL_WINDOW;
        self.anchor = x;
        let hi = x.saturating_add(self.window * 30);
        self.buf = collect_range(self.cfg, x, hi, None)?;
        self.base = 0;
        self.pos = -1;
        self.state = State::Forward;
        Ok(())
    }

    fn ensure_initialized(&mut self) -> Result<()> {
        if self.state == State::Uninitialized {
            self.skipto(0)?;
        }
        Ok(())
    }

    fn grow_window(&mut self, position: u64) {
        let cap = (position as f64).sqrt() as u64 + 1;
        self.window = (self.window * GROWTH_FACTOR).min(cap.max(INITIAL_WINDOW));
    }

    /// Returns the next prime in ascending order, refilling the buffer
    /// forward from the last known prime when exhausted.
    pub fn next_prime(&mut self) -> Result<u64> {
        self.ensure_initialized()?;
        self.state = State::Forward;

        let idx = self.pos + 1 - self.base;
        if idx >= 0 && (idx as usize) < self.buf.len() {
            self.pos += 1;
            return Ok(self.buf[idx as usize]);
        }

        let last = *self.buf.last().unwrap_or(&self.anchor);
        self.grow_window(last);
        let lo = last.saturating_add(1);
        let hi = lo.saturating_add(self.window * 30);
        let fresh = collect_range(self.cfg, lo, hi, None)?;

        self.base += self.buf.len() as i64;
        self.buf = fresh;
        self.pos += 1;
        let idx = (self.pos - self.base) as usize;
        Ok(self.buf[idx])
    }

    /// Returns the previous prime in ascending order, refilling the buffer
    /// backward from the first known prime when exhausted.
    pub fn prev_prime(&mut self) -> Result<u64> {
        self.ensure_initialized()?;
        self.state = State::Backward;

        let idx = self.pos - 1 - self.base;
        if idx >= 0 {
            self.pos -= 1;
            return Ok(self.buf[idx as usize]);
        }

        let first = *self.buf.first().unwrap_or(&self.anchor);
        self.grow_window(first);
        let hi = first.saturating_sub(1);
        let lo = hi.saturating_sub(self.window * 30);
        let fresh = collect_range(self.cfg, lo, hi, None)?;

        self.pos -= 1;
        self.base -= fresh.len() as i64;
        self.buf = fresh;
        let idx = (self.pos - self.base) as usize;
        Ok(self.buf[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_prime_yields_ascending_small_primes_from_zero() {
        let cfg = SieveConfig::default();
        let mut cur = PrimeCursor::new(&cfg);
        let got: Vec<u64> = (0..6).map(|_| cur.next_prime().unwrap()).collect();
        assert_eq!(got, vec![2, 3, 5, 7, 11, 13]);
    }

    #[test]
    fn round_trip_returns_to_the_same_prime() {
        let cfg = SieveConfig::default();
        let mut cur = PrimeCursor::new(&cfg);
        cur.skipto(1_000).unwrap();
        cur.next_prime().unwrap();

        let forward: Vec<u64> = (0..20).map(|_| cur.next_prime().unwrap()).collect();
        let backward: Vec<u64> = (0..20).map(|_| cur.prev_prime().unwrap()).collect();

        // Each `prev_prime` walks back one position, so after N forward and
        // N backward steps the cursor sits exactly where it started: the
        // 20 backward values are the 19 primes strictly between the start
        // and the final forward value, plus the start itself, descending.
        let mut expected_backward = forward[..19].to_vec();
        expected_backward.reverse();
        assert_eq!(backward[..19], expected_backward[..]);

        let resumed = cur.next_prime().unwrap();
        assert_eq!(resumed, forward[0]);
    }

    #[test]
    fn skipto_restarts_state_around_the_given_value() {
        let cfg = SieveConfig::default();
        let mut cur = PrimeCursor::new(&cfg);
        cur.skipto(100).unwrap();
        assert_eq!(cur.next_prime().unwrap(), 101);
    }

    #[test]
    fn forward_refill_crosses_the_initial_window_boundary() {
        let cfg = SieveConfig::default();
        let mut cur = PrimeCursor::new(&cfg);
        cur.skipto(0).unwrap();
        let mut last = 0u64;
        for _ in 0..5000 {
            last = cur.next_prime().unwrap();
        }
        assert!(last > 30_000);
    }
}
