//! Library-level run configuration (spec.md §6).
//!
//! `SieveConfig` is the explicit value threaded through every public call,
//! replacing the pair of mutable globals implied by the original's
//! process-wide state (spec.md §9). A `OnceLock`-backed default instance is
//! kept behind `Mutex` so the free-function accessors below can offer the
//! same process-wide-default convenience without hiding the value from
//! callers who want their own `SieveConfig`.

use std::sync::{Mutex, OnceLock};

use crate::cpuinfo::CpuInfo;
use crate::error::{Result, SieveError};
use crate::presieve::DEFAULT_LIMIT;

const MIN_SIEVE_KIB: i32 = 8;
const MAX_SIEVE_KIB: i32 = 4096;
const MIN_REQUEST_KIB: i32 = 1;
const MAX_REQUEST_KIB: i32 = 8192;

fn round_down_pow2(n: i32) -> i32 {
    if n <= 1 {
        return 1;
    }
    let mut p = 1i32;
    while p * 2 <= n {
        p *= 2;
    }
    p
}

fn clamp_and_round(kib: i32) -> i32 {
    round_down_pow2(kib.clamp(MIN_SIEVE_KIB, MAX_SIEVE_KIB))
}

/// Per-run engine configuration: segment size, thread count, and the
/// pre-sieve limit. Clamping follows spec.md §6 exactly; construction never
/// fails, only `set_*` calls can report `SieveError`.
#[derive(Debug, Clone, Copy)]
pub struct SieveConfig {
    sieve_size_kib: i32,
    num_threads: i32,
    presieve_limit: u32,
    max_hw_threads: i32,
}

impl Default for SieveConfig {
    fn default() -> Self {
        let cpu = CpuInfo::probe();
        let max_hw_threads = std::thread::available_parallelism()
            .map(|n| n.get() as i32)
            .unwrap_or(1)
            .max(1);
        let kib = (cpu.preferred_cache_bytes() / 1024).max(1) as i32;
        SieveConfig {
            sieve_size_kib: clamp_and_round(kib),
            num_threads: max_hw_threads,
            presieve_limit: DEFAULT_LIMIT,
            max_hw_threads,
        }
    }
}

impl SieveConfig {
    /// Segment size in bytes (`sieve_size_kib * 1024`).
    pub fn sieve_size_bytes(&self) -> usize {
        self.sieve_size_kib as usize * 1024
    }

    pub fn sieve_size_kib(&self) -> i32 {
        self.sieve_size_kib
    }

    pub fn num_threads(&self) -> i32 {
        self.num_threads
    }

    pub fn presieve_limit(&self) -> u32 {
        self.presieve_limit
    }

    /// Sets the segment size. Rejects anything outside `[1, 8192]` KiB
    /// before rounding; within that range the value is clamped to `[8,
    /// 4096]` and rounded down to a power of two (spec.md §6,
    /// `InvalidSieveSize`: "non-power-of-two after clamp is auto-rounded,
    /// not errored").
    pub fn set_sieve_size(&mut self, kib: i32) -> Result<()> {
        if !(MIN_REQUEST_KIB..=MAX_REQUEST_KIB).contains(&kib) {
            return Err(SieveError::InvalidSieveSize { requested_kib: kib });
        }
        self.sieve_size_kib = clamp_and_round(kib);
        Ok(())
    }

    /// Sets the worker thread count, clamped to `[1, max_hw_threads]`.
    /// Rejects `n <= 0` outright rather than silently clamping it to 1,
    /// since a non-positive request is very likely a caller error.
    pub fn set_num_threads(&mut self, n: i32) -> Result<()> {
        if n <= 0 {
            return Err(SieveError::InvalidThreadCount { requested: n });
        }
        self.num_threads = n.min(self.max_hw_threads);
        Ok(())
    }

    pub fn set_presieve_limit(&mut self, limit: u32) {
        self.presieve_limit = limit;
    }
}

fn global() -> &'static Mutex<SieveConfig> {
    static GLOBAL: OnceLock<Mutex<SieveConfig>> = OnceLock::new();
    GLOBAL.get_or_init(|| Mutex::new(SieveConfig::default()))
}

/// Returns a copy of the process-wide default configuration, as seen by
/// callers that don't want to thread their own `SieveConfig` through.
pub fn current() -> SieveConfig {
    *global().lock().expect("config mutex poisoned")
}

pub fn set_sieve_size(kib: i32) -> Result<()> {
    global().lock().expect("config mutex poisoned").set_sieve_size(kib)
}

pub fn get_sieve_size() -> i32 {
    global().lock().expect("config mutex poisoned").sieve_size_kib()
}

pub fn set_num_threads(n: i32) -> Result<()> {
    global().lock().expect("config mutex poisoned").set_num_threads(n)
}

pub fn get_num_threads() -> i32 {
    global().lock().expect("config mutex poisoned").num_threads()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sieve_size_is_a_power_of_two_within_bounds() {
        let cfg = SieveConfig::default();
        let kib = cfg.sieve_size_kib();
        assert!((MIN_SIEVE_KIB..=MAX_SIEVE_KIB).contains(&kib));
        assert_eq!(kib & (kib - 1), 0, "{kib} is not a power of two");
    }

    #[test]
    fn set_sieve_size_rejects_outside_request_bounds() {
        let mut cfg = SieveConfig::default();
        assert!(cfg.set_sieve_size(0).is_err());
        assert!(cfg.set_sieve_size(8193).is_err());
    }

    #[test]
    fn set_sieve_size_clamps_and_rounds_in_range() {
        let mut cfg = SieveConfig::default();
        cfg.set_sieve_size(1).unwrap();
        assert_eq!(cfg.sieve_size_kib(), MIN_SIEVE_KIB);

        cfg.set_sieve_size(100).unwrap();
        assert_eq!(cfg.sieve_size_kib(), 64);

        cfg.set_sieve_size(8192).unwrap();
        assert_eq!(cfg.sieve_size_kib(), MAX_SIEVE_KIB);
    }

    #[test]
    fn set_num_threads_rejects_non_positive() {
        let mut cfg = SieveConfig::default();
        assert!(cfg.set_num_threads(0).is_err());
        assert!(cfg.set_num_threads(-1).is_err());
    }

    #[test]
    fn set_num_threads_clamps_to_hardware_max() {
        let mut cfg = SieveConfig::default();
        let max = cfg.max_hw_threads;
        cfg.set_num_threads(max + 1000).unwrap();
        assert_eq!(cfg.num_threads(), max);
    }

    #[test]
    fn global_accessors_round_trip() {
        set_sieve_size(16).unwrap();
        assert_eq!(get_sieve_size(), 16);
        set_num_threads(1).unwrap();
        assert_eq!(get_num_threads(), 1);
    }
}
