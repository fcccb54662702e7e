//! Read-only CPU-topology inputs consumed by the core (spec.md §6).
//!
//! Only four facts cross the boundary into the engine: L1 data-cache size,
//! L2 cache size, whether L2 is private to a core, and threads per core.
//! Everything else about CPU topology is out of scope. Probing never
//! errors into the core (spec.md §7) — on any failure we fall back to the
//! documented defaults.

/// Fallback L1 data-cache size: 32 KiB, per spec.md §6.
pub const DEFAULT_L1_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct CpuInfo {
    pub l1_cache_bytes: usize,
    pub l2_cache_bytes: Option<usize>,
    pub l2_private: bool,
    pub threads_per_core: usize,
}

impl Default for CpuInfo {
    fn default() -> Self {
        CpuInfo {
            l1_cache_bytes: DEFAULT_L1_BYTES,
            l2_cache_bytes: None,
            l2_private: false,
            threads_per_core: 1,
        }
    }
}

impl CpuInfo {
    /// Probes the running CPU via `cache-size`, falling back to defaults on
    /// any missing value. `l2_private` and `threads_per_core` are not
    /// exposed by `cache-size`, so they use conservative approximations: L2
    /// is treated as private whenever it was successfully detected (modern
    /// consumer and server parts overwhelmingly have per-core L2), and
    /// `threads_per_core` defaults to 1 absent a better SMT signal.
    pub fn probe() -> CpuInfo {
        let l1_cache_bytes = cache_size::l1_cache_size().unwrap_or(DEFAULT_L1_BYTES);
        let l2_cache_bytes = cache_size::l2_cache_size();
        CpuInfo {
            l1_cache_bytes,
            l2_cache_bytes,
            l2_private: l2_cache_bytes.is_some(),
            threads_per_core: 1,
        }
    }

    /// The cache size this run's segment size should be scaled against:
    /// L2 when it's private and larger than L1 (spec.md §3), else L1.
    pub fn preferred_cache_bytes(&self) -> usize {
        match self.l2_cache_bytes {
            Some(l2) if self.l2_private && l2 > self.l1_cache_bytes => l2,
            _ => self.l1_cache_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_falls_back_to_32kib_l1_no_l2() {
        let info = CpuInfo::default();
        assert_eq!(info.l1_cache_bytes, 32 * 1024);
        assert_eq!(info.l2_cache_bytes, None);
        assert_eq!(info.preferred_cache_bytes(), 32 * 1024);
    }

    #[test]
    fn prefers_l2_when_private_and_larger() {
        let info = CpuInfo {
            l1_cache_bytes: 32 * 1024,
            l2_cache_bytes: Some(256 * 1024),
            l2_private: true,
            threads_per_core: 2,
        };
        assert_eq!(info.preferred_cache_bytes(), 256 * 1024);
    }

    #[test]
    fn ignores_shared_l2() {
        let info = CpuInfo {
            l1_cache_bytes: 32 * 1024,
            l2_cache_bytes: Some(256 * 1024),
            l2_private: false,
            threads_per_core: 2,
        };
        assert_eq!(info.preferred_cache_bytes(), 32 * 1024);
    }
}
