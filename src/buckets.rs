//! Big-prime bucket scheduler (component E, spec.md §4.5).
//!
//! A sieving prime larger than the segment size hits at most once every
//! `ceil(p/S)` segments, so it would be wasteful to scan every big prime
//! on every segment. Instead each future segment index owns a singly
//! linked list of fixed-capacity buckets holding the descriptors due to
//! hit it; processing a segment walks (and drains) its list, rescheduling
//! each descriptor into the bucket for its *next* hit.

use crate::crossers::SievingPrime;
use crate::wheel::locate;

/// Fixed bucket capacity (spec.md §4.5: "e.g. 1024 entries").
pub const BUCKET_CAPACITY: usize = 1024;

struct Bucket {
    entries: Vec<SievingPrime>,
    next: Option<Box<Bucket>>,
}

impl Bucket {
    fn new() -> Bucket {
        Bucket {
            entries: Vec::with_capacity(BUCKET_CAPACITY),
            next: None,
        }
    }
}

pub struct BucketScheduler {
    lists: Vec<Option<Box<Bucket>>>,
    pool: Vec<Box<Bucket>>,
    n_lists: usize,
    seg_len_bytes: u64,
    stop: u64,
}

impl BucketScheduler {
    /// `n_lists = next_pow2(ceil(sqrt_stop / seg_len_bytes))`, sized so
    /// the aggregate working set of a run of consecutive active segments
    /// fits in L2 (spec.md §4.5's stated default; the exact constant is
    /// implementation-defined per spec.md §9). `stop` bounds the run: a
    /// descriptor whose next multiple lands past it is retired rather
    /// than rescheduled (spec.md §4.5's contract).
    pub fn new(seg_len_bytes: u64, sqrt_stop: u64, stop: u64) -> BucketScheduler {
        let estimate = sqrt_stop.div_ceil(seg_len_bytes.max(1)).max(1);
        let n_lists = next_pow2(estimate as usize);
        BucketScheduler {
            lists: (0..n_lists).map(|_| None).collect(),
            pool: Vec::new(),
            n_lists,
            seg_len_bytes,
            stop,
        }
    }

    fn take_bucket(&mut self) -> Box<Bucket> {
        self.pool.pop().unwrap_or_else(|| Box::new(Bucket::new()))
    }

    fn segment_index_for(&self, value: u64, base_low: u64) -> u64 {
        (value - base_low) / (30 * self.seg_len_bytes)
    }

    /// Schedules `sp`'s next hit into the list for the segment (relative
    /// to `base_low`, the run's starting integer) that it falls in.
    /// Retires (drops) the descriptor instead, without enqueueing it
    /// anywhere, once its next multiple has passed `stop` (spec.md
    /// §4.5: "...or is retired when its next multiple exceeds stop").
    pub fn schedule(&mut self, sp: SievingPrime, base_low: u64) {
        if sp.next_multiple > self.stop {
            return;
        }
        let seg_idx = self.segment_index_for(sp.next_multiple, base_low);
        let slot = (seg_idx as usize) % self.n_lists;
        let head = self.lists[slot].take();
        match head {
            Some(mut bucket) if bucket.entries.len() < BUCKET_CAPACITY => {
                bucket.entries.push(sp);
                self.lists[slot] = Some(bucket);
            }
            existing => {
                let mut fresh = self.take_bucket();
                fresh.entries.push(sp);
                fresh.next = existing;
                self.lists[slot] = Some(fresh);
            }
        }
    }

    /// Processes segment `seg_idx`: clears every descriptor's hit in
    /// `buf`, recycles drained buckets to the pool, then reschedules each
    /// descriptor for its next hit (spec.md §4.5's contract).
    pub fn process(&mut self, seg_idx: u64, buf: &mut [u8], seg_low: u64, base_low: u64) {
        let slot = (seg_idx as usize) % self.n_lists;
        let mut head = self.lists[slot].take();
        let mut due = Vec::new();

        while let Some(mut bucket) = head {
            for mut sp in bucket.entries.drain(..) {
                if let Some((byte, bit)) = locate(sp.next_multiple) {
                    let idx = (byte - seg_low / 30) as usize;
                    if idx < buf.len() {
                        buf[idx] &= !(1 << bit);
                    }
                }
                sp.next_multiple += sp.wheel.next_diff();
                due.push(sp);
            }
            let next = bucket.next.take();
            self.pool.push(bucket);
            head = next;
        }

        for sp in due {
            self.schedule(sp, base_low);
        }
    }
}

fn next_pow2(n: usize) -> usize {
    let mut p = 1usize;
    while p < n.max(1) {
        p <<= 1;
    }
    p.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::first_tracked_multiple;

    #[test]
    fn next_pow2_rounds_up() {
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(5), 8);
        assert_eq!(next_pow2(8), 8);
        assert_eq!(next_pow2(9), 16);
    }

    #[test]
    fn schedules_and_processes_a_big_prime_hit() {
        let seg_len_bytes = 8u64; // small segment, so a moderately sized prime is "big"
        let mut sched = BucketScheduler::new(seg_len_bytes, 1000, u64::MAX);
        let p = 10_007u32;
        let base_low = 0u64;
        let first = first_tracked_multiple(p as u64, base_low);
        sched.schedule(SievingPrime::new(p, first), base_low);

        let seg_idx = first / (30 * seg_len_bytes);
        let seg_low = seg_idx * 30 * seg_len_bytes;
        let mut buf = vec![0xFFu8; seg_len_bytes as usize];
        sched.process(seg_idx, &mut buf, seg_low, base_low);

        let mut cleared_count = 0;
        for &b in &buf {
            cleared_count += (8 - b.count_ones()) as usize;
        }
        assert_eq!(cleared_count, 1, "exactly one multiple of p should fall in this segment");
    }

    #[test]
    fn retires_a_descriptor_whose_next_multiple_exceeds_stop() {
        let seg_len_bytes = 8u64;
        let p = 10_007u32;
        let base_low = 0u64;
        let first = first_tracked_multiple(p as u64, base_low);

        // stop falls strictly before `first`'s segment's successor hit,
        // so after processing that one hit the descriptor's *next*
        // multiple (first + 2p or so) is already past stop.
        let stop = first + p as u64;
        let mut sched = BucketScheduler::new(seg_len_bytes, 1000, stop);
        sched.schedule(SievingPrime::new(p, first), base_low);

        let seg_idx = first / (30 * seg_len_bytes);
        let seg_low = seg_idx * 30 * seg_len_bytes;
        let mut buf = vec![0xFFu8; seg_len_bytes as usize];
        sched.process(seg_idx, &mut buf, seg_low, base_low);

        // every list should now be empty: the rescheduled descriptor's
        // next multiple exceeded `stop` and was dropped, not requeued.
        assert!(sched.lists.iter().all(|b| b.is_none()));
    }
}
