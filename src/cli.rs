//! Command-line front end over the sieve engine (spec.md §6's callable
//! surface, out of scope for the core itself per spec.md §1 but shipped
//! as ambient tooling the way the teacher ships `main.rs`).

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Segmented wheel sieve of Eratosthenes", long_about = None)]
pub struct Cli {
    /// Lower bound of the range to operate over.
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Upper bound of the range to operate over.
    #[arg(long, default_value_t = 1_000_000)]
    pub stop: u64,

    /// Segment size in KiB, clamped to [8, 4096] and rounded down to a
    /// power of two. Defaults to the probed CPU cache size.
    #[arg(long)]
    pub sieve_size_kib: Option<i32>,

    /// Worker thread count, clamped to [1, hardware thread count].
    /// Defaults to the hardware thread count.
    #[arg(long)]
    pub threads: Option<i32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count primes, or k-tuplets when `--tuplet-k` is given, in [start, stop].
    Count {
        #[arg(long)]
        tuplet_k: Option<usize>,
    },
    /// Print primes, or k-tuplets when `--tuplet-k` is given, one per line.
    Print {
        #[arg(long)]
        tuplet_k: Option<usize>,
    },
    /// Print the n-th prime relative to `start` (n may be negative).
    NthPrime {
        #[arg(long)]
        n: i64,
    },
    /// Print `count` consecutive primes starting at `start` (or ending at
    /// `start`, if `count` is negative).
    Iterate {
        #[arg(long, default_value_t = 10)]
        count: i64,
    },
}
