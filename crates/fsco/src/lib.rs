//! Round-wise EFEI force-scan screening: classify each molecule's ground
//! spin state under an applied force, decide the next force magnitude to
//! probe, and conclude a spin-crossover verdict.

pub mod analyze;
pub mod config;
pub mod eval;
pub mod round;
pub mod spin;
pub mod table;

/// print a message to stderr and exit with status 1
#[macro_export]
macro_rules! die {
    ($($t:tt)*) => {{
        eprintln!($($t)*);
        std::process::exit(1);
    }};
}

/// call `rayon::ThreadPoolBuilder` to set `num_threads` to `n`. Discards the
/// error returned by `build_global` if the thread pool has already been
/// initialized
pub fn max_threads(n: usize) {
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global();
}
