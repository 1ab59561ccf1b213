use statistics::Stats;
use std::io;
use std::path::Path;

pub mod readdir;
pub use self::readdir::*;

pub trait Benchmark {
    /// Every timed filesystem call of the benchmark, merged.
    fn total(&self) -> Stats;

    /// Whether the benchmark's correctness checks held.
    fn passed(&self) -> bool;

    /// Writes the collected stats as JSON files under `path`.
    fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()>;
}
