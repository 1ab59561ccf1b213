extern crate chrono;
extern crate libc;
#[macro_use]
extern crate log;
extern crate nix;
extern crate rand;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[cfg(test)]
extern crate tempdir;

pub mod benchmarks;
pub mod collector;
pub mod config;
pub mod fs;
pub mod ledger;
pub mod operation;
pub mod statistics;
mod util;
pub mod verify;

pub use benchmarks::{Benchmark, BenchError, Phase, ReaddirBench, RunContext, Verdict};
pub use collector::{CollectorFault, EnumerationCollector};
pub use config::{Backend, DirBenchConfig};
pub use fs::{DirVisitor, EntryKind, Filesystem, FsError, HostFs, Ino, ListingOrder, MemFs};
pub use ledger::{entry_name, NameError, NameLedger, MAX_NAME_LEN};
pub use statistics::{PhaseTiming, Stats};
pub use util::*;
pub use verify::{verify, verify_unordered, OrderPolicy, VerificationError};
