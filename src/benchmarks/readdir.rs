use super::Benchmark;
use collector::{CollectorFault, EnumerationCollector};
use config::{Backend, DirBenchConfig};
use fs::{EntryKind, Filesystem, FsError, Ino};
use ledger::{entry_name, NameError, NameLedger};
use operation::*;
use serde_json;
use statistics::{PhaseClock, PhaseTiming, Stats};
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use util::{drop_cache, mkdir, sync_all};
use verify::{VerificationError, FIRST_ENTRY};

/// Where a run is in its create/list/verify/delete lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Init,
    DirCreated,
    FilesCreated,
    Listed,
    Verified,
    FilesDeleted,
    DirDeleted,
    Done,
    /// Absorbing; entered on any fatal error.
    Failed,
}

/// Errors that abort a run. Nothing after the failing step is attempted.
#[derive(Debug)]
pub enum BenchError {
    Name(NameError),
    Creation { name: String, source: FsError },
    Lookup { name: String, source: FsError },
    Enumeration(FsError),
    Collector(CollectorFault),
    Deletion { name: String, source: FsError },
    /// A step was invoked from the wrong phase.
    Sequence { expected: Phase, actual: Phase },
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BenchError::Name(ref e) => write!(f, "{}", e),
            BenchError::Creation { ref name, ref source } => write!(f, "failed to create {:?}: {}", name, source),
            BenchError::Lookup { ref name, ref source } => write!(f, "failed to look up {:?}: {}", name, source),
            BenchError::Enumeration(ref e) => write!(f, "failed to enumerate directory: {}", e),
            BenchError::Collector(ref e) => write!(f, "{}", e),
            BenchError::Deletion { ref name, ref source } => write!(f, "failed to delete {:?}: {}", name, source),
            BenchError::Sequence { expected, actual } => {
                write!(f, "step needs phase {:?}, run is in {:?}", expected, actual)
            }
        }
    }
}

impl Error for BenchError {}

impl From<NameError> for BenchError {
    fn from(e: NameError) -> BenchError {
        BenchError::Name(e)
    }
}

impl From<ReadDirError> for BenchError {
    fn from(e: ReadDirError) -> BenchError {
        match e {
            ReadDirError::Fs(e) => BenchError::Enumeration(e),
            ReadDirError::Collector(e) => BenchError::Collector(e),
        }
    }
}

/// Outcome of the listing check. A failed check does not stop the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Passed,
    Failed(VerificationError),
}

/// State of one create/list/delete run, stepped explicitly.
///
/// Each step checks it is called from the phase it follows and moves the
/// run to `Phase::Failed` when it returns an error.
pub struct RunContext<'a, F: 'a + Filesystem + ?Sized> {
    fs: &'a mut F,
    config: &'a DirBenchConfig,
    phase: Phase,
    ledger: NameLedger,
    container: Option<Ino>,
    listing: Option<Vec<String>>,
    entries_listed: usize,
    verdict: Option<Verdict>,
    create: Create,
    lookup: Lookup,
    readdir: ReadDir,
    remove: Remove,
    timings: Vec<PhaseTiming>,
    delete_clock: Option<PhaseClock>,
}

impl<'a, F: 'a + Filesystem + ?Sized> RunContext<'a, F> {
    pub fn new(fs: &'a mut F, config: &'a DirBenchConfig) -> Self {
        RunContext {
            fs: fs,
            config: config,
            phase: Phase::Init,
            ledger: NameLedger::new(),
            container: None,
            listing: None,
            entries_listed: 0,
            verdict: None,
            create: Create::new(),
            lookup: Lookup::new(),
            readdir: ReadDir::new(),
            remove: Remove::new(),
            timings: Vec::new(),
            delete_clock: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &NameLedger {
        &self.ledger
    }

    pub fn container(&self) -> Option<Ino> {
        self.container
    }

    /// Names from the last enumeration, until they are verified.
    pub fn listing(&self) -> Option<&[String]> {
        self.listing.as_ref().map(|names| &names[..])
    }

    fn enter(&mut self, from: Phase) -> Result<(), BenchError> {
        if self.phase != from {
            let err = BenchError::Sequence {
                expected: from,
                actual: self.phase,
            };
            self.phase = Phase::Failed;
            return Err(err);
        }
        Ok(())
    }

    fn fail<T>(&mut self, err: BenchError) -> Result<T, BenchError> {
        error!("run failed after {:?}: {}", self.phase, err);
        self.phase = Phase::Failed;
        Err(err)
    }

    /// Creates the test directory under the root. The entry count is
    /// checked first; nothing is created if the last entry cannot be named.
    pub fn create_container(&mut self) -> Result<Ino, BenchError> {
        self.enter(Phase::Init)?;
        let num_files = self.config.num_files;
        if num_files > 0 {
            if let Err(e) = entry_name(&self.config.name_prefix, num_files) {
                return self.fail(BenchError::from(e));
            }
        }
        if let Err(e) = self.ledger.reserve(num_files) {
            return self.fail(BenchError::from(e));
        }
        let name = self.config.dir_name.clone();
        if let Err(e) = self.ledger.push(name.as_str()) {
            return self.fail(BenchError::from(e));
        }
        let root = self.fs.root();
        match self.create.run(&mut *self.fs, root, &name, EntryKind::Directory) {
            Ok(ino) => {
                info!("Test dir {} ({})", name, ino);
                self.container = Some(ino);
                self.phase = Phase::DirCreated;
                Ok(ino)
            }
            Err(e) => self.fail(BenchError::Creation { name: name, source: e }),
        }
    }

    /// Creates `num_files` entries in the test directory, in index order.
    pub fn create_entries(&mut self) -> Result<(), BenchError> {
        self.enter(Phase::DirCreated)?;
        let dir = match self.container {
            Some(ino) => ino,
            None => return self.fail(BenchError::Sequence { expected: Phase::DirCreated, actual: Phase::Init }),
        };
        let clock = PhaseClock::start(format!("create {} files", self.config.num_files));
        for index in 1..self.config.num_files + 1 {
            let name = match entry_name(&self.config.name_prefix, index) {
                Ok(name) => name,
                Err(e) => return self.fail(BenchError::from(e)),
            };
            if let Err(e) = self.create.run(&mut *self.fs, dir, &name, EntryKind::File) {
                return self.fail(BenchError::Creation { name: name, source: e });
            }
            debug!("created {}", name);
            if let Err(e) = self.ledger.push(name) {
                return self.fail(BenchError::from(e));
            }
        }
        self.timings.push(clock.stop());
        self.phase = Phase::FilesCreated;
        Ok(())
    }

    /// Looks the test directory up by name and enumerates it.
    pub fn list(&mut self) -> Result<&[String], BenchError> {
        self.enter(Phase::FilesCreated)?;
        let name = match self.ledger.container() {
            Some(name) => name.to_owned(),
            None => return self.fail(BenchError::Sequence { expected: Phase::FilesCreated, actual: Phase::Init }),
        };
        let root = self.fs.root();

        let clock = PhaseClock::start("lookup");
        let dir = match self.lookup.run(&mut *self.fs, root, &name) {
            Ok(ino) => ino,
            Err(e) => return self.fail(BenchError::Lookup { name: name, source: e }),
        };
        self.timings.push(clock.stop());

        let clock = PhaseClock::start(format!("read {} files", self.config.num_files));
        let collector = EnumerationCollector::new(self.ledger.len());
        let names = match self.readdir.run(&mut *self.fs, dir, collector) {
            Ok(names) => names,
            Err(e) => return self.fail(BenchError::from(e)),
        };
        self.timings.push(clock.stop());

        info!("enumerated {} entries of {}", names.len(), name);
        self.entries_listed = names.len();
        self.phase = Phase::Listed;
        Ok(&self.listing.get_or_insert(names)[..])
    }

    /// Checks the listing against the ledger and releases it. Never fails
    /// the run; the outcome is kept as the run's verdict.
    pub fn verify(&mut self) -> Result<&Verdict, BenchError> {
        self.enter(Phase::Listed)?;
        let listing = self.listing.take().unwrap_or_default();
        let verdict = match self.config.order_policy.verify(&listing, &self.ledger, FIRST_ENTRY) {
            Ok(()) => Verdict::Passed,
            Err(e) => {
                warn!("listing check failed: {}", e);
                Verdict::Failed(e)
            }
        };
        self.phase = Phase::Verified;
        let verdict: &Verdict = self.verdict.get_or_insert(verdict);
        Ok(verdict)
    }

    /// Deletes the entries in index order.
    pub fn delete_entries(&mut self) -> Result<(), BenchError> {
        self.enter(Phase::Verified)?;
        let dir = match self.container {
            Some(ino) => ino,
            None => return self.fail(BenchError::Sequence { expected: Phase::Verified, actual: Phase::Init }),
        };
        let clock = PhaseClock::start(format!("delete {} files", self.config.num_files));
        let names: Vec<String> = self.ledger.entries().to_vec();
        for name in names {
            if let Err(e) = self.remove.run(&mut *self.fs, dir, &name) {
                return self.fail(BenchError::Deletion { name: name, source: e });
            }
        }
        self.delete_clock = Some(clock);
        self.phase = Phase::FilesDeleted;
        Ok(())
    }

    /// Deletes the now empty test directory.
    pub fn delete_container(&mut self) -> Result<(), BenchError> {
        self.enter(Phase::FilesDeleted)?;
        let name = self.config.dir_name.clone();
        let root = self.fs.root();
        if let Err(e) = self.remove.run(&mut *self.fs, root, &name) {
            return self.fail(BenchError::Deletion { name: name, source: e });
        }
        if let Some(clock) = self.delete_clock.take() {
            self.timings.push(clock.stop());
        }
        self.container = None;
        self.phase = Phase::DirDeleted;
        Ok(())
    }

    /// Closes a fully cleaned up run into its results.
    pub fn finish(mut self) -> Result<ReaddirBench, BenchError> {
        self.enter(Phase::DirDeleted)?;
        self.phase = Phase::Done;
        Ok(ReaddirBench {
            config: self.config.clone(),
            create: self.create.get_stats(),
            lookup: self.lookup.get_stats(),
            readdir: self.readdir.get_stats(),
            delete: self.remove.get_stats(),
            timings: self.timings,
            entries_listed: self.entries_listed,
            verdict: self.verdict.unwrap_or(Verdict::Passed),
        })
    }
}

/// Result of one complete create/list/verify/delete run.
pub struct ReaddirBench {
    config: DirBenchConfig,
    create: Stats,
    lookup: Stats,
    readdir: Stats,
    delete: Stats,
    timings: Vec<PhaseTiming>,
    entries_listed: usize,
    verdict: Verdict,
}

#[derive(Serialize)]
struct Report<'a> {
    num_files: usize,
    entries_listed: usize,
    verdict: &'a Verdict,
    timings: &'a [PhaseTiming],
}

impl ReaddirBench {
    pub fn run<F: Filesystem + ?Sized>(fs: &mut F, config: &DirBenchConfig) -> Result<Self, BenchError> {
        let mut ctx = RunContext::new(fs, config);
        ctx.create_container()?;
        ctx.create_entries()?;
        if config.drop_cache && config.backend == Backend::Host {
            sync_all();
            if let Err(e) = drop_cache() {
                warn!("failed to drop cache (maybe run with sudo?): {}", e);
            }
        }
        ctx.list()?;
        ctx.verify()?;
        ctx.delete_entries()?;
        ctx.delete_container()?;
        let bench = ctx.finish()?;

        info!("Finished readdir:");
        info!(" - Create: {}", bench.create);
        info!(" - Lookup: {}", bench.lookup);
        info!(" - Readdir: {}", bench.readdir);
        info!(" - Delete: {}", bench.delete);
        info!(" - Total: {}", bench.total());
        for timing in &bench.timings {
            info!(" - {}", timing);
        }
        Ok(bench)
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }

    pub fn entries_listed(&self) -> usize {
        self.entries_listed
    }

    pub fn create_stats(&self) -> &Stats {
        &self.create
    }

    pub fn readdir_stats(&self) -> &Stats {
        &self.readdir
    }

    pub fn delete_stats(&self) -> &Stats {
        &self.delete
    }
}

impl Benchmark for ReaddirBench {
    fn total(&self) -> Stats {
        self.create.clone() + self.lookup.clone() + self.readdir.clone() + self.delete.clone()
    }

    fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        mkdir(path)?;
        serde_json::to_writer(File::create(path.join("create.json"))?, &self.create)?;
        serde_json::to_writer(File::create(path.join("lookup.json"))?, &self.lookup)?;
        serde_json::to_writer(File::create(path.join("readdir.json"))?, &self.readdir)?;
        serde_json::to_writer(File::create(path.join("delete.json"))?, &self.delete)?;
        serde_json::to_writer(File::create(path.join("config.json"))?, &self.config)?;
        serde_json::to_writer_pretty(
            File::create(path.join("report.json"))?,
            &Report {
                num_files: self.config.num_files,
                entries_listed: self.entries_listed,
                verdict: &self.verdict,
                timings: &self.timings,
            },
        )?;
        Ok(())
    }
}
