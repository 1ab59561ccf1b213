use collector::{CollectorFault, EnumerationCollector};
use fs::{EntryKind, Filesystem, FsError, Ino};
use statistics::Stats;
use std::time::Instant;

pub trait Operation {
    fn get_stats(&self) -> Stats;
}

/// Timed `create_entry`. Records the name length as bytes.
pub struct Create {
    stats: Stats,
}

impl Create {
    pub fn new() -> Create {
        Create { stats: Stats::new() }
    }

    pub fn run<F: Filesystem + ?Sized>(
        &mut self,
        fs: &mut F,
        parent: Ino,
        name: &str,
        kind: EntryKind,
    ) -> Result<Ino, FsError> {
        let start = Instant::now();
        match fs.create_entry(parent, name, kind) {
            Ok(ino) => {
                self.stats.record(start.elapsed(), name.len());
                Ok(ino)
            }
            Err(e) => Err(e),
        }
    }
}

impl Operation for Create {
    fn get_stats(&self) -> Stats {
        self.stats.clone()
    }
}

pub struct Lookup {
    stats: Stats,
}

impl Lookup {
    pub fn new() -> Lookup {
        Lookup { stats: Stats::new() }
    }

    pub fn run<F: Filesystem + ?Sized>(&mut self, fs: &mut F, parent: Ino, name: &str) -> Result<Ino, FsError> {
        let start = Instant::now();
        match fs.lookup(parent, name) {
            Ok(ino) => {
                self.stats.record(start.elapsed(), 0);
                Ok(ino)
            }
            Err(e) => Err(e),
        }
    }
}

impl Operation for Lookup {
    fn get_stats(&self) -> Stats {
        self.stats.clone()
    }
}

/// Why a timed enumeration produced no listing.
#[derive(Debug)]
pub enum ReadDirError {
    Fs(FsError),
    Collector(CollectorFault),
}

/// Timed `enumerate` into a fresh `EnumerationCollector`. Records the
/// bytes of name data listed.
pub struct ReadDir {
    stats: Stats,
}

impl ReadDir {
    pub fn new() -> ReadDir {
        ReadDir { stats: Stats::new() }
    }

    pub fn run<F: Filesystem + ?Sized>(
        &mut self,
        fs: &mut F,
        dir: Ino,
        mut collector: EnumerationCollector,
    ) -> Result<Vec<String>, ReadDirError> {
        let start = Instant::now();
        fs.enumerate(dir, &mut collector).map_err(ReadDirError::Fs)?;
        let elapsed = start.elapsed();
        let bytes = collector.name_bytes();
        let names = collector.finish().map_err(ReadDirError::Collector)?;
        self.stats.record(elapsed, bytes);
        Ok(names)
    }
}

impl Operation for ReadDir {
    fn get_stats(&self) -> Stats {
        self.stats.clone()
    }
}

/// Timed `delete_entry`.
pub struct Remove {
    stats: Stats,
}

impl Remove {
    pub fn new() -> Remove {
        Remove { stats: Stats::new() }
    }

    pub fn run<F: Filesystem + ?Sized>(&mut self, fs: &mut F, parent: Ino, name: &str) -> Result<(), FsError> {
        let start = Instant::now();
        match fs.delete_entry(parent, name) {
            Ok(()) => {
                self.stats.record(start.elapsed(), 0);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Operation for Remove {
    fn get_stats(&self) -> Stats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs::MemFs;

    #[test]
    fn only_successful_calls_are_recorded() {
        let mut fs = MemFs::new();
        let root = fs.root();
        let mut create = Create::new();
        let mut remove = Remove::new();

        create.run(&mut fs, root, "abc", EntryKind::File).unwrap();
        assert_eq!(
            create.run(&mut fs, root, "abc", EntryKind::File),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(create.get_stats().num_ops(), 1);
        assert_eq!(create.get_stats().total_bytes(), 3);

        remove.run(&mut fs, root, "abc").unwrap();
        assert_eq!(remove.run(&mut fs, root, "abc"), Err(FsError::NotFound));
        assert_eq!(remove.get_stats().num_ops(), 1);
    }

    #[test]
    fn readdir_hands_back_the_listing() {
        let mut fs = MemFs::new();
        let root = fs.root();
        let dir = fs.create_entry(root, "d", EntryKind::Directory).unwrap();
        fs.create_entry(dir, "2", EntryKind::File).unwrap();
        fs.create_entry(dir, "30", EntryKind::File).unwrap();

        let mut lookup = Lookup::new();
        assert_eq!(lookup.run(&mut fs, root, "d").unwrap(), dir);

        let mut readdir = ReadDir::new();
        let names = readdir.run(&mut fs, dir, EnumerationCollector::new(3)).unwrap();
        assert_eq!(names, vec!["2", "30"]);
        assert_eq!(readdir.get_stats().total_bytes(), 3);

        match readdir.run(&mut fs, dir, EnumerationCollector::new(1)) {
            Err(ReadDirError::Collector(CollectorFault::Overflow { capacity: 1, .. })) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match readdir.run(&mut fs, Ino(9999), EnumerationCollector::new(1)) {
            Err(ReadDirError::Fs(FsError::StaleHandle(Ino(9999)))) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(readdir.get_stats().num_ops(), 1);
    }
}
