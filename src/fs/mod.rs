use std::error::Error;
use std::fmt;
use std::io;

mod host;
mod memory;

pub use self::host::HostFs;
pub use self::memory::{ListingOrder, MemFs};

/// Opaque entry identifier handed out by a filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ino(pub u64);

impl fmt::Display for Ino {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    AlreadyExists,
    InvalidName(String),
    NotADirectory,
    NotEmpty,
    /// The identifier does not name a live entry.
    StaleHandle(Ino),
    Backend(String),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FsError::NotFound => write!(f, "no such entry"),
            FsError::AlreadyExists => write!(f, "entry already exists"),
            FsError::InvalidName(ref name) => write!(f, "invalid entry name {:?}", name),
            FsError::NotADirectory => write!(f, "not a directory"),
            FsError::NotEmpty => write!(f, "directory not empty"),
            FsError::StaleHandle(ino) => write!(f, "stale handle {}", ino),
            FsError::Backend(ref msg) => write!(f, "backend failure: {}", msg),
        }
    }
}

impl Error for FsError {}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> FsError {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            _ => FsError::Backend(err.to_string()),
        }
    }
}

/// Callback driven by `Filesystem::enumerate`, once per directory entry.
///
/// Returning `false` asks the enumerator to stop; that is not an error.
/// The visitor runs on the enumerating call stack and must not enumerate
/// the same directory again.
pub trait DirVisitor {
    fn observe(&mut self, name: &str, ino: Ino) -> bool;
}

impl<F: FnMut(&str, Ino) -> bool> DirVisitor for F {
    fn observe(&mut self, name: &str, ino: Ino) -> bool {
        self(name, ino)
    }
}

/// The directory operations the harness drives.
pub trait Filesystem {
    /// The fixed container every run starts from.
    fn root(&self) -> Ino;

    fn create_entry(&mut self, parent: Ino, name: &str, kind: EntryKind) -> Result<Ino, FsError>;

    fn delete_entry(&mut self, parent: Ino, name: &str) -> Result<(), FsError>;

    fn lookup(&mut self, parent: Ino, name: &str) -> Result<Ino, FsError>;

    /// Calls `visitor` once per entry of `dir` until the entries run out or
    /// the visitor returns `false`.
    fn enumerate(&mut self, dir: Ino, visitor: &mut dyn DirVisitor) -> Result<(), FsError>;
}

/// Rejects names no backend can store as a single path component.
pub fn check_name(name: &str) -> Result<(), FsError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(FsError::InvalidName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_names() {
        assert!(check_name("Test_Dir").is_ok());
        for name in &["", ".", "..", "a/b", "nul\0"] {
            assert_eq!(check_name(name), Err(FsError::InvalidName(name.to_string())));
        }
    }

    #[test]
    fn io_errors_map_to_kinds() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(FsError::from(missing), FsError::NotFound);
        let exists = io::Error::new(io::ErrorKind::AlreadyExists, "there");
        assert_eq!(FsError::from(exists), FsError::AlreadyExists);
        let other = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(FsError::from(other), FsError::Backend("boom".to_owned()));
    }

    #[test]
    fn closures_are_visitors() {
        let mut seen = Vec::new();
        {
            let mut visitor = |name: &str, _ino: Ino| {
                seen.push(name.to_owned());
                seen.len() < 2
            };
            let visitor: &mut dyn DirVisitor = &mut visitor;
            assert!(visitor.observe("a", Ino(1)));
            assert!(!visitor.observe("b", Ino(2)));
        }
        assert_eq!(seen, vec!["a", "b"]);
    }
}
