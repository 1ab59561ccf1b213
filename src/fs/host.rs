use super::{check_name, DirVisitor, EntryKind, Filesystem, FsError, Ino};
use nix;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::{lstat, Mode, SFlag};
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::DirEntryExt;
use std::path::{Path, PathBuf};

impl From<nix::Error> for FsError {
    fn from(err: nix::Error) -> FsError {
        match err {
            nix::Error::Sys(Errno::ENOENT) => FsError::NotFound,
            nix::Error::Sys(Errno::EEXIST) => FsError::AlreadyExists,
            nix::Error::Sys(Errno::ENOTDIR) => FsError::NotADirectory,
            nix::Error::Sys(Errno::ENOTEMPTY) => FsError::NotEmpty,
            other => FsError::Backend(other.to_string()),
        }
    }
}

/// Runs the directory operations against a directory of the host, so the
/// harness measures whatever filesystem is mounted there.
///
/// Identifiers are host inode numbers. Only entries this instance has
/// created, looked up or listed can be used as parents.
pub struct HostFs {
    root: Ino,
    paths: HashMap<Ino, PathBuf>,
}

impl HostFs {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<HostFs, FsError> {
        let root = root.as_ref().to_owned();
        let stat = lstat(&root)?;
        if !is_dir(stat.st_mode) {
            return Err(FsError::NotADirectory);
        }
        let ino = Ino(stat.st_ino as u64);
        let mut paths = HashMap::new();
        paths.insert(ino, root);
        Ok(HostFs { root: ino, paths: paths })
    }

    pub fn root_path(&self) -> &Path {
        &self.paths[&self.root]
    }

    fn child_path(&self, parent: Ino, name: &str) -> Result<PathBuf, FsError> {
        check_name(name)?;
        match self.paths.get(&parent) {
            Some(path) => Ok(path.join(name)),
            None => Err(FsError::StaleHandle(parent)),
        }
    }

    fn remember(&mut self, path: PathBuf) -> Result<Ino, FsError> {
        let ino = Ino(lstat(&path)?.st_ino as u64);
        self.paths.insert(ino, path);
        Ok(ino)
    }
}

fn is_dir(mode: nix::libc::mode_t) -> bool {
    SFlag::from_bits_truncate(mode) & SFlag::S_IFMT == SFlag::S_IFDIR
}

impl Filesystem for HostFs {
    fn root(&self) -> Ino {
        self.root
    }

    fn create_entry(&mut self, parent: Ino, name: &str, kind: EntryKind) -> Result<Ino, FsError> {
        let path = self.child_path(parent, name)?;
        match kind {
            EntryKind::Directory => nix::unistd::mkdir(&path, Mode::S_IRWXU)?,
            EntryKind::File => {
                let fd = nix::fcntl::open(
                    &path,
                    OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_WRONLY,
                    Mode::S_IRUSR | Mode::S_IWUSR,
                )?;
                nix::unistd::close(fd)?;
            }
        }
        self.remember(path)
    }

    fn delete_entry(&mut self, parent: Ino, name: &str) -> Result<(), FsError> {
        let path = self.child_path(parent, name)?;
        let stat = lstat(&path)?;
        if is_dir(stat.st_mode) {
            fs::remove_dir(&path).map_err(|e| match e.raw_os_error() {
                Some(code) => FsError::from(nix::Error::Sys(Errno::from_i32(code))),
                None => FsError::from(e),
            })?;
        } else {
            nix::unistd::unlink(&path)?;
        }
        self.paths.remove(&Ino(stat.st_ino as u64));
        Ok(())
    }

    fn lookup(&mut self, parent: Ino, name: &str) -> Result<Ino, FsError> {
        let path = self.child_path(parent, name)?;
        self.remember(path)
    }

    fn enumerate(&mut self, dir: Ino, visitor: &mut dyn DirVisitor) -> Result<(), FsError> {
        let dir_path = match self.paths.get(&dir) {
            Some(path) => path.clone(),
            None => return Err(FsError::StaleHandle(dir)),
        };
        for entry in fs::read_dir(&dir_path)? {
            let entry = entry?;
            let ino = Ino(entry.ino());
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => return Err(FsError::InvalidName(raw.to_string_lossy().into_owned())),
            };
            self.paths.insert(ino, dir_path.join(&name));
            if !visitor.observe(&name, ino) {
                debug!("enumeration of {:?} stopped by visitor at {:?}", dir_path, name);
                break;
            }
        }
        Ok(())
    }
}
