use libc;
use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::prelude::*;
use std::path::Path;

// Recursively constructs a directory tree
pub fn mkdir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                mkdir(parent)?
            }
            if !path.is_dir() {
                fs::create_dir(path)
            } else {
                Ok(())
            }
        }
        None => Ok(()),
    }
}

pub fn drop_cache() -> io::Result<()> {
    // 'echo 3 >/proc/sys/vm/drop_caches'
    let mut drop_cache_file = OpenOptions::new()
        .write(true)
        .open("/proc/sys/vm/drop_caches")?;
    drop_cache_file.write_all(b"3\n")?;
    Ok(())
}

// Wrapper around unsafe libc::sync
pub fn sync_all() {
    unsafe {
        libc::sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn mkdir_builds_missing_parents() {
        let tmp = TempDir::new("util").unwrap();
        let nested = tmp.path().join("output").join("run-1").join("extra");
        mkdir(&nested).unwrap();
        assert!(nested.is_dir());
        // already there
        mkdir(&nested).unwrap();
    }
}
