use fs::ListingOrder;
use ledger::DEFAULT_DIR_NAME;
use serde_json;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use verify::OrderPolicy;

pub const DEFAULT_NUM_FILES: usize = 1000;

/// Which filesystem the benchmark drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Host,
}

impl FromStr for Backend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Backend::Memory),
            "host" => Ok(Backend::Host),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Backend::Memory => write!(f, "memory"),
            Backend::Host => write!(f, "host"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirBenchConfig {
    /// Entries created under the test directory.
    pub num_files: usize,
    pub dir_name: String,
    /// Prepended to every generated entry name.
    pub name_prefix: String,
    /// Complete create/list/delete cycles to run.
    pub runs: usize,
    pub order_policy: OrderPolicy,
    pub backend: Backend,
    /// Directory the host backend works in; a temporary one when unset.
    pub host_path: Option<PathBuf>,
    /// Listing order of the memory backend.
    pub listing_order: ListingOrder,
    pub seed: u64,
    /// Sync and drop the page cache before listing (host backend, root only).
    pub drop_cache: bool,
    pub output_dir: PathBuf,
    pub log_path: Option<PathBuf>,
}

impl DirBenchConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        use std::fs::File;
        let file = File::open(path)?;
        let c = serde_json::from_reader(file)?;
        Ok(c)
    }
}

impl Default for DirBenchConfig {
    fn default() -> Self {
        Self {
            num_files: DEFAULT_NUM_FILES,
            dir_name: String::from(DEFAULT_DIR_NAME),
            name_prefix: String::new(),
            runs: 1,
            order_policy: OrderPolicy::Positional,
            backend: Backend::Memory,
            host_path: None,
            listing_order: ListingOrder::Creation,
            seed: 0,
            drop_cache: false,
            output_dir: PathBuf::from("./output"),
            log_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new("config").unwrap();
        let path = tmp.path().join("dirbench.json");
        File::create(&path)
            .unwrap()
            .write_all(br#"{"num_files": 3, "order_policy": "unordered", "listing_order": "shuffled"}"#)
            .unwrap();

        let config = DirBenchConfig::load(&path).unwrap();
        assert_eq!(config.num_files, 3);
        assert_eq!(config.order_policy, OrderPolicy::Unordered);
        assert_eq!(config.listing_order, ListingOrder::Shuffled);
        assert_eq!(config.dir_name, "Test_Dir");
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.runs, 1);
    }

    #[test]
    fn missing_or_bad_file_is_an_error() {
        let tmp = TempDir::new("config").unwrap();
        assert!(DirBenchConfig::load(tmp.path().join("absent.json")).is_err());

        let path = tmp.path().join("bad.json");
        File::create(&path).unwrap().write_all(b"{\"backend\": \"tape\"}").unwrap();
        assert!(DirBenchConfig::load(&path).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = DirBenchConfig::default();
        config.backend = Backend::Host;
        config.host_path = Some(PathBuf::from("/mnt/test"));
        let json = serde_json::to_string(&config).unwrap();
        let back: DirBenchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
