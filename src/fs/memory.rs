use super::{check_name, DirVisitor, EntryKind, Filesystem, FsError, Ino};
use rand::{Rng, SeedableRng, StdRng};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Order in which `MemFs` reports directory entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingOrder {
    /// Oldest entry first.
    Creation,
    /// Byte-wise by name, like a B-tree keyed on names.
    Lexical,
    /// A seeded permutation, like a hashed directory.
    Shuffled,
}

impl Default for ListingOrder {
    fn default() -> Self {
        ListingOrder::Creation
    }
}

impl FromStr for ListingOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creation" => Ok(ListingOrder::Creation),
            "lexical" => Ok(ListingOrder::Lexical),
            "shuffled" => Ok(ListingOrder::Shuffled),
            other => Err(format!("unknown listing order '{}'", other)),
        }
    }
}

impl fmt::Display for ListingOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            ListingOrder::Creation => "creation",
            ListingOrder::Lexical => "lexical",
            ListingOrder::Shuffled => "shuffled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Default)]
struct Directory {
    // insertion sequence -> (name, ino); iteration order is creation order
    entries: BTreeMap<u64, (String, Ino)>,
    by_name: HashMap<String, (u64, Ino)>,
    next_seq: u64,
}

impl Directory {
    fn insert(&mut self, name: &str, ino: Ino) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(seq, (name.to_owned(), ino));
        self.by_name.insert(name.to_owned(), (seq, ino));
    }

    fn remove(&mut self, name: &str) -> Option<Ino> {
        self.by_name.remove(name).map(|(seq, ino)| {
            self.entries.remove(&seq);
            ino
        })
    }
}

enum Node {
    File,
    Directory(Directory),
}

/// A filesystem held entirely in memory.
pub struct MemFs {
    nodes: HashMap<Ino, Node>,
    next_ino: u64,
    order: ListingOrder,
    seed: u64,
    max_name_len: usize,
}

const ROOT_INO: Ino = Ino(2);

// NAME_MAX on Linux
const DEFAULT_MAX_NAME_LEN: usize = 255;

impl MemFs {
    pub fn new() -> MemFs {
        MemFs::with_order(ListingOrder::Creation, 0)
    }

    pub fn with_order(order: ListingOrder, seed: u64) -> MemFs {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_INO, Node::Directory(Directory::default()));
        MemFs {
            nodes: nodes,
            next_ino: ROOT_INO.0 + 1,
            order: order,
            seed: seed,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }

    /// Caps the length of names this filesystem accepts.
    pub fn max_name_len(mut self, max_name_len: usize) -> MemFs {
        self.max_name_len = max_name_len;
        self
    }

    /// Number of live entries, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn dir(&self, ino: Ino) -> Result<&Directory, FsError> {
        match self.nodes.get(&ino) {
            Some(&Node::Directory(ref dir)) => Ok(dir),
            Some(&Node::File) => Err(FsError::NotADirectory),
            None => Err(FsError::StaleHandle(ino)),
        }
    }

    fn dir_mut(&mut self, ino: Ino) -> Result<&mut Directory, FsError> {
        match self.nodes.get_mut(&ino) {
            Some(&mut Node::Directory(ref mut dir)) => Ok(dir),
            Some(&mut Node::File) => Err(FsError::NotADirectory),
            None => Err(FsError::StaleHandle(ino)),
        }
    }

    fn check_name(&self, name: &str) -> Result<(), FsError> {
        check_name(name)?;
        if name.len() > self.max_name_len {
            return Err(FsError::InvalidName(name.to_owned()));
        }
        Ok(())
    }
}

impl Default for MemFs {
    fn default() -> Self {
        MemFs::new()
    }
}

impl Filesystem for MemFs {
    fn root(&self) -> Ino {
        ROOT_INO
    }

    fn create_entry(&mut self, parent: Ino, name: &str, kind: EntryKind) -> Result<Ino, FsError> {
        self.check_name(name)?;
        let ino = Ino(self.next_ino);
        {
            let dir = self.dir_mut(parent)?;
            if dir.by_name.contains_key(name) {
                return Err(FsError::AlreadyExists);
            }
            dir.insert(name, ino);
        }
        self.next_ino += 1;
        let node = match kind {
            EntryKind::File => Node::File,
            EntryKind::Directory => Node::Directory(Directory::default()),
        };
        self.nodes.insert(ino, node);
        Ok(ino)
    }

    fn delete_entry(&mut self, parent: Ino, name: &str) -> Result<(), FsError> {
        let ino = match self.dir(parent)?.by_name.get(name) {
            Some(&(_, ino)) => ino,
            None => return Err(FsError::NotFound),
        };
        if let Some(&Node::Directory(ref dir)) = self.nodes.get(&ino) {
            if !dir.entries.is_empty() {
                return Err(FsError::NotEmpty);
            }
        }
        self.dir_mut(parent)?.remove(name);
        self.nodes.remove(&ino);
        Ok(())
    }

    fn lookup(&mut self, parent: Ino, name: &str) -> Result<Ino, FsError> {
        match self.dir(parent)?.by_name.get(name) {
            Some(&(_, ino)) => Ok(ino),
            None => Err(FsError::NotFound),
        }
    }

    fn enumerate(&mut self, dir: Ino, visitor: &mut dyn DirVisitor) -> Result<(), FsError> {
        // Snapshot first so the visitor never sees a half-updated directory.
        let mut listing: Vec<(String, Ino)> = self.dir(dir)?.entries.values().cloned().collect();
        match self.order {
            ListingOrder::Creation => {}
            ListingOrder::Lexical => listing.sort_by(|a, b| a.0.cmp(&b.0)),
            ListingOrder::Shuffled => {
                let seed = [self.seed as usize, dir.0 as usize];
                let mut rng: StdRng = SeedableRng::from_seed(&seed[..]);
                rng.shuffle(&mut listing);
            }
        }
        for (name, ino) in listing {
            if !visitor.observe(&name, ino) {
                debug!("enumeration of {} stopped by visitor at {:?}", dir, name);
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(fs: &mut MemFs, dir: Ino) -> Vec<String> {
        let mut names = Vec::new();
        fs.enumerate(dir, &mut |name: &str, _ino: Ino| {
            names.push(name.to_owned());
            true
        }).unwrap();
        names
    }

    #[test]
    fn lists_in_creation_order() {
        let mut fs = MemFs::new();
        let root = fs.root();
        let dir = fs.create_entry(root, "Test_Dir", EntryKind::Directory).unwrap();
        for name in &["b", "c", "a"] {
            fs.create_entry(dir, name, EntryKind::File).unwrap();
        }
        assert_eq!(list(&mut fs, dir), vec!["b", "c", "a"]);
        assert_eq!(list(&mut fs, root), vec!["Test_Dir"]);
    }

    #[test]
    fn deleting_keeps_remaining_order() {
        let mut fs = MemFs::new();
        let root = fs.root();
        for name in &["1", "2", "3", "4"] {
            fs.create_entry(root, name, EntryKind::File).unwrap();
        }
        fs.delete_entry(root, "2").unwrap();
        fs.create_entry(root, "2", EntryKind::File).unwrap();
        assert_eq!(list(&mut fs, root), vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn lexical_and_shuffled_orders() {
        let names = ["10", "9", "2", "11"];
        let mut lexical = MemFs::with_order(ListingOrder::Lexical, 0);
        let root = lexical.root();
        for name in &names {
            lexical.create_entry(root, name, EntryKind::File).unwrap();
        }
        assert_eq!(list(&mut lexical, root), vec!["10", "11", "2", "9"]);

        let mut shuffled = MemFs::with_order(ListingOrder::Shuffled, 42);
        let root = shuffled.root();
        for name in &names {
            shuffled.create_entry(root, name, EntryKind::File).unwrap();
        }
        let first = list(&mut shuffled, root);
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["10", "11", "2", "9"]);
        // same seed, same permutation
        assert_eq!(list(&mut shuffled, root), first);
    }

    #[test]
    fn visitor_can_stop_early() {
        let mut fs = MemFs::new();
        let root = fs.root();
        for name in &["a", "b", "c"] {
            fs.create_entry(root, name, EntryKind::File).unwrap();
        }
        let mut calls = 0;
        fs.enumerate(root, &mut |_: &str, _: Ino| {
            calls += 1;
            false
        }).unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn errors() {
        let mut fs = MemFs::new().max_name_len(4);
        let root = fs.root();
        let dir = fs.create_entry(root, "d", EntryKind::Directory).unwrap();
        let file = fs.create_entry(dir, "f", EntryKind::File).unwrap();

        assert_eq!(fs.create_entry(dir, "f", EntryKind::File), Err(FsError::AlreadyExists));
        assert_eq!(
            fs.create_entry(dir, "12345", EntryKind::File),
            Err(FsError::InvalidName("12345".to_owned()))
        );
        assert_eq!(fs.create_entry(file, "x", EntryKind::File), Err(FsError::NotADirectory));
        assert_eq!(fs.lookup(dir, "missing"), Err(FsError::NotFound));
        assert_eq!(fs.delete_entry(root, "d"), Err(FsError::NotEmpty));

        fs.delete_entry(dir, "f").unwrap();
        assert_eq!(fs.delete_entry(dir, "f"), Err(FsError::NotFound));
        fs.delete_entry(root, "d").unwrap();
        assert_eq!(fs.lookup(dir, "f"), Err(FsError::StaleHandle(dir)));
        assert_eq!(fs.lookup(root, "d"), Err(FsError::NotFound));
        assert_eq!(fs.len(), 1);
    }
}
