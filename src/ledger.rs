use std::error::Error;
use std::fmt;
use std::ops::Index;

/// Name buffer size, terminator slot included. Names hold at most
/// `MAX_NAME_LEN - 1` bytes.
pub const MAX_NAME_LEN: usize = 16;

/// Name of the container a run creates under the root.
pub const DEFAULT_DIR_NAME: &'static str = "Test_Dir";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong(String),
    /// The index has no successor, so no name can be derived from it.
    IndexOverflow(usize),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NameError::Empty => write!(f, "empty entry name"),
            NameError::TooLong(ref name) => write!(
                f,
                "entry name {:?} is {} bytes, limit is {}",
                name,
                name.len(),
                MAX_NAME_LEN - 1
            ),
            NameError::IndexOverflow(index) => write!(f, "entry index {} is out of range", index),
        }
    }
}

impl Error for NameError {}

/// Name of the entry at ledger position `index` (1-based, 0 is the
/// container). Entry `i` is called `prefix` followed by `i + 1`.
pub fn entry_name(prefix: &str, index: usize) -> Result<String, NameError> {
    let number = index.checked_add(1).ok_or(NameError::IndexOverflow(index))?;
    let name = format!("{}{}", prefix, number);
    check_len(&name)?;
    Ok(name)
}

fn check_len(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        Err(NameError::Empty)
    } else if name.len() >= MAX_NAME_LEN {
        Err(NameError::TooLong(name.to_owned()))
    } else {
        Ok(())
    }
}

/// Names a run expects to find, in creation order. Slot 0 is the
/// container itself, slots `1..=n` are its entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NameLedger {
    names: Vec<String>,
}

impl NameLedger {
    pub fn new() -> NameLedger {
        NameLedger { names: Vec::new() }
    }

    /// Makes room for the container and `num_entries` entries.
    pub fn reserve(&mut self, num_entries: usize) -> Result<(), NameError> {
        let slots = num_entries
            .checked_add(1)
            .ok_or(NameError::IndexOverflow(num_entries))?;
        self.names.reserve(slots.saturating_sub(self.names.len()));
        Ok(())
    }

    pub fn push<S: Into<String>>(&mut self, name: S) -> Result<(), NameError> {
        let name = name.into();
        check_len(&name)?;
        self.names.push(name);
        Ok(())
    }

    pub fn container(&self) -> Option<&str> {
        self.names.first().map(|s| s.as_str())
    }

    /// Entry names, container excluded.
    pub fn entries(&self) -> &[String] {
        if self.names.is_empty() {
            &self.names[..]
        } else {
            &self.names[1..]
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Index<usize> for NameLedger {
    type Output = str;
    fn index(&self, index: usize) -> &str {
        &self.names[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_index_plus_one() {
        assert_eq!(entry_name("", 1).unwrap(), "2");
        assert_eq!(entry_name("", 1000).unwrap(), "1001");
        assert_eq!(entry_name("f_", 2).unwrap(), "f_3");
    }

    #[test]
    fn longest_name_fits_without_truncation() {
        // 13 + 2 = 15 bytes, one short of the buffer
        let name = entry_name("abcdefghijklm", 9).unwrap();
        assert_eq!(name, "abcdefghijklm10");
        assert_eq!(name.len(), MAX_NAME_LEN - 1);

        let err = entry_name("abcdefghijklm", 99).unwrap_err();
        assert_eq!(err, NameError::TooLong("abcdefghijklm100".to_owned()));
    }

    #[test]
    fn last_index_has_no_name() {
        let max = usize::max_value();
        assert_eq!(entry_name("", max), Err(NameError::IndexOverflow(max)));
        assert_eq!(entry_name("", max - 1), Err(NameError::TooLong(max.to_string())));
        assert_eq!(NameLedger::new().reserve(max), Err(NameError::IndexOverflow(max)));
    }

    #[test]
    fn ledger_layout() {
        let mut ledger = NameLedger::new();
        ledger.reserve(2).unwrap();
        assert_eq!(ledger.container(), None);
        assert!(ledger.entries().is_empty());

        ledger.push(DEFAULT_DIR_NAME).unwrap();
        ledger.push("2").unwrap();
        ledger.push("3").unwrap();
        assert_eq!(ledger.container(), Some("Test_Dir"));
        assert_eq!(ledger.entries(), &["2".to_owned(), "3".to_owned()][..]);
        assert_eq!(&ledger[2], "3");
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.push(""), Err(NameError::Empty));
        assert_eq!(ledger.len(), 3);
    }
}
