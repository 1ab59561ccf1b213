use fs::{DirVisitor, Ino};
use std::error::Error;
use std::fmt;

/// Something the enumerator reported that the collector cannot accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectorFault {
    /// More entries than the buffer was sized for.
    Overflow { capacity: usize, rejected: String },
    EmptyName { position: usize },
}

impl fmt::Display for CollectorFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CollectorFault::Overflow { capacity, ref rejected } => write!(
                f,
                "enumeration produced more than {} entries (rejected {:?})",
                capacity, rejected
            ),
            CollectorFault::EmptyName { position } => {
                write!(f, "enumeration produced an empty name at position {}", position)
            }
        }
    }
}

impl Error for CollectorFault {}

/// Buffers the names a directory enumeration reports, in the order they
/// arrive.
///
/// The buffer never grows past the capacity given at construction. An
/// entry beyond it, or an empty name, stops the enumeration and is
/// returned as a fault from `finish`.
pub struct EnumerationCollector {
    names: Vec<String>,
    capacity: usize,
    stop_after: Option<usize>,
    fault: Option<CollectorFault>,
}

impl EnumerationCollector {
    pub fn new(capacity: usize) -> EnumerationCollector {
        EnumerationCollector {
            names: Vec::with_capacity(capacity),
            capacity: capacity,
            stop_after: None,
            fault: None,
        }
    }

    /// Ask the enumerator to stop once `count` entries have been collected.
    pub fn stop_after(mut self, count: usize) -> EnumerationCollector {
        self.stop_after = Some(count);
        self
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes of name data collected so far.
    pub fn name_bytes(&self) -> usize {
        self.names.iter().map(|name| name.len()).sum()
    }

    /// Hands over the collected names, or the fault that cut the
    /// enumeration short.
    pub fn finish(self) -> Result<Vec<String>, CollectorFault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.names),
        }
    }
}

impl DirVisitor for EnumerationCollector {
    fn observe(&mut self, name: &str, _ino: Ino) -> bool {
        if self.fault.is_some() {
            return false;
        }
        if name.is_empty() {
            self.fault = Some(CollectorFault::EmptyName {
                position: self.names.len(),
            });
            return false;
        }
        if self.names.len() >= self.capacity {
            self.fault = Some(CollectorFault::Overflow {
                capacity: self.capacity,
                rejected: name.to_owned(),
            });
            return false;
        }
        self.names.push(name.to_owned());
        match self.stop_after {
            Some(limit) => self.names.len() < limit,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(collector: &mut EnumerationCollector, names: &[&str]) -> usize {
        let mut calls = 0;
        for (i, name) in names.iter().enumerate() {
            calls += 1;
            if !collector.observe(name, Ino(i as u64)) {
                break;
            }
        }
        calls
    }

    #[test]
    fn collects_in_arrival_order() {
        let mut collector = EnumerationCollector::new(4);
        assert_eq!(feed(&mut collector, &["3", "2", "4"]), 3);
        assert_eq!(collector.count(), 3);
        assert_eq!(collector.name_bytes(), 3);
        assert_eq!(collector.finish().unwrap(), vec!["3", "2", "4"]);
    }

    #[test]
    fn nothing_to_collect() {
        let collector = EnumerationCollector::new(1);
        assert_eq!(collector.count(), 0);
        assert!(collector.finish().unwrap().is_empty());
    }

    #[test]
    fn overflow_is_a_fault_not_a_truncation() {
        let mut collector = EnumerationCollector::new(2);
        assert_eq!(feed(&mut collector, &["a", "b", "c", "d"]), 3);
        assert_eq!(collector.count(), 2);
        assert_eq!(
            collector.finish(),
            Err(CollectorFault::Overflow {
                capacity: 2,
                rejected: "c".to_owned(),
            })
        );
    }

    #[test]
    fn empty_name_is_a_fault() {
        let mut collector = EnumerationCollector::new(4);
        assert_eq!(feed(&mut collector, &["a", "", "b"]), 2);
        assert_eq!(collector.finish(), Err(CollectorFault::EmptyName { position: 1 }));
    }

    #[test]
    fn stops_after_limit() {
        let mut collector = EnumerationCollector::new(10).stop_after(2);
        assert_eq!(feed(&mut collector, &["a", "b", "c"]), 2);
        assert_eq!(collector.finish().unwrap(), vec!["a", "b"]);
    }
}
