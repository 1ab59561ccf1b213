use ledger::NameLedger;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Ledger slot where enumerated entries start; slot 0 is the container,
/// which never lists itself.
pub const FIRST_ENTRY: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum VerificationError {
    CountMismatch { expected: usize, actual: usize },
    OrderMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    MissingEntry { name: String },
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VerificationError::CountMismatch { expected, actual } => {
                write!(f, "expected {} entries, enumerated {}", expected, actual)
            }
            VerificationError::OrderMismatch {
                index,
                ref expected,
                ref actual,
            } => write!(
                f,
                "entry {} out of order: expected {:?}, enumerated {:?}",
                index, expected, actual
            ),
            VerificationError::MissingEntry { ref name } => write!(f, "entry {:?} was not enumerated", name),
        }
    }
}

impl Error for VerificationError {}

/// How enumerated names are matched against the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// Entry `i` must be the `i`-th name created. Only holds for backends
    /// that list in creation order.
    Positional,
    /// Same names, any order.
    Unordered,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        OrderPolicy::Positional
    }
}

impl FromStr for OrderPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positional" => Ok(OrderPolicy::Positional),
            "unordered" => Ok(OrderPolicy::Unordered),
            other => Err(format!("unknown order policy '{}'", other)),
        }
    }
}

fn expected_entries(expected: &NameLedger, start: usize) -> &[String] {
    let names = expected.as_slice();
    if start >= names.len() {
        &names[names.len()..]
    } else {
        &names[start..]
    }
}

fn check_count(collected: &[String], wanted: &[String]) -> Result<(), VerificationError> {
    if collected.len() != wanted.len() {
        return Err(VerificationError::CountMismatch {
            expected: wanted.len(),
            actual: collected.len(),
        });
    }
    Ok(())
}

/// Checks that `collected` holds exactly the ledger names from `start` on,
/// in the same positions.
pub fn verify(collected: &[String], expected: &NameLedger, start: usize) -> Result<(), VerificationError> {
    let wanted = expected_entries(expected, start);
    check_count(collected, wanted)?;
    for (index, (actual, expected)) in collected.iter().zip(wanted).enumerate() {
        if actual != expected {
            return Err(VerificationError::OrderMismatch {
                index: index,
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}

/// Like `verify`, ignoring the order the entries were listed in.
pub fn verify_unordered(collected: &[String], expected: &NameLedger, start: usize) -> Result<(), VerificationError> {
    let wanted = expected_entries(expected, start);
    check_count(collected, wanted)?;
    let seen: HashSet<&str> = collected.iter().map(|s| s.as_str()).collect();
    match wanted.iter().find(|name| !seen.contains(name.as_str())) {
        Some(name) => Err(VerificationError::MissingEntry { name: name.clone() }),
        None => Ok(()),
    }
}

impl OrderPolicy {
    pub fn verify(&self, collected: &[String], expected: &NameLedger, start: usize) -> Result<(), VerificationError> {
        match *self {
            OrderPolicy::Positional => verify(collected, expected, start),
            OrderPolicy::Unordered => verify_unordered(collected, expected, start),
        }
    }
}
