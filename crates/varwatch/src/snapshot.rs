//! Parsing of the kernel's textual variable listing.
//!
//! The listing is line oriented. The first two lines are a header and are
//! discarded. Each following line has the form
//!
//! ```text
//! name   typeTag   value preview, which may contain spaces
//! ```
//!
//! Lines with fewer than two fields are skipped, so parsing never fails.

use std::collections::BTreeMap;

/// Number of header lines preceding the variable rows.
const HEADER_LINES: usize = 2;

/// One variable in the kernel namespace.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariableRecord {
    /// Variable name (unique within a snapshot).
    pub name: String,
    /// Type tag reported by the kernel, e.g. `int` or `DataFrame`.
    pub type_tag: String,
    /// Rest of the line; free-form preview of the value.
    pub value_preview: String,
}

impl VariableRecord {
    /// Creates a record.
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        value_preview: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            value_preview: value_preview.into(),
        }
    }
}

/// Point-in-time mapping of variable name to record.
///
/// Produced in one piece from one kernel response and replaced wholesale
/// on the next; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: BTreeMap<String, VariableRecord>,
}

impl Snapshot {
    /// Parses a raw listing into a snapshot.
    ///
    /// # Example
    ///
    /// ```
    /// use varwatch::Snapshot;
    ///
    /// let raw = "Variable   Type   Data/Info\n\
    ///            --------------------------\n\
    ///            x          int    1\n\
    ///            msg        str    hello world\n";
    /// let snapshot = Snapshot::parse(raw);
    /// assert_eq!(snapshot.len(), 2);
    /// assert_eq!(snapshot.get("msg").unwrap().value_preview, "hello world");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let records = raw
            .lines()
            .skip(HEADER_LINES)
            .filter_map(parse_line)
            .map(|record| (record.name.clone(), record))
            .collect();
        Self { records }
    }

    /// Builds a snapshot from already-structured records.
    pub fn from_records(records: impl IntoIterator<Item = VariableRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
        }
    }

    /// Looks up a variable by name.
    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.records.get(name)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the namespace is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Variable names, in no meaningful order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Iterates over all records.
    pub fn records(&self) -> impl Iterator<Item = &VariableRecord> {
        self.records.values()
    }
}

fn parse_line(line: &str) -> Option<VariableRecord> {
    let line = line.trim_end();
    let (name, rest) = split_field(line)?;
    let (type_tag, rest) = split_field(rest)?;
    Some(VariableRecord::new(name, type_tag, rest.trim_start()))
}

/// Splits off the first whitespace-delimited field.
fn split_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}
