//! CSV ticket loading and schema validation.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

/// Columns every dataset must carry, by exact header name.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Ticket_ID",
    "Subject",
    "Description",
    "Category",
    "Priority",
    "Timestamp",
];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("Row {line}: category is empty")]
    MissingCategory { line: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One support ticket. `priority` and `timestamp` are carried but unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub priority: Option<String>,
    pub timestamp: Option<String>,
}

impl TicketRecord {
    /// Convenience constructor for in-memory records.
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: Some(subject.into()),
            description: Some(description.into()),
            category: category.into(),
            priority: None,
            timestamp: None,
        }
    }

    /// The text field of this ticket, see [`build_text`].
    pub fn text(&self) -> String {
        build_text(self.subject.as_deref(), self.description.as_deref())
    }
}

/// Builds the single text field a ticket is classified on: subject and
/// description joined by one space, missing parts treated as empty, and the
/// result trimmed. Training and inference both go through this function.
pub fn build_text(subject: Option<&str>, description: Option<&str>) -> String {
    format!("{} {}", subject.unwrap_or(""), description.unwrap_or(""))
        .trim()
        .to_string()
}

/// An ordered collection of tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<TicketRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<TicketRecord>) -> Self {
        Self { records }
    }

    /// Loads and validates a CSV file with a header row.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        info!("Loading dataset from {}", path.display());
        let dataset = Self::from_reader(File::open(path)?)?;
        info!("Loaded {} tickets", dataset.len());
        Ok(dataset)
    }

    /// Reads CSV from any source. The header is validated before any row is read.
    ///
    /// Rows shorter than the header are accepted; their trailing cells read as missing.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::Schema { missing });
        }

        // All present, checked above.
        let column = |name: &str| position(name).unwrap_or_default();
        let (id_col, subject_col, description_col) =
            (column("Ticket_ID"), column("Subject"), column("Description"));
        let (category_col, priority_col, timestamp_col) =
            (column("Category"), column("Priority"), column("Timestamp"));

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let field = |idx: usize| row.get(idx).filter(|v| !v.is_empty()).map(str::to_string);

            let category = match field(category_col) {
                Some(category) if !category.trim().is_empty() => category,
                _ => {
                    let line = row.position().map(|p| p.line()).unwrap_or_default();
                    return Err(DatasetError::MissingCategory { line });
                }
            };

            records.push(TicketRecord {
                id: field(id_col).unwrap_or_default(),
                subject: field(subject_col),
                description: field(description_col),
                category,
                priority: field(priority_col),
                timestamp: field(timestamp_col),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[TicketRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TicketRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One text field per record, in record order.
    pub fn text_fields(&self) -> Vec<String> {
        self.records.iter().map(TicketRecord::text).collect()
    }

    /// Category of each record, in record order.
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.category.as_str()).collect()
    }

    /// Sorted distinct categories.
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
