//! Delimited batch input and annotated output.
//!
//! A batch is a header row plus data rows. Input must carry every column in
//! [`REQUIRED_COLUMNS`]. Output keeps the input columns in their original
//! order: feature columns carry their encoded values, the four coordinate
//! columns collapse into a single `distance` column, and any other column
//! passes through untouched. A trailing `Prediction` column is appended.

use crate::error::{Result, ScoringError};
use crate::feature_assembler::{AssembledRow, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::transaction::Transaction;
use crate::types::verdict::Verdict;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Columns a batch table must contain
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "merchant",
    "category",
    "amt",
    "lat",
    "long",
    "merch_lat",
    "merch_long",
    "hour",
    "day",
    "month",
    "gender",
    "cc_num",
];

/// Name of the verdict column appended to results
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Input columns replaced by the computed distance
const COORDINATE_COLUMNS: [&str; 4] = ["lat", "long", "merch_lat", "merch_long"];

const DISTANCE_COLUMN: &str = "distance";

/// Where an output cell comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputColumn {
    /// Index into `FEATURE_NAMES`
    Feature(usize),
    /// Index into the input row
    Source(usize),
}

/// Raw batch table as read from a delimited file.
#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TransactionTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV table. Every row must have as many cells as the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(String::from).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Read a CSV table from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Required columns absent from the header, in canonical order
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|col| !self.headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect()
    }

    /// Output columns in input order. A `distance` input column is
    /// overwritten in place; otherwise distance takes the slot of the first
    /// coordinate column. An input `Prediction` column is dropped.
    fn output_layout(&self) -> Vec<OutputColumn> {
        let feature_position = |name: &str| FEATURE_NAMES.iter().position(|f| *f == name);
        let mut distance_placed = self.headers.iter().any(|h| h == DISTANCE_COLUMN);
        let mut layout = Vec::with_capacity(self.headers.len());

        for (i, header) in self.headers.iter().enumerate() {
            if header == PREDICTION_COLUMN {
                continue;
            }
            if COORDINATE_COLUMNS.contains(&header.as_str()) {
                if !distance_placed {
                    if let Some(f) = feature_position(DISTANCE_COLUMN) {
                        layout.push(OutputColumn::Feature(f));
                    }
                    distance_placed = true;
                }
                continue;
            }
            match feature_position(header.as_str()) {
                Some(f) => layout.push(OutputColumn::Feature(f)),
                None => layout.push(OutputColumn::Source(i)),
            }
        }

        layout
    }

    fn column_index(&self) -> Result<HashMap<&'static str, usize>> {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(ScoringError::Schema { missing });
        }

        Ok(REQUIRED_COLUMNS
            .iter()
            .filter_map(|&col| self.headers.iter().position(|h| h == col).map(|i| (col, i)))
            .collect())
    }

    /// Parse every row into a transaction.
    ///
    /// Fails on the first missing column or unparsable cell; row numbers in
    /// errors count data rows from 1.
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        let index = self.column_index()?;

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cells = RowCells {
                    row,
                    index: &index,
                    row_number: i + 1,
                };
                let tx = cells.transaction()?;
                tx.validate_ranges().map_err(|e| match e {
                    ScoringError::Validation(msg) => {
                        ScoringError::Validation(format!("row {}: {}", i + 1, msg))
                    }
                    other => other,
                })?;
                Ok(tx)
            })
            .collect()
    }
}

struct RowCells<'a> {
    row: &'a [String],
    index: &'a HashMap<&'static str, usize>,
    row_number: usize,
}

impl RowCells<'_> {
    fn text(&self, column: &str) -> String {
        self.index
            .get(column)
            .and_then(|&i| self.row.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn number<T: FromStr>(&self, column: &str) -> Result<T> {
        let raw = self.text(column);
        raw.parse().map_err(|_| {
            ScoringError::Validation(format!(
                "row {}: column '{}' is not numeric: '{}'",
                self.row_number, column, raw
            ))
        })
    }

    fn transaction(&self) -> Result<Transaction> {
        Ok(Transaction {
            transaction_id: None,
            merchant: self.text("merchant"),
            category: self.text("category"),
            amt: self.number("amt")?,
            lat: self.number("lat")?,
            long: self.number("long")?,
            merch_lat: self.number("merch_lat")?,
            merch_long: self.number("merch_long")?,
            hour: self.number("hour")?,
            day: self.number("day")?,
            month: self.number("month")?,
            gender: self.text("gender"),
            cc_num: self.text("cc_num"),
        })
    }
}

/// One scored output row
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub row: AssembledRow,
    pub verdict: Verdict,
}

/// Assembled batch with one verdict per row, in input order.
///
/// Without a source table only the feature columns are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTable {
    layout: Vec<OutputColumn>,
    headers: Vec<String>,
    source_rows: Vec<Vec<String>>,
    rows: Vec<ScoredRow>,
}

impl ScoredTable {
    pub fn new(rows: Vec<ScoredRow>) -> Self {
        Self {
            layout: (0..FEATURE_COUNT).map(OutputColumn::Feature).collect(),
            headers: FEATURE_NAMES.iter().map(|h| h.to_string()).collect(),
            source_rows: Vec::new(),
            rows,
        }
    }

    /// Carry the columns of the table these rows were scored from, so the
    /// output lines up with the input.
    pub fn with_source(mut self, table: &TransactionTable) -> Self {
        self.layout = table.output_layout();
        self.headers = table.headers.clone();
        self.source_rows = table.rows.clone();
        self
    }

    pub fn rows(&self) -> &[ScoredRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn verdicts(&self) -> Vec<Verdict> {
        self.rows.iter().map(|r| r.verdict).collect()
    }

    pub fn fraudulent_count(&self) -> usize {
        self.rows.iter().filter(|r| r.verdict.is_fraudulent()).count()
    }

    /// Column names of the written table
    pub fn headers(&self) -> Vec<&str> {
        let mut headers: Vec<&str> = self
            .layout
            .iter()
            .map(|column| match *column {
                OutputColumn::Feature(f) => FEATURE_NAMES[f],
                OutputColumn::Source(i) => self.headers.get(i).map(String::as_str).unwrap_or(""),
            })
            .collect();
        headers.push(PREDICTION_COLUMN);
        headers
    }

    /// Write the annotated table as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;
        for (r, scored) in self.rows.iter().enumerate() {
            let features = scored.row.features.to_record();
            let source = self.source_rows.get(r);
            let mut record: Vec<&str> = self
                .layout
                .iter()
                .map(|column| match *column {
                    OutputColumn::Feature(f) => features[f].as_str(),
                    OutputColumn::Source(i) => source
                        .and_then(|cells| cells.get(i))
                        .map(String::as_str)
                        .unwrap_or(""),
                })
                .collect();
            record.push(scored.verdict.as_str());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
