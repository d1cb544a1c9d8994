//! Sinks persisting the records of a run.

use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use vws_crawler::EntityRecord;

/// Persists a whole record set at once.
pub trait Sink {
    /// Writes one entry per record, `columns` lists every column in output order.
    fn write(&self, records: &[EntityRecord], columns: &[String]) -> anyhow::Result<()>;
}

/// `category`, `name`, then the sorted union of the record fields.
pub fn columns(records: &[EntityRecord]) -> Vec<String> {
    let fields: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.fields.keys().map(String::as_str))
        .collect();

    [EntityRecord::CATEGORY, EntityRecord::NAME]
        .into_iter()
        .chain(fields)
        .map(String::from)
        .collect()
}

/// CSV flavour of the tabular output, the `csv` section of the crawler yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvDialect {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    /// Escapes quotes with this character instead of doubling them
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default)]
    pub line_ending: LineEnding,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: default_csv_delimiter(),
            escape: None,
            line_ending: LineEnding::default(),
        }
    }
}

fn default_csv_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl CsvDialect {
    /// The csv writer only handles single byte separators.
    pub fn check(&self) -> anyhow::Result<()> {
        for (what, c) in [("delimiter", Some(self.delimiter)), ("escape", self.escape)] {
            if let Some(c) = c {
                anyhow::ensure!(c.is_ascii(), "CSV {what} must be an ASCII character, got {c:?}");
            }
        }
        Ok(())
    }

    fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter as u8);
        builder.terminator(match self.line_ending {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::Crlf => csv::Terminator::CRLF,
        });
        match self.escape {
            Some(escape) => builder.double_quote(false).escape(escape as u8),
            None => builder.double_quote(true),
        };
        builder
    }
}

/// One row per record under a header row, absent fields are empty cells.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    dialect: CsvDialect,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_dialect(path, CsvDialect::default())
    }

    pub fn with_dialect(path: impl Into<PathBuf>, dialect: CsvDialect) -> Self {
        Self {
            path: path.into(),
            dialect,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for CsvSink {
    fn write(&self, records: &[EntityRecord], columns: &[String]) -> anyhow::Result<()> {
        self.dialect.check()?;
        let file = fs::File::create(&self.path)?;
        let mut wtr = self.dialect.writer_builder().from_writer(file);

        wtr.write_record(columns)?;
        for record in records {
            wtr.write_record(
                columns
                    .iter()
                    .map(|column| record.get(column).unwrap_or_default()),
            )?;
        }
        wtr.flush()
            .with_context(|| format!("Couldn't flush {}", self.path.display()))?;

        log::info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// A pretty printed array of flat objects.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for JsonSink {
    /// Objects only carry the fields their record has, `columns` is unused.
    fn write(&self, records: &[EntityRecord], _columns: &[String]) -> anyhow::Result<()> {
        let mut wtr = BufWriter::new(fs::File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut wtr, records)?;
        wtr.flush()?;

        log::info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
