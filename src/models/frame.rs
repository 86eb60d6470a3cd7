use crate::error::{GSheetsError, Result};
use datafusion::arrow::csv::reader::Format;
use datafusion::arrow::csv::{ReaderBuilder, WriterBuilder};
use datafusion::arrow::datatypes::{Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::display::{ArrayFormatter, FormatOptions};
use datafusion::arrow::util::pretty::pretty_format_batches;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

// Rows sampled for type inference when not overridden.
const DEFAULT_INFER_ROWS: usize = 1000;

/// Options applied when parsing CSV text into a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CsvOptions {
    /// Treat the first row as column names.
    pub has_header: bool,
    /// Keep only these columns, by zero-based index.
    pub usecols: Option<Vec<usize>>,
    /// Keep at most this many data rows.
    pub nrows: Option<usize>,
    /// Number of rows sampled to infer column types.
    pub infer_rows: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            usecols: None,
            nrows: None,
            infer_rows: None,
        }
    }
}

/// In-memory table returned by every read and query.
#[derive(Debug, Clone)]
pub struct Frame {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Frame {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(Arc::new(Schema::empty()), Vec::new())
    }

    /// Parse CSV text, inferring column types from the first rows.
    pub fn from_csv(data: &[u8], options: &CsvOptions) -> Result<Self> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }

        let infer_rows = options.infer_rows.unwrap_or(DEFAULT_INFER_ROWS);
        let (schema, _) = Format::default()
            .with_header(options.has_header)
            .infer_schema(Cursor::new(data), Some(infer_rows))?;
        let schema = Arc::new(unique_field_names(&schema));

        let mut builder = ReaderBuilder::new(schema.clone()).with_header(options.has_header);
        let schema = match &options.usecols {
            Some(indices) => {
                let projected = Arc::new(schema.project(indices)?);
                builder = builder.with_projection(indices.clone());
                projected
            }
            None => schema,
        };

        let reader = builder.build(Cursor::new(data))?;

        let mut batches = Vec::new();
        let mut remaining = options.nrows;
        for batch in reader {
            let batch = batch?;
            match remaining {
                Some(0) => break,
                Some(n) => {
                    let take = n.min(batch.num_rows());
                    remaining = Some(n - take);
                    batches.push(batch.slice(0, take));
                }
                None => batches.push(batch),
            }
        }

        Ok(Self::new(schema, batches))
    }

    /// Convert rows of cell values (first row as headers) to a frame.
    ///
    /// Rows returned by the Sheets API omit trailing empty cells, so short
    /// rows are padded to the widest row before parsing.
    pub fn from_sheet_rows(rows: &[Vec<String>], options: &CsvOptions) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or_default();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);

        for row in rows {
            let mut row_vec = row.clone();
            row_vec.resize(width, String::new());
            writer.write_record(&row_vec)?;
        }

        let data = writer
            .into_inner()
            .map_err(|e| GSheetsError::Sheets(format!("Failed to get CSV data: {}", e)))?;

        Self::from_csv(&data, options)
    }

    /// Convert the frame to rows of strings, always including headers.
    pub fn to_sheet_rows(&self) -> Result<Vec<Vec<String>>> {
        let mut rows = vec![self.column_names()];
        let options = FormatOptions::default();

        for batch in &self.batches {
            let formatters = batch
                .columns()
                .iter()
                .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for row in 0..batch.num_rows() {
                rows.push(
                    formatters
                        .iter()
                        .map(|formatter| formatter.value(row).to_string())
                        .collect(),
                );
            }
        }

        Ok(rows)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().with_header(true).build(writer);
        for batch in &self.batches {
            writer.write(batch)?;
        }
        Ok(())
    }

    /// Render as an ASCII table.
    pub fn pretty(&self) -> Result<String> {
        Ok(pretty_format_batches(&self.batches)?.to_string())
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn into_parts(self) -> (SchemaRef, Vec<RecordBatch>) {
        (self.schema, self.batches)
    }
}

/// Rename blank and repeated header cells so every column can be addressed.
///
/// A blank header at position `i` becomes `Unnamed: i`, and repeats of a name
/// get a numeric suffix (`births`, `births.1`, ...).
fn unique_field_names(schema: &Schema) -> Schema {
    let mut seen = HashSet::new();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let base = match field.name().trim() {
                "" => format!("Unnamed: {}", index),
                _ => field.name().to_string(),
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }

            field.as_ref().clone().with_name(name)
        })
        .collect();

    Schema::new_with_metadata(fields, schema.metadata().clone())
}

#[cfg(test)]
pub(crate) mod test_helpers {
    /// First rows of the public births example spreadsheet.
    pub(crate) const BIRTHS_CSV: &str = "date,births\n\
        1/1/1975,265775\n\
        2/1/1975,241045\n\
        3/1/1975,268849\n\
        4/1/1975,247455\n\
        5/1/1975,254545\n";

    /// Second worksheet of the same spreadsheet.
    pub(crate) const BIRTHS_EXAMPLE_2_CSV: &str = "date,births\n\
        1/1/1975,1000000\n\
        2/1/1975,2000000\n";

    pub(crate) fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect()
    }
}
