//! Batch prediction over tabular CAN data.
//!
//! The batch path differs from the JSON path in one way: cells may be
//! missing. Missing cells in D5, D6 and D7 are filled with the median of
//! that column's present values over the current batch; the JSON path
//! requires all 8 values up front, so imputation never applies there.
//!
//! The frame keeps the original cell text untouched for output: the written
//! CSV is the input table plus one `Predicted_Class` column.

use crate::features::{slot_of, FEATURE_COLUMNS, FEATURE_COUNT, IMPUTED_COLUMNS};
use crate::models::inference::ModelBundle;
use anyhow::{Context, Result};
use csv::StringRecord;
use std::io;

/// An in-memory tabular batch with its parsed feature matrix.
#[derive(Debug)]
pub struct Frame {
    headers: StringRecord,
    /// Original records, preserved verbatim for the output file.
    rows: Vec<StringRecord>,
    /// Parsed D0..D7 values per row; missing cells are NaN until imputed.
    features: Vec<[f64; FEATURE_COUNT]>,
}

impl Frame {
    /// Read a whole CSV table into memory.
    ///
    /// All of D0..D7 must be present as columns; other columns are carried
    /// through untouched. Empty feature cells parse as missing; anything
    /// else non-numeric is an error.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let mut feature_indices = [0usize; FEATURE_COUNT];
        let mut missing = Vec::new();
        for (slot, column) in FEATURE_COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h == *column) {
                Some(index) => feature_indices[slot] = index,
                None => missing.push(*column),
            }
        }
        if !missing.is_empty() {
            anyhow::bail!("Input CSV is missing required columns: {}", missing.join(", "));
        }

        let mut rows = Vec::new();
        let mut features = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;

            let mut parsed = [f64::NAN; FEATURE_COUNT];
            for (slot, &index) in feature_indices.iter().enumerate() {
                let cell = record.get(index).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                parsed[slot] = cell.parse::<f64>().with_context(|| {
                    format!(
                        "Row {}: column {} value {:?} is not numeric",
                        line + 1,
                        FEATURE_COLUMNS[slot],
                        cell
                    )
                })?;
            }

            features.push(parsed);
            rows.push(record);
        }

        Ok(Self {
            headers,
            rows,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The parsed feature matrix, one D0..D7 row per record.
    pub fn feature_rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.features
    }

    /// Fill missing cells in D5, D6 and D7 with the per-column median of the
    /// present values in this batch. Each column is imputed independently; a
    /// column with no present values is left as-is.
    pub fn impute_median(&mut self) {
        for column in IMPUTED_COLUMNS {
            let Some(slot) = slot_of(column) else {
                continue;
            };

            let mut present: Vec<f64> = self
                .features
                .iter()
                .map(|row| row[slot])
                .filter(|v| !v.is_nan())
                .collect();

            if let Some(median) = median(&mut present) {
                for row in &mut self.features {
                    if row[slot].is_nan() {
                        row[slot] = median;
                    }
                }
            }
        }
    }

    /// Write the original table with one appended `Predicted_Class` column.
    pub fn write_augmented<W: io::Write>(&self, writer: W, predictions: &[i64]) -> Result<()> {
        if predictions.len() != self.rows.len() {
            anyhow::bail!(
                "Prediction count ({}) does not match row count ({})",
                predictions.len(),
                self.rows.len()
            );
        }

        let mut writer = csv::Writer::from_writer(writer);

        let mut headers = self.headers.clone();
        headers.push_field("Predicted_Class");
        writer.write_record(&headers)?;

        for (record, label) in self.rows.iter().zip(predictions) {
            let mut record = record.clone();
            record.push_field(&label.to_string());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Median with even-count interpolation (mean of the two middle values).
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Run one bundle over every row of the frame, preserving row order.
pub fn predict_frame(frame: &Frame, bundle: &ModelBundle) -> Result<Vec<i64>> {
    frame
        .feature_rows()
        .iter()
        .map(|row| bundle.predict_row(row))
        .collect()
}
