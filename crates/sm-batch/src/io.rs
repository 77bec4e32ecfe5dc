//! JSON source records and derived products
//!
//! Records are plain serialized `InMemoryRecord`s. Each committed channel
//! produces four files in the output directory:
//! `<channel>.acc.json`, `<channel>.vel.json`, `<channel>.dis.json` and
//! `<channel>.fas.json`. Every product carries the same header, whose
//! comment lines end with the baseline annotations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sm_core::{DataType, InMemoryRecord, RecordReader, SmError, SmResult, SourceRecord};
use sm_state::{ProductSet, ProductWriter};

/// Reads `InMemoryRecord` JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordReader;

impl JsonRecordReader {
    pub fn new() -> Self {
        Self
    }
}

impl RecordReader for JsonRecordReader {
    fn read(&self, path: &Path) -> SmResult<Arc<dyn SourceRecord>> {
        let content = fs::read_to_string(path)
            .map_err(|e| SmError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
        let mut record: InMemoryRecord = serde_json::from_str(&content)
            .map_err(|e| SmError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
        record.validate()?;
        if record.source_path.is_empty() {
            record.source_path = path.display().to_string();
        }
        log::debug!(
            "Read {} ({} samples) from {}",
            record.channel,
            record.samples.len(),
            path.display()
        );
        Ok(record.into_shared())
    }
}

/// Header shared by all products of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHeader {
    pub channel: String,
    pub source_path: String,
    pub start_time: String,
    pub delta_t: f64,
    pub event_onset: f64,
    pub low_corner: f64,
    pub high_corner: f64,
    /// Record comments followed by the baseline annotations
    pub comments: Vec<String>,
}

/// ACC, VEL or DIS product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceProduct {
    pub header: ProductHeader,
    pub data_type: DataType,
    pub samples: Vec<f64>,
}

impl TraceProduct {
    pub fn load<P: AsRef<Path>>(path: P) -> SmResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Fourier amplitude spectrum product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumProduct {
    pub header: ProductHeader,
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

/// Writes products as pretty JSON into one directory
#[derive(Debug, Clone)]
pub struct JsonProductWriter {
    out_dir: PathBuf,
}

impl JsonProductWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of a product file for `channel`
    pub fn product_path(&self, channel: &str, suffix: &str) -> PathBuf {
        self.out_dir.join(format!("{channel}.{suffix}.json"))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> SmResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl ProductWriter for JsonProductWriter {
    fn write_products(&self, products: &ProductSet<'_>) -> SmResult<Vec<String>> {
        fs::create_dir_all(&self.out_dir)?;

        let state = products.state;
        let meta = products.metadata;
        let (low_corner, high_corner) = state.filter_corners();

        let mut comments = meta.comments.clone();
        comments.extend(products.annotations.iter().cloned());
        let header = ProductHeader {
            channel: meta.channel.clone(),
            source_path: meta.source_path.clone(),
            start_time: meta.start_time.clone(),
            delta_t: state.delta_t(),
            event_onset: state.event_onset(),
            low_corner,
            high_corner,
            comments,
        };

        let mut lines = Vec::with_capacity(4);
        for data_type in DataType::ALL {
            let suffix = data_type.code().to_ascii_lowercase();
            let path = self.product_path(&meta.channel, &suffix);
            let product = TraceProduct {
                header: header.clone(),
                data_type,
                samples: state.trace(data_type).to_vec(),
            };
            self.write_json(&path, &product)?;
            lines.push(format!(
                "Wrote {} ({} samples)",
                path.display(),
                product.samples.len()
            ));
        }

        let path = self.product_path(&meta.channel, "fas");
        let spectrum = SpectrumProduct {
            header,
            frequencies: products.spectrum.frequencies.clone(),
            amplitudes: products.spectrum.amplitudes.clone(),
        };
        self.write_json(&path, &spectrum)?;
        lines.push(format!(
            "Wrote {} ({} frequencies)",
            path.display(),
            spectrum.frequencies.len()
        ));

        Ok(lines)
    }
}
