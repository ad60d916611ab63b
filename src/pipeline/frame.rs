// src/pipeline/frame.rs
//
// Columnar hand-off to the chart layer. Every frame is one Arrow batch whose
// column names are the chart's column mapping.

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array},
    datatypes::{DataType, Field, Schema},
    ipc::writer::FileWriter,
    record_batch::RecordBatch,
};
use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::summary::{LabeledTable, MeanValue, ScatterPoint, SummaryTable};
use super::DashboardSummaries;
use crate::error::{DashboardError, Result};

pub const KEY: &str = "key";
pub const LABEL: &str = "label";
pub const COUNT: &str = "count";
pub const MEAN: &str = "mean";
pub const HAS_DATA: &str = "has_data";
pub const PRESCRIBER: &str = "prescriber_category_code";
pub const BOXES: &str = "box_count";

pub trait ChartFrame {
    fn to_record_batch(&self) -> Result<RecordBatch>;
}

fn batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

impl<K: Display> ChartFrame for SummaryTable<K, u64> {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let keys: StringArray = self.rows().iter().map(|r| Some(r.key.to_string())).collect();
        let counts = UInt64Array::from_iter_values(self.rows().iter().map(|r| r.value));
        batch(
            vec![
                Field::new(KEY, DataType::Utf8, false),
                Field::new(COUNT, DataType::UInt64, false),
            ],
            vec![Arc::new(keys), Arc::new(counts)],
        )
    }
}

impl<K: Display> ChartFrame for LabeledTable<K, u64> {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let keys: StringArray = self.rows().iter().map(|r| Some(r.key.to_string())).collect();
        let labels: StringArray = self.rows().iter().map(|r| Some(r.label.as_str())).collect();
        let counts = UInt64Array::from_iter_values(self.rows().iter().map(|r| r.value));
        batch(
            vec![
                Field::new(KEY, DataType::Utf8, false),
                Field::new(LABEL, DataType::Utf8, false),
                Field::new(COUNT, DataType::UInt64, false),
            ],
            vec![Arc::new(keys), Arc::new(labels), Arc::new(counts)],
        )
    }
}

/// `mean` is null for a `NoData` group and `has_data` says so explicitly.
impl<K: Display> ChartFrame for SummaryTable<K, MeanValue> {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let keys: StringArray = self.rows().iter().map(|r| Some(r.key.to_string())).collect();
        let means: Float64Array = self.rows().iter().map(|r| r.value.value()).collect();
        let has_data: BooleanArray = self
            .rows()
            .iter()
            .map(|r| Some(r.value != MeanValue::NoData))
            .collect();
        batch(
            vec![
                Field::new(KEY, DataType::Utf8, false),
                Field::new(MEAN, DataType::Float64, true),
                Field::new(HAS_DATA, DataType::Boolean, false),
            ],
            vec![Arc::new(keys), Arc::new(means), Arc::new(has_data)],
        )
    }
}

impl ChartFrame for [ScatterPoint] {
    fn to_record_batch(&self) -> Result<RecordBatch> {
        let codes = Int64Array::from_iter_values(self.iter().map(|p| p.prescriber_category_code));
        let boxes = UInt64Array::from_iter_values(self.iter().map(|p| p.box_count));
        batch(
            vec![
                Field::new(PRESCRIBER, DataType::Int64, false),
                Field::new(BOXES, DataType::UInt64, false),
            ],
            vec![Arc::new(codes), Arc::new(boxes)],
        )
    }
}

impl DashboardSummaries {
    /// One named frame per chart, in page order.
    pub fn chart_frames(&self) -> Result<Vec<(&'static str, RecordBatch)>> {
        Ok(vec![
            ("gender_distribution", self.gender_distribution.to_record_batch()?),
            ("age_histogram", self.age_histogram.to_record_batch()?),
            ("category_by_age", self.category_by_age.to_record_batch()?),
            ("region_distribution", self.region_distribution.to_record_batch()?),
            ("prescriber_scatter", self.prescriber_scatter.as_slice().to_record_batch()?),
            ("refund_mean_by_age", self.refund_mean_by_age.to_record_batch()?),
        ])
    }

    /// Write every chart frame to `<dir>/<name>.arrow` (Arrow IPC file format).
    pub fn write_ipc_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|e| output_err(dir, e))?;
        let mut written = Vec::new();
        for (name, batch) in self.chart_frames()? {
            let path = dir.join(format!("{}.arrow", name));
            let file = File::create(&path).map_err(|e| output_err(&path, e))?;
            let mut writer = FileWriter::try_new(file, &batch.schema())?;
            writer.write(&batch)?;
            writer.finish()?;
            info!(path = %path.display(), rows = batch.num_rows(), "wrote chart frame");
            written.push(path);
        }
        Ok(written)
    }
}

fn output_err(path: &Path, source: std::io::Error) -> DashboardError {
    DashboardError::Output {
        path: path.display().to_string(),
        source,
    }
}
