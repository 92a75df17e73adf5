//! Output encoding: chunk shapes, compression and provenance.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sst_common::{BoundingBox, CfTimeUnits};

use crate::config::{OutputEncoding, ProvenanceConfig};
use crate::subset::SubsetDataset;

/// Attributes describing packing or fill; values are stored decoded, so
/// these never carry over to the output.
const DROPPED_ATTRIBUTES: &[&str] = &[
    "scale_factor",
    "add_offset",
    "_FillValue",
    "missing_value",
    "valid_min",
    "valid_max",
    "valid_range",
];

/// Output chunk shape: (min(time_chunk, nt), min(cap, nlat), min(cap, nlon)),
/// never smaller than 1 along any axis.
pub fn output_chunk_shape(shape: [usize; 3], time_chunk: usize, cap: usize) -> [usize; 3] {
    [
        time_chunk.min(shape[0]).max(1),
        cap.min(shape[1]).max(1),
        cap.min(shape[2]).max(1),
    ]
}

/// How one data variable is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableEncoding {
    pub name: String,
    pub chunk_shape: [usize; 3],
    /// zlib level.
    pub compression_level: i32,
    pub shuffle: bool,
    /// String attributes carried over from the inputs.
    pub attributes: BTreeMap<String, String>,
}

/// Global metadata of the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub title: String,
    pub created_from: String,
    pub spatial_subset: String,
    pub creation_date: String,
    pub source_dataset: String,
    pub processing_method: String,
    pub buffer_degrees: f64,
}

impl Provenance {
    pub fn new(
        config: &ProvenanceConfig,
        file_count: usize,
        bounds: &BoundingBox,
        buffer_degrees: f64,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            title: config.title.clone(),
            created_from: format!("{} {} files", file_count, config.input_description),
            spatial_subset: bounds.describe(),
            creation_date: created.format("%Y-%m-%d %H:%M:%S").to_string(),
            source_dataset: config.source_dataset.clone(),
            processing_method: config.processing_method.clone(),
            buffer_degrees,
        }
    }

    /// String-valued global attributes, in write order.
    pub fn string_attributes(&self) -> [(&'static str, &str); 6] {
        [
            ("title", self.title.as_str()),
            ("created_from", self.created_from.as_str()),
            ("spatial_subset", self.spatial_subset.as_str()),
            ("creation_date", self.creation_date.as_str()),
            ("source_dataset", self.source_dataset.as_str()),
            ("processing_method", self.processing_method.as_str()),
        ]
    }
}

/// Everything the writer needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodingPlan {
    pub variables: Vec<VariableEncoding>,
    pub provenance: Provenance,
    pub time_units: CfTimeUnits,
}

impl EncodingPlan {
    /// Plan storage for every data variable of `subset`.
    pub fn new(subset: &SubsetDataset, encoding: &OutputEncoding, provenance: Provenance) -> Self {
        let chunk_shape = output_chunk_shape(
            subset.shape(),
            encoding.time_chunk,
            encoding.spatial_chunk_cap,
        );

        let variables = subset
            .source
            .variables
            .iter()
            .map(|var| VariableEncoding {
                name: var.name.clone(),
                chunk_shape,
                compression_level: encoding.compression_level,
                shuffle: encoding.shuffle,
                attributes: var
                    .attributes
                    .iter()
                    .filter(|(k, _)| !DROPPED_ATTRIBUTES.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();

        Self {
            variables,
            provenance,
            time_units: subset.source.dataset.time_units,
        }
    }
}
