//! Configuration for the merge engine.
//!
//! A [`MergeConfig`] is built once (defaults, environment or YAML) and passed
//! explicitly into the pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Prefix of every environment variable read by [`MergeConfig::from_env`].
pub const ENV_PREFIX: &str = "SST_MERGE_";

/// Configuration for a merge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Name of the concatenation dimension and its coordinate variable.
    pub time_dimension: String,

    /// Compute chunk shape.
    pub chunk_policy: ChunkPolicy,

    /// Upper bound on the bytes of one compute chunk.
    pub max_chunk_bytes: u64,

    /// Output chunking and compression.
    pub output: OutputEncoding,

    /// Chunks evaluated in parallel per wave.
    pub workers: usize,

    /// Optional ceiling on chunk-buffer memory, in megabytes.
    pub memory_limit_mb: Option<u64>,

    pub feasibility: FeasibilityConfig,

    /// Expected spacing of the time axis, in seconds.
    pub sampling_interval_secs: i64,

    pub discovery: DiscoveryConfig,

    pub provenance: ProvenanceConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            time_dimension: "time".to_string(),
            chunk_policy: ChunkPolicy::default(),
            max_chunk_bytes: 256 * MIB,
            output: OutputEncoding::default(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            memory_limit_mb: None,
            feasibility: FeasibilityConfig::default(),
            sampling_interval_secs: 86_400,
            discovery: DiscoveryConfig::default(),
            provenance: ProvenanceConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Load configuration from `SST_MERGE_*` environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Keys are the full variable names, e.g. `SST_MERGE_WORKERS`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        // Values that do not fit the target field are ignored like unparsable ones.
        let parse = |suffix: &str| get(suffix).and_then(|v| v.trim().parse::<u64>().ok());
        let count = |suffix: &str| parse(suffix).and_then(|n| usize::try_from(n).ok());
        let flag = |suffix: &str| {
            get(suffix).map(|v| {
                let v = v.to_lowercase();
                v == "true" || v == "1"
            })
        };

        let mut config = Self::default();

        if let Some(val) = get("TIME_DIMENSION") {
            config.time_dimension = val;
        }
        if let Some(n) = count("CHUNK_TIME") {
            config.chunk_policy.time = n;
        }
        if let Some(n) = count("CHUNK_ROWS") {
            config.chunk_policy.rows = n;
        }
        if let Some(n) = count("CHUNK_COLS") {
            config.chunk_policy.cols = n;
        }
        if let Some(mb) = parse("MAX_CHUNK_MB") {
            if let Some(bytes) = mb.checked_mul(MIB) {
                config.max_chunk_bytes = bytes;
            }
        }
        if let Some(n) = count("OUTPUT_TIME_CHUNK") {
            config.output.time_chunk = n;
        }
        if let Some(n) = count("OUTPUT_CHUNK_CAP") {
            config.output.spatial_chunk_cap = n;
        }
        if let Some(level) = parse("COMPRESSION_LEVEL").and_then(|n| i32::try_from(n).ok()) {
            config.output.compression_level = level;
        }
        if let Some(shuffle) = flag("SHUFFLE") {
            config.output.shuffle = shuffle;
        }
        if let Some(n) = count("WORKERS") {
            config.workers = n;
        }
        if let Some(mb) = parse("MEMORY_LIMIT_MB").filter(|mb| mb.checked_mul(MIB).is_some()) {
            config.memory_limit_mb = Some(mb);
        }
        if let Some(n) = count("FEASIBILITY_SAMPLES") {
            config.feasibility.sample_count = n;
        }
        if let Some(gb) = parse("MAX_TOTAL_GB") {
            if let Some(bytes) = gb.checked_mul(GIB) {
                config.feasibility.max_total_bytes = bytes;
            }
        }
        if let Some(secs) = parse("SAMPLING_INTERVAL_SECS").and_then(|n| i64::try_from(n).ok()) {
            config.sampling_interval_secs = secs;
        }
        if let Some(val) = get("FILE_MARKER") {
            config.discovery.name_contains = val;
        }
        if let Some(val) = get("FILE_EXTENSION") {
            config.discovery.extension = val.trim_start_matches('.').to_string();
        }
        if let Some(val) = get("TITLE") {
            config.provenance.title = val;
        }
        if let Some(val) = get("SOURCE_DATASET") {
            config.provenance.source_dataset = val;
        }

        config
    }

    /// Load configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text)
            .map_err(|e| MergeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.time_dimension.is_empty() {
            return Err("time_dimension must not be empty".to_string());
        }

        self.chunk_policy.validate()?;

        if self.output.time_chunk == 0 || self.output.spatial_chunk_cap == 0 {
            return Err("output chunk sizes must be > 0".to_string());
        }

        if !(0..=9).contains(&self.output.compression_level) {
            return Err("compression_level must be 0-9".to_string());
        }

        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        if self.memory_limit_mb == Some(0) {
            return Err("memory_limit_mb must be > 0 when set".to_string());
        }

        if self.feasibility.sample_count == 0 {
            return Err("feasibility.sample_count must be > 0".to_string());
        }

        if self.sampling_interval_secs <= 0 {
            return Err("sampling_interval_secs must be > 0".to_string());
        }
        if chrono::Duration::try_seconds(self.sampling_interval_secs).is_none() {
            return Err("sampling_interval_secs is out of range".to_string());
        }

        if self.discovery.extension.is_empty() {
            return Err("discovery.extension must not be empty".to_string());
        }

        Ok(())
    }

    /// Sampling interval as a chrono duration.
    pub fn sampling_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.sampling_interval_secs)
    }

    /// Memory limit in bytes, if any.
    pub fn memory_limit_bytes(&self) -> Option<u64> {
        self.memory_limit_mb.map(|mb| mb.saturating_mul(MIB))
    }

    /// Estimated peak chunk-buffer memory: two chunks in flight per worker.
    pub fn estimated_peak_bytes(&self) -> u64 {
        self.workers as u64 * self.chunk_policy.chunk_bytes() * 2
    }
}

/// Maximum extent of a compute chunk along (time, row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPolicy {
    pub time: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            time: 30,
            rows: 200,
            cols: 200,
        }
    }
}

impl ChunkPolicy {
    pub fn new(time: usize, rows: usize, cols: usize) -> Self {
        Self { time, rows, cols }
    }

    /// Bytes of one full chunk of `f32` values.
    pub fn chunk_bytes(&self) -> u64 {
        (self.time as u64) * (self.rows as u64) * (self.cols as u64) * 4
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.time == 0 || self.rows == 0 || self.cols == 0 {
            return Err(format!("chunk policy {} has a zero extent", self));
        }
        Ok(())
    }
}

impl std::fmt::Display for ChunkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.time, self.rows, self.cols)
    }
}

/// Output chunking and compression for data variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputEncoding {
    /// Time extent of an output chunk (capped by the time axis length).
    pub time_chunk: usize,
    /// Cap on the lat and lon extents of an output chunk.
    pub spatial_chunk_cap: usize,
    /// zlib level (0-9).
    pub compression_level: i32,
    pub shuffle: bool,
}

impl Default for OutputEncoding {
    fn default() -> Self {
        Self {
            time_chunk: 30,
            spatial_chunk_cap: 100,
            compression_level: 1,
            shuffle: true,
        }
    }
}

/// Feasibility gate settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityConfig {
    /// Files opened from the head of the list.
    pub sample_count: usize,
    /// Largest accepted estimate of the total input size.
    pub max_total_bytes: u64,
}

impl Default for FeasibilityConfig {
    fn default() -> Self {
        Self {
            sample_count: 3,
            max_total_bytes: 500 * GIB,
        }
    }
}

/// Which directory entries count as input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Substring the file name must contain.
    pub name_contains: String,
    /// File extension without the dot.
    pub extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name_contains: "OSTIA".to_string(),
            extension: "nc".to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// Whether a file name matches the filter.
    pub fn matches(&self, file_name: &str) -> bool {
        let ext_ok = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false);
        ext_ok && file_name.contains(&self.name_contains)
    }
}

/// Fixed strings written into the output's global attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub title: String,
    /// Describes the inputs in `created_from`, e.g. "{n} global OSTIA files".
    pub input_description: String,
    pub source_dataset: String,
    pub processing_method: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            title: "OSTIA L4 SST Analysis - Spatially Subsetted".to_string(),
            input_description: "global OSTIA".to_string(),
            source_dataset: "OSTIA L4 GHRSST Global".to_string(),
            processing_method: "global merge + spatial subset".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = MergeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_policy, ChunkPolicy::new(30, 200, 200));
        assert_eq!(config.chunk_policy.chunk_bytes(), 30 * 200 * 200 * 4);
        assert_eq!(config.feasibility.max_total_bytes, 500 * 1024 * 1024 * 1024);
        assert_eq!(config.output.compression_level, 1);
        assert!(config.output.shuffle);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = MergeConfig::from_lookup(lookup(&[
            ("SST_MERGE_CHUNK_TIME", "10"),
            ("SST_MERGE_CHUNK_ROWS", "100"),
            ("SST_MERGE_WORKERS", "2"),
            ("SST_MERGE_MEMORY_LIMIT_MB", "512"),
            ("SST_MERGE_SHUFFLE", "false"),
            ("SST_MERGE_FILE_EXTENSION", ".nc4"),
            ("SST_MERGE_MAX_TOTAL_GB", "100"),
        ]));
        assert_eq!(config.chunk_policy, ChunkPolicy::new(10, 100, 200));
        assert_eq!(config.workers, 2);
        assert_eq!(config.memory_limit_bytes(), Some(512 * 1024 * 1024));
        assert!(!config.output.shuffle);
        assert_eq!(config.discovery.extension, "nc4");
        assert_eq!(config.feasibility.max_total_bytes, 100 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = MergeConfig::from_lookup(lookup(&[("SST_MERGE_WORKERS", "many")]));
        assert_eq!(config.workers, MergeConfig::default().workers);
    }

    #[test]
    fn test_from_lookup_ignores_out_of_range() {
        let config = MergeConfig::from_lookup(lookup(&[
            ("SST_MERGE_COMPRESSION_LEVEL", "4294967297"),
            ("SST_MERGE_SAMPLING_INTERVAL_SECS", "18446744073709551615"),
            ("SST_MERGE_MAX_CHUNK_MB", "18446744073709551615"),
            ("SST_MERGE_MEMORY_LIMIT_MB", "18446744073709551615"),
            ("SST_MERGE_MAX_TOTAL_GB", "18446744073709551615"),
        ]));
        let defaults = MergeConfig::default();
        assert_eq!(config.output.compression_level, 1);
        assert_eq!(config.sampling_interval_secs, defaults.sampling_interval_secs);
        assert_eq!(config.max_chunk_bytes, defaults.max_chunk_bytes);
        assert_eq!(config.memory_limit_mb, None);
        assert_eq!(config.feasibility.max_total_bytes, defaults.feasibility.max_total_bytes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_interval() {
        let config = MergeConfig::from_lookup(lookup(&[(
            "SST_MERGE_SAMPLING_INTERVAL_SECS",
            "9223372036854775807",
        )]));
        assert_eq!(config.sampling_interval_secs, i64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_extents() {
        let config = MergeConfig {
            chunk_policy: ChunkPolicy::new(0, 10, 10),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MergeConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.yaml");
        std::fs::write(
            &path,
            "workers: 3\nchunk_policy:\n  time: 5\noutput:\n  compression_level: 4\n",
        )
        .unwrap();

        let config = MergeConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.chunk_policy, ChunkPolicy::new(5, 200, 200));
        assert_eq!(config.output.compression_level, 4);
        assert_eq!(config.output.time_chunk, 30);
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_yaml_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.yaml");
        std::fs::write(&path, "workers: [1, 2").unwrap();
        assert!(matches!(
            MergeConfig::from_yaml_file(&path),
            Err(MergeError::Config(_))
        ));
    }

    #[test]
    fn test_discovery_filter() {
        let filter = DiscoveryConfig::default();
        assert!(filter.matches("20200101-UKMO-L4_GHRSST-SSTfnd-OSTIA-GLOB.nc"));
        assert!(filter.matches("x-OSTIA-y.NC"));
        assert!(!filter.matches("20200101-OSTIA.nc.md5"));
        assert!(!filter.matches("20200101-MUR.nc"));
    }

    #[test]
    fn test_estimated_peak() {
        let config = MergeConfig {
            workers: 4,
            chunk_policy: ChunkPolicy::new(1, 10, 10),
            ..Default::default()
        };
        assert_eq!(config.estimated_peak_bytes(), 4 * 400 * 2);
    }
}
