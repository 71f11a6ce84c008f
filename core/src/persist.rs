use crate::error::{Result, WeightDbError};
use crate::index::WeightIndex;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub num_genes: usize,
    pub num_rsids: usize,
    pub num_weights: usize,
    /// Path of the weight database the index was built from.
    pub source: String,
    pub created_at: String,
    pub version: u32,
}

impl SnapshotMeta {
    pub fn describe(index: &WeightIndex, source: &str) -> Self {
        Self {
            num_genes: index.num_genes(),
            num_rsids: index.num_rsids(),
            num_weights: index.num_weights(),
            source: source.to_string(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: SNAPSHOT_VERSION,
        }
    }
}

pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_index(paths: &SnapshotPaths, index: &WeightIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.index())?);
    bincode::serialize_into(&mut out, index)?;
    out.flush()?;
    Ok(())
}

/// Fails with `Codec` when `index.bin` is truncated or was written by an incompatible build.
pub fn load_index(paths: &SnapshotPaths) -> Result<WeightIndex> {
    let input = BufReader::new(File::open(paths.index())?);
    Ok(bincode::deserialize_from(input)?)
}

pub fn save_meta(paths: &SnapshotPaths, meta: &SnapshotMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.meta())?);
    serde_json::to_writer_pretty(&mut out, meta)?;
    out.flush()?;
    Ok(())
}

pub fn load_meta(paths: &SnapshotPaths) -> Result<SnapshotMeta> {
    let input = BufReader::new(File::open(paths.meta())?);
    Ok(serde_json::from_reader(input)?)
}

/// Writes the index and its metadata. The backing database is not touched.
pub fn save_snapshot(paths: &SnapshotPaths, index: &WeightIndex, source: &str) -> Result<SnapshotMeta> {
    let meta = SnapshotMeta::describe(index, source);
    save_index(paths, index)?;
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), genes = meta.num_genes, "snapshot written");
    Ok(meta)
}

/// Loads a snapshot written by [`save_snapshot`], refusing other format versions.
pub fn load_snapshot(paths: &SnapshotPaths) -> Result<(WeightIndex, SnapshotMeta)> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        return Err(WeightDbError::Configuration {
            path: paths.root.clone(),
            reason: format!("unsupported snapshot version {}", meta.version),
        });
    }
    let index = load_index(paths)?;
    Ok((index, meta))
}
