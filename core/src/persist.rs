use crate::catalog::Catalog;
use crate::config::RecommenderConfig;
use crate::features::compose_all;
use crate::index::{fingerprint, TfIdfMatrix, VectorIndex, Vocabulary};
use crate::recommend::Recommender;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_items: u32,
    pub num_terms: u32,
    pub fingerprint: String,
    pub created_at: String,
    pub version: u32,
    pub config: RecommenderConfig,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn catalog(&self) -> PathBuf { self.root.join("catalog.bin") }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn matrix(&self) -> PathBuf { self.root.join("matrix.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
    let value = bincode::deserialize_from(f).with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

fn write_index(paths: &IndexPaths, index: &VectorIndex) -> Result<()> {
    write_bincode(&paths.vocabulary(), index.vocabulary())?;
    write_bincode(&paths.matrix(), index.matrix())?;
    Ok(())
}

fn read_index(paths: &IndexPaths, meta: &MetaFile) -> Result<VectorIndex> {
    let vocabulary: Vocabulary = read_bincode(&paths.vocabulary())?;
    let matrix: TfIdfMatrix = read_bincode(&paths.matrix())?;
    if matrix.num_rows() != meta.num_items as usize || vocabulary.len() != meta.num_terms as usize {
        bail!("snapshot at {} is inconsistent with its meta.json", paths.root.display());
    }
    Ok(VectorIndex::from_parts(vocabulary, matrix, meta.fingerprint.clone()))
}

fn meta_for(recommender: &Recommender) -> Result<MetaFile> {
    let index = recommender.index();
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("formatting snapshot timestamp")?;
    Ok(MetaFile {
        num_items: index.len() as u32,
        num_terms: index.vocabulary().len() as u32,
        fingerprint: index.fingerprint().to_string(),
        created_at,
        version: SNAPSHOT_VERSION,
        config: recommender.config().clone(),
    })
}

/// Write catalog, vocabulary, matrix and meta. meta.json goes last, so an interrupted
/// write leaves no snapshot that looks complete.
pub fn save_snapshot(paths: &IndexPaths, recommender: &Recommender) -> Result<()> {
    create_dir_all(&paths.root)?;
    let meta_path = paths.meta();
    if meta_path.exists() {
        std::fs::remove_file(&meta_path)?;
    }
    write_bincode(&paths.catalog(), recommender.catalog())?;
    write_index(paths, recommender.index())?;
    save_meta(paths, &meta_for(recommender)?)?;
    tracing::info!(
        root = %paths.root.display(),
        fingerprint = recommender.index().fingerprint(),
        "snapshot saved"
    );
    Ok(())
}

/// Load a full snapshot written by `save_snapshot`.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Recommender> {
    let meta = load_meta(paths).with_context(|| format!("reading snapshot meta in {}", paths.root.display()))?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("snapshot version {} is not supported (expected {})", meta.version, SNAPSHOT_VERSION);
    }
    let catalog: Catalog = read_bincode(&paths.catalog())?;
    let blobs = compose_all(&catalog, &meta.config.weights);
    if fingerprint(&blobs, &meta.config.tokenizer) != meta.fingerprint {
        bail!("snapshot catalog in {} does not match its fingerprint", paths.root.display());
    }
    let index = read_index(paths, &meta)?;
    Ok(Recommender::from_parts(catalog, index, meta.config))
}

/// Reuse the snapshot in `paths` when it was built from this exact catalog and config,
/// otherwise build fresh and overwrite it. Returns whether the snapshot was reused.
///
/// Display-only columns do not enter the fingerprint, so catalog.bin is refreshed
/// even when the index is reused.
pub fn load_or_build(
    paths: &IndexPaths,
    catalog: Catalog,
    config: RecommenderConfig,
) -> Result<(Recommender, bool)> {
    let blobs = compose_all(&catalog, &config.weights);
    let expected = fingerprint(&blobs, &config.tokenizer);

    if let Ok(meta) = load_meta(paths) {
        if meta.version == SNAPSHOT_VERSION && meta.fingerprint == expected && meta.config == config {
            match read_index(paths, &meta) {
                Ok(index) => {
                    tracing::info!(fingerprint = %expected, "reusing index snapshot");
                    write_bincode(&paths.catalog(), &catalog)?;
                    return Ok((Recommender::from_parts(catalog, index, config), true));
                }
                Err(err) => tracing::warn!(error = %err, "snapshot unreadable; rebuilding"),
            }
        }
    }

    let index = VectorIndex::build(&blobs, &config.tokenizer)?;
    let recommender = Recommender::from_parts(catalog, index, config);
    save_snapshot(paths, &recommender)?;
    Ok((recommender, false))
}
