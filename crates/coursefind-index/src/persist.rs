//! Reading and writing the two build artifacts.
//!
//! The embeddings matrix goes to a `.npy` file and the index to a small
//! binary file: 8 magic bytes, a little-endian u32 format version, then the
//! bincode-encoded [`FlatIndex`]. Every write lands in a temp file beside the
//! destination and is renamed into place, so a reader never sees a partial
//! artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use coursefind_core::error::{Error, Result};

use crate::flat::FlatIndex;
use crate::matrix::EmbeddingMatrix;
use crate::npy::{read_npy, write_npy};

const INDEX_MAGIC: &[u8; 8] = b"CFFLATIX";
const INDEX_VERSION: u32 = 1;
const INDEX_PREAMBLE: usize = INDEX_MAGIC.len() + 4;

/// Write `path` atomically via a sibling temp file, creating parent dirs.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        Error::persistence(format!("cannot create directory {}: {e}", parent.display()))
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| {
        Error::persistence(format!("cannot create temp file in {}: {e}", parent.display()))
    })?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        write(&mut w)?;
        w.flush()
            .map_err(|e| Error::persistence(format!("failed to flush {}: {e}", path.display())))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::persistence(format!("failed to sync {}: {e}", path.display())))?;
    tmp.persist(path)
        .map_err(|e| Error::persistence(format!("failed to move into {}: {}", path.display(), e.error)))?;
    Ok(())
}

fn open(path: &Path, what: &str) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::persistence(format!("cannot open {what} at {}: {e}", path.display())))
}

pub fn save_embeddings(path: &Path, matrix: &EmbeddingMatrix) -> Result<()> {
    write_atomic(path, |w| write_npy(w, matrix))?;
    info!(rows = matrix.rows(), dim = matrix.dim(), "Embeddings saved to {}", path.display());
    Ok(())
}

pub fn load_embeddings(path: &Path) -> Result<EmbeddingMatrix> {
    let matrix = read_npy(BufReader::new(open(path, "embeddings")?))?;
    info!(rows = matrix.rows(), dim = matrix.dim(), "Loaded embeddings from {}", path.display());
    Ok(matrix)
}

pub fn save_index(path: &Path, index: &FlatIndex) -> Result<()> {
    let body = bincode::serialize(index)
        .map_err(|e| Error::persistence(format!("failed to encode index: {e}")))?;
    write_atomic(path, |w| {
        let io = |e: std::io::Error| Error::persistence(format!("failed to write index: {e}"));
        w.write_all(INDEX_MAGIC).map_err(io)?;
        w.write_all(&INDEX_VERSION.to_le_bytes()).map_err(io)?;
        w.write_all(&body).map_err(io)
    })?;
    info!(entries = index.len(), "Index saved to {}", path.display());
    Ok(())
}

pub fn load_index(path: &Path) -> Result<FlatIndex> {
    let bytes = fs::read(path)
        .map_err(|e| Error::persistence(format!("cannot read index at {}: {e}", path.display())))?;
    if bytes.len() < INDEX_PREAMBLE || &bytes[..INDEX_MAGIC.len()] != INDEX_MAGIC {
        return Err(Error::persistence(format!("{} is not a course index file", path.display())));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[INDEX_MAGIC.len()..INDEX_PREAMBLE]);
    let version = u32::from_le_bytes(version);
    if version != INDEX_VERSION {
        return Err(Error::persistence(format!(
            "unsupported index format version {version} (expected {INDEX_VERSION})"
        )));
    }
    let index: FlatIndex = bincode::deserialize(&bytes[INDEX_PREAMBLE..])
        .map_err(|e| Error::persistence(format!("failed to decode index {}: {e}", path.display())))?;
    index.validate()?;
    info!(entries = index.len(), model = index.model_id(), "Loaded index from {}", path.display());
    Ok(index)
}

/// Persist both artifacts. The matrix is written first; the index, which
/// the query side opens first, only appears once the matrix is in place.
pub fn save_artifacts(
    index_path: &Path,
    embeddings_path: &Path,
    matrix: &EmbeddingMatrix,
    index: &FlatIndex,
) -> Result<()> {
    check_pair(index, matrix)?;
    save_embeddings(embeddings_path, matrix)?;
    save_index(index_path, index)
}

/// Load both artifacts and verify they describe the same vectors.
pub fn load_artifacts(index_path: &Path, embeddings_path: &Path) -> Result<(FlatIndex, EmbeddingMatrix)> {
    let index = load_index(index_path)?;
    let matrix = load_embeddings(embeddings_path)?;
    check_pair(&index, &matrix)?;
    Ok((index, matrix))
}

fn check_pair(index: &FlatIndex, matrix: &EmbeddingMatrix) -> Result<()> {
    if index.len() != matrix.rows() || index.dim() != matrix.dim() {
        return Err(Error::integrity(format!(
            "index holds {} x {} but embeddings are {} x {}",
            index.len(),
            index.dim(),
            matrix.rows(),
            matrix.dim()
        )));
    }
    if index.raw_vectors() != matrix.as_slice() {
        return Err(Error::integrity("index vectors differ from the embeddings matrix"));
    }
    Ok(())
}
