use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Locate the on-disk directory for `model`.
///
/// `model` may itself be a directory path. Otherwise `APP_MODEL_DIR` and
/// `MODEL_DIR` are tried, then `models/<model>` and `../models/<model>`.
pub fn resolve_model_dir(model: &str) -> Result<PathBuf> {
    let direct = Path::new(model);
    if direct.is_dir() { info!("Using model dir: {}", direct.display()); return Ok(direct.to_path_buf()); }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.is_dir() { info!("Using {var}: {}", p.display()); return Ok(p); }
        }
    }
    for root in ["models", "../models"] {
        let p = Path::new(root).join(model);
        if p.is_dir() { info!("Using model dir: {}", p.display()); return Ok(p); }
    }
    Err(anyhow!("Could not locate model directory for '{model}' (set APP_MODEL_DIR or place it under models/)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins() {
        let tmp = tempfile::tempdir().expect("tmp");
        let dir = tmp.path().to_string_lossy().to_string();
        assert_eq!(resolve_model_dir(&dir).expect("resolve"), tmp.path());
    }
}
