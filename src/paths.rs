use std::path::{Path, PathBuf};

/// Resolves a user-supplied filename against the output directory.
/// Absolute paths are taken as-is.
pub fn resolve(output_dir: &Path, name: impl AsRef<Path>) -> PathBuf {
    let name = name.as_ref();
    if name.is_absolute() {
        name.to_path_buf()
    } else {
        output_dir.join(name)
    }
}

/// Path for image `index` of a batch: the base itself for index 0, otherwise
/// the base with `_<index>` appended to its stem (`out.png` -> `out_2.png`).
pub fn batch_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(file_name)
}
