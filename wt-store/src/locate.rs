use std::path::{Component, Path, PathBuf};

use crate::result::{WeightError, WeightResult};

/// Find `name` in the first of `dirs` that contains it.
///
/// `name` must be a plain relative path, it cannot escape the data directories.
pub fn locate_file(name: impl AsRef<Path>, dirs: &[impl AsRef<Path>]) -> WeightResult<PathBuf> {
    let name = name.as_ref();
    let not_found = || WeightError::NotFound {
        name: name.display().to_string(),
        dirs: dirs.iter().map(|d| d.as_ref().to_owned()).collect(),
    };

    if !path_is_normal(name) {
        return Err(not_found());
    }

    for dir in dirs {
        let candidate = dir.as_ref().join(name);
        if candidate.is_file() {
            log::debug!("Found '{}' at {}", name.display(), candidate.display());
            return Ok(candidate);
        }
    }

    Err(not_found())
}

fn path_is_normal(path: &Path) -> bool {
    path.components().count() > 0 && path.components().all(|c| matches!(c, Component::Normal(_)))
}
