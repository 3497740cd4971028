use std::path::{Path, PathBuf};

/// Directories searched by `#include "name"`
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderSearch {
    pub(crate) include_paths: Vec<PathBuf>,
}

impl HeaderSearch {
    pub(crate) fn new(include_paths: &[PathBuf]) -> Self {
        HeaderSearch {
            include_paths: include_paths.to_vec(),
        }
    }

    /// Resolve an include name: the including file's directory first, then the include paths
    pub(crate) fn resolve_path(&self, include_name: &str, current_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = current_dir {
            let candidate = dir.join(include_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        self.check_paths(&self.include_paths, include_name)
    }

    fn check_paths<P: AsRef<Path>>(&self, paths: &[P], include_name: &str) -> Option<PathBuf> {
        paths
            .iter()
            .map(|path| path.as_ref().join(include_name))
            .find(|candidate| candidate.is_file())
    }
}
