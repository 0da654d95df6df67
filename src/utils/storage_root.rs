use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Where the history and activity files live.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum StorageRoot {
    /// The directory holding the running executable.
    BesideExecutable,
    /// `<personal documents>/<folder_name>`.
    #[default]
    Documents,
    /// An explicit directory.
    Custom(PathBuf),
}

impl StorageRoot {
    /// Resolve to a concrete directory. Nothing is created here.
    pub fn resolve(&self, folder_name: &str) -> Option<PathBuf> {
        match self {
            Self::BesideExecutable => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(PathBuf::from)),
            Self::Documents => dirs::document_dir()
                .or_else(dirs::home_dir)
                .map(|docs| docs.join(folder_name)),
            Self::Custom(path) => Some(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_root_is_used_verbatim() {
        let root = StorageRoot::Custom(PathBuf::from("/srv/wiki"));
        assert_eq!(root.resolve("ignored"), Some(PathBuf::from("/srv/wiki")));
    }

    #[test]
    fn test_beside_executable_is_exe_dir() {
        let exe_dir = std::env::current_exe()
            .unwrap()
            .parent()
            .unwrap()
            .to_path_buf();
        assert_eq!(StorageRoot::BesideExecutable.resolve("x"), Some(exe_dir));
    }

    #[test]
    fn test_documents_root_ends_with_folder() {
        if let Some(path) = StorageRoot::Documents.resolve("Random-Wiki-Logs") {
            assert!(path.ends_with("Random-Wiki-Logs"));
        }
    }

    #[test]
    fn test_ron_round_trip_of_variants() {
        let parsed: StorageRoot = ron::from_str("Custom(\"/tmp/wiki\")").unwrap();
        assert_eq!(parsed, StorageRoot::Custom(PathBuf::from("/tmp/wiki")));
        let parsed: StorageRoot = ron::from_str("BesideExecutable").unwrap();
        assert_eq!(parsed, StorageRoot::BesideExecutable);
    }
}
