use crate::app::error::{Error, Result};
use crate::app::models::{ConfigSlot, CONFIG_FILE_NAME};
use ignore::WalkBuilder;
use pathdiff::diff_paths;
use std::collections::BTreeSet;
use std::path::Path;

/// Finds every directory under `root` that contains a `.clang-format` file.
///
/// The walk does not apply ignore rules: a slot inside an ignored directory is
/// still a slot. Results are sorted so repeated calls on an unchanged tree agree.
pub fn find_config_slots(root: &Path) -> Result<Vec<ConfigSlot>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::filesystem(root, e))?;
    if !metadata.is_dir() {
        return Err(Error::filesystem(
            root,
            std::io::Error::other("not a directory"),
        ));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut slots = BTreeSet::new();
    for result in walker {
        let entry = result?;
        if entry.file_name() != CONFIG_FILE_NAME {
            continue;
        }
        // follows symlinks, so a link to a shared style file still marks a slot
        if !entry.path().is_file() {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let relative_dir = diff_paths(dir, root).unwrap_or_default();
        slots.insert(ConfigSlot {
            dir: dir.to_path_buf(),
            relative_dir,
        });
    }

    log::debug!("Found {} configuration slot(s)", slots.len());
    Ok(slots.into_iter().collect())
}
