use crate::app::error::{Error, Result};
use crate::app::formatter::Formatter;
use crate::app::models::{ConfigSlot, CONFIG_FILE_NAME};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What happened to each slot during propagation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Propagation {
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Materialises the intent template through the formatter.
///
/// The template is copied as `.clang-format` into a fresh scratch directory and
/// the formatter's dumped configuration is returned. The scratch directory is
/// removed whether or not the formatter succeeds.
pub fn expand_intent(formatter: &dyn Formatter, intent: &Path) -> Result<Vec<u8>> {
    let template = fs::read(intent).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::Config {
            path: intent.to_path_buf(),
            message: "intent file not found".to_string(),
        },
        _ => Error::filesystem(intent, e),
    })?;

    let scratch = tempfile::Builder::new()
        .prefix("clang-format-intent-")
        .tempdir()
        .map_err(|e| Error::filesystem(std::env::temp_dir(), e))?;
    let target = scratch.path().join(CONFIG_FILE_NAME);
    fs::write(&target, template).map_err(|e| Error::filesystem(&target, e))?;

    log::debug!("Expanding {} in {}", intent.display(), scratch.path().display());
    formatter.dump_config(scratch.path())
}

/// Overwrites every slot's configuration with `expanded`.
///
/// There is no rollback: if a write fails, slots written before it keep the
/// new contents.
pub fn propagate(slots: &[ConfigSlot], expanded: &[u8]) -> Result<Propagation> {
    let mut result = Propagation::default();
    for slot in slots {
        let path = slot.config_path();
        let relative = slot.relative_config_path();
        if fs::read(&path).is_ok_and(|current| current == expanded) {
            log::debug!("{} already up to date", relative.display());
            result.unchanged.push(relative);
            continue;
        }
        fs::write(&path, expanded).map_err(|e| Error::filesystem(&path, e))?;
        println!("updated {}", relative.display());
        result.updated.push(relative);
    }
    Ok(result)
}

/// Expands the intent file and, only once that succeeded, writes it into every slot.
pub fn generate(
    formatter: &dyn Formatter,
    intent: &Path,
    slots: &[ConfigSlot],
) -> Result<Propagation> {
    let expanded = expand_intent(formatter, intent)?;
    propagate(slots, &expanded)
}
