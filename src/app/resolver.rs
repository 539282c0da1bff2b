use crate::app::error::{Error, Result};
use crate::app::models::{ConfigSlot, FileSet};
use git2::{ErrorCode, Repository};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Expands configuration slots into the tracked files they govern.
///
/// A slot governs only its direct children whose file name matches one of the
/// patterns; subdirectories are covered only through their own slot. Files are
/// taken from the git index, so untracked files are never enumerated.
pub fn resolve_file_set(
    root: &Path,
    slots: &[ConfigSlot],
    patterns: &[String],
) -> Result<FileSet> {
    let matcher = build_globset(patterns)?;
    let repo = open_repository(root)?;
    let index = repo.index()?;

    let slot_dirs: HashSet<&Path> = slots.iter().map(|s| s.relative_dir.as_path()).collect();

    let mut files = BTreeSet::new();
    for entry in index.iter() {
        let Ok(path) = std::str::from_utf8(&entry.path) else {
            log::warn!(
                "Skipping non UTF-8 index entry: {}",
                String::from_utf8_lossy(&entry.path)
            );
            continue;
        };
        let path = PathBuf::from(path);
        let parent = path.parent().unwrap_or(Path::new(""));
        if !slot_dirs.contains(parent) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if matcher.is_match(name) {
            files.insert(path);
        }
    }

    Ok(FileSet {
        files: files.into_iter().collect(),
    })
}

/// Returns the working tree root of the repository containing `start`.
pub fn discover_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start).map_err(|e| not_a_repository(start, e))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| Error::NotARepository(start.to_path_buf()))?;
    Ok(workdir.to_path_buf())
}

fn open_repository(root: &Path) -> Result<Repository> {
    Repository::open(root).map_err(|e| not_a_repository(root, e))
}

fn not_a_repository(path: &Path, err: git2::Error) -> Error {
    if err.code() == ErrorCode::NotFound {
        Error::NotARepository(path.to_path_buf())
    } else {
        Error::Git(err)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Initialises a repository at `root`, writes every file and stages the tracked ones.
    fn repo_with(root: &Path, tracked: &[&str], untracked: &[&str]) -> Repository {
        let repo = Repository::init(root).unwrap();
        for rel in tracked.iter().chain(untracked) {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "int x;\n").unwrap();
        }
        {
            let mut index = repo.index().unwrap();
            for rel in tracked {
                index.add_path(Path::new(rel)).unwrap();
            }
            index.write().unwrap();
        }
        repo
    }

    fn slot(root: &Path, rel: &str) -> ConfigSlot {
        ConfigSlot {
            dir: root.join(rel),
            relative_dir: PathBuf::from(rel),
        }
    }

    fn default_patterns() -> Vec<String> {
        vec!["*.cpp".to_string(), "*.h".to_string()]
    }

    #[test]
    fn includes_only_direct_tracked_children_matching_patterns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        repo_with(
            root,
            &[
                "src/a.cpp",
                "src/a.h",
                "src/notes.txt",
                "src/sub/b.cpp",
                "other/c.cpp",
                "top.cpp",
            ],
            &["src/scratch.cpp"],
        );

        let files = resolve_file_set(root, &[slot(root, "src")], &default_patterns()).unwrap();
        assert_eq!(
            files.files,
            vec![PathBuf::from("src/a.cpp"), PathBuf::from("src/a.h")]
        );
    }

    #[test]
    fn root_slot_and_nested_slot_are_independent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        repo_with(root, &["main.cpp", "lib/util.h", "lib/deep/x.cpp"], &[]);

        let slots = [slot(root, ""), slot(root, "lib/deep")];
        let files = resolve_file_set(root, &slots, &default_patterns()).unwrap();
        assert_eq!(
            files.files,
            vec![PathBuf::from("lib/deep/x.cpp"), PathBuf::from("main.cpp")]
        );
    }

    #[test]
    fn no_slots_means_no_files() {
        let dir = tempdir().unwrap();
        repo_with(dir.path(), &["a.cpp"], &[]);
        let files = resolve_file_set(dir.path(), &[], &default_patterns()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn custom_patterns_are_honoured() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        repo_with(root, &["a.c", "a.cpp", "a.hpp"], &[]);
        let patterns = vec!["*.c".to_string(), "*.hpp".to_string()];
        let files = resolve_file_set(root, &[slot(root, "")], &patterns).unwrap();
        assert_eq!(files.files, vec![PathBuf::from("a.c"), PathBuf::from("a.hpp")]);
    }

    #[test]
    fn outside_a_repository_fails() {
        let dir = tempdir().unwrap();
        let err = resolve_file_set(dir.path(), &[], &default_patterns()).unwrap_err();
        assert!(matches!(err, Error::NotARepository(_)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempdir().unwrap();
        repo_with(dir.path(), &[], &[]);
        let err = resolve_file_set(dir.path(), &[], &["a[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn discovers_root_from_subdirectory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        repo_with(root, &["src/a.cpp"], &[]);
        let found = discover_root(&root.join("src")).unwrap();
        assert_eq!(
            found.canonicalize().unwrap(),
            root.canonicalize().unwrap()
        );
    }
}
