//! # Filesystem essay store
//!
//! Essays are `.mdx` (or `.md`) files in one directory; the file stem is the
//! slug. When both extensions exist for a slug, `.mdx` wins.

mod frontmatter;

pub use frontmatter::{parse_essay, split_front_matter};

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domains::{DomainError, Essay, EssayStore, Result};
use tokio::fs;

const EXTENSIONS: &[&str] = &["mdx", "md"];

pub struct FsEssayStore {
    root: PathBuf,
}

impl FsEssayStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads and parses one file. Malformed front matter is logged and the
    /// essay skipped rather than failing the whole listing.
    async fn load(&self, slug: &str, path: &Path) -> Result<Option<Essay>> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to read essay");
                return Err(DomainError::unavailable(err));
            }
        };
        match parse_essay(slug, &raw) {
            Ok(essay) => Ok(Some(essay)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping essay with malformed front matter");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl EssayStore for FsEssayStore {
    async fn list(&self) -> Result<Vec<Essay>> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|err| {
            tracing::error!(dir = %self.root.display(), error = %err, "cannot read essays directory");
            DomainError::unavailable(err)
        })?;

        // slug -> (extension rank, path)
        let mut files: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();
        while let Some(entry) = entries.next_entry().await.map_err(DomainError::unavailable)? {
            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let Some(rank) = EXTENSIONS.iter().position(|e| *e == ext) else {
                continue;
            };
            let stem = stem.to_string();
            match files.get(&stem) {
                Some((existing, _)) if *existing <= rank => {}
                _ => {
                    files.insert(stem, (rank, path));
                }
            }
        }

        let mut essays = Vec::with_capacity(files.len());
        for (slug, (_, path)) in files {
            if let Some(essay) = self.load(&slug, &path).await? {
                essays.push(essay);
            }
        }
        tracing::debug!(count = essays.len(), "loaded essays");
        Ok(essays)
    }

    async fn by_slug(&self, slug: &str) -> Result<Option<Essay>> {
        if slug.contains(['/', '\\']) || slug.contains("..") {
            return Ok(None);
        }
        for ext in EXTENSIONS {
            let path = self.root.join(format!("{slug}.{ext}"));
            if let Some(essay) = self.load(slug, &path).await? {
                return Ok(Some(essay));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_list_reads_mdx_and_prefers_it() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "uno.mdx", "---\ntitle: Uno MDX\n---\nA");
        write(dir.path(), "uno.md", "---\ntitle: Uno MD\n---\nA");
        write(dir.path(), "due.md", "---\ntitle: Due\n---\nB");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "broken.mdx", "---\ntitle: [\n---\n");

        let store = FsEssayStore::new(dir.path());
        let titles: Vec<_> = store.list().await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Due", "Uno MDX"]);
    }

    #[tokio::test]
    async fn test_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tre.mdx", "---\ntitle: Tre\n---\nC");
        let store = FsEssayStore::new(dir.path());

        assert_eq!(store.by_slug("tre").await.unwrap().unwrap().title, "Tre");
        assert!(store.by_slug("quattro").await.unwrap().is_none());
        assert!(store.by_slug("../tre").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let store = FsEssayStore::new("/definitely/not/here");
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable(_)));
    }
}
