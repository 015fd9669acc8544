//! Startup-loaded collection of facts.
//!
//! The fact file holds one fact per line. Lines keep their terminators
//! exactly as read, so a fact served over HTTP ends in `\n` unless it was
//! the unterminated last line of the file.

use std::path::{Path, PathBuf};

use rand::Rng;

#[derive(Debug, thiserror::Error)]
pub enum FactError {
    #[error("Failed to read fact file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fact file {} contains no facts", .0.display())]
    Empty(PathBuf),
}

/// Immutable, non-empty, ordered list of facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactStore {
    facts: Vec<String>,
}

impl FactStore {
    /// Read every line of `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FactError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_lines(contents.split_inclusive('\n'))
            .map_err(|_| FactError::Empty(path.to_path_buf()))?;

        tracing::info!(path = %path.display(), facts = store.len(), "Loaded facts");
        Ok(store)
    }

    /// Build a store from facts already in memory.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, FactError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let facts: Vec<String> = lines.into_iter().map(Into::into).collect();
        if facts.is_empty() {
            return Err(FactError::Empty(PathBuf::new()));
        }
        Ok(Self { facts })
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Never true for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.facts.get(index).map(String::as_str)
    }

    pub fn contains(&self, fact: &str) -> bool {
        self.facts.iter().any(|f| f == fact)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.facts.iter().map(String::as_str)
    }

    /// Uniformly random fact. Cannot fail: construction rejects empty input.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.facts[rng.gen_range(0..self.facts.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn write_facts(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_preserves_order_and_terminators() {
        let file = write_facts("Sharks have no bones.\nSome sharks glow.\nSharks predate trees.\n");
        let store = FactStore::load(file.path()).unwrap();

        assert_eq!(store.len(), 3);
        let facts: Vec<&str> = store.iter().collect();
        assert_eq!(
            facts,
            vec!["Sharks have no bones.\n", "Some sharks glow.\n", "Sharks predate trees.\n"]
        );
    }

    #[test]
    fn test_unterminated_last_line_kept() {
        let file = write_facts("first\nsecond");
        let store = FactStore::load(file.path()).unwrap();
        assert_eq!(store.get(0), Some("first\n"));
        assert_eq!(store.get(1), Some("second"));
    }

    #[test]
    fn test_crlf_terminators_kept() {
        let file = write_facts("one\r\ntwo\r\n");
        let store = FactStore::load(file.path()).unwrap();
        assert_eq!(store.get(0), Some("one\r\n"));
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = write_facts("");
        let err = FactStore::load(file.path()).unwrap_err();
        assert!(matches!(err, FactError::Empty(ref p) if p == file.path()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FactStore::load(dir.path().join("facts.txt")).unwrap_err();
        assert!(matches!(err, FactError::Io { .. }));
    }

    #[test]
    fn test_from_lines_rejects_empty() {
        assert!(FactStore::from_lines(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_random_returns_member() {
        let store = FactStore::from_lines(["a", "b", "c"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(store.contains(store.random(&mut rng)));
        }
    }
}
