use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

static LEXICON_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lexicon");

const COMMON_FILE: &str = "common.json";

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("word list {0} not found")]
    NotFound(String),
    #[error("word list is not valid utf-8")]
    NotUtf8,
    #[error("unable to read word list: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse word list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of a word list.
#[derive(Deserialize, Clone, Debug)]
struct WordList {
    name: String,
    #[allow(dead_code)]
    size: u32,
    words: Vec<String>,
}

/// Preloaded set of acceptable lowercase words, consulted before any remote lookup.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    name: String,
    words: HashSet<String>,
}

impl Lexicon {
    /// The word list bundled with the binary.
    pub fn common() -> Result<Self, LexiconError> {
        let file = LEXICON_DIR
            .get_file(COMMON_FILE)
            .ok_or_else(|| LexiconError::NotFound(COMMON_FILE.to_string()))?;
        let contents = file.contents_utf8().ok_or(LexiconError::NotUtf8)?;
        Self::from_json(contents)
    }

    /// Load a word list in the same JSON shape as the bundled one.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LexiconError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, LexiconError> {
        let list: WordList = serde_json::from_str(json)?;
        let mut lexicon = Self::from_words(list.words);
        lexicon.name = list.name;
        Ok(lexicon)
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            name: "custom".to_string(),
            words,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
