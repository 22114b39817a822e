use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rust_embed::Embed;
use serde::Deserialize;
use thiserror::Error;

pub const COMMON_WORDS: &str = "Common words";

#[derive(Embed)]
#[folder = "assets/words/"]
struct WordAssets;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("unknown word pool: {0}")]
    UnknownPool(String),
    #[error("word pool {0} has no words")]
    EmptyPool(String),
    #[error("bundled word list {file} is malformed: {reason}")]
    Malformed { file: String, reason: String },
}

/// Produces the text for a drill. Implementations are shared across
/// sessions, so they must not keep per-call state.
pub trait WordSource: Send + Sync {
    /// Draws `min(count, pool size)` words joined by single spaces.
    fn generate(&self, pool: &str, count: usize) -> Result<Vec<char>, GeneratorError>;
}

#[derive(Deserialize)]
struct WordListFile {
    #[serde(rename = "MetaData")]
    meta: WordListMeta,
    #[serde(rename = "Words")]
    words: Vec<String>,
}

#[derive(Deserialize)]
struct WordListMeta {
    #[serde(rename = "Name")]
    name: String,
}

/// Word pools bundled into the binary from `assets/words/`.
pub struct EmbeddedWords {
    pools: BTreeMap<String, Vec<String>>,
}

impl EmbeddedWords {
    pub fn load() -> Result<Self, GeneratorError> {
        let mut pools = BTreeMap::new();
        for file in WordAssets::iter() {
            let Some(asset) = WordAssets::get(&file) else {
                continue;
            };
            let list: WordListFile =
                serde_json::from_slice(asset.data.as_ref()).map_err(|e| GeneratorError::Malformed {
                    file: file.to_string(),
                    reason: e.to_string(),
                })?;
            let words = list
                .words
                .into_iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
            pools.insert(list.meta.name, words);
        }
        Ok(Self { pools })
    }

    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    pub fn pool_size(&self, pool: &str) -> Option<usize> {
        self.pools.get(pool).map(Vec::len)
    }
}

impl WordSource for EmbeddedWords {
    fn generate(&self, pool: &str, count: usize) -> Result<Vec<char>, GeneratorError> {
        let words = self
            .pools
            .get(pool)
            .ok_or_else(|| GeneratorError::UnknownPool(pool.to_string()))?;
        if words.is_empty() {
            return Err(GeneratorError::EmptyPool(pool.to_string()));
        }

        let mut rng = SmallRng::from_entropy();
        let picked: Vec<&str> = words
            .choose_multiple(&mut rng, count.min(words.len()))
            .map(String::as_str)
            .collect();
        Ok(picked.join(" ").chars().collect())
    }
}

/// Always yields the same words in order. Used for scripted sessions.
pub struct FixedWords {
    pool: String,
    words: Vec<String>,
}

impl FixedWords {
    pub fn new(pool: &str, text: &str) -> Self {
        Self {
            pool: pool.to_string(),
            words: text.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl WordSource for FixedWords {
    fn generate(&self, pool: &str, count: usize) -> Result<Vec<char>, GeneratorError> {
        if pool != self.pool {
            return Err(GeneratorError::UnknownPool(pool.to_string()));
        }
        if self.words.is_empty() {
            return Err(GeneratorError::EmptyPool(pool.to_string()));
        }
        let take = count.min(self.words.len());
        Ok(self.words[..take].join(" ").chars().collect())
    }
}
