//! Google Translate text-to-speech endpoint.

use crate::{create_artifact, SpeechError, SpeechSynthesizer};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The endpoint rejects requests longer than this.
pub const MAX_CHUNK_CHARS: usize = 100;

const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";
const USER_AGENT: &str = concat!("sightassist/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Language code passed as `tl` (e.g. "en", "es").
    pub language: String,
    pub timeout_secs: u64,
    pub endpoint: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timeout_secs: 10,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

pub struct GoogleTts {
    client: reqwest::blocking::Client,
    config: SpeechConfig,
}

impl GoogleTts {
    pub fn new(config: SpeechConfig) -> crate::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    fn fetch_chunk(&self, chunk: &str, index: usize, total: usize) -> crate::Result<Vec<u8>> {
        let total = total.to_string();
        let index = index.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", self.config.language.as_str()),
                ("client", "tw-ob"),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()?
            .error_for_status()?;

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(SpeechError::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }
}

impl SpeechSynthesizer for GoogleTts {
    fn synthesize(&self, text: &str, out_dir: &Path) -> crate::Result<PathBuf> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        // Fetch everything before touching the disk so a failed request
        // leaves no partial artifact behind.
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, index, chunks.len())?);
        }

        let (path, mut file) = create_artifact(out_dir, chrono::Local::now())?;
        if let Err(e) = file.write_all(&audio).and_then(|_| file.flush()) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = audio.len(), "speech synthesized");
        Ok(path)
    }

    fn name(&self) -> &str {
        "google-translate-tts"
    }
}

/// Split `text` into chunks of at most `max_chars` characters, breaking on
/// whitespace where possible. Words longer than `max_chars` are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(
            split_text("Alert! A person is on your left.", MAX_CHUNK_CHARS),
            vec!["Alert! A person is on your left."]
        );
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_text("   \n\t", MAX_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn test_splits_on_word_boundaries() {
        let chunks = split_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_long_word_is_cut() {
        let chunks = split_text("ab abcdefghij cd", 4);
        assert_eq!(chunks, vec!["ab", "abcd", "efgh", "ij", "cd"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "Be careful, there's a person on your left. ".repeat(10);
        let chunks = split_text(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn test_default_config() {
        let config = SpeechConfig::default();
        assert_eq!(config.language, "en");
        assert!(config.endpoint.starts_with("https://"));
    }
}
