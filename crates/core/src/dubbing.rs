//! Dubbed-track plumbing around the engine: the chunk list a synthesis step
//! produces, its per-language cache, and splitting a script for that step.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{cache::get_manifest_path, error::Result};

/// Characters per synthesis request.
pub const DEFAULT_CHUNK_CHARS: usize = 2000;

/// Split `text` into pieces of at most `size` characters. Counts chars, so a
/// multi-byte character never straddles two pieces.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Produces the ordered chunk URLs of a dubbed track for one language.
#[async_trait]
pub trait ChunkProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn chunks_for(&self, language: &str, script: &str) -> Result<Vec<String>>;
}

/// A fixed list, e.g. files handed in on the command line.
pub struct StaticChunkProvider {
    urls: Vec<String>,
}

impl StaticChunkProvider {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl ChunkProvider for StaticChunkProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn chunks_for(&self, _language: &str, _script: &str) -> Result<Vec<String>> {
        Ok(self.urls.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub language: String,
    pub urls: Vec<String>,
}

pub async fn save_manifest(cache_dir: &Path, manifest: &ChunkManifest) -> Result<PathBuf> {
    let path = get_manifest_path(cache_dir, &manifest.language);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, serde_json::to_string_pretty(manifest)?).await?;
    debug!(path = %path.display(), chunks = manifest.urls.len(), "manifest saved");
    Ok(path)
}

/// Cached chunk list for `language`. Missing, unreadable or empty manifests
/// all count as no cache.
pub async fn load_manifest(cache_dir: &Path, language: &str) -> Option<ChunkManifest> {
    let path = get_manifest_path(cache_dir, language);
    let raw = fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str::<ChunkManifest>(&raw) {
        Ok(manifest) if !manifest.urls.is_empty() => Some(manifest),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt manifest");
            None
        }
    }
}

/// Serves from the manifest cache, falling back to `inner` and caching what
/// it returns.
pub struct CachedChunkProvider<P: ChunkProvider> {
    inner: P,
    cache_dir: PathBuf,
    misses: AtomicUsize,
}

impl<P: ChunkProvider> CachedChunkProvider<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Ask `inner` for a fresh list and overwrite the cached manifest.
    pub async fn regenerate(&self, language: &str, script: &str) -> Result<Vec<String>> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(language, provider = self.inner.name(), "generating chunk list");
        let urls = self.inner.chunks_for(language, script).await?;
        if !urls.is_empty() {
            let manifest = ChunkManifest {
                language: language.to_string(),
                urls: urls.clone(),
            };
            let path = save_manifest(&self.cache_dir, &manifest).await?;
            debug!(path = %path.display(), "chunk manifest updated");
        }
        Ok(urls)
    }
}

#[async_trait]
impl<P: ChunkProvider> ChunkProvider for CachedChunkProvider<P> {
    fn name(&self) -> &'static str {
        "cached"
    }

    async fn chunks_for(&self, language: &str, script: &str) -> Result<Vec<String>> {
        if let Some(manifest) = load_manifest(&self.cache_dir, language).await {
            debug!(language, chunks = manifest.urls.len(), "chunk manifest cache hit");
            return Ok(manifest.urls);
        }
        self.regenerate(language, script).await
    }
}

/// Length in seconds of a WAV chunk, read from its header.
pub fn wav_duration(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Ok(0.0);
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("dubdeck-cache-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_chunk_text_counts_characters() {
        let text = "ab".repeat(2500);
        let pieces = chunk_text(&text, DEFAULT_CHUNK_CHARS);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].chars().count(), 2000);
        assert_eq!(pieces[2].chars().count(), 1000);

        let pieces = chunk_text("नमस्ते", 2);
        assert_eq!(pieces.concat(), "नमस्ते");
        assert!(pieces.iter().all(|p| p.chars().count() <= 2));

        assert!(chunk_text("", 10).is_empty());
        assert!(chunk_text("abc", 0).is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_empty_manifest_is_no_cache() {
        let dir = temp_dir();
        assert!(load_manifest(&dir, "hi").await.is_none());

        let empty = ChunkManifest {
            language: "hi".into(),
            urls: vec![],
        };
        save_manifest(&dir, &empty).await.unwrap();
        assert!(load_manifest(&dir, "hi").await.is_none());

        let path = get_manifest_path(&dir, "ta");
        fs::write(&path, "{ not json").await.unwrap();
        assert!(load_manifest(&dir, "ta").await.is_none());

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_cached_provider_generates_once_per_language() {
        let dir = temp_dir();
        let provider = CachedChunkProvider::new(
            StaticChunkProvider::new(vec!["a.wav".into(), "b.wav".into()]),
            &dir,
        );

        let first = provider.chunks_for("hi", "script").await.unwrap();
        let second = provider.chunks_for("hi", "script").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.misses(), 1);

        provider.chunks_for("ta", "script").await.unwrap();
        assert_eq!(provider.misses(), 2);

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_regenerate_replaces_cached_manifest() {
        let dir = temp_dir();
        let old = CachedChunkProvider::new(StaticChunkProvider::new(vec!["old.wav".into()]), &dir);
        old.chunks_for("hi", "script").await.unwrap();

        let fresh = CachedChunkProvider::new(
            StaticChunkProvider::new(vec!["new-1.wav".into(), "new-2.wav".into()]),
            &dir,
        );
        assert_eq!(fresh.chunks_for("hi", "script").await.unwrap(), vec!["old.wav"]);
        assert_eq!(fresh.misses(), 0);

        let urls = fresh.regenerate("hi", "script").await.unwrap();
        assert_eq!(urls, vec!["new-1.wav", "new-2.wav"]);
        assert_eq!(fresh.misses(), 1);
        assert_eq!(load_manifest(&dir, "hi").await.unwrap().urls, urls);

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_wav_duration_from_header() {
        let path = std::env::temp_dir().join(format!("dubdeck-{}.wav", Uuid::new_v4()));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..(8000 * 3 / 2) {
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let duration = wav_duration(&path).unwrap();
        assert!((duration - 1.5).abs() < 1e-9);

        std::fs::remove_file(&path).unwrap();
    }
}
