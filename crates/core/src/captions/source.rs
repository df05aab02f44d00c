use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{
    captions::{align::CaptionAligner, parse::parse_captions, track::AlignedCaptions},
    error::{DubdeckError, Result},
};

/// Where raw SRT / WebVTT text comes from.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    fn name(&self) -> String;
    async fn fetch(&self) -> Result<String>;
}

pub struct FileCaptionSource {
    path: PathBuf,
}

impl FileCaptionSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CaptionSource for FileCaptionSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|e| DubdeckError::CaptionFetchFailed {
                source_name: self.name(),
                reason: e.to_string(),
            })
    }
}

pub struct HttpCaptionSource {
    url: String,
    client: reqwest::Client,
}

impl HttpCaptionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CaptionSource for HttpCaptionSource {
    fn name(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(DubdeckError::CaptionFetchFailed {
                source_name: self.name(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response.text().await?)
    }
}

/// Pick a file or HTTP source from a CLI-style location string.
pub fn caption_source_for(location: &str) -> Box<dyn CaptionSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpCaptionSource::new(location))
    } else {
        Box::new(FileCaptionSource::new(location))
    }
}

/// Fetch both caption tracks and align them. Any fetch failure is returned
/// before alignment runs.
pub async fn load_aligned(
    source: &dyn CaptionSource,
    target: &dyn CaptionSource,
    aligner: &CaptionAligner,
) -> Result<AlignedCaptions> {
    let (source_raw, target_raw) = tokio::try_join!(source.fetch(), target.fetch())?;

    let source_entries = parse_captions(&source_raw);
    let target_entries = parse_captions(&target_raw);
    debug!(
        source = source_entries.len(),
        target = target_entries.len(),
        "captions parsed"
    );

    Ok(AlignedCaptions::align(aligner, &source_entries, &target_entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dubdeck-{}.srt", uuid::Uuid::new_v4()));
        fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_aligned_from_files() {
        let src = temp_file("1\n00:00:00,000 --> 00:00:05,000\nHello\n").await;
        let tgt = temp_file("WEBVTT\n\n00:00:00.200 --> 00:00:05.100\nBonjour\n").await;

        let aligned = load_aligned(
            &FileCaptionSource::new(&src),
            &FileCaptionSource::new(&tgt),
            &CaptionAligner::default(),
        )
        .await
        .unwrap();

        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.entries()[0].source_text, "Hello");
        assert_eq!(aligned.entries()[0].target_text, "Bonjour");

        let _ = fs::remove_file(src).await;
        let _ = fs::remove_file(tgt).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_error() {
        let src = temp_file("").await;
        let missing = std::env::temp_dir().join("dubdeck-does-not-exist.srt");

        let err = load_aligned(
            &FileCaptionSource::new(&src),
            &FileCaptionSource::new(&missing),
            &CaptionAligner::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DubdeckError::CaptionFetchFailed { .. }));
        let _ = fs::remove_file(src).await;
    }

    #[test]
    fn test_caption_source_for_picks_transport() {
        assert_eq!(caption_source_for("https://x/a.vtt").name(), "https://x/a.vtt");
        assert_eq!(caption_source_for("subs/a.srt").name(), "subs/a.srt");
    }
}
