use std::path::{Path, PathBuf};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("dubdeck")
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("dubdeck")
        .join("config.json")
}

/// Directory holding one chunk manifest per target language
pub fn get_dubbed_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("dubbed")
}

/// Get the manifest path for a language. The key is reduced to a safe file stem.
pub fn get_manifest_path(cache_dir: &Path, language: &str) -> PathBuf {
    let stem: String = language
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "default".to_string() } else { stem };
    get_dubbed_dir(cache_dir).join(format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_path_is_per_language() {
        let root = Path::new("/cache/dubdeck");
        assert_eq!(
            get_manifest_path(root, "hi-IN"),
            PathBuf::from("/cache/dubdeck/dubbed/hi-in.json")
        );
        assert_eq!(
            get_manifest_path(root, "../etc"),
            PathBuf::from("/cache/dubdeck/dubbed/___etc.json")
        );
        assert_eq!(
            get_manifest_path(root, "  "),
            PathBuf::from("/cache/dubdeck/dubbed/default.json")
        );
    }

    #[test]
    fn test_config_lives_under_dubdeck() {
        let path = get_config_path();
        assert!(path.ends_with("dubdeck/config.json"));
    }
}
