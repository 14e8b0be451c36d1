use std::path::Path;

/// File extensions that are never audio and are dropped before any other check.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Audio containers the resolver knows how to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedExtension {
    Flac,
    Ogg,
    Opus,
    Mp3,
    M4a,
    Wma,
}

impl SupportedExtension {
    pub const ALL: &'static [SupportedExtension] = &[
        SupportedExtension::Flac,
        SupportedExtension::Ogg,
        SupportedExtension::Opus,
        SupportedExtension::Mp3,
        SupportedExtension::M4a,
        SupportedExtension::Wma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedExtension::Flac => "flac",
            SupportedExtension::Ogg => "ogg",
            SupportedExtension::Opus => "opus",
            SupportedExtension::Mp3 => "mp3",
            SupportedExtension::M4a => "m4a",
            SupportedExtension::Wma => "wma",
        }
    }

    /// Matches the suffix of `path`, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        extension_of(path)?.parse().ok()
    }
}

impl std::str::FromStr for SupportedExtension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        SupportedExtension::ALL
            .iter()
            .find(|ext| ext.as_str() == lower)
            .cloned()
            .ok_or_else(|| format!("Extension not supported: {}", s))
    }
}

impl std::fmt::Display for SupportedExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-cased extension of `path`, without the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_image(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
