use std::collections::HashMap;
use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use resolver_core::TagRecord;
use tracing::trace;

use crate::error::TagError;
use crate::extensions::SupportedExtension;
use crate::traits::TagReader;

/// Maps each supported container to the reader that extracts its tags.
pub struct ReaderRegistry {
    readers: HashMap<SupportedExtension, Box<dyn TagReader>>,
}

impl ReaderRegistry {
    pub fn empty() -> Self {
        ReaderRegistry {
            readers: HashMap::new(),
        }
    }

    /// One reader per supported extension.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(SupportedExtension::Flac, LoftyReader::new(TagType::VorbisComments));
        registry.register(SupportedExtension::Ogg, LoftyReader::new(TagType::VorbisComments));
        registry.register(SupportedExtension::Opus, LoftyReader::new(TagType::VorbisComments));
        registry.register(SupportedExtension::Mp3, LoftyReader::new(TagType::Id3v2));
        registry.register(SupportedExtension::M4a, LoftyReader::new(TagType::Mp4Ilst));
        registry.register(SupportedExtension::Wma, UnreadableContainer);
        registry
    }

    /// Installs `reader` for `ext`, replacing any previous one.
    pub fn register(&mut self, ext: SupportedExtension, reader: impl TagReader + 'static) {
        self.readers.insert(ext, Box::new(reader));
    }

    pub fn read(&self, ext: SupportedExtension, path: &Path) -> Result<TagRecord, TagError> {
        match self.readers.get(&ext) {
            Some(reader) => reader.read(path),
            None => Err(TagError::UnreadableContainer(ext.to_string())),
        }
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("extensions", &self.readers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads tags through lofty, preferring the tag format native to the container.
#[derive(Debug, Clone, Copy)]
pub struct LoftyReader {
    preferred: TagType,
}

impl LoftyReader {
    pub fn new(preferred: TagType) -> Self {
        LoftyReader { preferred }
    }
}

impl TagReader for LoftyReader {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        // Content wins over the extension; `.ogg` often holds Opus or FLAC.
        let tagged = Probe::open(path)?.guess_file_type()?.read()?;

        let tag = tagged
            .tag(self.preferred)
            .or_else(|| tagged.primary_tag())
            .or_else(|| tagged.first_tag())
            .ok_or(TagError::NoTag)?;
        trace!(path = %path.display(), tag_type = ?tag.tag_type(), "reading tags");

        let mut record = tag_to_record(tag);
        record.duration = Some(tagged.properties().duration());
        Ok(record)
    }
}

fn tag_to_record(tag: &Tag) -> TagRecord {
    let text = |key: &ItemKey| tag.get_string(key).map(str::to_string);

    TagRecord {
        artist_name: tag.artist().map(|s| s.into_owned()).unwrap_or_default(),
        release_name: tag.album().map(|s| s.into_owned()).unwrap_or_default(),
        recording_name: tag.title().map(|s| s.into_owned()).unwrap_or_default(),
        artist_mbid: text(&ItemKey::MusicBrainzArtistId),
        release_mbid: text(&ItemKey::MusicBrainzReleaseId),
        recording_mbid: text(&ItemKey::MusicBrainzRecordingId),
        duration: None,
        track_num: tag.track(),
        disc_num: tag.disk(),
    }
}

/// Stands in for containers no available decoder understands; every read fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreadableContainer;

impl TagReader for UnreadableContainer {
    fn read(&self, path: &Path) -> Result<TagRecord, TagError> {
        let ext = crate::extensions::extension_of(path).unwrap_or_default();
        Err(TagError::UnreadableContainer(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_every_supported_extension() {
        let registry = ReaderRegistry::with_defaults();
        for ext in SupportedExtension::ALL {
            assert!(registry.readers.contains_key(ext), "no reader for {ext}");
        }
    }

    #[test]
    fn wma_is_never_readable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("song.wma");
        std::fs::write(&path, b"not really asf").unwrap();

        let err = ReaderRegistry::default().read(SupportedExtension::Wma, &path).unwrap_err();
        assert!(matches!(err, TagError::UnreadableContainer(ext) if ext == "wma"));
    }

    #[test]
    fn garbage_audio_reports_a_decode_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.flac");
        std::fs::write(&path, b"definitely not a flac stream").unwrap();

        let err = ReaderRegistry::default().read(SupportedExtension::Flac, &path).unwrap_err();
        assert!(matches!(err, TagError::Probe(_)));
    }

    /// A minimal FLAC stream: STREAMINFO plus one Vorbis comment, no audio frames.
    fn flac_with_title(title: &str) -> Vec<u8> {
        let comment = format!("TITLE={title}");
        let mut vorbis = Vec::new();
        vorbis.extend_from_slice(&0u32.to_le_bytes());
        vorbis.extend_from_slice(&1u32.to_le_bytes());
        vorbis.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        vorbis.extend_from_slice(comment.as_bytes());

        let mut bytes = b"fLaC".to_vec();
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x22]);
        bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
        bytes.extend_from_slice(&[0; 6]);
        // 44100 Hz, 2 channels, 16 bits, 0 samples
        bytes.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0; 16]);
        let len = vorbis.len() as u32;
        bytes.extend_from_slice(&[0x84, (len >> 16) as u8, (len >> 8) as u8, len as u8]);
        bytes.extend_from_slice(&vorbis);
        bytes
    }

    #[test]
    fn container_is_detected_from_content_not_extension() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("mislabeled.ogg");
        std::fs::write(&path, flac_with_title("Hello")).unwrap();

        let record = ReaderRegistry::default().read(SupportedExtension::Ogg, &path).unwrap();
        assert_eq!(record.recording_name, "Hello");
    }

    #[test]
    fn empty_registry_rejects_everything() {
        let err = ReaderRegistry::empty()
            .read(SupportedExtension::Mp3, Path::new("/x.mp3"))
            .unwrap_err();
        assert!(matches!(err, TagError::UnreadableContainer(_)));
    }

    #[test]
    fn tag_fields_are_mapped() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.set_artist("Stereolab".into());
        tag.set_album("Dots and Loops".into());
        tag.set_title("Brakhage".into());
        tag.set_track(1);
        tag.insert_text(ItemKey::MusicBrainzReleaseId, "9a1bd9aa-0d9a-4e2e-a5b4-31a3b6d3d1b7".into());

        let record = tag_to_record(&tag);
        assert_eq!(record.artist_name, "Stereolab");
        assert_eq!(record.release_name, "Dots and Loops");
        assert_eq!(record.recording_name, "Brakhage");
        assert_eq!(record.track_num, Some(1));
        assert_eq!(record.disc_num, None);
        assert_eq!(record.release_mbid.as_deref(), Some("9a1bd9aa-0d9a-4e2e-a5b4-31a3b6d3d1b7"));
        assert_eq!(record.artist_mbid, None);
    }
}
