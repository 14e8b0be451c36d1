use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::catalog::RemoteCatalog;
use crate::error::{Result, SyncError};

/// Key of the MusicBrainz track extension in a JSPF document.
pub const JSPF_TRACK_EXTENSION: &str = "https://musicbrainz.org/doc/jspf#track";

/// A JSPF playlist as written by ListenBrainz.
#[derive(Debug, Clone, Deserialize)]
pub struct Jspf {
    pub playlist: JspfPlaylist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JspfPlaylist {
    pub title: String,
    #[serde(default)]
    pub track: Vec<JspfTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JspfTrack {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub extension: HashMap<String, Value>,
}

impl JspfTrack {
    fn subsonic_identifier(&self) -> Option<&str> {
        self.extension
            .get(JSPF_TRACK_EXTENSION)?
            .pointer("/additional_metadata/subsonic_identifier")?
            .as_str()
    }
}

impl Jspf {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Remote song ids in playlist order. The id is the last `/` segment of
    /// each track's subsonic identifier.
    pub fn song_ids(&self) -> Result<Vec<String>> {
        self.playlist
            .track
            .iter()
            .enumerate()
            .map(|(i, track)| {
                let identifier = track.subsonic_identifier().ok_or_else(|| {
                    SyncError::InvalidPlaylist(format!(
                        "track {} ({}) has no subsonic identifier",
                        i + 1,
                        track.title.as_deref().unwrap_or("untitled")
                    ))
                })?;
                let id = identifier.rsplit_once('/').map_or(identifier, |(_, tail)| tail);
                Ok(id.to_string())
            })
            .collect()
    }
}

/// Creates the playlist on the remote server; returns the number of songs sent.
pub fn upload_playlist<C: RemoteCatalog + ?Sized>(catalog: &C, jspf: &Jspf) -> Result<usize> {
    let song_ids = jspf.song_ids()?;
    catalog.create_playlist(&jspf.playlist.title, &song_ids)?;
    info!("Uploaded playlist '{}' with {} songs", jspf.playlist.title, song_ids.len());
    Ok(song_ids.len())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tempfile::tempdir;

    use super::*;
    use crate::types::{AlbumInfo, RemoteAlbum, RemoteSong};

    const FIXTURE: &str = r#"{
        "playlist": {
            "title": "Trip hop radio",
            "track": [
                {
                    "title": "Teardrop",
                    "identifier": "https://musicbrainz.org/recording/a6b4b6b8",
                    "extension": {
                        "https://musicbrainz.org/doc/jspf#track": {
                            "additional_metadata": {
                                "subsonic_identifier": "https://subsonic.example.org/song/so-17"
                            }
                        }
                    }
                },
                {
                    "title": "Glory Box",
                    "extension": {
                        "https://musicbrainz.org/doc/jspf#track": {
                            "additional_metadata": {"subsonic_identifier": "so-42"}
                        }
                    }
                }
            ]
        }
    }"#;

    #[derive(Default)]
    struct RecordingCatalog {
        created: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl RemoteCatalog for RecordingCatalog {
        fn album_list(&self, _: usize, _: usize) -> Result<Vec<RemoteAlbum>> {
            Ok(Vec::new())
        }
        fn album_info(&self, _: &str) -> Result<AlbumInfo> {
            Ok(AlbumInfo::default())
        }
        fn album_songs(&self, _: &str) -> Result<Option<Vec<RemoteSong>>> {
            Ok(None)
        }
        fn create_playlist(&self, name: &str, song_ids: &[String]) -> Result<()> {
            self.created.borrow_mut().push((name.to_string(), song_ids.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn ids_are_last_path_segments() {
        let jspf: Jspf = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(jspf.song_ids().unwrap(), vec!["so-17", "so-42"]);
    }

    #[test]
    fn upload_sends_title_and_ids() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("radio.jspf");
        std::fs::write(&path, FIXTURE).unwrap();

        let catalog = RecordingCatalog::default();
        let jspf = Jspf::from_path(&path).unwrap();
        assert_eq!(upload_playlist(&catalog, &jspf).unwrap(), 2);

        let created = catalog.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "Trip hop radio");
        assert_eq!(created[0].1, vec!["so-17".to_string(), "so-42".to_string()]);
    }

    #[test]
    fn track_without_identifier_is_rejected() {
        let jspf: Jspf = serde_json::from_str(
            r#"{"playlist": {"title": "x", "track": [{"title": "Roads", "extension": {}}]}}"#,
        )
        .unwrap();

        let catalog = RecordingCatalog::default();
        let err = upload_playlist(&catalog, &jspf).unwrap_err();
        assert!(matches!(err, SyncError::InvalidPlaylist(msg) if msg.contains("Roads")));
        assert!(catalog.created.borrow().is_empty());
    }
}
