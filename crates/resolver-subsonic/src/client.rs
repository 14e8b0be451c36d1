use config::Config;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::catalog::RemoteCatalog;
use crate::error::{Result, SyncError};
use crate::types::{
    AlbumInfo, AlbumInfoPayload, AlbumListPayload, AlbumPayload, Envelope, PlaylistPayload, RemoteAlbum,
    RemoteSong,
};

pub const API_VERSION: &str = "1.16.1";
pub const CLIENT_NAME: &str = "content-resolver";

/// Connection settings, read from the `[subsonic]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubsonicConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl SubsonicConfig {
    /// `None` when the settings carry no `[subsonic]` table.
    pub fn from_settings(settings: &Config) -> std::result::Result<Option<Self>, config::ConfigError> {
        match settings.get::<SubsonicConfig>("subsonic") {
            Ok(cfg) => Ok(Some(cfg)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Blocking Subsonic REST client.
#[derive(Debug, Clone)]
pub struct SubsonicClient {
    http: Client,
    config: SubsonicConfig,
}

impl SubsonicClient {
    pub fn new(config: SubsonicConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("{CLIENT_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(SubsonicClient { http, config })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}:{}/rest/{method}.view",
            self.config.host.trim_end_matches('/'),
            self.config.port
        )
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("u", self.config.user.clone()),
            ("p", format!("enc:{}", hex::encode(&self.config.password))),
            ("v", API_VERSION.to_string()),
            ("c", CLIENT_NAME.to_string()),
            ("f", "json".to_string()),
        ]
    }

    #[instrument(level = "debug", skip(self, params))]
    fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&'static str, String)]) -> Result<T> {
        let mut query = self.auth_params();
        query.extend_from_slice(params);

        let envelope: Envelope<T> = self
            .http
            .get(self.endpoint(method))
            .query(&query)
            .send()?
            .error_for_status()?
            .json()?;

        let response = envelope.response;
        if response.status != "ok" {
            let (code, message) = response
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, format!("status {}", response.status)));
            return Err(SyncError::Api { code, message });
        }
        Ok(response.payload)
    }
}

impl RemoteCatalog for SubsonicClient {
    fn album_list(&self, offset: usize, size: usize) -> Result<Vec<RemoteAlbum>> {
        let payload: AlbumListPayload = self.call(
            "getAlbumList",
            &[
                ("type", "alphabeticalByArtist".to_string()),
                ("size", size.to_string()),
                ("offset", offset.to_string()),
            ],
        )?;
        let list = payload.album_list.ok_or(SyncError::MissingPayload("albumList"))?;
        Ok(list.album)
    }

    fn album_info(&self, album_id: &str) -> Result<AlbumInfo> {
        let payload: AlbumInfoPayload = self.call("getAlbumInfo2", &[("id", album_id.to_string())])?;
        Ok(payload.album_info.unwrap_or_default())
    }

    fn album_songs(&self, album_id: &str) -> Result<Option<Vec<RemoteSong>>> {
        let payload: AlbumPayload = self.call("getAlbum", &[("id", album_id.to_string())])?;
        let album = payload.album.ok_or(SyncError::MissingPayload("album"))?;
        Ok(album.song)
    }

    fn create_playlist(&self, name: &str, song_ids: &[String]) -> Result<()> {
        let mut params = vec![("name", name.to_string())];
        params.extend(song_ids.iter().map(|id| ("songId", id.clone())));

        let payload: PlaylistPayload = self.call("createPlaylist", &params)?;
        debug!(returned = payload.playlist.is_some(), "playlist '{name}' created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn client() -> SubsonicClient {
        SubsonicClient::new(SubsonicConfig {
            host: "http://music.local/".into(),
            port: 4533,
            user: "alice".into(),
            password: "sesame".into(),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_host_port_and_method() {
        assert_eq!(client().endpoint("getAlbum"), "http://music.local:4533/rest/getAlbum.view");
    }

    #[test]
    fn password_is_hex_encoded() {
        let params = client().auth_params();
        assert!(params.contains(&("p", "enc:736573616d65".to_string())));
        assert!(params.contains(&("v", "1.16.1".to_string())));
        assert!(params.contains(&("c", "content-resolver".to_string())));
        assert!(params.contains(&("f", "json".to_string())));
    }

    #[test]
    fn config_section_is_optional() {
        let empty = Config::builder().build().unwrap();
        assert_eq!(SubsonicConfig::from_settings(&empty).unwrap(), None);

        let settings = Config::builder()
            .add_source(File::from_str(
                "[subsonic]\nhost = \"http://localhost\"\nport = 4040\nuser = \"me\"\npassword = \"pw\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg = SubsonicConfig::from_settings(&settings).unwrap().unwrap();
        assert_eq!(cfg.port, 4040);
        assert_eq!(cfg.user, "me");
    }
}
