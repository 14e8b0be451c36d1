use std::collections::HashMap;
use std::fmt;

use resolver_core::{RecordingId, RemoteCrossReference, normalize_mbid};
use resolver_local_library::RecordingStore;
use tracing::{info, instrument, warn};

use crate::catalog::RemoteCatalog;
use crate::error::Result;
use crate::types::RemoteAlbum;

/// Albums requested per listing call; a shorter page ends the sync.
pub const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    /// Remote songs examined.
    pub total: u64,
    pub added: u64,
    pub updated: u64,
    /// Reserved. Stale mappings are never pruned, so this stays zero.
    pub removed: u64,
    pub albums: u64,
    pub albums_without_mbid: u64,
    pub unmatched: u64,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checked {} tracks:", self.total)?;
        writeln!(f, "  {:5} tracks added", self.added)?;
        writeln!(f, "  {:5} tracks updated", self.updated)?;
        write!(f, "  {:5} tracks removed", self.removed)
    }
}

/// Matches remote songs to local recordings by release MBID, track and disc.
pub struct SyncReconciler<'a, C: RemoteCatalog + ?Sized, S: RecordingStore + ?Sized> {
    catalog: &'a C,
    store: &'a S,
}

impl<'a, C: RemoteCatalog + ?Sized, S: RecordingStore + ?Sized> SyncReconciler<'a, C, S> {
    pub fn new(catalog: &'a C, store: &'a S) -> Self {
        SyncReconciler { catalog, store }
    }

    /// Walks the remote album list page by page. Each page's matches are
    /// committed before the next page is requested, so an aborted sync keeps
    /// the pages already done.
    #[instrument(level = "info", skip_all)]
    pub fn sync(&self) -> Result<SyncStats> {
        let mut stats = SyncStats::default();
        let mut offset = 0;

        loop {
            let albums = self.catalog.album_list(offset, PAGE_SIZE)?;
            let albums_this_batch = albums.len();
            offset += albums_this_batch;

            let mut pending = Vec::new();
            for album in &albums {
                stats.albums += 1;
                self.reconcile_album(album, &mut pending, &mut stats)?;
            }

            let counts = self.store.upsert_cross_references(&pending)?;
            stats.added += counts.added as u64;
            stats.updated += counts.updated as u64;

            info!("fetched {albums_this_batch} releases");
            if albums_this_batch < PAGE_SIZE {
                break;
            }
        }

        Ok(stats)
    }

    fn reconcile_album(
        &self,
        album: &RemoteAlbum,
        pending: &mut Vec<RemoteCrossReference>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let info = self.catalog.album_info(&album.id)?;
        let Some(release_mbid) = normalize_mbid(info.music_brainz_id.as_deref()) else {
            warn!("subsonic album '{}' by '{}' has no MBID", album.name(), album.artist);
            stats.albums_without_mbid += 1;
            return Ok(());
        };

        let release_tracks: HashMap<(u32, u32), RecordingId> = self
            .store
            .release_tracks(&release_mbid)?
            .into_iter()
            .map(|t| ((t.track_num, t.disc_num), t.recording_id))
            .collect();

        let songs = self.catalog.album_songs(&album.id)?;

        if release_tracks.is_empty() {
            info!(
                "For album {release_mbid}: loaded 0 of {} expected tracks from DB.",
                songs.as_ref().map_or(0, Vec::len)
            );
        }

        info!("album '{}' by '{}'", album.name(), album.artist);
        let Some(songs) = songs else {
            warn!("No songs returned");
            return Ok(());
        };

        for song in songs {
            stats.total += 1;
            let key = song.track.map(|track| (track, song.disc_number.unwrap_or(1)));
            match key.and_then(|k| release_tracks.get(&k)) {
                Some(&recording_id) => pending.push(RemoteCrossReference::new(recording_id, song.id)),
                None => {
                    stats.unmatched += 1;
                    warn!("Song not matched: {}", song.title);
                }
            }
        }

        Ok(())
    }
}
