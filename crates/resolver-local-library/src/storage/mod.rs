mod embedded;

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use resolver_core::{
    NewRecording, Recording, RecordingId, RecordingUpdate, RemoteCrossReference, UpsertOutcome, Uuid,
};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, trace};

use embedded::migrations::runner;

use crate::error::{LibraryError, Result};
use crate::traits::RecordingStore;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite caps bound parameters per statement; deletes are issued in slices of this size.
const DELETE_CHUNK: usize = 500;

/// Row totals used by the consistency audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub recordings: u64,
    pub metadata: u64,
    pub remote: u64,
}

/// A local recording of a release, keyed for matching against remote songs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTrack {
    pub recording_id: RecordingId,
    pub track_num: u32,
    pub disc_num: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrossReferenceCounts {
    pub added: usize,
    pub updated: usize,
}

#[derive(Debug)]
pub struct LocalStorage {
    conn: Mutex<Connection>,
}

impl LocalStorage {
    /// Creates the index file if needed and brings its schema up to date.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Creating index database at {}", path.display());
        let conn = Connection::open(path).map_err(|source| LibraryError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Opens an existing index. A missing file is `StoreUnavailable`, never a fresh database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening index database at {}", path.display());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| LibraryError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        Self::initialize_connection(&mut conn)?;
        Ok(LocalStorage { conn: Mutex::new(conn) })
    }

    fn initialize_connection(conn: &mut Connection) -> Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        trace!("journal_mode = {mode}");
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let report = runner().run(conn)?;
        for migration in report.applied_migrations() {
            debug!("Applied migration {}", migration);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LibraryError::LockPoisoned)
    }
}

impl RecordingStore for LocalStorage {
    fn recording_by_path(&self, file_path: &str) -> Result<Option<Recording>> {
        let conn = self.lock()?;
        Ok(queries::recording_by_path(&conn, file_path)?)
    }

    fn upsert_recording(&self, recording: &NewRecording) -> Result<UpsertOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let outcome = match queries::recording_id_by_path(&tx, &recording.file_path)? {
            Some(id) => {
                queries::update_recording(&tx, id, &RecordingUpdate::from(recording))?;
                UpsertOutcome::Updated
            }
            None => {
                queries::insert_recording(&tx, recording)?;
                UpsertOutcome::Added
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn recording_paths(&self) -> Result<Vec<(RecordingId, String)>> {
        let conn = self.lock()?;
        Ok(queries::recording_paths(&conn)?)
    }

    fn delete_recordings(&self, ids: &[RecordingId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            deleted += queries::delete_recordings(&tx, chunk)?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.lock()?;
        Ok(TableCounts {
            recordings: queries::count_rows(&conn, "recording")?,
            metadata: queries::count_rows(&conn, "recording_metadata")?,
            remote: queries::count_rows(&conn, "recording_subsonic")?,
        })
    }

    fn release_tracks(&self, release_mbid: &Uuid) -> Result<Vec<ReleaseTrack>> {
        let conn = self.lock()?;
        Ok(queries::release_tracks(&conn, release_mbid)?)
    }

    fn upsert_cross_references(&self, refs: &[RemoteCrossReference]) -> Result<CrossReferenceCounts> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let counts = queries::upsert_cross_references(&tx, refs)?;
        tx.commit()?;
        Ok(counts)
    }
}

mod queries {
    use rusqlite::{OptionalExtension, Row, params, params_from_iter};

    use super::*;

    const RECORDING_COLUMNS: &str = "id, file_path, artist_name, release_name, recording_name, \
         artist_mbid, release_mbid, recording_mbid, mtime, duration_ms, track_num, disc_num";

    fn mbid_to_sql(mbid: Option<Uuid>) -> Option<String> {
        mbid.map(|u| u.hyphenated().to_string())
    }

    fn mbid_from_sql(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
        let raw: Option<String> = row.get(idx)?;
        Ok(resolver_core::normalize_mbid(raw.as_deref()))
    }

    fn recording_from_row(row: &Row) -> rusqlite::Result<Recording> {
        let duration_ms: Option<i64> = row.get(9)?;
        Ok(Recording {
            id: row.get(0)?,
            file_path: row.get(1)?,
            artist_name: row.get(2)?,
            release_name: row.get(3)?,
            recording_name: row.get(4)?,
            artist_mbid: mbid_from_sql(row, 5)?,
            release_mbid: mbid_from_sql(row, 6)?,
            recording_mbid: mbid_from_sql(row, 7)?,
            mtime: row.get(8)?,
            duration: duration_ms.map(|ms| Duration::from_millis(ms.max(0) as u64)),
            track_num: row.get(10)?,
            disc_num: row.get(11)?,
        })
    }

    pub fn recording_by_path(conn: &Connection, file_path: &str) -> rusqlite::Result<Option<Recording>> {
        let sql = format!("SELECT {RECORDING_COLUMNS} FROM recording WHERE file_path = ?1");
        conn.query_row(&sql, [file_path], recording_from_row).optional()
    }

    pub fn recording_id_by_path(conn: &Connection, file_path: &str) -> rusqlite::Result<Option<RecordingId>> {
        conn.query_row("SELECT id FROM recording WHERE file_path = ?1", [file_path], |row| row.get(0))
            .optional()
    }

    pub fn insert_recording(conn: &Connection, rec: &NewRecording) -> rusqlite::Result<RecordingId> {
        conn.execute(
            "INSERT INTO recording (file_path, artist_name, release_name, recording_name,
                                    artist_mbid, release_mbid, recording_mbid,
                                    mtime, duration_ms, track_num, disc_num)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rec.file_path,
                rec.artist_name,
                rec.release_name,
                rec.recording_name,
                mbid_to_sql(rec.artist_mbid),
                mbid_to_sql(rec.release_mbid),
                mbid_to_sql(rec.recording_mbid),
                rec.mtime,
                rec.duration.map(|d| d.as_millis() as i64),
                rec.track_num,
                rec.disc_num,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_recording(conn: &Connection, id: RecordingId, rec: &RecordingUpdate) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE recording
                SET artist_name = ?2, release_name = ?3, recording_name = ?4,
                    artist_mbid = ?5, release_mbid = ?6, recording_mbid = ?7,
                    mtime = ?8, track_num = ?9, disc_num = ?10
              WHERE id = ?1",
            params![
                id,
                rec.artist_name,
                rec.release_name,
                rec.recording_name,
                mbid_to_sql(rec.artist_mbid),
                mbid_to_sql(rec.release_mbid),
                mbid_to_sql(rec.recording_mbid),
                rec.mtime,
                rec.track_num,
                rec.disc_num,
            ],
        )?;
        Ok(())
    }

    pub fn recording_paths(conn: &Connection) -> rusqlite::Result<Vec<(RecordingId, String)>> {
        let mut stmt = conn.prepare("SELECT id, file_path FROM recording ORDER BY id")?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect()
    }

    pub fn delete_recordings(conn: &Connection, ids: &[RecordingId]) -> rusqlite::Result<usize> {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM recording WHERE id IN ({placeholders})");
        conn.execute(&sql, params_from_iter(ids))
    }

    pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn release_tracks(conn: &Connection, release_mbid: &Uuid) -> rusqlite::Result<Vec<ReleaseTrack>> {
        let mut stmt = conn.prepare(
            "SELECT id, track_num, disc_num
               FROM recording
              WHERE release_mbid = ?1
                AND track_num IS NOT NULL",
        )?;
        stmt.query_map([release_mbid.hyphenated().to_string()], |row| {
            Ok(ReleaseTrack {
                recording_id: row.get(0)?,
                track_num: row.get(1)?,
                disc_num: row.get(2)?,
            })
        })?
        .collect()
    }

    pub fn upsert_cross_references(
        conn: &Connection,
        refs: &[RemoteCrossReference],
    ) -> rusqlite::Result<CrossReferenceCounts> {
        let mut counts = CrossReferenceCounts::default();

        let mut stmt_exists = conn.prepare("SELECT 1 FROM recording_subsonic WHERE recording_id = ?1")?;
        let mut stmt_upsert = conn.prepare(
            "INSERT INTO recording_subsonic (recording_id, subsonic_id, last_updated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (recording_id) DO UPDATE
                SET subsonic_id = excluded.subsonic_id,
                    last_updated = excluded.last_updated",
        )?;

        for cross_ref in refs {
            let known = stmt_exists.exists([cross_ref.recording_id])?;
            stmt_upsert.execute(params![cross_ref.recording_id, cross_ref.remote_id, cross_ref.last_updated])?;
            if known {
                counts.updated += 1;
            } else {
                counts.added += 1;
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recording(path: &str, mtime: i64) -> NewRecording {
        NewRecording {
            file_path: path.into(),
            artist_name: "Boards of Canada".into(),
            release_name: "Geogaddi".into(),
            recording_name: "Music Is Math".into(),
            artist_mbid: None,
            release_mbid: Some(Uuid::parse_str("0a8e97fd-457c-30bc-938a-2fba79cb04e7").unwrap()),
            recording_mbid: None,
            mtime,
            duration: Some(Duration::from_millis(321_500)),
            track_num: Some(3),
            disc_num: 1,
        }
    }

    #[test]
    fn upsert_adds_then_updates_without_touching_duration() {
        let store = LocalStorage::open_in_memory().unwrap();

        let first = recording("/music/a.flac", 100);
        assert_eq!(store.upsert_recording(&first).unwrap(), UpsertOutcome::Added);

        let second = NewRecording {
            recording_name: "Music Is Math (edit)".into(),
            mtime: 200,
            duration: Some(Duration::from_secs(10)),
            ..first.clone()
        };
        assert_eq!(store.upsert_recording(&second).unwrap(), UpsertOutcome::Updated);

        let stored = store.recording_by_path("/music/a.flac").unwrap().unwrap();
        assert_eq!(stored.recording_name, "Music Is Math (edit)");
        assert_eq!(stored.mtime, 200);
        assert_eq!(stored.duration, Some(Duration::from_millis(321_500)));
        assert_eq!(stored.release_mbid, first.release_mbid);
        assert_eq!(store.table_counts().unwrap().recordings, 1);
    }

    #[test]
    fn unknown_path_is_absent() {
        let store = LocalStorage::open_in_memory().unwrap();
        assert!(store.recording_by_path("/nowhere.mp3").unwrap().is_none());
    }

    #[test]
    fn delete_spans_several_chunks() {
        let store = LocalStorage::open_in_memory().unwrap();
        for i in 0..1203 {
            store.upsert_recording(&recording(&format!("/music/{i}.mp3"), i)).unwrap();
        }

        let ids: Vec<RecordingId> = store.recording_paths().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 1203);

        assert_eq!(store.delete_recordings(&ids[..1201]).unwrap(), 1201);
        assert_eq!(store.recording_paths().unwrap().len(), 2);
        assert_eq!(store.delete_recordings(&[]).unwrap(), 0);
    }

    #[test]
    fn release_tracks_skip_untracked_recordings() {
        let store = LocalStorage::open_in_memory().unwrap();
        let tracked = recording("/music/1.flac", 1);
        let untracked = NewRecording {
            track_num: None,
            ..recording("/music/2.flac", 1)
        };
        store.upsert_recording(&tracked).unwrap();
        store.upsert_recording(&untracked).unwrap();

        let release = tracked.release_mbid.unwrap();
        let tracks = store.release_tracks(&release).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!((tracks[0].track_num, tracks[0].disc_num), (3, 1));

        assert!(store.release_tracks(&Uuid::nil()).unwrap().is_empty());
    }

    #[test]
    fn cross_references_are_added_then_replaced() {
        let store = LocalStorage::open_in_memory().unwrap();
        store.upsert_recording(&recording("/music/1.flac", 1)).unwrap();
        let (id, _) = store.recording_paths().unwrap()[0].clone();

        let counts = store
            .upsert_cross_references(&[RemoteCrossReference::new(id, "so-1")])
            .unwrap();
        assert_eq!(counts, CrossReferenceCounts { added: 1, updated: 0 });

        let counts = store
            .upsert_cross_references(&[RemoteCrossReference::new(id, "so-2")])
            .unwrap();
        assert_eq!(counts, CrossReferenceCounts { added: 0, updated: 1 });
        assert_eq!(store.table_counts().unwrap().remote, 1);

        store.delete_recordings(&[id]).unwrap();
        assert_eq!(store.table_counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn open_refuses_missing_file() {
        let tmp = tempdir().unwrap();
        let err = LocalStorage::open(tmp.path().join("index.db")).unwrap_err();
        assert!(matches!(err, LibraryError::StoreUnavailable { .. }));
    }

    #[test]
    fn created_file_can_be_reopened() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("index.db");
        {
            let store = LocalStorage::create(&path).unwrap();
            store.upsert_recording(&recording("/music/1.flac", 1)).unwrap();
        }
        let store = LocalStorage::open(&path).unwrap();
        assert_eq!(store.table_counts().unwrap().recordings, 1);
    }
}
