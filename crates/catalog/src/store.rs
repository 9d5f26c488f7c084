use std::fs;
use std::path::Path;

use common::{Album, AlbumCollaboration, Artist, Track, TrackCollaboration};
use redb::{Database, ReadableTable, Table, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CatalogError;

const KEY_SEP: char = '\x1f';
const NO_VALUE: &[u8] = &[];

const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");
const ARTISTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("artists");
const ARTIST_NAMES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("artist_names");
const ALBUMS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("albums");
const ALBUM_KEYS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("album_keys");
const ALBUM_FEAT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("album_feat");
const TRACKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("tracks");
const TRACK_KEYS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("track_keys");
const TRACK_LOCATIONS_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("track_locations");
const TRACK_FEAT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("track_feat");

const ARTIST_SEQ_KEY: &str = "seq.artists";
const ALBUM_SEQ_KEY: &str = "seq.albums";
const TRACK_SEQ_KEY: &str = "seq.tracks";

// Index tables map identity keys to ids, so every write is insert-if-absent.
pub struct CatalogStore {
    db: Database,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
    pub album_links: usize,
    pub track_links: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackLocation {
    pub disc: String,
    pub path: String,
    pub file: String,
}

#[derive(Clone, Debug)]
pub struct NewTrack {
    pub title: String,
    pub artist_id: u64,
    pub track_number: Option<u32>,
    pub byte_size: u64,
    pub duration_seconds: u64,
    pub location: TrackLocation,
}

#[derive(Clone, Debug)]
pub struct ItemRecord {
    pub album_title: String,
    pub album_artist_id: u64,
    pub album_collaborators: Vec<u64>,
    pub track: NewTrack,
    pub track_collaborators: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistOutcome {
    pub album_id: u64,
    pub track_id: u64,
    pub new_album: bool,
    pub new_track: bool,
    pub new_links: usize,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let db = open_or_create_db(path)?;
        let store = Self { db };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write()?;
        {
            write_txn.open_table(META_TABLE)?;
            write_txn.open_table(ARTISTS_TABLE)?;
            write_txn.open_table(ARTIST_NAMES_TABLE)?;
            write_txn.open_table(ALBUMS_TABLE)?;
            write_txn.open_table(ALBUM_KEYS_TABLE)?;
            write_txn.open_table(ALBUM_FEAT_TABLE)?;
            write_txn.open_table(TRACKS_TABLE)?;
            write_txn.open_table(TRACK_KEYS_TABLE)?;
            write_txn.open_table(TRACK_LOCATIONS_TABLE)?;
            write_txn.open_table(TRACK_FEAT_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let stats = CatalogStats {
            artists: read_txn.open_table(ARTISTS_TABLE)?.len()? as usize,
            albums: read_txn.open_table(ALBUMS_TABLE)?.len()? as usize,
            tracks: read_txn.open_table(TRACKS_TABLE)?.len()? as usize,
            album_links: read_txn.open_table(ALBUM_FEAT_TABLE)?.len()? as usize,
            track_links: read_txn.open_table(TRACK_FEAT_TABLE)?.len()? as usize,
        };
        Ok(stats)
    }

    pub fn load_artists(&self) -> Result<Vec<Artist>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ARTISTS_TABLE)?;
        let mut artists = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let artist: Artist = decode_value(entry.1.value())?;
            artists.push(artist);
        }
        Ok(artists)
    }

    pub fn insert_artist(&self, name: &str) -> Result<u64, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut names_table = write_txn.open_table(ARTIST_NAMES_TABLE)?;
            let existing = names_table.get(name)?.map(|value| value.value());
            match existing {
                Some(id) => id,
                None => {
                    let mut meta_table = write_txn.open_table(META_TABLE)?;
                    let mut artists_table = write_txn.open_table(ARTISTS_TABLE)?;
                    let id = next_id(&mut meta_table, ARTIST_SEQ_KEY)?;
                    let artist = Artist {
                        id,
                        name: name.to_string(),
                    };
                    let artist_bytes = encode_value(&artist)?;
                    artists_table.insert(id, artist_bytes.as_slice())?;
                    names_table.insert(name, id)?;
                    id
                }
            }
        };
        write_txn.commit()?;
        Ok(id)
    }

    pub fn find_track_at(&self, location: &TrackLocation) -> Result<Option<u64>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRACK_LOCATIONS_TABLE)?;
        let key = location_key(location);
        let id = table.get(key.as_str())?.map(|value| value.value());
        Ok(id)
    }

    pub fn persist_item(&self, item: &ItemRecord) -> Result<PersistOutcome, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            let mut albums_table = write_txn.open_table(ALBUMS_TABLE)?;
            let mut album_keys_table = write_txn.open_table(ALBUM_KEYS_TABLE)?;
            let mut album_feat_table = write_txn.open_table(ALBUM_FEAT_TABLE)?;
            let mut tracks_table = write_txn.open_table(TRACKS_TABLE)?;
            let mut track_keys_table = write_txn.open_table(TRACK_KEYS_TABLE)?;
            let mut track_locations_table = write_txn.open_table(TRACK_LOCATIONS_TABLE)?;
            let mut track_feat_table = write_txn.open_table(TRACK_FEAT_TABLE)?;

            let album_key = album_key(&item.album_title, item.album_artist_id);
            let existing_album = album_keys_table
                .get(album_key.as_str())?
                .map(|value| value.value());
            let (album_id, new_album) = match existing_album {
                Some(id) => (id, false),
                None => {
                    let id = next_id(&mut meta_table, ALBUM_SEQ_KEY)?;
                    let album = Album {
                        id,
                        title: item.album_title.clone(),
                        artist_id: item.album_artist_id,
                    };
                    let album_bytes = encode_value(&album)?;
                    albums_table.insert(id, album_bytes.as_slice())?;
                    album_keys_table.insert(album_key.as_str(), id)?;
                    (id, true)
                }
            };

            let mut new_links = 0usize;
            for &artist_id in &item.album_collaborators {
                let link = AlbumCollaboration {
                    album_id,
                    artist_id,
                };
                let key = link_key(link.album_id, link.artist_id);
                let prev = album_feat_table.insert(key.as_str(), NO_VALUE)?;
                if prev.is_none() {
                    new_links += 1;
                }
            }

            let new_track = &item.track;
            let track_key = track_key(
                &new_track.title,
                album_id,
                new_track.artist_id,
                &new_track.location.disc,
            );
            let existing_track = track_keys_table
                .get(track_key.as_str())?
                .map(|value| value.value());
            let (track_id, inserted_track) = match existing_track {
                Some(id) => (id, false),
                None => {
                    let id = next_id(&mut meta_table, TRACK_SEQ_KEY)?;
                    let track = Track {
                        id,
                        title: new_track.title.clone(),
                        album_id,
                        artist_id: new_track.artist_id,
                        track_number: new_track.track_number,
                        byte_size: new_track.byte_size,
                        duration_seconds: new_track.duration_seconds,
                        disc_label: new_track.location.disc.clone(),
                        source_path: new_track.location.path.clone(),
                        source_file: new_track.location.file.clone(),
                    };
                    let track_bytes = encode_value(&track)?;
                    tracks_table.insert(id, track_bytes.as_slice())?;
                    track_keys_table.insert(track_key.as_str(), id)?;
                    let location_key = location_key(&new_track.location);
                    track_locations_table.insert(location_key.as_str(), id)?;
                    (id, true)
                }
            };

            for &artist_id in &item.track_collaborators {
                let link = TrackCollaboration {
                    track_id,
                    artist_id,
                };
                let key = link_key(link.track_id, link.artist_id);
                let prev = track_feat_table.insert(key.as_str(), NO_VALUE)?;
                if prev.is_none() {
                    new_links += 1;
                }
            }

            PersistOutcome {
                album_id,
                track_id,
                new_album,
                new_track: inserted_track,
                new_links,
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    pub fn get_album(&self, album_id: u64) -> Result<Option<Album>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ALBUMS_TABLE)?;
        let album = match table.get(album_id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(album)
    }

    pub fn get_track(&self, track_id: u64) -> Result<Option<Track>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRACKS_TABLE)?;
        let track = match table.get(track_id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(track)
    }

    pub fn album_collaborators(
        &self,
        album_id: u64,
    ) -> Result<Vec<AlbumCollaboration>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ALBUM_FEAT_TABLE)?;
        let links = linked_ids(&table, album_id)?
            .into_iter()
            .map(|artist_id| AlbumCollaboration {
                album_id,
                artist_id,
            })
            .collect();
        Ok(links)
    }

    pub fn track_collaborators(
        &self,
        track_id: u64,
    ) -> Result<Vec<TrackCollaboration>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRACK_FEAT_TABLE)?;
        let links = linked_ids(&table, track_id)?
            .into_iter()
            .map(|artist_id| TrackCollaboration {
                track_id,
                artist_id,
            })
            .collect();
        Ok(links)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn next_id(
    meta_table: &mut Table<&'static str, u64>,
    seq_key: &str,
) -> Result<u64, CatalogError> {
    let current = meta_table.get(seq_key)?.map(|value| value.value()).unwrap_or(0);
    let next = current + 1;
    meta_table.insert(seq_key, next)?;
    Ok(next)
}

fn linked_ids(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    owner_id: u64,
) -> Result<Vec<u64>, CatalogError> {
    let prefix = prefix_key(owner_id);
    let mut end = prefix.clone();
    end.push('\u{10ffff}');
    let mut ids = Vec::new();
    for entry in table.range(prefix.as_str()..end.as_str())? {
        let entry = entry?;
        let key = entry.0.value();
        let (_, artist_id) = split_key_last(key)?;
        let artist_id = artist_id
            .parse::<u64>()
            .map_err(|_| CatalogError::KeyParse(key.to_string()))?;
        ids.push(artist_id);
    }
    Ok(ids)
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

fn album_key(title: &str, artist_id: u64) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push(KEY_SEP);
    out.push_str(&format_id(artist_id));
    out
}

fn track_key(title: &str, album_id: u64, artist_id: u64, disc: &str) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push(KEY_SEP);
    out.push_str(&format_id(album_id));
    out.push(KEY_SEP);
    out.push_str(&format_id(artist_id));
    out.push(KEY_SEP);
    out.push_str(disc);
    out
}

fn location_key(location: &TrackLocation) -> String {
    let mut out = String::new();
    out.push_str(&location.disc);
    out.push(KEY_SEP);
    out.push_str(&location.path);
    out.push(KEY_SEP);
    out.push_str(&location.file);
    out
}

fn link_key(owner_id: u64, artist_id: u64) -> String {
    let mut out = prefix_key(owner_id);
    out.push_str(&format_id(artist_id));
    out
}

fn prefix_key(owner_id: u64) -> String {
    let mut out = format_id(owner_id);
    out.push(KEY_SEP);
    out
}

// Zero-padded so that string order matches numeric order.
fn format_id(id: u64) -> String {
    format!("{:020}", id)
}

fn split_key_last(value: &str) -> Result<(&str, &str), CatalogError> {
    let idx = value
        .rfind(KEY_SEP)
        .ok_or_else(|| CatalogError::KeyParse(value.to_string()))?;
    let next = idx + KEY_SEP.len_utf8();
    Ok((&value[..idx], &value[next..]))
}
