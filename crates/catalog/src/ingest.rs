use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use common::{disc_location, ArtistCredit};
use metadata::{TagRead, TagReader};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::decision::DecisionChannel;
use crate::decision_log::DecisionLog;
use crate::registry::ArtistRegistry;
use crate::resolver::{FuzzyResolver, ResolverPolicy};
use crate::splitter::split;
use crate::store::{CatalogStore, ItemRecord, NewTrack, PersistOutcome, TrackLocation};
use crate::CatalogError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    Unreadable,
    NoTag,
    NoArtist,
    NoAlbum,
    NoAlbumArtist,
    NoTitle,
    NoDuration,
    NoSize,
    BlankArtist,
}

impl SkipReason {
    pub fn code(self) -> &'static str {
        match self {
            SkipReason::Unreadable => "unreadable",
            SkipReason::NoTag => "no-tag",
            SkipReason::NoArtist => "no-artist",
            SkipReason::NoAlbum => "no-album",
            SkipReason::NoAlbumArtist => "no-album-artist",
            SkipReason::NoTitle => "no-title",
            SkipReason::NoDuration => "no-duration",
            SkipReason::NoSize => "no-size",
            SkipReason::BlankArtist => "blank-artist",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemFields {
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub title: String,
    pub track_number: Option<u32>,
    pub byte_size: u64,
    pub duration_seconds: u64,
    pub location: TrackLocation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Ingested(PersistOutcome),
    Duplicate { track_id: u64 },
    Skipped(SkipReason),
    Valid,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub valid: usize,
    pub ingested: usize,
    pub new_tracks: usize,
    pub duplicates: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.files += 1;
        match outcome {
            ItemOutcome::Ingested(persisted) => {
                self.ingested += 1;
                if persisted.new_track {
                    self.new_tracks += 1;
                }
            }
            ItemOutcome::Duplicate { .. } => self.duplicates += 1,
            ItemOutcome::Skipped(reason) => *self.skipped.entry(*reason).or_insert(0) += 1,
            ItemOutcome::Valid => self.valid += 1,
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} valid, {} ingested ({} new tracks), {} duplicates, {} skipped",
            self.files,
            self.valid,
            self.ingested,
            self.new_tracks,
            self.duplicates,
            self.skipped_total()
        )?;
        for (reason, count) in &self.skipped {
            write!(f, ", {}={}", reason, count)?;
        }
        Ok(())
    }
}

pub fn mp3_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry below {:?}: {}", root, err);
                continue;
            }
        };
        if entry.file_type().is_file() && is_mp3(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

pub fn extract_fields<R: TagReader + ?Sized>(
    reader: &R,
    path: &Path,
) -> Result<ItemFields, SkipReason> {
    let info = match reader.read(path) {
        TagRead::Tagged(info) => info,
        TagRead::NoTag => return Err(SkipReason::NoTag),
        TagRead::Unreadable(err) => {
            debug!("Failed to read tags for {:?}: {}", path, err);
            return Err(SkipReason::Unreadable);
        }
    };

    let artist = required_text(info.artist, SkipReason::NoArtist)?;
    let title = required_text(info.title, SkipReason::NoTitle)?;
    let album = required_text(info.album, SkipReason::NoAlbum)?;
    let album_artist = required_text(info.album_artist, SkipReason::NoAlbumArtist)?;
    let duration_seconds = info.duration_secs.ok_or(SkipReason::NoDuration)?;
    let byte_size = info.size_bytes.ok_or(SkipReason::NoSize)?;

    let dir = path
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disc = disc_location(&dir);
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ItemFields {
        artist,
        album_artist,
        album,
        title,
        track_number: info.track_no,
        byte_size,
        duration_seconds,
        location: TrackLocation {
            disc: disc.disc,
            path: disc.path,
            file,
        },
    })
}

fn required_text(value: Option<String>, missing: SkipReason) -> Result<String, SkipReason> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(missing),
    }
}

fn log_skip(path: &Path, reason: SkipReason) {
    warn!("Skipping {:?}: {}", path, reason);
}

pub fn check_tree<R: TagReader + ?Sized>(root: &Path, reader: &R) -> RunSummary {
    let mut summary = RunSummary::default();
    for path in mp3_files(root) {
        let outcome = match extract_fields(reader, &path) {
            Ok(_) => ItemOutcome::Valid,
            Err(reason) => {
                log_skip(&path, reason);
                ItemOutcome::Skipped(reason)
            }
        };
        summary.record(&outcome);
    }
    info!("Check finished: {}", summary);
    summary
}

pub struct Ingestor<R, C> {
    store: CatalogStore,
    reader: R,
    channel: C,
    registry: ArtistRegistry,
    decisions: DecisionLog,
    resolver: FuzzyResolver,
}

impl<R: TagReader, C: DecisionChannel> Ingestor<R, C> {
    pub fn new(
        store: CatalogStore,
        reader: R,
        channel: C,
        policy: ResolverPolicy,
    ) -> Result<Self, CatalogError> {
        let registry = ArtistRegistry::load(&store)?;
        Ok(Self {
            store,
            reader,
            channel,
            registry,
            decisions: DecisionLog::new(),
            resolver: FuzzyResolver::new(policy),
        })
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn registry(&self) -> &ArtistRegistry {
        &self.registry
    }

    pub fn ingest_tree(&mut self, root: &Path) -> Result<RunSummary, CatalogError> {
        let files = mp3_files(root);
        info!("Found {} mp3 files below {:?}", files.len(), root);
        let mut summary = RunSummary::default();
        for path in files {
            let outcome = self.ingest_file(&path)?;
            summary.record(&outcome);
        }
        info!("Ingest finished: {}", summary);
        Ok(summary)
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<ItemOutcome, CatalogError> {
        let fields = match extract_fields(&self.reader, path) {
            Ok(fields) => fields,
            Err(reason) => {
                log_skip(path, reason);
                return Ok(ItemOutcome::Skipped(reason));
            }
        };

        if let Some(track_id) = self.store.find_track_at(&fields.location)? {
            debug!("Already catalogued {:?} as track {}", path, track_id);
            return Ok(ItemOutcome::Duplicate { track_id });
        }

        let record = match self.resolve(&fields) {
            Ok(record) => record,
            Err(CatalogError::BlankArtistName) => {
                log_skip(path, SkipReason::BlankArtist);
                return Ok(ItemOutcome::Skipped(SkipReason::BlankArtist));
            }
            Err(err) => return Err(err),
        };

        let persisted = self.store.persist_item(&record)?;
        if persisted.new_track {
            info!(
                "Added {:?} by {} on disc {} (track {})",
                fields.title, fields.artist, fields.location.disc, persisted.track_id
            );
        } else {
            debug!("Track {:?} already stored as {}", fields.title, persisted.track_id);
        }
        Ok(ItemOutcome::Ingested(persisted))
    }

    fn resolve(&mut self, fields: &ItemFields) -> Result<ItemRecord, CatalogError> {
        let track_credit = split(
            &fields.artist,
            &self.registry,
            &mut self.decisions,
            &mut self.channel,
        )
        .map_err(CatalogError::Decision)?;
        let album_credit = split(
            &fields.album_artist,
            &self.registry,
            &mut self.decisions,
            &mut self.channel,
        )
        .map_err(CatalogError::Decision)?;

        let (track_artist_id, track_collaborators) = self.resolve_credit(&track_credit)?;
        let (album_artist_id, album_collaborators) = self.resolve_credit(&album_credit)?;

        Ok(ItemRecord {
            album_title: fields.album.clone(),
            album_artist_id,
            album_collaborators,
            track: NewTrack {
                title: fields.title.clone(),
                artist_id: track_artist_id,
                track_number: fields.track_number,
                byte_size: fields.byte_size,
                duration_seconds: fields.duration_seconds,
                location: fields.location.clone(),
            },
            track_collaborators,
        })
    }

    fn resolve_credit(&mut self, credit: &ArtistCredit) -> Result<(u64, Vec<u64>), CatalogError> {
        let primary = self.registry.resolve_or_create(
            &credit.primary,
            &self.store,
            &self.resolver,
            &mut self.channel,
        )?;
        let mut collaborators = Vec::new();
        for name in &credit.collaborators {
            let resolved = self.registry.resolve_or_create(
                name,
                &self.store,
                &self.resolver,
                &mut self.channel,
            )?;
            if resolved.id != primary.id && !collaborators.contains(&resolved.id) {
                collaborators.push(resolved.id);
            }
        }
        Ok((primary.id, collaborators))
    }
}
