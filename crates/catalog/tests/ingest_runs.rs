use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use catalog::{
    check_tree, ArtistChoice, CatalogError, CatalogStore, DecisionChannel, Ingestor, ItemOutcome,
    ResolverPolicy, SkipReason,
};
use common::{AlbumCollaboration, ArtistCredit, TrackCollaboration};
use metadata::{TagInfo, TagRead, TagReader};

// Tags looked up by file name.
#[derive(Clone, Default)]
struct FakeReader {
    tags: HashMap<String, TagInfo>,
}

impl FakeReader {
    fn with(mut self, file: &str, info: TagInfo) -> Self {
        self.tags.insert(file.to_string(), info);
        self
    }
}

impl TagReader for FakeReader {
    fn read(&self, path: &Path) -> TagRead {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.tags.get(&name) {
            Some(info) => TagRead::Tagged(info.clone()),
            None => TagRead::NoTag,
        }
    }
}

// Accepts every name as typed and every proposed split, unless told otherwise.
#[derive(Default)]
struct Operator {
    artist_prompts: usize,
    split_prompts: usize,
    reject_splits: bool,
    typed: Vec<Option<String>>,
    closed: bool,
}

impl DecisionChannel for Operator {
    fn choose_artist(&mut self, _name: &str, _suggestions: &[String]) -> io::Result<ArtistChoice> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        self.artist_prompts += 1;
        Ok(ArtistChoice::Literal)
    }

    fn confirm_split(&mut self, _raw: &str, _proposal: &ArtistCredit) -> io::Result<bool> {
        self.split_prompts += 1;
        Ok(!self.reject_splits)
    }

    fn enter_primary(&mut self, _raw: &str) -> io::Result<String> {
        match self.typed.remove(0) {
            Some(name) => Ok(name),
            None => Err(io::Error::new(io::ErrorKind::InvalidInput, "expected a name")),
        }
    }

    fn enter_collaborator(&mut self, _raw: &str, _primary: &str) -> io::Result<Option<String>> {
        Ok(self.typed.remove(0))
    }
}

fn tag(artist: &str, album_artist: &str, album: &str, title: &str) -> TagInfo {
    TagInfo {
        artist: Some(artist.to_string()),
        album_artist: Some(album_artist.to_string()),
        album: Some(album.to_string()),
        title: Some(title.to_string()),
        track_no: Some(1),
        duration_secs: Some(200),
        size_bytes: Some(3_200_000),
    }
}

fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"").unwrap();
    path
}

fn sample_tree(root: &Path) -> FakeReader {
    touch(root, "MP3_V1_CD001/Pop/01 One.mp3");
    touch(root, "MP3_V1_CD001/Pop/02 Two.mp3");
    touch(root, "MP3_V1_CD001/Pop/03 Three.mp3");
    touch(root, "MP3_V1_CD001/Pop/cover.jpg");

    let mut missing_artist = tag("", "Nobody", "Lost", "Three");
    missing_artist.artist = None;
    FakeReader::default()
        .with(
            "01 One.mp3",
            tag("Artist1 feat. Artist2 & Artist3", "Artist1", "Hits", "One"),
        )
        .with("02 Two.mp3", tag("The Beatles", "Beatles", "1", "Two"))
        .with("03 Three.mp3", missing_artist)
}

fn ingestor<'a>(
    db: &Path,
    reader: FakeReader,
    operator: &'a mut Operator,
) -> Ingestor<FakeReader, &'a mut Operator> {
    let store = CatalogStore::open(db).unwrap();
    Ingestor::new(store, reader, operator, ResolverPolicy::default()).unwrap()
}

#[test]
fn second_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let db = dir.path().join("mp3.redb");
    let reader = sample_tree(&music);

    let mut operator = Operator::default();
    let first_stats = {
        let mut ingest = ingestor(&db, reader.clone(), &mut operator);
        let summary = ingest.ingest_tree(&music).unwrap();
        assert_eq!(summary.files, 3);
        assert_eq!(summary.new_tracks, 2);
        assert_eq!(summary.skipped.get(&SkipReason::NoArtist), Some(&1));
        ingest.store().stats().unwrap()
    };
    assert_eq!(first_stats.artists, 4);
    assert_eq!(first_stats.albums, 2);
    assert_eq!(first_stats.tracks, 2);
    assert_eq!(first_stats.track_links, 2);
    assert_eq!(first_stats.album_links, 0);
    assert_eq!(operator.split_prompts, 1);
    assert_eq!(operator.artist_prompts, 4);

    let mut operator = Operator::default();
    let mut ingest = ingestor(&db, reader, &mut operator);
    assert_eq!(ingest.registry().len(), 4);
    let summary = ingest.ingest_tree(&music).unwrap();
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.ingested, 0);
    assert_eq!(ingest.store().stats().unwrap(), first_stats);
    drop(ingest);
    assert_eq!(operator.artist_prompts, 0);
    assert_eq!(operator.split_prompts, 0);
}

#[test]
fn one_track_per_location() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let first = touch(&music, "MP3_V1_CD001/Rock/Queen/Innuendo.mp3");
    let second = touch(&music, "MP3_V1_CD002/Rock/Queen/Innuendo.mp3");
    let reader = FakeReader::default().with(
        "Innuendo.mp3",
        tag("Queen", "Queen", "Innuendo", "Innuendo"),
    );

    let mut operator = Operator::default();
    let mut ingest = ingestor(&dir.path().join("mp3.redb"), reader, &mut operator);

    let stored = match ingest.ingest_file(&first).unwrap() {
        ItemOutcome::Ingested(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert!(stored.new_track);
    assert_eq!(
        ingest.ingest_file(&first).unwrap(),
        ItemOutcome::Duplicate {
            track_id: stored.track_id
        }
    );

    let other_disc = match ingest.ingest_file(&second).unwrap() {
        ItemOutcome::Ingested(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert!(other_disc.new_track);
    assert_eq!(other_disc.album_id, stored.album_id);

    let track = ingest.store().get_track(other_disc.track_id).unwrap().unwrap();
    assert_eq!(track.disc_label, "1002");
    assert_eq!(ingest.store().stats().unwrap().tracks, 2);
}

#[test]
fn manual_split_is_reused_for_the_next_file() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    touch(&music, "MP3_V2_CD010/Soul/01 Boogie.mp3");
    touch(&music, "MP3_V2_CD010/Soul/02 Boogie Remix.mp3");
    let raw = "Earth, Wind & Fire with The Emotions";
    let reader = FakeReader::default()
        .with("01 Boogie.mp3", tag(raw, "Soul Legends", "Soul", "Boogie Wonderland"))
        .with("02 Boogie Remix.mp3", tag(raw, "Soul Legends", "Soul", "Boogie Remix"));

    let mut operator = Operator {
        reject_splits: true,
        typed: vec![
            Some("Earth, Wind & Fire".to_string()),
            Some("The Emotions".to_string()),
            None,
        ],
        ..Operator::default()
    };
    let mut ingest = ingestor(&dir.path().join("mp3.redb"), reader, &mut operator);
    let summary = ingest.ingest_tree(&music).unwrap();
    assert_eq!(summary.new_tracks, 2);

    let registry = ingest.registry();
    assert!(registry.contains("Earth, Wind & Fire"));
    assert!(registry.contains("Emotions"));
    assert!(!registry.contains("Fire"));
    assert_eq!(ingest.store().stats().unwrap().track_links, 2);
    drop(ingest);
    assert_eq!(operator.split_prompts, 1);
}

#[test]
fn blank_artist_after_normalizing_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let path = touch(&music, "misc/01.mp3");
    let reader =
        FakeReader::default().with("01.mp3", tag(", The", "Someone", "Album", "Song"));

    let mut operator = Operator::default();
    let mut ingest = ingestor(&dir.path().join("mp3.redb"), reader, &mut operator);
    assert_eq!(
        ingest.ingest_file(&path).unwrap(),
        ItemOutcome::Skipped(SkipReason::BlankArtist)
    );
    let stats = ingest.store().stats().unwrap();
    assert_eq!(stats.tracks, 0);
    assert_eq!(stats.albums, 0);
}

#[test]
fn closed_decision_input_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let reader = sample_tree(&music);

    let mut operator = Operator {
        closed: true,
        ..Operator::default()
    };
    let mut ingest = ingestor(&dir.path().join("mp3.redb"), reader, &mut operator);
    let err = ingest.ingest_tree(&music).unwrap_err();
    assert!(matches!(err, CatalogError::Decision(_)));
    assert_eq!(ingest.store().stats().unwrap().tracks, 0);
}

#[test]
fn check_mode_validates_without_a_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let reader = sample_tree(&music);
    touch(&music, "MP3_V1_CD001/Pop/04 Untagged.mp3");

    let summary = check_tree(&music, &reader);
    assert_eq!(summary.files, 4);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.skipped.get(&SkipReason::NoArtist), Some(&1));
    assert_eq!(summary.skipped.get(&SkipReason::NoTag), Some(&1));
    assert!(!dir.path().join("mp3.redb").exists());
}

#[test]
fn album_artist_collaborators_are_linked_once() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let db = dir.path().join("mp3.redb");
    touch(&music, "MP3_V1_CD003/Pop/01 Duet.mp3");
    let reader = FakeReader::default().with(
        "01 Duet.mp3",
        tag("Artist1", "Artist1 & Artist4", "Duets", "Duet"),
    );

    let mut operator = Operator::default();
    let first_stats = {
        let mut ingest = ingestor(&db, reader.clone(), &mut operator);
        let summary = ingest.ingest_tree(&music).unwrap();
        assert_eq!(summary.new_tracks, 1);

        let artist1 = ingest.registry().id_of("Artist1").unwrap();
        let artist4 = ingest.registry().id_of("Artist4").unwrap();
        let stats = ingest.store().stats().unwrap();
        assert_eq!(stats.album_links, 1);
        assert_eq!(stats.track_links, 0);

        let track = ingest.store().get_track(1).unwrap().unwrap();
        let album = ingest.store().get_album(track.album_id).unwrap().unwrap();
        assert_eq!(album.artist_id, artist1);
        assert_eq!(
            ingest.store().album_collaborators(album.id).unwrap(),
            vec![AlbumCollaboration {
                album_id: album.id,
                artist_id: artist4,
            }]
        );
        stats
    };
    assert_eq!(operator.split_prompts, 1);

    let mut operator = Operator::default();
    let mut ingest = ingestor(&db, reader, &mut operator);
    let summary = ingest.ingest_tree(&music).unwrap();
    assert_eq!(summary.duplicates, 1);
    assert_eq!(ingest.store().stats().unwrap(), first_stats);
}

#[test]
fn repeated_and_primary_collaborators_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let music = dir.path().join("music");
    let path = touch(&music, "MP3_V1_CD004/Rock/01 Live.mp3");
    let reader = FakeReader::default().with(
        "01 Live.mp3",
        tag("Queen & Queen feat. Freddie & Freddie", "Queen", "Live", "Live"),
    );

    let mut operator = Operator::default();
    let mut ingest = ingestor(&dir.path().join("mp3.redb"), reader, &mut operator);
    let stored = match ingest.ingest_file(&path).unwrap() {
        ItemOutcome::Ingested(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(stored.new_links, 1);

    let freddie = ingest.registry().id_of("Freddie").unwrap();
    assert_eq!(
        ingest.store().track_collaborators(stored.track_id).unwrap(),
        vec![TrackCollaboration {
            track_id: stored.track_id,
            artist_id: freddie,
        }]
    );
    let stats = ingest.store().stats().unwrap();
    assert_eq!(stats.artists, 2);
    assert_eq!(stats.track_links, 1);
    drop(ingest);
    assert_eq!(operator.artist_prompts, 2);
}
