use std::fs;
use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track_no: Option<u32>,
    pub duration_secs: Option<u64>,
    pub size_bytes: Option<u64>,
}

#[derive(Debug)]
pub enum TagRead {
    Unreadable(MetadataError),
    NoTag,
    Tagged(TagInfo),
}

pub trait TagReader {
    fn read(&self, path: &Path) -> TagRead;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> TagRead {
        match read_tags(path) {
            Ok(Some(info)) => TagRead::Tagged(info),
            Ok(None) => TagRead::NoTag,
            Err(err) => TagRead::Unreadable(err),
        }
    }
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub fn read_tags(path: &Path) -> Result<Option<TagInfo>, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(None),
    };

    let mut info = TagInfo {
        artist: tag.get_string(&ItemKey::TrackArtist).map(|v| v.to_string()),
        album_artist: tag.get_string(&ItemKey::AlbumArtist).map(|v| v.to_string()),
        album: tag.get_string(&ItemKey::AlbumTitle).map(|v| v.to_string()),
        title: tag.get_string(&ItemKey::TrackTitle).map(|v| v.to_string()),
        track_no: tag
            .get_string(&ItemKey::TrackNumber)
            .and_then(parse_track_number),
        ..TagInfo::default()
    };

    let duration = tagged_file.properties().duration();
    info.duration_secs = Some(round_secs(duration.as_millis()));
    info.size_bytes = fs::metadata(path).ok().map(|meta| meta.len());

    Ok(Some(info))
}

fn parse_track_number(text: &str) -> Option<u32> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

fn round_secs(millis: u128) -> u64 {
    let secs = (millis + 500) / 1000;
    secs.min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_number_ignores_total() {
        assert_eq!(parse_track_number("3/12"), Some(3));
        assert_eq!(parse_track_number(" 7 "), Some(7));
        assert_eq!(parse_track_number("A1"), None);
    }

    #[test]
    fn duration_rounds_to_nearest_second() {
        assert_eq!(round_secs(0), 0);
        assert_eq!(round_secs(1_499), 1);
        assert_eq!(round_secs(1_500), 2);
        assert_eq!(round_secs(215_020), 215);
    }
}
