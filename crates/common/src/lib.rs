use serde::{Deserialize, Serialize};

mod disc;

pub use disc::{disc_location, DiscLocation, DEFAULT_DISC, DEFAULT_DISC_PATH};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub artist_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub album_id: u64,
    pub artist_id: u64,
    pub track_number: Option<u32>,
    pub byte_size: u64,
    pub duration_seconds: u64,
    pub disc_label: String,
    pub source_path: String,
    pub source_file: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumCollaboration {
    pub album_id: u64,
    pub artist_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackCollaboration {
    pub track_id: u64,
    pub artist_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistCredit {
    pub primary: String,
    pub collaborators: Vec<String>,
}

impl ArtistCredit {
    pub fn solo(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            collaborators: Vec::new(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.collaborators.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::ArtistCredit;

    #[test]
    fn credit_names_start_with_primary() {
        let credit = ArtistCredit {
            primary: "Artist1".to_string(),
            collaborators: vec!["Artist2".to_string(), "Artist3".to_string()],
        };
        let names: Vec<&str> = credit.names().collect();
        assert_eq!(names, vec!["Artist1", "Artist2", "Artist3"]);
        assert_eq!(ArtistCredit::solo("Queen").names().count(), 1);
    }
}
