pub const DEFAULT_DISC: &str = "0000";
pub const DEFAULT_DISC_PATH: &str = "/";

const VOLUME_MARKER: &str = "MP3_V";
const CHART_MARKER: &str = "Top 2000 MP3";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscLocation {
    pub disc: String,
    pub path: String,
}

impl DiscLocation {
    fn unknown() -> Self {
        Self {
            disc: DEFAULT_DISC.to_string(),
            path: DEFAULT_DISC_PATH.to_string(),
        }
    }
}

pub fn disc_location(dir: &str) -> DiscLocation {
    let chars: Vec<char> = dir.chars().collect();

    if let Some(pos) = find_chars(&chars, VOLUME_MARKER) {
        return volume_location(&chars, pos).unwrap_or_else(DiscLocation::unknown);
    }
    if let Some(pos) = find_chars(&chars, CHART_MARKER) {
        return chart_location(dir, &chars, pos).unwrap_or_else(DiscLocation::unknown);
    }
    DiscLocation::unknown()
}

fn volume_location(chars: &[char], pos: usize) -> Option<DiscLocation> {
    let volume = *chars.get(pos + 5)?;
    let mut disc = String::with_capacity(4);
    disc.push(volume);
    disc.extend(slice_chars(chars, pos + 9, pos + 12));
    Some(DiscLocation {
        disc,
        path: slice_chars(chars, pos + 13, chars.len()).iter().collect(),
    })
}

fn chart_location(dir: &str, chars: &[char], pos: usize) -> Option<DiscLocation> {
    let path: String = slice_chars(chars, pos + 13, chars.len()).iter().collect();
    let disc = if dir.contains("0-10") {
        "T2K0".to_string()
    } else if dir.contains("201") {
        // annual editions, e.g. "2016" -> T2K6
        format!("T2K{}", chars.get(pos + 16)?)
    } else {
        format!("T2K{}", chars.get(pos + 13)?)
    };
    Some(DiscLocation { disc, path })
}

fn find_chars(chars: &[char], marker: &str) -> Option<usize> {
    let marker: Vec<char> = marker.chars().collect();
    chars
        .windows(marker.len())
        .position(|window| window == marker.as_slice())
}

fn slice_chars(chars: &[char], start: usize, end: usize) -> &[char] {
    let end = end.min(chars.len());
    let start = start.min(end);
    &chars[start..end]
}
