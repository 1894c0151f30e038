use std::sync::LazyLock;

use regex::Regex;

static TRACK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+_(?<name>.+)$").expect("track prefix pattern"));

/// `03_song.mp3` becomes `song.mp3`. Names without a leading track number
/// and underscore give `None`.
pub fn strip_track_prefix(file_name: &str) -> Option<&str> {
    TRACK_PREFIX
        .captures(file_name)
        .and_then(|c| c.name("name"))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod test {
    use super::strip_track_prefix;

    #[test]
    fn strip_prefix() {
        assert_eq!(strip_track_prefix("03_song.mp3"), Some("song.mp3"));
        assert_eq!(strip_track_prefix("1_a_b.mp3"), Some("a_b.mp3"));
        assert_eq!(strip_track_prefix("123_僕らのLIVE.mp3"), Some("僕らのLIVE.mp3"));
    }

    #[test]
    fn leave_other_names() {
        assert_eq!(strip_track_prefix("song.mp3"), None);
        assert_eq!(strip_track_prefix("song_03_x.mp3"), None);
        assert_eq!(strip_track_prefix("_song.mp3"), None);
        assert_eq!(strip_track_prefix("07_"), None);
    }
}
