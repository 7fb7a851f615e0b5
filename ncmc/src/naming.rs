//! Output file naming.

use ncm_crypt::Meta;

/// Pattern used when the caller supplies none.
pub const DEFAULT_PATTERN: &str = "{title}";

/// Characters rejected by at least one common filesystem.
const RESERVED: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Substitutes `{title}`, `{artist}` and `{album}` in `pattern` and sanitizes
/// the result. Never returns an empty string.
pub fn apply_pattern(pattern: &str, meta: &Meta) -> String {
    let pattern = if pattern.is_empty() {
        DEFAULT_PATTERN
    } else {
        pattern
    };

    let name = pattern
        .replace("{title}", &meta.music_name)
        .replace("{artist}", &meta.display_artist())
        .replace("{album}", &meta.album);

    sanitize_filename(&name)
}

/// Removes reserved characters. Falls back to [`fallback_name`] when nothing
/// is left.
pub fn sanitize_filename(name: &str) -> String {
    let name = name
        .chars()
        .filter(|x| !RESERVED.contains(x))
        .collect::<String>();

    if name.is_empty() {
        fallback_name()
    } else {
        name
    }
}

pub fn fallback_name() -> String {
    format!("track_{}", chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncm_crypt::Artist;

    fn meta(title: &str, artists: &[&str], album: &str) -> Meta {
        Meta {
            music_name: title.to_owned(),
            artists: artists.iter().map(|x| Artist::new(*x)).collect(),
            album: album.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_pattern() {
        assert_eq!(apply_pattern("{title} - {artist}", &meta("A", &["B"], "")), "A - B");
        assert_eq!(
            apply_pattern("{album}/{title}", &meta("T", &[], "Al:bum")),
            "AlbumT"
        );
        assert_eq!(apply_pattern("", &meta("Only", &["X"], "Y")), "Only");
        assert_eq!(apply_pattern("{artist}", &meta("", &["B", "C"], "")), "BC");
        assert_eq!(apply_pattern("{unknown}", &meta("", &[], "")), "{unknown}");
    }

    #[test]
    fn test_empty_pattern_result_falls_back() {
        assert!(apply_pattern("{title}", &Meta::default()).starts_with("track_"));
        assert!(apply_pattern("{title}?", &Meta::default()).starts_with("track_"));
    }

    #[test]
    fn test_sanitize_removes_reserved() {
        assert_eq!(sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#), "abcdefghij");
        assert_eq!(sanitize_filename("ünï cødé - ok.'s"), "ünï cødé - ok.'s");
    }

    #[test]
    fn test_sanitize_idempotent_and_non_empty() {
        for input in ["", "|||", "a:b", "plain", "<>?*", " x "] {
            let once = sanitize_filename(input);
            assert!(!once.is_empty());
            assert!(!once.contains(RESERVED));
            assert_eq!(sanitize_filename(&once), once);
        }
    }
}
