use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const META_TEXT_PREFIX: &[u8] = b"music:";

/// Song metadata carried by the container.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meta {
    #[serde(deserialize_with = "null_as_default")]
    pub music_name: String,
    #[serde(rename = "artist", deserialize_with = "null_as_default")]
    pub artists: Vec<Artist>,
    #[serde(deserialize_with = "null_as_default")]
    pub album: String,
    #[serde(rename = "albumPic", deserialize_with = "null_as_default")]
    pub album_pic_url: String,
    #[serde(rename = "bitrate", deserialize_with = "null_as_default")]
    pub bitrate_hint: i64,
    #[serde(rename = "format", deserialize_with = "null_as_default")]
    pub format_hint: String,
}

/// One `[name, id]` pair of the artist list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Artist {
    pub name: Option<String>,
    pub id: Option<ArtistId>,
}

/// Producer specific artist identifier. Carried through, never interpreted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArtistId {
    Text(String),
    Number(i64),
}

impl Meta {
    /// Decodes the plaintext of a metadata block (`music:{...}`).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let raw = match raw.strip_prefix(META_TEXT_PREFIX) {
            Some(rest) if !rest.is_empty() => rest,
            _ => raw,
        };

        serde_json::from_slice(raw).map_err(|e| Error::metadata(e.to_string()))
    }

    /// Names of all artists that have one, in order.
    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.artists
            .iter()
            .filter_map(|x| x.name.as_deref())
            .filter(|x| !x.is_empty())
    }

    /// Artist names joined with `/`.
    pub fn display_artist(&self) -> String {
        self.artist_names().collect::<Vec<_>>().join("/")
    }
}

/// A JSON `null` reads as the field's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Artist {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
        }
    }
}

impl<'de> Deserialize<'de> for Artist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let values = null_as_default::<_, Vec<Value>>(deserializer)?;
        let mut values = values.into_iter();

        let name = match values.next() {
            Some(Value::String(x)) => Some(x),
            _ => None,
        };

        let id = match values.next() {
            Some(Value::String(x)) => Some(ArtistId::Text(x)),
            Some(Value::Number(x)) => x.as_i64().map(ArtistId::Number),
            _ => None,
        };

        Ok(Self { name, id })
    }
}

impl Serialize for Artist {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.name, &self.id).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let meta = Meta::parse(
            br#"music:{"musicId":12,"musicName":"Song","artist":[["A",1],["B","b-id"]],"album":"Album","albumPic":"http://x/y.jpg","bitrate":320000,"format":"flac","duration":1000}"#,
        )
        .unwrap();

        assert_eq!(meta.music_name, "Song");
        assert_eq!(meta.album, "Album");
        assert_eq!(meta.album_pic_url, "http://x/y.jpg");
        assert_eq!(meta.bitrate_hint, 320000);
        assert_eq!(meta.format_hint, "flac");
        assert_eq!(meta.artists[0].id, Some(ArtistId::Number(1)));
        assert_eq!(meta.artists[1].id, Some(ArtistId::Text("b-id".to_owned())));
        assert_eq!(meta.display_artist(), "A/B");
    }

    #[test]
    fn test_parse_without_prefix() {
        let meta = Meta::parse(br#"{"musicName":"Bare"}"#).unwrap();
        assert_eq!(meta.music_name, "Bare");
        assert!(meta.artists.is_empty());
        assert_eq!(meta.display_artist(), "");
    }

    #[test]
    fn test_display_artist_skips_nameless() {
        let meta =
            Meta::parse(br#"music:{"artist":[["A"],[null,3],[],["",4],[5,6],["C",null]]}"#).unwrap();
        assert_eq!(meta.artists.len(), 6);
        assert_eq!(meta.display_artist(), "A/C");
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let meta = Meta::parse(
            br#"music:{"musicName":"Song","artist":null,"album":null,"albumPic":null,"bitrate":null,"format":null}"#,
        )
        .unwrap();

        assert_eq!(meta.music_name, "Song");
        assert!(meta.artists.is_empty());
        assert_eq!(meta.album, "");
        assert_eq!(meta.album_pic_url, "");
        assert_eq!(meta.bitrate_hint, 0);

        let meta = Meta::parse(
            br#"music:{"musicName":null,"artist":[["A",1],null],"album":"Album","albumPic":"http://x/y.jpg"}"#,
        )
        .unwrap();

        assert_eq!(meta.music_name, "");
        assert_eq!(meta.artists.len(), 2);
        assert_eq!(meta.display_artist(), "A");
        assert_eq!(meta.album, "Album");
        assert_eq!(meta.album_pic_url, "http://x/y.jpg");
    }

    #[test]
    fn test_malformed() {
        assert!(Meta::parse(b"music:{not json").unwrap_err().is_metadata_err());
        assert!(Meta::parse(b"music:").unwrap_err().is_metadata_err());
        assert!(Meta::parse(&[0xff, 0xfe]).unwrap_err().is_metadata_err());
        assert!(Meta::parse(br#"music:{"artist":"A"}"#).is_err());
    }

    #[test]
    fn test_serialize_artist_pair() {
        let artist = Artist {
            name: Some("A".to_owned()),
            id: Some(ArtistId::Number(7)),
        };
        assert_eq!(serde_json::to_string(&artist).unwrap(), r#"["A",7]"#);
    }
}
