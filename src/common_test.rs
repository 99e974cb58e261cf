use crate::common::*;

#[test]
fn test_song_attributes_serialize_camel_case() {
    let song = Song {
        id: 7,
        attributes: SongAttributes {
            file_path: "/music/r1/01.m4a".to_string(),
            track_number: Some(1),
            ..SongAttributes::default()
        },
    };
    let json = serde_json::to_value(&song).unwrap();
    assert_eq!(json["attributes"]["filePath"], "/music/r1/01.m4a");
    assert_eq!(json["attributes"]["trackNumber"], 1);
    assert_eq!(json["attributes"]["durationInMillis"], serde_json::Value::Null);
}

#[test]
fn test_album_attributes_roundtrip() {
    let attributes = AlbumAttributes {
        name: "Release 1".to_string(),
        sort: "Release 1".to_string(),
        artist_name: "Techno Man".to_string(),
        artist_sort: "Techno Man, The".to_string(),
        genre_name: "Techno".to_string(),
        release_date: "2023".to_string(),
        album_artist: "Techno Man".to_string(),
        album_artist_sort: "Techno Man, The".to_string(),
    };
    let json = serde_json::to_string(&attributes).unwrap();
    assert!(json.contains("\"artistName\""));
    assert!(json.contains("\"albumArtistSort\""));
    let back: AlbumAttributes = serde_json::from_str(&json).unwrap();
    assert_eq!(back, attributes);
}

#[test]
fn test_default_records_are_zero_valued() {
    assert_eq!(Artist::default().id, 0);
    assert_eq!(Genre::default().attributes.name, "");
    assert_eq!(Song::default().attributes.track_number, None);
}
