use crate::errors::ShellacError;
use crate::tags::{LoftyTagReader, TagReader, SUPPORTED_AUDIO_EXTENSIONS};
use crate::testing;
use std::fs;
use std::path::Path;

#[test]
fn test_supported_extensions_are_dotted_and_lowercase() {
    for ext in SUPPORTED_AUDIO_EXTENSIONS {
        assert!(ext.starts_with('.'));
        assert_eq!(*ext, ext.to_lowercase());
    }
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let reader = LoftyTagReader;
    assert!(matches!(
        reader.read_tags(Path::new("/music/cover.jpg")),
        Err(ShellacError::UnsupportedFiletype(ext)) if ext == ".jpg"
    ));
    assert!(matches!(reader.read_tags(Path::new("/music/noextension")), Err(ShellacError::UnsupportedFiletype(_))));
}

#[test]
fn test_undecodable_file_is_an_extraction_error() {
    let temp_dir = testing::init();
    let path = temp_dir.path().join("garbage.mp3");
    fs::write(&path, b"this is not an mp3").unwrap();

    let reader = LoftyTagReader;
    assert!(matches!(reader.read_tags(&path), Err(ShellacError::UnreadableTags { .. })));
}
