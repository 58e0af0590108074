//! Fixtures for tests: tiny PCM WAV files tagged through lofty, and generated PNGs.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use common::Song;
use image::{ImageFormat, Rgb, RgbImage};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, ItemKey, TagExt};
use lofty::tag::{Tag, TagType};

const SAMPLE_RATE: u32 = 8000;

#[derive(Clone, Debug, Default)]
pub(crate) struct TrackTags<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub track: Option<u16>,
    pub lyrics: Option<&'a str>,
    pub cover: Option<Vec<u8>>,
}

/// Writes one second of 16-bit mono silence, tagged with ID3v2 when any tag is set.
pub(crate) fn write_track(path: &Path, tags: &TrackTags<'_>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, wav_bytes(SAMPLE_RATE as usize * 2)).unwrap();

    let untagged = tags.title.is_none()
        && tags.artist.is_none()
        && tags.album.is_none()
        && tags.track.is_none()
        && tags.lyrics.is_none()
        && tags.cover.is_none();
    if untagged {
        return;
    }

    let mut tag = Tag::new(TagType::Id3v2);
    if let Some(title) = tags.title {
        tag.set_title(title.to_string());
    }
    if let Some(artist) = tags.artist {
        tag.set_artist(artist.to_string());
    }
    if let Some(album) = tags.album {
        tag.set_album(album.to_string());
    }
    if let Some(track) = tags.track {
        tag.insert_text(ItemKey::TrackNumber, track.to_string());
    }
    if let Some(lyrics) = tags.lyrics {
        tag.insert_text(ItemKey::Lyrics, lyrics.to_string());
    }
    if let Some(cover) = &tags.cover {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Png),
            None,
            cover.clone(),
        ));
    }
    tag.save_to_path(path, WriteOptions::default()).unwrap();
}

fn wav_bytes(data_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(44 + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    out.resize(44 + data_len, 0);
    out
}

pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

pub(crate) fn song_with_artwork(id: &str, artwork_path: Option<&str>) -> Song {
    Song {
        id: id.to_string(),
        file_path: format!("/music/{}.mp3", id),
        title: id.to_string(),
        artist_id: "artist".to_string(),
        artist: "Artist".to_string(),
        album_id: "album".to_string(),
        album: "Album".to_string(),
        disk_no: None,
        track_no: None,
        year: None,
        genres: None,
        size: 0,
        bitrate: None,
        sample_rate: None,
        duration: 0,
        artwork_path: artwork_path.map(str::to_string),
        created_at: 0,
        scan_id: "scan".to_string(),
    }
}
