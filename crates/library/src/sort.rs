use std::cmp::Ordering;

use common::{Album, Artist, Song};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOption<K> {
    pub key: K,
    pub order: Order,
}

impl<K> SortOption<K> {
    pub fn asc(key: K) -> Self {
        Self {
            key,
            order: Order::Asc,
        }
    }

    pub fn desc(key: K) -> Self {
        Self {
            key,
            order: Order::Desc,
        }
    }

    pub fn with_order(key: K, order: Order) -> Self {
        Self { key, order }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(i64),
    Missing,
}

impl SortValue<'_> {
    fn is_present(&self) -> bool {
        match self {
            SortValue::Text(text) => !text.is_empty(),
            SortValue::Number(value) => *value != 0,
            SortValue::Missing => false,
        }
    }
}

pub trait Sortable {
    type Key: Copy;

    fn sort_value(&self, key: Self::Key) -> SortValue<'_>;
}

/// Compares by each option in turn. Values of different kinds (including an absent
/// one) put the present value first regardless of direction.
pub fn compare_by<T: Sortable>(a: &T, b: &T, options: &[SortOption<T::Key>]) -> Ordering {
    for option in options {
        let left = a.sort_value(option.key);
        let right = b.sort_value(option.key);
        let ordering = match (left, right) {
            (SortValue::Number(x), SortValue::Number(y)) => directed(x.cmp(&y), option.order),
            (SortValue::Text(x), SortValue::Text(y)) => directed(collate(x, y), option.order),
            (left, right) => right.is_present().cmp(&left.is_present()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort.
pub fn sort_records<T: Sortable>(items: &mut [T], options: &[SortOption<T::Key>]) {
    items.sort_by(|a, b| compare_by(a, b, options));
}

fn directed(ordering: Ordering, order: Order) -> Ordering {
    match order {
        Order::Asc => ordering,
        Order::Desc => ordering.reverse(),
    }
}

/// Case- and accent-insensitive comparison, falling back to code points on ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(fold(b)).then_with(|| a.cmp(b))
}

fn fold(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SongSortKey {
    Title,
    Artist,
    Album,
    DiskNo,
    TrackNo,
    Year,
    Duration,
    CreatedAt,
}

impl Sortable for Song {
    type Key = SongSortKey;

    fn sort_value(&self, key: SongSortKey) -> SortValue<'_> {
        match key {
            SongSortKey::Title => SortValue::Text(&self.title),
            SongSortKey::Artist => SortValue::Text(&self.artist),
            SongSortKey::Album => SortValue::Text(&self.album),
            SongSortKey::DiskNo => number(self.disk_no.map(i64::from)),
            SongSortKey::TrackNo => number(self.track_no.map(i64::from)),
            SongSortKey::Year => number(self.year.map(i64::from)),
            SongSortKey::Duration => SortValue::Number(i64::from(self.duration)),
            SongSortKey::CreatedAt => {
                SortValue::Number(i64::try_from(self.created_at).unwrap_or(i64::MAX))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlbumSortKey {
    Title,
    /// First listed artist.
    Artist,
    SongCount,
}

impl Sortable for Album {
    type Key = AlbumSortKey;

    fn sort_value(&self, key: AlbumSortKey) -> SortValue<'_> {
        match key {
            AlbumSortKey::Title => SortValue::Text(&self.title),
            AlbumSortKey::Artist => self
                .artists
                .first()
                .map(|artist| SortValue::Text(artist.name.as_str()))
                .unwrap_or(SortValue::Missing),
            AlbumSortKey::SongCount => SortValue::Number(i64::from(self.song_count)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtistSortKey {
    Name,
    SongCount,
}

impl Sortable for Artist {
    type Key = ArtistSortKey;

    fn sort_value(&self, key: ArtistSortKey) -> SortValue<'_> {
        match key {
            ArtistSortKey::Name => SortValue::Text(&self.name),
            ArtistSortKey::SongCount => SortValue::Number(i64::from(self.song_count)),
        }
    }
}

fn number(value: Option<i64>) -> SortValue<'static> {
    value.map(SortValue::Number).unwrap_or(SortValue::Missing)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SongsSortPreset {
    Artist,
    Album,
    Title,
}

pub fn songs_sort_options(preset: SongsSortPreset, order: Order) -> Vec<SortOption<SongSortKey>> {
    let (primary, rest) = match preset {
        SongsSortPreset::Artist => (
            SongSortKey::Artist,
            [SongSortKey::Album, SongSortKey::DiskNo, SongSortKey::TrackNo, SongSortKey::Title],
        ),
        SongsSortPreset::Album => (
            SongSortKey::Album,
            [SongSortKey::DiskNo, SongSortKey::TrackNo, SongSortKey::Artist, SongSortKey::Title],
        ),
        SongsSortPreset::Title => (
            SongSortKey::Title,
            [SongSortKey::Artist, SongSortKey::Album, SongSortKey::DiskNo, SongSortKey::TrackNo],
        ),
    };
    let mut options = vec![SortOption::with_order(primary, order)];
    options.extend(rest.into_iter().map(SortOption::asc));
    options
}

pub fn default_song_sort() -> Vec<SortOption<SongSortKey>> {
    songs_sort_options(SongsSortPreset::Artist, Order::Asc)
}

pub fn default_album_sort() -> Vec<SortOption<AlbumSortKey>> {
    vec![
        SortOption::asc(AlbumSortKey::Title),
        SortOption::asc(AlbumSortKey::Artist),
    ]
}

pub fn default_artist_sort() -> Vec<SortOption<ArtistSortKey>> {
    vec![SortOption::asc(ArtistSortKey::Name)]
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use common::{Album, Artist, ArtistRef, Song};

    use super::*;

    fn song(title: &str, artist: &str, album: &str, disk: Option<u16>, track: Option<u16>) -> Song {
        Song {
            id: title.to_string(),
            file_path: format!("/music/{}.mp3", title),
            title: title.to_string(),
            artist_id: artist.to_string(),
            artist: artist.to_string(),
            album_id: album.to_string(),
            album: album.to_string(),
            disk_no: disk,
            track_no: track,
            year: None,
            genres: None,
            size: 0,
            bitrate: None,
            sample_rate: None,
            duration: 0,
            artwork_path: None,
            created_at: 0,
            scan_id: "scan".to_string(),
        }
    }

    fn titles(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn default_song_order_uses_tiebreakers() {
        let mut songs = vec![
            song("c", "Beta", "One", Some(1), Some(2)),
            song("b", "Alpha", "Two", None, Some(1)),
            song("a", "Beta", "One", Some(1), Some(1)),
            song("d", "alpha", "One", None, None),
        ];
        sort_records(&mut songs, &default_song_sort());
        assert_eq!(titles(&songs), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn missing_numbers_sort_last_in_both_directions() {
        let mut songs = vec![
            song("none", "A", "X", None, None),
            song("two", "A", "X", None, Some(2)),
            song("one", "A", "X", None, Some(1)),
        ];
        sort_records(&mut songs, &[SortOption::asc(SongSortKey::TrackNo)]);
        assert_eq!(titles(&songs), vec!["one", "two", "none"]);

        sort_records(&mut songs, &[SortOption::desc(SongSortKey::TrackNo)]);
        assert_eq!(titles(&songs), vec!["two", "one", "none"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut songs = vec![
            song("first", "A", "X", None, None),
            song("second", "A", "X", None, None),
            song("third", "A", "X", None, None),
        ];
        sort_records(&mut songs, &[SortOption::asc(SongSortKey::Artist)]);
        assert_eq!(titles(&songs), vec!["first", "second", "third"]);
    }

    #[test]
    fn collation_ignores_case_and_accents() {
        assert_eq!(collate("émile", "Emma"), Ordering::Less);
        assert_eq!(collate("zebra", "Apple"), Ordering::Greater);
        assert_eq!(collate("", "a"), Ordering::Less);
        assert_ne!(collate("a", "A"), Ordering::Equal);
    }

    #[test]
    fn composed_and_decomposed_names_collate_alike() {
        let composed = "\u{e9}b";
        let decomposed = "e\u{301}b";
        assert_eq!(collate(composed, "ec"), Ordering::Less);
        assert_eq!(collate(decomposed, "ec"), Ordering::Less);
        assert_eq!(
            collate("\u{c5}ngstr\u{f6}m", "angstron"),
            collate("A\u{30a}ngstro\u{308}m", "angstron")
        );

        let artist = |id: &str, name: &str| Artist {
            id: id.to_string(),
            name: name.to_string(),
            song_count: 1,
        };
        let mut artists = vec![
            artist("decomposed", decomposed),
            artist("plain", "ec"),
            artist("composed", composed),
        ];
        sort_records(&mut artists, &default_artist_sort());
        let ids: Vec<&str> = artists.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.last(), Some(&"plain"));
    }

    #[test]
    fn title_preset_descending_keeps_tiebreakers_ascending() {
        let options = songs_sort_options(SongsSortPreset::Title, Order::Desc);
        assert_eq!(options[0], SortOption::desc(SongSortKey::Title));
        assert!(options[1..].iter().all(|o| o.order == Order::Asc));
    }

    #[test]
    fn albums_without_artists_sort_after_titled_peers() {
        let album = |id: &str, title: &str, artist: Option<&str>| Album {
            id: id.to_string(),
            title: title.to_string(),
            artists: artist
                .map(|name| {
                    vec![ArtistRef {
                        artist_id: name.to_string(),
                        name: name.to_string(),
                    }]
                })
                .unwrap_or_default(),
            artwork_path: None,
            song_count: 1,
        };
        let mut albums = vec![
            album("1", "Same", None),
            album("2", "Same", Some("Zed")),
            album("3", "Abc", Some("Zed")),
        ];
        sort_records(&mut albums, &default_album_sort());
        let ids: Vec<&str> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }
}
