use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use log::{debug, info, warn};
use ordered_hash_map::OrderedHashMap;

use crate::error::{Result, TagError};

pub const TRACK_NUMBER: &str = "TRCK";
pub const TITLE: &str = "TIT2";

/// Replacement values keyed by four character frame ID.
#[derive(Clone)]
pub struct TagValueSet {
    values: OrderedHashMap<String, String>,
}

impl TagValueSet {
    pub fn new() -> Self {
        Self {
            values: OrderedHashMap::new(),
        }
    }

    pub fn get(&self, frame_id: &str) -> Option<&str> {
        self.values.get(frame_id).map(String::as_str)
    }

    fn insert(&mut self, frame_id: &str, value: &str) {
        self.values.insert(frame_id.to_string(), value.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for TagValueSet {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    System,
    Common,
    Tracks,
}

/// Everything a track info file declares: values shared by all files,
/// values per file, and where converted files go.
pub struct TrackConfig {
    common: TagValueSet,
    tracks: OrderedHashMap<String, TagValueSet>,
    output_dir: PathBuf,
}

impl TrackConfig {
    /// Read a track info file stored in `encoding`, normally Shift-JIS.
    pub fn read(path: &Path, encoding: &'static Encoding) -> Result<Self> {
        let raw = fs::read(path)?;
        let (text, used, malformed) = encoding.decode(&raw);
        if malformed {
            warn!(
                "{} is not valid {}, undecodable bytes were replaced",
                path.to_string_lossy(),
                used.name()
            );
        }
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut common = TagValueSet::default();
        let mut tracks: OrderedHashMap<String, TagValueSet> = OrderedHashMap::new();
        let mut output_dir = None;
        let mut section = Section::None;

        for (n, line) in text.lines().enumerate() {
            let line_no = n + 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            match line.trim() {
                "[SYSTEM]" => section = Section::System,
                "[COMMON]" => section = Section::Common,
                "[TRACKS]" => section = Section::Tracks,
                _ => match section {
                    Section::None => {
                        warn!("line {}: outside of any section, ignored", line_no);
                    }
                    Section::System => match key_value(line) {
                        Some(("OUTDIR", value)) => output_dir = Some(PathBuf::from(value)),
                        Some((key, _)) => debug!("line {}: unknown key {} ignored", line_no, key),
                        None => warn!("line {}: expected KEY=VALUE, ignored", line_no),
                    },
                    Section::Common => match key_value(line) {
                        Some((key, value)) => {
                            if key.len() != 4 {
                                warn!("line {}: {} does not look like a frame id", line_no, key);
                            }
                            common.insert(key, value);
                        }
                        None => warn!("line {}: expected KEY=VALUE, ignored", line_no),
                    },
                    Section::Tracks => {
                        let (file, title) = track_line(line);
                        if file.is_empty() {
                            return Err(TagError::Config {
                                line: line_no,
                                reason: "missing file name".to_string(),
                            });
                        }
                        if tracks.get(file).is_some() {
                            return Err(TagError::Config {
                                line: line_no,
                                reason: format!("{} is listed twice", file),
                            });
                        }

                        let title = match title {
                            Some(title) if !title.is_empty() => title.to_string(),
                            _ => default_title(file),
                        };
                        let mut values = TagValueSet::new();
                        values.insert(TRACK_NUMBER, &(tracks.len() + 1).to_string());
                        values.insert(TITLE, &title);
                        tracks.insert(file.to_string(), values);
                    }
                },
            }
        }

        if tracks.len() == 0 {
            warn!("track info file lists no tracks");
        }

        Ok(Self {
            common,
            tracks,
            output_dir: output_dir.ok_or(TagError::MissingOutputDirectory)?,
        })
    }

    /// Value for `frame_id` in `file`: the file's own value wins over the
    /// common one.
    pub fn lookup_frame_value(&self, file: &str, frame_id: &str) -> Option<&str> {
        self.tracks
            .get(file)
            .and_then(|values| values.get(frame_id))
            .or_else(|| self.common.get(frame_id))
    }

    pub fn track_number(&self, file: &str) -> Option<u32> {
        self.tracks.get(file)?.get(TRACK_NUMBER)?.parse().ok()
    }

    pub fn require_track_number(&self, file: &str) -> Result<u32> {
        let values = self
            .tracks
            .get(file)
            .ok_or_else(|| TagError::UnknownTrack(file.to_string()))?;
        let value = values.get(TRACK_NUMBER).unwrap_or_default();
        value.parse().map_err(|_| TagError::BadTrackNumber {
            file: file.to_string(),
            value: value.to_string(),
        })
    }

    /// Declared files, ordered by track number.
    pub fn tracks(&self) -> Vec<&str> {
        let mut files: Vec<(u32, &str)> = self
            .tracks
            .iter()
            .map(|(file, _)| (self.track_number(file).unwrap_or(u32::MAX), file.as_str()))
            .collect();
        files.sort_by_key(|&(number, _)| number);
        files.into_iter().map(|(_, file)| file).collect()
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_summary(&self) {
        info!("output directory: {}", self.output_dir.to_string_lossy());
        info!("common values ({}):", self.common.len());
        for (frame_id, value) in self.common.iter() {
            info!("\t{} --> {}", frame_id, value);
        }
        info!("tracks ({}):", self.tracks.len());
        for file in self.tracks() {
            info!(
                "\t{:02} {} [{}]",
                self.track_number(file).unwrap_or_default(),
                file,
                self.lookup_frame_value(file, TITLE).unwrap_or_default()
            );
        }
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split('=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }
    Some((key, value))
}

fn track_line(line: &str) -> (&str, Option<&str>) {
    match line.split_once(':') {
        Some((file, title)) => (file.trim(), Some(title.trim())),
        None => (line.trim(), None),
    }
}

fn default_title(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}
