use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tempfile::NamedTempFile;

use crate::id3::{FrameWalker, HEADER_LEN, TagHeader, rewrite_tag};
use crate::rename::strip_track_prefix;
use crate::trackinfo::TrackConfig;

/// Rewrite the tag of `mp3_dir/file` and store the result as
/// `<OUTDIR>/<NN>_<file>`. Nothing is written unless the whole conversion
/// succeeds.
pub fn convert_file(mp3_dir: &Path, file: &str, config: &TrackConfig) -> Result<PathBuf> {
    let track = config
        .require_track_number(file)
        .context("looking up track number")?;

    let input_path = mp3_dir.join(file);
    let input = fs::read(&input_path)
        .with_context(|| format!("reading {}", input_path.to_string_lossy()))?;
    debug!("read {} bytes from {}", input.len(), input_path.to_string_lossy());

    let output = rewrite_tag(&input, |frame_id| config.lookup_frame_value(file, frame_id))
        .with_context(|| format!("rewriting tag of {}", input_path.to_string_lossy()))?;

    let out_dir = config.output_directory();
    if !out_dir.is_dir() {
        info!("creating output directory {}", out_dir.to_string_lossy());
        fs::create_dir_all(out_dir)
            .with_context(|| format!("creating {}", out_dir.to_string_lossy()))?;
    }

    let out_path = out_dir.join(format!("{:02}_{}", track, file));
    write_atomically(&out_path, &output)
        .with_context(|| format!("writing {}", out_path.to_string_lossy()))?;
    info!("{} -> {}", input_path.to_string_lossy(), out_path.to_string_lossy());
    Ok(out_path)
}

/// Convert every declared track in track order, stopping at the first
/// failure.
pub fn convert_all(mp3_dir: &Path, config: &TrackConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for file in config.tracks() {
        let path = convert_file(mp3_dir, file, config)
            .with_context(|| format!("failed to convert MP3 file ({})", file))?;
        println!("{} ... OK", file);
        written.push(path);
    }
    Ok(written)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StripReport {
    pub copied: usize,
    pub failed: usize,
}

/// Copy every `NN_name.mp3` in `mp3_dir` to `name.mp3` next to it. A file
/// that fails is reported and skipped.
pub fn strip_all(mp3_dir: &Path) -> Result<StripReport> {
    let mut names: Vec<String> = mp3_dir
        .read_dir()
        .with_context(|| format!("listing {}", mp3_dir.to_string_lossy()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .filter(|name| is_mp3(name))
        .collect();
    names.sort();

    let mut report = StripReport::default();
    for name in names {
        let Some(stripped) = strip_track_prefix(&name) else {
            debug!("{} has no track prefix", name);
            continue;
        };
        let src = mp3_dir.join(&name);
        let dest = mp3_dir.join(stripped);
        println!("{} ---> {}", src.to_string_lossy(), dest.to_string_lossy());

        match copy_replacing(&src, &dest) {
            Ok(()) => report.copied += 1,
            Err(e) => {
                error!("{}: {:#}", name, e);
                report.failed += 1;
            }
        }
    }

    if report.failed > 0 {
        warn!("{} of {} files could not be copied", report.failed, report.copied + report.failed);
    }
    Ok(report)
}

/// The tag header of `path` plus frame ID and decoded text of every
/// frame in it.
pub fn list_frames(path: &Path) -> Result<(TagHeader, Vec<String>)> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.to_string_lossy()))?;
    let header = TagHeader::parse(&data).context("reading ID3v2 header")?;
    let frames = FrameWalker::new(&data, HEADER_LEN, header.tag_end().min(data.len()))
        .map(|frame| {
            frame
                .map(|f| f.to_string())
                .context("walking frames")
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((header, frames))
}

fn is_mp3(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

fn copy_replacing(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_file(dest).context("removing existing destination")?;
    }
    fs::copy(src, dest).context("copying")?;
    Ok(())
}

fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let tmp = NamedTempFile::new_in(dir).context("creating temporary file")?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(data)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::id3::frame::TextEncoding;
    use std::fs::File;
    use tempfile::tempdir;

    const AUDIO: &[u8] = b"\xff\xfb\x90\x64audio";

    fn frame(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut v = id.to_vec();
        v.extend_from_slice(&(body.len() as u32).to_be_bytes());
        v.extend_from_slice(&[0, 0]);
        v.extend_from_slice(body);
        v
    }

    fn sample_mp3() -> Vec<u8> {
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x64".to_vec();
        data.extend(frame(b"TIT2", b"\x00old"));
        data.extend(frame(b"TRCK", b"\x009"));
        data.extend(frame(b"TCON", b"\x00Pop"));
        data.resize(10 + 100, 0);
        data.extend(AUDIO);
        data
    }

    fn write(path: &Path, data: &[u8]) {
        File::create(path).unwrap().write_all(data).unwrap();
    }

    #[test]
    fn convert_tracks_in_order() {
        let dir = tempdir().unwrap();
        let mp3_dir = dir.path().join("orig");
        let out_dir = dir.path().join("out");
        fs::create_dir(&mp3_dir).unwrap();
        write(&mp3_dir.join("a.mp3"), &sample_mp3());
        write(&mp3_dir.join("b.mp3"), &sample_mp3());

        let config = TrackConfig::parse(&format!(
            "[SYSTEM]\nOUTDIR={}\n[COMMON]\nTALB=Album\nTCON=サウンドトラック\n[TRACKS]\na.mp3\nb.mp3:My Title\n",
            out_dir.to_string_lossy()
        ))
        .unwrap();

        let written = convert_all(&mp3_dir, &config).unwrap();
        assert_eq!(written, vec![out_dir.join("01_a.mp3"), out_dir.join("02_b.mp3")]);

        let (header, frames) = list_frames(&out_dir.join("02_b.mp3")).unwrap();
        assert_eq!(header.body_size, 100);
        assert_eq!(frames, vec!["TIT2 My Title", "TRCK 2", "TCON サウンドトラック"]);

        let data = fs::read(out_dir.join("01_a.mp3")).unwrap();
        assert_eq!(data.len(), sample_mp3().len());
        assert_eq!(&data[110..], AUDIO);
        assert_eq!(list_frames(&out_dir.join("01_a.mp3")).unwrap().1[0], "TIT2 a");

        let tcon = FrameWalker::new(&data, HEADER_LEN, 110).nth(2).unwrap().unwrap();
        assert!(matches!(tcon.encoding, TextEncoding::Utf16(_)));

        assert_eq!(fs::read(mp3_dir.join("a.mp3")).unwrap(), sample_mp3());
    }

    #[test]
    fn convert_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("out");
        write(&dir.path().join("a.mp3"), &sample_mp3());
        write(&dir.path().join("b.mp3"), b"RIFF....WAVE");
        write(&dir.path().join("c.mp3"), &sample_mp3());

        let config = TrackConfig::parse(&format!(
            "[SYSTEM]\nOUTDIR={}\n[TRACKS]\na.mp3\nb.mp3\nc.mp3\n",
            out_dir.to_string_lossy()
        ))
        .unwrap();

        let err = convert_all(dir.path(), &config).unwrap_err();
        assert!(format!("{:#}", err).contains("b.mp3"));
        assert!(out_dir.join("01_a.mp3").is_file());
        assert!(!out_dir.join("02_b.mp3").exists());
        assert!(!out_dir.join("03_c.mp3").exists());
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn convert_unknown_file() {
        let dir = tempdir().unwrap();
        let config = TrackConfig::parse("[SYSTEM]\nOUTDIR=never\n[TRACKS]\na.mp3\n").unwrap();
        assert!(convert_file(dir.path(), "z.mp3", &config).is_err());
        assert!(convert_file(dir.path(), "a.mp3", &config).is_err());
    }

    #[test]
    fn overwrite_existing_output() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.mp3"), &sample_mp3());
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        write(&out_dir.join("01_a.mp3"), &[0xaa; 4096]);

        let config = TrackConfig::parse(&format!(
            "[SYSTEM]\nOUTDIR={}\n[TRACKS]\na.mp3\n",
            out_dir.to_string_lossy()
        ))
        .unwrap();
        convert_file(dir.path(), "a.mp3", &config).unwrap();
        assert_eq!(
            fs::read(out_dir.join("01_a.mp3")).unwrap().len(),
            sample_mp3().len()
        );
    }

    #[test]
    fn strip_prefixes() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("03_song.mp3"), b"three");
        write(&dir.path().join("song.mp3"), b"stale");
        write(&dir.path().join("12_other.MP3"), b"twelve");
        write(&dir.path().join("04_notes.txt"), b"text");
        write(&dir.path().join("plain.mp3"), b"plain");

        let report = strip_all(dir.path()).unwrap();
        assert_eq!(report, StripReport { copied: 2, failed: 0 });
        assert_eq!(fs::read(dir.path().join("song.mp3")).unwrap(), b"three");
        assert_eq!(fs::read(dir.path().join("other.MP3")).unwrap(), b"twelve");
        assert!(dir.path().join("03_song.mp3").is_file());
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn strip_continues_after_failure() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("song.mp3")).unwrap();
        write(&dir.path().join("03_song.mp3"), b"three");
        write(&dir.path().join("12_other.mp3"), b"twelve");

        let report = strip_all(dir.path()).unwrap();
        assert_eq!(report, StripReport { copied: 1, failed: 1 });
        assert!(dir.path().join("song.mp3").is_dir());
        assert_eq!(fs::read(dir.path().join("other.mp3")).unwrap(), b"twelve");
    }

    #[test]
    fn strip_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(strip_all(&dir.path().join("nope")).is_err());
    }
}
