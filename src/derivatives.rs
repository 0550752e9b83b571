//! Classification of an item's file listing into originals, derivatives and
//! subtitle tracks, plus the static format tables built on top of it.
use crate::archive::item::{File, FileSource};
use crate::resolver::IMAGE_EXTENSIONS;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Audio formats in Choice priority order
pub const AUDIO_FORMATS: [&str; 14] = [
    "VBR MP3",
    "32Kbps MP3",
    "56Kbps MP3",
    "64Kbps MP3",
    "96Kbps MP3",
    "128Kbps MP3",
    "MPEG-4 Audio",
    "Flac",
    "AIFF",
    "Apple Lossless Audio",
    "Ogg Vorbis",
    "WAVE",
    "24bit Flac",
    "Shorten",
];

/// Video formats in Choice priority order
pub const VIDEO_FORMATS: [&str; 14] = [
    "MPEG4",
    "h.264 HD",
    "h.264 MPEG4",
    "512Kb MPEG4",
    "HiRes MPEG4",
    "MPEG2",
    "h.264",
    "Matroska",
    "Ogg Video",
    "Ogg Theora",
    "WebM",
    "Windows Media",
    "Cinepack",
    "QuickTime",
];

pub const SUBTITLE_FORMAT: &str = "Web Video Text Tracks";

static SUBTITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[a-zA-H-]*\.vtt").unwrap());

/// Mime type of an archive format label.
pub fn to_mimetype(format: &str) -> &'static str {
    match format {
        "VBR MP3" | "32Kbps MP3" | "56Kbps MP3" | "64Kbps MP3" | "96Kbps MP3" | "128Kbps MP3" => {
            "audio/mp3"
        }
        "Flac" | "24bit Flac" => "audio/flac",
        "Ogg Vorbis" => "audio/ogg",
        "Ogg Video" => "video/ogg",
        "WAVE" => "audio/wav",
        "MPEG4" | "h.264 HD" => "video/mp4",
        "Shorten" => "audio/shn",
        "MPEG2" | "512Kb MPEG4" | "HiRes MPEG4" | "h.264 MPEG4" | "h.264" => "video/mpeg",
        "Matroska" => "video/x-matroska",
        "Cinepack" => "video/x-msvideo",
        "AIFF" => "audio/aiff",
        "Apple Lossless Audio" => "audio/x-m4a",
        "MPEG-4 Audio" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Which manifest property a linked file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    SeeAlso,
    Rendering,
}

/// How a file of a given format is linked from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkKind {
    pub field: LinkField,
    pub kind: &'static str,
    pub format: &'static str,
}

const LINKS: &[(&str, LinkField, &str, &str)] = &[
    ("Animated GIF", LinkField::Rendering, "Image", "image/gif"),
    ("Text PDF", LinkField::Rendering, "Text", "application/pdf"),
    ("Additional Text PDF", LinkField::Rendering, "Text", "application/pdf"),
    ("Image Container PDF", LinkField::Rendering, "Text", "application/pdf"),
    ("Grayscale PDF", LinkField::Rendering, "Text", "application/pdf"),
    ("EPUB", LinkField::Rendering, "Text", "application/epub+zip"),
    ("DjVu", LinkField::Rendering, "Text", "image/vnd.djvu"),
    ("DjVuTXT", LinkField::Rendering, "Text", "text/plain"),
    ("Djvu XML", LinkField::Rendering, "Dataset", "application/xml"),
    ("hOCR", LinkField::Rendering, "Text", "text/html"),
    ("chOCR", LinkField::Rendering, "Dataset", "application/gzip"),
    ("OCR Search Text", LinkField::Rendering, "Text", "application/gzip"),
    ("Abbyy GZ", LinkField::Rendering, "Dataset", "application/gzip"),
    ("Archive BitTorrent", LinkField::Rendering, "Dataset", "application/x-bittorrent"),
    ("Single Page Processed JP2 ZIP", LinkField::Rendering, "Dataset", "application/zip"),
    ("Single Page Original JP2 Tar", LinkField::Rendering, "Dataset", "application/x-tar"),
    ("SubRip", LinkField::Rendering, "Text", "application/x-subrip"),
    (SUBTITLE_FORMAT, LinkField::Rendering, "Text", "text/vtt"),
    ("Intermediate ASR JSON", LinkField::Rendering, "Dataset", "application/json"),
    ("Whisper ASR JSON", LinkField::Rendering, "Dataset", "application/json"),
    ("Cloth Cover Detection Log", LinkField::SeeAlso, "Dataset", "text/plain"),
    ("Dublin Core", LinkField::SeeAlso, "Dataset", "application/xml"),
    ("OCR Page Index", LinkField::SeeAlso, "Dataset", "application/gzip"),
    ("MARC", LinkField::SeeAlso, "Dataset", "application/marcxml+xml"),
    ("MARC Binary", LinkField::SeeAlso, "Dataset", "application/marc"),
    ("MARC Source", LinkField::SeeAlso, "Dataset", "application/xml"),
    ("Page Numbers JSON", LinkField::SeeAlso, "Dataset", "application/json"),
    ("Scandata", LinkField::SeeAlso, "Dataset", "application/xml"),
    ("Storj Upload Log", LinkField::SeeAlso, "Dataset", "text/plain"),
    ("Storj Upload Trigger", LinkField::SeeAlso, "Dataset", "text/plain"),
    ("Metadata", LinkField::SeeAlso, "Dataset", "application/xml"),
];

pub fn link_kind(format: &str) -> Option<LinkKind> {
    LINKS
        .iter()
        .find(|(label, ..)| *label == format)
        .map(|&(_, field, kind, format)| LinkKind {
            field,
            kind,
            format,
        })
}

pub fn is_thumbnail(file: &File) -> bool {
    file.format == "Thumbnail" || file.format == "JPEG Thumb" || file.name == "__ia_thumb.jpg"
}

/// Name of the media file a subtitle track belongs to, e.g.
/// `cruz-test.en.vtt` belongs to `cruz-test`.
pub fn subtitle_source(name: &str) -> String {
    SUBTITLE_SUFFIX_RE.replace_all(name, "").into_owned()
}

/// Original image format shared by more than one original file, if any.
pub fn multi_file_format(files: &[File]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for file in files.iter().filter(|f| f.is_original()) {
        match counts.iter_mut().find(|(format, _)| *format == file.format) {
            Some((_, count)) => *count += 1,
            None => counts.push((&file.format, 1)),
        }
    }

    counts
        .into_iter()
        .find(|(format, count)| {
            *count > 1 && IMAGE_EXTENSIONS.contains(&format.to_lowercase().as_str())
        })
        .map(|(format, _)| format)
}

/// A file listing split into originals and their derivatives.
#[derive(Debug, Default)]
pub struct Derivatives<'a> {
    /// Originals in listing order
    pub originals: Vec<&'a File>,

    /// Derivatives keyed by originating file name, then by format
    by_original: HashMap<&'a str, HashMap<&'a str, &'a File>>,

    /// Subtitle tracks keyed by the media file name (without extension) they belong to
    pub subtitles: HashMap<String, Vec<&'a File>>,
}

impl<'a> Derivatives<'a> {
    /// Classify a file listing.
    ///
    /// # Arguments
    /// * `files` - The item's files in listing order
    /// * `with_subtitles` - Whether to bucket WebVTT tracks as well
    pub fn classify(files: &'a [File], with_subtitles: bool) -> Self {
        let mut derivatives = Self::default();

        for file in files {
            match file.source {
                FileSource::Original => derivatives.originals.push(file),
                FileSource::Derivative => {
                    if let Some(original) = file.original.as_deref() {
                        derivatives
                            .by_original
                            .entry(original)
                            .or_default()
                            .insert(&file.format, file);
                    }
                }
                _ => {}
            }

            if with_subtitles && file.format == SUBTITLE_FORMAT {
                derivatives
                    .subtitles
                    .entry(subtitle_source(&file.name))
                    .or_default()
                    .push(file);
            }
        }

        derivatives
    }

    /// Originals whose format is in `formats`, in listing order.
    pub fn originals_in(&self, formats: &[&str]) -> Vec<&'a File> {
        self.originals
            .iter()
            .copied()
            .filter(|f| formats.contains(&f.format.as_str()))
            .collect()
    }

    /// Whether any derivative of `original` has a format in `formats`.
    pub fn has_renditions(&self, original: &File, formats: &[&str]) -> bool {
        self.by_original
            .get(original.name.as_str())
            .is_some_and(|by_format| by_format.keys().any(|f| formats.contains(f)))
    }

    /// Playable renditions of `original` in the priority order of `formats`.
    /// A derivative wins over the original when both share a format.
    pub fn renditions(&self, original: &'a File, formats: &[&'a str]) -> Vec<(&'a str, &'a File)> {
        let by_format = self.by_original.get(original.name.as_str());
        formats
            .iter()
            .filter_map(|&format| {
                by_format
                    .and_then(|m| m.get(format).copied())
                    .or_else(|| (original.format == format).then_some(original))
                    .map(|file| (format, file))
            })
            .collect()
    }
}
