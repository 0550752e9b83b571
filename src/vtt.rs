//! WebVTT documents stitched together from windowed SubRip fetches.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::{Item, MediaType};
use crate::archive::upstream::TimeWindow;
use log::{debug, info, warn};

pub const HEADER: &str = "WEBVTT\n";

const CUE_ARROW: &str = "-->";

/// Parse a SubRip timestamp (`HH:MM:SS,mmm`) into milliseconds.
fn srt_millis(raw: &str) -> Option<u64> {
    let (clock, millis) = raw.trim().split_once(',')?;
    let mut parts = clock.split(':').map(|p| p.trim().parse::<u64>());
    let (hours, minutes, seconds) = (parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?);
    if parts.next().is_some() {
        return None;
    }
    let millis = millis.trim().parse::<u64>().ok()?;
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

/// Format milliseconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
fn vtt_timestamp(millis: u64) -> String {
    let seconds = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60,
        millis % 1000
    )
}

/// Rewrite a cue timing line, shifting both ends by `offset` seconds.
fn shift_cue(line: &str, offset: u64) -> Result<String> {
    let malformed = || ArchiveError::MalformedSource(format!("Bad subtitle timing: '{}'", line));
    let (start, end) = line.split_once(CUE_ARROW).ok_or_else(malformed)?;
    let shift = |raw: &str| {
        offset
            .checked_mul(1000)
            .and_then(|offset| srt_millis(raw)?.checked_add(offset))
            .ok_or_else(malformed)
    };
    let (start, end) = (shift(start)?, shift(end)?);
    Ok(format!("{} {} {}", vtt_timestamp(start), CUE_ARROW, vtt_timestamp(end)))
}

/// The running time of the item, taken from its original MPEG file.
fn mpeg_duration(item: &Item) -> Result<f64> {
    let mpeg = item
        .find_file(|f| f.is_original() && f.name.ends_with(".mpg"))
        .ok_or_else(|| {
            ArchiveError::NotFound(format!("{} has no original MPEG file", item.identifier))
        })?;
    Ok(mpeg.length.unwrap_or_else(|| {
        warn!("{} has no length, no subtitles will be streamed", mpeg.name);
        0.0
    }))
}

/// Build a WebVTT document from the item's SubRip subtitles, fetched one
/// window at a time.
///
/// # Arguments
/// * `identifier` - A movies item with an original `.mpg` and a `.srt` file
///
/// # Returns
/// * `Result<String>` - The document, header first
pub fn build_vtt(gateway: &dyn MetadataGateway, identifier: &str) -> Result<String> {
    let item = gateway.item(identifier)?;
    if item.mediatype != MediaType::Movies {
        return Err(ArchiveError::UnsupportedMediaType(format!(
            "{} is not a movie",
            identifier
        )));
    }

    let duration = mpeg_duration(&item)?;
    let srt = item
        .files
        .iter()
        .rev()
        .find(|f| f.name.ends_with(".srt"))
        .ok_or_else(|| ArchiveError::NotFound(format!("{} has no SubRip file", identifier)))?;

    let windows = TimeWindow::split(duration);
    info!("Streaming {} in {} windows", srt.name, windows.len());

    let mut lines = vec![HEADER.to_string()];
    for window in windows {
        let text = gateway.subtitle_window(identifier, &srt.name, window)?;
        debug!("Window {}-{} has {} bytes", window.start, window.end, text.len());

        for line in text.lines() {
            if line.contains(CUE_ARROW) {
                lines.push(shift_cue(line, window.start)?);
            } else {
                lines.push(line.to_string());
            }
        }
        lines.push(String::new());
    }
    Ok(lines.join("\n"))
}
