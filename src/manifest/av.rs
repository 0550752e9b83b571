//! Time-based media: audio tracks, videos with subtitles, and restricted
//! videos streamed in fixed windows.
use crate::archive::gateway::{ArchiveError, Result};
use crate::archive::item::{File, Item};
use crate::archive::upstream::TimeWindow;
use crate::derivatives::{AUDIO_FORMATS, Derivatives, VIDEO_FORMATS, to_mimetype};
use crate::iiif::v3::{
    Annotation, AnnotationPage, AvBody, Behavior, Body, Canvas, Choice, LanguageMap, Manifest,
    Motivation, Range, RefKind, Reference, TextBody,
};
use crate::options::BuildOptions;
use log::{debug, warn};
use std::collections::HashSet;

const AUTOGENERATED_SUFFIX: &str = "autogenerated.vtt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AvKind {
    Sound,
    Video,
}

impl AvKind {
    fn body(self, body: AvBody) -> Body {
        match self {
            AvKind::Sound => Body::Sound(body),
            AvKind::Video => Body::Video(body),
        }
    }
}

/// Hands out canvas slugs, suffixing repeats so ids stay unique.
#[derive(Debug, Default)]
struct Slugs(HashSet<String>);

impl Slugs {
    fn claim(&mut self, stem: &str) -> String {
        let base = stem.replace(' ', "-");
        if self.0.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.0.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn length_of(item: &Item, file: &File) -> Option<f64> {
    if file.length.is_none() {
        warn!(
            "{} in {} has no length, omitting its duration",
            file.name, item.identifier
        );
    }
    file.length
}

/// The painting body of one original: a Choice over its renditions when it has
/// derivatives in `formats`, else the original alone.
///
/// Derivatives outside `formats` (spectrogram images, waveform PNGs and the
/// like) never produce a Choice, so an original whose only derivatives are of
/// that kind is painted directly.
fn painting_body(
    kind: AvKind,
    item: &Item,
    original: &File,
    derivatives: &Derivatives,
    formats: &[&str],
    duration: Option<f64>,
    options: &BuildOptions,
) -> Body {
    let (height, width) = match kind {
        AvKind::Video => (original.height, original.width),
        AvKind::Sound => (None, None),
    };
    let resource = |format: &str, file: &File| AvBody {
        id: options.download_url(&item.identifier, &file.name),
        format: to_mimetype(format).to_string(),
        label: Some(options.label(format)),
        duration,
        height,
        width,
    };

    if derivatives.has_renditions(original, formats) {
        let items = derivatives
            .renditions(original, formats)
            .into_iter()
            .map(|(format, file)| kind.body(resource(format, file)))
            .collect();
        Body::Choice(Choice { items })
    } else {
        kind.body(resource(&original.format, original))
    }
}

fn painted_canvas(canvas: &mut Canvas, base: &str, body: Body) {
    canvas.items.push(AnnotationPage::new(
        format!("{}/page", base),
        vec![Annotation::new(
            format!("{}/annotation", base),
            Motivation::Painting,
            body,
            canvas.id.as_str(),
        )],
    ));
}

/// One canvas per allow-listed audio original, auto-advancing through a
/// "Track List" range when there is more than one.
pub fn build_audio(manifest: &mut Manifest, item: &Item, options: &BuildOptions) {
    let derivatives = Derivatives::classify(&item.files, false);
    let originals = derivatives.originals_in(&AUDIO_FORMATS);
    let mut slugs = Slugs::default();

    for file in &originals {
        let base = format!(
            "{}/{}/{}",
            options.uri_prefix,
            item.identifier,
            slugs.claim(file.stem())
        );
        let duration = length_of(item, file);

        let mut canvas = Canvas::new(format!("{}/canvas", base), options.label(file.stem()));
        canvas.duration = duration;
        let body = painting_body(
            AvKind::Sound,
            item,
            file,
            &derivatives,
            &AUDIO_FORMATS,
            duration,
            options,
        );
        painted_canvas(&mut canvas, &base, body);
        manifest.items.push(canvas);
    }
    debug!("Built {} audio canvases for {}", originals.len(), item.identifier);

    if originals.len() > 1 {
        manifest.behavior = vec![Behavior::AutoAdvance];
        let tracks = manifest
            .items
            .iter()
            .map(|canvas| Reference::new(RefKind::Canvas, canvas.id.as_str()))
            .collect();
        manifest.structures.push(Range::new(
            format!("{}/{}/range/track-list", options.uri_prefix, item.identifier),
            LanguageMap::en("Track List"),
            tracks,
        ));
    }
}

/// Label and language of a subtitle track: `autogenerated`, or the language
/// code in the penultimate dot segment of the file name.
fn subtitle_label(name: &str, options: &BuildOptions) -> (Option<LanguageMap>, Option<String>) {
    if name.ends_with(AUTOGENERATED_SUFFIX) {
        return (Some(LanguageMap::en("autogenerated")), None);
    }
    let segments: Vec<&str> = name.split('.').collect();
    match segments.len() {
        0 | 1 => (None, None),
        n => {
            let language = segments[n - 2];
            (Some(options.label(language)), Some(language.to_string()))
        }
    }
}

fn subtitle_page(
    item: &Item,
    base: &str,
    canvas_id: &str,
    tracks: &[&File],
    options: &BuildOptions,
) -> AnnotationPage {
    let annotations = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let (label, language) = subtitle_label(&track.name, options);
            Annotation::new(
                format!("{}/annotation/vtt/{}", base, i + 1),
                Motivation::Supplementing,
                Body::Text(TextBody {
                    id: format!(
                        "{}resource/{}/{}",
                        options.domain,
                        item.identifier,
                        track.name.replace(' ', "%20")
                    ),
                    format: "text/vtt".to_string(),
                    label,
                    language,
                }),
                canvas_id,
            )
        })
        .collect();
    AnnotationPage::new(format!("{}/vtt", base), annotations)
}

fn video_originals<'a>(derivatives: &Derivatives<'a>, manifest: &mut Manifest) -> Vec<&'a File> {
    let originals = derivatives.originals_in(&VIDEO_FORMATS);
    if originals.len() > 1 {
        manifest.behavior = vec![Behavior::AutoAdvance];
    }
    originals
}

/// One canvas per allow-listed video original, with its subtitle tracks as
/// supplementing annotations.
pub fn build_video(manifest: &mut Manifest, item: &Item, options: &BuildOptions) {
    let derivatives = Derivatives::classify(&item.files, true);
    let originals = video_originals(&derivatives, manifest);
    let mut slugs = Slugs::default();

    for file in originals {
        let base = format!(
            "{}/{}/{}",
            options.uri_prefix,
            item.identifier,
            slugs.claim(file.stem())
        );
        let duration = length_of(item, file);

        let mut canvas = Canvas::new(format!("{}/canvas", base), options.label(file.stem()));
        canvas.duration = duration;
        canvas.height = file.height;
        canvas.width = file.width;

        if let Some(tracks) = derivatives.subtitles.get(file.stem()) {
            let page = subtitle_page(item, &base, &canvas.id, tracks, options);
            canvas.annotations.push(page);
        }

        let body = painting_body(
            AvKind::Video,
            item,
            file,
            &derivatives,
            &VIDEO_FORMATS,
            duration,
            options,
        );
        painted_canvas(&mut canvas, &base, body);
        manifest.items.push(canvas);
    }
}

/// Restricted videos cannot be downloaded whole: each canvas is painted with
/// consecutive 60 second stream windows of the item's mp4, and its subtitles
/// come from the live VTT stream.
///
/// # Returns
/// * `Result<()>` - `MalformedSource` when the item has no mp4 or storage node
pub fn build_restricted_video(
    manifest: &mut Manifest,
    item: &Item,
    options: &BuildOptions,
) -> Result<()> {
    let mp4 = item
        .files
        .iter()
        .rev()
        .find(|f| f.name.ends_with(".mp4"))
        .ok_or_else(|| {
            ArchiveError::MalformedSource(format!("{} has no mp4 file to stream", item.identifier))
        })?;
    let (Some(server), Some(dir)) = (item.server.as_deref(), item.dir.as_deref()) else {
        return Err(ArchiveError::MalformedSource(format!(
            "{} has no storage node",
            item.identifier
        )));
    };

    let duration = length_of(item, mp4).unwrap_or_default();
    let windows = TimeWindow::split(duration);
    debug!(
        "Streaming {} as {} windows of {}",
        mp4.name,
        windows.len(),
        item.identifier
    );

    let derivatives = Derivatives::classify(&item.files, false);
    let originals = video_originals(&derivatives, manifest);
    let mut slugs = Slugs::default();

    for file in originals {
        let base = format!(
            "{}/{}/{}",
            options.uri_prefix,
            item.identifier,
            slugs.claim(file.stem())
        );

        let mut canvas = Canvas::new(format!("{}/canvas", base), options.label(file.stem()));
        canvas.duration = Some(duration);
        canvas.height = mp4.height;
        canvas.width = mp4.width;

        let segments = windows
            .iter()
            .enumerate()
            .map(|(i, window)| {
                let stream = format!(
                    "https://{}{}/{}?start={}&end={}&ignore=x.mp4&cnt=0",
                    server,
                    dir,
                    mp4.name.replace(' ', "%20"),
                    window.start,
                    window.end
                );
                Annotation::new(
                    format!("{}/annotation/{}", base, i),
                    Motivation::Painting,
                    Body::Video(AvBody {
                        id: stream,
                        format: "video/mp4".to_string(),
                        label: Some(LanguageMap::en(format!(
                            "Part {} of {}",
                            i + 1,
                            windows.len()
                        ))),
                        duration: Some(window.duration() as f64),
                        height: mp4.height,
                        width: mp4.width,
                    }),
                    format!("{}#t={},{}", canvas.id, window.start, window.end),
                )
            })
            .collect();
        canvas
            .items
            .push(AnnotationPage::new(format!("{}/page", base), segments));

        canvas.annotations.push(AnnotationPage::new(
            format!("{}/vtt", base),
            vec![Annotation::new(
                format!("{}/annotation/vtt/streamed", base),
                Motivation::Supplementing,
                Body::Text(TextBody {
                    id: format!("{}vtt/streaming/{}.vtt", options.domain, item.identifier),
                    format: "text/vtt".to_string(),
                    label: None,
                    language: None,
                }),
                canvas.id.as_str(),
            )],
        ));
        manifest.items.push(canvas);
    }
    Ok(())
}
