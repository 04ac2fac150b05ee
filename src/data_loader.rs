use std::borrow::Cow;
use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use image::RgbImage;

use crate::error::{ArError, Result};

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".bmp"];

/// Decodes an image file into 8-bit RGB.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| ArError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        let name = p.as_os_str().to_string_lossy().to_lowercase();
        for ext in &IMAGE_EXTENSIONS {
            if name.ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Frames of a video stored as individual image files, decoded lazily in path order.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    /// Opens a directory of frames, or a glob pattern such as `frames/*.png`.
    pub fn open(source: &str) -> Result<ImageSequence> {
        let pattern = if Path::new(source).is_dir() {
            format!("{}/*", Pattern::escape(source.trim_end_matches('/')))
        } else {
            source.to_string()
        };
        let img_paths = glob(&pattern).map_err(|e| ArError::Pattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        let mut paths: Vec<PathBuf> = img_paths.into_iter().filter_map(img_filter).collect();
        paths.sort();
        if paths.is_empty() {
            return Err(ArError::EmptySource(source.to_string()));
        }
        log::trace!("{} frames in {}", paths.len(), source);
        Ok(ImageSequence::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> ImageSequence {
        ImageSequence { paths, next: 0 }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Iterator for ImageSequence {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.get(self.next)?;
        self.next += 1;
        Some(load_image(path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.paths.len() - self.next;
        (left, Some(left))
    }
}

/// Where the image pasted onto the detected model comes from.
pub enum OverlaySource {
    Static(RgbImage),
    Sequence(ImageSequence),
}

impl OverlaySource {
    /// Picks the second video over the static patch, at least one must be given.
    pub fn select(patch: Option<&str>, video2: Option<&str>) -> Result<OverlaySource> {
        match (video2, patch) {
            (Some(video2), _) => Ok(OverlaySource::Sequence(ImageSequence::open(video2)?)),
            (None, Some(patch)) => Ok(OverlaySource::Static(load_image(patch)?)),
            (None, None) => Err(ArError::NoOverlay),
        }
    }

    /// The overlay for the next scene frame, `None` once a sequence is exhausted.
    pub fn next_overlay(&mut self) -> Result<Option<Cow<'_, RgbImage>>> {
        match self {
            OverlaySource::Static(img) => Ok(Some(Cow::Borrowed(img))),
            OverlaySource::Sequence(seq) => seq.next().transpose().map(|o| o.map(Cow::Owned)),
        }
    }
}
