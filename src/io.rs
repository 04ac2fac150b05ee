use std::path::{Path, PathBuf};

use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ArError, Result};
use crate::pipeline::FrameStats;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path, j)?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Summary of one run of the driver.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub timestamp: i64,
    pub model: String,
    pub scene: String,
    pub model_keypoints: usize,
    pub frames: Vec<FrameStats>,
    pub detection_rate: f64,
}

impl SessionReport {
    pub fn new(
        timestamp: i64,
        model: &str,
        scene: &str,
        model_keypoints: usize,
        frames: Vec<FrameStats>,
    ) -> SessionReport {
        let detected = frames.iter().filter(|f| f.detected).count();
        let detection_rate = if frames.is_empty() {
            0.0
        } else {
            detected as f64 / frames.len() as f64
        };
        SessionReport {
            timestamp,
            model: model.to_string(),
            scene: scene.to_string(),
            model_keypoints,
            frames,
            detection_rate,
        }
    }
}

pub fn write_report<P: AsRef<Path>>(output_path: P, report: &SessionReport) -> Result<()> {
    object_to_json(output_path, report)
}

pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:06}.png", index)
}

/// Output frames kept in memory until the run ends, then written as an image sequence.
#[derive(Default)]
pub struct FrameRecorder {
    frames: Vec<RgbImage>,
}

impl FrameRecorder {
    pub fn new() -> FrameRecorder {
        FrameRecorder::default()
    }

    pub fn push(&mut self, frame: RgbImage) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    /// Writes `frame_000000.png`, `frame_000001.png`, ... into `output_dir`.
    pub fn write_sequence<P: AsRef<Path>>(&self, output_dir: P) -> Result<Vec<PathBuf>> {
        if self.frames.is_empty() {
            return Err(ArError::EmptyRecording);
        }
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        let pb = ProgressBar::new(self.frames.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} frames written") {
            pb.set_style(style);
        }
        let mut written = Vec::with_capacity(self.frames.len());
        for (i, frame) in self.frames.iter().enumerate() {
            let path = output_dir.join(frame_file_name(i));
            frame.save(&path).map_err(|source| ArError::Output {
                path: path.clone(),
                source,
            })?;
            written.push(path);
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(written)
    }
}
