use image::{Rgb, RgbImage};
use planar_ar::ArError;
use planar_ar::data_loader::{ImageSequence, OverlaySource, load_image};
use planar_ar::io::{FrameRecorder, SessionReport, frame_file_name, write_report};
use planar_ar::pipeline::FrameStats;
use tempfile::TempDir;

fn solid(value: u8) -> RgbImage {
    RgbImage::from_pixel(8, 6, Rgb([value, value, value]))
}

fn stats(index: usize, detected: bool) -> FrameStats {
    FrameStats {
        index,
        scene_keypoints: 100,
        matches: if detected { 30 } else { 2 },
        inliers: if detected { 25 } else { 0 },
        detected,
        composited: detected,
    }
}

#[test]
fn test_frame_file_name() {
    assert_eq!(frame_file_name(0), "frame_000000.png");
    assert_eq!(frame_file_name(42), "frame_000042.png");
}

#[test]
fn test_recorder_writes_sequence() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");

    let mut recorder = FrameRecorder::new();
    for v in [10, 20, 30] {
        recorder.push(solid(v));
    }
    assert_eq!(recorder.len(), 3);

    let written = recorder.write_sequence(&out_dir).unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(written[2], out_dir.join("frame_000002.png"));

    let second = load_image(&written[1]).unwrap();
    assert_eq!(second, solid(20));

    // the written folder reads back as a sequence in the same order
    let frames: Vec<RgbImage> = ImageSequence::open(out_dir.to_str().unwrap())
        .unwrap()
        .map(|f| f.unwrap())
        .collect();
    assert_eq!(frames, vec![solid(10), solid(20), solid(30)]);
}

#[test]
fn test_empty_recorder_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = FrameRecorder::new();
    assert!(recorder.is_empty());
    assert!(matches!(
        recorder.write_sequence(temp_dir.path()),
        Err(ArError::EmptyRecording)
    ));
}

#[test]
fn test_sequence_open() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    solid(3).save(dir.join("b.png")).unwrap();
    solid(1).save(dir.join("a.png")).unwrap();
    solid(2).save(dir.join("c.PNG")).unwrap();
    std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

    let seq = ImageSequence::open(dir.to_str().unwrap()).unwrap();
    assert_eq!(seq.len(), 3);
    let names: Vec<String> = seq
        .paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.PNG"]);
    assert_eq!(seq.size_hint(), (3, Some(3)));

    let pattern = format!("{}/*.png", dir.to_str().unwrap());
    let seq = ImageSequence::open(&pattern).unwrap();
    assert_eq!(seq.len(), 2);
}

#[test]
fn test_sequence_open_dir_with_glob_characters() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("take[1]");
    std::fs::create_dir_all(&dir).unwrap();
    solid(4).save(dir.join("f0.png")).unwrap();
    solid(5).save(dir.join("f1.png")).unwrap();

    let seq = ImageSequence::open(dir.to_str().unwrap()).unwrap();
    assert_eq!(seq.len(), 2);
    let frames: Vec<RgbImage> = seq.map(|f| f.unwrap()).collect();
    assert_eq!(frames, vec![solid(4), solid(5)]);
}

#[test]
fn test_sequence_errors() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap().to_string();
    assert!(matches!(
        ImageSequence::open(&dir),
        Err(ArError::EmptySource(_))
    ));
    assert!(matches!(
        ImageSequence::open("[unclosed"),
        Err(ArError::Pattern { .. })
    ));

    // unreadable frames surface when they are reached
    std::fs::write(temp_dir.path().join("frame_000000.png"), b"garbage").unwrap();
    let mut seq = ImageSequence::open(&dir).unwrap();
    assert!(matches!(seq.next(), Some(Err(ArError::ImageLoad { .. }))));
    assert!(seq.next().is_none());
}

#[test]
fn test_overlay_source_selection() {
    let temp_dir = TempDir::new().unwrap();
    let patch_path = temp_dir.path().join("patch.png");
    solid(200).save(&patch_path).unwrap();
    let video2_dir = temp_dir.path().join("video2");
    std::fs::create_dir_all(&video2_dir).unwrap();
    solid(5).save(video2_dir.join(frame_file_name(0))).unwrap();
    solid(6).save(video2_dir.join(frame_file_name(1))).unwrap();

    assert!(matches!(
        OverlaySource::select(None, None),
        Err(ArError::NoOverlay)
    ));

    let mut patch = OverlaySource::select(patch_path.to_str(), None).unwrap();
    for _ in 0..3 {
        let overlay = patch.next_overlay().unwrap().unwrap();
        assert_eq!(*overlay, solid(200));
    }

    // the second video wins over the patch
    let mut video = OverlaySource::select(patch_path.to_str(), video2_dir.to_str()).unwrap();
    assert_eq!(*video.next_overlay().unwrap().unwrap(), solid(5));
    assert_eq!(*video.next_overlay().unwrap().unwrap(), solid(6));
    assert!(video.next_overlay().unwrap().is_none());
}

#[test]
fn test_session_report() {
    let temp_dir = TempDir::new().unwrap();
    let frames = vec![stats(0, true), stats(1, false), stats(2, true), stats(3, true)];
    let report = SessionReport::new(1_700_000_000, "model.png", "scene/", 321, frames);
    assert!((report.detection_rate - 0.75).abs() < 1e-12);

    let path = temp_dir.path().join("report.json");
    write_report(&path, &report).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["model_keypoints"], 321);
    assert_eq!(json["frames"].as_array().unwrap().len(), 4);
    assert_eq!(json["frames"][1]["detected"], false);
    assert_eq!(json["frames"][2]["inliers"], 25);

    let empty = SessionReport::new(0, "m", "s", 0, Vec::new());
    assert_eq!(empty.detection_rate, 0.0);
}
