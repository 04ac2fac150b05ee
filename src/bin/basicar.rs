use clap::Parser;
use log::{info, warn};
use planar_ar::config::PipelineConfig;
use planar_ar::data_loader::{ImageSequence, OverlaySource, load_image};
use planar_ar::io::{FrameRecorder, SessionReport, object_from_json, write_report};
use planar_ar::pipeline::{Pipeline, scale_image};
use planar_ar::visualization::{draw_keypoints, draw_matches};
use std::path::PathBuf;
use std::time::Instant;
use time::OffsetDateTime;

#[derive(Parser)]
#[command(version, about, author)]
struct BasicArCli {
    /// path to the model image
    model: String,

    /// scene frames: a directory or a glob pattern
    video: String,

    /// static image pasted onto the detected model
    #[arg(long)]
    patch: Option<String>,

    /// second frame sequence used as the overlay, takes priority over --patch
    #[arg(long)]
    video2: Option<String>,

    /// pipeline configuration json
    #[arg(short, long)]
    config: Option<String>,

    /// output folder, defaults to output_<local time>
    #[arg(short, long)]
    output: Option<String>,

    /// do not write the composited frames
    #[arg(long)]
    no_record: bool,

    /// stop after this many scene frames
    #[arg(long)]
    max_frames: Option<usize>,

    /// also write model keypoints and per-frame match visualizations
    #[arg(long)]
    save_matches: bool,
}

fn default_output_dir() -> PathBuf {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PathBuf::from(format!(
        "output_{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = BasicArCli::parse();

    let config: PipelineConfig = match &cli.config {
        Some(path) => object_from_json(path)?,
        None => PipelineConfig::default(),
    };
    let mut overlay_source = OverlaySource::select(cli.patch.as_deref(), cli.video2.as_deref())?;
    let model = scale_image(&load_image(&cli.model)?, config.model_scale);
    let scene_frames = ImageSequence::open(&cli.video)?;
    let output_dir = cli.output.map(PathBuf::from).unwrap_or_else(default_output_dir);

    let scene_scale = config.scene_scale;
    let pipeline = Pipeline::from_config(model, config);
    let mut recorder = FrameRecorder::new();
    let mut frame_stats = Vec::new();
    let mut overlay_exhausted = false;

    if cli.save_matches {
        let matches_dir = output_dir.join("matches");
        std::fs::create_dir_all(&matches_dir)?;
        draw_keypoints(pipeline.model(), &pipeline.model_features().keypoints)
            .save(matches_dir.join("model_keypoints.png"))?;
    }

    let now = Instant::now();
    let limit = cli.max_frames.unwrap_or(usize::MAX);
    for (frame_idx, frame) in scene_frames.take(limit).enumerate() {
        let scene = scale_image(&frame?, scene_scale);
        let overlay = overlay_source.next_overlay()?;
        if overlay.is_none() && !overlay_exhausted {
            warn!("overlay sequence ended at frame {}, continuing without overlay", frame_idx);
            overlay_exhausted = true;
        }

        let output = pipeline.process(&scene, overlay.as_deref());
        if cli.save_matches {
            let vis = draw_matches(
                pipeline.model(),
                &pipeline.model_features().keypoints,
                &scene,
                &output.detection.scene_features.keypoints,
                &output.detection.matches,
            );
            vis.save(
                output_dir
                    .join("matches")
                    .join(format!("matches_{:06}.png", frame_idx)),
            )?;
        }
        frame_stats.push(output.stats(frame_idx));
        if !cli.no_record {
            recorder.push(output.image);
        }
    }
    let duration_sec = now.elapsed().as_secs_f64();
    info!("processing took {:.6} sec", duration_sec);
    if !frame_stats.is_empty() {
        info!("avg: {} sec", duration_sec / frame_stats.len() as f64);
    }

    if cli.no_record {
        std::fs::create_dir_all(&output_dir)?;
    } else {
        let written = recorder.write_sequence(&output_dir)?;
        println!("{} frames saved to {}", written.len(), output_dir.display());
    }

    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    let report = SessionReport::new(
        timestamp,
        &cli.model,
        &cli.video,
        pipeline.model_features().len(),
        frame_stats,
    );
    let report_path = output_dir.join("report.json");
    write_report(&report_path, &report)?;
    println!(
        "detection rate {:.1}%, report saved to {}",
        report.detection_rate * 100.0,
        report_path.display()
    );
    Ok(())
}
