use clap::{Parser, Subcommand};
use image::{Rgb, RgbImage};
use planar_ar::config::WarpInterpolation;
use planar_ar::io::{frame_file_name, object_to_json};
use planar_ar::pose::{model_corners, project_corners};
use planar_ar::synthetic::{place_model, similarity, textured_model};
use serde::Serialize;
use std::f64::consts::PI;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic model, patch and scene sequence
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Number of scene frames to generate
        #[arg(short, long, default_value = "30")]
        num_frames: usize,

        /// Model width and height
        #[arg(long, default_value = "240")]
        model_size: u32,

        /// Scene width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Scene height
        #[arg(long, default_value = "480")]
        height: u32,

        /// Also write a second sequence usable as --video2
        #[arg(long)]
        with_video2: bool,

        /// Random seed for the model texture
        #[arg(long, default_value = "7")]
        seed: u64,
    },
}

#[derive(Serialize)]
struct GroundTruth {
    frame: String,
    corners: [[f32; 2]; 4],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            num_frames,
            model_size,
            width,
            height,
            with_video2,
            seed,
        } => {
            generate_scene(
                &output,
                num_frames,
                model_size,
                width,
                height,
                with_video2,
                seed,
            )?;
        }
    }

    Ok(())
}

fn patch_image(size: u32, phase: f64) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let u = x as f64 / size as f64;
        let v = y as f64 / size as f64;
        let wave = ((u * 4.0 + phase) * PI).sin() * ((v * 4.0) * PI).cos();
        Rgb([
            (60.0 + 180.0 * u) as u8,
            (130.0 + 110.0 * wave) as u8,
            (60.0 + 180.0 * v) as u8,
        ])
    })
}

fn generate_scene(
    output_dir: &str,
    num_frames: usize,
    model_size: u32,
    width: u32,
    height: u32,
    with_video2: bool,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;

    let output = Path::new(output_dir);
    let scene_dir = output.join("scene");
    fs::create_dir_all(&scene_dir)?;

    // full resolution model, the driver halves it by default
    let model = textured_model(model_size * 2, model_size * 2, seed);
    model.save(output.join("model.png"))?;
    patch_image(model_size, 0.0).save(output.join("patch.png"))?;

    let video2_dir = output.join("video2");
    if with_video2 {
        fs::create_dir_all(&video2_dir)?;
    }

    let background = RgbImage::from_fn(width, height, |x, y| {
        let v = 90 + ((x / 16 + y / 16) % 2) as u8 * 20;
        Rgb([v, v, v])
    });
    let corners = model_corners(model.width(), model.height());
    let mut ground_truth = Vec::with_capacity(num_frames);

    for frame_idx in 0..num_frames {
        let t = frame_idx as f64 / num_frames.max(1) as f64;
        let scale = 0.45 + 0.15 * (2.0 * PI * t).sin();
        let angle = 0.4 * (2.0 * PI * t).sin();
        let center = (
            width as f64 / 2.0 + width as f64 * 0.15 * (2.0 * PI * t).cos(),
            height as f64 / 2.0 + height as f64 * 0.1 * (4.0 * PI * t).sin(),
        );
        let Some(h) = similarity(model.dimensions(), scale, angle, center) else {
            continue;
        };
        let scene = place_model(&background, &model, &h, WarpInterpolation::Bilinear);
        let name = frame_file_name(frame_idx);
        scene.save(scene_dir.join(&name))?;

        if let Some(projected) = project_corners(&h, &corners) {
            ground_truth.push(GroundTruth {
                frame: name.clone(),
                corners: projected.map(|c| [c.x, c.y]),
            });
        }
        if with_video2 {
            patch_image(model_size, 4.0 * t).save(video2_dir.join(&name))?;
        }
    }

    object_to_json(output.join("ground_truth.json"), &ground_truth)?;

    println!("Generated {} frames in {}", num_frames, output_dir);
    Ok(())
}
