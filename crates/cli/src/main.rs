use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use image::{Rgb, RgbImage};

use iristrack_core::detection::anchors::GridAnchorLayout;
use iristrack_core::detection::decoder::{DetectionPostProcess, DetectorConfig};
use iristrack_core::inference::ort_engine::OrtEngine;
use iristrack_core::pipeline::face_mesh::FaceMeshPipeline;
use iristrack_core::pipeline::Eye;
use iristrack_core::shared::frame::Frame;
use iristrack_core::shared::rect::Point;

const DETECTION_MODEL: &str = "face_detection_short.onnx";
const LANDMARK_MODEL: &str = "face_landmark.onnx";
const IRIS_MODEL: &str = "iris_landmark.onnx";

const DETECTION_INPUT_SIZE: u32 = 128;
const LANDMARK_INPUT_SIZE: u32 = 192;
const IRIS_INPUT_SIZE: u32 = 64;

/// Detect a face in an image and annotate its face and iris landmarks.
#[derive(Parser)]
#[command(name = "iristrack")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output file for the annotated image (omit to only print results).
    output: Option<PathBuf>,

    /// Directory containing the detection, landmark and iris models.
    #[arg(long, default_value = "./models")]
    models: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.75")]
    confidence: f32,

    /// Skip the iris stage (face landmarks only).
    #[arg(long)]
    no_iris: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = build_pipeline(&cli)?;

    let mut rgb = image::open(&cli.input)?.to_rgb8();
    pipeline.load_frame(frame_from_rgb(&rgb));

    let start = Instant::now();
    pipeline.run_inference()?;
    log::info!(
        "inference took {:.1} ms",
        start.elapsed().as_secs_f64() * 1e3
    );

    let face_roi = pipeline.face_roi();
    if face_roi.is_empty() {
        println!("No face found in {}", cli.input.display());
        return Ok(());
    }

    let detection = pipeline.detection();
    println!(
        "Face at ({}, {}) {}x{} (score {:.2})",
        face_roi.x, face_roi.y, face_roi.width, face_roi.height, detection.score
    );

    if let Some(output) = &cli.output {
        for p in pipeline.all_face_landmarks() {
            draw_dot(&mut rgb, p, Rgb([0, 255, 0]));
        }
        if !cli.no_iris {
            for eye in [Eye::Left, Eye::Right] {
                for p in pipeline.all_iris_landmarks(eye) {
                    draw_dot(&mut rgb, p, Rgb([255, 0, 0]));
                }
            }
        }
        rgb.save(output)?;
        println!("Annotated image written to {}", output.display());
    }
    Ok(())
}

fn build_pipeline(cli: &Cli) -> Result<FaceMeshPipeline, Box<dyn std::error::Error>> {
    let config = DetectorConfig {
        min_score: cli.confidence,
        ..DetectorConfig::short_range()
    };
    let post = DetectionPostProcess::new(config, GridAnchorLayout::short_range().generate());

    let detection = OrtEngine::from_file(&cli.models.join(DETECTION_MODEL), DETECTION_INPUT_SIZE)?;
    let landmark = OrtEngine::from_file(&cli.models.join(LANDMARK_MODEL), LANDMARK_INPUT_SIZE)?;
    let mut pipeline = FaceMeshPipeline::new(Box::new(detection), post, Box::new(landmark));

    if !cli.no_iris {
        // Two independent instances: the pipeline runs them concurrently.
        let iris_path = cli.models.join(IRIS_MODEL);
        let left = OrtEngine::from_file(&iris_path, IRIS_INPUT_SIZE)?;
        let right = OrtEngine::from_file(&iris_path, IRIS_INPUT_SIZE)?;
        pipeline = pipeline.with_iris(Box::new(left), Box::new(right));
    }
    Ok(pipeline)
}

/// Convert a decoded RGB image into the BGR frame layout the core expects.
fn frame_from_rgb(rgb: &RgbImage) -> Frame {
    let mut data = Vec::with_capacity((rgb.width() * rgb.height() * 3) as usize);
    for px in rgb.pixels() {
        data.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Frame::new(data, rgb.width(), rgb.height(), 3)
}

fn draw_dot(img: &mut RgbImage, p: Point, color: Rgb<u8>) {
    for dy in -1..=1i32 {
        for dx in -1..=1i32 {
            let x = p.x + dx;
            let y = p.y + dy;
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
