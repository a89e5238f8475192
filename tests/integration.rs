use assert_fs::prelude::*;
use assert_fs::TempDir;
use bulk_resizer::{
    BatchProcessor, BatchReport, ErrorKind, FileStatus, JobConfig, NamingOptions, OutputFormat,
    OverwritePolicy, ResizeAlgorithm, ResizeMode, Stage, TargetSize,
};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use std::sync::atomic::Ordering;

fn save_rgb(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([200, 90, 40]))
        .save(path)
        .unwrap();
}

fn config(width: u32, height: u32, mode: ResizeMode) -> JobConfig {
    JobConfig {
        target: TargetSize::exact(width, height),
        mode,
        algorithm: ResizeAlgorithm::Nearest,
        optimize_png: false,
        ..Default::default()
    }
}

fn run(config: JobConfig, input: &Path) -> BatchReport {
    BatchProcessor::new(config, 2)
        .unwrap()
        .with_progress(false)
        .process_directory(input)
        .unwrap()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn corrupt_file_does_not_stop_the_batch() {
    let temp = TempDir::new().unwrap();
    save_rgb(temp.child("a.png").path(), 64, 32);
    temp.child("b.jpg").write_binary(b"\xFF\xD8\xFF\xE0 not really a jpeg").unwrap();
    save_rgb(temp.child("c.png").path(), 32, 64);
    save_rgb(temp.child("d.bmp").path(), 40, 40);

    let report = run(config(16, 16, ResizeMode::Fit), temp.path());

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    assert!(report.aborted.is_none());

    let failed = &report.outcomes[1];
    assert_eq!(file_name(&failed.source), "b.jpg");
    assert_eq!(failed.stage, Some(Stage::Decoding));
    assert_eq!(failed.error_kind, Some(ErrorKind::Decode));

    assert!(temp.child("resized/a.png").path().exists());
    assert!(!temp.child("resized/b.jpg").path().exists());
    assert!(temp.child("resized/d.bmp").path().exists());
}

#[test]
fn outcomes_follow_discovery_order() {
    let temp = TempDir::new().unwrap();
    for name in ["zeta.png", "alpha.png", "mid.png", "beta.png"] {
        save_rgb(temp.child(name).path(), 20, 10);
    }

    let report = run(config(10, 10, ResizeMode::Stretch), temp.path());
    let names: Vec<_> = report.outcomes.iter().map(|o| file_name(&o.source)).collect();
    assert_eq!(names, ["alpha.png", "beta.png", "mid.png", "zeta.png"]);
}

#[test]
fn second_run_skips_everything() {
    let temp = TempDir::new().unwrap();
    save_rgb(temp.child("one.png").path(), 30, 30);
    save_rgb(temp.child("two.jpg").path(), 30, 20);

    let first = run(config(12, 12, ResizeMode::Pad), temp.path());
    assert_eq!(first.succeeded(), 2);
    let written = std::fs::read(temp.child("resized/one.png").path()).unwrap();

    let second = run(config(12, 12, ResizeMode::Pad), temp.path());
    assert_eq!(second.succeeded(), 0);
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.total_output_bytes, 0);
    assert!(second
        .outcomes
        .iter()
        .all(|o| o.reason.as_deref() == Some("output already exists")));
    assert_eq!(
        std::fs::read(temp.child("resized/one.png").path()).unwrap(),
        written
    );
    // The output folder itself is never walked.
    assert_eq!(std::fs::read_dir(temp.child("resized").path()).unwrap().count(), 2);
}

#[test]
fn overwrite_policy_replaces_existing_outputs() {
    let temp = TempDir::new().unwrap();
    save_rgb(temp.child("pic.png").path(), 50, 50);
    temp.child("resized").create_dir_all().unwrap();
    temp.child("resized/pic.png").write_binary(b"stale").unwrap();

    let mut cfg = config(25, 25, ResizeMode::Fit);
    cfg.overwrite = OverwritePolicy::Overwrite;
    let report = run(cfg, temp.path());

    assert_eq!(report.succeeded(), 1);
    let out = image::open(temp.child("resized/pic.png").path()).unwrap();
    assert_eq!(out.dimensions(), (25, 25));
}

#[test]
fn recursive_walk_mirrors_sub_folders() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    save_rgb(temp.child("top.png").path(), 40, 20);
    temp.child("trip/day1").create_dir_all().unwrap();
    save_rgb(temp.child("trip/day1/beach.png").path(), 40, 20);

    let mut flat = config(20, 20, ResizeMode::Fit);
    flat.output_folder = Some(out.path().to_path_buf());
    let report = run(flat.clone(), temp.path());
    assert_eq!(report.outcomes.len(), 1);

    let mut deep = flat;
    deep.recursive = true;
    deep.overwrite = OverwritePolicy::Overwrite;
    let report = run(deep, temp.path());

    assert_eq!(report.succeeded(), 2);
    assert!(out.child("top.png").path().exists());
    assert!(out.child("trip/day1/beach.png").path().exists());
}

#[test]
fn sequential_names_follow_sorted_order() {
    let temp = TempDir::new().unwrap();
    for name in ["c.png", "a.png", "b.png"] {
        save_rgb(temp.child(name).path(), 10, 10);
    }
    temp.child("notes.txt").write_str("not an image").unwrap();

    let mut cfg = config(5, 5, ResizeMode::Fit);
    cfg.output_format = Some(OutputFormat::Jpeg);
    cfg.naming = NamingOptions {
        prefix: "img".to_string(),
        keep_original_name: false,
        sequential: true,
        ..Default::default()
    };
    let report = run(cfg, temp.path());

    let pairs: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| (file_name(&o.source), file_name(o.output.as_ref().unwrap())))
        .collect();
    assert_eq!(
        pairs,
        [
            ("a.png".to_string(), "img_0001.jpg".to_string()),
            ("b.png".to_string(), "img_0002.jpg".to_string()),
            ("c.png".to_string(), "img_0003.jpg".to_string()),
        ]
    );
}

#[test]
fn non_image_and_empty_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    temp.child("readme.md").write_str("# hi").unwrap();
    temp.child("empty.png").touch().unwrap();
    save_rgb(temp.child("ok.bmp").path(), 8, 8);

    let report = run(config(4, 4, ResizeMode::Fit), temp.path());

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 0);
}

#[test]
fn converts_transparent_png_to_jpeg() {
    let temp = TempDir::new().unwrap();
    RgbaImage::from_pixel(30, 10, Rgba([0, 0, 255, 0]))
        .save(temp.child("logo.png").path())
        .unwrap();

    let mut cfg = config(30, 30, ResizeMode::Pad);
    cfg.output_format = Some(OutputFormat::Jpeg);
    let report = run(cfg, temp.path());
    assert_eq!(report.succeeded(), 1);

    let bytes = std::fs::read(temp.child("resized/logo.jpg").path()).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (30, 30));
}

#[test]
fn fill_crops_to_exact_target() {
    let temp = TempDir::new().unwrap();
    // Same aspect as 1920x1080, scaled down.
    let mut img = RgbImage::from_pixel(384, 216, Rgb([0, 0, 0]));
    for y in 0..216 {
        img.put_pixel(0, y, Rgb([255, 0, 0]));
    }
    DynamicImage::ImageRgb8(img)
        .save(temp.child("wide.png").path())
        .unwrap();

    let report = run(config(160, 160, ResizeMode::Fill), temp.path());
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, FileStatus::Success);
    assert_eq!(
        outcome.output_dimensions.map(|d| (d.width, d.height)),
        Some((160, 160))
    );

    // The left edge column was cropped away.
    let out = image::open(temp.child("resized/wide.png").path()).unwrap().to_rgb8();
    assert_eq!(out.get_pixel(0, 80), &Rgb([0, 0, 0]));
}

#[test]
fn invalid_config_is_fatal() {
    let cfg = JobConfig {
        target: TargetSize::new(Some(0), Some(10)),
        ..Default::default()
    };
    let err = BatchProcessor::new(cfg, 0).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn missing_input_folder_is_fatal() {
    let temp = TempDir::new().unwrap();
    let processor = BatchProcessor::new(JobConfig::default(), 1)
        .unwrap()
        .with_progress(false);
    assert!(processor
        .process_directory(&temp.path().join("nope"))
        .is_err());
}

#[test]
fn cancelled_batch_attempts_nothing() {
    let temp = TempDir::new().unwrap();
    save_rgb(temp.child("a.png").path(), 10, 10);
    save_rgb(temp.child("b.png").path(), 10, 10);

    let processor = BatchProcessor::new(config(5, 5, ResizeMode::Fit), 1)
        .unwrap()
        .with_progress(false);
    processor.cancel_handle().store(true, Ordering::SeqCst);
    let report = processor.process_directory(temp.path()).unwrap();

    assert_eq!(report.skipped(), 2);
    assert!(report.aborted.is_some());
    assert!(!temp.child("resized/a.png").path().exists());
}

#[cfg(unix)]
#[test]
fn symlinked_images_are_processed() {
    let temp = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    save_rgb(elsewhere.child("real.png").path(), 20, 20);
    std::os::unix::fs::symlink(
        elsewhere.child("real.png").path(),
        temp.child("linked.png").path(),
    )
    .unwrap();
    std::os::unix::fs::symlink(
        elsewhere.child("missing.png").path(),
        temp.child("dangling.png").path(),
    )
    .unwrap();

    let report = run(config(10, 10, ResizeMode::Fit), temp.path());

    assert_eq!(report.outcomes.len(), 2);
    let dangling = &report.outcomes[0];
    assert_eq!(file_name(&dangling.source), "dangling.png");
    assert_eq!(dangling.status, FileStatus::Skipped);
    assert_eq!(report.outcomes[1].status, FileStatus::Success);
    assert!(temp.child("resized/linked.png").path().exists());
}
