//! Integration tests for image loading.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use shotcheck_adapters::load_image;

fn write_sample(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(12, 8, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 128]));
    DynamicImage::ImageRgb8(img).save(&path).expect("save sample");
    path
}

#[test]
fn test_load_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path(), "shot.png");

    let info = load_image(&path).expect("should load PNG");
    assert_eq!(info.width, 12);
    assert_eq!(info.height, 8);
    assert!(info.path.ends_with("shot.png"));
}

#[test]
fn test_load_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path(), "shot.jpg");

    let info = load_image(&path).expect("should load JPEG");
    assert_eq!((info.width, info.height), (12, 8));
}

#[test]
fn test_load_uppercase_extension() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_sample(dir.path(), "shot.png");
    let upper = dir.path().join("SHOT.PNG");
    std::fs::rename(&png, &upper).unwrap();

    assert!(load_image(&upper).is_ok());
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not an image").unwrap();

    let err = load_image(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported image type"), "{err}");
}

#[test]
fn test_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"\x89PNG garbage").unwrap();

    let err = load_image(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to decode"), "{err:#}");
}

#[test]
fn test_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_image(dir.path()).is_err());
}
