//! Cassette replay integration tests, zero network I/O.
//!
//! All tests set `PFP_FRAMER_REPLAY` to a cassette file so that avatar
//! downloads are served from recorded responses.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use base64::Engine;
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use predicates::prelude::*;

const AVATAR_URL: &str = "https://cdn.discordapp.com/avatars/99/abc.png";

fn cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pfp-framer");
    cmd.env("PFP_FRAMER_CONFIG", "/nonexistent/pfp-framer/config.toml")
        .env_remove("PFP_FRAMER_REC");
    cmd
}

/// Fresh scratch directory holding a 200x200 frame.
fn scratch(name: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let frame = dir.join("frame.png");
    RgbaImage::from_fn(200, 200, |x, y| {
        if x < 10 || y < 10 || x >= 190 || y >= 190 {
            Rgba([40, 40, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
    .save_with_format(&frame, ImageFormat::Png)
    .unwrap();
    (dir, frame)
}

/// Write a single-fetch cassette replaying the given response.
fn cassette(dir: &Path, status: u16, content_type: &str, body: &[u8]) -> PathBuf {
    let b64 = base64::engine::general_purpose::STANDARD.encode(body);
    let content = format!(
        "name: replay-test\nrecorded_at: \"2026-02-01T00:00:00Z\"\ncommit: test\ninteractions:\n  - seq: 0\n    port: avatar_source\n    method: fetch\n    input:\n      url: {AVATAR_URL}\n    output:\n      Ok:\n        status: {status}\n        content_type: {content_type}\n        body: \"{b64}\"\n"
    );
    let path = dir.join("avatar.cassette.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

fn png_avatar() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    RgbaImage::from_pixel(64, 64, Rgba([200, 20, 20, 255]))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn frame_cmd(cassette: &Path, frame: &Path, out: &Path) -> Command {
    let mut cmd = cmd();
    cmd.env("PFP_FRAMER_REPLAY", cassette)
        .args(["frame", AVATAR_URL, "--frame"])
        .arg(frame)
        .arg("--output")
        .arg(out);
    cmd
}

#[test]
fn replayed_avatar_is_framed() {
    let (dir, frame) = scratch("pfp_framer_replay_ok");
    let cassette = cassette(&dir, 200, "image/png", &png_avatar());
    let out = dir.join("pfp_with_frame.png");

    frame_cmd(&cassette, &frame, &out).assert().success().stderr(predicate::str::contains("Saved:"));

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    let framed = image::load_from_memory(&data).unwrap();
    assert_eq!(framed.dimensions(), (200, 200));
    assert_eq!(framed.get_pixel(100, 100), Rgba([200, 20, 20, 255]));
    assert_eq!(framed.get_pixel(0, 0), Rgba([40, 40, 40, 255]));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn not_found_reports_fetch_failure() {
    let (dir, frame) = scratch("pfp_framer_replay_404");
    let cassette = cassette(&dir, 404, "text/plain", b"404: Not Found");
    let out = dir.join("pfp_with_frame.png");

    frame_cmd(&cassette, &frame, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch image: HTTP 404"));

    assert!(!out.exists(), "No file should be produced");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn html_reports_unsupported_format() {
    let (dir, frame) = scratch("pfp_framer_replay_html");
    // A PNG body under an HTML content type is still rejected before decoding.
    let cassette = cassette(&dir, 200, "text/html", &png_avatar());
    let out = dir.join("pfp_with_frame.png");

    frame_cmd(&cassette, &frame, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("content type text/html is not an image"));

    assert!(!out.exists(), "No file should be produced");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_image_reports_processing_error() {
    let (dir, frame) = scratch("pfp_framer_replay_corrupt");
    let cassette = cassette(&dir, 200, "image/png", b"\x89PNG\r\n\x1a\ntruncated");
    let out = dir.join("pfp_with_frame.png");

    frame_cmd(&cassette, &frame, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error processing image"));

    assert!(!out.exists(), "No file should be produced");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_cassette_is_config_error() {
    let (dir, frame) = scratch("pfp_framer_replay_missing");
    let out = dir.join("pfp_with_frame.png");

    frame_cmd(&dir.join("nope.cassette.yaml"), &frame, &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load cassette"));

    let _ = std::fs::remove_dir_all(&dir);
}
