//! End-to-end tests for the filter-demo binary.

#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;

fn write_assets(dir: &Path, count: u32) {
    for i in 1..=count {
        RgbImage::from_pixel(4 + i, 3, Rgb([i as u8 * 20, 0, 255]))
            .save(dir.join(format!("Image{i}.png")))
            .unwrap();
    }
}

fn demo() -> Command {
    Command::cargo_bin("filter-demo").unwrap()
}

#[test]
fn sequential_run_emits_json_events_in_order() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 3);

    let output = demo()
        .arg("--assets")
        .arg(assets.path())
        .args(["--strategy", "sequential", "--no-simulate", "--json"])
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let indices: Vec<_> = lines
        .iter()
        .filter(|v| v["event"] == "itemCompleted")
        .map(|v| v["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(lines.last().unwrap()["event"], "batchCompleted");
    assert_eq!(lines.last().unwrap()["processed"], 3);
}

#[test]
fn missing_names_are_skipped() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 2);
    std::fs::rename(assets.path().join("Image2.png"), assets.path().join("Other.png")).unwrap();

    demo()
        .arg("--assets")
        .arg(assets.path())
        .args(["--no-simulate", "--json"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"processed\":1"));
}

#[test]
fn processed_images_are_written_to_output() {
    let assets = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 2);

    demo()
        .arg("--assets")
        .arg(assets.path())
        .arg("--output")
        .arg(out.path().join("processed"))
        .args(["--filter", "sepia", "--no-simulate", "--json"])
        .assert()
        .code(0);

    let first = image::open(out.path().join("processed/processed_0.png")).unwrap();
    assert_eq!((first.width(), first.height()), (5, 3));
    assert!(out.path().join("processed/processed_1.png").exists());
}

#[test]
fn simulator_steps_are_reported() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 1);

    demo()
        .arg("--assets")
        .arg(assets.path())
        .args(["--steps", "3", "--step-interval-ms", "1", "--json"])
        .assert()
        .code(0)
        .stdout(
            predicate::str::contains("\"step\":3")
                .and(predicate::str::contains("progressFinished"))
                .and(predicate::str::contains("progressCancelled").not()),
        );
}

#[test]
fn unknown_filter_fails_setup() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 1);

    demo()
        .arg("--assets")
        .arg(assets.path())
        .args(["--filter", "warp", "--no-simulate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown filter 'warp'"));
}

#[test]
fn missing_asset_directory_fails_setup() {
    demo()
        .args(["--assets", "/nonexistent/assets", "--no-simulate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_strategy_is_rejected() {
    demo()
        .args(["--strategy", "serial"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parallel").and(predicate::str::contains("sequential")));
}

#[test]
fn config_file_supplies_defaults() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 2);
    let config = assets.path().join("demo.toml");
    std::fs::write(
        &config,
        format!(
            "[pipeline]\nstrategy = \"sequential\"\nfilter = \"grayscale\"\n\n[simulator]\nenabled = false\n\n[assets]\ndir = {:?}\n",
            assets.path().to_str().unwrap()
        ),
    )
    .unwrap();

    demo()
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("batchCompleted").and(predicate::str::contains("progressStep").not()));
}

#[test]
fn unwritable_output_image_fails_the_run() {
    let assets = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_assets(assets.path(), 2);
    std::fs::create_dir(out.path().join("processed_0.png")).unwrap();

    demo()
        .arg("--assets")
        .arg(assets.path())
        .arg("--output")
        .arg(out.path())
        .args(["--no-simulate", "--json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: cannot save image 0"));

    assert!(out.path().join("processed_1.png").exists());
}
