#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use world_core::WorldConfig;

const CONFIG_FIXTURE: &str = "test_world_config.json";

static CONFIG_ENV: Once = Once::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Point `WORLD_CONFIG_PATH` at the fixture config for every app built by
/// this test binary.
pub fn ensure_test_config() {
    CONFIG_ENV.call_once(|| {
        let path = fixture_path(CONFIG_FIXTURE);
        assert!(path.exists(), "missing fixture {}", path.display());
        std::env::set_var("WORLD_CONFIG_PATH", &path);
    });
}

/// The fixture config parsed directly, for comparing against what an app
/// picked up from the environment.
pub fn fixture_config() -> Arc<WorldConfig> {
    let path = fixture_path(CONFIG_FIXTURE);
    let config = WorldConfig::from_file(&path)
        .unwrap_or_else(|err| panic!("fixture {} should load: {err}", path.display()));
    Arc::new(config)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
