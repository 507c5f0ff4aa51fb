//! Build script for hygrochron-sim
//!
//! Validates device.toml at compile time so a broken embedded
//! configuration fails the build instead of the first boot.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=device.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let path = Path::new("device.toml");
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => panic!("device.toml could not be read: {}", e),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!("Invalid TOML syntax in device.toml:\n{}", e),
    };

    let ssid = config
        .get("device")
        .and_then(|d| d.get("wifi"))
        .and_then(|w| w.get("ssid"))
        .and_then(|s| s.as_str());
    match ssid {
        Some(ssid) if !ssid.is_empty() => {}
        _ => panic!("device.toml: [device.wifi] ssid is required"),
    }

    if config.get("simulation").is_none() {
        println!("cargo:warning=device.toml has no [simulation] table, defaults will be used");
    }
}
