use std::path::PathBuf;

use anyhow::Context;
use vkbind_gen::{generate_dir, write_bindings, GenConfig};

fn main() -> anyhow::Result<()> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR not set")?);
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR not set")?);

    let descriptors = manifest_dir.join("descriptors");
    let config_path = manifest_dir.join("bindings.toml");
    println!("cargo:rerun-if-changed={}", descriptors.display());
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config = GenConfig::from_optional_path(&config_path)?;
    let source = generate_dir(&descriptors, &config)?;

    write_bindings(&source, out_dir.join("bindings.rs"))?;
    Ok(())
}
