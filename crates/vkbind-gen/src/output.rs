use std::fs;
use std::path::Path;

use anyhow::Context;
use vkbind_desc::DescriptorSet;

use crate::config::GenConfig;
use crate::emit::generate;

/// Loads every descriptor in `descriptor_dir` and generates bindings.
pub fn generate_dir(descriptor_dir: impl AsRef<Path>, config: &GenConfig) -> anyhow::Result<String> {
    let dir = descriptor_dir.as_ref();
    let set = DescriptorSet::load_dir(dir)
        .with_context(|| format!("failed to load descriptors from {}", dir.display()))?;
    anyhow::ensure!(!set.is_empty(), "no descriptors found in {}", dir.display());

    let source = generate(&set, config).context("invalid descriptor set")?;
    log::info!("generated bindings for {} extensions ({} bytes)", set.len(), source.len());
    Ok(source)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held exactly this source and was left untouched.
    Unchanged,
}

/// `true` when `output` exists and holds exactly `source`.
pub fn is_up_to_date(source: &str, output: impl AsRef<Path>) -> anyhow::Result<bool> {
    let output = output.as_ref();
    if !output.exists() {
        return Ok(false);
    }
    let current = fs::read_to_string(output).with_context(|| format!("failed to read {}", output.display()))?;
    Ok(current == source)
}

/// Writes `source` to `output` unless it is already there, creating parent
/// directories as needed.
pub fn write_bindings(source: &str, output: impl AsRef<Path>) -> anyhow::Result<WriteOutcome> {
    let output = output.as_ref();
    if is_up_to_date(source, output)? {
        return Ok(WriteOutcome::Unchanged);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(output, source).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(WriteOutcome::Written)
}
