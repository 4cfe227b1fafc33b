//! Selection of the bundled executable for the current host
//!
//! Binaries are laid out as `<root>/<OS>/<family>/<bits>bits/<name>*`.
//! Hosts at or below the low-memory threshold use the 32-bit directory
//! whatever their real word width, and prefer files marked `minimal`.
//! The decision is taken once, when a tool wrapper is built.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::platform::{HostEnvironment, OperatingSystem};
use crate::constants::tools;
use crate::errors::{ToolError, ToolResult};

/// Identifies one external tool in the binary layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Directory grouping the tool's builds
    pub family: &'static str,
    /// Prefix every candidate file name starts with
    pub name: &'static str,
}

impl ToolSpec {
    pub const fn new(family: &'static str, name: &'static str) -> Self {
        Self { family, name }
    }
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Memory classification of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTier {
    /// At or below the threshold: 32-bit directory, `minimal` builds preferred
    Low,
    /// Above the threshold: native width, `minimal` builds avoided
    Standard,
}

impl MemoryTier {
    pub fn classify(total_memory_gb: u64, threshold_gb: u64) -> Self {
        if total_memory_gb <= threshold_gb {
            Self::Low
        } else {
            Self::Standard
        }
    }
}

/// Directory to search for a tool, decided from host facts alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTier {
    pub directory: PathBuf,
    pub bits: u32,
    pub memory: MemoryTier,
}

/// Computes the search directory for a tool
pub fn resolve_tier(
    root: &Path,
    os: &OperatingSystem,
    tool: &ToolSpec,
    architecture_bits: u32,
    total_memory_gb: u64,
    low_memory_threshold_gb: u64,
) -> BinaryTier {
    let memory = MemoryTier::classify(total_memory_gb, low_memory_threshold_gb);
    let bits = match memory {
        MemoryTier::Low => 32,
        MemoryTier::Standard => architecture_bits,
    };

    BinaryTier {
        directory: root
            .join(os.dir_name())
            .join(tool.family)
            .join(format!("{}bits", bits)),
        bits,
        memory,
    }
}

/// Picks one binary among the enumerated candidates
///
/// A lone candidate is always taken. Otherwise the first candidate whose
/// file name matches the tier's `minimal` preference wins, falling back to
/// the first candidate.
pub fn select_candidate(candidates: &[PathBuf], memory: MemoryTier) -> Option<&PathBuf> {
    if candidates.len() == 1 {
        return candidates.first();
    }

    let wants_minimal = memory == MemoryTier::Low;
    candidates
        .iter()
        .find(|path| is_minimal(path) == wants_minimal)
        .or_else(|| candidates.first())
}

fn is_minimal(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(tools::MINIMAL_MARKER))
        .unwrap_or(false)
}

/// The executable chosen for a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDescriptor {
    pub operating_system: OperatingSystem,
    /// Width of the directory the binary was taken from
    pub architecture_bits: u32,
    /// Host memory in whole gigabytes at resolution time
    pub ram_tier_gb: u64,
    pub path: PathBuf,
}

/// Resolves tools against a binary root for a fixed host
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    root: PathBuf,
    host: HostEnvironment,
    low_memory_threshold_gb: u64,
}

impl BinaryResolver {
    pub fn new(root: impl Into<PathBuf>, host: HostEnvironment, low_memory_threshold_gb: u64) -> Self {
        Self {
            root: root.into(),
            host,
            low_memory_threshold_gb,
        }
    }

    /// Resolver for the running host with the default threshold
    pub fn detect(root: impl Into<PathBuf>) -> Self {
        Self::new(
            root,
            HostEnvironment::detect(),
            tools::DEFAULT_LOW_MEMORY_THRESHOLD_GB,
        )
    }

    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    /// Directory that would be searched for `tool`
    pub fn tier(&self, tool: &ToolSpec) -> BinaryTier {
        resolve_tier(
            &self.root,
            &self.host.operating_system,
            tool,
            self.host.architecture_bits,
            self.host.total_memory_gb,
            self.low_memory_threshold_gb,
        )
    }

    /// Chooses the executable for `tool`
    ///
    /// # Errors
    ///
    /// Returns `ToolError::MissingBinary` when the directory is absent or
    /// holds no file starting with the tool name.
    pub fn resolve(&self, tool: &ToolSpec) -> ToolResult<BinaryDescriptor> {
        let tier = self.tier(tool);
        let candidates = enumerate_candidates(&tier.directory, tool.name)?;
        debug!(
            "{} candidates for {} in {}: {:?}",
            candidates.len(),
            tool,
            tier.directory.display(),
            candidates
        );

        let path = select_candidate(&candidates, tier.memory)
            .cloned()
            .ok_or_else(|| ToolError::MissingBinary {
                tool: tool.name.to_string(),
                directory: tier.directory.clone(),
            })?;

        info!("Resolved {} to {}", tool, path.display());
        Ok(BinaryDescriptor {
            operating_system: self.host.operating_system.clone(),
            architecture_bits: tier.bits,
            ram_tier_gb: self.host.total_memory_gb,
            path,
        })
    }
}

/// Files in `directory` whose name starts with `prefix`, sorted by path
fn enumerate_candidates(directory: &Path, prefix: &str) -> ToolResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ToolError::BinaryDirectory {
                directory: directory.to_path_buf(),
                source,
            })
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONVERT: ToolSpec = ToolSpec::new("osmconvert", "osmconvert");

    fn host(bits: u32, ram: u64) -> HostEnvironment {
        HostEnvironment {
            operating_system: OperatingSystem::Linux,
            architecture_bits: bits,
            total_memory_gb: ram,
        }
    }

    fn touch(dir: &Path, names: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        for name in names {
            std::fs::write(dir.join(name), b"#!/bin/sh\n").unwrap();
        }
    }

    #[test]
    fn test_tier_uses_native_width_above_threshold() {
        let tier = resolve_tier(Path::new("bin"), &OperatingSystem::Linux, &CONVERT, 64, 16, 4);
        assert_eq!(tier.directory, PathBuf::from("bin/Linux/osmconvert/64bits"));
        assert_eq!(tier.memory, MemoryTier::Standard);
    }

    #[test]
    fn test_tier_drops_to_32_bits_at_threshold() {
        let tier = resolve_tier(Path::new("bin"), &OperatingSystem::Windows, &CONVERT, 64, 4, 4);
        assert_eq!(tier.directory, PathBuf::from("bin/Windows/osmconvert/32bits"));
        assert_eq!(tier.bits, 32);
        assert_eq!(tier.memory, MemoryTier::Low);
    }

    #[test]
    fn test_select_prefers_minimal_on_low_memory() {
        let candidates = vec![
            PathBuf::from("dir/osmconvert"),
            PathBuf::from("dir/osmconvert-minimal"),
        ];
        assert_eq!(
            select_candidate(&candidates, MemoryTier::Low),
            Some(&PathBuf::from("dir/osmconvert-minimal"))
        );
        assert_eq!(
            select_candidate(&candidates, MemoryTier::Standard),
            Some(&PathBuf::from("dir/osmconvert"))
        );
    }

    #[test]
    fn test_select_falls_back_to_first_candidate() {
        let candidates = vec![
            PathBuf::from("dir/osmconvert-a"),
            PathBuf::from("dir/osmconvert-b"),
        ];
        assert_eq!(
            select_candidate(&candidates, MemoryTier::Low),
            Some(&PathBuf::from("dir/osmconvert-a"))
        );
        assert_eq!(select_candidate(&[], MemoryTier::Low), None);
    }

    #[test]
    fn test_single_candidate_always_selected() {
        let candidates = vec![PathBuf::from("dir/osmconvert-minimal")];
        assert_eq!(
            select_candidate(&candidates, MemoryTier::Standard),
            Some(&PathBuf::from("dir/osmconvert-minimal"))
        );
    }

    #[test]
    fn test_resolve_low_memory_host() {
        let root = TempDir::new().unwrap();
        touch(
            &root.path().join("Linux/osmconvert/32bits"),
            &["osmconvert32", "osmconvert32-minimal"],
        );
        touch(&root.path().join("Linux/osmconvert/64bits"), &["osmconvert64"]);

        let resolver = BinaryResolver::new(root.path(), host(64, 2), 4);
        let binary = resolver.resolve(&CONVERT).unwrap();

        assert!(binary.path.ends_with("32bits/osmconvert32-minimal"));
        assert_eq!(binary.architecture_bits, 32);
        assert_eq!(binary.ram_tier_gb, 2);
    }

    #[test]
    fn test_resolve_standard_host() {
        let root = TempDir::new().unwrap();
        touch(
            &root.path().join("Linux/osmconvert/64bits"),
            &["osmconvert64-minimal", "osmconvert64"],
        );

        let resolver = BinaryResolver::new(root.path(), host(64, 16), 4);
        let binary = resolver.resolve(&CONVERT).unwrap();

        assert!(binary.path.ends_with("64bits/osmconvert64"));
        assert_eq!(binary.architecture_bits, 64);
    }

    #[test]
    fn test_resolve_ignores_other_tools() {
        let root = TempDir::new().unwrap();
        touch(
            &root.path().join("Linux/osmconvert/64bits"),
            &["README.txt", "osmconvert64"],
        );

        let resolver = BinaryResolver::new(root.path(), host(64, 16), 4);
        let binary = resolver.resolve(&CONVERT).unwrap();
        assert!(binary.path.ends_with("osmconvert64"));
    }

    #[test]
    fn test_resolve_missing_binary() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("Linux/osmconvert/64bits")).unwrap();

        let resolver = BinaryResolver::new(root.path(), host(64, 16), 4);
        match resolver.resolve(&CONVERT) {
            Err(ToolError::MissingBinary { tool, directory }) => {
                assert_eq!(tool, "osmconvert");
                assert!(directory.ends_with("Linux/osmconvert/64bits"));
            }
            other => panic!("Expected MissingBinary, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_missing_directory() {
        let root = TempDir::new().unwrap();
        let resolver = BinaryResolver::new(root.path(), host(64, 16), 4);
        assert!(matches!(
            resolver.resolve(&CONVERT),
            Err(ToolError::MissingBinary { .. })
        ));
    }
}
