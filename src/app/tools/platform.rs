//! Host environment detection for binary selection

use std::fmt;

use sysinfo::System;

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Operating systems with a bundled binary directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingSystem {
    Linux,
    Windows,
    Darwin,
    Other(String),
}

impl OperatingSystem {
    /// Operating system of the running process
    pub fn current() -> Self {
        Self::from_consts(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value
    pub fn from_consts(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            "macos" => Self::Darwin,
            other => Self::Other(other.to_string()),
        }
    }

    /// Directory name used in the bundled binary layout
    pub fn dir_name(&self) -> &str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Darwin => "Darwin",
            Self::Other(name) => name,
        }
    }

    /// Bundled executables are not on the search path here and need an
    /// explicit relative prefix
    pub fn is_linux_family(&self) -> bool {
        matches!(self, Self::Linux)
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Facts about the host that drive binary selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub operating_system: OperatingSystem,
    /// Pointer width of this process (32 or 64)
    pub architecture_bits: u32,
    /// Total physical memory, rounded up to whole gigabytes
    pub total_memory_gb: u64,
}

impl HostEnvironment {
    /// Inspects the running host
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();

        let host = Self {
            operating_system: OperatingSystem::current(),
            architecture_bits: usize::BITS,
            total_memory_gb: bytes_to_gb_ceil(system.total_memory()),
        };
        tracing::debug!(
            "Host: {} {}bits {}GB RAM",
            host.operating_system,
            host.architecture_bits,
            host.total_memory_gb
        );
        host
    }
}

/// Rounds a byte count up to whole gigabytes
pub fn bytes_to_gb_ceil(bytes: u64) -> u64 {
    bytes.div_ceil(BYTES_PER_GB)
}
