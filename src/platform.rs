//! Platform detection for selecting the correct release asset.

use std::fmt;

use crate::error::{Error, Result};

/// Operating system token as it appears in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
}

impl Platform {
    pub fn token(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
        }
    }
}

/// CPU architecture token as it appears in release asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
    Arm,
}

impl Arch {
    pub fn token(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }
}

/// The OS and CPU the process is running on, as reported by the toolchain
/// (`std::env::consts` naming).
///
/// Kept separate from [`PlatformIdentifier`] so selection can be exercised
/// for any platform in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub os: String,
    pub arch: String,
}

impl Environment {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_owned(),
            arch: arch.to_owned(),
        }
    }

    /// The environment of the running process.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::current()
    }
}

/// Platform/arch pair used to match asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformIdentifier {
    pub platform: Platform,
    pub arch: Arch,
}

impl PlatformIdentifier {
    /// Map an [`Environment`] onto the tokens release assets are published under.
    ///
    /// Windows and macOS builds are always matched as `amd64`; only Linux
    /// distinguishes ARM variants.
    pub fn detect(env: &Environment) -> Result<Self> {
        let (platform, arch) = match env.os.as_str() {
            "windows" => (Platform::Windows, Arch::Amd64),
            "linux" => match env.arch.as_str() {
                "aarch64" => (Platform::Linux, Arch::Arm64),
                "arm" => (Platform::Linux, Arch::Arm),
                _ => (Platform::Linux, Arch::Amd64),
            },
            "macos" => (Platform::Darwin, Arch::Amd64),
            _ => {
                return Err(Error::UnsupportedPlatform {
                    os: env.os.clone(),
                    arch: env.arch.clone(),
                })
            }
        };
        Ok(Self { platform, arch })
    }
}

impl fmt::Display for PlatformIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform.token(), self.arch.token())
    }
}
