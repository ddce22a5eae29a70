use crate::error::InstallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Darwin,
    Linux,
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
            Os::Windows => "windows",
        }
    }

    fn parse(value: &str) -> Result<Self, InstallError> {
        match value {
            "darwin" | "macos" => Ok(Os::Darwin),
            "linux" => Ok(Os::Linux),
            "windows" | "win32" => Ok(Os::Windows),
            other => Err(InstallError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }

    fn parse(value: &str) -> Result<Self, InstallError> {
        match value {
            "x86_64" | "x64" | "amd64" => Ok(Arch::Amd64),
            "aarch64" | "arm64" => Ok(Arch::Arm64),
            other => Err(InstallError::UnsupportedArch {
                arch: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn current() -> Result<Self, InstallError> {
        Self::detect(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps host OS and CPU identifiers onto the release naming scheme.
    /// The OS is checked first, so an unknown OS wins over an unknown arch.
    pub fn detect(os: &str, arch: &str) -> Result<Self, InstallError> {
        let os = Os::parse(os)?;
        let arch = Arch::parse(arch)?;
        Ok(Self { os, arch })
    }

    /// `<binary>-<platform>-<arch>`, with `.exe` appended on windows.
    pub fn asset_name(&self, binary: &str) -> String {
        let ext = if self.os == Os::Windows { ".exe" } else { "" };
        format!("{binary}-{}-{}{ext}", self.os.as_str(), self.arch.as_str())
    }

    /// File name of the installed executable.
    pub fn executable_name(&self, binary: &str) -> String {
        if self.os == Os::Windows {
            format!("{binary}.exe")
        } else {
            binary.to_string()
        }
    }
}
