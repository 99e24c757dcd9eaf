use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

impl Compression {
    pub const ALL: [Compression; 5] = [
        Compression::Zip,
        Compression::Tar,
        Compression::TarGz,
        Compression::TarBz2,
        Compression::TarXz,
    ];

    /// The selector a user types or picks, e.g. `TAR.GZ`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::Tar => "TAR",
            Self::TarGz => "TAR.GZ",
            Self::TarBz2 => "TAR.BZ2",
            Self::TarXz => "XZTAR",
        }
    }

    /// The archive-creation method identifier behind the selector.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "gztar",
            Self::TarBz2 => "bztar",
            Self::TarXz => "xztar",
        }
    }

    /// The extension of the written file, without a leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
        }
    }

    pub fn labels() -> String {
        Self::ALL
            .iter()
            .map(|compression| compression.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZIP" => Ok(Self::Zip),
            "TAR" => Ok(Self::Tar),
            "TAR.GZ" => Ok(Self::TarGz),
            "TAR.BZ2" => Ok(Self::TarBz2),
            "XZTAR" => Ok(Self::TarXz),
            "" => Err(Error::InvalidFormat(String::from("no format selected"))),
            other => Err(Error::InvalidFormat(format!(
                "'{}' (expected one of: {})",
                other,
                Self::labels()
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
