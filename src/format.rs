use std::{fmt, str::FromStr};

use crate::foundation::error::CountdownError;

/// Fourcc selecting the MPEG-4 Part 2 flavour written to the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecTag {
    Mp4v,
    Xvid,
}

impl CodecTag {
    pub fn fourcc(self) -> &'static str {
        match self {
            Self::Mp4v => "mp4v",
            Self::Xvid => "XVID",
        }
    }
}

/// Container formats the assembler can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Avi,
    Mkv,
    Wmv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Mp4, Self::Avi, Self::Mkv, Self::Wmv];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "mkv",
            Self::Wmv => "wmv",
        }
    }

    pub fn codec_tag(self) -> CodecTag {
        match self {
            Self::Mp4 => CodecTag::Mp4v,
            Self::Avi | Self::Mkv | Self::Wmv => CodecTag::Xvid,
        }
    }

    /// ffmpeg muxer name for `-f`.
    pub fn muxer(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "matroska",
            Self::Wmv => "asf",
        }
    }

    /// Matroska identifies codecs by name, so it takes no fourcc override.
    pub fn stores_fourcc(self) -> bool {
        !matches!(self, Self::Mkv)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Avi => "video/x-msvideo",
            Self::Mkv => "video/x-matroska",
            Self::Wmv => "video/x-ms-wmv",
        }
    }

    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.extension()).collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = CountdownError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == s)
            .ok_or_else(|| CountdownError::UnsupportedFormat {
                format: s.to_string(),
                supported: Self::supported_names(),
            })
    }
}
