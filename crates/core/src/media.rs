use bytes::Bytes;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Wav,
    Mp3,
    Mp4,
    Mov,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "mp4" => Some(Self::Mp4),
            "mov" => Some(Self::Mov),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov)
    }
}

/// One user-submitted clip. Construction is the input gate: an empty upload
/// is the only fatal condition and is rejected here, before any pipeline
/// stage runs.
#[derive(Clone, Debug)]
pub struct MediaUpload {
    pub bytes: Bytes,
    pub kind: MediaKind,
}

impl MediaUpload {
    pub fn new(bytes: Bytes, kind: MediaKind) -> Result<Self, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::EmptyInput);
        }
        Ok(Self { bytes, kind })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("no input media provided")]
    EmptyInput,

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("scratch file io: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-scoped temporary file with a collision-free name. Removed on drop
/// so every exit path, including early stage failure, releases it.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub async fn create(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self, MediaError> {
        let path = dir.join(format!("ha-{}.{extension}", Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        Ok(Self { path })
    }

    /// Reserves a unique path without writing anything, for stages whose
    /// external process creates the file itself.
    pub fn reserve(dir: &Path, extension: &str) -> Self {
        Self {
            path: dir.join(format!("ha-{}.{extension}", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Header fields recovered from a RIFF/WAVE buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub byte_rate: u32,
    data_start: usize,
    data_len: usize,
}

impl WavInfo {
    pub fn duration(&self) -> Duration {
        if self.byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.data_len as f64 / f64::from(self.byte_rate))
    }

    /// The raw PCM payload, clamped to the buffer for truncated files.
    pub fn pcm<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let end = (self.data_start + self.data_len).min(bytes.len());
        let start = self.data_start.min(end);
        &bytes[start..end]
    }
}

/// Walks the RIFF chunk list for the fmt and data chunks. Returns None for
/// anything that is not a plausible WAVE buffer.
pub fn parse_wav(bytes: &[u8]) -> Option<WavInfo> {
    fn u32_at(bytes: &[u8], at: usize) -> Option<u32> {
        bytes
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut sample_rate: Option<u32> = None;
    let mut byte_rate: Option<u32> = None;
    let mut data: Option<(usize, usize)> = None;
    let mut at = 12usize;
    while at + 8 <= bytes.len() {
        let id = &bytes[at..at + 4];
        let size = u32_at(bytes, at + 4)? as usize;
        match id {
            b"fmt " => {
                // fmt payload: format, channels, sample rate, byte rate, ...
                sample_rate = u32_at(bytes, at + 8 + 4);
                byte_rate = u32_at(bytes, at + 8 + 8);
            }
            b"data" => {
                data = Some((at + 8, size));
            }
            _ => {}
        }
        // chunks are word-aligned
        at = at + 8 + size + (size & 1);
    }

    let (data_start, data_len) = data?;
    Some(WavInfo {
        sample_rate: sample_rate?,
        byte_rate: byte_rate?,
        data_start,
        data_len,
    })
}

/// Clip duration for the words-per-minute computation. Anything malformed
/// yields zero, which downstream treats as "duration unknown" (no pace
/// judgement).
pub fn wav_duration(bytes: &[u8]) -> Duration {
    parse_wav(bytes).map(|info| info.duration()).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
pub(crate) fn make_wav(byte_rate: u32, data_len: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // pcm
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&16_000u32.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend(std::iter::repeat(0u8).take(data_len as usize));
    out
}
