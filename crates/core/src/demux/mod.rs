use bytes::Bytes;
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

/// Frame-sampling ceiling for the expressiveness sweep.
pub const MAX_SAMPLED_FRAMES: usize = 150;
/// Sampling rate used when pulling frames out of a clip.
pub const SAMPLE_FPS: u32 = 2;

pub const DEFAULT_FRAME_WIDTH: u32 = 320;
pub const DEFAULT_FRAME_HEIGHT: u32 = 240;

/// One sampled video frame as a packed RGB24 raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub rgb: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum DemuxError {
    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("invalid frame data: {0}")]
    InvalidFrameData(String),
}

pub type Result<T> = std::result::Result<T, DemuxError>;

/// External collaborator that splits a media file into the streams the
/// pipeline consumes: a normalized audio track and a bounded frame sample.
pub trait Demuxer: Send + Sync {
    /// Writes the clip's audio track to `audio_out` as 16 kHz mono s16le WAV.
    fn extract_audio(&self, media: PathBuf, audio_out: PathBuf) -> BoxFuture<'_, Result<()>>;

    fn sample_frames(&self, video: PathBuf, max_frames: usize)
        -> BoxFuture<'_, Result<Vec<VideoFrame>>>;
}

#[derive(Clone, Debug)]
pub struct FfmpegDemuxer {
    frame_width: u32,
    frame_height: u32,
}

impl Default for FfmpegDemuxer {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl FfmpegDemuxer {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        download::auto_download().map_err(|e| DemuxError::FfmpegUnavailable(e.to_string()))
    }

    fn frames_from_raw(raw: &[u8], width: u32, height: u32) -> Result<Vec<VideoFrame>> {
        let frame_size = width as usize * height as usize * 3;
        if frame_size == 0 {
            return Err(DemuxError::InvalidFrameData("zero frame size".to_owned()));
        }
        if !raw.len().is_multiple_of(frame_size) {
            return Err(DemuxError::InvalidFrameData(format!(
                "rgb24 byte length must be a multiple of {frame_size}, got {}",
                raw.len()
            )));
        }
        let raw = Bytes::copy_from_slice(raw);
        Ok(raw
            .chunks(frame_size)
            .enumerate()
            .map(|(index, chunk)| VideoFrame {
                index,
                width,
                height,
                rgb: raw.slice_ref(chunk),
            })
            .collect())
    }

    async fn run_ffmpeg(args: Vec<String>) -> Result<Vec<u8>> {
        let output = tokio::process::Command::new(ffmpeg_path())
            .args(&args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .output()
            .await
            .map_err(|e| DemuxError::FfmpegFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(DemuxError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr}",
                output.status.code()
            )));
        }
        Ok(output.stdout)
    }
}

impl Demuxer for FfmpegDemuxer {
    fn extract_audio(&self, media: PathBuf, audio_out: PathBuf) -> BoxFuture<'_, Result<()>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            let args = vec![
                "-y".to_owned(),
                "-hide_banner".to_owned(),
                "-nostdin".to_owned(),
                "-loglevel".to_owned(),
                "error".to_owned(),
                "-i".to_owned(),
                media.display().to_string(),
                "-vn".to_owned(),
                "-sn".to_owned(),
                "-dn".to_owned(),
                "-ac".to_owned(),
                "1".to_owned(),
                "-ar".to_owned(),
                "16000".to_owned(),
                "-acodec".to_owned(),
                "pcm_s16le".to_owned(),
                audio_out.display().to_string(),
            ];
            Self::run_ffmpeg(args).await?;
            Ok(())
        }
        .boxed()
    }

    fn sample_frames(
        &self,
        video: PathBuf,
        max_frames: usize,
    ) -> BoxFuture<'_, Result<Vec<VideoFrame>>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            let args = vec![
                "-hide_banner".to_owned(),
                "-nostdin".to_owned(),
                "-loglevel".to_owned(),
                "error".to_owned(),
                "-i".to_owned(),
                video.display().to_string(),
                "-vf".to_owned(),
                format!(
                    "fps={SAMPLE_FPS},scale={}:{}",
                    this.frame_width, this.frame_height
                ),
                "-frames:v".to_owned(),
                max_frames.to_string(),
                "-f".to_owned(),
                "rawvideo".to_owned(),
                "-pix_fmt".to_owned(),
                "rgb24".to_owned(),
                "pipe:1".to_owned(),
            ];
            let raw = Self::run_ffmpeg(args).await?;
            Self::frames_from_raw(&raw, this.frame_width, this.frame_height)
        }
        .boxed()
    }
}
