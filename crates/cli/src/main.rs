#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use human_analytics_core::affect::{LexiconSentimentScorer, NullFaceLandmarker};
use human_analytics_core::config::{
    parse_endpoint, resolve_api_key, resolve_string_with_default, ApiKey, AppConfig, Env,
    SpeakerLabel, StageTimeout, StdEnv, SttConfig, TtsConfig, DEFAULT_FEEDBACK_LANG,
    DEFAULT_HISTORY_FILE, DEFAULT_SPEAKER, DEFAULT_STAGE_TIMEOUT_SECS, DEFAULT_STT_API_KEY,
    DEFAULT_STT_ENDPOINT, DEFAULT_TTS_ENDPOINT, ENV_STT_API_KEY, ENV_STT_ENDPOINT,
    ENV_TTS_ENDPOINT,
};
use human_analytics_core::demux::FfmpegDemuxer;
use human_analytics_core::media::{MediaKind, MediaUpload};
use human_analytics_core::pipeline::{Pipeline, PipelineConfig};
use human_analytics_core::transcribe::GoogleSpeechTranscriber;
use human_analytics_core::tts::GoogleTtsClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "human-analytics")]
#[command(about = "Speech feedback for one uploaded clip (transcribe->score->compose)")]
struct Args {
    /// Media file to analyze (wav/mp3/mp4/mov)
    #[arg(long)]
    file: PathBuf,

    #[arg(long, default_value = DEFAULT_SPEAKER)]
    speaker: String,

    /// Pin phrase selection for a reproducible report
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "human_analytics_report.txt")]
    report_out: PathBuf,

    #[arg(long, default_value = "voice_feedback.mp3")]
    voice_out: PathBuf,

    #[arg(long, default_value_t = false)]
    no_voice: bool,

    #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
    history: PathBuf,

    #[arg(long, default_value_t = false)]
    no_history: bool,

    #[arg(long)]
    stt_api_key: Option<String>,

    #[arg(long)]
    stt_endpoint: Option<String>,

    #[arg(long)]
    tts_endpoint: Option<String>,

    #[arg(long, default_value = DEFAULT_FEEDBACK_LANG)]
    tts_lang: String,

    #[arg(long, default_value_t = DEFAULT_STAGE_TIMEOUT_SECS)]
    stage_timeout_secs: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(&args, &env)?;

    tracing::info!(
        speaker = %cfg.speaker.as_str(),
        timeout_secs = cfg.stage_timeout.per_call_secs,
        voice = cfg.synthesize_voice,
        "config loaded"
    );

    // The input gate: a missing or empty file is rejected here, before the
    // pipeline is built.
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let kind = MediaKind::from_path(&args.file)
        .ok_or_else(|| anyhow::anyhow!("unsupported media type: {}", args.file.display()))?;
    let upload = MediaUpload::new(bytes.into(), kind)
        .with_context(|| format!("rejecting {}", args.file.display()))?;

    run_analysis(args, cfg, upload).await
}

async fn run_analysis(args: Args, cfg: AppConfig, upload: MediaUpload) -> anyhow::Result<()> {
    let tts = if cfg.synthesize_voice {
        Some(GoogleTtsClient::new(&cfg.tts))
    } else {
        None
    };

    let pipeline = Pipeline {
        demuxer: FfmpegDemuxer::default(),
        transcriber: GoogleSpeechTranscriber::new(&cfg.stt),
        sentiment: LexiconSentimentScorer::new(),
        landmarker: None::<NullFaceLandmarker>,
        tts,
        config: PipelineConfig::from_app(&cfg),
    };

    let outcome = pipeline.analyze(upload).await;

    tokio::fs::write(&args.report_out, outcome.report.render_text())
        .await
        .with_context(|| format!("writing report to {}", args.report_out.display()))?;
    tracing::info!(path = %args.report_out.display(), "report written");

    if let Some(voice) = outcome.voice {
        tokio::fs::write(&args.voice_out, &voice.mp3)
            .await
            .with_context(|| format!("writing voice clip to {}", args.voice_out.display()))?;
        tracing::info!(path = %args.voice_out.display(), "voice feedback written");
    }

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: &Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let speaker = SpeakerLabel::new(args.speaker.clone())?;
    let stage_timeout = StageTimeout::new(args.stage_timeout_secs)?;

    let api_key = match resolve_api_key(args.stt_api_key.clone(), ENV_STT_API_KEY, env)? {
        Some(key) => key,
        None => ApiKey::new(DEFAULT_STT_API_KEY)?,
    };
    let stt_endpoint = parse_endpoint(&resolve_string_with_default(
        args.stt_endpoint.clone(),
        ENV_STT_ENDPOINT,
        env,
        DEFAULT_STT_ENDPOINT,
    ))?;
    let tts_endpoint = parse_endpoint(&resolve_string_with_default(
        args.tts_endpoint.clone(),
        ENV_TTS_ENDPOINT,
        env,
        DEFAULT_TTS_ENDPOINT,
    ))?;

    Ok(AppConfig {
        speaker,
        seed: args.seed,
        stage_timeout,
        stt: SttConfig {
            endpoint: stt_endpoint,
            api_key,
        },
        tts: TtsConfig {
            endpoint: tts_endpoint,
            lang: args.tts_lang.clone(),
        },
        synthesize_voice: !args.no_voice,
        history_path: if args.no_history {
            None
        } else {
            Some(args.history.clone())
        },
        scratch_dir: std::env::temp_dir(),
    })
}
