use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use hark::dispatch::{Collaborators, Dispatcher};
use hark::services::{BuiltinJokes, SystemClock, WikipediaClient, YouTubePlayer};
use hark::session::Session;
use hark::voice::{
    AudioPlayback, DEFAULT_SAMPLE_RATE, KeyboardListener, Microphone, MicrophoneListener,
    SAMPLE_RATE, Speaker, TextSpeaker, rms, speaker_from_config,
};
use hark::{Config, IntentResolver};

/// How long to wait for a YouTube search page
const MEDIA_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Hark - hands-free voice commands
#[derive(Parser)]
#[command(name = "hark", version, about)]
struct Cli {
    /// Wake word stripped from the start of commands
    #[arg(short, long, env = "HARK_WAKE_WORD")]
    wake_word: Option<String>,

    /// Read commands from stdin instead of the microphone
    #[arg(short, long)]
    keyboard: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the intent a command resolves to
    Resolve {
        /// Command text, as it would be transcribed
        text: String,
    },
    /// Speak text with the configured voice
    Say {
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hark=info",
        1 => "info,hark=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(wake_word) = cli.wake_word {
        config.wake_word = wake_word;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Resolve { text } => {
                resolve(&config, &text);
                Ok(())
            }
            Command::Say { text } => say(&config, &text).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::Setup => hark::setup::run_setup(),
        };
    }

    tracing::info!(
        wake_word = %config.wake_word,
        keyboard = cli.keyboard,
        "starting hark"
    );
    tracing::debug!(
        stt = ?config.voice.stt_provider,
        tts = ?config.voice.tts_provider,
        language = %config.encyclopedia.language,
        "loaded configuration"
    );

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    // Ctrl-C is only observed between iterations
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            let _ = signal_tx.send(()).await;
        }
    });

    let resolver = IntentResolver::new(&config.wake_word);
    let dispatcher = Dispatcher::new(collaborators(&config)?, config.encyclopedia.sentences);

    if cli.keyboard {
        let listener = KeyboardListener::stdin(shutdown_tx)?;
        Session::new(listener, resolver, dispatcher, config.listen)
            .run(&mut shutdown_rx)
            .await;
    } else {
        let listener = MicrophoneListener::new(&config)?;
        Session::new(listener, resolver, dispatcher, config.listen)
            .run(&mut shutdown_rx)
            .await;
    }

    tracing::info!("hark stopped");
    Ok(())
}

/// Build the production collaborators
fn collaborators(config: &Config) -> anyhow::Result<Collaborators> {
    Ok(Collaborators {
        speaker: speaker(config),
        media: Box::new(YouTubePlayer::new(MEDIA_LOOKUP_TIMEOUT)?),
        encyclopedia: Box::new(WikipediaClient::new(&config.encyclopedia)?),
        jokes: Box::new(BuiltinJokes::default()),
        clock: Box::new(SystemClock),
    })
}

/// Configured speaker, or plain text output if it cannot be set up
fn speaker(config: &Config) -> Box<dyn Speaker> {
    speaker_from_config(config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "speech output unavailable, printing responses only");
        Box::new(TextSpeaker)
    })
}

fn resolve(config: &Config, text: &str) {
    let resolver = IntentResolver::new(&config.wake_word);
    println!("{}", resolver.resolve(&text.to_lowercase()));
}

#[allow(clippy::future_not_send)]
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    speaker_from_config(config)?.say(text).await?;
    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let microphone = Microphone::open()?;

    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = microphone.drain();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    drop(microphone);

    println!("\n---");
    println!("If the meter moved while you spoke, the microphone is working.");
    println!("Commands need speech louder than the ambient level shown while silent.");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    let samples: Vec<f32> = (0..DEFAULT_SAMPLE_RATE * 2)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / DEFAULT_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples...", samples.len());
    playback.play_samples(samples, DEFAULT_SAMPLE_RATE)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}
