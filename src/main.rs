use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use base64::Engine as _;
use vaani::{
    ChatClient, ChatSession, Config, HttpSpeech, Narrator, NullSpeech, SessionEvent, SpeechService,
};

/// Vaani - streaming chat client that narrates replies aloud
#[derive(Parser)]
#[command(name = "vaani", version, about)]
struct Cli {
    /// Chat gateway endpoint
    #[arg(long, env = "VAANI_CHAT_URL")]
    url: Option<String>,

    /// Disable narration (text-only session)
    #[arg(long)]
    mute: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Narrate a piece of text and exit
    Say {
        /// Text to narrate
        #[arg(default_value = "నమస్తే! ఇది ఒక పరీక్ష.")]
        text: String,
    },
    /// List voices offered by the speech backend
    Voices,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,vaani=info",
        1 => "info,vaani=debug",
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

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.url {
        config.chat_url = url;
    }

    let service = build_speech(&config, cli.mute)?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Say { text } => {
                let narrator = Narrator::spawn(service, config.language.clone());
                narrator.add(&text).await;
                narrator.wait_idle().await;
                Ok(())
            }
            Command::Voices => {
                let voices = service.list_voices().await;
                if voices.is_empty() {
                    println!("no voices available");
                }
                for voice in voices {
                    println!("{}\t{}", voice.lang, voice.name);
                }
                Ok(())
            }
        };
    }

    repl(config, service).await
}

/// Pick the speech backend: HTTP TTS when a key is present, silent otherwise
fn build_speech(config: &Config, mute: bool) -> anyhow::Result<Arc<dyn SpeechService>> {
    if mute {
        return Ok(Arc::new(NullSpeech));
    }
    match &config.tts.api_key {
        Some(key) => Ok(Arc::new(HttpSpeech::new(
            key.clone(),
            config.tts.model.clone(),
            config.tts.voice.clone(),
            config.language.target_code.clone(),
        )?)),
        None => {
            tracing::warn!("no TTS key configured, narration disabled");
            Ok(Arc::new(NullSpeech))
        }
    }
}

/// Interactive chat loop: one stdin line per exchange
async fn repl(config: Config, service: Arc<dyn SpeechService>) -> anyhow::Result<()> {
    let narrator = Narrator::spawn(service, config.language.clone());
    let client = ChatClient::new(config.chat_url.clone(), config.chat_api_key.clone());
    let mut session = ChatSession::new(client, narrator, config.image_prompt.clone());

    // Print deltas as they arrive
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::AssistantDelta { delta, .. } => {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
                SessionEvent::AssistantCompleted { .. } => println!(),
                SessionEvent::UserMessage(_) | SessionEvent::AssistantStarted { .. } => {}
            }
        }
    });

    // Ctrl+C aborts the in-flight exchange instead of the process
    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel().await;
        }
    });

    println!(
        "vaani - type a message, /image <path> [text] to attach, /stop to silence, \
         /clear to reset, /quit to exit"
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" => break,
            "/stop" => session.cancel().await,
            "/clear" => {
                session.clear().await;
                println!("(conversation cleared)");
            }
            text => {
                let (text, image) = match text.strip_prefix("/image ") {
                    Some(rest) => {
                        let (path, caption) =
                            rest.split_once(' ').unwrap_or((rest, ""));
                        match encode_image(path).await {
                            Ok(image) => (caption, Some(image)),
                            Err(e) => {
                                eprintln!("error: {e}");
                                continue;
                            }
                        }
                    }
                    None => (text, None),
                };
                if let Err(e) = session.send(text, image).await {
                    eprintln!("error: {e}");
                }
            }
        }
    }

    printer.abort();
    Ok(())
}

/// Read an image file into the data-URL form the gateway expects
async fn encode_image(path: &str) -> anyhow::Result<String> {
    let mime = match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let bytes = tokio::fs::read(path).await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}
