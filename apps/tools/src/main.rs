use std::{fs, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    call_providers::{
        current_oauth_call_provider, generate_video_call_id, jitsi_server_url,
        show_audio_chat_button, show_video_chat_button,
    },
    config::{load_settings_from, DEFAULT_CONFIG_PATH},
    CallSetupTracker,
};
use shared::{
    domain::{OAuthCallProvider, RequestId, SessionKey},
    protocol::RealmCallSettings,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which call controls a realm's settings enable.
    Inspect {
        realm_settings: PathBuf,
        #[arg(long)]
        video_call_id: Option<String>,
    },
    /// Apply registry operations in order and print the resulting state.
    ///
    /// Operations: `track:<key>`, `register:<provider>:<key>`,
    /// `complete:<provider>:<key>`, `abandon:<key>`.
    Replay { ops: Vec<String> },
}

#[derive(Debug, PartialEq, Eq)]
enum ReplayOp {
    Track(SessionKey),
    Register(OAuthCallProvider, SessionKey),
    Complete(OAuthCallProvider, SessionKey),
    Abandon(SessionKey),
}

impl FromStr for ReplayOp {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (verb, rest) = raw.split_once(':').unwrap_or((raw, ""));
        let non_empty = |part: &str, what: &str| -> Result<SessionKey> {
            if part.is_empty() {
                return Err(anyhow!("operation '{raw}' is missing its {what}"));
            }
            Ok(SessionKey::from(part))
        };

        match verb {
            "track" => Ok(ReplayOp::Track(non_empty(rest, "key")?)),
            "abandon" => Ok(ReplayOp::Abandon(non_empty(rest, "key")?)),
            "register" | "complete" => {
                let (provider, key) = rest
                    .split_once(':')
                    .ok_or_else(|| anyhow!("operation '{raw}' needs <provider>:<key>"))?;
                let provider = provider.parse::<OAuthCallProvider>()?;
                let key = non_empty(key, "key")?;
                if verb == "register" {
                    Ok(ReplayOp::Register(provider, key))
                } else {
                    Ok(ReplayOp::Complete(provider, key))
                }
            }
            other => Err(anyhow!("unknown operation '{other}'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings_from(&cli.config)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    match cli.command {
        Command::Inspect {
            realm_settings,
            video_call_id,
        } => {
            let raw = fs::read_to_string(&realm_settings)
                .with_context(|| format!("failed to read '{}'", realm_settings.display()))?;
            let mut realm: RealmCallSettings = serde_json::from_str(&raw)
                .with_context(|| format!("invalid realm settings in '{}'", realm_settings.display()))?;
            settings.apply_to(&mut realm);

            match realm.resolve_video_chat_provider() {
                Ok(provider) => println!("video_chat_provider={provider:?}"),
                Err(err) => println!("video_chat_provider=unknown ({err})"),
            }
            match current_oauth_call_provider(&realm) {
                Some(provider) => println!("oauth_provider={provider}"),
                None => println!("oauth_provider=none"),
            }
            println!("show_video_chat_button={}", show_video_chat_button(&realm));
            println!("show_audio_chat_button={}", show_audio_chat_button(&realm));

            let video_call_id = video_call_id.unwrap_or_else(generate_video_call_id);
            match jitsi_server_url(&realm, Some(&video_call_id))? {
                Some(url) => println!("jitsi_url={url}"),
                None => println!("jitsi_url=none"),
            }
        }
        Command::Replay { ops } => {
            let ops = ops
                .iter()
                .map(|raw| raw.parse::<ReplayOp>())
                .collect::<Result<Vec<_>>>()?;
            let tracker = CallSetupTracker::from_settings(&settings);
            let mut ignored = Vec::<RequestId>::new();

            for op in ops {
                match op {
                    ReplayOp::Track(key) => {
                        let request = tracker.next_request_id();
                        tracker.track_request(&key, request).await;
                        println!("tracked request_id={request} key={key}");
                    }
                    ReplayOp::Register(provider, key) => {
                        let label = format!("{provider}:{key}");
                        tracker
                            .register_provider_callback(
                                provider,
                                &key,
                                Box::new(move || info!("replay: completed {label}")),
                            )
                            .await;
                        println!("registered provider={provider} key={key}");
                    }
                    ReplayOp::Complete(provider, key) => {
                        let ran = tracker.complete_provider_callback(provider, &key).await;
                        println!("completed provider={provider} key={key} ran={ran}");
                    }
                    ReplayOp::Abandon(key) => {
                        let requests = tracker.tracked_requests(&key).await;
                        tracker.abandon(&key).await;
                        ignored.extend(requests);
                        println!("abandoned key={key}");
                    }
                }
            }

            for request in ignored {
                println!(
                    "request_id={request} ignored={}",
                    tracker.is_ignored(request).await
                );
            }
            println!("ignored_total={}", tracker.ignored_len().await);
        }
    }

    Ok(())
}
