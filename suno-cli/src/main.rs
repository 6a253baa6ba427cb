use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use suno_api::auth::CookieStore;
use suno_api::{
    AudioInfo, ClientConfig, CustomGenerateRequest, ExtendRequest, GenerateRequest, SongQuery,
    SunoClient,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "suno", version, about = "Suno music generation CLI")]
struct Cli {
    /// Cookie header to authenticate with (overrides `SUNO_COOKIE`)
    #[arg(long, global = true, value_name = "COOKIE")]
    cookie: Option<String>,
    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save the browser cookie used to authenticate
    Login {
        /// Full `Cookie` header from a logged-in suno.com session
        #[arg(required_unless_present = "check", value_name = "COOKIE")]
        value: Option<String>,
        /// Check the saved cookie against upstream
        #[arg(long)]
        check: bool,
    },
    /// Clear the saved cookie
    Logout,
    #[command(flatten)]
    Api(ApiCommand),
}

#[derive(Subcommand)]
enum ApiCommand {
    /// List songs in the library, or specific songs by id
    Songs {
        /// Comma-separated clip ids
        #[arg(long)]
        ids: Option<String>,
        /// Library page
        #[arg(long)]
        page: Option<String>,
    },
    /// Show one clip
    Clip {
        /// Clip ID
        id: String,
    },
    /// Show remaining credits
    Credits,
    /// Generate songs from a description
    Generate {
        /// What the song should be about
        prompt: String,
        /// No vocals
        #[arg(short, long)]
        instrumental: bool,
        /// Wait until audio is playable
        #[arg(short, long)]
        wait: bool,
    },
    /// Generate songs from lyrics, style tags and title
    Custom {
        /// Lyrics
        prompt: String,
        /// Style tags, e.g. "lofi chill piano"
        #[arg(short, long)]
        tags: String,
        /// Song title
        #[arg(short = 'T', long)]
        title: String,
        /// No vocals
        #[arg(short, long)]
        instrumental: bool,
        /// Wait until audio is playable
        #[arg(short, long)]
        wait: bool,
    },
    /// Continue an existing clip
    Extend {
        /// Clip ID to continue
        clip_id: String,
        /// Position in seconds to continue from
        #[arg(long, value_name = "SECS")]
        at: Option<f64>,
        /// Lyrics for the continuation
        #[arg(short, long, default_value = "")]
        prompt: String,
        /// Style tags
        #[arg(short, long, default_value = "")]
        tags: String,
        /// Title
        #[arg(short = 'T', long, default_value = "")]
        title: String,
    },
    /// Generate lyrics only
    Lyrics {
        /// What the lyrics should be about
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    match cli.command {
        Command::Login { value, check } => cmd_login(value, check).await,
        Command::Logout => cmd_logout(),
        Command::Api(command) => {
            let client = connect(cli.cookie)?;
            match command {
                ApiCommand::Songs { ids, page } => {
                    let query = SongQuery::from_params(ids.as_deref(), page.as_deref());
                    print_songs(&client.songs(&query).await?, json)
                }
                ApiCommand::Clip { id } => print_songs(&[client.clip(&id).await?], json),
                ApiCommand::Credits => cmd_credits(&client, json).await,
                ApiCommand::Generate {
                    prompt,
                    instrumental,
                    wait,
                } => {
                    let req = GenerateRequest {
                        prompt,
                        make_instrumental: instrumental,
                        wait_audio: wait,
                    };
                    print_songs(&client.generate(&req).await?, json)
                }
                ApiCommand::Custom {
                    prompt,
                    tags,
                    title,
                    instrumental,
                    wait,
                } => {
                    let req = CustomGenerateRequest {
                        prompt,
                        tags,
                        title,
                        make_instrumental: instrumental,
                        wait_audio: wait,
                    };
                    print_songs(&client.custom_generate(&req).await?, json)
                }
                ApiCommand::Extend {
                    clip_id,
                    at,
                    prompt,
                    tags,
                    title,
                } => {
                    let req = ExtendRequest {
                        clip_id,
                        continue_at: at,
                        prompt,
                        tags,
                        title,
                    };
                    print_songs(&client.extend_audio(&req).await?, json)
                }
                ApiCommand::Lyrics { prompt } => cmd_lyrics(&client, &prompt, json).await,
            }
        }
    }
}

/// Resolve the cookie: `--cookie`, then `SUNO_COOKIE`, then the saved store.
fn connect(flag: Option<String>) -> Result<SunoClient> {
    let mut config = ClientConfig::from_env()?;
    if let Some(cookie) = flag.filter(|c| !c.trim().is_empty()) {
        debug!("using cookie from --cookie");
        config.cookie = Some(cookie);
    } else if config.cookie.is_some() {
        debug!("using cookie from SUNO_COOKIE");
    } else {
        debug!("using saved cookie");
        config.cookie = CookieStore::load()?.cookie;
    }
    if config.cookie.is_none() {
        bail!("no cookie configured; run `suno login <cookie>` or set SUNO_COOKIE");
    }
    Ok(SunoClient::from_config(config)?)
}

// ── login / logout ──

async fn cmd_login(cookie: Option<String>, check: bool) -> Result<()> {
    if check {
        let store = CookieStore::load()?;
        if store.cookie().is_none() {
            println!("Not logged in.");
            return Ok(());
        }
        let config = ClientConfig {
            cookie: store.cookie,
            ..ClientConfig::from_env()?
        };
        let client = SunoClient::from_config(config)?;
        match client.credits().await {
            Ok(c) => println!("Logged in ({} credits left).", c.credits_left),
            Err(e) => println!("Cookie saved but validation failed: {e}"),
        }
        return Ok(());
    }

    let cookie = cookie.context("cookie value required")?;
    CookieStore::new(&cookie)
        .context("cookie value is empty")?
        .save()?;
    println!("Cookie saved to {}.", CookieStore::path()?.display());
    Ok(())
}

fn cmd_logout() -> Result<()> {
    if CookieStore::clear()? {
        println!("Cookie cleared.");
    } else {
        println!("No saved cookie.");
    }
    Ok(())
}

// ── credits / lyrics ──

async fn cmd_credits(client: &SunoClient, json: bool) -> Result<()> {
    let c = client.credits().await?;
    if json {
        return print_json(&serde_json::to_value(&c)?);
    }
    println!("Credits left:  {}", c.credits_left);
    println!("Period:        {}", c.period);
    println!("Monthly usage: {}/{}", c.monthly_usage, c.monthly_limit);
    Ok(())
}

async fn cmd_lyrics(client: &SunoClient, prompt: &str, json: bool) -> Result<()> {
    let lyrics = client.generate_lyrics(prompt).await?;
    if json {
        return print_json(&serde_json::to_value(&lyrics)?);
    }
    println!("{}\n", lyrics.title);
    println!("{}", lyrics.text);
    if lyrics.status != "complete" {
        eprintln!("warning: lyrics still {}", lyrics.status);
    }
    Ok(())
}

// ── output ──

fn print_songs(songs: &[AudioInfo], json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::to_value(songs)?);
    }
    if songs.is_empty() {
        println!("No songs.");
        return Ok(());
    }
    for s in songs {
        let title = if s.title.is_empty() {
            "Untitled Track"
        } else {
            s.title.as_str()
        };
        println!("  [{}] {} ({})", s.id, title, s.status);
        if !s.tags.is_empty() {
            println!("      tags:  {}", s.tags);
        }
        if let Some(url) = &s.audio_url {
            println!("      audio: {url}");
        }
        if let Some(msg) = &s.error_message {
            println!("      error: {msg}");
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
