use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use quill::auth::oauth::{self, OAuthClient};
use quill::auth::storage::{AuthStorage, Credential};
use quill::auth::{self, ANTHROPIC, GOOGLE};
use quill::banner::{BannerInfo, StatusCounts, print_banner, print_session_summary};
use quill::commands::{CommandRegistry, CommandResult, SessionInfo, StateChange};
use quill::config::Config;
use quill::consts::default_db_path;
use quill::engine::ReplyEngine;
use quill::generator::anthropic::AnthropicGenerator;
use quill::review::{Language, Tone};
use quill::session::storage::ProfileStorage;
use quill::session::{BusinessProfile, Session, StoredProfile};
use quill::source::google::GoogleBusinessSource;
use quill::spinner::Spinner;

#[derive(Parser)]
#[command(name = "quill", version, about = "Every review deserves an answer.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database for credentials, settings and the connected business
    /// (default: ~/.quill/quill.db)
    #[arg(short, long)]
    db: Option<String>,

    /// Anthropic model that writes the replies (remembered)
    #[arg(long)]
    model: Option<String>,

    /// Tone of drafted replies (remembered)
    #[arg(long)]
    tone: Option<Tone>,

    /// Language of drafted replies (remembered)
    #[arg(long)]
    language: Option<Language>,

    /// Debug logging on stderr. RUST_LOG takes precedence.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to Google (OAuth) or save an Anthropic API key
    Login {
        #[arg(value_enum)]
        provider: Provider,
    },
    /// Forget stored credentials
    Logout {
        #[arg(value_enum)]
        provider: Provider,
    },
    /// Remember which business location to answer reviews for
    Connect {
        /// Account reference, e.g. accounts/123
        #[arg(long)]
        account: String,
        /// Location reference, e.g. locations/456
        #[arg(long)]
        location: String,
        /// Business name used in replies
        #[arg(long)]
        name: String,
        /// What kind of business this is, e.g. "Vietnamese restaurant"
        #[arg(long)]
        business_type: Option<String>,
        /// Sign-off appended to every reply
        #[arg(long)]
        signature: Option<String>,
    },
    /// Forget the connected business
    Disconnect,
    /// List the locations your Google account can manage
    Locations,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    Google,
    Anthropic,
}

impl Provider {
    fn key(self) -> &'static str {
        match self {
            Self::Google => GOOGLE,
            Self::Anthropic => ANTHROPIC,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db = match cli.db.clone() {
        Some(db) => db,
        None => default_db_path()?.to_string_lossy().into_owned(),
    };
    ensure_db_dir(&db)?;

    if let Some(command) = cli.command {
        return match command {
            Command::Login { provider } => handle_login(provider, &db).await,
            Command::Logout { provider } => {
                auth::logout(&db, provider.key())?;
                println!("✓ Logged out from {}.", provider.key());
                Ok(())
            }
            Command::Connect {
                account,
                location,
                name,
                business_type,
                signature,
            } => handle_connect(
                &db,
                StoredProfile {
                    display_name: name,
                    account_ref: account,
                    location_ref: location,
                    business_type,
                    signature,
                },
            ),
            Command::Disconnect => {
                ProfileStorage::open(&db)?.clear()?;
                println!("✓ Disconnected. Run `quill connect` to pick a business again.");
                Ok(())
            }
            Command::Locations => handle_locations(&db).await,
        };
    }

    let config = Config::open(&db)?;
    let prefs = config
        .preferences()?
        .resolve(cli.tone, cli.language, cli.model.clone());
    // Flags are remembered for next time.
    if let Some(model) = &cli.model {
        config.set_model(model)?;
    }
    if let Some(tone) = cli.tone {
        config.set_tone(tone)?;
    }
    if let Some(language) = cli.language {
        config.set_language(language)?;
    }
    let mut tone = prefs.tone;
    let mut language = prefs.language;

    let auth = Arc::new(AuthStorage::open(&db)?);
    let platform_auth = match auth.get(GOOGLE)? {
        Some(Credential::OAuth(_)) => "OAuth ✓",
        _ => "not logged in",
    };
    let generator_auth = match auth.get(ANTHROPIC)? {
        Some(Credential::ApiKey { .. }) => "API key ✓",
        _ if std::env::var("ANTHROPIC_API_KEY").is_ok_and(|k| !k.is_empty()) => {
            "API key (env) ✓"
        }
        _ => "not authenticated",
    };

    let generator = AnthropicGenerator::new(prefs.model, Arc::clone(&auth));
    let model_name = generator.model().to_string();
    let engine = ReplyEngine::new(
        Arc::new(Session::new()),
        Arc::new(generator),
        Arc::new(GoogleBusinessSource::new()),
    );

    match ProfileStorage::open(&db)?.load()? {
        Some(stored) => match google_token(&auth).await {
            Ok(Some(token)) => engine.connect(BusinessProfile::from_stored(stored, token)),
            Ok(None) => eprintln!("warning: not logged in to Google. Run `quill login google`."),
            Err(e) => eprintln!("warning: {e:#}"),
        },
        None => eprintln!(
            "warning: no business connected. Run `quill locations`, then `quill connect`."
        ),
    }

    let business = engine.session().profile().map(|p| p.display_name);
    print_banner(&BannerInfo {
        business: business.as_deref().unwrap_or("not connected"),
        model: &model_name,
        platform_auth,
        generator_auth,
        tone: tone.label(),
        language: language.label(),
        db: &db,
    });

    if engine.session().is_connected() {
        match Spinner::while_running("loading reviews", engine.reload()).await {
            Ok(items) => {
                let counts = StatusCounts::tally(&items);
                println!(
                    "{} reviews, {} waiting for a reply. Type /reviews to see them.",
                    counts.total(),
                    counts.pending
                );
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    let registry = CommandRegistry::new();

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nquill> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Tokens expire within the hour; swap in a fresh one before any call.
        if engine.session().is_connected() {
            match google_token(&auth).await {
                Ok(Some(token)) => engine.session().set_credential(token),
                Ok(None) => {}
                Err(e) => tracing::warn!("could not refresh Google token: {e:#}"),
            }
        }

        // /disconnect can drop the business mid-session
        let business = engine.session().profile().map(|p| p.display_name);
        let info = SessionInfo {
            business: business.as_deref(),
            model: &model_name,
            platform_auth,
            generator_auth,
            tone,
            language,
            db_path: &db,
            engine: Some(&engine),
        };

        // Ctrl+C during a command cancels the command, not the REPL
        let result = tokio::select! {
            result = registry.dispatch(input, &info) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\ninterrupted");
                continue;
            }
        };

        match result {
            CommandResult::NotACommand => println!("type /help for available commands"),
            CommandResult::Handled => {}
            CommandResult::StateChanged(StateChange::Tone(new_tone)) => {
                tone = new_tone;
                if let Err(e) = config.set_tone(tone) {
                    eprintln!("warning: could not save tone: {e:#}");
                }
            }
            CommandResult::StateChanged(StateChange::Language(new_language)) => {
                language = new_language;
                if let Err(e) = config.set_language(language) {
                    eprintln!("warning: could not save language: {e:#}");
                }
            }
            CommandResult::Quit => break,
        }
    }

    print_session_summary(StatusCounts::tally(&engine.store().snapshot().await));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quill=debug" } else { "quill=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn ensure_db_dir(db: &str) -> anyhow::Result<()> {
    if db == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(db).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(())
}

/// A current Google bearer token, refreshed if needed.
async fn google_token(auth: &AuthStorage) -> anyhow::Result<Option<String>> {
    let client = OAuthClient::from_env()?;
    auth.get_access_token(GOOGLE, &client).await
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

async fn handle_login(provider: Provider, db: &str) -> anyhow::Result<()> {
    match provider {
        Provider::Google => {
            let client = OAuthClient::from_env()?;
            println!("Logging in to Google Business Profile...\n");

            let (url, verifier) = oauth::build_authorize_url(&client);

            // Try to open browser, silently ignore failures (e.g. headless/SSH)
            let _ = open::that(&url);

            println!("Open this URL to authenticate:\n");
            println!("  {}\n", url);
            println!("After approving, your browser lands on a localhost page that");
            println!("will not load. Copy that page's full address.\n");

            let code = prompt("Paste the address (or just the code): ")?;
            if code.is_empty() {
                anyhow::bail!("no authorization code provided");
            }

            println!("\nExchanging code for tokens...");
            auth::login_google(db, &client, &code, &verifier).await?;
            println!("✓ Logged in to Google successfully!");
            println!("  Next: `quill locations` to find your business.");
        }
        Provider::Anthropic => {
            let key = prompt("Paste your Anthropic API key: ")?;
            auth::login_api_key(db, ANTHROPIC, &key)?;
            println!("✓ API key saved.");
        }
    }
    Ok(())
}

fn handle_connect(db: &str, profile: StoredProfile) -> anyhow::Result<()> {
    ProfileStorage::open(db)?.save(&profile)?;
    println!("✓ Connected to {}.", profile.display_name);
    println!("  Run `quill` to start answering reviews.");
    Ok(())
}

async fn handle_locations(db: &str) -> anyhow::Result<()> {
    let auth = AuthStorage::open(db)?;
    let token = google_token(&auth)
        .await?
        .context("not logged in to Google. Run `quill login google` first.")?;

    let source = GoogleBusinessSource::new();
    let locations =
        Spinner::while_running("fetching locations", source.list_locations(&token)).await?;

    if locations.is_empty() {
        println!("No locations found for this Google account.");
        return Ok(());
    }

    for location in &locations {
        let title = if location.title.is_empty() {
            "(untitled)"
        } else {
            location.title.as_str()
        };
        println!("{title}");
        if !location.account_name.is_empty() {
            println!("  account   {}", location.account_name);
        }
        println!(
            "  connect   quill connect --account {} --location {} --name \"{}\"\n",
            location.account_ref, location.location_ref, title
        );
    }
    Ok(())
}
