use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use fighter_select::utils::format_error;
use fighter_select::{
    AppConfig, Arena, AuthStatus, FighterDetails, FighterId, MessageKind, SelectError, UiEvent,
};

#[derive(Parser)]
#[command(name = "fighter-select", version)]
#[command(about = "Choose your fighter: browse the roster and keep your favorites", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API base URL (overrides config and FIGHTER_SELECT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Keep the session in memory only; nothing is saved between runs
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an existing account
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Must match --password
        #[arg(long = "confirm")]
        password_confirmation: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Status,

    /// List the fighter roster
    Fighters,

    /// Show a fighter's details
    Show {
        /// Fighter id
        id: i64,
    },

    /// Add or remove a fighter from your favorites
    Favorite {
        /// Fighter id
        id: i64,
    },

    /// List your favorite fighters
    Favorites,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("info".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print queued UI events. Returns true if an error message was shown.
fn render_events(rx: &mut mpsc::Receiver<UiEvent>) -> bool {
    let mut shown_error = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            UiEvent::Message {
                kind: MessageKind::Success,
                text,
                ..
            } => println!("{}", text),
            UiEvent::Message {
                kind: MessageKind::Error,
                text,
                ..
            } => {
                eprintln!("error: {}", text);
                shown_error = true;
            }
            UiEvent::ShowMain { user_name } => debug!(user = %user_name, "main view"),
            other => debug!(event = ?other, "ui event"),
        }
    }
    shown_error
}

fn print_details(details: &FighterDetails, favorited: bool) {
    let star = if favorited { " ★" } else { "" };
    println!("{} (#{}){}", details.name, details.id, star);
    if !details.tagline.is_empty() {
        println!("  \"{}\"", details.tagline);
    }
    println!("  Country: {}", details.country);
    println!("  Style:   {}", details.fighting_style);
    if !details.description.is_empty() {
        println!();
        println!("  {}", details.description);
    }
}

async fn require_session(arena: &Arena) -> Result<(), SelectError> {
    match arena.status().await {
        AuthStatus::Authenticated => Ok(()),
        AuthStatus::Unauthenticated => Err(SelectError::NotAuthenticated),
    }
}

async fn run(arena: &Arena, command: Commands) -> Result<(), SelectError> {
    match command {
        Commands::Login { email, password } => {
            let user = arena.login(&email, &password).await?;
            info!(user = %user.display_name(), "signed in");
        }

        Commands::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            let user = arena
                .register(&name, &email, &password, &password_confirmation)
                .await?;
            info!(user = %user.display_name(), "registered");
        }

        Commands::Logout => {
            arena.logout().await?;
        }

        Commands::Status => match arena.auth().current_user().await {
            Some(user) => {
                let email = user.email.as_deref().unwrap_or("-");
                println!("Signed in as {} <{}>", user.display_name(), email);
                println!(
                    "{} fighters loaded, {} favorites",
                    arena.fighters().render_cards().await.len(),
                    arena.fighters().favorite_ids().await.len()
                );
            }
            None => println!("Not signed in"),
        },

        Commands::Fighters => {
            require_session(arena).await?;
            let cards = arena.fighters().render_cards().await;
            if cards.is_empty() {
                println!("No fighters found.");
                return Ok(());
            }

            println!("{:<6} {:<3} NAME", "ID", "FAV");
            println!("{}", "-".repeat(40));
            for card in cards {
                let fav = if card.favorited { "★" } else { "" };
                println!("{:<6} {:<3} {}", card.id, fav, card.name);
            }
        }

        Commands::Show { id } => {
            require_session(arena).await?;
            let id = FighterId::new(id);
            let details = arena.fighters().show_fighter(id).await?;
            print_details(&details, arena.fighters().is_favorite(id).await);
        }

        Commands::Favorite { id } => {
            require_session(arena).await?;
            let id = FighterId::new(id);
            let favorited = arena.fighters().toggle_favorite_for(id).await?;
            if favorited {
                println!("Added fighter {} to favorites", id);
            } else {
                println!("Removed fighter {} from favorites", id);
            }
        }

        Commands::Favorites => {
            require_session(arena).await?;
            let fighters = arena.fighters().favorite_fighters().await;
            let ids = arena.fighters().favorite_ids().await;
            if ids.is_empty() {
                println!("No favorites yet.");
                return Ok(());
            }

            for id in ids {
                match fighters.iter().find(|f| f.id == id) {
                    Some(fighter) => println!("{:<6} {}", id, fighter.name),
                    None => println!("{:<6} (not in roster)", id),
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configuration with precedence: CLI > env > project > global > defaults
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }

    let (tx, mut rx) = mpsc::channel(256);
    let mut builder = Arena::builder().config(config).events(tx);
    builder = if cli.ephemeral {
        builder.memory_storage()
    } else {
        builder
            .sqlite_storage()
            .context("failed to initialize session storage")?
    };
    let arena = builder.build().context("failed to set up client")?;

    arena.init().await.context("failed to restore session")?;
    render_events(&mut rx);

    let result = run(&arena, cli.command).await;
    let shown_error = render_events(&mut rx);

    if let Err(e) = result {
        error!(error = %e, "command failed");
        if !shown_error {
            let hint = match e {
                SelectError::NotAuthenticated => " (run `fighter-select login` first)",
                _ => "",
            };
            eprintln!("error: {}{}", format_error(&anyhow::Error::new(e)), hint);
        }
        std::process::exit(1);
    }

    Ok(())
}
