//! `photojournal` - CLI for the photo journal
//!
//! This binary provides the command-line interface for browsing the journal,
//! capturing photos from image files and running an interactive session.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use photojournal::app::DELETE_PROMPT;
use photojournal::camera::CameraState;
use photojournal::cli::{
    parse_session_line, CaptureCommand, Cli, Command, ConfigCommand, DeleteCommand,
    SessionInput,
};
use photojournal::platform::HeadlessPlatform;
use photojournal::view::render_feed;
use photojournal::{
    init_logging, AppController, CameraController, Config, Confirm, KeyValueStore, PhotoStore,
    QuoteProvider, SqliteStore, StillImageCamera,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config subcommands load the file themselves
    let load = || Config::load_from(cli.config.clone());

    // Execute the command
    match cli.command {
        Command::Feed(feed_cmd) => handle_feed(&load()?, feed_cmd.json),
        Command::Capture(capture_cmd) => handle_capture(&load()?, &capture_cmd).await,
        Command::Delete(delete_cmd) => handle_delete(&load()?, &delete_cmd),
        Command::Session(session_cmd) => handle_session(&load()?, &session_cmd.image).await,
        Command::Status(status_cmd) => handle_status(&load()?, status_cmd.json),
        Command::Config(config_cmd) => handle_config(cli.config.clone(), config_cmd),
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(SqliteStore::open(config.database_path())?))
}

fn build_controller(
    config: &Config,
    image: &Path,
    confirm: Box<dyn Confirm>,
) -> Result<AppController, Box<dyn std::error::Error>> {
    config.validate()?;
    let kv = open_store(config)?;
    let camera = CameraController::new(
        Box::new(StillImageCamera::new(image)),
        config.stream_constraints(),
        config.camera.jpeg_quality,
    );
    let quotes = QuoteProvider::from_config(config)?;
    Ok(AppController::new(
        kv,
        camera,
        quotes,
        Arc::new(HeadlessPlatform),
        confirm,
    ))
}

/// Ask a yes/no question on the terminal.
fn ask(question: &str) -> bool {
    print!("{question} [s/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

fn handle_feed(config: &Config, json: bool) -> CliResult {
    let photos = PhotoStore::open(open_store(config)?);
    let screen = render_feed(photos.photos());
    if json {
        println!("{}", serde_json::to_string_pretty(&screen)?);
    } else {
        print!("{screen}");
    }
    Ok(())
}

async fn handle_capture(config: &Config, cmd: &CaptureCommand) -> CliResult {
    let mut app = build_controller(config, &cmd.image, Box::new(|_: &str| false))?;

    app.handle(photojournal::Command::OpenCamera).await?;
    if let CameraState::Error(message) = app.state().camera.state() {
        return Err(format!("Não foi possível acessar a câmera: {message}").into());
    }

    app.handle(photojournal::Command::Capture).await?;
    app.settle().await;
    print!("{}", app.render());

    if cmd.discard {
        app.handle(photojournal::Command::CloseCamera).await?;
        println!("Foto descartada.");
        return Ok(());
    }

    app.handle(photojournal::Command::Save).await?;
    match app.state().photos.photos().first() {
        Some(photo) => println!("Foto salva: {}", photo.id),
        None => return Err("a foto não foi salva".into()),
    }
    Ok(())
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> CliResult {
    let mut photos = PhotoStore::open(open_store(config)?);
    if photos.get(&cmd.id).is_none() {
        println!("Foto não encontrada: {}", cmd.id);
        return Ok(());
    }
    if !cmd.yes && !ask(DELETE_PROMPT) {
        println!("Nada foi excluído.");
        return Ok(());
    }
    photos.remove(&cmd.id)?;
    println!("Foto excluída: {}", cmd.id);
    Ok(())
}

async fn handle_session(config: &Config, image: &Path) -> CliResult {
    // Deletions are confirmed by the reader below, before they are sent.
    let mut app = build_controller(config, image, Box::new(|_: &str| true))?;
    let (tx, rx) = mpsc::channel(16);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let command = match parse_session_line(&line) {
                Ok(SessionInput::App(photojournal::Command::Delete(id))) => {
                    println!("{DELETE_PROMPT} [s/N]");
                    match lines.next_line().await {
                        Ok(Some(answer)) if is_yes(&answer) => photojournal::Command::Delete(id),
                        Ok(Some(_)) => continue,
                        _ => break,
                    }
                }
                Ok(SessionInput::App(command)) => command,
                Ok(SessionInput::Empty) => continue,
                Ok(SessionInput::Quit) => break,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };
            if tx.send(command).await.is_err() {
                break;
            }
        }
    });

    app.run(rx, |screen| println!("{screen}")).await;
    reader.await?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> CliResult {
    let db_path = config.database_path();
    let photos = PhotoStore::open(open_store(config)?);
    if json {
        let status = serde_json::json!({
            "database_path": db_path,
            "photo_count": photos.len(),
            "quote_endpoint": config.quotes.endpoint,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("photojournal status");
        println!("-------------------");
        println!("Database:      {}", db_path.display());
        println!("Photos:        {}", photos.len());
        println!("Quotes:        {}", config.quotes.endpoint);
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Quotes]");
                println!("  Endpoint:           {}", config.quotes.endpoint);
                println!("  Timeout (ms):       {}", config.quotes.timeout_ms);
                println!();
                println!("[Camera]");
                println!("  Facing:             {}", config.camera.facing);
                println!(
                    "  Preferred size:     {}x{}",
                    config.camera.preferred_width, config.camera.preferred_height
                );
                println!("  JPEG quality:       {}", config.camera.jpeg_quality);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            println!("{}", validation_report(path));
        }
    }
    Ok(())
}

/// One-line verdict on the configuration file at `path`.
fn validation_report(path: PathBuf) -> String {
    match Config::load_from(Some(path)) {
        Ok(_) => "Configuration is valid.".to_string(),
        Err(e) => format!("Configuration error: {e}"),
    }
}
