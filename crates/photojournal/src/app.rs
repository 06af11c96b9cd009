//! Application state and the controller that drives it.
//!
//! All mutable state lives in [`AppState`], owned by [`AppController`].
//! User actions arrive as [`Command`]s; completions of background work
//! (only the quote fetch) arrive as [`AppEvent`]s on the controller's own
//! channel. Both are applied on the task that owns the controller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::camera::{CameraController, CameraState, CapturedImage};
use crate::error::Result;
use crate::photo::{Photo, Quote};
use crate::photo_store::PhotoStore;
use crate::platform::{self, HostPlatform, InstallPrompt};
use crate::quote::QuoteProvider;
use crate::storage::KeyValueStore;
use crate::view::{self, Screen};

/// Question asked before a photo is deleted.
pub const DELETE_PROMPT: &str = "Tem certeza que deseja excluir esta foto?";

/// Asks the user to confirm a destructive action.
pub trait Confirm: Send + Sync {
    /// Return `true` to go ahead.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// The photo feed (or the empty state).
    #[default]
    Feed,
    /// Camera overlay, shooting.
    Camera,
    /// Camera overlay, reviewing a capture.
    Preview,
}

/// User actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the camera overlay and start the camera.
    OpenCamera,
    /// Try the camera again after it failed to open.
    RetryCamera,
    /// Take a still and fetch a quote for it.
    Capture,
    /// Throw the capture away and shoot again.
    Retake,
    /// Keep the capture with its quote.
    Save,
    /// Leave the camera overlay, dropping any capture.
    CloseCamera,
    /// Delete a saved photo, after confirmation.
    Delete(String),
    /// The platform announced that the app can be installed.
    InstallAvailable,
    /// Accept the install prompt.
    Install,
    /// Dismiss the install prompt for good.
    DismissInstall,
}

/// Completions of background work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The quote for capture `generation` is ready.
    QuoteResolved {
        /// Capture the fetch was started for.
        generation: u64,
        /// The quote.
        quote: Quote,
    },
}

/// The capture-to-save window: one still, one quote, one pending fetch.
#[derive(Debug, Default)]
pub struct CaptureSession {
    generation: u64,
    image: Option<CapturedImage>,
    quote: Option<Quote>,
    pending: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Number of the current capture. Bumped whenever a capture starts or
    /// is thrown away.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The captured still, if any.
    #[must_use]
    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    /// The resolved quote, if any.
    #[must_use]
    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// Whether a quote fetch is outstanding.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop image and quote, cancel the fetch, and move to a new generation
    /// so any result still in flight is recognized as stale.
    fn discard(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.image = None;
        self.quote = None;
        self.generation += 1;
    }
}

/// Everything the app knows.
#[derive(Debug)]
pub struct AppState {
    /// Current screen.
    pub view: View,
    /// Saved photos.
    pub photos: PhotoStore,
    /// The camera and its stream.
    pub camera: CameraController,
    /// Capture in progress.
    pub capture: CaptureSession,
    /// Install prompt.
    pub install: InstallPrompt,
}

/// Maps commands and events onto [`AppState`].
pub struct AppController {
    state: AppState,
    quotes: QuoteProvider,
    platform: Arc<dyn HostPlatform>,
    confirm: Box<dyn Confirm>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl std::fmt::Debug for AppController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppController")
            .field("state", &self.state)
            .field("quotes", &self.quotes)
            .field("platform", &self.platform.name())
            .finish_non_exhaustive()
    }
}

impl AppController {
    /// Build the controller, load saved photos from `kv` and register the
    /// platform asset cache.
    #[must_use]
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        camera: CameraController,
        quotes: QuoteProvider,
        platform: Arc<dyn HostPlatform>,
        confirm: Box<dyn Confirm>,
    ) -> Self {
        let photos = PhotoStore::open(Arc::clone(&kv));
        info!(count = photos.len(), platform = platform.name(), "Journal ready");
        platform::register_asset_cache(platform.as_ref());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState {
                view: View::Feed,
                photos,
                camera,
                capture: CaptureSession::default(),
                install: InstallPrompt::new(kv),
            },
            quotes,
            platform,
            confirm,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Render the current state.
    #[must_use]
    pub fn render(&self) -> Screen {
        view::render(&self.state)
    }

    /// Apply one user command.
    ///
    /// Camera trouble ends up in the camera state, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if saving, deleting or persisting the install flag
    /// fails to write to storage.
    pub async fn handle(&mut self, command: Command) -> Result<()> {
        debug!(?command, view = ?self.state.view, "Handling command");
        match command {
            Command::OpenCamera => self.open_camera().await,
            Command::RetryCamera => {
                if self.state.view == View::Camera {
                    self.start_camera().await;
                }
            }
            Command::Capture => self.capture(),
            Command::Retake => self.retake().await,
            Command::Save => self.save()?,
            Command::CloseCamera => self.close_camera(),
            Command::Delete(id) => self.delete(&id)?,
            Command::InstallAvailable => self.state.install.on_available(),
            Command::Install => {
                self.state.install.install(self.platform.as_ref()).await;
            }
            Command::DismissInstall => self.state.install.dismiss()?,
        }
        Ok(())
    }

    /// Apply one background completion.
    ///
    /// A quote is only accepted for the capture it was fetched for, while
    /// that capture is still on screen; anything else is dropped.
    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::QuoteResolved { generation, quote } => {
                let capture = &mut self.state.capture;
                if generation != capture.generation
                    || self.state.view != View::Preview
                    || capture.quote.is_some()
                {
                    debug!(
                        generation,
                        current = capture.generation,
                        "Discarding stale quote"
                    );
                    return;
                }
                capture.pending = None;
                capture.quote = Some(quote);
                debug!(generation, "Quote ready");
            }
        }
    }

    /// Wait until the quote for the current capture has been applied.
    ///
    /// Returns at once when no fetch is outstanding.
    pub async fn settle(&mut self) {
        while self.state.capture.pending.is_some() {
            let Some(events) = self.events_rx.as_mut() else {
                return;
            };
            match events.recv().await {
                Some(event) => self.apply_event(event),
                None => return,
            }
        }
    }

    /// Run the event loop until `commands` closes.
    ///
    /// `on_render` is called with the initial screen and after every
    /// command or event.
    pub async fn run<F>(&mut self, mut commands: mpsc::Receiver<Command>, mut on_render: F)
    where
        F: FnMut(&Screen),
    {
        let Some(mut events) = self.events_rx.take() else {
            error!("Event loop is already running");
            return;
        };

        on_render(&self.render());
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if let Err(e) = self.handle(command).await {
                        error!(error = %e, "Command failed");
                    }
                }
                Some(event) = events.recv() => self.apply_event(event),
            }
            on_render(&self.render());
        }

        self.events_rx = Some(events);
        self.state.camera.stop_camera();
    }

    async fn open_camera(&mut self) {
        self.state.capture.discard();
        self.state.view = View::Camera;
        self.start_camera().await;
    }

    async fn start_camera(&mut self) {
        // The failure is kept in the camera state and rendered with a retry.
        if let Err(e) = self.state.camera.start_camera().await {
            debug!(error = %e, "Camera left in error state");
        }
    }

    fn capture(&mut self) {
        if self.state.view != View::Camera || self.state.camera.state() != &CameraState::Streaming
        {
            debug!(view = ?self.state.view, "Nothing to capture from");
            return;
        }

        let image = match self.state.camera.capture_photo() {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Capture failed");
                return;
            }
        };

        let capture = &mut self.state.capture;
        capture.discard();
        capture.image = Some(image);
        let generation = capture.generation;

        let quotes = self.quotes.clone();
        let events = self.events_tx.clone();
        capture.pending = Some(tokio::spawn(async move {
            let quote = quotes.fetch_quote().await;
            // The receiver only goes away with the controller.
            let _ = events.send(AppEvent::QuoteResolved { generation, quote });
        }));

        self.state.view = View::Preview;
        debug!(generation, "Captured, fetching quote");
    }

    async fn retake(&mut self) {
        if self.state.view != View::Preview {
            return;
        }
        self.state.capture.discard();
        self.state.view = View::Camera;
        if let Err(e) = self.state.camera.retake().await {
            debug!(error = %e, "Camera left in error state");
        }
    }

    fn save(&mut self) -> Result<()> {
        let capture = &self.state.capture;
        let (Some(image), Some(quote)) = (capture.image.as_ref(), capture.quote.as_ref()) else {
            debug!(
                has_image = capture.image.is_some(),
                has_quote = capture.quote.is_some(),
                "Save ignored, capture incomplete"
            );
            return Ok(());
        };

        let photo = Photo::new(image.data_uri.clone(), quote);
        self.state.photos.add(photo)?;
        self.close_camera();
        Ok(())
    }

    fn close_camera(&mut self) {
        self.state.camera.stop_camera();
        self.state.capture.discard();
        self.state.view = View::Feed;
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        if self.state.photos.get(id).is_none() {
            debug!(%id, "Delete ignored, no such photo");
            return Ok(());
        }
        if !self.confirm.confirm(DELETE_PROMPT) {
            debug!(%id, "Delete declined");
            return Ok(());
        }
        self.state.photos.remove(id)?;
        Ok(())
    }
}
