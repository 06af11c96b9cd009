//! `photojournal` - A photo journal that pairs every picture with a quote
//!
//! This library provides the camera capture flow, quote fetching with a local
//! fallback, persistent photo storage and the rendering of the journal feed.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod photo;
pub mod photo_store;
pub mod platform;
pub mod quote;
pub mod storage;
pub mod view;

pub use app::{AppController, Command, Confirm};
pub use camera::{CameraController, StillImageCamera};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use photo::{Photo, PhotoList, Quote};
pub use photo_store::PhotoStore;
pub use quote::QuoteProvider;
pub use storage::{KeyValueStore, SqliteStore};
pub use view::Screen;
