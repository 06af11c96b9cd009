//! Rendering: application state in, screen description out.
//!
//! Nothing here mutates state or caches anything. The empty-state/feed
//! switch, the photo count and the capture button all follow from the
//! photo list each time [`render`] runs.

use std::fmt;

use chrono::{Datelike, Local, TimeZone, Timelike};
use serde::Serialize;

use crate::app::{AppState, View};
use crate::camera::CameraState;
use crate::photo::Photo;

/// Camera overlay title while shooting.
pub const TITLE_SHOOTING: &str = "Tirar Foto";

/// Camera overlay title while previewing a capture.
pub const TITLE_PREVIEW: &str = "Sua Foto";

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Everything on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screen {
    /// Photo counter in the header.
    pub photo_count: usize,
    /// Main area.
    pub body: Body,
    /// Floating capture button.
    pub show_capture_button: bool,
    /// Camera overlay, when open.
    pub overlay: Option<CameraOverlay>,
    /// Custom install prompt.
    pub show_install_prompt: bool,
}

/// Main area of the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cards", rename_all = "snake_case")]
pub enum Body {
    /// No photos yet: invitation to take the first one.
    Empty,
    /// Saved photos, newest first.
    Feed(Vec<PhotoCard>),
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoCard {
    /// Photo id, the handle for deletion.
    pub id: String,
    /// Image data URI.
    pub image_data: String,
    /// Quote in quotation marks.
    pub quote: String,
    /// `— author`, when there is one.
    pub author: Option<String>,
    /// Formatted capture date.
    pub date: String,
}

/// The camera overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraOverlay {
    /// Overlay heading.
    pub title: &'static str,
    /// What the overlay shows.
    pub content: OverlayContent,
}

/// Camera overlay content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayContent {
    /// Live viewfinder with the capture button.
    Live,
    /// The camera could not be opened; offers a retry.
    Unavailable {
        /// Why.
        message: String,
    },
    /// A captured still with its quote.
    Preview {
        /// Image data URI.
        image_data: String,
        /// Quote in quotation marks; `None` while it is still loading.
        quote: Option<String>,
        /// `— author`, when there is one.
        author: Option<String>,
    },
}

/// Build the screen for `state`.
#[must_use]
pub fn render(state: &AppState) -> Screen {
    Screen {
        overlay: overlay(state),
        show_install_prompt: state.install.is_visible(),
        ..render_feed(state.photos.photos())
    }
}

/// Build the screen for a bare feed: no overlay, no install prompt.
#[must_use]
pub fn render_feed(photos: &[Photo]) -> Screen {
    let body = if photos.is_empty() {
        Body::Empty
    } else {
        Body::Feed(photos.iter().map(photo_card).collect())
    };

    Screen {
        photo_count: photos.len(),
        show_capture_button: !photos.is_empty(),
        body,
        overlay: None,
        show_install_prompt: false,
    }
}

fn overlay(state: &AppState) -> Option<CameraOverlay> {
    match state.view {
        View::Feed => None,
        View::Camera => {
            let content = match state.camera.state() {
                CameraState::Error(message) => OverlayContent::Unavailable {
                    message: message.clone(),
                },
                _ => OverlayContent::Live,
            };
            Some(CameraOverlay {
                title: TITLE_SHOOTING,
                content,
            })
        }
        View::Preview => {
            let image_data = state
                .capture
                .image()
                .map(|image| image.data_uri.clone())
                .unwrap_or_default();
            let quote = state.capture.quote();
            Some(CameraOverlay {
                title: TITLE_PREVIEW,
                content: OverlayContent::Preview {
                    image_data,
                    quote: quote.map(|q| quoted(&q.text)),
                    author: quote.and_then(|q| q.author.as_deref()).map(attributed),
                },
            })
        }
    }
}

fn photo_card(photo: &Photo) -> PhotoCard {
    PhotoCard {
        id: photo.id.clone(),
        image_data: photo.image_data.clone(),
        quote: quoted(&photo.quote),
        author: photo.author.as_deref().map(attributed),
        date: format_date(photo.timestamp),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{text}\"")
}

fn attributed(author: &str) -> String {
    format!("\u{2014} {author}")
}

/// Format epoch milliseconds in local time, e.g. `19 de outubro de 2026 às 14:05`.
#[must_use]
pub fn format_date(timestamp_ms: i64) -> String {
    format_date_in(timestamp_ms, &Local)
}

/// Format epoch milliseconds in `tz`.
#[must_use]
pub fn format_date_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String {
    let Some(dt) = tz.timestamp_millis_opt(timestamp_ms).single() else {
        return String::from("?");
    };
    format!(
        "{} de {} de {} às {:02}:{:02}",
        dt.day(),
        MONTHS[dt.month0() as usize],
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diário de Fotos ({})", self.photo_count)?;

        if let Some(overlay) = &self.overlay {
            writeln!(f, "== {} ==", overlay.title)?;
            match &overlay.content {
                OverlayContent::Live => writeln!(f, "[câmera ao vivo]")?,
                OverlayContent::Unavailable { message } => {
                    writeln!(f, "Não foi possível acessar a câmera: {message}")?;
                    writeln!(f, "(tente novamente com `retry`)")?;
                }
                OverlayContent::Preview {
                    image_data,
                    quote,
                    author,
                } => {
                    writeln!(f, "[imagem, {} bytes]", image_data.len())?;
                    match quote {
                        Some(quote) => writeln!(f, "{quote}")?,
                        None => writeln!(f, "(buscando citação...)")?,
                    }
                    if let Some(author) = author {
                        writeln!(f, "{author}")?;
                    }
                }
            }
        } else {
            match &self.body {
                Body::Empty => {
                    writeln!(f, "Nenhuma foto ainda.")?;
                    writeln!(f, "Tire sua primeira foto para começar o diário.")?;
                }
                Body::Feed(cards) => {
                    for card in cards {
                        writeln!(f)?;
                        writeln!(f, "{}", card.quote)?;
                        if let Some(author) = &card.author {
                            writeln!(f, "{author}")?;
                        }
                        writeln!(f, "{}  [{}]", card.date, card.id)?;
                    }
                }
            }
        }

        if self.show_install_prompt {
            writeln!(f)?;
            writeln!(f, "Instale o app: `install` ou `dismiss`")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_date_in_utc() {
        // 2026-10-19T14:05:00Z
        let ts = 1_792_418_700_000;
        assert_eq!(format_date_in(ts, &Utc), "19 de outubro de 2026 às 14:05");
    }

    #[test]
    fn test_format_date_pads_minutes() {
        // 2024-03-01T09:07:00Z
        let ts = 1_709_284_020_000;
        assert_eq!(format_date_in(ts, &Utc), "1 de março de 2024 às 09:07");
    }

    #[test]
    fn test_format_date_out_of_range() {
        assert_eq!(format_date_in(i64::MAX, &Utc), "?");
    }

    #[test]
    fn test_quote_decorations() {
        assert_eq!(quoted("Stay hungry"), "\"Stay hungry\"");
        assert_eq!(attributed("Jobs"), "\u{2014} Jobs");
    }

    #[test]
    fn test_photo_card() {
        let photo = Photo {
            id: "abc".to_string(),
            image_data: "data:x".to_string(),
            quote: "O melhor momento é agora.".to_string(),
            author: None,
            timestamp: 0,
        };
        let card = photo_card(&photo);
        assert_eq!(card.id, "abc");
        assert_eq!(card.quote, "\"O melhor momento é agora.\"");
        assert!(card.author.is_none());
    }

    #[test]
    fn test_render_feed_counts_and_orders() {
        let photos: Vec<Photo> = ["b", "a"]
            .iter()
            .map(|id| Photo {
                id: (*id).to_string(),
                image_data: "data:x".to_string(),
                quote: "q".to_string(),
                author: Some("Jobs".to_string()),
                timestamp: 0,
            })
            .collect();

        let screen = render_feed(&photos);
        assert_eq!(screen.photo_count, 2);
        assert!(screen.show_capture_button);
        match screen.body {
            Body::Feed(cards) => {
                assert_eq!(cards[0].id, "b");
                assert_eq!(cards[1].author.as_deref(), Some("\u{2014} Jobs"));
            }
            Body::Empty => panic!("expected feed"),
        }

        let empty = render_feed(&[]);
        assert_eq!(empty.body, Body::Empty);
        assert!(!empty.show_capture_button);
    }

    #[test]
    fn test_display_empty_screen() {
        let screen = Screen {
            photo_count: 0,
            body: Body::Empty,
            show_capture_button: false,
            overlay: None,
            show_install_prompt: false,
        };
        let text = screen.to_string();
        assert!(text.contains("(0)"));
        assert!(text.contains("Nenhuma foto"));
    }

    #[test]
    fn test_display_preview_while_loading() {
        let screen = Screen {
            photo_count: 0,
            body: Body::Empty,
            show_capture_button: false,
            overlay: Some(CameraOverlay {
                title: TITLE_PREVIEW,
                content: OverlayContent::Preview {
                    image_data: "data:abc".to_string(),
                    quote: None,
                    author: None,
                },
            }),
            show_install_prompt: true,
        };
        let text = screen.to_string();
        assert!(text.contains("Sua Foto"));
        assert!(text.contains("buscando"));
        assert!(text.contains("install"));
    }
}
