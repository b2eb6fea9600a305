//! Player lifecycle controller.
//!
//! The original page juggled one embedded player that was torn down and
//! rebuilt whenever the selection changed. That contract is explicit here:
//! the shell owns a single controller, `create` replaces any live player,
//! `destroy` tears it down, and every transition fires the state callback.
//! Playback itself is the system browser's job; `create` opens the video's
//! watch page.

use crate::models::Video;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Created { video_id: String },
    Destroyed { video_id: String },
}

type EventCallback = Box<dyn Fn(&PlayerEvent) + Send + Sync>;

pub struct PlayerController {
    live: Option<String>,
    on_event: Option<EventCallback>,
    opens_pages: bool,
}

impl PlayerController {
    pub fn new() -> Self {
        Self {
            live: None,
            on_event: None,
            opens_pages: true,
        }
    }

    /// A controller that tracks lifecycle state without opening watch
    /// pages.
    pub fn detached() -> Self {
        Self {
            opens_pages: false,
            ..Self::new()
        }
    }

    pub fn set_on_event(&mut self, callback: impl Fn(&PlayerEvent) + Send + Sync + 'static) {
        self.on_event = Some(Box::new(callback));
    }

    /// Start playing a video. Any live player is destroyed first, so at
    /// most one exists at a time. A failure to open the watch page is
    /// logged; the controller still tracks the video as live.
    pub fn create(&mut self, video: &Video) {
        self.destroy();

        if self.opens_pages {
            if let Err(e) = open::that(video.watch_url()) {
                log::warn!("Failed to open watch page for {}: {}", video.id, e);
            }
        }

        log::info!("Playing: {} ({})", video.title, video.id);
        self.live = Some(video.id.clone());
        self.emit(PlayerEvent::Created {
            video_id: video.id.clone(),
        });
    }

    pub fn destroy(&mut self) {
        if let Some(video_id) = self.live.take() {
            self.emit(PlayerEvent::Destroyed { video_id });
        }
    }

    pub fn current_video_id(&self) -> Option<&str> {
        self.live.as_deref()
    }

    fn emit(&self, event: PlayerEvent) {
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}
