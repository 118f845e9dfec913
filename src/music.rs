//! Focus music: a track that plays only while a Work session runs.

use crate::audio::TrackPlayer;
use crate::models::{SessionMode, Settings};
use crate::session::TimerEvent;
use tracing::{debug, warn};

/// Something that can play and pause a track.
pub trait MusicOutput {
    fn play(&mut self);
    fn pause(&mut self);
}

/// Follows timer events and keeps the output playing exactly when music is
/// enabled and a Work session is running.
pub struct FocusMusic {
    output: Option<Box<dyn MusicOutput>>,
    enabled: bool,
    mode: SessionMode,
    running: bool,
    playing: bool,
}

impl FocusMusic {
    pub fn new(output: Option<Box<dyn MusicOutput>>, enabled: bool, mode: SessionMode) -> Self {
        Self {
            output,
            enabled,
            mode,
            running: false,
            playing: false,
        }
    }

    /// Opens the configured track. Without one, or when it can't be opened,
    /// the music stays silent.
    pub fn from_settings(settings: &Settings, mode: SessionMode) -> Self {
        let output = settings
            .music_track
            .as_deref()
            .and_then(|path| match TrackPlayer::open(path) {
                Ok(player) => Some(Box::new(player) as Box<dyn MusicOutput>),
                Err(e) => {
                    warn!(error = %e, "focus music unavailable");
                    None
                }
            });
        Self::new(output, settings.music_enabled, mode)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.sync();
    }

    pub fn handle(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::ModeChanged { mode, .. } => self.mode = *mode,
            TimerEvent::RunningChanged(running) => self.running = *running,
            TimerEvent::SessionCompleted { .. } => self.running = false,
            _ => return,
        }
        self.sync();
    }

    fn sync(&mut self) {
        let wanted = self.enabled && self.running && self.mode == SessionMode::Work;
        if wanted == self.playing {
            return;
        }
        let Some(output) = self.output.as_mut() else {
            return;
        };
        debug!(playing = wanted, "focus music");
        if wanted {
            output.play();
        } else {
            output.pause();
        }
        self.playing = wanted;
    }
}
