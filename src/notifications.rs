//! Completion cues: a tone and a desktop notification.

use crate::audio::AudioPlayer;
use crate::models::{SessionMode, Settings, Statistics};
use notify_rust::Notification;
use std::thread;
use tracing::warn;

/// What a renderer hands to the sink when a session finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub mode: SessionMode,
    pub stats: Statistics,
    /// Localized notification title.
    pub title: String,
    /// The completion message shown in the UI.
    pub message: String,
}

/// Receives session completions.
pub trait NotificationSink {
    fn session_completed(&self, completion: &Completion, settings: &Settings);
}

/// Plays the tone and posts a system notification, each when enabled.
pub struct DesktopNotifier {
    audio: Option<AudioPlayer>,
}

impl DesktopNotifier {
    /// Audio is optional; without an output device only notifications fire.
    pub fn new() -> Self {
        let audio = AudioPlayer::new()
            .map_err(|e| warn!(error = %e, "audio unavailable"))
            .ok();
        Self { audio }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for DesktopNotifier {
    fn session_completed(&self, completion: &Completion, settings: &Settings) {
        if settings.sound_enabled {
            if let Some(ref audio) = self.audio {
                if let Err(e) = audio.play_tone(completion.mode) {
                    warn!(error = %e, "failed to play tone");
                }
            }
        }

        if settings.notifications_enabled {
            let (summary, body) = notification_content(completion);
            notify(summary, body);
        }
    }
}

/// Summary and body: the localized title over the message the UI shows.
fn notification_content(completion: &Completion) -> (String, String) {
    (completion.title.clone(), completion.message.clone())
}

/// Shows a notification on a background thread to avoid blocking.
fn notify(summary: String, body: String) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(&summary)
            .body(&body)
            .sound_name("default")
            .show()
        {
            warn!(error = %e, "failed to show notification");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn completion(mode: SessionMode, cycles: u32) -> Completion {
        Completion {
            mode,
            stats: Statistics {
                completed_cycles: cycles,
                ..Statistics::default()
            },
            title: "Focus session complete!".to_string(),
            message: "Great job! Time for a break.".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: RefCell<Vec<SessionMode>>,
    }

    impl NotificationSink for RecordingSink {
        fn session_completed(&self, completion: &Completion, _settings: &Settings) {
            self.seen.borrow_mut().push(completion.mode);
        }
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sink = RecordingSink::default();
        let dyn_sink: &dyn NotificationSink = &sink;
        dyn_sink.session_completed(&completion(SessionMode::LongBreak, 4), &Settings::default());
        assert_eq!(*sink.seen.borrow(), vec![SessionMode::LongBreak]);
    }

    #[test]
    fn test_notification_body_is_the_completion_message() {
        let (summary, body) = notification_content(&completion(SessionMode::Work, 3));
        assert_eq!(summary, "Focus session complete!");
        assert_eq!(body, "Great job! Time for a break.");
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_desktop_notification() {
        let notifier = DesktopNotifier::new();
        notifier.session_completed(&completion(SessionMode::Work, 1), &Settings::default());
    }
}
