//! Completion tones and the focus music track.
//!
//! On macOS the tone is synthesized with rodio and the track is decoded from
//! a local file. Other platforms ring the terminal bell and have no music.

use crate::models::SessionMode;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// How long the completion tone sounds.
pub const TONE_DURATION: Duration = Duration::from_millis(300);

/// Tone pitch in Hz; Work completion sounds higher than a break's.
pub fn tone_frequency(mode: SessionMode) -> f32 {
    if mode.is_break() {
        600.0
    } else {
        800.0
    }
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[cfg(target_os = "macos")]
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[cfg(target_os = "macos")]
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
    #[cfg(target_os = "macos")]
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("Failed to write terminal bell: {0}")]
    Bell(#[from] std::io::Error),
    #[error("Failed to open music track {0}: {1}")]
    Track(PathBuf, std::io::Error),
    #[error("Music playback is not supported on this platform")]
    MusicUnsupported,
}

#[cfg(target_os = "macos")]
mod backend {
    use super::{tone_frequency, AudioError, TONE_DURATION};
    use crate::models::SessionMode;
    use crate::music::MusicOutput;
    use rodio::source::{SineWave, Source};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    pub struct AudioPlayer {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl AudioPlayer {
        pub fn new() -> Result<Self, AudioError> {
            let (stream, handle) = OutputStream::try_default()?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }

        pub fn play_tone(&self, mode: SessionMode) -> Result<(), AudioError> {
            let sink = Sink::try_new(&self.handle)?;
            let tone = SineWave::new(tone_frequency(mode))
                .take_duration(TONE_DURATION)
                .fade_in(std::time::Duration::from_millis(10))
                .amplify(0.1);
            sink.append(tone);
            sink.detach(); // Play in background
            Ok(())
        }
    }

    /// A looping local track, paused until asked to play.
    pub struct TrackPlayer {
        _stream: OutputStream,
        sink: Sink,
    }

    impl TrackPlayer {
        pub fn open(path: &Path) -> Result<Self, AudioError> {
            let file =
                File::open(path).map_err(|e| AudioError::Track(path.to_path_buf(), e))?;
            let source = Decoder::new(BufReader::new(file))?;

            let (stream, handle) = OutputStream::try_default()?;
            let sink = Sink::try_new(&handle)?;
            sink.pause();
            sink.set_volume(0.5);
            sink.append(source.repeat_infinite());
            Ok(Self {
                _stream: stream,
                sink,
            })
        }
    }

    impl MusicOutput for TrackPlayer {
        fn play(&mut self) {
            self.sink.play();
        }

        fn pause(&mut self) {
            self.sink.pause();
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod backend {
    use super::AudioError;
    use crate::models::SessionMode;
    use std::io::Write;

    pub struct AudioPlayer;

    impl AudioPlayer {
        pub fn new() -> Result<Self, AudioError> {
            Ok(Self)
        }

        pub fn play_tone(&self, _mode: SessionMode) -> Result<(), AudioError> {
            let mut stdout = std::io::stdout();
            stdout.write_all(b"\x07")?;
            stdout.flush()?;
            Ok(())
        }
    }

    /// Stand-in for the macOS track player; opening always fails.
    pub struct TrackPlayer;

    impl TrackPlayer {
        pub fn open(_path: &std::path::Path) -> Result<Self, AudioError> {
            Err(AudioError::MusicUnsupported)
        }
    }

    impl crate::music::MusicOutput for TrackPlayer {
        fn play(&mut self) {}

        fn pause(&mut self) {}
    }
}

pub use backend::{AudioPlayer, TrackPlayer};
