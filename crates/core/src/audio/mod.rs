/// Transport controls and playback position of the audio track driving the
/// animation. Decoding and output live behind this trait.
pub trait AudioPlayer {
    /// Playback position in seconds.
    fn current_time(&self) -> f32;
    fn play(&mut self);
    fn pause(&mut self);
    /// Stops playback and rewinds to the start of the track.
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Deterministic stand-in for an audio player, advanced explicitly by the
/// host. Used by the command line simulator and by tests.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    time_seconds: f32,
    playing: bool,
    duration_seconds: Option<f32>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock for a track of known length; playback stops at the end.
    pub fn with_duration(duration_seconds: f32) -> Self {
        Self {
            duration_seconds: Some(duration_seconds.max(0.0)),
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    /// Moves the playhead forward by `delta` while playing.
    pub fn advance(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        self.time_seconds = (self.time_seconds + delta).max(0.0);
        if let Some(duration) = self.duration_seconds {
            if self.time_seconds >= duration {
                self.time_seconds = duration;
                self.playing = false;
            }
        }
    }

    /// Jumps to an absolute position, in either direction.
    pub fn seek(&mut self, time_seconds: f32) {
        let time_seconds = time_seconds.max(0.0);
        self.time_seconds = match self.duration_seconds {
            Some(duration) => time_seconds.min(duration),
            None => time_seconds,
        };
    }
}

impl AudioPlayer for PlaybackClock {
    fn current_time(&self) -> f32 {
        self.time_seconds
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.reset();
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_playing() {
        let mut clock = PlaybackClock::new();
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 0.0);

        clock.play();
        clock.advance(1.5);
        assert_eq!(clock.current_time(), 1.5);

        clock.pause();
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 1.5);
        assert!(!clock.is_playing());
    }

    #[test]
    fn stop_rewinds() {
        let mut clock = PlaybackClock::new();
        clock.play();
        clock.advance(3.0);
        clock.stop();
        assert_eq!(clock.current_time(), 0.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn halts_at_track_end() {
        let mut clock = PlaybackClock::with_duration(2.0);
        clock.play();
        clock.advance(5.0);
        assert_eq!(clock.current_time(), 2.0);
        assert!(!clock.is_playing());

        clock.seek(0.5);
        assert_eq!(clock.current_time(), 0.5);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
    }
}
