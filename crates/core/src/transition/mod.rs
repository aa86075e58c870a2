use serde::{Deserialize, Serialize};

use crate::{MandalaError, Result};

/// Which transition animation accompanies the switch into a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Start transparent and small, then fade in while growing to size.
    FadeInAndGrow,
    /// Ramp straight from the current look to the (usually fainter and
    /// smaller) target.
    FadeOutAndShrink,
    /// Fade the current artwork out, then fade and grow the new one in.
    Dissolve,
}

/// Scheduler configuration shared by every phase change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_seconds: f32,
    /// Fraction of the target scale that growing transitions start from.
    pub grow_from: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.5,
            grow_from: 0.4,
        }
    }
}

/// The channels a transition drives directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelValues {
    pub scale: f32,
    pub alpha: f32,
}

impl ChannelValues {
    pub const fn new(scale: f32, alpha: f32) -> Self {
        Self { scale, alpha }
    }

    pub fn lerp(self, other: ChannelValues, t: f32) -> ChannelValues {
        ChannelValues {
            scale: self.scale + (other.scale - self.scale) * t,
            alpha: self.alpha + (other.alpha - self.alpha) * t,
        }
    }
}

/// One linear leg of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSegment {
    pub from: ChannelValues,
    pub to: ChannelValues,
    pub duration_seconds: f32,
}

impl TransitionSegment {
    pub fn new(from: ChannelValues, to: ChannelValues, duration_seconds: f32) -> Self {
        Self {
            from,
            to,
            duration_seconds: sanitize_seconds(duration_seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    FadeInAndGrow,
    FadeOutAndShrink,
    Dissolve,
    Custom,
}

/// A resumable, timed animation made of consecutive linear segments.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionJob {
    kind: TransitionKind,
    segments: Vec<TransitionSegment>,
    elapsed_seconds: f32,
    total_seconds: f32,
}

impl TransitionJob {
    fn with_segments(kind: TransitionKind, segments: Vec<TransitionSegment>) -> Self {
        let total_seconds = segments.iter().map(|s| s.duration_seconds).sum();
        Self {
            kind,
            segments,
            elapsed_seconds: 0.0,
            total_seconds,
        }
    }

    pub fn fade_in_and_grow(target: ChannelValues, grow_from: f32, duration_seconds: f32) -> Self {
        let from = ChannelValues::new(target.scale * grow_from, 0.0);
        Self::with_segments(
            TransitionKind::FadeInAndGrow,
            vec![TransitionSegment::new(from, target, duration_seconds)],
        )
    }

    pub fn fade_out_and_shrink(
        from: ChannelValues,
        target: ChannelValues,
        duration_seconds: f32,
    ) -> Self {
        Self::with_segments(
            TransitionKind::FadeOutAndShrink,
            vec![TransitionSegment::new(from, target, duration_seconds)],
        )
    }

    /// Fades `from` out over the first half, then grows the target in from
    /// `grow_from` of its scale over the second half.
    pub fn dissolve(
        from: ChannelValues,
        target: ChannelValues,
        grow_from: f32,
        duration_seconds: f32,
    ) -> Self {
        let half = sanitize_seconds(duration_seconds) * 0.5;
        let faded = ChannelValues::new(from.scale, 0.0);
        let dipped = ChannelValues::new(target.scale * grow_from, 0.0);
        Self::with_segments(
            TransitionKind::Dissolve,
            vec![
                TransitionSegment::new(from, faded, half),
                TransitionSegment::new(dipped, target, half),
            ],
        )
    }

    pub fn custom(segments: Vec<TransitionSegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(MandalaError::msg("custom transition needs at least one segment"));
        }
        Ok(Self::with_segments(TransitionKind::Custom, segments))
    }

    pub fn from_style(
        style: TransitionStyle,
        from: ChannelValues,
        target: ChannelValues,
        config: &TransitionConfig,
    ) -> Self {
        match style {
            TransitionStyle::FadeInAndGrow => {
                Self::fade_in_and_grow(target, config.grow_from, config.duration_seconds)
            }
            TransitionStyle::FadeOutAndShrink => {
                Self::fade_out_and_shrink(from, target, config.duration_seconds)
            }
            TransitionStyle::Dissolve => {
                Self::dissolve(from, target, config.grow_from, config.duration_seconds)
            }
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn start_values(&self) -> ChannelValues {
        self.segments
            .first()
            .map(|segment| segment.from)
            .unwrap_or(ChannelValues::new(1.0, 1.0))
    }

    pub fn end_values(&self) -> ChannelValues {
        self.segments
            .last()
            .map(|segment| segment.to)
            .unwrap_or(ChannelValues::new(1.0, 1.0))
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn total_seconds(&self) -> f32 {
        self.total_seconds
    }

    /// Overall progress in `[0, 1]`; zero-length jobs report complete.
    pub fn progress(&self) -> f32 {
        if self.total_seconds <= 0.0 {
            return 1.0;
        }
        (self.elapsed_seconds / self.total_seconds).clamp(0.0, 1.0)
    }

    /// Values at the job's current elapsed time.
    pub fn sample(&self) -> ChannelValues {
        if self.progress() >= 1.0 {
            return self.end_values();
        }

        let mut segment_start = 0.0;
        for segment in &self.segments {
            let segment_end = segment_start + segment.duration_seconds;
            if self.elapsed_seconds < segment_end {
                let t = ((self.elapsed_seconds - segment_start) / segment.duration_seconds)
                    .clamp(0.0, 1.0);
                return segment.from.lerp(segment.to, t);
            }
            segment_start = segment_end;
        }

        self.end_values()
    }
}

/// Runs at most one [`TransitionJob`]; a new job replaces the running one.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
    active: Option<TransitionJob>,
    output: Option<ChannelValues>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any running job and begins `job` from zero elapsed time.
    pub fn start(&mut self, mut job: TransitionJob) {
        if let Some(previous) = &self.active {
            tracing::debug!(
                kind = ?previous.kind(),
                progress = previous.progress(),
                "superseding running transition"
            );
        }
        job.elapsed_seconds = 0.0;
        tracing::debug!(kind = ?job.kind(), seconds = job.total_seconds(), "transition started");
        self.active = Some(job);
        self.output = None;
    }

    /// Advances the running job; returns `true` while it is still running.
    ///
    /// The finishing tick applies the exact end values and clears the job.
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        self.output = None;
        let Some(job) = self.active.as_mut() else {
            return false;
        };

        job.elapsed_seconds += sanitize_seconds(delta_seconds);
        if job.progress() >= 1.0 {
            self.output = Some(job.end_values());
            tracing::debug!(kind = ?job.kind(), "transition finished");
            self.active = None;
            return false;
        }

        self.output = Some(job.sample());
        true
    }

    /// Values produced by the most recent [`tick`](Self::tick), if a job ran.
    pub fn output(&self) -> Option<ChannelValues> {
        self.output
    }

    pub fn active(&self) -> Option<&TransitionJob> {
        self.active.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn cancel(&mut self) {
        self.active = None;
        self.output = None;
    }
}

fn sanitize_seconds(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn interpolates_linearly_and_finishes_on_exact_end_values() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionJob::fade_out_and_shrink(
            ChannelValues::new(1.0, 1.0),
            ChannelValues::new(0.5, 0.0),
            1.0,
        ));

        assert!(scheduler.tick(0.25));
        let output = scheduler.output().unwrap();
        assert!(approx(output.scale, 0.875));
        assert!(approx(output.alpha, 0.75));

        assert!(scheduler.tick(0.5));
        assert!(!scheduler.tick(0.3));
        assert_eq!(scheduler.output(), Some(ChannelValues::new(0.5, 0.0)));
        assert!(!scheduler.is_running());

        assert!(!scheduler.tick(0.1));
        assert_eq!(scheduler.output(), None);
    }

    #[test]
    fn starting_a_new_job_discards_the_old_one() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionJob::fade_out_and_shrink(
            ChannelValues::new(4.0, 1.0),
            ChannelValues::new(2.0, 0.0),
            2.0,
        ));
        scheduler.tick(1.0);

        scheduler.start(TransitionJob::fade_in_and_grow(
            ChannelValues::new(1.0, 1.0),
            0.5,
            1.0,
        ));
        assert_eq!(scheduler.active().unwrap().elapsed_seconds(), 0.0);

        assert!(scheduler.tick(0.5));
        let output = scheduler.output().unwrap();
        assert!(approx(output.scale, 0.75));
        assert!(approx(output.alpha, 0.5));
    }

    #[test]
    fn stalled_jobs_stay_running() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionJob::fade_in_and_grow(
            ChannelValues::new(1.0, 1.0),
            0.4,
            1.0,
        ));
        for _ in 0..10 {
            assert!(scheduler.tick(0.0));
        }
        assert!(scheduler.tick(-5.0));
        assert_eq!(scheduler.output(), Some(ChannelValues::new(0.4, 0.0)));
    }

    #[test]
    fn dissolve_fades_out_before_growing_in() {
        let job = TransitionJob::dissolve(
            ChannelValues::new(1.0, 1.0),
            ChannelValues::new(1.5, 1.0),
            0.4,
            2.0,
        );
        assert_eq!(job.kind(), TransitionKind::Dissolve);
        assert!(approx(job.total_seconds(), 2.0));

        let mut scheduler = TransitionScheduler::new();
        scheduler.start(job);

        scheduler.tick(0.5);
        let first_half = scheduler.output().unwrap();
        assert!(approx(first_half.alpha, 0.5));
        assert!(approx(first_half.scale, 1.0));

        scheduler.tick(0.5);
        let dipped = scheduler.output().unwrap();
        assert!(approx(dipped.alpha, 0.0));
        assert!(approx(dipped.scale, 0.6));

        scheduler.tick(0.5);
        let second_half = scheduler.output().unwrap();
        assert!(approx(second_half.alpha, 0.5));
        assert!(approx(second_half.scale, 1.05));

        assert!(!scheduler.tick(0.5));
        assert_eq!(scheduler.output(), Some(ChannelValues::new(1.5, 1.0)));
    }

    #[test]
    fn zero_length_jobs_finish_on_first_tick() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.start(TransitionJob::fade_in_and_grow(
            ChannelValues::new(2.0, 1.0),
            0.4,
            0.0,
        ));
        assert!(!scheduler.tick(0.0));
        assert_eq!(scheduler.output(), Some(ChannelValues::new(2.0, 1.0)));
    }

    #[test]
    fn custom_jobs_need_segments() {
        assert!(TransitionJob::custom(Vec::new()).is_err());

        let job = TransitionJob::custom(vec![
            TransitionSegment::new(ChannelValues::new(0.0, 0.0), ChannelValues::new(1.0, 1.0), 1.0),
            TransitionSegment::new(ChannelValues::new(1.0, 1.0), ChannelValues::new(3.0, 0.5), -2.0),
        ])
        .unwrap();
        assert_eq!(job.kind(), TransitionKind::Custom);
        assert_eq!(job.total_seconds(), 1.0);
        assert_eq!(job.end_values(), ChannelValues::new(3.0, 0.5));
    }

    #[test]
    fn styles_map_to_their_jobs() {
        let config = TransitionConfig::default();
        let from = ChannelValues::new(1.0, 1.0);
        let target = ChannelValues::new(0.8, 0.0);

        let job = TransitionJob::from_style(TransitionStyle::FadeOutAndShrink, from, target, &config);
        assert_eq!(job.start_values(), from);
        assert_eq!(job.end_values(), target);

        let job = TransitionJob::from_style(TransitionStyle::FadeInAndGrow, from, target, &config);
        assert_eq!(job.start_values().alpha, 0.0);
        assert!(approx(job.start_values().scale, 0.32));
    }
}
