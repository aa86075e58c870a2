use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MandalaError, Result};

/// Ordered sections of a track, each with its own target look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Emergence,
    Curiosity,
    Buildup,
    Peak,
    Descent,
    Resolution,
}

impl Phase {
    /// Every phase in playback order.
    pub const ALL: [Phase; 6] = [
        Phase::Emergence,
        Phase::Curiosity,
        Phase::Buildup,
        Phase::Peak,
        Phase::Descent,
        Phase::Resolution,
    ];

    /// Phase that is active before any boundary has been crossed.
    pub const INITIAL: Phase = Phase::Emergence;

    /// Position of the phase within [`Phase::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Emergence => "emergence",
            Phase::Curiosity => "curiosity",
            Phase::Buildup => "buildup",
            Phase::Peak => "peak",
            Phase::Descent => "descent",
            Phase::Resolution => "resolution",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of a phase on the playback timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseBoundary {
    pub phase: Phase,
    pub start_seconds: f32,
}

impl PhaseBoundary {
    pub fn new(phase: Phase, start_seconds: f32) -> Self {
        Self {
            phase,
            start_seconds,
        }
    }
}

/// Validated, strictly increasing list of phase boundaries.
///
/// [`Phase::Emergence`] always owns the start of the timeline; when the
/// caller omits it, an implicit boundary at `0.0` is inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PhaseBoundary>", into = "Vec<PhaseBoundary>")]
pub struct PhaseBoundaries {
    boundaries: Vec<PhaseBoundary>,
}

impl PhaseBoundaries {
    pub fn new(boundaries: Vec<PhaseBoundary>) -> Result<Self> {
        let mut normalised = Vec::with_capacity(boundaries.len() + 1);
        if boundaries
            .first()
            .map(|first| first.phase != Phase::INITIAL)
            .unwrap_or(true)
        {
            normalised.push(PhaseBoundary::new(Phase::INITIAL, 0.0));
        }
        normalised.extend(boundaries);

        for boundary in &normalised {
            if !boundary.start_seconds.is_finite() || boundary.start_seconds < 0.0 {
                return Err(MandalaError::InvalidBoundaryTime {
                    phase: boundary.phase,
                    start: boundary.start_seconds,
                });
            }
            if boundary.phase == Phase::INITIAL && boundary.start_seconds != 0.0 {
                return Err(MandalaError::InvalidBoundaryTime {
                    phase: boundary.phase,
                    start: boundary.start_seconds,
                });
            }
        }

        for pair in normalised.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next.phase <= previous.phase {
                return Err(MandalaError::BoundaryOutOfOrder {
                    phase: next.phase,
                    previous: previous.phase,
                });
            }
            if next.start_seconds <= previous.start_seconds {
                return Err(MandalaError::NonIncreasingBoundary {
                    phase: next.phase,
                    start: next.start_seconds,
                    previous: previous.start_seconds,
                });
            }
        }

        Ok(Self {
            boundaries: normalised,
        })
    }

    /// Builds boundaries from `(phase, start)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Phase, f32)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(phase, start)| PhaseBoundary::new(phase, start))
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[PhaseBoundary] {
        &self.boundaries
    }

    /// Start time of `phase`, if the phase appears on this timeline.
    pub fn start_of(&self, phase: Phase) -> Option<f32> {
        self.boundaries
            .iter()
            .find(|boundary| boundary.phase == phase)
            .map(|boundary| boundary.start_seconds)
    }

    pub fn classify(&self, time_seconds: f32) -> Phase {
        classify(time_seconds, self)
    }
}

impl Default for PhaseBoundaries {
    fn default() -> Self {
        Self {
            boundaries: vec![
                PhaseBoundary::new(Phase::Emergence, 0.0),
                PhaseBoundary::new(Phase::Curiosity, 45.0),
                PhaseBoundary::new(Phase::Buildup, 80.0),
                PhaseBoundary::new(Phase::Peak, 130.0),
                PhaseBoundary::new(Phase::Descent, 180.0),
                PhaseBoundary::new(Phase::Resolution, 240.0),
            ],
        }
    }
}

impl TryFrom<Vec<PhaseBoundary>> for PhaseBoundaries {
    type Error = MandalaError;

    fn try_from(value: Vec<PhaseBoundary>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PhaseBoundaries> for Vec<PhaseBoundary> {
    fn from(value: PhaseBoundaries) -> Self {
        value.boundaries
    }
}

/// Maps a playback timestamp onto the active phase.
///
/// The latest boundary whose start is at or before `time_seconds` wins, so a
/// timestamp equal to a boundary belongs to the phase that boundary starts.
/// Times before every boundary (or NaN) fall back to [`Phase::INITIAL`].
pub fn classify(time_seconds: f32, boundaries: &PhaseBoundaries) -> Phase {
    boundaries
        .boundaries
        .iter()
        .rev()
        .find(|boundary| boundary.start_seconds <= time_seconds)
        .map(|boundary| boundary.phase)
        .unwrap_or(Phase::INITIAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse() -> PhaseBoundaries {
        PhaseBoundaries::from_pairs([
            (Phase::Emergence, 0.0),
            (Phase::Curiosity, 10.0),
            (Phase::Peak, 30.0),
        ])
        .unwrap()
    }

    #[test]
    fn boundary_timestamps_resolve_to_the_later_phase() {
        let boundaries = PhaseBoundaries::default();
        for boundary in boundaries.as_slice() {
            assert_eq!(classify(boundary.start_seconds, &boundaries), boundary.phase);
        }
    }

    #[test]
    fn times_between_boundaries_share_a_phase() {
        let boundaries = sparse();
        assert_eq!(classify(10.5, &boundaries), Phase::Curiosity);
        assert_eq!(classify(29.99, &boundaries), Phase::Curiosity);
        assert_eq!(classify(9.99, &boundaries), Phase::Emergence);
        assert_eq!(classify(1_000.0, &boundaries), Phase::Peak);
    }

    #[test]
    fn falls_back_to_initial_phase() {
        let boundaries = sparse();
        assert_eq!(classify(-3.0, &boundaries), Phase::Emergence);
        assert_eq!(classify(f32::NAN, &boundaries), Phase::Emergence);
    }

    #[test]
    fn inserts_implicit_emergence_boundary() {
        let boundaries = PhaseBoundaries::from_pairs([(Phase::Buildup, 5.0)]).unwrap();
        assert_eq!(boundaries.as_slice().len(), 2);
        assert_eq!(boundaries.start_of(Phase::Emergence), Some(0.0));
        assert_eq!(boundaries.classify(4.0), Phase::Emergence);
        assert_eq!(boundaries.classify(5.0), Phase::Buildup);
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let err = PhaseBoundaries::from_pairs([
            (Phase::Emergence, 0.0),
            (Phase::Curiosity, 20.0),
            (Phase::Buildup, 20.0),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            MandalaError::NonIncreasingBoundary {
                phase: Phase::Buildup,
                ..
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_phases_out_of_order() {
        let err = PhaseBoundaries::from_pairs([(Phase::Peak, 10.0), (Phase::Curiosity, 20.0)])
            .unwrap_err();
        assert!(matches!(err, MandalaError::BoundaryOutOfOrder { .. }));
    }

    #[test]
    fn rejects_invalid_start_times() {
        assert!(PhaseBoundaries::from_pairs([(Phase::Curiosity, -1.0)]).is_err());
        assert!(PhaseBoundaries::from_pairs([(Phase::Curiosity, f32::INFINITY)]).is_err());
        assert!(PhaseBoundaries::from_pairs([(Phase::Emergence, 3.0)]).is_err());
    }

    #[test]
    fn deserialises_through_validation() {
        let json = r#"[{"phase":"emergence","start_seconds":0.0},{"phase":"peak","start_seconds":12.5}]"#;
        let boundaries: PhaseBoundaries = serde_json::from_str(json).unwrap();
        assert_eq!(boundaries.classify(12.5), Phase::Peak);

        let bad = r#"[{"phase":"peak","start_seconds":12.5},{"phase":"descent","start_seconds":2.0}]"#;
        assert!(serde_json::from_str::<PhaseBoundaries>(bad).is_err());
    }
}
