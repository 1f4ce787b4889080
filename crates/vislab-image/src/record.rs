//! Provenance records attached to every applied transformation.
//!
//! Each operation of the engine produces, next to the transformed pixels, a
//! [`Transformation`] record: the operation name, its display parameters and
//! one [`ChannelTransformation`] per processed channel. Detector families
//! with structured results (Hough, active contour) carry them as typed
//! variants of [`ChannelOutcome`]; overlay drawing commands are data for an
//! external renderer, never inputs to the engine.

use crate::image::Image;

/// A 2-D point in image coordinates, `x` along columns and `y` along rows.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Column coordinate.
    pub x: f32,
    /// Row coordinate.
    pub y: f32,
}

/// An overlay drawing command produced as a visualization side artifact.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawCmd {
    /// A line segment between two points.
    Line {
        /// First endpoint.
        p0: Point,
        /// Second endpoint.
        p1: Point,
    },
    /// A circle outline.
    Circle {
        /// Center of the circle.
        center: Point,
        /// Radius in pixels.
        radius: f32,
    },
    /// A set of highlighted pixels.
    Scatter {
        /// Highlighted `(row, col)` coordinates.
        points: Vec<(usize, usize)>,
        /// Display color as RGB.
        color: [u8; 3],
    },
}

/// One selected cell of the Hough line accumulator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoughLine {
    /// Distance parameter of the fitted line.
    pub rho: f32,
    /// Angle parameter of the fitted line, in radians.
    pub theta: f32,
    /// Number of edge pixels that voted for this cell.
    pub votes: usize,
}

/// Result of the Hough line accumulator for one channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoughLinesOutcome {
    /// Accumulator cells above the selection ratio, best fit first.
    pub best: Vec<HoughLine>,
}

/// One selected cell of the Hough circle accumulator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoughCircle {
    /// Radius of the fitted circle.
    pub radius: f32,
    /// Row coordinate of the center.
    pub center_y: f32,
    /// Column coordinate of the center.
    pub center_x: f32,
    /// Number of edge pixels that voted for this cell.
    pub votes: usize,
}

/// Result of the Hough circle accumulator for one channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoughCirclesOutcome {
    /// Accumulator cells above the selection ratio, best fit first.
    pub best: Vec<HoughCircle>,
}

/// Resumable state of the active contour engine.
///
/// `phi` labels every pixel as far-outside (+3), outer boundary (+1), inner
/// boundary (-1) or far-inside (-3); `lout` and `lin` list the boundary
/// coordinates. A later frame of a sequence is segmented by seeding the
/// evolution with this state instead of a fresh rectangle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourState {
    /// Distance threshold against the region statistic.
    pub threshold: f32,
    /// Mean intensity (one entry) or color (three entries) of the seed region.
    pub sigma: Vec<f32>,
    /// Level-set label array over the image domain.
    pub phi: Image<i32, 1>,
    /// Outer boundary coordinates, `(row, col)`.
    pub lout: Vec<(usize, usize)>,
    /// Inner boundary coordinates, `(row, col)`.
    pub lin: Vec<(usize, usize)>,
}

/// Result of one active contour evolution, with timing metrics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourOutcome {
    /// Wall time of this evolution, in milliseconds.
    pub duration_ms: u64,
    /// Accumulated wall time across the processed frames, in milliseconds.
    pub total_duration_ms: u64,
    /// Mean per-frame wall time, present in inductive mode only.
    pub mean_duration_ms: Option<f64>,
    /// Number of full passes until the fixpoint.
    pub passes: usize,
    /// Resumable state, the seed for the next frame of a sequence.
    pub state: ContourState,
}

/// Typed per-family result of a channel transformation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelOutcome {
    /// A plain filter with no results beyond the pixels.
    Plain,
    /// Best-fit cells of the Hough line accumulator.
    HoughLines(HoughLinesOutcome),
    /// Best-fit cells of the Hough circle accumulator.
    HoughCircles(HoughCirclesOutcome),
    /// Active contour evolution result.
    Contour(ContourOutcome),
}

impl ChannelOutcome {
    /// Human-readable key/value pairs meant for display.
    ///
    /// Internal state (level-set arrays, boundary lists) is reachable through
    /// the typed variants instead.
    pub fn public_results(&self) -> Vec<(String, String)> {
        match self {
            ChannelOutcome::Plain => vec![],
            ChannelOutcome::HoughLines(outcome) => outcome
                .best
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    (
                        format!("line {i}"),
                        format!(
                            "rho: {:.2}, theta: {:.2}, votes: {}",
                            line.rho, line.theta, line.votes
                        ),
                    )
                })
                .collect(),
            ChannelOutcome::HoughCircles(outcome) => outcome
                .best
                .iter()
                .enumerate()
                .map(|(i, circle)| {
                    (
                        format!("circle {i}"),
                        format!(
                            "radius: {:.2}, center: ({:.2}, {:.2}), votes: {}",
                            circle.radius, circle.center_x, circle.center_y, circle.votes
                        ),
                    )
                })
                .collect(),
            ChannelOutcome::Contour(outcome) => {
                let mut results = vec![
                    ("duration".to_string(), format!("{} ms", outcome.duration_ms)),
                    (
                        "total_duration".to_string(),
                        format!("{} ms", outcome.total_duration_ms),
                    ),
                    ("passes".to_string(), outcome.passes.to_string()),
                ];
                if let Some(mean) = outcome.mean_duration_ms {
                    results.push(("mean_duration".to_string(), format!("{mean:.2} ms")));
                }
                results
            }
        }
    }
}

/// Per-channel outcome of one applied transformation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelTransformation {
    /// Typed result of the operation on this channel.
    pub outcome: ChannelOutcome,
    /// Overlay drawing commands, in draw order.
    pub overlay: Vec<DrawCmd>,
}

impl ChannelTransformation {
    /// A result-less channel transformation.
    pub fn plain() -> Self {
        Self {
            outcome: ChannelOutcome::Plain,
            overlay: vec![],
        }
    }

    /// Human-readable key/value pairs meant for display.
    pub fn public_results(&self) -> Vec<(String, String)> {
        self.outcome.public_results()
    }
}

/// One applied operation: name, display parameters and per-channel outcomes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transformation {
    /// Operation name.
    pub name: String,
    /// Parameters defining the mathematical variant (kernel size, sigma, ...).
    pub major_inputs: Vec<(String, String)>,
    /// Secondary parameters (thresholds, ratios, padding policy).
    pub minor_inputs: Vec<(String, String)>,
    /// One entry per processed channel; whole-image operations carry one.
    pub channels: Vec<ChannelTransformation>,
}

impl Transformation {
    /// Create a record with the given name and display parameters.
    pub fn new(
        name: impl Into<String>,
        major_inputs: Vec<(String, String)>,
        minor_inputs: Vec<(String, String)>,
        channels: Vec<ChannelTransformation>,
    ) -> Self {
        Self {
            name: name.into(),
            major_inputs,
            minor_inputs,
            channels,
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Transformation {}:", self.name)?;
        if !self.major_inputs.is_empty() {
            writeln!(f, "\tMajor inputs:")?;
            for (k, v) in &self.major_inputs {
                writeln!(f, "\t\t{k}: {v}")?;
            }
        }
        match self.channels.len() {
            0 => {}
            1 => {
                writeln!(f, "\tResults:")?;
                for (k, v) in self.channels[0].public_results() {
                    writeln!(f, "\t\t{k}: {v}")?;
                }
            }
            _ => {
                for (i, channel) in self.channels.iter().enumerate() {
                    writeln!(f, "\tChannel {i} results:")?;
                    for (k, v) in channel.public_results() {
                        writeln!(f, "\t\t{k}: {v}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Render one display parameter as a key/value pair.
pub fn param(key: &str, value: impl std::fmt::Display) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn draw_commands_round_trip_through_json() {
        let cmd = DrawCmd::Circle {
            center: Point { x: 1.5, y: 2.0 },
            radius: 3.0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: DrawCmd = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contour_public_results_include_mean_only_when_present() {
        use crate::image::{Image, ImageSize};

        let state = ContourState {
            threshold: 10.0,
            sigma: vec![128.0],
            phi: Image::from_size_val(
                ImageSize {
                    width: 2,
                    height: 2,
                },
                3,
            )
            .unwrap(),
            lout: vec![],
            lin: vec![],
        };
        let mut outcome = ContourOutcome {
            duration_ms: 5,
            total_duration_ms: 15,
            mean_duration_ms: None,
            passes: 2,
            state,
        };

        let keys: Vec<String> = ChannelOutcome::Contour(outcome.clone())
            .public_results()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["duration", "total_duration", "passes"]);

        outcome.mean_duration_ms = Some(7.5);
        let keys: Vec<String> = ChannelOutcome::Contour(outcome)
            .public_results()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["duration", "total_duration", "passes", "mean_duration"]);
    }

    #[test]
    fn display_renders_name_and_inputs() {
        let tr = Transformation::new(
            "sobel",
            vec![param("direction", "vertical")],
            vec![param("padding", "replicate")],
            vec![ChannelTransformation::plain()],
        );
        let rendered = tr.to_string();
        assert!(rendered.contains("Transformation sobel:"));
        assert!(rendered.contains("direction: vertical"));
    }
}
