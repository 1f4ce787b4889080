//! Parameter-space voting accumulators for lines and circles.
//!
//! Both accumulators consume a binary edge channel (any value above zero is
//! an edge pixel) and vote over a discretized parameter grid. Accumulation
//! runs as a parallel reduction: edge-point chunks fill partial accumulators
//! that are summed before the selection step. The dominant cost is
//! `O(|parameter grid| * |edge points|)`, so the outer loops observe the
//! cancellation token.

use rayon::prelude::*;

use vislab_image::record::param;
use vislab_image::{
    ChannelOutcome, ChannelTransformation, DrawCmd, HoughCircle, HoughCirclesOutcome, HoughLine,
    HoughLinesOutcome, Image, ImageDocument, ImageSize, LinRange, Point, Transformation,
};

use crate::cancel::CancelToken;
use crate::error::TransformError;

/// Parameters of the Hough line accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct HoughLinesParams {
    /// Sampled line angles, in degrees.
    pub theta_degrees: Vec<f32>,
    /// Sampled distance axis.
    pub rho: LinRange,
    /// Maximum point-to-line distance for a vote.
    pub threshold: f32,
    /// Fraction of the best cell's votes a cell needs to be selected.
    pub most_fitted_ratio: f32,
}

/// Parameters of the Hough circle accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct HoughCirclesParams {
    /// Sampled radius axis.
    pub radius: LinRange,
    /// Sampled center column axis.
    pub center_x: LinRange,
    /// Sampled center row axis.
    pub center_y: LinRange,
    /// Maximum squared-distance residual for a vote.
    pub threshold: f32,
    /// Fraction of the best cell's votes a cell needs to be selected.
    pub most_fitted_ratio: f32,
}

fn edge_points(channel: &Image<f32, 1>) -> Vec<(f32, f32)> {
    let cols = channel.cols();
    channel
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > 0.0)
        .map(|(i, _)| ((i / cols) as f32, (i % cols) as f32))
        .collect()
}

/// The two points where the line `(rho, theta)` crosses the image boundary.
///
/// A vanishing angle gives the constant-column segment directly. On the
/// general path, a line crossing the boundary at anything other than exactly
/// two points signals a degenerate parameter choice and fails.
fn border_points(rho: f32, theta: f32, size: ImageSize) -> Result<DrawCmd, TransformError> {
    if theta.abs() < 1e-8 {
        return Ok(DrawCmd::Line {
            p0: Point {
                x: rho.round(),
                y: 0.0,
            },
            p1: Point {
                x: rho.round(),
                y: (size.height - 1) as f32,
            },
        });
    }

    let max_y = (size.height - 1) as f32;
    let max_x = (size.width - 1) as f32;
    let (sin_t, cos_t) = theta.sin_cos();

    let x_top = rho / cos_t;
    let x_bottom = (rho - max_y * sin_t) / cos_t;
    let y_left = rho / sin_t;
    let y_right = (rho - max_x * cos_t) / sin_t;

    let mut points = Vec::with_capacity(2);
    if 0.0 < x_top && x_top < max_x {
        points.push(Point { x: x_top, y: 0.0 });
    }
    if 0.0 < x_bottom && x_bottom < max_x {
        points.push(Point {
            x: x_bottom,
            y: max_y,
        });
    }
    if 0.0 < y_left && y_left < max_y {
        points.push(Point { x: 0.0, y: y_left });
    }
    if 0.0 < y_right && y_right < max_y {
        points.push(Point {
            x: max_x,
            y: y_right,
        });
    }

    match points.as_slice() {
        [p0, p1] => Ok(DrawCmd::Line { p0: *p0, p1: *p1 }),
        other => Err(TransformError::LineIntersections {
            found: other.len(),
            rho,
            theta,
        }),
    }
}

/// Hough line accumulator over one edge channel.
///
/// Votes count edge pixels with `|rho - y*sin(theta) - x*cos(theta)|` below
/// the threshold; cells above `most_fitted_ratio` of the maximum are
/// selected and rendered as boundary-to-boundary line overlays.
pub fn hough_lines_channel(
    channel: &Image<f32, 1>,
    params: &HoughLinesParams,
    cancel: &CancelToken,
) -> Result<(HoughLinesOutcome, Vec<DrawCmd>), TransformError> {
    let rhos = params.rho.to_vec();
    let trig: Vec<(f32, f32)> = params
        .theta_degrees
        .iter()
        .map(|deg| deg.to_radians().sin_cos())
        .collect();
    let cells = rhos.len() * trig.len();
    let points = edge_points(channel);
    log::debug!(
        "hough lines: {} edge points over {} cells",
        points.len(),
        cells
    );

    let votes = points
        .par_chunks(1024)
        .fold(
            || vec![0usize; cells],
            |mut local, chunk| {
                if cancel.is_cancelled() {
                    return local;
                }
                for &(y, x) in chunk {
                    for (j, &(sin_t, cos_t)) in trig.iter().enumerate() {
                        let projected = y * sin_t + x * cos_t;
                        for (i, &rho) in rhos.iter().enumerate() {
                            if (rho - projected).abs() < params.threshold {
                                local[i * trig.len() + j] += 1;
                            }
                        }
                    }
                }
                local
            },
        )
        .reduce(
            || vec![0usize; cells],
            |mut a, b| {
                a.iter_mut().zip(b.iter()).for_each(|(a, b)| *a += b);
                a
            },
        );
    if cancel.is_cancelled() {
        return Err(TransformError::Cancelled);
    }

    let max_votes = votes.iter().copied().max().unwrap_or(0);
    let cutoff = params.most_fitted_ratio * max_votes as f32;

    let mut best = Vec::new();
    let mut overlay = Vec::new();
    for (cell, &count) in votes.iter().enumerate() {
        if count as f32 > cutoff {
            let rho = rhos[cell / trig.len()];
            let theta = params.theta_degrees[cell % trig.len()].to_radians();
            overlay.push(border_points(rho, theta, channel.size())?);
            best.push(HoughLine {
                rho,
                theta,
                votes: count,
            });
        }
    }
    best.sort_by(|a, b| b.votes.cmp(&a.votes));

    Ok((HoughLinesOutcome { best }, overlay))
}

/// Hough circle accumulator over one edge channel.
///
/// Votes count edge pixels with `||p - center|^2 - r^2|` below the
/// threshold; cells above `most_fitted_ratio` of the maximum are selected
/// and rendered as circle overlays.
pub fn hough_circles_channel(
    channel: &Image<f32, 1>,
    params: &HoughCirclesParams,
    cancel: &CancelToken,
) -> Result<(HoughCirclesOutcome, Vec<DrawCmd>), TransformError> {
    let radii = params.radius.to_vec();
    let centers_y = params.center_y.to_vec();
    let centers_x = params.center_x.to_vec();
    let per_radius = centers_y.len() * centers_x.len();
    let cells = radii.len() * per_radius;
    let points = edge_points(channel);
    log::debug!(
        "hough circles: {} edge points over {} cells",
        points.len(),
        cells
    );

    let votes = points
        .par_chunks(256)
        .fold(
            || vec![0usize; cells],
            |mut local, chunk| {
                if cancel.is_cancelled() {
                    return local;
                }
                for &(y, x) in chunk {
                    for (i, &radius) in radii.iter().enumerate() {
                        let r_sq = radius * radius;
                        for (j, &cy) in centers_y.iter().enumerate() {
                            let dy_sq = (y - cy) * (y - cy);
                            for (k, &cx) in centers_x.iter().enumerate() {
                                let dx_sq = (x - cx) * (x - cx);
                                if (dy_sq + dx_sq - r_sq).abs() < params.threshold {
                                    local[i * per_radius + j * centers_x.len() + k] += 1;
                                }
                            }
                        }
                    }
                }
                local
            },
        )
        .reduce(
            || vec![0usize; cells],
            |mut a, b| {
                a.iter_mut().zip(b.iter()).for_each(|(a, b)| *a += b);
                a
            },
        );
    if cancel.is_cancelled() {
        return Err(TransformError::Cancelled);
    }

    let max_votes = votes.iter().copied().max().unwrap_or(0);
    let cutoff = params.most_fitted_ratio * max_votes as f32;

    let mut best = Vec::new();
    let mut overlay = Vec::new();
    for (cell, &count) in votes.iter().enumerate() {
        if count as f32 > cutoff {
            let radius = radii[cell / per_radius];
            let center_y = centers_y[(cell % per_radius) / centers_x.len()];
            let center_x = centers_x[cell % centers_x.len()];
            overlay.push(DrawCmd::Circle {
                center: Point {
                    x: center_x,
                    y: center_y,
                },
                radius,
            });
            best.push(HoughCircle {
                radius,
                center_y,
                center_x,
                votes: count,
            });
        }
    }
    best.sort_by(|a, b| b.votes.cmp(&a.votes));

    Ok((HoughCirclesOutcome { best }, overlay))
}

/// Hough line detection over every channel of a document.
///
/// The pixel data passes through unchanged; the fitted lines live in the
/// record and its overlay.
pub fn hough_lines(
    doc: &ImageDocument,
    params: &HoughLinesParams,
    cancel: &CancelToken,
) -> Result<ImageDocument, TransformError> {
    let (data, channels) = doc.apply_over_channels(|channel| {
        let (outcome, overlay) = hough_lines_channel(channel, params, cancel)?;
        Ok::<_, TransformError>((
            channel.clone(),
            ChannelTransformation {
                outcome: ChannelOutcome::HoughLines(outcome),
                overlay,
            },
        ))
    })?;

    let record = Transformation::new(
        "hough-lines",
        vec![
            param("rho", params.rho),
            param("thetas", params.theta_degrees.len()),
        ],
        vec![
            param("threshold", params.threshold),
            param("most_fitted_ratio", params.most_fitted_ratio),
        ],
        channels,
    );
    Ok(doc.transform(format!("{}-hough-lines", doc.name), data, record))
}

/// Hough circle detection over every channel of a document.
pub fn hough_circles(
    doc: &ImageDocument,
    params: &HoughCirclesParams,
    cancel: &CancelToken,
) -> Result<ImageDocument, TransformError> {
    let (data, channels) = doc.apply_over_channels(|channel| {
        let (outcome, overlay) = hough_circles_channel(channel, params, cancel)?;
        Ok::<_, TransformError>((
            channel.clone(),
            ChannelTransformation {
                outcome: ChannelOutcome::HoughCircles(outcome),
                overlay,
            },
        ))
    })?;

    let record = Transformation::new(
        "hough-circles",
        vec![
            param("radius", params.radius),
            param("center_x", params.center_x),
            param("center_y", params.center_y),
        ],
        vec![
            param("threshold", params.threshold),
            param("most_fitted_ratio", params.most_fitted_ratio),
        ],
        channels,
    );
    Ok(doc.transform(format!("{}-hough-circles", doc.name), data, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vislab_image::MAX_COLOR;

    #[test]
    fn recovers_a_vertical_line() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        // A single bright column at x = 10: rho = 10 at theta = 0.
        let channel =
            Image::from_size_fn(size, |_, col, _| if col == 10 { MAX_COLOR } else { 0.0 })?;

        let params = HoughLinesParams {
            theta_degrees: vec![0.0, 45.0, 90.0],
            rho: LinRange::new(0.0, 19.0, 20)?,
            threshold: 0.5,
            most_fitted_ratio: 0.9,
        };
        let (outcome, overlay) = hough_lines_channel(&channel, &params, &CancelToken::new())?;

        assert_eq!(outcome.best.len(), 1);
        let line = outcome.best[0];
        assert_eq!(line.rho, 10.0);
        assert_eq!(line.theta, 0.0);
        assert_eq!(line.votes, 20);

        // The vanishing angle maps to the constant-column segment.
        match &overlay[0] {
            DrawCmd::Line { p0, p1 } => {
                assert_eq!((p0.x, p0.y), (10.0, 0.0));
                assert_eq!((p1.x, p1.y), (10.0, 19.0));
            }
            other => panic!("expected a line overlay, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn recovers_a_ring() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 21,
            height: 21,
        };
        // A one-pixel ring of radius 5 centered on (10, 10).
        let channel = Image::from_size_fn(size, |row, col, _| {
            let dy = row as f32 - 10.0;
            let dx = col as f32 - 10.0;
            if ((dx * dx + dy * dy).sqrt() - 5.0).abs() < 0.5 {
                MAX_COLOR
            } else {
                0.0
            }
        })?;

        let params = HoughCirclesParams {
            radius: LinRange::new(3.0, 7.0, 5)?,
            center_x: LinRange::new(8.0, 12.0, 5)?,
            center_y: LinRange::new(8.0, 12.0, 5)?,
            threshold: 6.0,
            most_fitted_ratio: 0.99,
        };
        let (outcome, overlay) = hough_circles_channel(&channel, &params, &CancelToken::new())?;

        assert!(!outcome.best.is_empty());
        let top_votes = outcome.best[0].votes;
        let fitted = outcome
            .best
            .iter()
            .find(|c| (c.radius, c.center_y, c.center_x) == (5.0, 10.0, 10.0))
            .expect("true circle not recovered");
        assert_eq!(fitted.votes, top_votes);
        assert_eq!(outcome.best.len(), overlay.len());
        Ok(())
    }

    #[test]
    fn degenerate_intersections_are_fatal() {
        let size = ImageSize {
            width: 10,
            height: 10,
        };
        // rho far outside the image: no boundary intersection at all.
        let res = border_points(40.0, std::f32::consts::FRAC_PI_4, size);
        assert!(matches!(
            res,
            Err(TransformError::LineIntersections { found: 0, .. })
        ));
    }

    #[test]
    fn cancelled_token_aborts_the_accumulator() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 8,
            height: 8,
        };
        let channel = Image::from_size_val(size, MAX_COLOR)?;
        let params = HoughLinesParams {
            theta_degrees: vec![0.0, 90.0],
            rho: LinRange::new(0.0, 7.0, 8)?,
            threshold: 0.5,
            most_fitted_ratio: 0.9,
        };

        let cancel = CancelToken::new();
        cancel.cancel();
        let res = hough_lines_channel(&channel, &params, &cancel);
        assert!(matches!(res, Err(TransformError::Cancelled)));
        Ok(())
    }

    #[test]
    fn empty_channel_selects_nothing() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 10,
            height: 10,
        };
        let channel = Image::from_size_val(size, 0.0)?;
        let params = HoughLinesParams {
            theta_degrees: vec![0.0, 90.0],
            rho: LinRange::new(0.0, 9.0, 10)?,
            threshold: 0.5,
            most_fitted_ratio: 0.5,
        };

        let (outcome, overlay) = hough_lines_channel(&channel, &params, &CancelToken::new())?;
        assert!(outcome.best.is_empty());
        assert!(overlay.is_empty());
        Ok(())
    }
}
