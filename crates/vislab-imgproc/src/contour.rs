//! Active contour segmentation: a two-phase level-set evolution over an
//! explicit narrow band.
//!
//! The state machine lives in [`ContourState`]: `phi` labels every pixel as
//! far-outside (+3), outer boundary (+1), inner boundary (-1) or far-inside
//! (-3), while `lout`/`lin` list the boundary coordinates. Each pass moves
//! boundary pixels across the region edge by comparing their distance to the
//! seed statistic against the threshold, then repairs the narrow band around
//! them. Evolution stops at a fixpoint, bounded by a pass ceiling, and the
//! final state is recorded as resumable internal results so a sequence of
//! frames can be segmented inductively.

use std::collections::HashSet;
use std::time::Instant;

use vislab_image::record::param;
use vislab_image::{
    ChannelOutcome, ChannelTransformation, ContourOutcome, ContourState, DrawCmd, Image,
    ImageDocument, ImageError, ImageSize, PixelData, Transformation,
};

use crate::cancel::CancelToken;
use crate::error::TransformError;

const FAR_OUTSIDE: i32 = 3;
const OUTER_BOUNDARY: i32 = 1;
const INNER_BOUNDARY: i32 = -1;
const FAR_INSIDE: i32 = -3;

const LOUT_COLOR: [u8; 3] = [255, 0, 0];
const LIN_COLOR: [u8; 3] = [255, 0, 255];

const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

#[inline]
fn phi_get(phi: &Image<i32, 1>, point: (usize, usize)) -> i32 {
    phi.as_slice()[point.0 * phi.cols() + point.1]
}

#[inline]
fn phi_set(phi: &mut Image<i32, 1>, point: (usize, usize), value: i32) {
    let cols = phi.cols();
    phi.as_slice_mut()[point.0 * cols + point.1] = value;
}

fn neighbors4(
    point: (usize, usize),
    size: ImageSize,
) -> impl Iterator<Item = (usize, usize)> {
    NEIGHBORS_4.iter().filter_map(move |&(dy, dx)| {
        let r = point.0 as isize + dy;
        let c = point.1 as isize + dx;
        (r >= 0 && c >= 0 && (r as usize) < size.height && (c as usize) < size.width)
            .then(|| (r as usize, c as usize))
    })
}

fn rect_boundary(y: (usize, usize), x: (usize, usize)) -> Vec<(usize, usize)> {
    let mut seen = HashSet::new();
    let mut points = Vec::new();
    let mut push = |p: (usize, usize)| {
        if seen.insert(p) {
            points.push(p);
        }
    };
    for c in x.0..=x.1 {
        push((y.0, c));
        push((y.1, c));
    }
    for r in y.0..=y.1 {
        push((r, x.0));
        push((r, x.1));
    }
    points
}

/// Seed the level-set state from a rectangular region.
///
/// `p1` and `p2` are opposite rectangle corners as `(row, col)`. The seed
/// statistic `sigma` is the mean intensity (or color) over the rectangle
/// interior; the rectangle border becomes the outer boundary, the ring one
/// pixel inside the inner boundary.
///
/// # Errors
///
/// Rejects rectangles that leave the image or span fewer than 4 pixels per
/// axis.
pub fn initial_state(
    data: &PixelData,
    p1: (usize, usize),
    p2: (usize, usize),
    threshold: f32,
) -> Result<ContourState, TransformError> {
    let size = data.size();
    let (y0, y1) = (p1.0.min(p2.0), p1.0.max(p2.0));
    let (x0, x1) = (p1.1.min(p2.1), p1.1.max(p2.1));
    if y1 >= size.height || x1 >= size.width || y1 - y0 < 3 || x1 - x0 < 3 {
        return Err(TransformError::InvalidRegion);
    }

    let channels = data.num_channels();
    let mut sigma = vec![0.0f32; channels];
    let mut count = 0usize;
    for r in y0..y1 {
        for c in x0..x1 {
            let pixel = data.pixel(r, c);
            for ch in 0..channels {
                sigma[ch] += pixel[ch];
            }
            count += 1;
        }
    }
    sigma.iter_mut().for_each(|v| *v /= count as f32);

    let mut phi = Image::from_size_val(size, FAR_OUTSIDE)?;
    for r in y0..=y1 {
        for c in x0..=x1 {
            phi_set(&mut phi, (r, c), OUTER_BOUNDARY);
        }
    }
    for r in y0 + 1..y1 {
        for c in x0 + 1..x1 {
            phi_set(&mut phi, (r, c), INNER_BOUNDARY);
        }
    }
    for r in y0 + 2..y1 - 1 {
        for c in x0 + 2..x1 - 1 {
            phi_set(&mut phi, (r, c), FAR_INSIDE);
        }
    }

    Ok(ContourState {
        threshold,
        sigma,
        phi,
        lout: rect_boundary((y0, y1), (x0, x1)),
        lin: rect_boundary((y0 + 1, y1 - 1), (x0 + 1, x1 - 1)),
    })
}

/// A boundary pixel joins the region: it moves to the inner list, far-outside
/// neighbors become the new outer boundary, and inner-boundary neighbors that
/// lost their last contact with the outside sink to far-inside.
fn switch_in(
    point: (usize, usize),
    phi: &mut Image<i32, 1>,
    lout: &mut Vec<(usize, usize)>,
    lin: &mut Vec<(usize, usize)>,
) {
    let size = phi.size();
    phi_set(phi, point, INNER_BOUNDARY);
    lin.push(point);
    for q in neighbors4(point, size) {
        match phi_get(phi, q) {
            FAR_OUTSIDE => {
                phi_set(phi, q, OUTER_BOUNDARY);
                lout.push(q);
            }
            INNER_BOUNDARY => {
                if !neighbors4(q, size).any(|n| phi_get(phi, n) > 0) {
                    phi_set(phi, q, FAR_INSIDE);
                }
            }
            _ => {}
        }
    }
}

/// Symmetric rule: a boundary pixel leaves the region.
fn switch_out(
    point: (usize, usize),
    phi: &mut Image<i32, 1>,
    lout: &mut Vec<(usize, usize)>,
    lin: &mut Vec<(usize, usize)>,
) {
    let size = phi.size();
    phi_set(phi, point, OUTER_BOUNDARY);
    lout.push(point);
    for q in neighbors4(point, size) {
        match phi_get(phi, q) {
            FAR_INSIDE => {
                phi_set(phi, q, INNER_BOUNDARY);
                lin.push(q);
            }
            OUTER_BOUNDARY => {
                if !neighbors4(q, size).any(|n| phi_get(phi, n) < 0) {
                    phi_set(phi, q, FAR_OUTSIDE);
                }
            }
            _ => {}
        }
    }
}

fn materialize(
    points: &[(usize, usize)],
    phi: &Image<i32, 1>,
    label: i32,
) -> Vec<(usize, usize)> {
    let mut seen = HashSet::new();
    points
        .iter()
        .copied()
        .filter(|&p| phi_get(phi, p) == label && seen.insert(p))
        .collect()
}

/// Evolve the level-set state against `data` until a fixpoint.
///
/// Returns the number of passes that moved at least one pixel. Points
/// promoted during a pass are processed within the same pass; the boundary
/// lists are re-materialized from `phi` after each pass, so `phi` stays the
/// single source of truth.
///
/// # Errors
///
/// Fails with [`TransformError::DidNotConverge`] when no fixpoint is reached
/// within `max_passes`, and [`TransformError::Cancelled`] when the token
/// fires between passes.
pub fn evolve(
    data: &PixelData,
    state: &mut ContourState,
    max_passes: usize,
    cancel: &CancelToken,
) -> Result<usize, TransformError> {
    let size = data.size();
    if state.phi.size() != size {
        return Err(TransformError::Image(ImageError::InvalidImageSize(
            state.phi.cols(),
            state.phi.rows(),
            size.width,
            size.height,
        )));
    }

    let threshold = state.threshold;
    let sigma = state.sigma.clone();
    let distance: Box<dyn Fn(usize, usize) -> f32 + '_> = match data {
        PixelData::Gray(img) => {
            let values = img.as_slice();
            let cols = img.cols();
            let mean = sigma[0];
            Box::new(move |r, c| (mean - values[r * cols + c]).abs())
        }
        PixelData::Rgb(img) => {
            let values = img.as_slice();
            let cols = img.cols();
            Box::new(move |r, c| {
                let base = (r * cols + c) * 3;
                sigma
                    .iter()
                    .zip(&values[base..base + 3])
                    .map(|(m, v)| (m - v) * (m - v))
                    .sum::<f32>()
                    .sqrt()
            })
        }
    };

    let ContourState {
        phi, lout, lin, ..
    } = state;

    for pass in 0..max_passes {
        if cancel.is_cancelled() {
            return Err(TransformError::Cancelled);
        }
        let mut changed = false;

        let mut i = 0;
        while i < lout.len() {
            let point = lout[i];
            i += 1;
            if phi_get(phi, point) != OUTER_BOUNDARY {
                continue;
            }
            if distance(point.0, point.1) < threshold {
                switch_in(point, phi, lout, lin);
                changed = true;
            }
        }

        let mut i = 0;
        while i < lin.len() {
            let point = lin[i];
            i += 1;
            if phi_get(phi, point) != INNER_BOUNDARY {
                continue;
            }
            if distance(point.0, point.1) >= threshold {
                switch_out(point, phi, lout, lin);
                changed = true;
            }
        }

        *lout = materialize(lout, phi, OUTER_BOUNDARY);
        *lin = materialize(lin, phi, INNER_BOUNDARY);
        log::debug!(
            "contour pass {pass}: lout={}, lin={}, changed={changed}",
            lout.len(),
            lin.len()
        );

        if !changed {
            return Ok(pass);
        }
    }

    Err(TransformError::DidNotConverge { passes: max_passes })
}

fn boundary_overlay(state: &ContourState) -> Vec<DrawCmd> {
    vec![
        DrawCmd::Scatter {
            points: state.lout.clone(),
            color: LOUT_COLOR,
        },
        DrawCmd::Scatter {
            points: state.lin.clone(),
            color: LIN_COLOR,
        },
    ]
}

/// Segment a document by evolving an active contour from a seed rectangle.
///
/// The pixel data passes through unchanged; the resumable level-set state and
/// the timing metrics live in the record.
pub fn active_outline(
    doc: &ImageDocument,
    threshold: f32,
    p1: (usize, usize),
    p2: (usize, usize),
    max_passes: usize,
    cancel: &CancelToken,
) -> Result<ImageDocument, TransformError> {
    let start = Instant::now();
    let mut state = initial_state(&doc.data, p1, p2, threshold)?;
    let passes = evolve(&doc.data, &mut state, max_passes, cancel)?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let overlay = boundary_overlay(&state);
    let outcome = ContourOutcome {
        duration_ms,
        total_duration_ms: duration_ms,
        mean_duration_ms: None,
        passes,
        state,
    };
    let record = Transformation::new(
        "active-outline",
        vec![
            param("threshold", threshold),
            param("p1", format!("({}, {})", p1.0, p1.1)),
            param("p2", format!("({}, {})", p2.0, p2.1)),
        ],
        vec![param("max_passes", max_passes)],
        vec![ChannelTransformation {
            outcome: ChannelOutcome::Contour(outcome),
            overlay,
        }],
    );
    Ok(doc.transform(format!("{}-outline", doc.name), doc.data.clone(), record))
}

/// Segment the next frame of a sequence from the previous frame's state.
///
/// The evolution is seeded from the contour outcome of `prev`'s last
/// transformation instead of a fresh rectangle; total and mean durations
/// accumulate across frames, keyed by `frame` (zero-based).
pub fn active_outline_inductive(
    frame: usize,
    prev: &ImageDocument,
    current: &ImageDocument,
    max_passes: usize,
    cancel: &CancelToken,
) -> Result<ImageDocument, TransformError> {
    let prev_outcome = prev
        .last_transformation()?
        .channels
        .iter()
        .find_map(|channel| match &channel.outcome {
            ChannelOutcome::Contour(outcome) => Some(outcome),
            _ => None,
        })
        .ok_or(TransformError::MissingContourState)?;

    let start = Instant::now();
    let mut state = prev_outcome.state.clone();
    let passes = evolve(&current.data, &mut state, max_passes, cancel)?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let total_duration_ms = prev_outcome.total_duration_ms + duration_ms;
    let mean_duration_ms = (total_duration_ms as f64 / (frame + 1) as f64 * 100.0).round() / 100.0;

    let overlay = boundary_overlay(&state);
    let outcome = ContourOutcome {
        duration_ms,
        total_duration_ms,
        mean_duration_ms: Some(mean_duration_ms),
        passes,
        state,
    };
    let record = Transformation::new(
        "active-outline-inductive",
        vec![param("frame", frame)],
        vec![param("max_passes", max_passes)],
        vec![ChannelTransformation {
            outcome: ChannelOutcome::Contour(outcome),
            overlay,
        }],
    );
    Ok(current.transform(format!("{}-outline", current.name), current.data.clone(), record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vislab_image::{synthetic, ImageFormat, MAX_COLOR};

    fn disc_doc(len: usize, radius: f32) -> ImageDocument {
        let size = ImageSize {
            width: len,
            height: len,
        };
        let center = (len as f32 / 2.0, len as f32 / 2.0);
        ImageDocument::new(
            "disc.pgm",
            ImageFormat::Pgm,
            PixelData::Gray(synthetic::disc_channel(size, center, radius)),
        )
    }

    fn contour_outcome(doc: &ImageDocument) -> &ContourOutcome {
        match &doc.last_transformation().unwrap().channels[0].outcome {
            ChannelOutcome::Contour(outcome) => outcome,
            other => panic!("expected contour outcome, got {other:?}"),
        }
    }

    #[test]
    fn initial_state_is_a_consistent_narrow_band() -> Result<(), TransformError> {
        let doc = disc_doc(20, 8.0);
        let state = initial_state(&doc.data, (5, 5), (12, 12), 50.0)?;

        for &p in &state.lout {
            assert_eq!(phi_get(&state.phi, p), OUTER_BOUNDARY);
        }
        for &p in &state.lin {
            assert_eq!(phi_get(&state.phi, p), INNER_BOUNDARY);
        }

        let phi = &state.phi;
        let label_count = |label: i32| phi.as_slice().iter().filter(|&&v| v == label).count();
        assert_eq!(label_count(OUTER_BOUNDARY), state.lout.len());
        assert_eq!(label_count(INNER_BOUNDARY), state.lin.len());

        // No far-region pixel touches the opposite side without a boundary
        // pixel in between.
        let size = phi.size();
        for r in 0..size.height {
            for c in 0..size.width {
                match phi_get(phi, (r, c)) {
                    FAR_OUTSIDE => {
                        assert!(neighbors4((r, c), size).all(|n| phi_get(phi, n) > 0));
                    }
                    FAR_INSIDE => {
                        assert!(neighbors4((r, c), size).all(|n| phi_get(phi, n) < 0));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    #[test]
    fn degenerate_seed_rectangle_is_rejected() {
        let doc = disc_doc(20, 8.0);
        assert!(matches!(
            initial_state(&doc.data, (0, 0), (1, 1), 50.0),
            Err(TransformError::InvalidRegion)
        ));
        assert!(matches!(
            initial_state(&doc.data, (5, 5), (25, 25), 50.0),
            Err(TransformError::InvalidRegion)
        ));
    }

    #[test]
    fn contour_settles_on_a_disc_boundary() -> Result<(), TransformError> {
        let doc = disc_doc(40, 10.0);
        let result = active_outline(&doc, 100.0, (16, 16), (24, 24), 200, &CancelToken::new())?;

        let outcome = contour_outcome(&result);
        let inside = |&(r, c): &(usize, usize)| {
            let dy = r as f32 - 20.0;
            let dx = c as f32 - 20.0;
            (dx * dx + dy * dy).sqrt() <= 10.0
        };

        assert!(!outcome.state.lin.is_empty());
        assert!(outcome.state.lin.iter().all(inside));
        assert!(!outcome.state.lout.is_empty());
        assert!(outcome.state.lout.iter().all(|p| !inside(p)));

        // Boundary lists agree with the intensity rule that stopped them.
        for &(r, c) in &outcome.state.lin {
            assert_eq!(doc.data.pixel(r, c), vec![MAX_COLOR]);
        }
        for &(r, c) in &outcome.state.lout {
            assert_eq!(doc.data.pixel(r, c), vec![0.0]);
        }
        Ok(())
    }

    #[test]
    fn identical_frame_is_a_fixpoint() -> Result<(), TransformError> {
        let doc = disc_doc(40, 10.0);
        let first = active_outline(&doc, 100.0, (16, 16), (24, 24), 200, &CancelToken::new())?;
        let prev_outcome = contour_outcome(&first).clone();

        // Same pixel data, no intensity change at all.
        let next = active_outline_inductive(1, &first, &first, 200, &CancelToken::new())?;
        let outcome = contour_outcome(&next);

        assert_eq!(outcome.passes, 0);
        assert_eq!(outcome.state.phi, prev_outcome.state.phi);
        let as_set = |points: &[(usize, usize)]| -> HashSet<_> { points.iter().copied().collect() };
        assert_eq!(as_set(&outcome.state.lout), as_set(&prev_outcome.state.lout));
        assert_eq!(as_set(&outcome.state.lin), as_set(&prev_outcome.state.lin));
        assert!(outcome.mean_duration_ms.is_some());
        Ok(())
    }

    #[test]
    fn pass_ceiling_reports_non_convergence() {
        let doc = disc_doc(40, 10.0);
        let res = active_outline(&doc, 100.0, (16, 16), (24, 24), 1, &CancelToken::new());
        assert!(matches!(
            res,
            Err(TransformError::DidNotConverge { passes: 1 })
        ));
    }

    #[test]
    fn cancelled_token_stops_the_evolution() {
        let doc = disc_doc(40, 10.0);
        let cancel = CancelToken::new();
        cancel.cancel();
        let res = active_outline(&doc, 100.0, (16, 16), (24, 24), 200, &cancel);
        assert!(matches!(res, Err(TransformError::Cancelled)));
    }

    #[test]
    fn color_frames_use_the_full_pixel_distance() -> Result<(), TransformError> {
        let len = 30;
        let size = ImageSize {
            width: len,
            height: len,
        };
        let channel = synthetic::disc_channel(size, (15.0, 15.0), 8.0);
        let rgb = Image::merge_channels(&[channel.clone(), channel.clone(), channel])?;
        let doc = ImageDocument::new("disc.ppm", ImageFormat::Ppm, PixelData::Rgb(rgb));

        let result = active_outline(&doc, 100.0, (12, 12), (18, 18), 200, &CancelToken::new())?;
        let outcome = contour_outcome(&result);

        assert_eq!(outcome.state.sigma.len(), 3);
        assert!(!outcome.state.lin.is_empty());
        Ok(())
    }
}
