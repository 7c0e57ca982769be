//! Ground-plane boundary ("footline") estimation.
//!
//! The upstream matcher reports, for every sampled image column, the row at
//! which the ground plane meets the first raised obstacle. Those samples are
//! sparse and noisy. [`GroundPlaneEstimator`] rejects isolated jumps, fills
//! the gaps by linear interpolation and converts each column's boundary to a
//! metric range under a flat-ground model.

use crate::camera::StereoCamera;
use crate::config::GroundConfig;
use crate::types::{FOOTLINE_OUTLIER_DIVISOR, FOOTLINE_UNKNOWN};

/// Per-column ground boundary, one entry every `stride` pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footline {
    stride: u32,
    rows: Vec<u32>,
    range_mm: Vec<i32>,
}

impl Footline {
    /// Footline with every column unknown.
    pub fn new(stride: u32, columns: usize) -> Self {
        Self {
            stride: stride.max(1),
            rows: vec![FOOTLINE_UNKNOWN; columns],
            range_mm: vec![0; columns],
        }
    }

    /// Footline at a constant row across an image `image_width` pixels wide.
    pub fn uniform(image_width: u32, stride: u32, row: u32) -> Self {
        let stride = stride.max(1);
        let columns = image_width.div_ceil(stride) as usize;
        Self {
            stride,
            rows: vec![row; columns],
            range_mm: vec![0; columns],
        }
    }

    pub fn from_rows(stride: u32, rows: Vec<u32>) -> Self {
        let range_mm = vec![0; rows.len()];
        Self {
            stride: stride.max(1),
            rows,
            range_mm,
        }
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    /// Range to the boundary per column this frame (mm), 0 where unknown.
    pub fn ranges(&self) -> &[i32] {
        &self.range_mm
    }

    /// Boundary row of the sampled column nearest to the left of `pixel_x`.
    pub fn row_at(&self, pixel_x: f32) -> u32 {
        if self.rows.is_empty() {
            return FOOTLINE_UNKNOWN;
        }
        let column = (pixel_x.max(0.0) as u32 / self.stride) as usize;
        self.rows[column.min(self.rows.len() - 1)]
    }

    /// A feature lies on the ground when it is below (larger row than) a known boundary.
    pub fn is_on_ground(&self, pixel_x: f32, pixel_y: f32) -> bool {
        let row = self.row_at(pixel_x);
        row != FOOTLINE_UNKNOWN && pixel_y > row as f32
    }
}

/// Turns raw footline samples into a complete boundary with per-column range.
#[derive(Debug, Clone)]
pub struct GroundPlaneEstimator {
    config: GroundConfig,
    footline: Footline,
    /// Last non-zero range seen in each column.
    last_range_mm: Vec<i32>,
    forward_motion_mm: i32,
}

impl GroundPlaneEstimator {
    pub fn new(config: GroundConfig) -> Self {
        let footline = Footline::new(config.footline_stride, 0);
        Self {
            config,
            footline,
            last_range_mm: Vec::new(),
            forward_motion_mm: 0,
        }
    }

    pub fn config(&self) -> &GroundConfig {
        &self.config
    }

    pub fn footline(&self) -> &Footline {
        &self.footline
    }

    /// Mean decrease in boundary range since the previous frame (mm).
    ///
    /// Only columns with a range in both frames contribute. Positive values
    /// mean the boundary came closer, i.e. the robot moved forward.
    pub fn forward_motion_mm(&self) -> i32 {
        self.forward_motion_mm
    }

    /// Number of sampled columns for an image `image_width` pixels wide.
    pub fn columns_for(&self, image_width: u32) -> usize {
        image_width.div_ceil(self.config.footline_stride.max(1)) as usize
    }

    /// Clean `samples`, fill gaps and compute ranges for this frame.
    pub fn update(&mut self, camera: &StereoCamera, samples: &[u32]) -> &Footline {
        let columns = self.columns_for(camera.image_width);
        if self.footline.len() != columns {
            if !self.footline.is_empty() {
                log::warn!(
                    "footline resized from {} to {} columns",
                    self.footline.len(),
                    columns
                );
            }
            self.footline = Footline::new(self.config.footline_stride, columns);
            self.last_range_mm = vec![0; columns];
        }
        if samples.len() != columns {
            log::debug!(
                "got {} footline samples for {} columns",
                samples.len(),
                columns
            );
        }

        let rows = &mut self.footline.rows;
        for (col, row) in rows.iter_mut().enumerate() {
            *row = match samples.get(col) {
                Some(&sample) if sample < camera.image_height => sample,
                _ => FOOTLINE_UNKNOWN,
            };
        }

        reject_outliers(rows, camera.image_height / FOOTLINE_OUTLIER_DIVISOR);
        fill_gaps(rows);
        self.update_ranges(camera);
        &self.footline
    }

    fn update_ranges(&mut self, camera: &StereoCamera) {
        let width = camera.image_width as i64;
        let height = camera.image_height as i64;
        let stride = self.footline.stride as i64;
        let max_disparity_px = (width * self.config.max_disparity_percent as i64) as f32 / 100.0;

        let mut motion_sum = 0i64;
        let mut motion_samples = 0i64;

        for (col, &row) in self.footline.rows.iter().enumerate() {
            let x = col as i64 * stride;
            let horizon = height * self.config.ground_row_percent as i64 / 100
                + (x - width / 2) * height * self.config.ground_slope_percent as i64
                    / (100 * width);
            let below = row as i64 - horizon;
            let depth = height - horizon;

            let range = if row == FOOTLINE_UNKNOWN || below <= 0 || depth <= 0 {
                None
            } else {
                let disparity = below as f32 * max_disparity_px / depth as f32;
                camera.range_from_disparity(disparity)
            };

            match range {
                Some(range) => {
                    let last = self.last_range_mm[col];
                    if last > 0 {
                        motion_sum += (last - range) as i64;
                        motion_samples += 1;
                    }
                    self.last_range_mm[col] = range;
                    self.footline.range_mm[col] = range;
                }
                None => self.footline.range_mm[col] = 0,
            }
        }

        self.forward_motion_mm = if motion_samples > 0 {
            (motion_sum / motion_samples) as i32
        } else {
            0
        };
    }
}

/// Drop one of every pair of consecutive known samples that jump by more than `max_jump` rows.
///
/// The smaller row (further from the camera) is discarded so a sharp border
/// is not bridged by later interpolation.
pub fn reject_outliers(rows: &mut [u32], max_jump: u32) {
    let mut prev: Option<usize> = None;
    for i in 0..rows.len() {
        if rows[i] == FOOTLINE_UNKNOWN {
            continue;
        }
        if let Some(p) = prev
            && rows[i].abs_diff(rows[p]) > max_jump
        {
            if rows[i] > rows[p] {
                rows[p] = FOOTLINE_UNKNOWN;
                prev = Some(i);
            } else {
                rows[i] = FOOTLINE_UNKNOWN;
            }
            continue;
        }
        prev = Some(i);
    }
}

/// Linearly interpolate unknown samples between known ones and hold the ends constant.
pub fn fill_gaps(rows: &mut [u32]) {
    let Some(first) = rows.iter().position(|&r| r != FOOTLINE_UNKNOWN) else {
        return;
    };
    let last = rows
        .iter()
        .rposition(|&r| r != FOOTLINE_UNKNOWN)
        .unwrap_or(first);

    let head = rows[first];
    rows[..first].fill(head);
    let tail = rows[last];
    rows[last + 1..].fill(tail);

    let mut a = first;
    while a < last {
        let b = a + 1 + rows[a + 1..=last]
            .iter()
            .position(|&r| r != FOOTLINE_UNKNOWN)
            .unwrap_or(last - a - 1);
        let (ra, rb) = (rows[a] as i64, rows[b] as i64);
        let span = (b - a) as i64;
        for j in a + 1..b {
            rows[j] = (ra + (rb - ra) * (j - a) as i64 / span) as u32;
        }
        a = b;
    }
}
