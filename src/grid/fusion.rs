//! Sensor model shared by both map variants.
//!
//! A ray is a sequence of steps from the robot (step 0) to the feature
//! (`target_step`), optionally followed by `tail_steps` past it. Each variant
//! supplies a `locate` function mapping a step to a storage index and the
//! world position sampled at that step. This is a crude model: free space
//! along the ray, and for obstacles a short occupied footprint behind the
//! surface.

use glam::IVec2;

use super::GridCell;
use super::cell::decayed_weight;
use crate::projection::ProjectedFeature;
use crate::types::{
    EMPTY_POSITION, FeatureMatch, MAX_FEATURES, OCCUPANCY_WEIGHT_START, TAIL_DIVISOR,
    VACANCY_WEIGHT_START,
};

/// At most [`MAX_FEATURES`] matches, plus how many were cut off.
#[inline]
pub fn cap_features(features: &[FeatureMatch]) -> (&[FeatureMatch], usize) {
    let kept = features.len().min(MAX_FEATURES);
    (&features[..kept], features.len() - kept)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayPlan {
    pub target_step: u32,
    pub tail_steps: u32,
}

impl RayPlan {
    /// Plan a ray of `target_step` steps, with an occupancy tail for obstacles beyond `min_range_mm`.
    pub fn new(
        feature: &ProjectedFeature,
        target_step: u32,
        cell_size_mm: i32,
        min_range_mm: i32,
    ) -> Self {
        Self {
            target_step,
            tail_steps: tail_length(feature, cell_size_mm, min_range_mm),
        }
    }

    pub fn without_tail(self) -> Self {
        Self {
            tail_steps: 0,
            ..self
        }
    }
}

/// Depth of the occupied footprint behind an obstacle (mm), zero for floor and close features.
pub fn tail_reach_mm(feature: &ProjectedFeature, min_range_mm: i32) -> i32 {
    if feature.on_ground || feature.range_mm <= min_range_mm {
        return 0;
    }
    (feature.range_mm / TAIL_DIVISOR).max(0)
}

/// Number of `cell_size_mm` steps written behind an obstacle.
pub fn tail_length(feature: &ProjectedFeature, cell_size_mm: i32, min_range_mm: i32) -> u32 {
    if cell_size_mm <= 0 {
        return 0;
    }
    (tail_reach_mm(feature, min_range_mm) / cell_size_mm) as u32
}

/// Walk `plan`, writing vacancy up to and including the target and occupancy along the tail.
///
/// Steps that `locate` cannot place, that land on the empty sentinel, or that
/// fall outside `cells` are skipped. Returns the number of cell writes.
pub fn fuse_ray<F>(cells: &mut [GridCell], plan: RayPlan, mut locate: F) -> usize
where
    F: FnMut(u32) -> Option<(usize, IVec2)>,
{
    let mut touched = 0;

    for step in 0..=plan.target_step {
        let Some((idx, world)) = locate(step).filter(|&(_, w)| w != EMPTY_POSITION) else {
            continue;
        };
        let Some(cell) = cells.get_mut(idx) else {
            continue;
        };
        cell.observe(world);
        cell.add_vacancy(decayed_weight(VACANCY_WEIGHT_START, step));
        touched += 1;
    }

    for k in 0..plan.tail_steps {
        let Some((idx, world)) =
            locate(plan.target_step + 1 + k).filter(|&(_, w)| w != EMPTY_POSITION)
        else {
            continue;
        };
        let Some(cell) = cells.get_mut(idx) else {
            continue;
        };
        cell.observe(world);
        cell.add_occupancy(decayed_weight(OCCUPANCY_WEIGHT_START, k));
        touched += 1;
    }

    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellState;

    fn feature(on_ground: bool, range_mm: i32) -> ProjectedFeature {
        ProjectedFeature {
            on_ground,
            range_mm,
            heading_degrees: 0,
            offset: IVec2::new(0, range_mm),
        }
    }

    #[test]
    fn tail_only_for_distant_obstacles() {
        assert_eq!(tail_length(&feature(false, 1200), 40, 300), 10);
        assert_eq!(tail_length(&feature(true, 1200), 40, 300), 0);
        assert_eq!(tail_length(&feature(false, 300), 40, 300), 0);
        assert_eq!(tail_reach_mm(&feature(false, 1200), 300), 400);
        assert_eq!(tail_reach_mm(&feature(true, 1200), 300), 0);
    }

    #[test]
    fn vacancy_weights_decay_along_ray() {
        let mut cells = vec![GridCell::EMPTY; 16];
        let plan = RayPlan {
            target_step: 12,
            tail_steps: 0,
        };
        let touched = fuse_ray(&mut cells, plan, |s| {
            Some((s as usize, IVec2::new(0, s as i32 * 10)))
        });

        assert_eq!(touched, 13);
        assert_eq!(cells[0].vacancy, 10);
        assert_eq!(cells[3].vacancy, 7);
        assert_eq!(cells[12].vacancy, 1);
        assert!(cells[13].is_empty());
        assert!(cells.iter().all(|c| c.occupancy == 0));
    }

    #[test]
    fn tail_writes_occupancy_past_target() {
        let mut cells = vec![GridCell::EMPTY; 16];
        let plan = RayPlan {
            target_step: 4,
            tail_steps: 3,
        };
        fuse_ray(&mut cells, plan, |s| Some((s as usize, IVec2::new(s as i32, 0))));

        for c in &cells[..=4] {
            assert_eq!(c.state(), CellState::Vacant);
        }
        assert_eq!(cells[5].occupancy, 20);
        assert_eq!(cells[6].occupancy, 19);
        assert_eq!(cells[7].occupancy, 18);
        assert!(cells[8].is_empty());
    }

    #[test]
    fn unplaceable_steps_are_skipped() {
        let mut cells = vec![GridCell::EMPTY; 4];
        let plan = RayPlan {
            target_step: 6,
            tail_steps: 2,
        };
        let touched = fuse_ray(&mut cells, plan, |s| {
            (s % 2 == 0).then_some((s as usize, IVec2::ZERO))
        });
        // steps 0 and 2 land, 4/6/8 are past the end of the buffer
        assert_eq!(touched, 2);
    }

    #[test]
    fn sentinel_samples_are_not_written() {
        let mut cells = vec![GridCell::EMPTY; 4];
        let plan = RayPlan {
            target_step: 2,
            tail_steps: 1,
        };
        let touched = fuse_ray(&mut cells, plan, |s| {
            let world = if s == 1 { EMPTY_POSITION } else { IVec2::new(0, s as i32) };
            Some((s as usize, world))
        });

        assert_eq!(touched, 3);
        assert_eq!(cells[1], GridCell::EMPTY);
        assert_eq!(cells[3].occupancy, 20);
    }

    #[test]
    fn caps_feature_count() {
        let features = vec![FeatureMatch::default(); MAX_FEATURES + 5];
        let (kept, truncated) = cap_features(&features);
        assert_eq!(kept.len(), MAX_FEATURES);
        assert_eq!(truncated, 5);
    }
}
