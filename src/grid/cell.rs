//! Map cell with independent saturating occupancy and vacancy counters.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::types::{CellState, EMPTY_POSITION, WEIGHT_FLOOR};

/// One map cell.
///
/// `position` is a running blend of the world positions (mm) that landed in
/// the cell, so it drifts towards the centroid of its observations. A cell is
/// empty iff `position == EMPTY_POSITION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub position: IVec2,
    pub occupancy: u8,
    pub vacancy: u8,
}

impl Default for GridCell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl GridCell {
    pub const EMPTY: Self = Self {
        position: EMPTY_POSITION,
        occupancy: 0,
        vacancy: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position == EMPTY_POSITION
    }

    pub fn state(&self) -> CellState {
        if self.is_empty() {
            CellState::Unknown
        } else if self.occupancy > self.vacancy {
            CellState::Occupied
        } else {
            CellState::Vacant
        }
    }

    /// Blend a world sample halfway into the stored position.
    ///
    /// A sample equal to [`EMPTY_POSITION`] is not a world position and is ignored.
    pub fn observe(&mut self, sample: IVec2) {
        if sample == EMPTY_POSITION {
            return;
        }
        if self.is_empty() {
            self.position = sample;
        } else {
            self.position = halfway(self.position, sample);
        }
    }

    /// Add vacancy evidence. Once vacancy is saturated the evidence erodes occupancy instead.
    pub fn add_vacancy(&mut self, weight: u8) {
        if self.vacancy == u8::MAX {
            self.occupancy = self.occupancy.saturating_sub(1);
        } else {
            self.vacancy = self.vacancy.saturating_add(weight);
        }
    }

    /// Add occupancy evidence. Once occupancy is saturated the evidence erodes vacancy instead.
    pub fn add_occupancy(&mut self, weight: u8) {
        if self.occupancy == u8::MAX {
            self.vacancy = self.vacancy.saturating_sub(1);
        } else {
            self.occupancy = self.occupancy.saturating_add(weight);
        }
    }

    /// Merge another cell that now maps to the same index.
    pub fn merge(&mut self, other: &GridCell) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        self.position = halfway(self.position, other.position);
        self.occupancy = ((self.occupancy as u16 + other.occupancy as u16) / 2) as u8;
        self.vacancy = ((self.vacancy as u16 + other.vacancy as u16) / 2) as u8;
    }
}

/// `old + (sample - old) / 2`, truncating towards `old`.
#[inline]
fn halfway(old: IVec2, sample: IVec2) -> IVec2 {
    let blend = |a: i32, b: i32| (a as i64 + (b as i64 - a as i64) / 2) as i32;
    IVec2::new(blend(old.x, sample.x), blend(old.y, sample.y))
}

/// Evidence weight `step` cells into a ray: `start - step`, never below the floor.
#[inline]
pub fn decayed_weight(start: u8, step: u32) -> u8 {
    let weight = (start as u32).saturating_sub(step);
    weight.max(WEIGHT_FLOOR as u32) as u8
}
