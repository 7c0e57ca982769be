use glam::IVec2;

/// Position stored in a cell that has never been observed.
pub const EMPTY_POSITION: IVec2 = IVec2::new(i32::MIN, i32::MIN);

/// Upper bound on the number of feature matches consumed per frame.
pub const MAX_FEATURES: usize = 2000;

/// Fixed-point scale of the sine/cosine lookup tables.
pub const TRIG_SCALE: i32 = 10_000;

/// Initial weight of vacancy evidence along a ray, decaying by one per step.
pub const VACANCY_WEIGHT_START: u8 = 10;
/// Initial weight of occupancy evidence in the obstacle tail.
pub const OCCUPANCY_WEIGHT_START: u8 = 20;
/// Smallest weight a decaying update can reach.
pub const WEIGHT_FLOOR: u8 = 1;
/// Obstacle footprint depth is `range_mm / TAIL_DIVISOR` behind the surface.
pub const TAIL_DIVISOR: i32 = 3;

/// Footline sample value meaning "no boundary observed in this column".
pub const FOOTLINE_UNKNOWN: u32 = 0;
/// Vertical jump (as a fraction `1/n` of image height) that marks a footline outlier.
pub const FOOTLINE_OUTLIER_DIVISOR: u32 = 30;
