use std::path::Path;

use glam::IVec2;
use image::{Rgb, RgbImage};

use crate::grid::{GridCell, OccupancyMap};
use crate::types::{CellState, MapError};

pub const COLOR_UNKNOWN: [u8; 3] = [0, 0, 0];
pub const COLOR_VACANT: [u8; 3] = [0, 255, 0];
pub const COLOR_OCCUPIED: [u8; 3] = [0, 0, 255];

pub fn cell_color(cell: Option<&GridCell>) -> [u8; 3] {
    match cell.map_or(CellState::Unknown, GridCell::state) {
        CellState::Unknown => COLOR_UNKNOWN,
        CellState::Vacant => COLOR_VACANT,
        CellState::Occupied => COLOR_OCCUPIED,
    }
}

/// Nearest-neighbour resample of the map's square extent into a `width` x `height` RGB image.
///
/// The image is centered on the map center. Like a map preview, the top row
/// of the image is the far +Y edge of the map.
pub fn render<M: OccupancyMap + ?Sized>(map: &M, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgb(cell_color(map.cell_at_world(pixel_to_world(map, x, y, width, height))));
    }
    img
}

/// Like [`render`], writing packed RGB rows into a caller-owned buffer of `width * height * 3` bytes.
pub fn render_into<M: OccupancyMap + ?Sized>(
    map: &M,
    width: u32,
    height: u32,
    out: &mut [u8],
) -> Result<(), MapError> {
    let expected = width as usize * height as usize * 3;
    if out.len() != expected {
        return Err(MapError::BufferSize {
            expected,
            actual: out.len(),
        });
    }
    let row_bytes = width as usize * 3;
    if row_bytes == 0 {
        return Ok(());
    }

    let fill_row = |y: usize, row: &mut [u8]| {
        for (x, px) in row.chunks_exact_mut(3).enumerate() {
            let world = pixel_to_world(map, x as u32, y as u32, width, height);
            px.copy_from_slice(&cell_color(map.cell_at_world(world)));
        }
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));
    }
    #[cfg(not(feature = "rayon"))]
    for (y, row) in out.chunks_mut(row_bytes).enumerate() {
        fill_row(y, row);
    }
    Ok(())
}

/// Render and write a PNG.
pub fn save_png<M: OccupancyMap + ?Sized>(
    map: &M,
    width: u32,
    height: u32,
    path: impl AsRef<Path>,
) -> Result<(), MapError> {
    let path = path.as_ref();
    render(map, width, height).save(path)?;
    log::debug!("saved {width}x{height} map rendering to {}", path.display());
    Ok(())
}

/// World position (mm) at the middle of an image pixel.
fn pixel_to_world<M: OccupancyMap + ?Sized>(
    map: &M,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> IVec2 {
    let half = map.half_extent_mm() as i64;
    let center = map.center();
    let across = |i: u32, n: u32| ((2 * i as i64 + 1) * half / n.max(1) as i64) as i32;
    IVec2::new(
        center.x - half as i32 + across(x, width),
        center.y + half as i32 - across(y, height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, GridConfig};
    use crate::grid::GridMap;
    use crate::ground::Footline;
    use crate::types::{FeatureMatch, RobotPose};

    fn small_map() -> GridMap {
        let config = GridConfig {
            cell_size_mm: 50,
            dimension_cells: 64,
            ..Default::default()
        };
        GridMap::new(config, &CameraConfig::default()).unwrap()
    }

    #[test]
    fn unallocated_map_renders_black() {
        let img = render(&small_map(), 16, 8);
        assert_eq!((img.width(), img.height()), (16, 8));
        assert!(img.pixels().all(|p| p.0 == COLOR_UNKNOWN));
    }

    #[test]
    fn obstacle_ray_is_green_then_blue_above_robot() {
        let mut map = small_map();
        let footline = Footline::uniform(320, 4, 150);
        // 1284 mm straight ahead with an occupied tail behind it
        map.update(
            &[FeatureMatch::new(160.0, 100.0, 20.0)],
            &footline,
            RobotPose::default(),
        );

        let img = render(&map, 64, 64);
        let column: Vec<[u8; 3]> = (0..64).map(|y| img.get_pixel(32, y).0).collect();
        // image rows grow downward, so the ray runs from row 31 upward
        assert_eq!(column[31], COLOR_VACANT);
        assert_eq!(column[10], COLOR_VACANT);
        assert_eq!(column[3], COLOR_OCCUPIED);
        assert_eq!(column[40], COLOR_UNKNOWN);
        assert_eq!(img.get_pixel(0, 0).0, COLOR_UNKNOWN);
    }

    #[test]
    fn render_into_matches_render() {
        let mut map = small_map();
        let footline = Footline::uniform(320, 4, 150);
        map.update(
            &[FeatureMatch::new(100.0, 100.0, 20.0)],
            &footline,
            RobotPose::default(),
        );

        let mut buf = vec![0u8; 32 * 24 * 3];
        render_into(&map, 32, 24, &mut buf).unwrap();
        assert_eq!(buf, render(&map, 32, 24).into_raw());

        let mut short = vec![0u8; 10];
        assert!(matches!(
            render_into(&map, 32, 24, &mut short),
            Err(MapError::BufferSize { expected: 2304, actual: 10 })
        ));
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        save_png(&small_map(), 20, 20, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (20, 20));
    }
}
