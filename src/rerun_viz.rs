//! Rerun logging for live maps. World coordinates are logged in metres.

use std::error::Error;

use glam::{IVec2, Vec2, Vec3};

use crate::grid::OccupancyMap;
use crate::types::RobotPose;
use crate::visualization::render;

const MM_PER_M: f32 = 1000.0;

#[inline]
fn to_metres(p: IVec2) -> Vec2 {
    p.as_vec2() / MM_PER_M
}

/// Rendered map as `(width, height, packed RGB)`, ready for a texture.
pub fn map_texture<M: OccupancyMap + ?Sized>(map: &M, width: u32, height: u32) -> (u32, u32, Vec<u8>) {
    let img = render(map, width, height);
    (img.width(), img.height(), img.into_raw())
}

/// Log a flat quad at height `z` textured with `rgb_bytes`.
///
/// `min_xy` is the lower-left world corner; the texture's first row lands on the +Y edge.
#[allow(clippy::too_many_arguments)]
pub fn log_textured_plane(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    min_xy: Vec2,
    size: Vec2,
    z: f32,
    texture_width: u32,
    texture_height: u32,
    rgb_bytes: Vec<u8>,
) -> Result<(), Box<dyn Error>> {
    let max_xy = min_xy + size;
    rec.log(
        entity_path,
        &rerun::Mesh3D::new([
            [min_xy.x, max_xy.y, z],
            [max_xy.x, min_xy.y, z],
            [min_xy.x, min_xy.y, z],
            [max_xy.x, max_xy.y, z],
        ])
        .with_vertex_normals([[0.0, 0.0, 1.0]])
        .with_triangle_indices([[2, 1, 0], [3, 1, 0]])
        .with_vertex_texcoords([[0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]])
        .with_albedo_texture(
            rerun::datatypes::ImageFormat {
                width: texture_width,
                height: texture_height,
                color_model: Some(rerun::datatypes::ColorModel::RGB),
                channel_datatype: Some(rerun::datatypes::ChannelDatatype::U8),
                ..Default::default()
            },
            rgb_bytes,
        ),
    )?;
    Ok(())
}

/// Log the map's rendered extent as a textured plane centered on the map center.
pub fn log_map<M: OccupancyMap + ?Sized>(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    map: &M,
    texture_size: u32,
    z: f32,
) -> Result<(), Box<dyn Error>> {
    let half = map.half_extent_mm();
    let (width, height, rgb) = map_texture(map, texture_size, texture_size);
    log_textured_plane(
        rec,
        entity_path,
        to_metres(map.center() - IVec2::splat(half)),
        Vec2::splat(2.0 * half as f32 / MM_PER_M),
        z,
        width,
        height,
        rgb,
    )
}

/// Log the cells currently believed occupied as points.
pub fn log_occupied<M: OccupancyMap + ?Sized>(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    map: &M,
    z: f32,
) -> Result<(), Box<dyn Error>> {
    let points: Vec<[f32; 3]> = map
        .occupied_positions()
        .into_iter()
        .map(|p| {
            let m = to_metres(p);
            [m.x, m.y, z]
        })
        .collect();
    rec.log(
        entity_path,
        &rerun::Points3D::new(points)
            .with_colors([rerun::Color::from_rgb(0, 0, 255)])
            .with_radii([rerun::Radius::new_ui_points(2.0)]),
    )?;
    Ok(())
}

/// Log the robot position and a short heading segment.
pub fn log_robot(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    pose: &RobotPose,
    z: f32,
) -> Result<(), Box<dyn Error>> {
    let at = to_metres(pose.position()).extend(z);
    let heading = pose.orientation_degrees.to_radians();
    // compass heading: 0 along +Y, clockwise
    let tip = at + Vec3::new(heading.sin(), heading.cos(), 0.0) * 0.3;

    rec.log(
        format!("{entity_path}/position"),
        &rerun::Points3D::new([[at.x, at.y, at.z]])
            .with_colors([rerun::Color::from_rgb(255, 255, 0)])
            .with_radii([rerun::Radius::new_ui_points(5.0)]),
    )?;
    rec.log(
        format!("{entity_path}/heading"),
        &rerun::LineStrips3D::new([[[at.x, at.y, at.z], [tip.x, tip.y, tip.z]]])
            .with_colors([rerun::Color::from_rgb(255, 255, 0)]),
    )?;
    Ok(())
}
