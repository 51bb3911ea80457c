//! Geometry and camera for the studio window.

use glam::{Mat4, Vec3};
use glines_engine::lines::LineVertex;

pub const RED: [f32; 3] = [1.0, 0.0, 0.0];
pub const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
pub const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

/// Two segments, `(0,0,0)-(1,0,0)` red and `(0,1,0)-(0,0,1)` green, meant to
/// be drawn with the identity transform.
pub fn reference_segments() -> Vec<LineVertex> {
    let mut v = Vec::with_capacity(4);
    v.extend(LineVertex::segment([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], RED));
    v.extend(LineVertex::segment([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], GREEN));
    v
}

/// Same segments with their brightness pulsing over `t` seconds.
pub fn pulsing_segments(t: f32) -> Vec<LineVertex> {
    let k = 0.6 + 0.4 * (t * 2.0).sin();
    reference_segments()
        .into_iter()
        .map(|mut v| {
            v.col = v.col.map(|c| c * k);
            v
        })
        .collect()
}

/// X, Y and Z axes from the origin, colored red, green and blue.
pub fn axes(len: f32) -> Vec<LineVertex> {
    let mut v = Vec::with_capacity(6);
    v.extend(LineVertex::segment([0.0; 3], [len, 0.0, 0.0], RED));
    v.extend(LineVertex::segment([0.0; 3], [0.0, len, 0.0], GREEN));
    v.extend(LineVertex::segment([0.0; 3], [0.0, 0.0, len], BLUE));
    v
}

/// The 12 edges of an axis-aligned cube centered on the origin.
pub fn cube_wireframe(half: f32, col: [f32; 3]) -> Vec<LineVertex> {
    let corner = |i: u32| {
        let s = |bit: u32| if i & bit != 0 { half } else { -half };
        [s(1), s(2), s(4)]
    };

    let mut v = Vec::with_capacity(24);
    for i in 0..8u32 {
        for bit in [1u32, 2, 4] {
            // each edge once, from its lower corner
            if i & bit == 0 {
                v.extend(LineVertex::segment(corner(i), corner(i | bit), col));
            }
        }
    }
    v
}

/// Square grid on the XZ plane with `cells` cells per side.
pub fn floor_grid(cells: u32, spacing: f32, col: [f32; 3]) -> Vec<LineVertex> {
    let extent = cells as f32 * spacing * 0.5;
    let mut v = Vec::with_capacity((cells as usize + 1) * 4);
    for i in 0..=cells {
        let d = -extent + i as f32 * spacing;
        v.extend(LineVertex::segment([d, 0.0, -extent], [d, 0.0, extent], col));
        v.extend(LineVertex::segment([-extent, 0.0, d], [extent, 0.0, d], col));
    }
    v
}

/// Perspective camera orbiting the origin, one turn every 12 seconds.
pub fn orbit_view_projection(aspect: f32, t: f32) -> Mat4 {
    let angle = t * std::f32::consts::TAU / 12.0;
    let eye = Vec3::new(4.0 * angle.cos(), 2.5, 4.0 * angle.sin());
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(45f32.to_radians(), aspect.max(0.01), 0.1, 100.0);
    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn reference_segments_match_the_two_line_scene() {
        let v = reference_segments();
        assert_eq!(v.len(), 4);
        assert_eq!((v[0].pos, v[1].pos), ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
        assert_eq!((v[2].pos, v[3].pos), ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]));
        assert_eq!(v[0].col, RED);
        assert_eq!(v[3].col, GREEN);
    }

    #[test]
    fn pulse_stays_in_unit_range() {
        for step in 0..50 {
            for vert in pulsing_segments(step as f32 * 0.1) {
                assert!(vert.col.iter().all(|c| (0.0..=1.0).contains(c)));
            }
        }
    }

    #[test]
    fn cube_has_twelve_axis_aligned_edges() {
        let v = cube_wireframe(0.5, BLUE);
        assert_eq!(v.len(), 24);
        for edge in v.chunks(2) {
            let differing = (0..3).filter(|&k| edge[0].pos[k] != edge[1].pos[k]).count();
            assert_eq!(differing, 1);
            assert!(edge[0].pos.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn axes_are_three_segments() {
        let v = axes(2.0);
        assert_eq!(v.len(), 6);
        assert_eq!(v[5].pos, [0.0, 0.0, 2.0]);
    }

    #[test]
    fn grid_is_even_and_bounded() {
        let v = floor_grid(4, 0.5, GREEN);
        assert_eq!(v.len() % 2, 0);
        assert_eq!(v.len(), 5 * 4);
        assert!(v.iter().all(|p| p.pos[0].abs() <= 1.0 && p.pos[2].abs() <= 1.0));
    }

    #[test]
    fn camera_keeps_origin_centered() {
        for t in [0.0, 3.0, 7.5] {
            let clip = orbit_view_projection(16.0 / 9.0, t) * Vec4::new(0.0, 0.0, 0.0, 1.0);
            assert!(clip.w > 0.0);
            assert!((clip.x / clip.w).abs() < 1e-5);
            assert!((clip.y / clip.w).abs() < 1e-5);
            let depth = clip.z / clip.w;
            assert!((0.0..=1.0).contains(&depth));
        }
    }
}
