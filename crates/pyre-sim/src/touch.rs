//! Screen to grid mapping for pointer forces.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Pixel position (origin top-left) to normalised device coordinates.
pub fn screen_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    Vec2::new((2.0 * x / w - 1.0) as f32, (1.0 - 2.0 * y / h) as f32)
}

fn unproject(inv_mvp: Mat4, ndc: Vec2, depth: f32) -> Vec3 {
    let p = inv_mvp * Vec4::new(ndc.x, ndc.y, depth, 1.0);
    if p.w.abs() > f32::EPSILON {
        p.truncate() / p.w
    } else {
        p.truncate()
    }
}

/// Point on the pick ray through a pixel that is closest to the volume centre.
///
/// With `inv_mvp` built from the volume model matrix the result is in unit grid-cube
/// coordinates.
pub fn screen_to_grid(inv_mvp: Mat4, x: f64, y: f64, width: u32, height: u32) -> Vec3 {
    let ndc = screen_to_ndc(x, y, width, height);
    let near = unproject(inv_mvp, ndc, -1.0);
    let far = unproject(inv_mvp, ndc, 1.0);
    let dir = far - near;
    let len2 = dir.length_squared();
    if len2 <= f32::EPSILON {
        return near;
    }
    let t = (Vec3::splat(0.5) - near).dot(dir) / len2;
    near + dir * t
}

/// Grid-space direction of a drag of (`dx`, `dy`) pixels through the screen centre.
pub fn drag_to_grid(inv_mvp: Mat4, dx: f64, dy: f64, width: u32, height: u32) -> Vec3 {
    let cx = width as f64 * 0.5;
    let cy = height as f64 * 0.5;
    screen_to_grid(inv_mvp, cx + dx, cy + dy, width, height)
        - screen_to_grid(inv_mvp, cx, cy, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrbitCamera, VolumeTransform};
    use pyre_core::Settings;

    fn mvp() -> Mat4 {
        let cam = OrbitCamera::default();
        let model = VolumeTransform::from_settings(&Settings::default()).model();
        cam.mvp(model, 800.0 / 600.0)
    }

    fn to_screen(mvp: Mat4, p: Vec3) -> Vec2 {
        let clip = mvp * p.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Vec2::new((ndc.x + 1.0) * 400.0, (1.0 - ndc.y) * 300.0)
    }

    #[test]
    fn ndc_corners() {
        assert_eq!(screen_to_ndc(0.0, 0.0, 800, 600), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(800.0, 600.0, 800, 600), Vec2::new(1.0, -1.0));
        assert_eq!(screen_to_ndc(400.0, 300.0, 800, 600), Vec2::ZERO);
    }

    #[test]
    fn screen_centre_hits_the_volume_centre() {
        let g = screen_to_grid(mvp().inverse(), 400.0, 300.0, 800, 600);
        assert!((g - Vec3::splat(0.5)).length() < 1e-3, "{g:?}");
    }

    #[test]
    fn unprojected_point_projects_back() {
        let m = mvp();
        let g = screen_to_grid(m.inverse(), 250.0, 120.0, 800, 600);
        let s = to_screen(m, g);
        assert!((s - Vec2::new(250.0, 120.0)).length() < 0.05, "{s:?}");
    }

    #[test]
    fn drag_right_moves_right_on_screen() {
        let m = mvp();
        let inv = m.inverse();
        assert!(drag_to_grid(inv, 0.0, 0.0, 800, 600).length() < 1e-6);

        let origin = screen_to_grid(inv, 400.0, 300.0, 800, 600);
        let d = drag_to_grid(inv, 40.0, 0.0, 800, 600);
        let moved = to_screen(m, origin + d);
        assert!(moved.x > 430.0);
        assert!((moved.y - 300.0).abs() < 1.0);
    }
}
