//! Spatial math for hit tests
//!
//! Everything compares squared distances; roots are only taken where a
//! caller needs an actual length (movement, falloff).

use glam::Vec2;

/// Direction used when a computed direction degenerates
pub const FALLBACK_DIR: Vec2 = Vec2::X;

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

#[inline]
pub fn distance_sq(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}

/// Minimum squared distance from `p` to the segment `a`-`b`
///
/// The projection parameter is clamped to `[0, 1]`; a zero-length segment is
/// treated as the point `a`.
pub fn point_segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return distance_sq(p, a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    distance_sq(p, a + ab * t)
}

/// Even-odd ray casting test over an ordered vertex list
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (vi, vj) = (poly[i], poly[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Corners of a rectangle centered on `center`, with its long axis along `dir`
///
/// Returned in winding order, suitable for [`point_in_polygon`].
pub fn oriented_rect(center: Vec2, dir: Vec2, length: f32, width: f32) -> [Vec2; 4] {
    let along = safe_direction(dir, FALLBACK_DIR) * (length * 0.5);
    let across = along.perp().normalize_or_zero() * (width * 0.5);
    [
        center - along - across,
        center + along - across,
        center + along + across,
        center - along + across,
    ]
}

/// Unit vector along `v`, or `fallback` when `v` is zero-length or not finite
#[inline]
pub fn safe_direction(v: Vec2, fallback: Vec2) -> Vec2 {
    match v.try_normalize() {
        Some(dir) => dir,
        None => fallback,
    }
}

/// `value` if finite, else `default`
#[inline]
pub fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() { value } else { default }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_point_segment_projection_inside() {
        let d = point_segment_distance_sq(Vec2::new(5.0, 3.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_segment_clamps_to_endpoints() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!((point_segment_distance_sq(Vec2::new(-3.0, 4.0), a, b) - 25.0).abs() < 1e-5);
        assert!((point_segment_distance_sq(Vec2::new(13.0, 4.0), a, b) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_segment_degenerate() {
        let p = Vec2::new(3.0, 4.0);
        assert!((point_segment_distance_sq(p, Vec2::ZERO, Vec2::ZERO) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_in_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Vec2::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(Vec2::new(5.0, -1.0), &square));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // U shape: the notch between the arms is outside
        let u = [
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(20.0, 30.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 30.0),
            Vec2::new(0.0, 30.0),
        ];
        assert!(point_in_polygon(Vec2::new(5.0, 20.0), &u));
        assert!(!point_in_polygon(Vec2::new(15.0, 20.0), &u));
        assert!(point_in_polygon(Vec2::new(15.0, 5.0), &u));
    }

    #[test]
    fn test_oriented_rect_rotated() {
        // 100 long, 20 wide, pointing up
        let rect = oriented_rect(Vec2::ZERO, Vec2::Y, 100.0, 20.0);
        assert!(point_in_polygon(Vec2::new(0.0, 45.0), &rect));
        assert!(point_in_polygon(Vec2::new(8.0, -40.0), &rect));
        assert!(!point_in_polygon(Vec2::new(15.0, 0.0), &rect));
        assert!(!point_in_polygon(Vec2::new(0.0, 55.0), &rect));
    }

    #[test]
    fn test_safe_direction_fallbacks() {
        assert_eq!(safe_direction(Vec2::ZERO, FALLBACK_DIR), FALLBACK_DIR);
        assert_eq!(
            safe_direction(Vec2::new(f32::NAN, 1.0), Vec2::Y),
            Vec2::Y
        );
        let d = safe_direction(Vec2::new(3.0, 4.0), FALLBACK_DIR);
        assert!((d - Vec2::new(0.6, 0.8)).length() < 1e-5);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(f32::INFINITY, 2.0), 2.0);
        assert_eq!(finite_or(1.5, 2.0), 1.5);
    }

    proptest! {
        #[test]
        fn prop_segment_distance_never_exceeds_endpoints(
            px in -500.0f32..500.0, py in -500.0f32..500.0,
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
        ) {
            let p = Vec2::new(px, py);
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            let d = point_segment_distance_sq(p, a, b);
            let to_ends = distance_sq(p, a).min(distance_sq(p, b));
            prop_assert!(d >= 0.0);
            prop_assert!(d <= to_ends + to_ends * 1e-4 + 1e-3);
        }
    }
}
