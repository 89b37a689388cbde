//! Cylinder deformation math
//!
//! The cylinder axis is the Y axis. A flat layout along +X wraps around a
//! cylinder whose surface passes through the origin with its axis at
//! `(0, y, radius)`; distances along X are preserved as arc lengths.

use crate::foundation::math::{constants, utils, Mat4, Mat4Ext, Quat, Sqt, Vec3};

/// Wrap a local transform around a cylinder, keeping nested cylinders
/// concentric.
///
/// `parent_radius` is the parent's distance from the cylinder axis. The
/// returned matrix is relative to the parent.
pub fn global_cylinder_matrix(local_sqt: &Sqt, parent_radius: f32, deform_radius: f32) -> Mat4 {
    let t = local_sqt.translation;
    let self_radius = (parent_radius - t.z).abs();
    let self_angle = -t.x / deform_radius;

    let rotation = local_sqt.rotation * Quat::from_axis_angle(&Vec3::y_axis(), self_angle);
    let position = Vec3::new(
        -self_angle.sin() * self_radius,
        t.y,
        -self_angle.cos() * self_radius + parent_radius,
    );

    Sqt::new(position, rotation, local_sqt.scale).to_matrix()
}

fn clamped(angle: f32, clamp_angle: f32) -> f32 {
    if clamp_angle > constants::EPSILON {
        angle.clamp(-clamp_angle, clamp_angle)
    } else {
        angle
    }
}

/// Bend an undeformed transform around a cylinder of `deform_radius`.
///
/// The bend angle is limited to `±clamp_angle` when `clamp_angle` is positive.
pub fn bend(undeformed: &Mat4, deform_radius: f32, clamp_angle: f32) -> Mat4 {
    let origin = utils::translation_of(undeformed);
    let centered = Mat4::new_translation(&-origin) * undeformed;

    let self_radius = (deform_radius - origin.z).abs();
    let self_angle = clamped(-origin.x / deform_radius, clamp_angle);

    let position = Vec3::new(
        -self_angle.sin() * self_radius,
        origin.y,
        -self_angle.cos() * self_radius + deform_radius,
    );

    Mat4::new_translation(&position) * Mat4::rotation_y(self_angle) * centered
}

/// Inverse of [`bend`].
///
/// Exact for transforms on the inner side of the cylinder surface
/// (`z <= deform_radius` before bending) that wrap less than half a turn.
/// Positions beyond the clamp angle move to the nearest valid position.
pub fn unbend(deformed: &Mat4, deform_radius: f32, clamp_angle: f32) -> Mat4 {
    let position = utils::translation_of(deformed);
    let to_axis_z = deform_radius - position.z;

    let self_angle = clamped((-position.x).atan2(to_axis_z), clamp_angle);
    let self_radius = position.x.hypot(to_axis_z);

    let centered = Mat4::rotation_y(-self_angle) * Mat4::new_translation(&-position) * deformed;
    let origin = Vec3::new(-self_angle * deform_radius, position.y, deform_radius - self_radius);

    Mat4::new_translation(&origin) * centered
}

/// Wrap a point in flat space around a cylinder centred on the Y axis
pub fn deform_point(point: &Vec3, radius: f32) -> Vec3 {
    let angle = point.x / radius;
    Vec3::new(-point.z * angle.sin(), point.y, point.z * angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;
    const RADIUS: f32 = 2.0;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    #[test]
    fn test_global_cylinder_wraps_quarter_turns() {
        let mut sqt = Sqt::identity();

        let mat = global_cylinder_matrix(&sqt, RADIUS, RADIUS);
        assert_relative_eq!(mat.m14, 0.0, epsilon = EPSILON);
        assert_relative_eq!(mat.m34, 0.0, epsilon = EPSILON);

        sqt.translation = Vec3::new(constants::HALF_PI * RADIUS, 0.0, 0.0);
        let mat = global_cylinder_matrix(&sqt, RADIUS, RADIUS);
        assert_relative_eq!(mat.m14, RADIUS, epsilon = EPSILON);
        assert_relative_eq!(mat.m34, RADIUS, epsilon = EPSILON);

        sqt.translation = Vec3::new(constants::PI * RADIUS, 0.0, 0.0);
        let mat = global_cylinder_matrix(&sqt, RADIUS, RADIUS);
        assert_relative_eq!(mat.m14, 0.0, epsilon = EPSILON);
        assert_relative_eq!(mat.m34, 2.0 * RADIUS, epsilon = EPSILON);

        sqt.translation = Vec3::new(-constants::HALF_PI * RADIUS, 0.0, 0.0);
        let mat = global_cylinder_matrix(&sqt, RADIUS, RADIUS);
        assert_relative_eq!(mat.m14, -RADIUS, epsilon = EPSILON);
        assert_relative_eq!(mat.m34, RADIUS, epsilon = EPSILON);
    }

    #[test]
    fn test_global_cylinder_inherits_parent_radius() {
        let sqt = Sqt::from_translation(Vec3::new(constants::HALF_PI * RADIUS, 0.0, 0.25));
        let mat = global_cylinder_matrix(&sqt, RADIUS, RADIUS);
        assert_relative_eq!(mat.m14, RADIUS - 0.25, epsilon = EPSILON);
        assert_relative_eq!(mat.m34, RADIUS, epsilon = EPSILON);
    }

    #[test]
    fn test_bend_identity_is_unchanged() {
        assert_relative_eq!(bend(&Mat4::identity(), RADIUS, 0.0), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_bend_full_wrap_returns_to_origin() {
        let undeformed = translation(2.0 * constants::PI * RADIUS, 0.0, 0.0);
        assert_relative_eq!(bend(&undeformed, RADIUS, 0.0), Mat4::identity(), epsilon = 1e-4);
    }

    #[test]
    fn test_bend_quarter_turn_both_directions() {
        for angle in [constants::HALF_PI, -constants::HALF_PI] {
            let deformed = bend(&translation(angle * RADIUS, 0.0, 0.0), RADIUS, 0.0);

            let mut expected = Mat4::rotation_y(-angle);
            expected.m14 = RADIUS * angle.sin();
            expected.m24 = 0.0;
            expected.m34 = RADIUS - RADIUS * angle.cos();
            assert_relative_eq!(deformed, expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_bend_clamps_angle() {
        let clamp = 0.25;
        let far = bend(&translation(RADIUS, 0.0, 0.0), RADIUS, clamp);
        let limit = bend(&translation(clamp * RADIUS, 0.0, 0.0), RADIUS, 0.0);
        assert_relative_eq!(far, limit, epsilon = EPSILON);
    }

    #[test]
    fn test_bend_preserves_arc_length() {
        for radius in [1.0, 2.0, 7.5] {
            let a = bend(&translation(0.3, 0.0, 0.0), radius, 0.0);
            let b = bend(&translation(1.3, 0.0, 0.0), radius, 0.0);

            let axis_to = |m: &Mat4| (-m.m14).atan2(radius - m.m34);
            let arc = (axis_to(&b) - axis_to(&a)).abs() * radius;
            assert_relative_eq!(arc, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_unbend_inverts_bend() {
        let undeformed = Sqt::new(
            Vec3::new(1.2, -0.4, -0.7),
            Quat::from_euler_angles(0.3, -0.2, 0.5),
            Vec3::new(1.0, 2.0, 0.5),
        )
        .to_matrix();

        let deformed = bend(&undeformed, RADIUS, constants::HALF_PI);
        assert_relative_eq!(unbend(&deformed, RADIUS, constants::HALF_PI), undeformed, epsilon = 1e-4);
    }

    #[test]
    fn test_end_to_end_wrap_offset_lies_in_xz_plane() {
        let deformed = bend(&translation(1.0, 0.0, 0.0), RADIUS, constants::HALF_PI);
        assert_relative_eq!(
            utils::translation_of(&deformed),
            Vec3::new(2.0 * 0.5_f32.sin(), 0.0, 2.0 * (1.0 - 0.5_f32.cos())),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_deform_point_planes() {
        for i in -3..=3 {
            let x = i as f32;
            assert_relative_eq!(
                deform_point(&Vec3::new(x, 2.0 * x, 0.0), RADIUS),
                Vec3::new(0.0, 2.0 * x, 0.0),
                epsilon = EPSILON
            );
            assert_relative_eq!(
                deform_point(&Vec3::new(0.0, x, 2.0 * x), RADIUS),
                Vec3::new(0.0, x, 2.0 * x),
                epsilon = EPSILON
            );
            assert_relative_eq!(
                deform_point(&Vec3::new(RADIUS * constants::HALF_PI, x, 2.0 * x), RADIUS),
                Vec3::new(-2.0 * x, x, 0.0),
                epsilon = EPSILON
            );
            assert_relative_eq!(
                deform_point(&Vec3::new(-RADIUS * constants::HALF_PI, x, 2.0 * x), RADIUS),
                Vec3::new(2.0 * x, x, 0.0),
                epsilon = EPSILON
            );
        }
    }
}
