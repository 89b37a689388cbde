//! Waypoint path construction and lookup

use super::DeformError;
use crate::config::WaypointPathDef;
use crate::ecs::components::{PathId, Waypoint, WaypointPath};
use crate::foundation::math::{utils, Aabb, Quat, Vec3};
use log::warn;

/// Pair of waypoints around a parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Index of the waypoint at or before the value
    pub min_index: usize,
    /// Index of the waypoint at or after the value
    pub max_index: usize,
    /// Position between the two, 0 at `min_index` and 1 at `max_index`
    pub fraction: f32,
}

/// Build a path from its definition and compute its parameterization
pub fn build_waypoint_path(def: &WaypointPathDef) -> Result<WaypointPath, DeformError> {
    let path_id = PathId::new(def.path_id.clone());
    if def.waypoints.is_empty() {
        return Err(DeformError::EmptyWaypointPath { path_id });
    }

    let waypoints = def
        .waypoints
        .iter()
        .map(|waypoint| Waypoint {
            original_position: waypoint.original_position,
            remapped_position: waypoint.remapped_position,
            remapped_rotation: waypoint.remapped_rotation,
            original_aabb_anchor: waypoint.original_aabb_anchor,
            remapped_aabb_anchor: waypoint.remapped_aabb_anchor,
        })
        .collect();

    let mut path = WaypointPath {
        path_id,
        waypoints,
        use_aabb_anchor: def.use_aabb_anchor,
        ..Default::default()
    };
    calculate_parameterization(&mut path);
    Ok(path)
}

/// Recompute the axis and per-waypoint values of a path.
///
/// Paths are expected to be sorted along the axis; unsorted paths only log a
/// warning and keep the linear-scan lookup behaviour.
pub fn calculate_parameterization(path: &mut WaypointPath) {
    path.parameterization_axis = match (path.waypoints.first(), path.waypoints.last()) {
        (Some(first), Some(last)) if path.waypoints.len() > 1 => (last.original_position
            - first.original_position)
            .try_normalize(0.0)
            .unwrap_or_else(Vec3::zeros),
        _ => Vec3::zeros(),
    };

    let axis = path.parameterization_axis;
    path.parameterization_values = path
        .waypoints
        .iter()
        .map(|waypoint| waypoint.original_position.dot(&axis))
        .collect();

    if path.parameterization_values.windows(2).any(|pair| pair[1] < pair[0]) {
        warn!("Waypoint nodes of path {} aren't sorted", path.path_id);
    }
}

/// Find the waypoints around `value` in sorted parameter `values`.
///
/// Values outside the range clamp to the first or last waypoint.
pub fn find_position_between_points(value: f32, values: &[f32]) -> Bracket {
    let max_index = values.iter().take_while(|&&v| v < value).count();

    if max_index == 0 {
        Bracket { min_index: 0, max_index: 0, fraction: 0.0 }
    } else if max_index == values.len() {
        let last = max_index - 1;
        Bracket { min_index: last, max_index: last, fraction: 1.0 }
    } else {
        let min_index = max_index - 1;
        let fraction = (value - values[min_index]) / (values[max_index] - values[min_index]);
        Bracket { min_index, max_index, fraction }
    }
}

/// Copy of `path` with every waypoint offset by its anchor point in `aabb`
pub fn anchored_path(path: &WaypointPath, aabb: &Aabb) -> WaypointPath {
    let mut anchored = path.clone();
    for waypoint in &mut anchored.waypoints {
        waypoint.original_position -= aabb.point_at(&waypoint.original_aabb_anchor);
        waypoint.remapped_position -= aabb.point_at(&waypoint.remapped_aabb_anchor);
    }
    calculate_parameterization(&mut anchored);
    anchored
}

/// Remapped position and rotation for an undeformed position on the path.
///
/// Returns `None` for a path without waypoints.
pub fn sample(path: &WaypointPath, undeformed_position: &Vec3) -> Option<(Vec3, Quat)> {
    let value = undeformed_position.dot(&path.parameterization_axis);
    let bracket = find_position_between_points(value, &path.parameterization_values);

    let min = path.waypoints.get(bracket.min_index)?;
    let max = path.waypoints.get(bracket.max_index)?;

    let position = utils::lerp_vec3(&min.remapped_position, &max.remapped_position, bracket.fraction);
    let euler = utils::lerp_vec3(&min.remapped_rotation, &max.remapped_rotation, bracket.fraction);
    Some((position, utils::quat_from_euler_degrees(&euler)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaypointDef;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn waypoint(original: Vec3, remapped: Vec3, rotation: Vec3) -> WaypointDef {
        WaypointDef {
            original_position: original,
            remapped_position: remapped,
            remapped_rotation: rotation,
            ..Default::default()
        }
    }

    fn two_point_path() -> WaypointPath {
        let def = WaypointPathDef {
            path_id: "rail".to_string(),
            waypoints: vec![
                waypoint(Vec3::zeros(), Vec3::new(0.0, 2.0, 0.0), Vec3::zeros()),
                waypoint(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 4.0, 0.0), Vec3::new(0.0, 90.0, 0.0)),
            ],
            use_aabb_anchor: false,
        };
        build_waypoint_path(&def).unwrap()
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let def = WaypointPathDef { path_id: "empty".to_string(), ..Default::default() };
        assert_eq!(
            build_waypoint_path(&def),
            Err(DeformError::EmptyWaypointPath { path_id: PathId::from("empty") })
        );
    }

    #[test]
    fn test_parameterization_projects_on_axis() {
        let path = two_point_path();
        assert_relative_eq!(path.parameterization_axis, Vec3::x(), epsilon = EPSILON);
        assert_eq!(path.parameterization_values, vec![0.0, 10.0]);
    }

    #[test]
    fn test_single_waypoint_has_zero_axis() {
        let def = WaypointPathDef {
            waypoints: vec![waypoint(Vec3::new(3.0, 0.0, 0.0), Vec3::zeros(), Vec3::zeros())],
            ..Default::default()
        };
        let path = build_waypoint_path(&def).unwrap();
        assert_eq!(path.parameterization_axis, Vec3::zeros());
        assert_eq!(find_position_between_points(42.0, &path.parameterization_values).min_index, 0);
    }

    #[test]
    fn test_bracket_search() {
        let values = [0.0, 1.0, 2.0, 3.0];

        assert_eq!(
            find_position_between_points(-100.0, &values),
            Bracket { min_index: 0, max_index: 0, fraction: 0.0 }
        );
        assert_eq!(
            find_position_between_points(100.0, &values),
            Bracket { min_index: 3, max_index: 3, fraction: 1.0 }
        );
        assert_eq!(
            find_position_between_points(1.0, &values),
            Bracket { min_index: 0, max_index: 1, fraction: 1.0 }
        );

        let bracket = find_position_between_points(2.25, &values);
        assert_eq!((bracket.min_index, bracket.max_index), (2, 3));
        assert_relative_eq!(bracket.fraction, 0.25, epsilon = EPSILON);
    }

    #[test]
    fn test_sample_midway() {
        let path = two_point_path();
        let (position, rotation) = sample(&path, &Vec3::new(5.0, 0.0, 0.0)).unwrap();

        assert_relative_eq!(position, Vec3::new(5.0, 3.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(
            rotation,
            utils::quat_from_euler_degrees(&Vec3::new(0.0, 45.0, 0.0)),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_unsorted_path_is_kept() {
        let def = WaypointPathDef {
            waypoints: vec![
                waypoint(Vec3::zeros(), Vec3::zeros(), Vec3::zeros()),
                waypoint(Vec3::new(5.0, 0.0, 0.0), Vec3::zeros(), Vec3::zeros()),
                waypoint(Vec3::new(2.0, 0.0, 0.0), Vec3::zeros(), Vec3::zeros()),
            ],
            ..Default::default()
        };
        let path = build_waypoint_path(&def).unwrap();
        assert_eq!(path.waypoints.len(), 3);
        assert_eq!(path.parameterization_values, vec![0.0, 5.0, 2.0]);
    }

    #[test]
    fn test_anchored_path_offsets_by_box() {
        let mut path = two_point_path();
        path.waypoints[0].original_aabb_anchor = Vec3::new(0.0, 0.5, 0.5);
        path.waypoints[0].remapped_aabb_anchor = Vec3::new(0.0, 0.5, 0.5);
        path.waypoints[1].original_aabb_anchor = Vec3::new(1.0, 0.5, 0.5);
        path.waypoints[1].remapped_aabb_anchor = Vec3::new(1.0, 0.5, 0.5);

        let anchored = anchored_path(&path, &Aabb::from_size(2.0));

        assert_relative_eq!(anchored.waypoints[0].original_position, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(anchored.waypoints[1].remapped_position, Vec3::new(9.0, 4.0, 0.0));
        assert_eq!(anchored.parameterization_values, vec![1.0, 9.0]);
        assert_eq!(path.parameterization_values, vec![0.0, 10.0]);
    }
}
