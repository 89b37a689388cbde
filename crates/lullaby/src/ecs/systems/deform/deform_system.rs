//! Deform system
//!
//! Owns every [`Deformer`] and [`Deformed`] record, keeps each deformed
//! entity's governing deformer in sync with the hierarchy and evaluates the
//! per-mode matrix hooks for the [`TransformSystem`].

use super::cylinder::{bend, deform_point, global_cylinder_matrix, unbend};
use super::mesh::apply_deformation;
use super::waypoint::{anchored_path, build_waypoint_path, sample};
use super::DeformError;
use crate::config::DeformerDef;
use crate::ecs::components::{DeformMode, Deformed, Deformer, MatrixHook, PathId, WaypointPath};
use crate::ecs::systems::transform_system::{
    compose_with_parent, local_sqt_relative_to, MatrixHookHandler, TransformSystem,
};
use crate::ecs::Entity;
use crate::foundation::collections::ComponentPool;
use crate::foundation::math::{constants, utils, Aabb, Mat4, Mat4Ext, Point3, Sqt, Vec3};
use crate::render::{MeshDeformer, MeshSystem};
use log::{debug, error};
use std::collections::HashMap;

fn transform_position(matrix: &Mat4, position: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*position)).coords
}

/// Deformer and deformed records plus the propagation between them
pub struct DeformSystem {
    deformers: ComponentPool<Deformer>,
    deformed: ComponentPool<Deformed>,
}

impl DeformSystem {
    /// Create an empty deform system
    pub fn new() -> Self {
        Self {
            deformers: ComponentPool::with_capacity(16),
            deformed: ComponentPool::with_capacity(16),
        }
    }

    /// Make `entity` a deformation root.
    ///
    /// The entity also becomes deformed (governed by itself) and so does every
    /// deformed descendant reachable through deformed entities. Malformed
    /// waypoint paths are logged and skipped. Replacing an existing deformer
    /// re-applies the new mode to the whole subtree.
    pub fn create_deformer(
        &mut self,
        transforms: &mut TransformSystem,
        meshes: &mut MeshSystem,
        entity: Entity,
        def: &DeformerDef,
    ) -> Result<(), DeformError> {
        let deformer = Self::build_deformer(entity, def)?;

        if self.deformers.destroy(entity).is_some() {
            debug!("Replacing deformer of {}", entity);
            self.set_deformer_recursive(transforms, entity, Entity::NULL);
        }

        if !self.deformed.contains(entity) {
            self.deformed.emplace(entity, Deformed::new(entity, PathId::default()));
        }
        self.deformers.emplace(entity, deformer);

        self.set_deformer_recursive(transforms, entity, entity);
        meshes.register_deformation(entity);
        Ok(())
    }

    fn build_deformer(entity: Entity, def: &DeformerDef) -> Result<Deformer, DeformError> {
        let needs_radius = matches!(def.deform_mode, DeformMode::GlobalCylinder | DeformMode::CylinderBend);
        if needs_radius && !(def.horizontal_radius > constants::EPSILON) {
            return Err(DeformError::InvalidRadius {
                entity,
                radius: def.horizontal_radius,
            });
        }

        let mut deformer =
            Deformer::new(entity, def.deform_mode, def.horizontal_radius).with_clamp_angle(def.clamp_angle);
        if def.deform_mode != DeformMode::Waypoint {
            return Ok(deformer);
        }

        if def.waypoint_paths.is_empty() {
            return Err(DeformError::MissingWaypointPaths { entity });
        }
        let mut paths = HashMap::with_capacity(def.waypoint_paths.len());
        for path_def in &def.waypoint_paths {
            let path = match build_waypoint_path(path_def) {
                Ok(path) => path,
                Err(e) => {
                    error!("Skipping path of deformer {}: {}", entity, e);
                    continue;
                }
            };
            if paths.contains_key(&path.path_id) {
                error!(
                    "Skipping path of deformer {}: {}",
                    entity,
                    DeformError::DuplicateWaypointPath { path_id: path.path_id }
                );
                continue;
            }
            paths.insert(path.path_id.clone(), path);
        }
        deformer.paths = paths;
        Ok(deformer)
    }

    /// Mark an entity as taking part in deformation.
    ///
    /// An entity that is already deformed only switches to `path_id`. A new
    /// record inherits the deformer of its parent, if the parent is deformed.
    pub fn set_as_deformed(
        &mut self,
        transforms: &mut TransformSystem,
        meshes: &mut MeshSystem,
        entity: Entity,
        path_id: PathId,
    ) {
        if let Some(deformed) = self.deformed.get_mut(entity) {
            if deformed.path_id != path_id {
                deformed.path_id = path_id;
                self.recalculate_anchored_path(transforms, entity);
                transforms.update_transforms(entity, self);
            }
            return;
        }

        self.deformed.emplace(entity, Deformed::new(entity, path_id));
        let parent = transforms.parent(entity);
        if let Some(parent_deformer) = self.deformed.get(parent).map(|d| d.deformer) {
            if self.deformers.contains(parent_deformer) {
                self.set_deformer_recursive(transforms, entity, parent_deformer);
            }
        }
        meshes.register_deformation(entity);
    }

    /// Remove every deformation record of an entity.
    ///
    /// Deformed descendants lose their deformer before the records go away.
    pub fn destroy(&mut self, transforms: &mut TransformSystem, meshes: &mut MeshSystem, entity: Entity) {
        if self.deformed.contains(entity) {
            self.set_deformer_recursive(transforms, entity, Entity::NULL);
        }
        meshes.unregister_deformation(entity);

        self.deformers.destroy(entity);
        self.deformed.destroy(entity);
    }

    /// Whether the entity has a deformed record, with or without a deformer
    pub fn is_set_as_deformed(&self, entity: Entity) -> bool {
        self.deformed.contains(entity)
    }

    /// Whether the entity is deformed and governed by an existing deformer
    pub fn is_deformed(&self, entity: Entity) -> bool {
        self.governing_deformer(entity).is_some()
    }

    /// Radius of the governing deformer, or 0
    pub fn deform_radius(&self, entity: Entity) -> f32 {
        self.governing_deformer(entity).map_or(0.0, |d| d.radius)
    }

    /// Mode of the governing deformer, or [`DeformMode::None`]
    pub fn deform_mode(&self, entity: Entity) -> DeformMode {
        self.governing_deformer(entity).map_or(DeformMode::None, |d| d.mode)
    }

    /// Governing deformer entity, or [`Entity::NULL`]
    pub fn deformer_of(&self, entity: Entity) -> Entity {
        self.deformed.get(entity).map_or(Entity::NULL, |d| d.deformer)
    }

    /// Bounding box of the entity's mesh before deformation
    pub fn undeformed_bounding_box(&self, entity: Entity) -> Option<&Aabb> {
        self.deformed.get(entity).map(|d| &d.undeformed_aabb)
    }

    /// Waypoint path the entity currently follows, anchored copy first
    pub fn waypoint_path(&self, entity: Entity) -> Option<&WaypointPath> {
        let deformed = self.deformed.get(entity)?;
        if let Some(anchored) = &deformed.anchored_path {
            return Some(anchored.as_ref());
        }
        self.deformers.get(deformed.deformer)?.paths.get(&deformed.path_id)
    }

    fn governing_deformer(&self, entity: Entity) -> Option<&Deformer> {
        self.deformed.get(entity).and_then(|d| self.deformers.get(d.deformer))
    }

    /// React to `target` moving under `new_parent`
    pub fn on_parent_changed(&mut self, transforms: &mut TransformSystem, target: Entity, new_parent: Entity) {
        if !self.deformed.contains(target) {
            return;
        }
        let deformer = if self.deformers.contains(target) {
            target
        } else {
            self.deformed
                .get(new_parent)
                .map(|d| d.deformer)
                .filter(|&d| self.deformers.contains(d))
                .unwrap_or(Entity::NULL)
        };
        self.set_deformer_recursive(transforms, target, deformer);
    }

    /// React to a new bounding box on `target`
    pub fn on_aabb_changed(&mut self, transforms: &mut TransformSystem, target: Entity) {
        if !self.deformed.contains(target) {
            return;
        }
        self.recalculate_anchored_path(transforms, target);
        transforms.update_transforms(target, self);
    }

    /// Assign `deformer` to `entity` and its deformed descendants, then
    /// refresh the affected world matrices once.
    ///
    /// Children without a deformed record stop the propagation for their
    /// whole subtree.
    pub fn set_deformer_recursive(&mut self, transforms: &mut TransformSystem, entity: Entity, deformer: Entity) {
        if self.assign_deformer(transforms, entity, deformer) {
            transforms.update_transforms(entity, self);
        }
    }

    fn assign_deformer(&mut self, transforms: &mut TransformSystem, entity: Entity, deformer: Entity) -> bool {
        let Some(deformed) = self.deformed.get_mut(entity) else {
            return false;
        };
        if deformed.deformer == deformer {
            return false;
        }
        deformed.deformer = deformer;
        deformed.undeformed_space.invalidate();
        self.apply_deform(transforms, entity);

        let children = transforms.children(entity).to_vec();
        for child in children {
            self.assign_deformer(transforms, child, deformer);
        }
        true
    }

    /// Tag the entity's transform with the hook for its governing deformer
    pub fn apply_deform(&mut self, transforms: &mut TransformSystem, entity: Entity) {
        let hook = match self.governing_deformer(entity).map(|d| (d.mode, d.radius)) {
            None | Some((DeformMode::None, _)) => None,
            Some((DeformMode::GlobalCylinder, radius)) => Some(MatrixHook::GlobalCylinder { radius }),
            Some((DeformMode::CylinderBend, _)) => Some(MatrixHook::CylinderBend),
            Some((DeformMode::Waypoint, _)) => {
                self.recalculate_anchored_path(transforms, entity);
                Some(MatrixHook::Waypoint)
            }
        };
        transforms.set_matrix_hook(entity, hook);
    }

    /// Rebuild the entity's anchored copy of its waypoint path from its
    /// current bounding box, or drop it when the path is not anchored
    pub fn recalculate_anchored_path(&mut self, transforms: &TransformSystem, entity: Entity) {
        let Some(deformed) = self.deformed.get(entity) else {
            return;
        };
        let anchored = self
            .deformers
            .get(deformed.deformer)
            .and_then(|d| d.paths.get(&deformed.path_id))
            .filter(|path| path.use_aabb_anchor)
            .map(|path| {
                let aabb = transforms.aabb(entity).copied().unwrap_or_default();
                Box::new(anchored_path(path, &aabb))
            });

        if let Some(deformed) = self.deformed.get_mut(entity) {
            deformed.anchored_path = anchored;
        }
    }

    /// Refresh the undeformed deformer-from-entity cache of `entity`.
    ///
    /// Returns false when the entity must not be deformed: records are
    /// missing, the parent is not deformed, or the entity is its own deformer
    /// (whose cache becomes identity).
    fn prep_undeformed_space(&mut self, transforms: &TransformSystem, entity: Entity, local_sqt: &Sqt) -> bool {
        let Some(deformed) = self.deformed.get(entity) else {
            error!("Missing deformed, skipping deformation for entity: {}", entity);
            return false;
        };
        let deformer = deformed.deformer;
        if !self.deformers.contains(deformer) {
            error!("Missing deformer, skipping deformation for entity: {}", entity);
            return false;
        }

        if deformer == entity {
            if let Some(deformed) = self.deformed.get_mut(entity) {
                deformed.undeformed_space.store(Mat4::identity());
            }
            return false;
        }

        let parent = transforms.parent(entity);
        let Some(deformer_from_parent) = self.parent_undeformed_space(parent) else {
            error!("A deformed entity {} has non deformed parent {}. It will not deform.", entity, parent);
            return false;
        };

        if let Some(deformed) = self.deformed.get_mut(entity) {
            deformed.undeformed_space.store(deformer_from_parent * local_sqt.to_matrix());
        }
        true
    }

    fn parent_undeformed_space(&self, parent: Entity) -> Option<Mat4> {
        self.deformed
            .get(parent)
            .filter(|d| !d.deformer.is_null())
            .and_then(|d| d.undeformed_space.get().copied())
    }

    fn cylinder_bend_matrix(&mut self, transforms: &TransformSystem, entity: Entity, local_sqt: &Sqt) -> Option<Mat4> {
        if !self.prep_undeformed_space(transforms, entity, local_sqt) {
            return None;
        }
        let deformed = self.deformed.get(entity)?;
        let deformer = self.deformers.get(deformed.deformer)?;
        let world_from_deformer = transforms.world_from_entity(deformer.entity)?;
        let deformer_from_entity = deformed.undeformed_space.get()?;

        Some(world_from_deformer * bend(deformer_from_entity, deformer.radius, deformer.clamp_angle))
    }

    fn waypoint_matrix(&mut self, transforms: &TransformSystem, entity: Entity, local_sqt: &Sqt) -> Option<Mat4> {
        if !self.prep_undeformed_space(transforms, entity, local_sqt) {
            return None;
        }
        let deformed = self.deformed.get(entity)?;
        let deformer = self.deformers.get(deformed.deformer)?;

        let Some(path) = self.waypoint_path(entity) else {
            error!("Missing deformation path: {}", deformed.path_id);
            return None;
        };

        let deformer_from_entity = deformed.undeformed_space.get()?;
        let (position, rotation) = sample(path, &utils::translation_of(deformer_from_entity))?;
        let deformed_sqt = Sqt::new(position, rotation * local_sqt.rotation, local_sqt.scale);

        let world_from_deformer = transforms.world_from_entity(deformer.entity)?;
        Some(compose_with_parent(&deformed_sqt, Some(world_from_deformer)))
    }

    fn global_cylinder_world_matrix(
        &self,
        entity: Entity,
        radius: f32,
        local_sqt: &Sqt,
        world_from_parent: Option<&Mat4>,
    ) -> Option<Mat4> {
        if self.deformer_of(entity) == entity {
            return None;
        }
        let parent_radius = world_from_parent.map_or(0.0, Mat4Ext::distance_from_y_axis);
        let parent_from_entity = global_cylinder_matrix(local_sqt, parent_radius, radius);
        Some(world_from_parent.map_or(parent_from_entity, |parent| parent * parent_from_entity))
    }

    fn cylinder_bend_local_sqt(
        &self,
        transforms: &TransformSystem,
        entity: Entity,
        world_from_entity: &Mat4,
    ) -> Option<Sqt> {
        let Some(deformed) = self.deformed.get(entity) else {
            error!("Missing deformed, skipping deformation for entity: {}", entity);
            return None;
        };
        let Some(deformer) = self.deformers.get(deformed.deformer) else {
            error!("Missing deformer, skipping deformation for entity: {}", entity);
            return None;
        };
        if deformer.entity == entity {
            return None;
        }

        let parent = transforms.parent(entity);
        let Some(deformer_from_parent) = self.parent_undeformed_space(parent) else {
            error!("A deformed entity {} has non deformed parent {}. It will not deform.", entity, parent);
            return None;
        };

        let deformer_from_world = transforms.world_from_entity(deformer.entity)?.try_inverse()?;
        let deformer_from_entity = deformer_from_world * world_from_entity;
        let undeformed = unbend(&deformer_from_entity, deformer.radius, deformer.clamp_angle);

        Some(local_sqt_relative_to(&undeformed, Some(&deformer_from_parent)))
    }

    fn cylinder_bend_deform_mesh(
        &mut self,
        transforms: &TransformSystem,
        entity: Entity,
        vertices: &mut [f32],
        stride: usize,
    ) {
        let Some(deformed) = self.deformed.get_mut(entity) else {
            return;
        };
        deformed.undeformed_aabb = Aabb::from_vertices(vertices, stride);

        let Some(deformer) = self.deformers.get(deformed.deformer) else {
            return;
        };
        let Some(deformer_from_entity) = deformed.undeformed_space.get() else {
            error!("No undeformed space for {}, skipping mesh deformation", entity);
            return;
        };
        let (Some(world_from_entity), Some(world_from_deformer)) =
            (transforms.world_from_entity(entity), transforms.world_from_entity(deformer.entity))
        else {
            return;
        };
        let Some(entity_from_world) = world_from_entity.try_inverse() else {
            error!("Singular world matrix for {}, skipping mesh deformation", entity);
            return;
        };

        // Root space sits on the cylinder axis, `radius` along +Z from the deformer
        let radius = deformer.radius;
        let root_offset = Vec3::z() * radius;
        let root_from_entity = Mat4::new_translation(&-root_offset) * deformer_from_entity;
        let entity_from_root = entity_from_world * world_from_deformer * Mat4::new_translation(&root_offset);

        if let Err(e) = apply_deformation(vertices, stride, |position| {
            let wrapped = deform_point(&transform_position(&root_from_entity, position), radius);
            transform_position(&entity_from_root, &wrapped)
        }) {
            error!("Skipping mesh deformation for {}: {}", entity, e);
        }
    }

    fn global_cylinder_deform_mesh(
        &self,
        transforms: &TransformSystem,
        entity: Entity,
        vertices: &mut [f32],
        stride: usize,
    ) {
        let deform_radius = self.deform_radius(entity);
        let current_radius = transforms.world_from_entity(entity).map_or(0.0, Mat4Ext::distance_from_y_axis);
        let offset = Vec3::z() * current_radius;

        if let Err(e) = apply_deformation(vertices, stride, |position| {
            deform_point(&(position - offset), deform_radius) + offset
        }) {
            error!("Skipping mesh deformation for {}: {}", entity, e);
        }
    }
}

impl Default for DeformSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixHookHandler for DeformSystem {
    fn world_from_entity(
        &mut self,
        transforms: &TransformSystem,
        entity: Entity,
        hook: MatrixHook,
        local_sqt: &Sqt,
        world_from_parent: Option<&Mat4>,
    ) -> Option<Mat4> {
        match hook {
            MatrixHook::GlobalCylinder { radius } => {
                self.global_cylinder_world_matrix(entity, radius, local_sqt, world_from_parent)
            }
            MatrixHook::CylinderBend => self.cylinder_bend_matrix(transforms, entity, local_sqt),
            MatrixHook::Waypoint => self.waypoint_matrix(transforms, entity, local_sqt),
        }
    }

    fn local_sqt_from_world(
        &self,
        transforms: &TransformSystem,
        entity: Entity,
        hook: MatrixHook,
        world_from_entity: &Mat4,
        _world_from_parent: Option<&Mat4>,
    ) -> Option<Sqt> {
        match hook {
            MatrixHook::CylinderBend => self.cylinder_bend_local_sqt(transforms, entity, world_from_entity),
            MatrixHook::GlobalCylinder { .. } | MatrixHook::Waypoint => None,
        }
    }
}

impl MeshDeformer for DeformSystem {
    fn deform_mesh(&mut self, transforms: &TransformSystem, entity: Entity, vertices: &mut [f32], stride: usize) {
        match self.deform_mode(entity) {
            DeformMode::CylinderBend => self.cylinder_bend_deform_mesh(transforms, entity, vertices, stride),
            // Wraps around the axis the entity currently sits on, not the deformer's
            DeformMode::GlobalCylinder => self.global_cylinder_deform_mesh(transforms, entity, vertices, stride),
            DeformMode::Waypoint => {}
            DeformMode::None => error!("Invalid deformer, skipping deformation for entity: {}", entity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WaypointDef, WaypointPathDef};
    use crate::ecs::systems::transform_system::PlainComposition;
    use crate::render::{Mesh, Vertex};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;
    const RADIUS: f32 = 2.0;

    struct Fixture {
        transforms: TransformSystem,
        meshes: MeshSystem,
        deform: DeformSystem,
        next_id: u32,
    }

    impl Fixture {
        fn new() -> Self {
            crate::foundation::logging::init_for_tests();
            Self {
                transforms: TransformSystem::new(),
                meshes: MeshSystem::new(),
                deform: DeformSystem::new(),
                next_id: 1,
            }
        }

        fn spawn(&mut self, x: f32) -> Entity {
            let entity = Entity::from_raw(self.next_id);
            self.next_id += 1;
            self.transforms.create(entity, Sqt::from_translation(Vec3::new(x, 0.0, 0.0))).unwrap();
            entity
        }

        fn parent(&mut self, parent: Entity, child: Entity) {
            self.transforms.add_child(parent, child, &mut self.deform).unwrap();
            for event in self.transforms.drain_events() {
                if let crate::events::EntityEvent::ParentChanged { target, new_parent, .. } = event {
                    self.deform.on_parent_changed(&mut self.transforms, target, new_parent);
                }
            }
        }

        fn world_position(&self, entity: Entity) -> Vec3 {
            utils::translation_of(self.transforms.world_from_entity(entity).unwrap())
        }
    }

    #[test]
    fn test_invalid_definitions_are_rejected() {
        let mut f = Fixture::new();
        let a = f.spawn(0.0);

        assert_eq!(
            f.deform.create_deformer(&mut f.transforms, &mut f.meshes, a, &DeformerDef::waypoint(Vec::new())),
            Err(DeformError::MissingWaypointPaths { entity: a })
        );
        assert_eq!(
            f.deform.create_deformer(&mut f.transforms, &mut f.meshes, a, &DeformerDef::cylinder_bend(0.0)),
            Err(DeformError::InvalidRadius { entity: a, radius: 0.0 })
        );
        assert!(!f.deform.is_set_as_deformed(a));
        assert!(!f.meshes.has_deformation(a));
    }

    #[test]
    fn test_empty_and_duplicate_paths_are_skipped() {
        let mut f = Fixture::new();
        let a = f.spawn(0.0);
        let path = |id: &str, waypoints: usize| WaypointPathDef {
            path_id: id.to_string(),
            waypoints: vec![WaypointDef::default(); waypoints],
            use_aabb_anchor: false,
        };
        let def = DeformerDef::waypoint(vec![path("a", 1), path("a", 2), path("empty", 0), path("b", 1)]);

        f.deform.create_deformer(&mut f.transforms, &mut f.meshes, a, &def).unwrap();

        let deformer = f.deform.deformers.get(a).unwrap();
        assert_eq!(deformer.paths.len(), 2);
        assert_eq!(deformer.paths[&PathId::from("a")].waypoints.len(), 1);
        assert!(deformer.paths.contains_key(&PathId::from("b")));
    }

    #[test]
    fn test_deformer_governs_itself_without_moving() {
        let mut f = Fixture::new();
        let a = f.spawn(3.0);
        f.deform
            .create_deformer(&mut f.transforms, &mut f.meshes, a, &DeformerDef::cylinder_bend(RADIUS))
            .unwrap();

        assert_eq!(f.deform.deformer_of(a), a);
        assert_eq!(f.transforms.matrix_hook(a), Some(MatrixHook::CylinderBend));
        assert_relative_eq!(f.world_position(a), Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert_eq!(
            f.deform.deformed.get(a).unwrap().undeformed_space.get(),
            Some(&Mat4::identity())
        );
    }

    #[test]
    fn test_global_cylinder_children_wrap_around_parent_axis() {
        let mut f = Fixture::new();
        let root = f.spawn(0.0);
        let child = f.spawn(0.0);
        f.deform
            .create_deformer(
                &mut f.transforms,
                &mut f.meshes,
                root,
                &DeformerDef::cylinder_bend(RADIUS).with_mode(DeformMode::GlobalCylinder),
            )
            .unwrap();
        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, child, PathId::default());
        f.parent(root, child);
        assert_eq!(f.transforms.matrix_hook(child), Some(MatrixHook::GlobalCylinder { radius: RADIUS }));

        // In front of the axis at distance RADIUS, then a quarter turn along the surface
        let mut sqt = Sqt::from_translation(Vec3::new(0.0, 1.0, -RADIUS));
        f.transforms.set_local_sqt(child, sqt.clone(), &mut f.deform).unwrap();
        assert_relative_eq!(f.world_position(child), Vec3::new(0.0, 1.0, -RADIUS), epsilon = EPSILON);

        sqt.translation.x = constants::HALF_PI * RADIUS;
        f.transforms.set_local_sqt(child, sqt, &mut f.deform).unwrap();
        assert_relative_eq!(f.world_position(child), Vec3::new(RADIUS, 1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(f.world_position(root), Vec3::zeros(), epsilon = EPSILON);
    }

    #[test]
    fn test_replacing_deformer_reapplies_mode() {
        let mut f = Fixture::new();
        let root = f.spawn(0.0);
        let child = f.spawn(1.0);
        f.deform
            .create_deformer(&mut f.transforms, &mut f.meshes, root, &DeformerDef::cylinder_bend(RADIUS))
            .unwrap();
        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, child, PathId::default());
        f.parent(root, child);
        assert_eq!(f.transforms.matrix_hook(child), Some(MatrixHook::CylinderBend));

        let def = DeformerDef::cylinder_bend(RADIUS).with_mode(DeformMode::None);
        f.deform.create_deformer(&mut f.transforms, &mut f.meshes, root, &def).unwrap();

        assert_eq!(f.deform.deform_mode(child), DeformMode::None);
        assert_eq!(f.transforms.matrix_hook(child), None);
        assert_relative_eq!(f.world_position(child), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_path_change_moves_entity() {
        let mut f = Fixture::new();
        let root = f.spawn(0.0);
        let child = f.spawn(0.0);
        let path = |id: &str, y: f32| WaypointPathDef {
            path_id: id.to_string(),
            waypoints: vec![WaypointDef {
                remapped_position: Vec3::new(0.0, y, 0.0),
                ..Default::default()
            }],
            use_aabb_anchor: false,
        };
        let def = DeformerDef::waypoint(vec![path("low", 1.0), path("high", 5.0)]);
        f.deform.create_deformer(&mut f.transforms, &mut f.meshes, root, &def).unwrap();
        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, child, PathId::from("low"));
        f.parent(root, child);
        assert_relative_eq!(f.world_position(child).y, 1.0, epsilon = EPSILON);

        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, child, PathId::from("high"));
        assert_relative_eq!(f.world_position(child).y, 5.0, epsilon = EPSILON);
        assert_eq!(f.deform.waypoint_path(child).map(|p| p.path_id.as_str()), Some("high"));
    }

    #[test]
    fn test_missing_path_falls_back_to_plain_composition() {
        let mut f = Fixture::new();
        let root = f.spawn(0.0);
        let child = f.spawn(2.0);
        let def = DeformerDef::waypoint(vec![WaypointPathDef {
            waypoints: vec![WaypointDef::default()],
            ..Default::default()
        }]);
        f.deform.create_deformer(&mut f.transforms, &mut f.meshes, root, &def).unwrap();
        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, child, PathId::from("nowhere"));
        f.parent(root, child);

        assert!(f.deform.is_deformed(child));
        assert_relative_eq!(f.world_position(child), Vec3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_deformer_mesh_wraps_around_cylinder() {
        let mut f = Fixture::new();
        let root = f.spawn(0.0);
        f.deform
            .create_deformer(&mut f.transforms, &mut f.meshes, root, &DeformerDef::cylinder_bend(RADIUS))
            .unwrap();

        let mut mesh = Mesh::plane(2.0, 2.0, 2, 1);
        let before = mesh.bounding_box();
        f.deform.deform_mesh(&f.transforms, root, mesh.vertex_floats_mut(), Vertex::FLOAT_STRIDE);

        assert_eq!(f.deform.undeformed_bounding_box(root), Some(&before));
        // Right edge at x = 1 lands on the arc of the same length
        let right = Vec3::from(mesh.vertices[2].position);
        assert_relative_eq!(
            right,
            Vec3::new(RADIUS * 0.5_f32.sin(), -1.0, RADIUS * (1.0 - 0.5_f32.cos())),
            epsilon = EPSILON
        );
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_global_cylinder_mesh_wraps_around_current_radius() {
        let mut f = Fixture::new();
        let entity = f.spawn(0.0);
        f.transforms
            .set_local_sqt(entity, Sqt::from_translation(Vec3::new(0.0, 0.0, 1.0)), &mut PlainComposition)
            .unwrap();
        let def = DeformerDef::cylinder_bend(RADIUS).with_mode(DeformMode::GlobalCylinder);
        f.deform.create_deformer(&mut f.transforms, &mut f.meshes, entity, &def).unwrap();
        assert_relative_eq!(f.world_position(entity), Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);

        let mut vertices = [RADIUS * constants::HALF_PI, 0.0, 0.0];
        f.deform.deform_mesh(&f.transforms, entity, &mut vertices, 3);

        // Quarter turn around an axis one unit behind the entity
        assert_relative_eq!(Vec3::from(vertices), Vec3::new(1.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_mesh_without_deformer_is_untouched() {
        let mut f = Fixture::new();
        let entity = f.spawn(0.0);
        f.deform.set_as_deformed(&mut f.transforms, &mut f.meshes, entity, PathId::default());

        let mut mesh = Mesh::cube();
        f.deform.deform_mesh(&f.transforms, entity, mesh.vertex_floats_mut(), Vertex::FLOAT_STRIDE);
        assert_eq!(mesh, Mesh::cube());
    }
}
