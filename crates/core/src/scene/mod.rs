//! In-memory stand-in for the host application's scene graph.
//!
//! Models the narrow slice of a 3D host the rig needs: named objects with
//! constraint stacks, hidden grouping collections, a shared action table
//! with user counting, and per-frame driver evaluation. The whole scene is
//! serde-serializable so callers can persist it like a host scene file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ShakeInstance;
use crate::curves::LoopAction;
use crate::driver::{Driver, PropertyPath, ScenePath, SlotField, VarResolver, VarTarget};
use crate::{ShakeRigError, Result};

/// Plain location / euler-rotation / scale transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: [f32; 3],
    pub rotation_euler: [f32; 3],
    pub scale: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        location: [0.0; 3],
        rotation_euler: [0.0; 3],
        scale: [1.0; 3],
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Space a constraint reads its target in / writes its owner in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceMode {
    World,
    Local,
}

/// How a constraint's result combines with the owner's existing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixMode {
    Before,
    After,
}

/// Constraint behaviors supported by the host model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    CopyLocation {
        target: String,
        target_space: SpaceMode,
        owner_space: SpaceMode,
        /// Add the target's location on top instead of replacing.
        use_offset: bool,
    },
    CopyRotation {
        target: String,
        target_space: SpaceMode,
        owner_space: SpaceMode,
        mix: MixMode,
    },
    /// Plays a bound action on the owner. With `use_eval_time`, playback is
    /// steered by the normalized eval-time input instead of the timeline.
    Action {
        action: String,
        frame_start: i32,
        frame_end: i32,
        use_eval_time: bool,
        mix: MixMode,
        eval_time: f32,
        eval_time_driver: Option<Driver>,
    },
}

/// One entry in an object's constraint stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub influence: f32,
    pub influence_driver: Option<Driver>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            influence: 1.0,
            influence_driver: None,
        }
    }

    /// Whether this constraint exposes the eval-time input the rig's playback
    /// drivers attach to. Always false for non-action constraints.
    pub fn supports_eval_time(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Action {
                use_eval_time: true,
                ..
            }
        )
    }

    /// Detaches the influence driver, if any. No-op otherwise.
    pub fn remove_influence_driver(&mut self) {
        self.influence_driver = None;
    }

    /// Detaches the eval-time driver, if any. No-op for other kinds.
    pub fn remove_eval_time_driver(&mut self) {
        if let ConstraintKind::Action {
            eval_time_driver, ..
        } = &mut self.kind
        {
            *eval_time_driver = None;
        }
    }
}

/// Object payload: either a camera carrying its shake list, or an empty
/// helper object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectData {
    Camera { shakes: Vec<ShakeInstance> },
    Empty,
}

/// A named object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
    pub transform: Transform,
    pub constraints: Vec<Constraint>,
    /// Animation data link to an action, by name.
    pub action_link: Option<String>,
}

impl SceneObject {
    pub fn camera(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: ObjectData::Camera { shakes: Vec::new() },
            transform: Transform::IDENTITY,
            constraints: Vec::new(),
            action_link: None,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: ObjectData::Empty,
            transform: Transform::IDENTITY,
            constraints: Vec::new(),
            action_link: None,
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self.data, ObjectData::Camera { .. })
    }

    pub fn shakes(&self) -> Option<&[ShakeInstance]> {
        match &self.data {
            ObjectData::Camera { shakes } => Some(shakes),
            ObjectData::Empty => None,
        }
    }

    pub fn reset_transform(&mut self) {
        self.transform = Transform::IDENTITY;
    }

    /// Clears the animation link. No-op when none is set.
    pub fn clear_action_link(&mut self) {
        self.action_link = None;
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> &mut Constraint {
        self.constraints.push(constraint);
        self.constraints
            .last_mut()
            .expect("constraint stack cannot be empty after push")
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

/// Feature set of the host the scene stands in for. The rig probes these
/// after creating constraints, mirroring a version check against a live
/// host API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Action constraints expose an evaluation-time input.
    pub action_eval_time: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            action_eval_time: true,
        }
    }
}

/// A grouping of objects with hierarchical visibility flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub hide_viewport: bool,
    pub hide_render: bool,
    pub hide_select: bool,
    pub excluded_from_view_layers: bool,
    /// Whether the collection is linked under the scene root.
    pub linked: bool,
    members: Vec<String>,
}

impl Collection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hide_viewport: false,
            hide_render: false,
            hide_select: false,
            excluded_from_view_layers: false,
            linked: false,
            members: Vec::new(),
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, object: &str) -> bool {
        self.members.iter().any(|member| member == object)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The scene graph: objects, collections, and the shared action table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Playback frame rate.
    pub fps: f32,
    /// World unit scale, read live by location influence drivers.
    pub unit_scale: f32,
    #[serde(default)]
    pub capabilities: HostCapabilities,
    objects: BTreeMap<String, SceneObject>,
    collections: BTreeMap<String, Collection>,
    actions: BTreeMap<String, LoopAction>,
}

impl Scene {
    pub fn new(fps: f32) -> Self {
        Self {
            fps,
            unit_scale: 1.0,
            capabilities: HostCapabilities::default(),
            objects: BTreeMap::new(),
            collections: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    /// Reads a scene from a JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Writes the scene to a JSON file.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //----------------
    // Objects.
    //----------------

    /// Inserts an object under its name. A name collision keeps the existing
    /// object untouched and discards the new one. Returns the stored object
    /// and whether the insertion happened.
    pub fn add_object(&mut self, object: SceneObject) -> (&mut SceneObject, bool) {
        let inserted = !self.objects.contains_key(&object.name);
        let name = object.name.clone();
        (self.objects.entry(name).or_insert(object), inserted)
    }

    /// Fetches the named empty, creating it when absent.
    pub fn ensure_empty(&mut self, name: &str) -> &mut SceneObject {
        self.objects
            .entry(name.to_string())
            .or_insert_with(|| SceneObject::empty(name))
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.get_mut(name)
    }

    /// Deletes an object and strips it from any collection membership.
    /// No-op when the object does not exist.
    pub fn remove_object(&mut self, name: &str) {
        self.objects.remove(name);
        for collection in self.collections.values_mut() {
            collection.members.retain(|member| member != name);
        }
    }

    /// Names of all cameras, in stable order.
    pub fn cameras(&self) -> Vec<String> {
        self.objects
            .values()
            .filter(|object| object.is_camera())
            .map(|object| object.name.clone())
            .collect()
    }

    /// The shake list of the named camera.
    pub fn camera_shakes(&self, camera: &str) -> Result<&[ShakeInstance]> {
        let object = self
            .object(camera)
            .ok_or_else(|| ShakeRigError::UnknownObject(camera.to_string()))?;
        object
            .shakes()
            .ok_or_else(|| ShakeRigError::NotACamera(camera.to_string()))
    }

    /// Mutable access to the shake list of the named camera.
    pub fn camera_shakes_mut(&mut self, camera: &str) -> Result<&mut Vec<ShakeInstance>> {
        let object = self
            .objects
            .get_mut(camera)
            .ok_or_else(|| ShakeRigError::UnknownObject(camera.to_string()))?;
        match &mut object.data {
            ObjectData::Camera { shakes } => Ok(shakes),
            ObjectData::Empty => Err(ShakeRigError::NotACamera(camera.to_string())),
        }
    }

    //----------------
    // Collections.
    //----------------

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.collections.get_mut(name)
    }

    /// Fetches the named collection, creating an unlinked one when absent.
    /// Returns whether it had to be created.
    pub fn ensure_collection(&mut self, name: &str) -> (&mut Collection, bool) {
        let created = !self.collections.contains_key(name);
        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(name));
        (collection, created)
    }

    /// Unlinks the collection from the scene root. No-op when absent.
    pub fn unlink_collection(&mut self, name: &str) {
        if let Some(collection) = self.collections.get_mut(name) {
            collection.linked = false;
        }
    }

    /// Deletes the collection outright. Only permitted once it is unlinked;
    /// a linked collection still has a user and is left alone.
    pub fn remove_collection(&mut self, name: &str) {
        if let Some(collection) = self.collections.get(name) {
            if !collection.linked {
                self.collections.remove(name);
            }
        }
    }

    /// Links an object into a collection. No-op if already a member.
    pub fn link_to_collection(&mut self, object: &str, collection: &str) {
        if let Some(collection) = self.collections.get_mut(collection) {
            if !collection.contains(object) {
                collection.members.push(object.to_string());
            }
        }
    }

    //----------------
    // Actions.
    //----------------

    pub fn action(&self, name: &str) -> Option<&LoopAction> {
        self.actions.get(name)
    }

    pub fn insert_action(&mut self, action: LoopAction) {
        self.actions.insert(action.name.clone(), action);
    }

    /// Deletes an action. Only permitted at zero users; otherwise a no-op.
    pub fn remove_action(&mut self, name: &str) {
        if self.action_users(name) == 0 {
            self.actions.remove(name);
        }
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Number of references to an action: animation links plus action
    /// constraints bound to it.
    pub fn action_users(&self, name: &str) -> usize {
        self.objects
            .values()
            .map(|object| {
                let links = usize::from(object.action_link.as_deref() == Some(name));
                let constraints = object
                    .constraints
                    .iter()
                    .filter(|constraint| {
                        matches!(
                            &constraint.kind,
                            ConstraintKind::Action { action, .. } if action == name
                        )
                    })
                    .count();
                links + constraints
            })
            .sum()
    }

    //----------------
    // Evaluation.
    //----------------

    /// Evaluates an object's final transform at a frame, applying its
    /// constraint stack in order with all drivers resolved live.
    ///
    /// Rotation composition is small-angle additive, which is accurate for
    /// shake-sized perturbations.
    pub fn evaluate_object(&self, name: &str, frame: f32) -> Result<Transform> {
        self.evaluate_object_inner(name, frame, &mut Vec::new())
    }

    /// Recursive worker for [`Scene::evaluate_object`]. `chain` holds the
    /// names currently being evaluated; re-entering one of them means the
    /// constraint targets loop back on themselves.
    fn evaluate_object_inner<'a>(
        &'a self,
        name: &str,
        frame: f32,
        chain: &mut Vec<&'a str>,
    ) -> Result<Transform> {
        if chain.iter().any(|entry| *entry == name) {
            return Err(ShakeRigError::ConstraintCycle(name.to_string()));
        }
        let object = self
            .object(name)
            .ok_or_else(|| ShakeRigError::UnknownObject(name.to_string()))?;
        chain.push(&object.name);
        let mut result = object.transform;

        for constraint in &object.constraints {
            let influence = match &constraint.influence_driver {
                Some(driver) => driver.evaluate(frame, self)?,
                None => constraint.influence,
            }
            .clamp(0.0, 1.0);
            if influence == 0.0 {
                continue;
            }

            match &constraint.kind {
                ConstraintKind::Action {
                    action,
                    frame_start,
                    frame_end,
                    use_eval_time,
                    eval_time,
                    eval_time_driver,
                    mix: _,
                } => {
                    // A dangling action reference contributes nothing.
                    let Some(action) = self.actions.get(action) else {
                        continue;
                    };
                    let pose = if *use_eval_time {
                        let t = match eval_time_driver {
                            Some(driver) => driver.evaluate(frame, self)?,
                            None => *eval_time,
                        }
                        .clamp(0.0, 1.0);
                        let span = (*frame_end - *frame_start) as f32;
                        action.sample(*frame_start as f32 + t * span)
                    } else {
                        action.sample(frame)
                    };
                    for axis in 0..3 {
                        result.location[axis] += pose.location[axis] * influence;
                        result.rotation_euler[axis] += pose.rotation_euler[axis] * influence;
                    }
                }
                ConstraintKind::CopyLocation {
                    target, use_offset, ..
                } => {
                    let target = self.evaluate_object_inner(target, frame, chain)?;
                    for axis in 0..3 {
                        if *use_offset {
                            result.location[axis] += target.location[axis] * influence;
                        } else {
                            result.location[axis] = result.location[axis] * (1.0 - influence)
                                + target.location[axis] * influence;
                        }
                    }
                }
                ConstraintKind::CopyRotation { target, .. } => {
                    let target = self.evaluate_object_inner(target, frame, chain)?;
                    for axis in 0..3 {
                        result.rotation_euler[axis] += target.rotation_euler[axis] * influence;
                    }
                }
            }
        }

        chain.pop();
        Ok(result)
    }
}

impl VarResolver for Scene {
    fn resolve(&self, target: &VarTarget) -> Option<f32> {
        match target {
            VarTarget::SceneProperty {
                path: ScenePath::UnitScale,
            } => Some(self.unit_scale),
            VarTarget::ObjectProperty {
                object,
                path: PropertyPath::ShakeSlot { slot, field },
            } => {
                let shakes = self.object(object)?.shakes()?;
                let instance = shakes.get(*slot)?;
                Some(match field {
                    SlotField::Influence => instance.influence,
                    SlotField::Scale => instance.scale,
                    SlotField::UseManualTiming => {
                        if instance.use_manual_timing {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    SlotField::Time => instance.time,
                    SlotField::Speed => instance.speed,
                    SlotField::Offset => instance.offset,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{build_loop_action, LOCATION_PATH};
    use crate::driver::Expr;
    use crate::library::{ChannelKey, ShakeCurveSet};
    use std::collections::BTreeMap;

    fn ramp_action(name: &str) -> LoopAction {
        let mut channels = BTreeMap::new();
        channels.insert(
            ChannelKey::new(LOCATION_PATH, 0),
            vec![(0.0, 0.0), (10.0, 10.0)],
        );
        let set = ShakeCurveSet::new("Ramp", 24.0, channels).unwrap();
        build_loop_action(&set, name, 10.0, 1000.0)
    }

    #[test]
    fn add_object_keeps_the_existing_object_on_name_collision() {
        let mut scene = Scene::new(24.0);
        let (camera, inserted) = scene.add_object(SceneObject::camera("Camera"));
        assert!(inserted);
        camera.transform.location = [1.0, 0.0, 0.0];

        let (kept, inserted) = scene.add_object(SceneObject::empty("Camera"));
        assert!(!inserted);
        assert!(kept.is_camera());
        assert_eq!(kept.transform.location, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn removing_a_missing_object_is_a_no_op() {
        let mut scene = Scene::new(24.0);
        scene.remove_object("ghost");
        assert!(scene.cameras().is_empty());
    }

    #[test]
    fn action_users_counts_links_and_constraints() {
        let mut scene = Scene::new(24.0);
        scene.insert_action(ramp_action("ramp"));
        assert_eq!(scene.action_users("ramp"), 0);

        let (empty, _) = scene.add_object(SceneObject::empty("helper"));
        empty.action_link = Some("ramp".to_string());
        empty.add_constraint(Constraint::new(
            "play",
            ConstraintKind::Action {
                action: "ramp".to_string(),
                frame_start: 0,
                frame_end: 10,
                use_eval_time: true,
                mix: MixMode::Before,
                eval_time: 0.0,
                eval_time_driver: None,
            },
        ));
        assert_eq!(scene.action_users("ramp"), 2);

        scene.remove_action("ramp");
        assert!(scene.action("ramp").is_some());

        scene.remove_object("helper");
        scene.remove_action("ramp");
        assert!(scene.action("ramp").is_none());
    }

    #[test]
    fn copy_location_offset_adds_target_location() {
        let mut scene = Scene::new(24.0);
        scene.insert_action(ramp_action("ramp"));

        let (helper, _) = scene.add_object(SceneObject::empty("helper"));
        helper.add_constraint(Constraint::new(
            "play",
            ConstraintKind::Action {
                action: "ramp".to_string(),
                frame_start: 0,
                frame_end: 10,
                use_eval_time: true,
                mix: MixMode::Before,
                eval_time: 0.5,
                eval_time_driver: None,
            },
        ));

        let (camera, _) = scene.add_object(SceneObject::camera("Camera"));
        camera.transform.location = [1.0, 2.0, 3.0];
        camera.add_constraint(Constraint::new(
            "follow",
            ConstraintKind::CopyLocation {
                target: "helper".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                use_offset: true,
            },
        ));

        let transform = scene.evaluate_object("Camera", 0.0).unwrap();
        assert!((transform.location[0] - 6.0).abs() < 1e-5);
        assert_eq!(transform.location[1], 2.0);
    }

    #[test]
    fn influence_driver_is_read_live() {
        let mut scene = Scene::new(24.0);
        scene.insert_action(ramp_action("ramp"));

        let (helper, _) = scene.add_object(SceneObject::empty("helper"));
        helper.transform.location = [4.0, 0.0, 0.0];

        let (camera, _) = scene.add_object(SceneObject::camera("Camera"));
        match &mut camera.data {
            ObjectData::Camera { shakes } => {
                shakes.push(crate::config::ShakeInstance::new("HANDHELD"))
            }
            ObjectData::Empty => unreachable!(),
        }
        let constraint = camera.add_constraint(Constraint::new(
            "follow",
            ConstraintKind::CopyLocation {
                target: "helper".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                use_offset: true,
            },
        ));
        constraint.influence_driver = Some(Driver::new(
            Expr::var("influence").div(Expr::Const(10.0)),
            vec![crate::driver::DriverVar::new(
                "influence",
                VarTarget::ObjectProperty {
                    object: "Camera".to_string(),
                    path: PropertyPath::ShakeSlot {
                        slot: 0,
                        field: SlotField::Influence,
                    },
                },
            )],
        ));

        let before = scene.evaluate_object("Camera", 0.0).unwrap();
        assert!((before.location[0] - 0.4).abs() < 1e-6);

        scene.camera_shakes_mut("Camera").unwrap()[0].set_influence(5.0);
        let after = scene.evaluate_object("Camera", 0.0).unwrap();
        assert!((after.location[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn cyclic_constraint_targets_error_instead_of_recursing() {
        let mut scene = Scene::new(24.0);
        let (camera, _) = scene.add_object(SceneObject::camera("Camera"));
        camera.add_constraint(Constraint::new(
            "follow",
            ConstraintKind::CopyLocation {
                target: "Camera".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                use_offset: true,
            },
        ));
        assert!(matches!(
            scene.evaluate_object("Camera", 1.0),
            Err(ShakeRigError::ConstraintCycle(name)) if name == "Camera"
        ));

        // Mutual targets loop through an intermediate object too.
        let (a, _) = scene.add_object(SceneObject::empty("a"));
        a.add_constraint(Constraint::new(
            "to_b",
            ConstraintKind::CopyRotation {
                target: "b".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                mix: MixMode::After,
            },
        ));
        let (b, _) = scene.add_object(SceneObject::empty("b"));
        b.add_constraint(Constraint::new(
            "to_a",
            ConstraintKind::CopyRotation {
                target: "a".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                mix: MixMode::After,
            },
        ));
        assert!(matches!(
            scene.evaluate_object("a", 1.0),
            Err(ShakeRigError::ConstraintCycle(_))
        ));

        // A diamond is fine: two constraints may share a target as long as
        // no path loops back.
        let (shared, _) = scene.add_object(SceneObject::empty("shared"));
        shared.transform.location = [1.0, 0.0, 0.0];
        let (top, _) = scene.add_object(SceneObject::camera("Top"));
        for name in ["first", "second"] {
            top.add_constraint(Constraint::new(
                name,
                ConstraintKind::CopyLocation {
                    target: "shared".to_string(),
                    target_space: SpaceMode::World,
                    owner_space: SpaceMode::Local,
                    use_offset: true,
                },
            ));
        }
        let transform = scene.evaluate_object("Top", 1.0).unwrap();
        assert!((transform.location[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn collection_removal_requires_unlink() {
        let mut scene = Scene::new(24.0);
        let (collection, created) = scene.ensure_collection("group");
        assert!(created);
        collection.linked = true;

        scene.remove_collection("group");
        assert!(scene.collection("group").is_some());

        scene.unlink_collection("group");
        scene.remove_collection("group");
        assert!(scene.collection("group").is_none());
    }
}
