//! Shake rig synthesis.
//!
//! For every slot in a camera's shake list the synthesizer maintains one
//! hidden empty playing the shake's loop action, plus a copy-location and a
//! copy-rotation constraint on the camera targeting that empty. There is no
//! incremental update: any configuration change tears the camera's rig down
//! completely and rebuilds it, which keeps rebuilds idempotent and never
//! leaks helper data.

use crate::config::{ShakeInstance, INFLUENCE_MAX, SCALE_MAX, UNIT_SCALE_MAX};
use crate::curves::build_loop_action;
use crate::driver::{Driver, DriverVar, Expr, PropertyPath, ScenePath, SlotField, VarTarget};
use crate::library::ShakeLibrary;
use crate::scene::{
    Collection, Constraint, ConstraintKind, MixMode, Scene, SpaceMode,
};
use crate::{ShakeRigError, Result};

/// Namespace tag for everything the rig creates. Teardown matches against
/// names derived from this tag, so it must stay stable across versions.
pub const BASE_NAME: &str = "CameraShakeRig";

/// Name of the shared hidden collection holding all shake empties.
pub fn collection_name() -> &'static str {
    BASE_NAME
}

/// Name of the shared loop action for a shake type.
pub fn action_name(shake_type: &str) -> String {
    format!("{BASE_NAME}_{}", shake_type.to_lowercase())
}

/// Name of the hidden empty for one (camera, slot) pair.
pub fn shake_object_name(camera: &str, slot: usize) -> String {
    format!("{BASE_NAME}_{camera}_{slot}")
}

/// Name of the camera's location constraint for a slot.
pub fn location_constraint_name(slot: usize) -> String {
    format!("{BASE_NAME}_loc_{slot}")
}

/// Name of the camera's rotation constraint for a slot.
pub fn rotation_constraint_name(slot: usize) -> String {
    format!("{BASE_NAME}_rot_{slot}")
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Exact structural match for rig-owned camera constraints: the full tag,
/// a `loc`/`rot` marker, and an all-digit slot suffix. A plain prefix check
/// would also catch unrelated constraints that merely share the tag.
fn is_rig_constraint(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(BASE_NAME) else {
        return false;
    };
    match rest.strip_prefix("_loc_").or_else(|| rest.strip_prefix("_rot_")) {
        Some(slot) => is_digits(slot),
        None => false,
    }
}

/// Exact structural match for the shake empties of one camera.
fn is_camera_shake_object(name: &str, camera: &str) -> bool {
    name.strip_prefix(BASE_NAME)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_prefix(camera))
        .and_then(|rest| rest.strip_prefix('_'))
        .map_or(false, is_digits)
}

/// Direction for [`RigSynthesizer::move_shake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Builds and repairs camera shake rigs against a scene.
#[derive(Debug)]
pub struct RigSynthesizer<'a> {
    library: &'a ShakeLibrary,
}

impl<'a> RigSynthesizer<'a> {
    pub fn new(library: &'a ShakeLibrary) -> Self {
        Self { library }
    }

    /// Tears down and rebuilds the named camera's entire shake rig from its
    /// current configuration list.
    ///
    /// On any build failure the teardown is re-run, so the camera ends up
    /// rig-less rather than with a partially wired rig.
    pub fn rebuild(&self, scene: &mut Scene, camera: &str) -> Result<()> {
        let slot_count = scene.camera_shakes(camera)?.len();
        tracing::debug!(camera, slots = slot_count, "rebuilding camera shake rig");

        ensure_rig_collection(scene);
        teardown_camera(scene, camera);

        for index in 0..slot_count {
            if let Err(error) = self.build_slot(scene, camera, index) {
                tracing::warn!(camera, slot = index, %error, "rig build failed, tearing down");
                teardown_camera(scene, camera);
                cleanup(scene);
                return Err(error);
            }
        }

        cleanup(scene);
        Ok(())
    }

    /// Discards every rig in the scene and re-synthesizes all of them.
    /// Recovers from structural edits (duplicated cameras, deleted empties)
    /// that per-camera rebuilds cannot detect.
    pub fn repair_all(&self, scene: &mut Scene) -> Result<()> {
        tracing::info!("repairing camera shake rigs across the scene");

        // Delete the shared collection and everything in it, detaching
        // drivers before their carriers go away.
        if scene.collection(collection_name()).is_some() {
            let members: Vec<String> = scene
                .collection(collection_name())
                .map(|collection| collection.members().to_vec())
                .unwrap_or_default();
            for name in members {
                if let Some(object) = scene.object_mut(&name) {
                    for constraint in object.constraints.iter_mut() {
                        constraint.remove_eval_time_driver();
                    }
                    object.clear_action_link();
                }
                scene.remove_object(&name);
            }
            scene.unlink_collection(collection_name());
            scene.remove_collection(collection_name());
        }

        purge_unused_actions(scene);

        for camera in scene.cameras() {
            self.rebuild(scene, &camera)?;
        }
        Ok(())
    }

    /// Appends a slot for `shake_type` to the camera and rebuilds. The type
    /// is validated against the library before the configuration is touched.
    pub fn add_shake(&self, scene: &mut Scene, camera: &str, shake_type: &str) -> Result<usize> {
        self.library.lookup(shake_type)?;
        let shakes = scene.camera_shakes_mut(camera)?;
        shakes.push(ShakeInstance::new(shake_type));
        let index = shakes.len() - 1;
        self.rebuild(scene, camera)?;
        Ok(index)
    }

    /// Removes the slot at `index` and rebuilds.
    pub fn remove_shake(&self, scene: &mut Scene, camera: &str, index: usize) -> Result<()> {
        let shakes = scene.camera_shakes_mut(camera)?;
        if index >= shakes.len() {
            return Err(ShakeRigError::SlotOutOfRange {
                camera: camera.to_string(),
                index,
            });
        }
        shakes.remove(index);
        self.rebuild(scene, camera)
    }

    /// Moves the slot at `index` one position up or down and rebuilds.
    /// Moving past either end leaves the order unchanged.
    pub fn move_shake(
        &self,
        scene: &mut Scene,
        camera: &str,
        index: usize,
        direction: MoveDirection,
    ) -> Result<()> {
        let shakes = scene.camera_shakes_mut(camera)?;
        if index >= shakes.len() {
            return Err(ShakeRigError::SlotOutOfRange {
                camera: camera.to_string(),
                index,
            });
        }
        match direction {
            MoveDirection::Up if index > 0 => shakes.swap(index, index - 1),
            MoveDirection::Down if index + 1 < shakes.len() => shakes.swap(index, index + 1),
            _ => {}
        }
        self.rebuild(scene, camera)
    }

    /// Builds the rig for one slot: shared action, hidden empty with its
    /// playback constraint, and the camera's pair of copy constraints.
    fn build_slot(&self, scene: &mut Scene, camera: &str, index: usize) -> Result<()> {
        let instance = scene
            .camera_shakes(camera)?
            .get(index)
            .cloned()
            .ok_or_else(|| ShakeRigError::SlotOutOfRange {
                camera: camera.to_string(),
                index,
            })?;

        // Build-or-reuse the shared loop action for this shake type.
        let curve_set = self.library.lookup(&instance.shake_type)?;
        let action_key = action_name(&instance.shake_type);
        let (source_fps, frame_start, frame_end) = match scene.action(&action_key) {
            Some(action) => (action.source_fps, action.frame_start, action.frame_end),
            None => {
                let action = build_loop_action(
                    curve_set,
                    action_key.clone(),
                    INFLUENCE_MAX,
                    INFLUENCE_MAX * SCALE_MAX * UNIT_SCALE_MAX,
                );
                let info = (action.source_fps, action.frame_start, action.frame_end);
                scene.insert_action(action);
                info
            }
        };
        let action_length = frame_end - frame_start;

        // Create or reuse the slot's hidden empty with a clean slate.
        let object_name = shake_object_name(camera, index);
        {
            let object = scene.ensure_empty(&object_name);
            object.reset_transform();
            object.clear_action_link();
            object.constraints.clear();
        }
        scene.link_to_collection(&object_name, collection_name());

        // Playback constraint on the empty. The eval-time probe doubles as
        // the host version gate and runs before any driver is attached.
        let use_eval_time = scene.capabilities.action_eval_time;
        let scene_fps = scene.fps;
        let object = scene
            .object_mut(&object_name)
            .ok_or_else(|| ShakeRigError::UnknownObject(object_name.clone()))?;
        let constraint = object.add_constraint(Constraint::new(
            "Action",
            ConstraintKind::Action {
                action: action_key.clone(),
                frame_start: frame_start.floor() as i32,
                frame_end: frame_end.ceil() as i32,
                use_eval_time,
                mix: MixMode::Before,
                eval_time: 0.0,
                eval_time_driver: None,
            },
        ));
        if !constraint.supports_eval_time() {
            return Err(ShakeRigError::UnsupportedHostVersion);
        }
        if let ConstraintKind::Action {
            eval_time_driver, ..
        } = &mut constraint.kind
        {
            *eval_time_driver = Some(eval_time_driver_for(
                camera,
                index,
                source_fps,
                scene_fps,
                action_length,
            ));
        }

        // The camera's pair of constraints targeting the empty.
        let camera_object = scene
            .object_mut(camera)
            .ok_or_else(|| ShakeRigError::UnknownObject(camera.to_string()))?;

        let loc = camera_object.add_constraint(Constraint::new(
            location_constraint_name(index),
            ConstraintKind::CopyLocation {
                target: object_name.clone(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                use_offset: true,
            },
        ));
        loc.influence_driver = Some(location_influence_driver(camera, index));

        let rot = camera_object.add_constraint(Constraint::new(
            rotation_constraint_name(index),
            ConstraintKind::CopyRotation {
                target: object_name,
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                mix: MixMode::After,
            },
        ));
        rot.influence_driver = Some(rotation_influence_driver(camera, index));

        Ok(())
    }
}

/// Makes sure the shared hidden collection exists and is linked into the
/// scene. Visibility flags are only set on creation.
fn ensure_rig_collection(scene: &mut Scene) {
    let (collection, created) = scene.ensure_collection(collection_name());
    if created {
        collection.hide_viewport = true;
        collection.hide_render = true;
        collection.hide_select = true;
        collection.excluded_from_view_layers = true;
    }
    collection.linked = true;
}

/// Removes every rig-owned constraint from the camera and every shake empty
/// belonging to it, detaching drivers before deleting their carriers.
/// Safe to call on a camera with no rig or a partially corrupt one.
fn teardown_camera(scene: &mut Scene, camera: &str) {
    if let Some(object) = scene.object_mut(camera) {
        for constraint in object.constraints.iter_mut() {
            if is_rig_constraint(&constraint.name) {
                constraint.remove_influence_driver();
            }
        }
        object
            .constraints
            .retain(|constraint| !is_rig_constraint(&constraint.name));
    }

    let members: Vec<String> = scene
        .collection(collection_name())
        .map(|collection| collection.members().to_vec())
        .unwrap_or_default();
    for name in members {
        if !is_camera_shake_object(&name, camera) {
            continue;
        }
        if let Some(object) = scene.object_mut(&name) {
            for constraint in object.constraints.iter_mut() {
                constraint.remove_eval_time_driver();
            }
            object.clear_action_link();
        }
        scene.remove_object(&name);
    }
}

/// Drops the collection once it is empty and purges orphaned loop actions.
fn cleanup(scene: &mut Scene) {
    if scene
        .collection(collection_name())
        .map_or(false, Collection::is_empty)
    {
        scene.unlink_collection(collection_name());
        scene.remove_collection(collection_name());
    }
    purge_unused_actions(scene);
}

fn purge_unused_actions(scene: &mut Scene) {
    for name in scene.action_names() {
        if name.starts_with(BASE_NAME) && scene.action_users(&name) == 0 {
            scene.remove_action(&name);
        }
    }
}

fn slot_target(camera: &str, slot: usize, field: SlotField) -> VarTarget {
    VarTarget::ObjectProperty {
        object: camera.to_string(),
        path: PropertyPath::ShakeSlot { slot, field },
    }
}

/// Phase driver for the empty's playback constraint:
/// `((manual ? time : (frame - frame_offset) * speed) * k) % 1.0` with
/// `k = (source_fps / scene_fps) / action_length`. The fps ratio converts
/// timeline frames into the shake's native frames, so shakes authored at a
/// different frame rate play at the intended real-time speed.
fn eval_time_driver_for(
    camera: &str,
    slot: usize,
    source_fps: f32,
    scene_fps: f32,
    action_length: f32,
) -> Driver {
    let factor = if scene_fps > 0.0 && action_length > 0.0 {
        (source_fps / scene_fps) / action_length
    } else {
        0.0
    };
    let effective_time = Expr::branch(
        Expr::var("manual"),
        Expr::var("time"),
        Expr::Frame
            .sub(Expr::var("frame_offset"))
            .mul(Expr::var("speed")),
    );
    Driver::new(
        effective_time.mul(Expr::Const(factor)).rem(Expr::Const(1.0)),
        vec![
            DriverVar::new("manual", slot_target(camera, slot, SlotField::UseManualTiming)),
            DriverVar::new("time", slot_target(camera, slot, SlotField::Time)),
            DriverVar::new("speed", slot_target(camera, slot, SlotField::Speed)),
            DriverVar::new("frame_offset", slot_target(camera, slot, SlotField::Offset)),
        ],
    )
}

/// Influence driver for the camera's location constraint. Curve amplitudes
/// are authored at the maximum influence/scale/unit-scale product, so the
/// expression divides that product back out before applying the slot's live
/// settings and the scene's unit scale.
fn location_influence_driver(camera: &str, slot: usize) -> Driver {
    let normalize = 1.0 / (UNIT_SCALE_MAX * INFLUENCE_MAX * SCALE_MAX);
    Driver::new(
        Expr::Const(normalize)
            .mul(Expr::var("influence"))
            .mul(Expr::var("location_scale"))
            .div(Expr::var("unit_scale")),
        vec![
            DriverVar::new("influence", slot_target(camera, slot, SlotField::Influence)),
            DriverVar::new("location_scale", slot_target(camera, slot, SlotField::Scale)),
            DriverVar::new(
                "unit_scale",
                VarTarget::SceneProperty {
                    path: ScenePath::UnitScale,
                },
            ),
        ],
    )
}

/// Influence driver for the camera's rotation constraint. Rotation is not
/// affected by spatial scale or unit scale.
fn rotation_influence_driver(camera: &str, slot: usize) -> Driver {
    Driver::new(
        Expr::var("influence").mul(Expr::Const(1.0 / INFLUENCE_MAX)),
        vec![DriverVar::new(
            "influence",
            slot_target(camera, slot, SlotField::Influence),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    fn scene_with_camera(name: &str) -> Scene {
        let mut scene = Scene::new(24.0);
        scene.add_object(SceneObject::camera(name));
        scene
    }

    /// Everything that identifies a camera's rig: the collection members for
    /// this camera, the camera's constraint stack, and the full shake
    /// empties (constraints and drivers included).
    fn rig_snapshot(scene: &Scene, camera: &str) -> (Vec<String>, Vec<Constraint>, Vec<SceneObject>) {
        let members: Vec<String> = scene
            .collection(collection_name())
            .map(|collection| {
                collection
                    .members()
                    .iter()
                    .filter(|name| is_camera_shake_object(name, camera))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let constraints = scene
            .object(camera)
            .map(|object| object.constraints.clone())
            .unwrap_or_default();
        let empties = members
            .iter()
            .filter_map(|name| scene.object(name).cloned())
            .collect();
        (members, constraints, empties)
    }

    #[test]
    fn rebuild_is_idempotent() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");

        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();
        rig.add_shake(&mut scene, "Camera", "WALK").unwrap();
        let first = rig_snapshot(&scene, "Camera");

        rig.rebuild(&mut scene, "Camera").unwrap();
        let second = rig_snapshot(&scene, "Camera");

        assert_eq!(first, second);
    }

    #[test]
    fn rig_size_tracks_slot_count() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");

        for shake in ["HANDHELD", "WALK", "IMPACT"] {
            rig.add_shake(&mut scene, "Camera", shake).unwrap();
        }

        let collection = scene.collection(collection_name()).unwrap();
        assert_eq!(collection.members().len(), 3);
        assert!(collection.hide_viewport && collection.hide_render && collection.hide_select);
        assert_eq!(scene.object("Camera").unwrap().constraints.len(), 6);
    }

    #[test]
    fn removing_last_slot_removes_rig_and_collection() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");

        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();
        assert!(scene.collection(collection_name()).is_some());

        rig.remove_shake(&mut scene, "Camera", 0).unwrap();
        assert!(scene.collection(collection_name()).is_none());
        assert!(scene.object(&shake_object_name("Camera", 0)).is_none());
        assert!(scene.object("Camera").unwrap().constraints.is_empty());
        assert!(scene.action(&action_name("HANDHELD")).is_none());
    }

    #[test]
    fn cameras_share_one_action_per_shake_type() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("CamA");
        scene.add_object(SceneObject::camera("CamB"));

        rig.add_shake(&mut scene, "CamA", "HANDHELD").unwrap();
        rig.add_shake(&mut scene, "CamB", "HANDHELD").unwrap();

        let key = action_name("HANDHELD");
        assert!(scene.action(&key).is_some());
        assert_eq!(scene.action_users(&key), 2);

        rig.remove_shake(&mut scene, "CamA", 0).unwrap();
        assert!(scene.action(&key).is_some());

        rig.remove_shake(&mut scene, "CamB", 0).unwrap();
        assert!(scene.action(&key).is_none());
    }

    #[test]
    fn location_influence_is_the_literal_normalization_constant() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();

        let camera = scene.object("Camera").unwrap();
        let constraint = camera.constraint(&location_constraint_name(0)).unwrap();
        let driver = constraint.influence_driver.as_ref().unwrap();
        let value = driver.evaluate(0.0, &scene).unwrap();

        let expected = 1.0 / (INFLUENCE_MAX * SCALE_MAX * UNIT_SCALE_MAX);
        assert!((value - expected).abs() < expected * 1e-4);
    }

    #[test]
    fn manual_timing_toggle_needs_no_rebuild() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();

        let (names_before, ..) = rig_snapshot(&scene, "Camera");
        let auto = scene.evaluate_object("Camera", 13.0).unwrap();

        {
            let shakes = scene.camera_shakes_mut("Camera").unwrap();
            shakes[0].use_manual_timing = true;
            shakes[0].time = 30.0;
        }

        let manual = scene.evaluate_object("Camera", 13.0).unwrap();
        let (names_after, ..) = rig_snapshot(&scene, "Camera");

        assert_eq!(names_before, names_after);
        assert_ne!(auto.location, manual.location);
    }

    #[test]
    fn repair_all_matches_individual_rebuilds() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);

        let mut scene = scene_with_camera("CamA");
        scene.add_object(SceneObject::camera("CamB"));
        scene.camera_shakes_mut("CamA").unwrap().push(ShakeInstance::new("HANDHELD"));
        scene.camera_shakes_mut("CamB").unwrap().push(ShakeInstance::new("WALK"));

        let mut individually = scene.clone();
        rig.rebuild(&mut individually, "CamA").unwrap();
        rig.rebuild(&mut individually, "CamB").unwrap();

        let mut repaired = scene;
        rig.repair_all(&mut repaired).unwrap();

        for camera in ["CamA", "CamB"] {
            assert_eq!(
                rig_snapshot(&individually, camera),
                rig_snapshot(&repaired, camera)
            );
        }
    }

    #[test]
    fn repair_all_recovers_from_deleted_empties() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();

        // External structural edit: the shake empty vanishes behind our back.
        scene.remove_object(&shake_object_name("Camera", 0));

        rig.repair_all(&mut scene).unwrap();
        assert!(scene.object(&shake_object_name("Camera", 0)).is_some());
        assert_eq!(scene.object("Camera").unwrap().constraints.len(), 2);
    }

    #[test]
    fn missing_eval_time_support_aborts_without_partial_rig() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        scene.capabilities.action_eval_time = false;

        scene
            .camera_shakes_mut("Camera")
            .unwrap()
            .push(ShakeInstance::new("HANDHELD"));
        let err = rig.rebuild(&mut scene, "Camera").unwrap_err();
        assert!(matches!(err, ShakeRigError::UnsupportedHostVersion));

        assert!(scene.object("Camera").unwrap().constraints.is_empty());
        assert!(scene.object(&shake_object_name("Camera", 0)).is_none());
        assert!(scene.collection(collection_name()).is_none());
    }

    #[test]
    fn unknown_shake_type_fails_fast_and_leaves_no_rig() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");

        let err = rig.add_shake(&mut scene, "Camera", "NOT_A_SHAKE").unwrap_err();
        assert!(matches!(err, ShakeRigError::UnknownShakeType(_)));
        assert!(scene.camera_shakes("Camera").unwrap().is_empty());

        // A stale configuration referencing a missing type also fails clean.
        scene
            .camera_shakes_mut("Camera")
            .unwrap()
            .push(ShakeInstance::new("GONE"));
        assert!(rig.rebuild(&mut scene, "Camera").is_err());
        assert!(scene.object("Camera").unwrap().constraints.is_empty());
    }

    #[test]
    fn teardown_matches_exact_names_only() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");

        // User constraints that merely share the tag prefix must survive.
        let camera = scene.object_mut("Camera").unwrap();
        camera.add_constraint(Constraint::new(
            "TrackTo",
            ConstraintKind::CopyRotation {
                target: "Camera".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                mix: MixMode::After,
            },
        ));
        camera.add_constraint(Constraint::new(
            format!("{BASE_NAME}_loc_extra"),
            ConstraintKind::CopyLocation {
                target: "Camera".to_string(),
                target_space: SpaceMode::World,
                owner_space: SpaceMode::Local,
                use_offset: false,
            },
        ));

        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();
        rig.remove_shake(&mut scene, "Camera", 0).unwrap();

        let camera = scene.object("Camera").unwrap();
        assert!(camera.constraint("TrackTo").is_some());
        assert!(camera
            .constraint(&format!("{BASE_NAME}_loc_extra"))
            .is_some());
        assert_eq!(camera.constraints.len(), 2);
    }

    #[test]
    fn move_shake_reorders_and_rebuilds() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();
        rig.add_shake(&mut scene, "Camera", "WALK").unwrap();

        rig.move_shake(&mut scene, "Camera", 1, MoveDirection::Up).unwrap();
        let shakes = scene.camera_shakes("Camera").unwrap();
        assert_eq!(shakes[0].shake_type, "WALK");
        assert_eq!(shakes[1].shake_type, "HANDHELD");

        // Moving past the end is a quiet no-op on the order.
        rig.move_shake(&mut scene, "Camera", 1, MoveDirection::Down).unwrap();
        let shakes = scene.camera_shakes("Camera").unwrap();
        assert_eq!(shakes[1].shake_type, "HANDHELD");
    }

    #[test]
    fn fps_mismatch_stretches_playback_to_real_time() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);

        // Bundled shakes are authored at 24 fps. In a 48 fps scene each
        // shake frame must span two timeline frames, so the phase at frame
        // N matches the native scene's phase at frame N / 2.
        let mut fast = Scene::new(48.0);
        fast.add_object(SceneObject::camera("Camera"));
        rig.add_shake(&mut fast, "Camera", "HANDHELD").unwrap();

        let mut native = scene_with_camera("Camera");
        rig.add_shake(&mut native, "Camera", "HANDHELD").unwrap();

        let phase_at = |scene: &Scene, frame: f32| {
            let empty = scene.object(&shake_object_name("Camera", 0)).unwrap();
            match &empty.constraints[0].kind {
                ConstraintKind::Action {
                    eval_time_driver, ..
                } => eval_time_driver
                    .as_ref()
                    .unwrap()
                    .evaluate(frame, scene)
                    .unwrap(),
                other => panic!("expected the playback constraint, got {other:?}"),
            }
        };

        let native_phase = phase_at(&native, 13.0);
        assert!((phase_at(&fast, 26.0) - native_phase).abs() < 1e-6);
        // A flipped ratio would make frame 13 match instead.
        assert!((phase_at(&fast, 13.0) - native_phase).abs() > 1e-3);

        let native_pose = native.evaluate_object("Camera", 13.0).unwrap();
        let fast_pose = fast.evaluate_object("Camera", 26.0).unwrap();
        for axis in 0..3 {
            assert!((native_pose.location[axis] - fast_pose.location[axis]).abs() < 1e-6);
        }
    }

    #[test]
    fn evaluated_camera_motion_matches_scaled_action_sample() {
        let library = ShakeLibrary::builtin();
        let rig = RigSynthesizer::new(&library);
        let mut scene = scene_with_camera("Camera");
        scene.object_mut("Camera").unwrap().transform.location = [0.0, 0.0, 2.0];
        rig.add_shake(&mut scene, "Camera", "HANDHELD").unwrap();

        let frame = 13.0;
        let action = scene.action(&action_name("HANDHELD")).unwrap().clone();
        // Automatic timing at speed 1 / offset 0: phase is frame over length.
        let phase = (frame * ((action.source_fps / scene.fps) / action.length())).rem_euclid(1.0);
        let span = action.frame_end.ceil() - action.frame_start.floor();
        let pose = action.sample(action.frame_start.floor() + phase * span);
        let influence = 1.0 / (INFLUENCE_MAX * SCALE_MAX * UNIT_SCALE_MAX);

        let transform = scene.evaluate_object("Camera", frame).unwrap();
        assert!((transform.location[0] - pose.location[0] * influence).abs() < 1e-6);
        assert!((transform.location[2] - (2.0 + pose.location[2] * influence)).abs() < 1e-6);
        let rot_influence = 1.0 / INFLUENCE_MAX;
        assert!(
            (transform.rotation_euler[1] - pose.rotation_euler[1] * rot_influence).abs() < 1e-6
        );
    }
}
