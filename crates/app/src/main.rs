use std::path::{Path, PathBuf};

use camshake_core::{MoveDirection, RigSynthesizer, Scene, SceneObject, ShakeLibrary};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

fn main() -> camshake_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut library = ShakeLibrary::builtin();
    for preset in &cli.preset {
        let id = library.load_preset_file(preset)?;
        tracing::info!(?preset, id, "loaded shake preset");
    }

    match cli.command {
        Commands::Init {
            scene,
            camera,
            fps,
            unit_scale,
        } => run_init(&scene, &camera, fps, unit_scale),
        Commands::Shakes => run_shakes(&library),
        Commands::Add {
            scene,
            camera,
            shake_type,
        } => run_add(&library, &scene, &camera, &shake_type),
        Commands::Remove {
            scene,
            camera,
            index,
        } => run_remove(&library, &scene, &camera, index),
        Commands::Move {
            scene,
            camera,
            index,
            direction,
        } => run_move(&library, &scene, &camera, index, direction),
        Commands::FixAll { scene } => run_fix_all(&library, &scene),
        Commands::Eval {
            scene,
            camera,
            frame,
            end,
        } => run_eval(&scene, &camera, frame, end),
    }
}

fn run_init(path: &Path, cameras: &[String], fps: f32, unit_scale: f32) -> camshake_core::Result<()> {
    let mut scene = Scene::new(fps);
    scene.unit_scale = unit_scale;
    for camera in cameras {
        let (_, inserted) = scene.add_object(SceneObject::camera(camera));
        if !inserted {
            tracing::warn!(camera, "duplicate camera name ignored");
        }
    }
    save_scene(path, &scene)?;
    tracing::info!(?path, cameras = cameras.len(), "created scene file");
    Ok(())
}

fn run_shakes(library: &ShakeLibrary) -> camshake_core::Result<()> {
    for id in library.ids() {
        let set = library.lookup(id)?;
        let (start, end) = set.frame_range();
        println!("{id:20} {:24} {} fps, frames {start}..{end}", set.name, set.fps);
    }
    Ok(())
}

fn run_add(
    library: &ShakeLibrary,
    path: &Path,
    camera: &str,
    shake_type: &str,
) -> camshake_core::Result<()> {
    let mut scene = load_scene(path)?;
    let rig = RigSynthesizer::new(library);
    let index = rig.add_shake(&mut scene, camera, shake_type)?;
    save_scene(path, &scene)?;
    println!("added {shake_type} to {camera} at slot {index}");
    Ok(())
}

fn run_remove(
    library: &ShakeLibrary,
    path: &Path,
    camera: &str,
    index: usize,
) -> camshake_core::Result<()> {
    let mut scene = load_scene(path)?;
    let rig = RigSynthesizer::new(library);
    rig.remove_shake(&mut scene, camera, index)?;
    save_scene(path, &scene)?;
    println!("removed slot {index} from {camera}");
    Ok(())
}

fn run_move(
    library: &ShakeLibrary,
    path: &Path,
    camera: &str,
    index: usize,
    direction: Direction,
) -> camshake_core::Result<()> {
    let mut scene = load_scene(path)?;
    let rig = RigSynthesizer::new(library);
    rig.move_shake(&mut scene, camera, index, direction.into())?;
    save_scene(path, &scene)?;
    println!("moved slot {index} {direction:?} on {camera}");
    Ok(())
}

fn run_fix_all(library: &ShakeLibrary, path: &Path) -> camshake_core::Result<()> {
    let mut scene = load_scene(path)?;
    let rig = RigSynthesizer::new(library);
    rig.repair_all(&mut scene)?;
    save_scene(path, &scene)?;
    println!("rebuilt shake rigs for {} camera(s)", scene.cameras().len());
    Ok(())
}

fn run_eval(path: &Path, camera: &str, frame: f32, end: Option<f32>) -> camshake_core::Result<()> {
    let scene = load_scene(path)?;
    let last = end.unwrap_or(frame);
    let mut current = frame;
    while current <= last {
        let transform = scene.evaluate_object(camera, current)?;
        let [x, y, z] = transform.location;
        let [rx, ry, rz] = transform.rotation_euler;
        println!("frame {current:8.1}  loc ({x:+.5}, {y:+.5}, {z:+.5})  rot ({rx:+.5}, {ry:+.5}, {rz:+.5})");
        current += 1.0;
    }
    Ok(())
}

fn load_scene(path: &Path) -> camshake_core::Result<Scene> {
    Scene::load_file(path)
}

fn save_scene(path: &Path, scene: &Scene) -> camshake_core::Result<()> {
    scene.save_file(path)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural camera shake rig tool", long_about = None)]
struct Cli {
    /// Extra shake preset files to load into the library.
    #[arg(long, global = true)]
    preset: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new scene file with the given cameras.
    Init {
        /// Path of the scene file to create.
        scene: PathBuf,
        /// Camera names to add (repeatable).
        #[arg(long, required = true)]
        camera: Vec<String>,
        /// Playback frame rate.
        #[arg(long, default_value_t = 24.0)]
        fps: f32,
        /// World unit scale.
        #[arg(long, default_value_t = 1.0)]
        unit_scale: f32,
    },
    /// List the shake types available in the library.
    Shakes,
    /// Add a shake slot to a camera and rebuild its rig.
    Add {
        scene: PathBuf,
        camera: String,
        shake_type: String,
    },
    /// Remove a shake slot from a camera and rebuild its rig.
    Remove {
        scene: PathBuf,
        camera: String,
        index: usize,
    },
    /// Move a shake slot up or down in a camera's list.
    Move {
        scene: PathBuf,
        camera: String,
        index: usize,
        direction: Direction,
    },
    /// Tear down and re-synthesize every camera's rig in the scene.
    FixAll { scene: PathBuf },
    /// Print a camera's evaluated transform over a frame range.
    Eval {
        scene: PathBuf,
        camera: String,
        /// First frame to evaluate.
        #[arg(long, default_value_t = 1.0)]
        frame: f32,
        /// Optional last frame; defaults to a single frame.
        #[arg(long)]
        end: Option<f32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}
