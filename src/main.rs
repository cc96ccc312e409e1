//! Scene logic compiler entry point.
//!
//! Compiles scene documents (JSON) into per-object Lua fragments and runs them
//! in a simulated host:
//!
//! - `compile` – write the rendered manifest (or the IR) as JSON
//! - `simulate` – run frames in the reference host, or in the Lua host with
//!   `--lua`, printing watched properties and host calls
//! - `init-config` – write a configuration file with default settings
//!
//! # Running
//!
//! ```sh
//! cargo run -- compile demos/door.json -o door.logic.json
//! cargo run -- simulate demos/door.json --frames 120 --watch door:alpha
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use scenelogic::config::CompilerConfig;
use scenelogic::driver::{CompiledScene, compile};
use scenelogic::emit::LuaRenderer;
use scenelogic::host::SceneHost;
use scenelogic::scene::Scene;

/// Scene logic compiler
#[derive(Parser)]
#[command(version, about = "Compiles interactive scene logic into per-frame host fragments.")]
struct Cli {
    /// Configuration file (default: ./scenelogic.ini).
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Override the host tick rate from the configuration.
    #[arg(long, value_name = "HZ", global = true)]
    tick_rate: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a scene and write the rendered manifest.
    Compile {
        scene: PathBuf,
        /// Output file; stdout when absent.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Write the logic IR instead of rendered Lua.
        #[arg(long)]
        ir: bool,
    },
    /// Compile a scene and run it for a number of frames.
    Simulate {
        scene: PathBuf,
        #[arg(short, long, default_value_t = 60)]
        frames: u64,
        /// Property to print every frame, as `object:key`. Repeatable.
        #[arg(short, long, value_name = "OBJECT:KEY")]
        watch: Vec<String>,
        /// Object the user clicks on the first frame.
        #[arg(long, value_name = "OBJECT")]
        click: Option<String>,
        /// Run the rendered Lua text instead of the IR.
        #[arg(long)]
        lua: bool,
    },
    /// Write a configuration file with default settings.
    InitConfig,
}

fn load_config(cli: &Cli) -> CompilerConfig {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::with_path(path),
        None => CompilerConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        // defaults are fine without a file
        if cli.config.is_some() {
            warn!("{}", e);
        }
    }
    if let Some(rate) = cli.tick_rate {
        config.tick_rate = rate;
    }
    config
}

fn load_scene(path: &Path) -> Result<Scene, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Scene::from_json(&text)
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), String> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn parse_watch(watch: &str) -> Result<(String, String), String> {
    watch.split_once(':')
        .map(|(object, key)| (object.to_string(), key.to_string()))
        .ok_or_else(|| format!("Invalid watch '{watch}', expected OBJECT:KEY"))
}

fn compile_scene(path: &Path, config: &CompilerConfig) -> Result<(Scene, CompiledScene), String> {
    let scene = load_scene(path)?;
    let compiled = compile(&scene, config).map_err(|e| e.to_string())?;
    Ok((scene, compiled))
}

fn run_compile(
    config: &CompilerConfig,
    scene: &Path,
    output: Option<&Path>,
    ir: bool,
) -> Result<(), String> {
    let (_, compiled) = compile_scene(scene, config)?;
    let content = if ir {
        serde_json::to_string_pretty(&compiled)
            .map_err(|e| format!("Failed to serialize IR: {e}"))?
    } else {
        compiled.to_json(&LuaRenderer::new(config.indent_width, config.offset))?
    };
    write_output(output, &content)
}

fn print_frame(frame: u64, values: &[f64]) {
    let values: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    println!("{frame:>6} {}", values.join(" "));
}

fn run_simulate(
    config: &CompilerConfig,
    scene: &Path,
    frames: u64,
    watch: &[String],
    click: Option<&str>,
    lua: bool,
) -> Result<(), String> {
    let (scene, compiled) = compile_scene(scene, config)?;
    let watch = watch
        .iter()
        .map(|w| parse_watch(w))
        .collect::<Result<Vec<_>, _>>()?;
    if !watch.is_empty() {
        let names: Vec<String> = watch.iter().map(|(o, k)| format!("{o}:{k}")).collect();
        println!("{:>6} {}", "frame", names.join(" "));
    }

    if lua {
        return simulate_lua(config, &scene, &compiled, frames, &watch, click);
    }

    let mut host = SceneHost::new(&scene, &compiled);
    if let Some(id) = click {
        if !host.click(id) {
            return Err(format!("Unknown object '{id}'"));
        }
    }
    for _ in 0..frames {
        host.run_frame();
        let values: Vec<f64> = watch.iter().map(|(o, k)| host.get(o, k)).collect();
        if !values.is_empty() {
            print_frame(host.frame(), &values);
        }
    }
    for command in host.commands() {
        println!("frame {}: {} {:?}", command.frame, command.object, command.call);
    }
    Ok(())
}

#[cfg(feature = "lua")]
fn simulate_lua(
    config: &CompilerConfig,
    scene: &Scene,
    compiled: &CompiledScene,
    frames: u64,
    watch: &[(String, String)],
    click: Option<&str>,
) -> Result<(), String> {
    use scenelogic::lua_host::LuaHost;

    let renderer = LuaRenderer::new(config.indent_width, config.offset);
    let mut host = LuaHost::new(scene, compiled, &renderer).map_err(|e| e.to_string())?;
    if let Some(id) = click {
        host.click(id).map_err(|e| e.to_string())?;
    }
    for _ in 0..frames {
        host.run_frame().map_err(|e| e.to_string())?;
        let values = watch
            .iter()
            .map(|(o, k)| host.get(o, k))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        if !values.is_empty() {
            print_frame(host.frame(), &values);
        }
    }
    for command in host.drain_commands() {
        println!("frame {}: {} {:?}", command.frame, command.object, command.call);
    }
    Ok(())
}

#[cfg(not(feature = "lua"))]
fn simulate_lua(
    _config: &CompilerConfig,
    _scene: &Scene,
    _compiled: &CompiledScene,
    _frames: u64,
    _watch: &[(String, String)],
    _click: Option<&str>,
) -> Result<(), String> {
    Err("Built without the `lua` feature".to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    let result = match &cli.command {
        Command::Compile { scene, output, ir } => {
            run_compile(&config, scene, output.as_deref(), *ir)
        }
        Command::Simulate {
            scene,
            frames,
            watch,
            click,
            lua,
        } => run_simulate(&config, scene, *frames, watch, click.as_deref(), *lua),
        Command::InitConfig => config.save_to_file().map(|_| {
            println!("Config written to {}", config.config_path.display());
        }),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
