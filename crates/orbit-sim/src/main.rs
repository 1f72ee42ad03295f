mod script;

use clap::{Parser, Subcommand};
use orbit::config;
use orbit::sys::{ManualClock, SceneArena, Tweener};
use orbit::Ring;
use script::Command;
use std::io::Read;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "orbit-sim", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; reads stdin when omitted
    script: Option<PathBuf>,

    /// Number of items on the ring
    #[arg(short = 'n', long, default_value_t = 8)]
    items: usize,

    /// Simulated frame length in milliseconds
    #[arg(short = 'f', long, default_value_t = 16)]
    frame_ms: u64,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write the default config file and print its path
    WriteConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Commands::WriteConfig) = cli.command {
        let path = config::write_default_config()?;
        println!("{}", path.display());
        return Ok(());
    }

    let source = match &cli.script {
        Some(path) => fs_err::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let commands = script::parse(&source)?;
    run(&commands, cli.items, Duration::from_millis(cli.frame_ms.max(1)))
}

fn run(commands: &[Command], count: usize, frame: Duration) -> anyhow::Result<()> {
    let mut arena = SceneArena::new();
    let handle = arena.spawn("ring");
    let items = (0..count).map(|i| arena.spawn(format!("item-{i}"))).collect();
    let clock = ManualClock::new();
    let mut ring = Ring::with_clock(
        arena,
        Tweener::new(),
        handle,
        items,
        config::load_or_default(),
        Rc::new(clock.clone()),
    )?;

    for command in commands {
        log::debug!("{:?}", command);
        match *command {
            Command::Scroll(delta) => ring.on_scroll(delta)?,
            Command::Click(index) => ring.on_item_activated(index)?,
            Command::Select { index, animate } => ring.select_item(index, animate)?,
            Command::Wait(ms) => {
                let mut remaining = Duration::from_millis(ms);
                while !remaining.is_zero() {
                    let dt = remaining.min(frame);
                    clock.advance(dt);
                    ring.advance(dt)?;
                    remaining -= dt;
                }
            }
            Command::Snapshot => println!("{}", ring.snapshot()),
            Command::Dispose => {
                ring.dispose()?;
                println!("disposed, {} scene nodes left", ring.host().live_count());
            }
        }
    }
    Ok(())
}
