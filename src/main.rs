//! Headless demo runner
//!
//! Drives a simulation session for a fixed number of ticks with a scripted
//! throttle/nitro pattern and reports progress. Useful for profiling the sim
//! and for eyeballing stage tuning without a renderer.

use clap::Parser;
use log::info;

use hillrun::consts::SIM_DT;
use hillrun::sim::{Session, SessionConfig, SimEvent, TickInput};
use hillrun::tuning::stage_params;

#[derive(Parser, Debug)]
#[command(about = "Run the hillrun simulation headless")]
struct Cli {
    /// Stage index (0..=5)
    #[arg(short, long, default_value_t = 0)]
    stage: usize,

    /// Terrain seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of simulation ticks to run
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,

    /// Leave the nitro untouched for the whole run
    #[arg(long)]
    no_nitro: bool,

    /// Print the final session state as JSON
    #[arg(long, default_value_t = false)]
    dump_state: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let params = stage_params(cli.stage);
    info!("stage {} ({}), seed {}", cli.stage, params.name, cli.seed);

    let mut session = Session::new(SessionConfig {
        stage: cli.stage,
        seed: cli.seed,
        ..Default::default()
    });

    let mut kills = 0u32;
    let mut nitro_uses = 0u32;

    for i in 0..cli.ticks {
        let input = TickInput {
            accelerate: true,
            brake: false,
            nitro: !cli.no_nitro && i % 600 < 90,
            fuel: 1.0,
        };

        for event in session.tick(&input, SIM_DT) {
            match event {
                SimEvent::VehicleKilled => kills += 1,
                SimEvent::NitroEngaged => nitro_uses += 1,
                SimEvent::NitroExpired => {}
                SimEvent::FlipCompleted { clockwise } => {
                    info!("flip completed (clockwise: {clockwise})");
                }
            }
        }

        if i % 300 == 0 {
            info!(
                "t={:6.1}s x={:8.1} speed={:5.2} alive={}",
                session.elapsed(),
                session.average_x(),
                session.average_speed(),
                session.alive(),
            );
        }
    }

    println!(
        "ran {} ticks on {}: distance {:.0} cells, {} flips, {} nitro uses, {} crashes",
        cli.ticks,
        params.name,
        session.distance_cells(),
        session.flips().total(),
        nitro_uses,
        kills,
    );

    if cli.dump_state {
        match serde_json::to_string_pretty(&session.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("state dump failed: {err}"),
        }
    }
}
