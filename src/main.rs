use log::*;

mod error;
mod fleet;
mod movement;
mod report;
mod station;
mod topology;

use error::LoadError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use structopt::StructOpt;

const TICK_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, StructOpt)]
#[structopt(name = "subwaysim", about = "Subway line train movement simulator.")]
struct Opt {
    /// Station table CSV
    #[structopt(long = "in", default_value = "./data/subway.csv")]
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Directory receiving the per-tick snapshot files
    #[structopt(long = "out", default_value = "./out/")]
    #[structopt(parse(from_os_str))]
    output: PathBuf,
}

fn main() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .unwrap();

    let opt = Opt::from_args();
    info!("{:#?}", opt);

    if let Err(e) = run(&opt) {
        error!("startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<(), LoadError> {
    let _h1 = hprof::enter("init");

    let directory = {
        let _h = hprof::enter("read stations");
        station::load_stations(&opt.input)?
    };
    let topology = {
        let _h = hprof::enter("derive topology");
        topology::Topology::derive(&directory)?
    };

    report::prepare_output_dir(&opt.output)?;
    report::clean_output_dir(&opt.output)?;

    let mut fleet = {
        let _h = hprof::enter("place fleet");
        let mut rng = StdRng::seed_from_u64(epoch_millis() as u64);
        fleet::Fleet::init(&directory, &mut rng)?
    };
    let strategy = movement::NeighborStrategy::default();

    drop(_h1);
    hprof::end_frame();
    hprof::profiler().print_timing();

    loop {
        if let Err(e) = movement::step(&mut fleet, &directory, &topology, strategy) {
            error!("movement failed, resuming next tick: {}", e);
        }
        report::print_positions(&fleet);
        if let Err(e) = report::write_snapshot(&fleet, &topology, &opt.output, epoch_millis()) {
            error!("{}", e);
        }
        std::thread::sleep(TICK_INTERVAL);
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
