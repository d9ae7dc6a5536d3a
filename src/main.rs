//! Morphogen CLI - Breed a population from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use morphogen::{
    compute::evolution::Nursery,
    schema::{GeneticsConfig, Organ, SeedGenome},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Breed a population of developing creatures from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to genetics configuration file");
        eprintln!("  generations  Number of generations (default: population.max_generations)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: GeneticsConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let generations: usize = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.population.max_generations);

    println!("Morphogen Breeding Run");
    println!("======================");
    println!("Seed genome: {:?}", config.seed);
    println!(
        "Population: {} (+{} offspring per generation)",
        config.population.size, config.population.offspring_per_generation
    );
    println!("Max cells: {}", config.development.max_cells);
    println!("Generations: {}", generations);
    println!();

    let mut nursery = Nursery::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    if let Err(e) = nursery.seed() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("Breeding...");
    let start = Instant::now();

    let history = nursery.run(generations, |stats| {
        println!(
            "  Generation {}/{}: viable={}/{}, incompatible={}, cells={:.1}, genes={:.1}",
            stats.generation,
            generations,
            stats.viable,
            stats.conceived,
            stats.incompatible,
            stats.mean_cells,
            stats.mean_genome_len
        );
    });

    let elapsed = start.elapsed();
    let conceived: usize = history.iter().map(|s| s.conceived).sum();
    let viable: usize = history.iter().map(|s| s.viable).sum();

    println!();
    println!("Final population: {}", nursery.population().len());
    if let Some(largest) = nursery
        .population()
        .iter()
        .max_by_key(|o| o.embryo.cell_count())
    {
        println!(
            "  Largest body: {} cells, {} mouths, {} gonads, {} neurons (generation {})",
            largest.embryo.cell_count(),
            largest.embryo.organ_count(Organ::Mouth),
            largest.embryo.organ_count(Organ::Gonad),
            largest.embryo.network.neurons().len(),
            largest.generation
        );
    }
    println!(
        "Viability: {:.1}% of {} offspring",
        if conceived > 0 {
            viable as f32 / conceived as f32 * 100.0
        } else {
            0.0
        },
        conceived
    );
    println!(
        "Time: {:.2}s ({:.1} offspring/s)",
        elapsed.as_secs_f32(),
        conceived as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = GeneticsConfig {
        seed: SeedGenome::Symmetric,
        random_seed: Some(42),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
}
