//! Benchmarks for development and the genetic operators.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use morphogen::{
    compute::{
        BodyCell, decode,
        evolution::{GenomeRng, align, meiosis, mutate},
    },
    schema::{DevelopmentConfig, Genome, MutationConfig, SeedGenome},
};

fn bench_decode_seeds(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_seed");
    let config = DevelopmentConfig::default();

    for (name, seed) in [
        ("minimal", SeedGenome::Minimal),
        ("symmetric", SeedGenome::Symmetric),
    ] {
        let genome = seed.to_genome();
        group.bench_with_input(BenchmarkId::from_parameter(name), &genome, |b, genome| {
            b.iter(|| decode(black_box(genome), BodyCell::root(config.root_size), &config));
        });
    }

    group.finish();
}

fn bench_decode_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_random");
    let config = DevelopmentConfig::default();

    for len in [64, 256, 1024] {
        let mut rng = GenomeRng::new(len as u64);
        let genome = Genome::new(rng.random_chromosome(len), rng.random_chromosome(len));

        group.bench_with_input(BenchmarkId::from_parameter(len), &genome, |b, genome| {
            b.iter(|| decode(black_box(genome), BodyCell::root(config.root_size), &config));
        });
    }

    group.finish();
}

fn bench_genetic_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("genetic_operators");
    let config = MutationConfig::default();

    for len in [64, 512] {
        let mut rng = GenomeRng::new(7);
        let chromosome = rng.random_chromosome(len);
        let genome = Genome::new(chromosome.clone(), rng.random_chromosome(len + 8));

        group.bench_with_input(BenchmarkId::new("mutate", len), &chromosome, |b, original| {
            b.iter(|| {
                let mut chromosome = original.clone();
                mutate(black_box(&mut chromosome), &config, &mut rng)
            });
        });

        group.bench_with_input(BenchmarkId::new("meiosis", len), &genome, |b, g| {
            b.iter(|| meiosis(black_box(g), &config, &mut rng));
        });

        group.bench_with_input(BenchmarkId::new("align", len), &genome, |b, g| {
            b.iter(|| align(black_box(g.clone()), config.max_insertion_history));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_seeds,
    bench_decode_random,
    bench_genetic_operators
);
criterion_main!(benches);
