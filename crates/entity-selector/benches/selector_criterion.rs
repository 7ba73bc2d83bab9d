//! Selector benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use entity_selector::memory::{MemoryEntity, MemoryWorld};
use entity_selector::{ExecutionContext, ItemStack, Selector, Vector3, split_arguments};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SELECTORS: [(&str, &str); 4] = [
    ("bare", "@e"),
    ("flat", "@a[tag=red,tag=!dead,m=survival,r=32,c=3]"),
    ("scores", "@e[type=minecraft:zombie,scores={kills=5..,deaths=..2,level=!0}]"),
    (
        "hasitem",
        r#"@a[hasitem=[{item=minecraft:torch,quantity=1..,location="slot.hotbar",slot=0..8},{item=logs}]]"#,
    ),
];

fn populate(count: u32) -> MemoryWorld {
    let mut world = MemoryWorld::new();
    for i in 0..count {
        let x = f64::from(i % 64);
        let z = f64::from(i / 64);
        let entity = if i % 4 == 0 {
            MemoryEntity::player(format!("player{i}"))
                .with_slot(0, ItemStack::new("minecraft:torch", 16))
                .with_slot(12, ItemStack::new("minecraft:oak_log", 4).with_tag("logs"))
        } else {
            MemoryEntity::new("minecraft:zombie")
        };
        let entity = if i % 3 == 0 {
            entity.with_tag("red")
        } else {
            entity
        };
        let identity = world.add_participant(format!("e{i}"));
        world.set_score("kills", identity, i64::from(i % 10));
        world.spawn(entity.at(x, 64.0, z).with_identity(identity));
    }
    world
}

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (name, input) in SELECTORS {
        group.bench_with_input(BenchmarkId::new("selector", name), &input, |b, input| {
            b.iter(|| black_box(Selector::parse(black_box(input))));
        });
    }

    group.bench_function("split_arguments", |b| {
        let args = "type=minecraft:pig,scores={a=1,b=2..},hasitem=[{item=x},{item=y}],c=1";
        b.iter(|| black_box(split_arguments(black_box(args))));
    });

    group.finish();
}

fn evaluate_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for count in [100, 1000, 10000] {
        let world = populate(count);
        group.throughput(Throughput::Elements(u64::from(count)));

        for (name, input) in SELECTORS {
            let selector = Selector::parse(input);
            group.bench_with_input(BenchmarkId::new(name, count), &selector, |b, selector| {
                let mut ctx = ExecutionContext::new(&world).at(Vector3::new(32.0, 64.0, 8.0));
                b.iter(|| black_box(selector.evaluate(&mut ctx)));
            });
        }

        group.bench_with_input(BenchmarkId::new("random", count), &count, |b, _| {
            let selector = Selector::parse("@r[c=5]");
            let mut rng = StdRng::seed_from_u64(1);
            let mut ctx = ExecutionContext::new(&world).with_rng(&mut rng);
            b.iter(|| black_box(selector.evaluate(&mut ctx)));
        });
    }

    group.finish();
}

criterion_group!(benches, parse_benchmarks, evaluate_benchmarks);

criterion_main!(benches);
