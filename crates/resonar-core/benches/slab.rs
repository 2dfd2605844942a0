use criterion::{Criterion, black_box, criterion_group, criterion_main};
use resonar_core::alloc::slab::Slab;

fn bench_push_remove(c: &mut Criterion) {
    c.bench_function("slab_push_remove_1000", |b| {
        b.iter(|| {
            let mut slab = Slab::new();
            let slots: Vec<_> = (0..1000u32).map(|i| slab.push(i)).collect();
            for slot in slots {
                black_box(slab.remove(slot));
            }
        })
    });
}

fn bench_lookup(c: &mut Criterion) {
    let mut slab = Slab::new();
    let slots: Vec<_> = (0..1000u32).map(|i| slab.push(i)).collect();
    c.bench_function("slab_try_get_1000", |b| {
        b.iter(|| {
            for slot in &slots {
                black_box(slab.try_get(*slot));
            }
        })
    });
}

criterion_group!(benches, bench_push_remove, bench_lookup);
criterion_main!(benches);
