use criterion::{criterion_group, criterion_main, Criterion};
use dotmatrix::test::build_test;

/// Mirrors the teacher's `cpu_cycles` bench: a tight free-running NOP
/// program clocked for a million T-cycles with PPU/timer/DMA disabled, so
/// the number it reports isolates the fetch/decode/execute loop itself.
fn benchmark_cpu_clock(c: &mut Criterion) {
    let program = vec![0x00u8; 0x7f00];
    let mut gb = build_test(&program).unwrap();
    {
        let cfg = gb.config();
        let mut cfg = cfg.lock().unwrap();
        cfg.ppu_enabled = false;
        cfg.timer_enabled = false;
        cfg.dma_enabled = false;
    }
    gb.reload_config();

    c.bench_function("cpu_cycles", |b| {
        b.iter(|| {
            gb.clocks_cycles(1_000_000).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_cpu_clock);
criterion_main!(benches);
