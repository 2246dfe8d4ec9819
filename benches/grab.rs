use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_rgbd::{CaptureConfig, FrameMultiplexer, RolePair, SensorRole, SyntheticDevice};

pub fn benchmark_grab(c: &mut Criterion) {
    let pairs = [
        RolePair::new(SensorRole::Depth, SensorRole::Color),
        RolePair::new(SensorRole::DepthRegisteredToColor, SensorRole::Color),
        RolePair::new(SensorRole::Infrared8Projective, SensorRole::Unassigned),
        RolePair::new(SensorRole::Depth, SensorRole::Infrared8),
    ];

    let mut group = c.benchmark_group("grab");
    for roles in pairs {
        let mut mux = FrameMultiplexer::open(
            SyntheticDevice::new().unpaced(),
            roles,
            CaptureConfig::default(),
        )
        .unwrap();
        let mut frame = vec![0u8; mux.size()];
        group.bench_function(roles.to_string(), |b| {
            b.iter(|| mux.grab(&mut frame, None).unwrap())
        });
    }
}

criterion_group!(benches, benchmark_grab);
criterion_main!(benches);
