//! Criterion benchmarks for frame coding and event dispatch.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relink::protocol::{constants, encode_frame, Frame};
use relink::{Endpoint, PeerId, PeerInfo};
use relink_core::testing::ScriptedTransport;
use relink_core::{Client, ClientConfig, NoopHandler};
use std::time::Instant;

fn frame_coding(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_coding");

    for &size in &[16usize, 512, 1200] {
        let payload = vec![0xa5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &payload, |b, payload| {
            b.iter(|| encode_frame(constants::MSG_APPLICATION_DATA, false, payload));
        });

        let encoded = encode_frame(constants::MSG_APPLICATION_DATA, false, &payload);
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
            b.iter(|| Frame::decode(encoded.clone()));
        });
    }

    group.finish();
}

fn dispatch_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_drain");
    let peer = PeerInfo::new(Endpoint::new("127.0.0.1", 7777), PeerId(1));
    let payload = Bytes::from(vec![7u8; 256]);

    for &count in &[10usize, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("data_events", count), &count, |b, &count| {
            let transport = ScriptedTransport::new();
            let script = transport.handle();
            let mut client =
                Client::new(transport, NoopHandler, ClientConfig::default()).unwrap();
            client.connect("127.0.0.1", 7777);

            b.iter(|| {
                for _ in 0..count {
                    script.push_data(&peer, &payload);
                }
                client.poll_at(Instant::now())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, frame_coding, dispatch_drain);
criterion_main!(benches);
