//! Topology enumeration and per-tick tracing.

use synchronix::bridge::CallToSignal;
use synchronix::ports::{RecvIfc, SendIfc};
use synchronix::resolver::{connect, Endpoint};
use synchronix::signal::NetBinding;
use synchronix::simulation::SimInit;
use synchronix::trace::{LineTrace, WaveBuffer};

#[test]
fn joined_nets_resolve_onto_the_source_wires() {
    let mut bench = SimInit::new();

    let source = SendIfc::<u32>::new(&mut bench, "producer.out");
    let sink = RecvIfc::<u32>::new(&mut bench, "consumer.in");
    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(source),
        Endpoint::SignalSink(sink),
    )
    .unwrap();

    let simu = bench.init().unwrap();
    let nets = simu.nets();
    assert!(nets.contains(&NetBinding {
        signal: "consumer.in.msg".into(),
        wire: "producer.out.msg".into(),
    }));
    assert!(nets.contains(&NetBinding {
        signal: "consumer.in.en".into(),
        wire: "producer.out.en".into(),
    }));
    assert!(nets.contains(&NetBinding {
        signal: "consumer.in.rdy".into(),
        wire: "producer.out.rdy".into(),
    }));
}

#[test]
fn adapter_constraints_are_reported() {
    let mut bench = SimInit::new();

    let adapter = CallToSignal::<u32>::new(&mut bench, "a");
    let downstream = RecvIfc::<u32>::new(&mut bench, "downstream.in");
    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(adapter.send().clone()),
        Endpoint::SignalSink(downstream),
    )
    .unwrap();

    let simu = bench.init().unwrap();
    assert!(!simu.constraints().is_empty());

    // Execution order is part of the observable topology.
    let labels: Vec<_> = simu.blocks().map(|(_, label)| label.to_string()).collect();
    assert_eq!(labels, vec!["a.up_sample_ready", "a.up_drive_wires"]);
}

#[test]
fn line_trace_renders_a_fired_transfer() {
    let mut bench = SimInit::new();

    let adapter = CallToSignal::<u32>::new(&mut bench, "a");
    let downstream = RecvIfc::<u32>::new(&mut bench, "downstream.in");
    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(adapter.send().clone()),
        Endpoint::SignalSink(downstream.clone()),
    )
    .unwrap();
    downstream.set_rdy(true);

    let mut simu = bench.init().unwrap();
    simu.tick();
    adapter.recv().call(5).unwrap();
    simu.tick();

    assert_eq!(adapter.send().line_trace(), "5(#>)");
    assert_eq!(adapter.line_trace(), "5( >)()5(#>)");
}

#[test]
fn wave_buffer_renders_one_row_per_backing_wire() {
    let mut bench = SimInit::new();

    let adapter = CallToSignal::<u32>::new(&mut bench, "a");
    let downstream = RecvIfc::<u32>::new(&mut bench, "downstream.in");
    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(adapter.send().clone()),
        Endpoint::SignalSink(downstream),
    )
    .unwrap();

    let waves = WaveBuffer::new();
    bench.observe(waves.clone());

    let mut simu = bench.init().unwrap();
    simu.tick_n(3);

    let recorded = waves.waves();
    assert_eq!(recorded[0].0, "reset");
    assert_eq!(recorded[0].1.len(), 3);
    // Joined sink wires are folded into their backing wire.
    assert!(recorded.iter().any(|(name, _)| name == "a.send.msg"));
    assert!(recorded.iter().all(|(name, _)| !name.starts_with("downstream")));

    let rendered = waves.render();
    assert!(rendered.starts_with("reset"));
    assert!(rendered.contains("a.send.msg"));
}
