//! En/rdy handshake timing across the adapters.

use std::cell::RefCell;
use std::rc::Rc;

use synchronix::bridge::{CallToSignal, SignalToCall};
use synchronix::ports::{CalleeIfc, CallerIfc, RecvIfc};
use synchronix::resolver::{connect, Endpoint};
use synchronix::simulation::SimInit;

/// A producer calling on ticks 0 and 2 into a statically-ready signal
/// consumer, through an automatically inserted push-to-wire adapter.
///
/// A call made on tick *t* must be committed to the wires within tick *t*,
/// and en must be asserted on exactly the ticks a call was made.
#[test]
fn calls_commit_to_the_wires_within_the_tick() {
    let mut bench = SimInit::new();

    let producer = CallerIfc::<u32>::new(&mut bench, "producer.out");
    let consumer = RecvIfc::<u32>::new(&mut bench, "consumer.in");

    let stimulus = bench.add_block("producer.up_stimulus", {
        let out = producer.clone();
        let schedule = vec![Some(5u32), None, Some(7), None];
        let mut tick = 0;
        move || {
            if let Some(Some(msg)) = schedule.get(tick) {
                assert!(out.ready());
                out.call(*msg).unwrap();
            }
            tick += 1;
        }
    });
    bench.declare_call_site(stimulus, producer.method());

    connect(
        &mut bench,
        "top",
        Endpoint::CallSource(producer),
        Endpoint::SignalSink(consumer.clone()),
    )
    .unwrap();
    consumer.set_rdy(true);

    let mut simu = bench.init().unwrap();

    let mut observed = Vec::new();
    for _ in 0..4 {
        simu.tick();
        observed.push((consumer.en(), consumer.msg()));
    }

    // The msg wire retains its last driven value on idle ticks.
    assert_eq!(
        observed,
        vec![(true, 5), (false, 5), (true, 7), (false, 7)]
    );
}

/// A backlog pushed through both adapters arrives in order, exactly once,
/// at a rate of one message per tick.
#[test]
fn round_trip_preserves_order_and_multiplicity() {
    let mut bench = SimInit::new();

    let producer = CallerIfc::<u32>::new(&mut bench, "producer.out");
    let received = Rc::new(RefCell::new(Vec::new()));
    let consumer = CalleeIfc::new(&mut bench, "consumer.in", || true, {
        let received = received.clone();
        move |msg: u32| received.borrow_mut().push(msg)
    });

    let push = CallToSignal::<u32>::new(&mut bench, "top.push");
    let pull = SignalToCall::<u32>::new(&mut bench, "top.pull");

    let stimulus = bench.add_block("producer.up_stimulus", {
        let out = producer.clone();
        let mut backlog = vec![5u32, 7, 11].into_iter().peekable();
        move || {
            if backlog.peek().is_some() && out.ready() {
                out.call(backlog.next().unwrap()).unwrap();
            }
        }
    });
    bench.declare_call_site(stimulus, producer.method());

    connect(
        &mut bench,
        "top",
        Endpoint::CallSource(producer),
        Endpoint::CallSink(push.recv().clone()),
    )
    .unwrap();
    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(push.send().clone()),
        Endpoint::SignalSink(pull.recv().clone()),
    )
    .unwrap();
    connect(
        &mut bench,
        "top",
        Endpoint::CallSource(pull.send().clone()),
        Endpoint::CallSink(consumer),
    )
    .unwrap();

    let mut simu = bench.init().unwrap();

    let mut arrivals = Vec::new();
    for _ in 0..8 {
        simu.tick();
        arrivals.push(received.borrow().len());
    }

    assert_eq!(*received.borrow(), vec![5, 7, 11]);
    // The rdy chain settles during tick 0, then one message moves per tick.
    assert_eq!(arrivals, vec![0, 1, 2, 3, 3, 3, 3, 3]);
}

/// Readiness driven by the consumer on tick *t* admits a call on tick
/// *t + 1*: a consumer refusing for `k` ticks keeps the producer's guard
/// false for `k + 1` ticks, and the message is neither lost nor duplicated.
#[test]
fn back_pressure_raises_the_guard_one_tick_after_ready() {
    let mut bench = SimInit::new();

    let adapter = CallToSignal::<u32>::new(&mut bench, "top.push");
    let downstream = RecvIfc::<u32>::new(&mut bench, "downstream.in");

    // The downstream refuses for the first 2 ticks, then stays ready.
    let ready_driver = bench.add_block("downstream.up_drive_ready", {
        let downstream = downstream.clone();
        let mut tick = 0u64;
        move || {
            downstream.set_rdy(tick >= 2);
            tick += 1;
        }
    });
    downstream.declare_ready_driver(ready_driver);

    let guard_trace = Rc::new(RefCell::new(Vec::new()));
    let stimulus = bench.add_block("producer.up_stimulus", {
        let out = adapter.recv().clone();
        let guard_trace = guard_trace.clone();
        let mut sent = false;
        move || {
            let ready = out.ready();
            guard_trace.borrow_mut().push(ready);
            if ready && !sent {
                out.call(42).unwrap();
                sent = true;
            }
        }
    });
    bench.declare_call_site(stimulus, adapter.recv().method());

    connect(
        &mut bench,
        "top",
        Endpoint::SignalSource(adapter.send().clone()),
        Endpoint::SignalSink(downstream.clone()),
    )
    .unwrap();

    let mut simu = bench.init().unwrap();

    let mut deliveries = Vec::new();
    for _ in 0..6 {
        simu.tick();
        if downstream.en() {
            deliveries.push(downstream.msg());
        }
    }

    assert_eq!(
        *guard_trace.borrow(),
        vec![false, false, false, true, true, true]
    );
    assert_eq!(deliveries, vec![42]);
}
