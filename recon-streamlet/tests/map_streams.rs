//! Per-key propagation through map streams.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_streamlet::{KeyEffect, KeyOutlet, MapInlet, MapInput, MapOutlet, MapOutletExt, MapOutput, Outlet};

type Counts = Rc<RefCell<BTreeMap<u8, usize>>>;

/// A source whose values are squared and filtered, counting evaluations
/// per key. The square closure only sees values, so keys are carried in
/// the value's high bits.
struct Pipeline {
    input: Rc<MapInput<u8, i64>>,
    outlets: Vec<Rc<KeyOutlet<u8, i64>>>,
    output: Rc<MapOutput<u8, i64>>,
    counts: Counts,
}

fn encode(key: u8, value: i64) -> i64 {
    (i64::from(key) << 32) | (value & 0xFFFF)
}

fn decode(value: i64) -> (u8, i64) {
    ((value >> 32) as u8, value & 0xFFFF)
}

impl Pipeline {
    fn new(keys: u8) -> Self {
        let counts: Counts = Rc::new(RefCell::new(BTreeMap::new()));
        let counted = counts.clone();
        let input: Rc<MapInput<u8, i64>> = MapInput::new();
        let evens = input
            .map_values(move |x: &i64| {
                let (key, value) = decode(*x);
                *counted.borrow_mut().entry(key).or_default() += 1;
                value * value
            })
            .filter(|_, x| x % 2 == 0);
        let outlets = (0..keys).map(|key| evens.outlet(key)).collect();
        let output = MapOutput::new();
        output.bind_output(&(evens.clone() as Rc<dyn MapOutlet<u8, i64>>));
        Self { input, outlets, output, counts }
    }

    fn put(&self, key: u8, value: i64) {
        self.input.put(key, encode(key, value));
    }

    fn values(&self) -> Vec<Option<i64>> {
        self.outlets.iter().map(|outlet| outlet.get()).collect()
    }

    fn reset_counts(&self) {
        self.counts.borrow_mut().clear();
    }

    fn counts(&self) -> BTreeMap<u8, usize> {
        self.counts.borrow().clone()
    }
}

#[test]
fn test_square_forward_then_backward() {
    let input: Rc<MapInput<String, i64>> = MapInput::new();
    let n = input.map_values(|x: &i64| x * x).outlet("n");

    input.set([("n".to_string(), 2)].into_iter().collect());
    input.recohere_output(1);
    assert_eq!(n.get(), Some(4));

    input.set([("n".to_string(), 4)].into_iter().collect());
    assert_eq!(n.get(), Some(4));
    n.recohere_output(2);
    assert_eq!(n.get(), Some(16));
}

#[test]
fn test_two_stage_chain_settles() {
    let input: Rc<MapInput<u8, i64>> = MapInput::new();
    let doubled = input.map_values(|x: &i64| x + 1).map_values(|x: &i64| x * 2).outlet(0u8);
    input.put(0, 1);
    input.recohere_output(1);
    assert_eq!(doubled.get(), Some(4));

    input.put(0, 3);
    doubled.recohere_output(2);
    assert_eq!(doubled.get(), Some(8));
}

#[test]
fn test_update_recomputes_one_key() {
    let pipeline = Pipeline::new(4);
    for key in 0..4 {
        pipeline.put(key, i64::from(key) + 2);
    }
    pipeline.input.recohere_output(1);
    assert_eq!(pipeline.values(), vec![Some(4), None, Some(16), None]);

    pipeline.reset_counts();
    pipeline.put(2, 6);
    pipeline.input.recohere_output(2);
    assert_eq!(pipeline.counts(), [(2, 1)].into_iter().collect());
    assert_eq!(pipeline.values(), vec![Some(4), None, Some(36), None]);
}

#[test]
fn test_backward_pull_recomputes_one_key() {
    let pipeline = Pipeline::new(3);
    for key in 0..3 {
        pipeline.put(key, 2);
    }
    pipeline.input.recohere_output(1);

    pipeline.reset_counts();
    pipeline.put(0, 8);
    pipeline.put(1, 10);
    pipeline.outlets[1].recohere_output(2);
    assert_eq!(pipeline.counts(), [(1, 1)].into_iter().collect());
    assert_eq!(pipeline.values(), vec![Some(4), Some(100), Some(4)]);

    pipeline.output.recohere_input(2);
    assert_eq!(pipeline.counts(), [(0, 1), (1, 1)].into_iter().collect());
    assert_eq!(pipeline.output.get(), [(0, 64), (1, 100), (2, 4)].into_iter().collect());
}

#[test]
fn test_filter_turns_updates_into_removals() {
    let pipeline = Pipeline::new(2);
    pipeline.put(0, 2);
    pipeline.put(1, 4);
    pipeline.input.recohere_output(1);
    assert_eq!(pipeline.output.keys(), vec![0, 1]);

    pipeline.put(1, 3);
    pipeline.input.recohere_output(2);
    assert_eq!(pipeline.values(), vec![Some(4), None]);
    assert_eq!(pipeline.output.keys(), vec![0]);

    pipeline.put(1, 6);
    pipeline.input.recohere_output(3);
    assert_eq!(pipeline.output.get_key(&1), Some(36));
}

#[test]
fn test_removal_reaches_the_sinks() {
    let pipeline = Pipeline::new(2);
    pipeline.put(0, 2);
    pipeline.put(1, 2);
    pipeline.input.recohere_output(1);
    pipeline.input.remove(&0);
    pipeline.input.recohere_output(2);
    assert_eq!(pipeline.values(), vec![None, Some(4)]);
    assert_eq!(pipeline.output.get(), [(1, 4)].into_iter().collect());
}

#[test]
fn test_key_effects_fan_out_only_to_their_key() {
    let input: Rc<MapInput<u8, i64>> = MapInput::from_map([(0, 1), (1, 1)].into_iter().collect());
    let zero = input.outlet(0u8);
    let one = input.outlet(1u8);
    input.recohere_output(1);
    input.decohere_output_key(KeyEffect::Update(1));
    input.put(1, 5);
    zero.recohere_output(2);
    one.recohere_output(2);
    assert_eq!((zero.get(), one.get()), (Some(1), Some(5)));
    assert!(zero.input().is_some());
}

#[test]
fn test_random_edits_match_a_model() {
    let seed = std::env::var("RECON_TEST_SEED")
        .ok()
        .and_then(|seed| seed.parse().ok())
        .unwrap_or(0x5eed);
    let mut rng = StdRng::seed_from_u64(seed);
    let pipeline = Pipeline::new(8);
    let mut model: BTreeMap<u8, i64> = BTreeMap::new();
    for version in 1..200u64 {
        for _ in 0..rng.gen_range(1..4) {
            let key = rng.gen_range(0..8u8);
            if rng.gen_bool(0.2) {
                pipeline.input.remove(&key);
                model.remove(&key);
            } else {
                let value = rng.gen_range(0..100);
                pipeline.put(key, value);
                model.insert(key, value);
            }
        }
        if rng.gen() {
            pipeline.input.recohere_output(version);
        } else {
            pipeline.output.recohere_input(version);
        }
        let expected: BTreeMap<u8, i64> = model
            .iter()
            .map(|(key, value)| (*key, value * value))
            .filter(|(_, value)| value % 2 == 0)
            .collect();
        assert_eq!(pipeline.output.get(), expected, "seed {} version {}", seed, version);
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 100, ..ProptestConfig::default() })]

    #[test]
    fn forward_and_backward_agree(
        batches in prop::collection::vec(
            prop::collection::vec((0..6u8, prop::option::of(0..50i64)), 1..5),
            1..12,
        )
    ) {
        let forward = Pipeline::new(6);
        let backward = Pipeline::new(6);
        for (version, batch) in batches.into_iter().enumerate() {
            let version = version as u64 + 1;
            for (key, value) in batch {
                for pipeline in [&forward, &backward] {
                    match value {
                        Some(value) => pipeline.put(key, value),
                        None => {
                            pipeline.input.remove(&key);
                        }
                    }
                }
            }
            forward.input.recohere_output(version);
            for outlet in &backward.outlets {
                outlet.recohere_output(version);
            }
            backward.output.recohere_input(version);
            prop_assert_eq!(forward.values(), backward.values());
            prop_assert_eq!(forward.output.get(), backward.output.get());
        }
    }
}
