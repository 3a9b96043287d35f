//! Randomized checks against a `Vec` model.

use nexus_seq::{Direction, Sequence, SequenceConfig};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn make_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Applies one random edit to both the sequence and the model.
fn random_edit(rng: &mut SmallRng, seq: &mut Sequence<u64>, model: &mut Vec<u64>, next: &mut u64) {
    let len = model.len();
    let op = rng.random_range(0..100);
    *next += 1;
    let value = *next;

    if op < 25 {
        seq.push_back(value);
        model.push(value);
    } else if op < 35 {
        seq.push_front(value);
        model.insert(0, value);
    } else if op < 55 {
        let pos = rng.random_range(0..=len);
        seq.insert_at(pos as isize, value).unwrap();
        model.insert(pos, value);
    } else if op < 75 && len > 0 {
        let pos = rng.random_range(0..len);
        assert_eq!(seq.remove_at(pos as isize), Some(model.remove(pos)));
    } else if op < 82 {
        assert_eq!(seq.pop_back(), model.pop());
    } else if op < 89 {
        let expected = (!model.is_empty()).then(|| model.remove(0));
        assert_eq!(seq.pop_front(), expected);
    } else if op < 96 && len > 0 {
        let pos = rng.random_range(0..len);
        assert!(seq.set(pos as isize, value));
        model[pos] = value;
    } else if op < 98 {
        seq.reverse();
        model.reverse();
    } else {
        seq.sort();
        model.sort();
    }
}

fn assert_matches(seq: &Sequence<u64>, model: &[u64]) {
    assert_eq!(seq.len(), model.len());
    for (i, expected) in model.iter().enumerate() {
        assert_eq!(seq.get(i as isize), Some(expected), "index {i}");
    }
    assert_eq!(seq.iter().rev().copied().collect::<Vec<_>>(), {
        let mut rev = model.to_vec();
        rev.reverse();
        rev
    });
}

#[test]
fn stress_random_operations() {
    let mut rng = make_rng(99999);
    let mut seq = Sequence::new();
    let mut model = Vec::new();
    let mut next = 0;

    for step in 0..5_000 {
        random_edit(&mut rng, &mut seq, &mut model, &mut next);
        if step % 50 == 0 {
            assert_matches(&seq, &model);
        }
    }
    assert_matches(&seq, &model);
}

#[test]
fn skip_and_linear_seeks_agree() {
    let mut rng = make_rng(12345);
    let mut indexed = Sequence::new();
    let mut linear = Sequence::with_config(SequenceConfig::default().skip_links(false));
    let mut model = Vec::new();
    let mut shadow = Vec::new();
    let mut next = 0;

    for _ in 0..3_000 {
        // Replay the same random stream against the unindexed sequence.
        let mut fork = rng.clone();
        let mut fork_next = next;
        random_edit(&mut rng, &mut indexed, &mut model, &mut next);
        random_edit(&mut fork, &mut linear, &mut shadow, &mut fork_next);
        assert_eq!(model, shadow);

        for i in 0..model.len() as isize {
            assert_eq!(indexed.get(i), linear.get(i), "index {i}");
        }
    }
}

#[test]
fn random_transactions_roll_back_exactly() {
    let mut rng = make_rng(4242);
    let mut seq: Sequence<u64> = (0..64).collect();
    let mut next = 1_000;

    for round in 0..200 {
        let before = seq.to_vec();
        let mut model = before.clone();

        let mut tx = seq.begin_transaction();
        for _ in 0..rng.random_range(1..40) {
            random_edit(&mut rng, &mut tx, &mut model, &mut next);
        }
        if rng.random_bool(0.3) {
            tx.clear();
            model.clear();
        }
        assert_eq!(tx.to_vec(), model, "round {round}");

        if rng.random_bool(0.5) {
            tx.rollback();
            assert_matches(&seq, &before);
        } else {
            tx.commit();
            assert_matches(&seq, &model);
        }

        if seq.len() < 16 {
            seq.extend(next..next + 32);
            next += 32;
        }
    }
}

#[test]
fn cursor_walk_matches_iter() {
    let mut rng = make_rng(7);
    let mut seq = Sequence::new();
    let mut model = Vec::new();
    let mut next = 0;
    for _ in 0..500 {
        random_edit(&mut rng, &mut seq, &mut model, &mut next);
    }

    let mut cursor = seq.cursor();
    let forward: Vec<u64> = cursor.values(&seq).copied().collect();
    assert_eq!(forward, model);

    cursor.set_direction(Direction::Backward);
    cursor.reset(&seq, true);
    let backward: Vec<u64> = cursor.values(&seq).copied().collect();
    let mut reversed = model.clone();
    reversed.reverse();
    assert_eq!(backward, reversed);
}
