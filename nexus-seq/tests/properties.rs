use std::cell::RefCell;
use std::ops::Bound;
use std::rc::Rc;

use nexus_seq::{ChangeEvent, Sequence, SequenceConfig, SequenceError, seq};

fn observable<T>(values: impl IntoIterator<Item = T>) -> Sequence<T> {
    Sequence::from_iter_with_config(SequenceConfig::default().observable(true), values)
}

fn record<T: Clone + 'static>(seq: &mut Sequence<T>) -> Rc<RefCell<Vec<ChangeEvent<T>>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _sub = seq.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

// =============================================================================
// Worked examples
// =============================================================================

#[test]
fn append_prepend_insert_remove() {
    let mut seq = Sequence::new();
    seq.push_back(10);
    seq.push_back(20);
    seq.push_front(5);
    assert_eq!(seq.to_vec(), vec![5, 10, 20]);

    seq.insert_at(2, 15).unwrap();
    assert_eq!(seq.to_vec(), vec![5, 10, 15, 20]);

    assert_eq!(seq.remove_at(-1), Some(20));
    assert_eq!(seq.to_vec(), vec![5, 10, 15]);
}

#[test]
fn range_then_slice() {
    let seq = Sequence::range(1, 11, 1).unwrap();
    assert_eq!(seq.slice(2..7).to_vec(), vec![3, 4, 5, 6, 7]);
}

#[test]
fn rollback_hides_intermediate_state() {
    let mut seq = observable([10, 20, 30]);

    let snapshots = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&snapshots);
    let _sub = seq.subscribe(move |event: &ChangeEvent<i32>| {
        sink.borrow_mut().push(event.clone());
    });

    let mut tx = seq.begin_transaction();
    tx.push_back(40);
    tx.remove_at(0);
    assert_eq!(tx.to_vec(), vec![20, 30, 40]);
    tx.rollback();

    assert_eq!(seq.to_vec(), vec![10, 20, 30]);
    assert_eq!(*snapshots.borrow(), vec![ChangeEvent::Rollback]);
}

// =============================================================================
// Laws
// =============================================================================

#[test]
fn insert_then_remove_is_identity() {
    let base: Vec<i32> = (0..20).collect();
    for index in -20isize..=20 {
        let mut seq: Sequence<i32> = base.iter().copied().collect();
        seq.insert_at(index, 99).unwrap();
        assert_eq!(seq.len(), 21);

        // Resolve against the pre-insert length, as insert_at does.
        let pos = if index < 0 { 20 + index } else { index };
        assert_eq!(seq.get(pos), Some(&99), "index={index}");
        assert_eq!(seq.remove_at(pos), Some(99));
        assert_eq!(seq.to_vec(), base, "index={index}");
    }
}

#[test]
fn reverse_twice_is_identity() {
    for n in [1, 2, 7, 8, 9, 64, 100] {
        let mut seq: Sequence<u32> = (0..n).collect();
        seq.reverse();
        seq.reverse();
        assert_eq!(seq.len(), n as usize);
        assert_eq!(seq.to_vec(), (0..n).collect::<Vec<_>>());
    }
}

#[test]
fn concat_laws() {
    for m in [0usize, 1, 5, 30] {
        for n in [0usize, 1, 5, 30] {
            let left: Vec<usize> = (0..m).collect();
            let right: Vec<usize> = (100..100 + n).collect();

            let mut a: Sequence<usize> = left.iter().copied().collect();
            let mut b: Sequence<usize> = right.iter().copied().collect();
            a.concat(&mut b);

            assert_eq!(a.len(), m + n);
            assert_eq!(b.len(), 0);
            let expected: Vec<usize> = left.iter().chain(&right).copied().collect();
            assert_eq!(a.to_vec(), expected, "m={m} n={n}");

            for (i, value) in expected.iter().enumerate() {
                assert_eq!(a.get(i as isize), Some(value));
            }
        }
    }
}

#[test]
fn slice_matches_vec_subrange() {
    let values: Vec<i32> = (0..12).collect();
    let seq: Sequence<i32> = values.iter().copied().collect();

    for start in 0..=12 {
        for end in start..=12 {
            assert_eq!(
                seq.slice(start as isize..end as isize).to_vec(),
                values[start..end].to_vec()
            );
        }
    }

    assert_eq!(seq.slice(-4..-1).to_vec(), values[8..11].to_vec());
    assert_eq!(seq.slice(-100..100).to_vec(), values);
    assert!(seq.slice(100..200).is_empty());

    // Inclusive ends and exclusive starts, resolved before clamping.
    for bound in -20isize..=20 {
        let resolved = if bound < 0 { 12 + bound } else { bound };
        let after = (resolved + 1).clamp(0, 12) as usize;
        assert_eq!(
            seq.slice(..=bound).to_vec(),
            values[..after].to_vec(),
            "..={bound}"
        );
        assert_eq!(
            seq.slice((Bound::Excluded(bound), Bound::Unbounded)).to_vec(),
            values[after..].to_vec(),
            "({bound}, ..)"
        );
    }
}

#[test]
fn sort_is_stable_under_ignored_tags() {
    let tagged: Vec<(u8, usize)> = [3u8, 1, 2, 3, 1, 2, 3, 1]
        .into_iter()
        .enumerate()
        .map(|(tag, key)| (key, tag))
        .collect();
    let mut seq: Sequence<(u8, usize)> = tagged.iter().copied().collect();
    seq.sort_by(|a, b| a.0.cmp(&b.0));

    let mut expected = tagged;
    expected.sort_by_key(|item| item.0);
    assert_eq!(seq.to_vec(), expected);
}

#[test]
fn rollback_restores_after_many_mutations() {
    let mut seq: Sequence<i32> = (0..40).collect();
    let before = seq.to_vec();

    let mut tx = seq.begin_transaction();
    tx.push_front(-1);
    tx.insert_at(10, 500).unwrap();
    tx.remove_at(5);
    tx.set(-1, 1000);
    tx.sort_by(|a, b| b.cmp(a));
    tx.reverse();
    tx.pop_back();
    tx.pop_front();
    tx.concat(&mut seq![7, 8, 9]);
    tx.clear();
    tx.extend([1, 2, 3]);
    tx.rollback();

    assert_eq!(seq.len(), before.len());
    assert_eq!(seq.to_vec(), before);
    for (i, value) in before.iter().enumerate() {
        assert_eq!(seq.get(i as isize), Some(value));
    }
}

#[test]
fn commit_delivers_each_event_once_in_order() {
    let mut seq = observable([1, 2, 3]);
    let first = record(&mut seq);
    let second = record(&mut seq);

    let mut tx = seq.begin_transaction();
    tx.push_back(4);
    tx.set(0, 10);
    tx.remove_at(1);
    tx.reverse();
    assert!(first.borrow().is_empty());
    tx.commit();

    let expected = vec![
        ChangeEvent::Add(4),
        ChangeEvent::Update {
            index: 0,
            old: 1,
            new: 10,
        },
        ChangeEvent::Remove(2),
        ChangeEvent::Reverse,
    ];
    assert_eq!(*first.borrow(), expected);
    assert_eq!(*second.borrow(), expected);

    seq.push_back(5);
    assert_eq!(first.borrow().len(), 5);
}

// =============================================================================
// Error surface
// =============================================================================

#[test]
fn strict_and_lenient_boundaries() {
    let mut seq = seq![1, 2, 3];

    assert_eq!(
        seq.insert_at(7, 0),
        Err(SequenceError::IndexOutOfBounds { index: 7, len: 3 })
    );
    assert_eq!(seq.get(7), None);
    assert!(!seq.set(7, 0));
    assert_eq!(seq.remove_at(7), None);
    assert_eq!(seq.to_vec(), vec![1, 2, 3]);
}

#[test]
fn handles_survive_unrelated_edits() {
    let mut seq: Sequence<u32> = (0..50).collect();
    let h = seq.handle_at(25).unwrap();

    seq.push_front(1000);
    seq.remove_at(3);
    seq.insert_at(40, 2000).unwrap();
    seq.reverse();
    assert_eq!(seq.get_by_handle(h), Ok(&25));

    seq.remove_handle(h).unwrap();
    assert_eq!(seq.get_by_handle(h), Err(SequenceError::StaleHandle));

    // Freed slot reuse must not resurrect the handle.
    seq.push_back(7);
    assert_eq!(seq.get_by_handle(h), Err(SequenceError::StaleHandle));
}

#[cfg(feature = "serde")]
#[test]
fn serde_as_plain_list() {
    let seq = seq![1, 2, 3];
    let json = serde_json::to_string(&seq).unwrap();
    assert_eq!(json, "[1,2,3]");

    let back: Sequence<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, seq);

    let config: SequenceConfig = serde_json::from_str(r#"{"observable":true}"#).unwrap();
    assert!(config.is_observable());
    assert!(config.has_skip_links());
}
