use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use ndarray::{Array1, array};
use reid_rs::{GlobalIdentityStore, ManualClock, StoreConfig};

fn no_exclusions() -> HashSet<u64> {
    HashSet::new()
}

fn one_hot(dim: usize, index: usize) -> Array1<f32> {
    let mut v = Array1::zeros(dim);
    v[index] = 1.0;
    v
}

#[test]
fn test_two_identity_timeline() {
    let clock = Arc::new(ManualClock::new(0.0));
    let store = GlobalIdentityStore::with_clock(StoreConfig::default(), clock.clone()).unwrap();

    // t = 0: identity A
    let a = store.create_new(array![1.0_f32, 0.0].view()).unwrap();

    // t = 1: a close query matches A
    clock.set(1.0);
    let result = store
        .match_tracklet(array![0.99_f32, 0.14].view(), &no_exclusions())
        .unwrap();
    assert_eq!(result.id, Some(a));
    assert!(result.score >= 0.75);

    // t = 1: identity B, then a query halfway between A and B
    let b = store.create_new(array![0.0_f32, 1.0].view()).unwrap();
    assert!(b > a);
    let result = store
        .match_tracklet(array![0.71_f32, 0.71].view(), &no_exclusions())
        .unwrap();
    assert_eq!(result.id, None);
    assert!(result.score > 0.7 && result.score < 0.75);

    // Every embedding of A is now older than max_age_seconds, and A was last
    // seen longer ago than inactive_age_seconds.
    clock.set(62.0);
    let exclude: HashSet<u64> = [b].into_iter().collect();
    let result = store
        .match_tracklet(array![1.0_f32, 0.0].view(), &exclude)
        .unwrap();
    assert_eq!(result.id, None);
    assert_eq!(result.score, 0.0);

    let identity_a = store.identity(a).unwrap();
    assert!(identity_a.is_inactive());
    assert_eq!(identity_a.buffer_len(), 0);
    assert_eq!(identity_a.last_seen(), 1.0);
}

#[test]
fn test_ambiguity_wins_over_threshold() {
    let store = GlobalIdentityStore::default();
    let first = store.create_new(array![0.9_f32, 0.1, 0.0].view()).unwrap();
    let second = store.create_new(array![0.9_f32, 0.0, 0.1].view()).unwrap();

    let query = array![1.0_f32, 0.0, 0.0];
    let result = store.match_tracklet(query.view(), &no_exclusions()).unwrap();
    assert_eq!(result.id, None);
    assert!(result.score >= store.config().similarity_threshold);

    // Excluding one side removes the ambiguity.
    let exclude: HashSet<u64> = [second].into_iter().collect();
    let result = store.match_tracklet(query.view(), &exclude).unwrap();
    assert_eq!(result.id, Some(first));
}

#[test]
fn test_concurrent_creation_of_dissimilar_people() {
    const THREADS: usize = 8;
    let store = Arc::new(GlobalIdentityStore::default());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let embedding = one_hot(THREADS, i);
                barrier.wait();
                let result = store
                    .match_tracklet(embedding.view(), &HashSet::new())
                    .unwrap();
                match result.id {
                    Some(id) => id,
                    None => store.create_new(embedding.view()).unwrap(),
                }
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=THREADS as u64).collect::<Vec<_>>());
    assert_eq!(store.len(), THREADS);
}

#[test]
fn test_concurrent_ids_strictly_increase_per_caller() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;
    let store = Arc::new(GlobalIdentityStore::default());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|i| store.create_new(one_hot(PER_THREAD, i).view()).unwrap())
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all.extend(ids);
    }
    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(all.iter().max(), Some(&((THREADS * PER_THREAD) as u64)));
}

#[test]
fn test_concurrent_match_or_create_same_person() {
    const THREADS: usize = 8;
    let store = Arc::new(GlobalIdentityStore::default());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store
                    .match_or_create(array![0.6_f32, 0.8].view(), &HashSet::new())
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<(u64, f32, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|(_, _, created)| *created).count(), 1);
    assert!(results.iter().all(|(id, _, _)| *id == 1));
    assert_eq!(store.len(), 1);
}
