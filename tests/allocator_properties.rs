//! Behavioural properties of the pair allocator through its public API

use paircache::error::{Error, Result};
use paircache::{ActivePair, PairAllocator, PairId, SlotMode};

/// Deterministic pseudo-random sequence for operation mixes
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn assert_consistent(pairs: &PairAllocator) {
    assert!(pairs.used() < pairs.capacity(), "used reached capacity");
    assert_eq!(pairs.verify_links().expect("recency list corrupted"), pairs.used());

    let recent: Vec<PairId> = pairs.recent().collect();
    assert_eq!(recent.len(), pairs.used());
    for pair in recent {
        let key = pairs.key_of(pair).expect("linked pair has no key");
        let found = pairs.find(key.fg, key.bg).expect("linked pair not indexed");
        assert_eq!(pairs.key_of(found), Some(key));
        assert_ne!(pairs.mode_of(pair), Some(SlotMode::Free));
    }
}

#[test]
fn test_idempotent_hit() -> Result<()> {
    let mut pairs = PairAllocator::new(16)?;
    for fg in -1..4 {
        for bg in -1..2 {
            let first = pairs.allocate(fg, bg)?;
            let second = pairs.allocate(fg, bg)?;
            assert_eq!(first, second);
        }
    }
    Ok(())
}

#[test]
fn test_sentinel_is_never_a_target() -> Result<()> {
    let mut pairs = PairAllocator::new(8)?;
    pairs.allocate(1, 1)?;

    assert!(matches!(pairs.release(PairId::SENTINEL), Err(Error::InvalidSlot(_))));
    assert!(matches!(
        pairs.reserve(PairId::SENTINEL, 2, 2),
        Err(Error::InvalidSlot(_))
    ));
    assert_eq!(pairs.mode_of(PairId::SENTINEL), Some(SlotMode::Kept));
    assert_eq!(pairs.key_of(PairId::SENTINEL), None);
    Ok(())
}

#[test]
fn test_release_then_find_misses_until_reallocated() -> Result<()> {
    let mut pairs = PairAllocator::new(8)?;
    let pair = pairs.allocate(4, 5)?;
    pairs.allocate(6, 7)?;

    pairs.release(pair)?;
    assert_eq!(pairs.find(4, 5), None);
    assert!(matches!(pairs.release(pair), Err(Error::AlreadyFree(_))));

    pairs.allocate(8, 9)?;
    assert_eq!(pairs.find(4, 5), None);

    let again = pairs.allocate(4, 5)?;
    assert_eq!(pairs.find(4, 5), Some(again));
    Ok(())
}

#[test]
fn test_eviction_on_four_slot_table() -> Result<()> {
    let mut pairs = PairAllocator::new(4)?;
    let a = pairs.allocate(1, 2)?;
    let b = pairs.allocate(3, 4)?;
    let c = pairs.allocate(5, 6)?;
    assert_eq!(
        [a, b, c].iter().collect::<std::collections::HashSet<_>>().len(),
        3
    );

    let d = pairs.allocate(7, 8)?;
    assert_eq!(d, a);
    assert_eq!(pairs.find(1, 2), None);
    assert_eq!(pairs.find(7, 8), Some(a));
    assert_eq!(pairs.find(3, 4), Some(b));
    assert_eq!(pairs.find(5, 6), Some(c));

    // b is now the oldest
    assert_eq!(pairs.allocate(9, 9)?, b);
    assert_consistent(&pairs);
    Ok(())
}

#[test]
fn test_reserve_overrides_recency_position() -> Result<()> {
    let mut pairs = PairAllocator::new(4)?;
    let a = pairs.allocate(1, 2)?;
    let b = pairs.allocate(3, 4)?;
    let c = pairs.allocate(5, 6)?;

    pairs.reserve(b, 9, 10)?;
    assert_eq!(pairs.find(9, 10), Some(b));
    assert_eq!(pairs.find(3, 4), None);
    assert_eq!(pairs.recent().collect::<Vec<_>>(), vec![b, c, a]);

    // Reserved pairs still age out: after a and c are evicted, b goes next
    assert_eq!(pairs.allocate(11, 11)?, a);
    assert_eq!(pairs.allocate(12, 12)?, c);
    assert_eq!(pairs.allocate(13, 13)?, b);
    assert_consistent(&pairs);
    Ok(())
}

#[test]
fn test_explicit_and_implicit_interleave() -> Result<()> {
    let mut pairs = PairAllocator::new(10)?;
    pairs.reserve(PairId(2), 0, 7)?;
    pairs.reserve(PairId(4), 1, 7)?;

    let got: Vec<PairId> = (0..5)
        .map(|n| pairs.allocate(n + 10, 0))
        .collect::<Result<_>>()?;
    assert_eq!(
        got,
        vec![PairId(1), PairId(3), PairId(5), PairId(6), PairId(7)]
    );
    assert_eq!(pairs.find(0, 7), Some(PairId(2)));
    assert_eq!(pairs.find(1, 7), Some(PairId(4)));
    assert_consistent(&pairs);
    Ok(())
}

#[test]
fn test_random_operations_keep_invariants() -> Result<()> {
    for seed in [1u64, 7, 42, 1234] {
        let mut rng = Lcg(seed);
        let mut pairs = PairAllocator::new(9)?;

        for _ in 0..2000 {
            let fg = rng.next(6) as i32 - 1;
            let bg = rng.next(6) as i32 - 1;
            match rng.next(10) {
                0..=5 => {
                    let pair = pairs.allocate(fg, bg)?;
                    assert_eq!(pairs.allocate(fg, bg)?, pair);
                }
                6 | 7 => {
                    let pair = PairId(rng.next(9) as u16);
                    let result = pairs.reserve(pair, fg, bg);
                    if pair.is_sentinel() {
                        assert!(result.is_err());
                    } else {
                        result?;
                        assert_eq!(pairs.key_of(pair).map(|k| (k.fg, k.bg)), Some((fg, bg)));
                    }
                }
                _ => {
                    let pair = PairId(rng.next(10) as u16);
                    let was_used = pairs.key_of(pair);
                    let result = pairs.release(pair);
                    assert_eq!(result.is_ok(), was_used.is_some());
                    if let Some(key) = was_used {
                        // Another pair may hold the same key via reserve
                        assert_ne!(pairs.find(key.fg, key.bg), Some(pair));
                    }
                }
            }
            assert_consistent(&pairs);
        }

        pairs.teardown();
        assert_eq!(pairs.used(), 0);
        assert_consistent(&pairs);
    }
    Ok(())
}

#[test]
fn test_teardown_notifies_observer_for_every_pair() -> Result<()> {
    let mut pairs = PairAllocator::with_observer(6, ActivePair::new())?;
    let a = pairs.allocate(1, 1)?;
    pairs.allocate(2, 2)?;
    pairs.observer_mut().apply(a);

    assert_eq!(pairs.teardown(), 2);
    assert_eq!(pairs.observer().current(), PairId::SENTINEL);
    assert_eq!(pairs.find(1, 1), None);
    Ok(())
}
