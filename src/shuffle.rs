use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleSequence {
    order: Vec<u16>,
    cursor: usize,
}

impl ShuffleSequence {
    pub fn order(&self) -> &[u16] {
        &self.order
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.order.len()
    }

    pub fn dispatched(&self) -> &[u16] {
        &self.order[..self.cursor]
    }
}

#[derive(Debug)]
pub struct ShuffleEngine {
    rng: SmallRng,
    sequence: Option<ShuffleSequence>,
}

impl ShuffleEngine {
    pub fn new() -> Self {
        Self {
            rng: rand::make_rng::<SmallRng>(),
            sequence: None,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            sequence: None,
        }
    }

    pub fn sequence(&self) -> Option<&ShuffleSequence> {
        self.sequence.as_ref()
    }

    pub fn start(&mut self, catalog_size: u16) -> &ShuffleSequence {
        let fresh = self.permutation(catalog_size);
        self.sequence.insert(fresh)
    }

    pub fn advance(&mut self, catalog_size: u16) -> Option<(u16, bool)> {
        let mut new_cycle = false;
        let needs_cycle = self
            .sequence
            .as_ref()
            .is_none_or(|seq| seq.is_exhausted() || seq.len() != usize::from(catalog_size));
        if needs_cycle {
            new_cycle = self.sequence.is_some();
            let fresh = self.permutation(catalog_size);
            self.sequence = Some(fresh);
        }

        let seq = self.sequence.as_mut()?;
        let track = *seq.order.get(seq.cursor)?;
        seq.cursor += 1;
        Some((track, new_cycle))
    }

    pub fn step_back(&mut self) -> Option<u16> {
        let seq = self.sequence.as_mut()?;
        if seq.cursor == 0 {
            return None;
        }
        if seq.cursor >= 2 {
            seq.cursor -= 1;
        }
        seq.order.get(seq.cursor - 1).copied()
    }

    pub fn stop(&mut self) {
        self.sequence = None;
    }

    fn permutation(&mut self, catalog_size: u16) -> ShuffleSequence {
        let mut order: Vec<u16> = (1..=catalog_size).collect();
        order.shuffle(&mut self.rng);
        ShuffleSequence { order, cursor: 0 }
    }
}

impl Default for ShuffleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;
    use proptest::prop_assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn start_builds_a_full_permutation() {
        let mut engine = ShuffleEngine::seeded(7);
        let seq = engine.start(41);
        let values: BTreeSet<u16> = seq.order().iter().copied().collect();
        assert_eq!(values, (1..=41).collect());
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn first_advance_after_start_is_not_a_new_cycle() {
        let mut engine = ShuffleEngine::seeded(1);
        let first = engine.start(5).order()[0];
        assert_eq!(engine.advance(5), Some((first, false)));
    }

    #[test]
    fn step_back_replays_previous_track() {
        let mut engine = ShuffleEngine::seeded(3);
        engine.start(4);
        let (a, _) = engine.advance(4).expect("a");
        let (b, _) = engine.advance(4).expect("b");
        assert_eq!(engine.step_back(), Some(a));
        assert_eq!(engine.advance(4), Some((b, false)));
    }

    #[test]
    fn step_back_at_cycle_start_repeats_current() {
        let mut engine = ShuffleEngine::seeded(3);
        engine.start(4);
        let (a, _) = engine.advance(4).expect("a");
        assert_eq!(engine.step_back(), Some(a));
        assert_eq!(engine.sequence().map(ShuffleSequence::cursor), Some(1));
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        let mut engine = ShuffleEngine::seeded(3);
        assert_eq!(engine.advance(0), None);
    }

    #[test]
    fn stop_discards_sequence() {
        let mut engine = ShuffleEngine::seeded(3);
        engine.start(4);
        engine.stop();
        assert!(engine.sequence().is_none());
    }

    proptest::proptest! {
        #[test]
        fn one_cycle_visits_every_track_once(size in 1u16..80, seed in proptest::num::u64::ANY) {
            let mut engine = ShuffleEngine::seeded(seed);
            engine.start(size);
            let mut seen = Vec::new();
            for _ in 0..size {
                let (track, new_cycle) = engine.advance(size).expect("track");
                prop_assert!(!new_cycle);
                seen.push(track);
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, (1..=size).collect::<Vec<_>>());
        }

        #[test]
        fn exhausted_cycle_is_renewed(size in 1u16..60, seed in proptest::num::u64::ANY) {
            let mut engine = ShuffleEngine::seeded(seed);
            engine.start(size);
            for _ in 0..size {
                engine.advance(size).expect("track");
            }

            let (first, new_cycle) = engine.advance(size).expect("renewed");
            prop_assert!(new_cycle);
            let mut next_cycle = vec![first];
            for _ in 1..size {
                let (track, renewed) = engine.advance(size).expect("track");
                prop_assert!(!renewed);
                next_cycle.push(track);
            }
            next_cycle.sort_unstable();
            prop_assert_eq!(next_cycle, (1..=size).collect::<Vec<_>>());
        }
    }
}
