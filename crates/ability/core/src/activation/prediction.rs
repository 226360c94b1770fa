use std::collections::VecDeque;

use super::input::ActivationInput;
use super::snapshot::ReconcileSnapshot;
use crate::ids::Tick;

/// Inputs a predicting peer has simulated but the authority has not yet confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictionBuffer {
    inputs: VecDeque<ActivationInput>,
    capacity: usize,
    confirmed: Option<Tick>,
}

impl PredictionBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inputs: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            confirmed: None,
        }
    }

    /// Records an input; the oldest one is dropped once the buffer is full.
    pub fn record(&mut self, input: ActivationInput) {
        if self.inputs.len() == self.capacity {
            if let Some(dropped) = self.inputs.pop_front() {
                tracing::warn!(tick = %dropped.tick, "prediction buffer full; oldest input dropped");
            }
        }
        self.inputs.push_back(input);
    }

    /// Tick of the last snapshot accepted.
    pub fn confirmed(&self) -> Option<Tick> {
        self.confirmed
    }

    /// Accepts `snapshot` if it is newer than the last one, dropping confirmed inputs.
    ///
    /// Returns the inputs to replay, oldest first, or `None` for stale snapshots.
    pub fn accept(&mut self, snapshot: &ReconcileSnapshot) -> Option<Vec<ActivationInput>> {
        if !snapshot.supersedes(self.confirmed) {
            return None;
        }
        self.confirmed = Some(snapshot.tick);
        while self
            .inputs
            .front()
            .is_some_and(|input| input.tick <= snapshot.tick)
        {
            self.inputs.pop_front();
        }
        Some(self.inputs.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tick: u64) -> ReconcileSnapshot {
        ReconcileSnapshot {
            tick: Tick(tick),
            ..ReconcileSnapshot::default()
        }
    }

    #[test]
    fn returns_unconfirmed_inputs() {
        let mut buffer = PredictionBuffer::new(8);
        for tick in 1..=5 {
            buffer.record(ActivationInput::idle(Tick(tick)));
        }
        let replay = buffer.accept(&snapshot(3)).unwrap();
        let ticks: Vec<u64> = replay.iter().map(|input| input.tick.0).collect();
        assert_eq!(ticks, vec![4, 5]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.confirmed(), Some(Tick(3)));
    }

    #[test]
    fn ignores_stale_snapshots() {
        let mut buffer = PredictionBuffer::new(8);
        buffer.record(ActivationInput::idle(Tick(4)));
        assert!(buffer.accept(&snapshot(3)).is_some());
        assert!(buffer.accept(&snapshot(3)).is_none());
        assert!(buffer.accept(&snapshot(2)).is_none());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut buffer = PredictionBuffer::new(2);
        for tick in 1..=3 {
            buffer.record(ActivationInput::idle(Tick(tick)));
        }
        let replay = buffer.accept(&snapshot(0)).unwrap();
        assert_eq!(replay.first().map(|input| input.tick), Some(Tick(2)));
    }
}
