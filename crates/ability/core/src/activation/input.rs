use super::state::{ActivationRequest, HeldToken};
use crate::ids::{AbilityId, Tick};

/// Everything the owning peer decided for one tick.
///
/// Inputs are produced once, buffered by the predicting peer, forwarded to the
/// authority, and replayed verbatim after a reconciliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivationInput {
    pub tick: Tick,
    pub request: Option<ActivationRequest>,
    /// Token held down during this tick, if any.
    pub held: Option<HeldToken>,
    pub interrupt: bool,
}

impl ActivationInput {
    pub fn idle(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }
}

/// Collects local requests between ticks and turns them into an input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputLatch {
    request: Option<ActivationRequest>,
    held: Option<HeldToken>,
    interrupt: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an activation. Refused while another request or an interrupt is pending.
    pub fn request(&mut self, ability: AbilityId, held: Option<HeldToken>) -> bool {
        if self.interrupt || self.request.is_some() {
            return false;
        }
        self.request = Some(ActivationRequest { ability, held });
        if held.is_some() {
            self.held = held;
        }
        true
    }

    /// Stops reporting the held token.
    pub fn release(&mut self) {
        self.held = None;
    }

    pub fn hold(&mut self, token: HeldToken) {
        self.held = Some(token);
    }

    pub fn interrupt(&mut self) {
        self.interrupt = true;
        self.request = None;
    }

    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt
    }

    /// Produces the input for `tick`. The held token persists until released.
    pub fn take(&mut self, tick: Tick) -> ActivationInput {
        let input = ActivationInput {
            tick,
            request: self.request.take(),
            held: self.held,
            interrupt: self.interrupt,
        };
        self.interrupt = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_token_survives_until_release() {
        let mut latch = InputLatch::new();
        assert!(latch.request(AbilityId(1), Some(HeldToken(4))));
        let first = latch.take(Tick(1));
        assert_eq!(first.request.map(|r| r.ability), Some(AbilityId(1)));
        assert_eq!(first.held, Some(HeldToken(4)));

        let second = latch.take(Tick(2));
        assert_eq!(second.request, None);
        assert_eq!(second.held, Some(HeldToken(4)));

        latch.release();
        assert_eq!(latch.take(Tick(3)).held, None);
    }

    #[test]
    fn interrupt_blocks_new_requests_until_taken() {
        let mut latch = InputLatch::new();
        latch.interrupt();
        assert!(!latch.request(AbilityId(1), None));
        assert!(latch.take(Tick(1)).interrupt);
        assert!(latch.request(AbilityId(1), None));
        assert!(!latch.request(AbilityId(2), None));
    }
}
