//! Characters hosted by the authority and the world facts they share.

use std::collections::BTreeMap;

use ability_core::{
    ActivationInput, ActivationObserver, CharacterId, CharacterSim, FixedTargets, Pose,
    StaticCharacterState, TargetInfo, Tick, TickEnv, TickMode, TickReport, Vec2,
};

use crate::api::{Result, RuntimeError};

/// One hosted character plus the world state the authority tracks for it.
pub struct Participant {
    sim: CharacterSim,
    pub state: StaticCharacterState,
    pub pose: Pose,
    pub target: Option<CharacterId>,
    inputs: BTreeMap<Tick, ActivationInput>,
}

impl Participant {
    pub fn new(sim: CharacterSim, pose: Pose) -> Self {
        Self {
            sim,
            state: StaticCharacterState::default(),
            pose,
            target: None,
            inputs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.sim.id()
    }

    pub fn sim(&self) -> &CharacterSim {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut CharacterSim {
        &mut self.sim
    }

    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Queues an input forwarded by the owning peer.
    ///
    /// Returns false when `input.tick` has already been simulated.
    pub fn queue_input(&mut self, input: ActivationInput, simulated: Tick) -> bool {
        if input.tick <= simulated {
            return false;
        }
        self.inputs.insert(input.tick, input);
        true
    }

    /// Input for `tick`: the forwarded one if present, otherwise whatever the
    /// local latch holds. Forwarded inputs older than `tick` are discarded.
    fn take_input(&mut self, tick: Tick) -> ActivationInput {
        self.inputs = self.inputs.split_off(&tick);
        match self.inputs.remove(&tick) {
            Some(input) => input,
            None => self.sim.next_input(tick),
        }
    }

    pub fn step(
        &mut self,
        tick: Tick,
        targets: &FixedTargets,
        observer: &mut dyn ActivationObserver,
    ) -> TickReport {
        let input = self.take_input(tick);
        let mut env = TickEnv {
            character: &self.state,
            targets,
            observer,
        };
        self.sim.tick(&input, TickMode::Fresh, &mut env)
    }
}

/// Every character hosted by one authority, iterated in id order.
pub struct Arena {
    participants: BTreeMap<CharacterId, Participant>,
    limit: usize,
}

impl Arena {
    pub fn new(limit: usize) -> Self {
        Self {
            participants: BTreeMap::new(),
            limit,
        }
    }

    pub fn insert(&mut self, participant: Participant) -> Result<()> {
        let id = participant.id();
        if self.participants.contains_key(&id) {
            return Err(RuntimeError::DuplicateCharacter(id));
        }
        if self.participants.len() >= self.limit {
            return Err(RuntimeError::ArenaFull { limit: self.limit });
        }
        self.participants.insert(id, participant);
        Ok(())
    }

    pub fn remove(&mut self, id: CharacterId) -> Option<Participant> {
        let removed = self.participants.remove(&id);
        if removed.is_some() {
            for participant in self.participants.values_mut() {
                if participant.target == Some(id) {
                    participant.target = None;
                }
            }
        }
        removed
    }

    pub fn get(&self, id: CharacterId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    pub fn require_mut(&mut self, id: CharacterId) -> Result<&mut Participant> {
        self.participants
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownCharacter(id))
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.participants.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn ids(&self) -> Vec<CharacterId> {
        self.participants.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    /// Resolver for `id`: its pose, aimed at its target while that target is alive.
    pub fn targets_for(&self, id: CharacterId) -> FixedTargets {
        let Some(participant) = self.participants.get(&id) else {
            return FixedTargets::default();
        };
        let targets = FixedTargets::new(participant.pose);
        match participant.target.and_then(|target| self.participants.get(&target)) {
            Some(target) if target.is_alive() => targets.with_target(TargetInfo {
                character: target.id(),
                position: target.pose.position,
            }),
            _ => targets,
        }
    }

    /// Living characters whose position lies within `radius` of `center`.
    pub fn within(&self, center: Vec2, radius: f32) -> Vec<CharacterId> {
        self.participants
            .values()
            .filter(|participant| participant.is_alive())
            .filter(|participant| participant.pose.position.distance(center) <= radius)
            .map(Participant::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use ability_core::{ContentRegistry, SimConfig};

    fn participant(id: u32, x: f32) -> Participant {
        let registry = Arc::new(ContentRegistry::new(vec![], vec![], vec![]).unwrap());
        let sim = CharacterSim::new(CharacterId(id), registry, SimConfig::default(), 7);
        Participant::new(sim, Pose::new(Vec2::new(x, 0.0), 0.0))
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut arena = Arena::new(2);
        arena.insert(participant(1, 0.0)).unwrap();
        assert!(matches!(
            arena.insert(participant(1, 0.0)),
            Err(RuntimeError::DuplicateCharacter(_))
        ));
        arena.insert(participant(2, 0.0)).unwrap();
        assert!(matches!(
            arena.insert(participant(3, 0.0)),
            Err(RuntimeError::ArenaFull { limit: 2 })
        ));
    }

    #[test]
    fn dead_targets_are_not_resolved() {
        let mut arena = Arena::new(4);
        arena.insert(participant(1, 0.0)).unwrap();
        arena.insert(participant(2, 5.0)).unwrap();
        arena.get_mut(CharacterId(1)).unwrap().target = Some(CharacterId(2));

        let aimed = arena.targets_for(CharacterId(1));
        assert_eq!(aimed.target.map(|t| t.character), Some(CharacterId(2)));

        arena.get_mut(CharacterId(2)).unwrap().state.alive = false;
        assert_eq!(arena.targets_for(CharacterId(1)).target, None);
        assert!(arena.within(Vec2::new(5.0, 0.0), 1.0).is_empty());
    }

    #[test]
    fn removal_clears_stale_targets() {
        let mut arena = Arena::new(4);
        arena.insert(participant(1, 0.0)).unwrap();
        arena.insert(participant(2, 5.0)).unwrap();
        arena.get_mut(CharacterId(1)).unwrap().target = Some(CharacterId(2));
        arena.remove(CharacterId(2));
        assert_eq!(arena.get(CharacterId(1)).unwrap().target, None);
    }

    #[test]
    fn forwarded_inputs_win_over_the_latch() {
        let mut p = participant(1, 0.0);
        let queued = ActivationInput {
            interrupt: true,
            ..ActivationInput::idle(Tick(3))
        };
        assert!(p.queue_input(queued, Tick(2)));
        assert!(!p.queue_input(ActivationInput::idle(Tick(2)), Tick(2)));
        assert!(p.queue_input(ActivationInput::idle(Tick(1)), Tick(0)));

        assert_eq!(p.take_input(Tick(3)), queued);
        assert_eq!(p.pending_inputs(), 0);
        assert_eq!(p.take_input(Tick(4)), ActivationInput::idle(Tick(4)));
    }
}
