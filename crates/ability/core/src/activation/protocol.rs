//! Tick-driven activation state machine.
//!
//! Each tick is evaluated in a fixed order:
//!
//! 1. A pending interrupt cancels whatever is active or queued and ends the tick.
//! 2. Idle with a queued request: validate and enter Activating, or discard.
//! 3. Activating: count down. Abilities activated with a held token end on
//!    release; channeled ones spawn and pay every tick while held. Without a
//!    token they run as a plain cast.
//! 4. Countdown finished: charged abilities wait for release, everything else
//!    revalidates, checks its target, spawns, pays, starts its cooldown, and
//!    returns to Idle.
//!
//! The same code runs on the authority and on predicting peers. In
//! [`TickMode::Replay`] costs, cooldowns, seed draws and spawn requests are
//! still produced so replays converge; only observers are silent.

use super::collaborators::{CharacterState, CooldownService, TargetResolver};
use super::input::ActivationInput;
use super::observer::ActivationObserver;
use super::seed::SeedSequence;
use super::state::{ActivationPhase, ActivationRequest, ActivationState, HeldToken};
use crate::ability::{Ability, AbilityKind};
use crate::attribute::AttributeGraph;
use crate::catalog::AbilityCatalog;
use crate::error::{ErrorSeverity, SimError};
use crate::ids::AbilityId;

/// Why an activation could not start or continue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rejection {
    #[error("ability {0} is not known")]
    UnknownAbility(AbilityId),

    #[error("caster is dead")]
    Dead,

    #[error("ability on cooldown for {remaining_ms}ms")]
    OnCooldown { remaining_ms: i32 },

    #[error("{kind} ability used in the wrong stance")]
    WrongStance { kind: AbilityKind },

    #[error("a pet is already summoned")]
    PetAlreadySummoned,

    #[error("requirements not met")]
    RequirementsNotMet,

    #[error("insufficient resources")]
    InsufficientResources,

    #[error("no target")]
    NoTarget,
}

impl SimError for Rejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OnCooldown { .. } | Self::InsufficientResources | Self::NoTarget => {
                ErrorSeverity::Recoverable
            }
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAbility(_) => "ACTIVATION_UNKNOWN_ABILITY",
            Self::Dead => "ACTIVATION_DEAD",
            Self::OnCooldown { .. } => "ACTIVATION_ON_COOLDOWN",
            Self::WrongStance { .. } => "ACTIVATION_WRONG_STANCE",
            Self::PetAlreadySummoned => "ACTIVATION_PET_ALREADY_SUMMONED",
            Self::RequirementsNotMet => "ACTIVATION_REQUIREMENTS_NOT_MET",
            Self::InsufficientResources => "ACTIVATION_INSUFFICIENT_RESOURCES",
            Self::NoTarget => "ACTIVATION_NO_TARGET",
        }
    }
}

/// Whether a tick is produced for the first time or recomputed after a reconcile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickMode {
    Fresh,
    Replay,
}

impl TickMode {
    pub const fn is_fresh(self) -> bool {
        matches!(self, TickMode::Fresh)
    }
}

/// What the protocol did during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivationStep {
    #[default]
    Idle,
    Interrupted {
        ability: Option<AbilityId>,
    },
    Rejected {
        ability: AbilityId,
        reason: Rejection,
    },
    Started {
        ability: AbilityId,
        remaining_ms: i32,
    },
    Progress {
        ability: AbilityId,
        remaining_ms: i32,
    },
    Channeled {
        ability: AbilityId,
        remaining_ms: i32,
    },
    /// Held input released before the activation finished.
    Released {
        ability: AbilityId,
    },
    /// Channel stopped because a per-tick check failed.
    ChannelEnded {
        ability: AbilityId,
        reason: Rejection,
    },
    /// Charged ability finished charging and is waiting for release.
    AwaitingRelease {
        ability: AbilityId,
    },
    Completed {
        ability: AbilityId,
    },
    /// Final revalidation failed; nothing was spawned or paid.
    Failed {
        ability: AbilityId,
        reason: Rejection,
    },
    /// Active ability disappeared from the catalog.
    Dropped {
        ability: AbilityId,
    },
}

/// Effect spawn the host should perform with `seed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub ability: AbilityId,
    pub seed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub step: ActivationStep,
    /// Produced in both modes; the host decides what a replayed spawn re-applies.
    pub spawns: Vec<SpawnRequest>,
}

/// Borrowed collaborators for one tick.
pub struct ActivationContext<'a> {
    pub catalog: &'a AbilityCatalog,
    pub attributes: &'a mut AttributeGraph,
    pub cooldowns: &'a mut dyn CooldownService,
    pub character: &'a dyn CharacterState,
    pub targets: &'a dyn TargetResolver,
    pub seeds: &'a mut SeedSequence,
    pub observer: &'a mut dyn ActivationObserver,
    pub mode: TickMode,
    pub delta_ms: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationProtocol {
    state: ActivationState,
}

impl ActivationProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    pub fn phase(&self) -> ActivationPhase {
        self.state.phase()
    }

    /// Overwrites local state from an authoritative snapshot.
    pub fn restore(
        &mut self,
        current: Option<AbilityId>,
        remaining_ms: i32,
        total_ms: i32,
        held: Option<HeldToken>,
    ) {
        self.state = ActivationState {
            current,
            remaining_ms: if current.is_some() { remaining_ms } else { 0 },
            total_ms,
            queued: None,
            held,
            interrupt_pending: false,
        };
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn tick(&mut self, input: &ActivationInput, cx: &mut ActivationContext<'_>) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if input.interrupt {
            self.state.interrupt_pending = true;
        }
        if self.state.interrupt_pending {
            self.apply_interrupt(cx, &mut outcome);
            return outcome;
        }

        if let Some(request) = input.request {
            if self.state.is_busy() {
                tracing::debug!(
                    target: "ability::activation",
                    ability = %request.ability,
                    "request ignored while busy"
                );
            } else {
                self.state.queued = Some(request);
            }
        }

        match self.state.current {
            None => {
                if let Some(request) = self.state.queued.take() {
                    outcome.step = self.accept(request, cx);
                }
            }
            Some(current) => self.advance(current, input, cx, &mut outcome),
        }
        outcome
    }

    fn apply_interrupt(&mut self, cx: &mut ActivationContext<'_>, outcome: &mut TickOutcome) {
        let interrupted = self
            .state
            .current
            .or(self.state.queued.map(|request| request.ability));
        let busy = self.state.is_busy();
        self.state.reset();
        if !busy {
            return;
        }
        tracing::debug!(target: "ability::activation", ability = ?interrupted, "interrupted");
        if cx.mode.is_fresh() {
            cx.observer.on_interrupt(interrupted);
        }
        outcome.step = ActivationStep::Interrupted {
            ability: interrupted,
        };
    }

    fn accept(&mut self, request: ActivationRequest, cx: &mut ActivationContext<'_>) -> ActivationStep {
        let catalog = cx.catalog;
        match validate(catalog, request.ability, cx) {
            Ok(ability) => {
                let remaining = ability.scaled_activation_time(cx.attributes);
                self.state.current = Some(ability.id());
                self.state.remaining_ms = remaining;
                self.state.total_ms = remaining;
                self.state.held = if ability.tracks_hold() { request.held } else { None };
                ActivationStep::Started {
                    ability: ability.id(),
                    remaining_ms: remaining,
                }
            }
            Err(reason) => {
                tracing::debug!(
                    target: "ability::activation",
                    ability = %request.ability,
                    %reason,
                    "activation rejected"
                );
                ActivationStep::Rejected {
                    ability: request.ability,
                    reason,
                }
            }
        }
    }

    fn advance(
        &mut self,
        current: AbilityId,
        input: &ActivationInput,
        cx: &mut ActivationContext<'_>,
        outcome: &mut TickOutcome,
    ) {
        let catalog = cx.catalog;
        let Some(ability) = catalog.get(current) else {
            tracing::debug!(
                target: "ability::activation",
                ability = %current,
                "active ability is not in the catalog; dropping"
            );
            self.cancel(current, cx);
            outcome.step = ActivationStep::Dropped { ability: current };
            return;
        };

        self.state.remaining_ms = (self.state.remaining_ms - cx.delta_ms).max(0);
        let remaining = self.state.remaining_ms;
        let holding = ability.tracks_hold() && self.state.held.is_some();
        let still_held = holding && input.held == self.state.held;

        if remaining > 0 {
            if cx.mode.is_fresh() {
                cx.observer
                    .on_progress(current, remaining, self.state.total_ms);
            }

            if holding {
                if !still_held {
                    self.finish_with_cooldown(ability, cx);
                    outcome.step = ActivationStep::Released { ability: current };
                    return;
                }
                if ability.is_channeled() {
                    if let Err(reason) = validate(catalog, current, cx) {
                        tracing::debug!(
                            target: "ability::activation",
                            ability = %current,
                            %reason,
                            "channel ended"
                        );
                        self.finish_with_cooldown(ability, cx);
                        outcome.step = ActivationStep::ChannelEnded {
                            ability: current,
                            reason,
                        };
                        return;
                    }
                    if has_target(ability, cx) {
                        spawn(ability, cx, outcome);
                        pay(ability, cx);
                    }
                    outcome.step = ActivationStep::Channeled {
                        ability: current,
                        remaining_ms: remaining,
                    };
                    return;
                }
            }

            outcome.step = ActivationStep::Progress {
                ability: current,
                remaining_ms: remaining,
            };
            return;
        }

        if ability.is_charged() && still_held {
            outcome.step = ActivationStep::AwaitingRelease { ability: current };
            return;
        }

        let checked = validate(catalog, current, cx).and_then(|ability| {
            if has_target(ability, cx) {
                Ok(ability)
            } else {
                Err(Rejection::NoTarget)
            }
        });
        match checked {
            Ok(_) => {
                spawn(ability, cx, outcome);
                pay(ability, cx);
                self.finish_with_cooldown(ability, cx);
                outcome.step = ActivationStep::Completed { ability: current };
            }
            Err(reason) => {
                tracing::debug!(
                    target: "ability::activation",
                    ability = %current,
                    %reason,
                    "final check failed"
                );
                self.cancel(current, cx);
                outcome.step = ActivationStep::Failed {
                    ability: current,
                    reason,
                };
            }
        }
    }

    fn finish_with_cooldown(&mut self, ability: &Ability, cx: &mut ActivationContext<'_>) {
        let duration = ability.scaled_cooldown(cx.attributes);
        if duration > 0 {
            cx.cooldowns.add_cooldown(ability.id(), duration);
        }
        self.cancel(ability.id(), cx);
    }

    fn cancel(&mut self, ability: AbilityId, cx: &mut ActivationContext<'_>) {
        self.state.reset();
        if cx.mode.is_fresh() {
            cx.observer.on_cancel(ability);
        }
    }
}

/// Draws the next seed; the draw happens on every attempt so peers stay aligned.
fn spawn(ability: &Ability, cx: &mut ActivationContext<'_>, outcome: &mut TickOutcome) {
    let seed = cx.seeds.next_seed();
    outcome.spawns.push(SpawnRequest {
        ability: ability.id(),
        seed,
    });
}

fn pay(ability: &Ability, cx: &mut ActivationContext<'_>) {
    let paid = ability.try_consume_resources(cx.attributes);
    debug_assert!(paid, "resources were validated in the same tick");
}

fn has_target(ability: &Ability, cx: &ActivationContext<'_>) -> bool {
    !ability.needs_target() || cx.targets.resolve_target(ability).is_some()
}

fn validate<'c>(
    catalog: &'c AbilityCatalog,
    id: AbilityId,
    cx: &ActivationContext<'_>,
) -> Result<&'c Ability, Rejection> {
    let ability = catalog.get(id).ok_or(Rejection::UnknownAbility(id))?;
    if !cx.character.is_alive() {
        return Err(Rejection::Dead);
    }
    if cx.cooldowns.is_on_cooldown(id) {
        return Err(Rejection::OnCooldown {
            remaining_ms: cx.cooldowns.remaining(id),
        });
    }
    if let Some(grounded) = ability.kind().required_grounded() {
        if cx.character.is_grounded() != grounded {
            return Err(Rejection::WrongStance {
                kind: ability.kind(),
            });
        }
    }
    if ability.kind().is_summon() && cx.character.has_pet() {
        return Err(Rejection::PetAlreadySummoned);
    }
    if !ability.meets_requirements(&*cx.attributes) {
        return Err(Rejection::RequirementsNotMet);
    }
    if !ability.has_resources(&*cx.attributes) {
        return Err(Rejection::InsufficientResources);
    }
    Ok(ability)
}
