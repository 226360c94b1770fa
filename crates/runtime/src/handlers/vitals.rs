use super::{HandlerCriticality, HandlerError, TickContext, TickHandler};
use crate::events::PresentationEvent;

/// Marks characters dead once the configured vital resource is depleted.
pub struct VitalsHandler;

impl TickHandler for VitalsHandler {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn criticality(&self) -> HandlerCriticality {
        HandlerCriticality::Optional
    }

    fn handle(&self, cx: &mut TickContext<'_>) -> Result<(), HandlerError> {
        let Some(vital) = cx.config.vital_attribute else {
            return Ok(());
        };
        for participant in cx.arena.iter_mut() {
            if !participant.is_alive() {
                continue;
            }
            let depleted = participant
                .sim()
                .attributes()
                .current(vital)
                .is_some_and(|current| current <= 0.0);
            if depleted {
                participant.state.alive = false;
                tracing::info!(
                    target: "runtime::handlers",
                    character = %participant.id(),
                    tick = %cx.tick,
                    "character died"
                );
                cx.events.push(PresentationEvent::Died {
                    character: participant.id(),
                    tick: cx.tick,
                });
            }
        }
        Ok(())
    }
}
