use ability_core::HitIntent;

use super::{HandlerError, TickContext, TickHandler};
use crate::events::PresentationEvent;

/// Applies pending hits to their targets.
pub struct HitRouter;

impl TickHandler for HitRouter {
    fn name(&self) -> &'static str {
        "hit_router"
    }

    fn handle(&self, cx: &mut TickContext<'_>) -> Result<(), HandlerError> {
        let hits = std::mem::take(&mut cx.output.hits);
        let mut first_error = None;
        for hit in hits {
            if let Err(error) = apply(cx, hit) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Resolves pending area bursts against every living character in range but
/// the caster.
pub struct AreaRouter;

impl TickHandler for AreaRouter {
    fn name(&self) -> &'static str {
        "area_router"
    }

    fn handle(&self, cx: &mut TickContext<'_>) -> Result<(), HandlerError> {
        let areas = std::mem::take(&mut cx.output.areas);
        let mut first_error = None;
        for area in areas {
            let struck = cx.arena.within(area.center, area.radius.max(0) as f32);
            for target in struck.into_iter().filter(|&id| id != area.source) {
                let hit = HitIntent {
                    source: area.source,
                    ability: area.ability,
                    target,
                    attribute: area.attribute,
                    delta: area.delta,
                };
                if let Err(error) = apply(cx, hit) {
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn apply(cx: &mut TickContext<'_>, hit: HitIntent) -> Result<(), HandlerError> {
    let participant = cx
        .arena
        .get_mut(hit.target)
        .ok_or(HandlerError::UnknownTarget(hit.target))?;
    if !participant.is_alive() {
        return Ok(());
    }
    if !participant.sim_mut().apply_hit(&hit) {
        return Err(HandlerError::MissingAttribute {
            target: hit.target,
            attribute: hit.attribute,
        });
    }
    tracing::debug!(
        target: "runtime::handlers",
        source = %hit.source,
        target_character = %hit.target,
        attribute = %hit.attribute,
        delta = hit.delta,
        "hit applied"
    );
    cx.events.push(PresentationEvent::Hit { tick: cx.tick, hit });
    Ok(())
}
