use ability_core::{CharacterId, ContainerId, MemberId};

use super::{HandlerCriticality, HandlerError, TickContext, TickHandler};

/// Turns effect objects touching a living character into hits.
///
/// Each object strikes the lowest-id character in reach other than its
/// caster. Objects keep striking on later ticks until their hit count is spent.
pub struct CollisionHandler;

impl TickHandler for CollisionHandler {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn criticality(&self) -> HandlerCriticality {
        HandlerCriticality::Optional
    }

    fn handle(&self, cx: &mut TickContext<'_>) -> Result<(), HandlerError> {
        let radius = cx.config.hit_radius;
        let mut contacts: Vec<(CharacterId, ContainerId, MemberId, CharacterId)> = Vec::new();

        for caster in cx.arena.iter() {
            for (container_id, container) in caster.sim().effects().containers() {
                for object in container.members() {
                    let struck = cx
                        .arena
                        .within(object.position, radius)
                        .into_iter()
                        .find(|&id| id != caster.id());
                    if let Some(target) = struck {
                        contacts.push((caster.id(), container_id, object.member, target));
                    }
                }
            }
        }

        for (caster, container, member, target) in contacts {
            if let Some(participant) = cx.arena.get_mut(caster) {
                let output = participant
                    .sim_mut()
                    .effects_mut()
                    .hit(container, member, Some(target));
                cx.output.extend(output);
            }
        }
        Ok(())
    }
}
