//! Local, advisory check of whether an action may join the turn's queue.
//!
//! The server re-validates everything and answers with `ACTION_ERROR` when
//! this check was too optimistic (typically a stale snapshot).

use crate::{
    error::QueueRejection,
    game::{
        chakra,
        status::{effective_cost, is_locked, is_stunned_for},
        types::{ActionQueueEntry, Character, CostVector, PlayerView, Skill},
    },
};

/// Full check with the reason for a refusal.
pub fn check_queue(
    proposed: &ActionQueueEntry,
    current_queue: &[ActionQueueEntry],
    view: &PlayerView,
) -> Result<(), QueueRejection> {
    let caster = view
        .character(&proposed.caster_instance_id)
        .ok_or_else(|| QueueRejection::UnknownCaster(proposed.caster_instance_id.clone()))?;

    if !caster.is_alive {
        return Err(QueueRejection::CasterDefeated(caster.instance_id.clone()));
    }
    if is_stunned_for(&proposed.skill, &caster.statuses) {
        return Err(QueueRejection::Stunned);
    }
    if is_locked(&proposed.skill, &caster.statuses) {
        return Err(QueueRejection::Locked(proposed.skill.id));
    }
    let remaining = view.cooldown_remaining(caster, proposed.skill.id);
    if remaining > 0 {
        return Err(QueueRejection::OnCooldown { remaining });
    }
    if current_queue
        .iter()
        .any(|e| e.caster_instance_id == caster.instance_id)
    {
        return Err(QueueRejection::CasterAlreadyQueued(caster.instance_id.clone()));
    }

    let total = queued_cost(current_queue, view)?;
    let mut with_proposed = total;
    with_proposed.accumulate(&checked_cost(&proposed.skill, caster)?);

    if chakra::can_cover(&view.chakra, &with_proposed)? {
        Ok(())
    } else {
        Err(QueueRejection::Unaffordable)
    }
}

/// `check_queue` reduced to a yes/no.
pub fn can_queue(
    proposed: &ActionQueueEntry,
    current_queue: &[ActionQueueEntry],
    view: &PlayerView,
) -> bool {
    match check_queue(proposed, current_queue, view) {
        Ok(()) => true,
        Err(reason) => {
            log::debug!(
                "cannot queue skill {} for {}: {reason}",
                proposed.skill.id,
                proposed.caster_instance_id
            );
            false
        }
    }
}

/// Summed effective cost of everything already queued, each entry reduced
/// by its own caster's statuses.
pub fn queued_cost(
    queue: &[ActionQueueEntry],
    view: &PlayerView,
) -> Result<CostVector, QueueRejection> {
    let mut total = CostVector::default();
    for entry in queue {
        let cost = match view.character(&entry.caster_instance_id) {
            Some(caster) => checked_cost(&entry.skill, caster)?,
            None => {
                chakra::validate(&entry.skill.cost)?;
                effective_cost(&entry.skill, &[])
            }
        };
        total.accumulate(&cost);
    }
    Ok(total)
}

fn checked_cost(skill: &Skill, caster: &Character) -> Result<CostVector, QueueRejection> {
    chakra::validate(&skill.cost)?;
    Ok(effective_cost(skill, &caster.statuses))
}

/// What a skill button should show, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Defeated,
    Stunned,
    Locked,
    OnCooldown(u32),
    Queued,
    Unaffordable,
    Available,
}

impl Affordance {
    pub fn is_enabled(self) -> bool {
        self == Affordance::Available
    }
}

/// Button state for one of `caster`'s skills given the player's own queue.
pub fn affordance(view: &PlayerView, caster: &Character, skill: &Skill) -> Affordance {
    if !caster.is_alive {
        return Affordance::Defeated;
    }
    if is_stunned_for(skill, &caster.statuses) {
        return Affordance::Stunned;
    }
    if is_locked(skill, &caster.statuses) {
        return Affordance::Locked;
    }
    let remaining = view.cooldown_remaining(caster, skill.id);
    if remaining > 0 {
        return Affordance::OnCooldown(remaining);
    }
    if view.has_queued(&caster.instance_id) {
        return Affordance::Queued;
    }

    let affordable = queued_cost(&view.action_queue, view)
        .and_then(|mut total| {
            total.accumulate(&checked_cost(skill, caster)?);
            Ok(chakra::can_cover(&view.chakra, &total)?)
        })
        .unwrap_or(false);
    if affordable {
        Affordance::Available
    } else {
        Affordance::Unaffordable
    }
}
