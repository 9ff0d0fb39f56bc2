//! Interprets a caster's statuses into cost deltas and gating flags.
//!
//! Every status present in a snapshot is treated as active; durations are
//! only ever advanced by the server.

use crate::game::types::{CostVector, ReductionMode, Skill, StatusEffect, StatusKind};

/// The skill's cost after the caster's cost reduction, if any.
///
/// Only the first `cost_reduction` status found counts, even when several
/// are present.
pub fn effective_cost(skill: &Skill, statuses: &[StatusEffect]) -> CostVector {
    let Some(reduction) = first_of(statuses, StatusKind::CostReduction) else {
        return skill.cost.clone();
    };
    let value = reduction.value.unwrap_or(0.0);
    let mode = reduction.reduction_type.unwrap_or(ReductionMode::Flat);

    let reduced = skill
        .cost
        .iter()
        .map(|(kind, base)| (kind.to_owned(), reduce(base, mode, value)))
        .collect();
    CostVector(reduced)
}

fn reduce(base: i32, mode: ReductionMode, value: f64) -> i32 {
    // negative bases are left alone so the ledger can reject them
    if base < 0 {
        return base;
    }
    let base = f64::from(base);
    let reduced = match mode {
        ReductionMode::Flat => base - value,
        ReductionMode::Percentage => base * (1.0 - value / 100.0),
    };
    reduced.floor().max(0.0) as i32
}

/// True if the caster cannot use `skill` right now.
pub fn is_action_blocked(skill: &Skill, statuses: &[StatusEffect]) -> bool {
    is_stunned_for(skill, statuses) || is_locked(skill, statuses)
}

/// A stun only covers the skill classes it lists.
pub fn is_stunned_for(skill: &Skill, statuses: &[StatusEffect]) -> bool {
    let Some(class) = skill.skill_class.as_deref() else {
        return false;
    };
    statuses
        .iter()
        .filter(|s| s.status == StatusKind::Stun)
        .any(|s| s.classes.iter().any(|c| c == class))
}

/// Locked-by-default skills need an `enable_skill` status naming them.
pub fn is_locked(skill: &Skill, statuses: &[StatusEffect]) -> bool {
    skill.is_locked_by_default
        && !statuses
            .iter()
            .any(|s| s.status == StatusKind::EnableSkill && s.skill_id == Some(skill.id))
}

fn first_of(statuses: &[StatusEffect], kind: StatusKind) -> Option<&StatusEffect> {
    statuses.iter().find(|s| s.status == kind)
}
