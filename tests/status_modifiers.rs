//! Cost reduction and gating derived from a caster's statuses.

use arena_client::game::{
    status::{effective_cost, is_action_blocked, is_locked, is_stunned_for},
    types::{CostVector, ReductionMode, Skill, StatusEffect, StatusKind},
};

fn skill(id: u32, class: Option<&str>, cost: CostVector) -> Skill {
    Skill {
        id,
        name: format!("skill-{id}"),
        description: String::new(),
        cost,
        cooldown: 0,
        skill_class: class.map(str::to_owned),
        is_locked_by_default: false,
        icon_url: None,
    }
}

#[test]
fn no_reduction_keeps_base_cost() {
    let s = skill(1, None, CostVector::from([("Power", 2), ("Random", 1)]));
    assert_eq!(effective_cost(&s, &[]), s.cost);
}

#[test]
fn half_off_rounds_down() {
    let s = skill(1, None, CostVector::from([("Power", 2)]));
    let statuses = [StatusEffect::cost_reduction(ReductionMode::Percentage, 50.0, 2)];
    assert_eq!(effective_cost(&s, &statuses), CostVector::from([("Power", 1)]));

    let s = skill(1, None, CostVector::from([("Power", 3)]));
    assert_eq!(effective_cost(&s, &statuses), CostVector::from([("Power", 1)]));
}

#[test]
fn full_percentage_makes_skill_free() {
    let s = skill(1, None, CostVector::from([("Power", 2), ("Random", 1)]));
    let statuses = [StatusEffect::cost_reduction(ReductionMode::Percentage, 100.0, 1)];
    assert_eq!(
        effective_cost(&s, &statuses),
        CostVector::from([("Power", 0), ("Random", 0)])
    );
}

#[test]
fn flat_reduction_never_goes_negative() {
    let s = skill(1, None, CostVector::from([("Power", 1), ("Blood", 3)]));
    let statuses = [StatusEffect::cost_reduction(ReductionMode::Flat, 2.0, 1)];
    assert_eq!(
        effective_cost(&s, &statuses),
        CostVector::from([("Power", 0), ("Blood", 1)])
    );
}

#[test]
fn only_first_reduction_counts() {
    let s = skill(1, None, CostVector::from([("Power", 4)]));
    let statuses = [
        StatusEffect::cost_reduction(ReductionMode::Flat, 1.0, 1),
        StatusEffect::cost_reduction(ReductionMode::Percentage, 100.0, 1),
    ];
    assert_eq!(effective_cost(&s, &statuses), CostVector::from([("Power", 3)]));
}

#[test]
fn reduction_without_mode_is_flat() {
    let s = skill(1, None, CostVector::from([("Mind", 3)]));
    let mut status = StatusEffect::new(StatusKind::CostReduction, 1);
    status.value = Some(1.0);
    assert_eq!(effective_cost(&s, &[status]), CostVector::from([("Mind", 2)]));
}

#[test]
fn stun_blocks_only_listed_classes() {
    let ninjutsu = skill(1, Some("ninjutsu"), CostVector::default());
    let taijutsu = skill(2, Some("taijutsu"), CostVector::default());
    let statuses = [StatusEffect::stun(["ninjutsu"], 1)];

    assert!(is_stunned_for(&ninjutsu, &statuses));
    assert!(!is_stunned_for(&taijutsu, &statuses));
    assert!(is_action_blocked(&ninjutsu, &statuses));
    assert!(!is_action_blocked(&taijutsu, &statuses));
}

#[test]
fn stun_without_classes_blocks_nothing() {
    let s = skill(1, Some("ninjutsu"), CostVector::default());
    let statuses = [StatusEffect::stun(Vec::<String>::new(), 2)];
    assert!(!is_action_blocked(&s, &statuses));
}

#[test]
fn classless_skill_is_never_stunned() {
    let s = skill(1, None, CostVector::default());
    let statuses = [StatusEffect::stun(["ninjutsu", "taijutsu"], 2)];
    assert!(!is_stunned_for(&s, &statuses));
}

#[test]
fn locked_skill_needs_matching_enable() {
    let mut s = skill(7, None, CostVector::default());
    s.is_locked_by_default = true;

    assert!(is_locked(&s, &[]));
    assert!(is_locked(&s, &[StatusEffect::enable_skill(8, 1)]));
    assert!(!is_locked(&s, &[StatusEffect::enable_skill(7, 1)]));
    assert!(!is_action_blocked(&s, &[StatusEffect::enable_skill(7, 1)]));
}

#[test]
fn unknown_status_kind_is_carried_and_ignored() {
    let status: StatusEffect =
        serde_json::from_str(r#"{"status":"burning","duration":2}"#).unwrap();
    assert_eq!(status.status, StatusKind::Other);

    let s = skill(1, Some("ninjutsu"), CostVector::from([("Power", 1)]));
    assert!(!is_action_blocked(&s, std::slice::from_ref(&status)));
    assert_eq!(effective_cost(&s, &[status]), s.cost);
}
