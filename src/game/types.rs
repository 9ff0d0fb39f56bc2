use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Resource type a generic cost component is paid in.
pub const RANDOM: &str = "Random";

/// A player's chakra, keyed by resource type. Counts are never negative.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChakraPool(pub BTreeMap<String, u32>);

impl ChakraPool {
    /// Types absent from the pool count as zero.
    pub fn get(&self, kind: &str) -> u32 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, u32); N]> for ChakraPool {
    fn from(entries: [(K, u32); N]) -> Self {
        ChakraPool(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Required amount per resource type, `"Random"` included.
///
/// Amounts are signed on the wire so malformed (negative) costs can be
/// detected and rejected instead of silently wrapping.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CostVector(pub BTreeMap<String, i32>);

impl CostVector {
    pub fn get(&self, kind: &str) -> i32 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Adds every component of `other` into `self`.
    pub fn accumulate(&mut self, other: &CostVector) {
        for (kind, amount) in other.iter() {
            let slot = self.0.entry(kind.to_owned()).or_insert(0);
            *slot = slot.saturating_add(amount);
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, i32); N]> for CostVector {
    fn from(entries: [(K, i32); N]) -> Self {
        CostVector(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Status kinds the client interprets. Anything else is carried but ignored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Stun,
    CostReduction,
    EmpowerSkill,
    EnableSkill,
    Invulnerable,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    Flat,
    Percentage,
}

/// One active status on a character. Duration is owned by the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusEffect {
    pub status: StatusKind,
    #[serde(default)]
    pub duration: u32,
    #[serde(rename = "casterInstanceId", default, skip_serializing_if = "Option::is_none")]
    pub caster_instance_id: Option<String>,
    /// Skill classes a stun applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(rename = "skillId", default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction_type: Option<ReductionMode>,
}

impl StatusEffect {
    pub fn new(status: StatusKind, duration: u32) -> Self {
        StatusEffect {
            status,
            duration,
            caster_instance_id: None,
            classes: Vec::new(),
            skill_id: None,
            value: None,
            reduction_type: None,
        }
    }

    pub fn stun<S: Into<String>>(classes: impl IntoIterator<Item = S>, duration: u32) -> Self {
        StatusEffect {
            classes: classes.into_iter().map(Into::into).collect(),
            ..StatusEffect::new(StatusKind::Stun, duration)
        }
    }

    pub fn cost_reduction(mode: ReductionMode, value: f64, duration: u32) -> Self {
        StatusEffect {
            value: Some(value),
            reduction_type: Some(mode),
            ..StatusEffect::new(StatusKind::CostReduction, duration)
        }
    }

    pub fn enable_skill(skill_id: u32, duration: u32) -> Self {
        StatusEffect {
            skill_id: Some(skill_id),
            ..StatusEffect::new(StatusKind::EnableSkill, duration)
        }
    }
}

/// JSON object keys are strings, and tagged-enum buffering loses serde_json's
/// numeric key handling, so skill ids are parsed here.
fn skill_id_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<u32, u32>, D::Error> {
    BTreeMap::<String, u32>::deserialize(deserializer)?
        .into_iter()
        .map(|(k, v)| k.parse::<u32>().map(|id| (id, v)).map_err(de::Error::custom))
        .collect()
}

/// Immutable skill definition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Skill {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: CostVector,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_class: Option<String>,
    #[serde(default)]
    pub is_locked_by_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A character as it stands in the current match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u32,
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    pub is_alive: bool,
    /// Signed on the wire; a killing blow may leave it below zero.
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub statuses: Vec<StatusEffect>,
    /// Turns left per skill id.
    #[serde(default, deserialize_with = "skill_id_map")]
    pub cooldowns: BTreeMap<u32, u32>,
}

impl Character {
    pub fn skill(&self, skill_id: u32) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }
}

/// One committed action for the current turn.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionQueueEntry {
    #[serde(alias = "casterId")]
    pub caster_instance_id: String,
    pub skill: Skill,
    pub target_id: String,
}

/// Everything one side of the match owns.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    #[serde(default)]
    pub chakra: ChakraPool,
    #[serde(default)]
    pub team: Vec<Character>,
    #[serde(default)]
    pub action_queue: Vec<ActionQueueEntry>,
    #[serde(default, deserialize_with = "skill_id_map")]
    pub cooldowns: BTreeMap<u32, u32>,
}

impl PlayerView {
    pub fn character(&self, instance_id: &str) -> Option<&Character> {
        self.team.iter().find(|c| c.instance_id == instance_id)
    }

    /// Remaining cooldown for a skill, the larger of the per-player and
    /// per-character counters.
    pub fn cooldown_remaining(&self, caster: &Character, skill_id: u32) -> u32 {
        let own = caster.cooldowns.get(&skill_id).copied().unwrap_or(0);
        let shared = self.cooldowns.get(&skill_id).copied().unwrap_or(0);
        own.max(shared)
    }

    pub fn has_queued(&self, instance_id: &str) -> bool {
        self.action_queue
            .iter()
            .any(|e| e.caster_instance_id == instance_id)
    }

    pub fn any_alive(&self) -> bool {
        self.team.iter().any(|c| c.is_alive)
    }
}
