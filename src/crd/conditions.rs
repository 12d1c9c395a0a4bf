//! Status conditions reported on every managed resource
//!
//! Conditions are kept in a map keyed by [`ConditionType`], so a resource
//! never carries two records of the same kind. On the wire they stay a
//! plain list, which is what `kubectl wait --for=condition` expects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorClass};

/// Kinds of condition the controller maintains
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// The desired state cannot be reconciled until it changes
    Terminal,
    /// The last pass failed and will be retried
    Recoverable,
    /// The AWS entity matches the desired state
    Synced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

/// Status condition
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,

    pub status: ConditionStatus,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// At most one [`Condition`] per [`ConditionType`]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "Vec<Condition>", into = "Vec<Condition>")]
pub struct Conditions(BTreeMap<ConditionType, Condition>);

impl From<Vec<Condition>> for Conditions {
    fn from(list: Vec<Condition>) -> Self {
        Self(list.into_iter().map(|c| (c.type_, c)).collect())
    }
}

impl From<Conditions> for Vec<Condition> {
    fn from(conditions: Conditions) -> Self {
        conditions.0.into_values().collect()
    }
}

impl Conditions {
    pub fn get(&self, type_: ConditionType) -> Option<&Condition> {
        self.0.get(&type_)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the condition exists with status `True`
    pub fn is_true(&self, type_: ConditionType) -> bool {
        self.get(type_)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Set a condition, keeping the transition time when the status is unchanged
    pub fn set(
        &mut self,
        type_: ConditionType,
        status: ConditionStatus,
        reason: Option<String>,
        message: Option<String>,
    ) {
        let now = Utc::now();
        let last_transition_time = match self.0.get(&type_) {
            Some(existing) if existing.status == status => existing.last_transition_time,
            _ => now,
        };
        self.0.insert(
            type_,
            Condition {
                type_,
                status,
                last_transition_time,
                reason,
                message,
            },
        );
    }

    /// Flip an existing condition to `False`; absent conditions stay absent
    fn clear(&mut self, type_: ConditionType) {
        if self.0.contains_key(&type_) {
            self.set(type_, ConditionStatus::False, None, None);
        }
    }

    /// Record the outcome of a reconciliation pass
    ///
    /// A terminal error raises Terminal. Any other error clears Terminal and
    /// raises Recoverable. Success clears both.
    pub fn record_outcome(&mut self, err: Option<&Error>) {
        match err {
            Some(e) if e.class() == ErrorClass::Terminal => {
                self.set(
                    ConditionType::Terminal,
                    ConditionStatus::True,
                    Some("TerminalError".to_string()),
                    Some(e.to_string()),
                );
            }
            Some(e) => {
                self.clear(ConditionType::Terminal);
                self.set(
                    ConditionType::Recoverable,
                    ConditionStatus::True,
                    Some("RecoverableError".to_string()),
                    Some(e.to_string()),
                );
            }
            None => {
                self.clear(ConditionType::Terminal);
                self.clear(ConditionType::Recoverable);
            }
        }
    }

    pub fn set_synced(&mut self, synced: bool, message: Option<String>) {
        let reason = if synced { "Synced" } else { "Pending" };
        self.set(
            ConditionType::Synced,
            synced.into(),
            Some(reason.to_string()),
            message,
        );
    }
}
