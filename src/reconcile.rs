use serde::{Deserialize, Serialize};

use crate::schema::{RoleItem, RoleItemApi};
use crate::table::Id;

// ------------- Decisions -------------
/// What an edit surface decided about one grant. `Unchanged` rows ride along
/// so a client can submit its whole checkbox matrix without diffing it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Grant,
    Revoke,
    Unchanged,
}

/// One row of a role's item matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDecision {
    pub item_id: Id,
    pub decision: Decision,
}

/// One cell of a role's item/api matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDecision {
    pub item_id: Id,
    pub api_id: Id,
    pub decision: Decision,
}

// ------------- Plans -------------
/// The grant rows a batch of decisions resolves to. Deletes are applied
/// before inserts, so a batch that both revokes and grants the same pair
/// lands granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<T> {
    pub deletes: Vec<T>,
    pub inserts: Vec<T>,
}

pub fn plan_role_items(role_id: Id, decisions: &[ItemDecision]) -> Plan<RoleItem> {
    let mut plan = Plan {
        deletes: Vec::new(),
        inserts: Vec::new(),
    };
    for choice in decisions {
        let row = RoleItem {
            role_id,
            item_id: choice.item_id,
        };
        match choice.decision {
            Decision::Grant => plan.inserts.push(row),
            Decision::Revoke => plan.deletes.push(row),
            Decision::Unchanged => (),
        }
    }
    plan
}

pub fn plan_role_item_apis(role_id: Id, decisions: &[ApiDecision]) -> Plan<RoleItemApi> {
    let mut plan = Plan {
        deletes: Vec::new(),
        inserts: Vec::new(),
    };
    for choice in decisions {
        let row = RoleItemApi {
            role_id,
            item_id: choice.item_id,
            api_id: choice.api_id,
        };
        match choice.decision {
            Decision::Grant => plan.inserts.push(row),
            Decision::Revoke => plan.deletes.push(row),
            Decision::Unchanged => (),
        }
    }
    plan
}

// ------------- Applied -------------
/// How many grant rows a plan actually changed. Re-granting a pair that is
/// already present and revoking one that is absent are no-ops and do not
/// count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub deleted: usize,
    pub inserted: usize,
}
