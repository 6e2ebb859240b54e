use std::collections::{HashMap, HashSet};

use crate::model::{DesiredResource, ObservedResource, ResourceHandle, ResourceKey};

/// Operations for one cycle, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub creates: Vec<DesiredResource>,
    pub updates: Vec<(ResourceHandle, DesiredResource)>,
    pub deletes: Vec<ObservedResource>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// Compare desired against observed.
///
/// Resources are grouped by key identity, the part of a key a channel name
/// still carries. Several desired resources may share one identity (two
/// libraries with the same label); each is paired with its own observed
/// resource:
///
/// - an observed resource whose content already matches is taken first
/// - remaining desired take the remaining observed in listing order and
///   are updated in place
/// - desired left without a partner: create
/// - observed left without a partner: delete
pub fn diff(desired: &[DesiredResource], observed: &[ObservedResource]) -> Plan {
    let mut pools: HashMap<ResourceKey, Vec<&ObservedResource>> = HashMap::new();
    for resource in observed {
        pools.entry(resource.key.identity()).or_default().push(resource);
    }

    let mut unpaired = Vec::new();
    for want in desired {
        let pool = pools.entry(want.key.identity()).or_default();
        match pool.iter().position(|have| have.content == want.content) {
            Some(at) => {
                pool.remove(at);
            }
            None => unpaired.push(want),
        }
    }

    let mut plan = Plan::default();
    for want in unpaired {
        let pool = pools.entry(want.key.identity()).or_default();
        if pool.is_empty() {
            plan.creates.push(want.clone());
        } else {
            let have = pool.remove(0);
            if have.content != want.content {
                plan.updates.push((have.handle, want.clone()));
            }
        }
    }

    let leftover: HashSet<ResourceHandle> = pools
        .values()
        .flatten()
        .map(|resource| resource.handle)
        .collect();
    plan.deletes = observed
        .iter()
        .filter(|resource| leftover.contains(&resource.handle))
        .cloned()
        .collect();

    plan
}
