use crate::models::ProviderCapacity;

/// Whether a provider may receive another lead notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityDecision {
    Eligible,
    Paused,
    QuotaExhausted,
}

impl CapacityDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, CapacityDecision::Eligible)
    }
}

/// Read-only capacity check; usage counters are maintained elsewhere
#[inline]
pub fn check_capacity(capacity: &ProviderCapacity) -> CapacityDecision {
    if capacity.notifications_paused {
        return CapacityDecision::Paused;
    }

    match capacity.monthly_quota {
        Some(quota) if capacity.leads_this_month >= quota => CapacityDecision::QuotaExhausted,
        _ => CapacityDecision::Eligible,
    }
}
