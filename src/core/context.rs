use crate::core::ledger::VoteLedger;
use crate::domain::model::{PartyId, PartyMeta, SeatAllocation};
use crate::utils::error::StateViolation;
use std::collections::BTreeMap;

/// Session-scoped, read-only lookups shared by every recomputation cycle.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub ledger: VoteLedger,
    pub seats: Vec<SeatAllocation>,
    pub parties: BTreeMap<PartyId, PartyMeta>,
}

impl SessionContext {
    pub fn new(
        ledger: VoteLedger,
        seats: Vec<SeatAllocation>,
        parties: BTreeMap<PartyId, PartyMeta>,
    ) -> Self {
        let context = Self {
            ledger,
            seats,
            parties,
        };
        for violation in context.seat_regions_without_votes() {
            tracing::warn!("⚠️  {}; its seats will stay unassigned", violation);
        }
        context
    }

    pub fn party_meta(&self, party: &PartyId) -> Option<&PartyMeta> {
        self.parties.get(party)
    }

    pub fn party_label(&self, party: &PartyId) -> Option<&str> {
        self.party_meta(party).and_then(|meta| meta.short.as_deref())
    }

    pub fn total_seats(&self) -> u32 {
        self.seats.iter().map(|allocation| allocation.seats).sum()
    }

    pub fn seat_regions_without_votes(&self) -> Vec<StateViolation> {
        self.seats
            .iter()
            .filter(|allocation| !self.ledger.has_region(&allocation.region))
            .map(|allocation| StateViolation::RegionWithoutVotes {
                region: allocation.region.clone(),
            })
            .collect()
    }
}
