//! D'Hondt highest-averages apportionment.
//!
//! Every region is apportioned on its own: alliance tallies for the region
//! are divided by `1..=seats`, all quotients are ranked, and the top `seats`
//! quotients each award one seat to the alliance that produced them.
//! Generating exactly `seats` quotients per alliance is enough because no
//! alliance can win more seats than the region offers.

use crate::core::ledger::VoteLedger;
use crate::core::registry::AllianceRegistry;
use crate::domain::model::{AllianceId, Region, SeatAllocation};
use crate::domain::policy::TieBreak;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOutcome {
    pub region: Region,
    pub seats: u32,
    pub awarded: BTreeMap<AllianceId, u32>,
    /// Seats nobody won because every alliance polled zero in the region.
    pub unassigned: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Apportionment {
    pub seats_won: BTreeMap<AllianceId, u32>,
    pub regions: Vec<RegionOutcome>,
}

impl Apportionment {
    pub fn seats_for(&self, alliance: &AllianceId) -> u32 {
        self.seats_won.get(alliance).copied().unwrap_or(0)
    }

    pub fn region(&self, region: &Region) -> Option<&RegionOutcome> {
        self.regions.iter().find(|outcome| &outcome.region == region)
    }
}

#[derive(Debug, Clone, Copy)]
struct Quotient {
    value: f64,
    slot: usize,
}

/// Apportion `seats` among `tallies`, returning seats per slot.
///
/// Quotients use real division, so `100000 / 3` ranks below `80000 / 2`
/// exactly as it should. When every tally is zero nothing is awarded.
pub fn allocate(tallies: &[u64], seats: u32, tie_break: TieBreak) -> Vec<u32> {
    let mut won = vec![0u32; tallies.len()];
    if seats == 0 || tallies.iter().all(|&votes| votes == 0) {
        return won;
    }

    let mut quotients = Vec::with_capacity(tallies.len() * seats as usize);
    for (slot, &votes) in tallies.iter().enumerate() {
        for divisor in 1..=seats {
            quotients.push(Quotient {
                value: votes as f64 / f64::from(divisor),
                slot,
            });
        }
    }

    // sort_by 為穩定排序，同值保留產生順序
    match tie_break {
        TieBreak::GenerationOrder => {
            quotients.sort_by(|a, b| b.value.total_cmp(&a.value));
        }
        TieBreak::LargerTally => {
            quotients.sort_by(|a, b| {
                b.value
                    .total_cmp(&a.value)
                    .then_with(|| tallies[b.slot].cmp(&tallies[a.slot]))
            });
        }
    }

    for quotient in quotients.iter().take(seats as usize) {
        won[quotient.slot] += 1;
    }
    won
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApportionmentEngine {
    tie_break: TieBreak,
}

impl ApportionmentEngine {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn compute_seats(
        &self,
        ledger: &VoteLedger,
        registry: &AllianceRegistry,
        allocations: &[SeatAllocation],
    ) -> Apportionment {
        let contenders: Vec<_> = registry
            .alliances()
            .iter()
            .filter(|alliance| !alliance.is_dissolved())
            .collect();

        let mut seats_won: BTreeMap<AllianceId, u32> = contenders
            .iter()
            .map(|alliance| (alliance.id.clone(), 0))
            .collect();
        let mut regions = Vec::with_capacity(allocations.len());

        for allocation in allocations {
            let tallies: Vec<u64> = contenders
                .iter()
                .map(|alliance| ledger.region_total_for(&allocation.region, &alliance.members))
                .collect();
            let won = allocate(&tallies, allocation.seats, self.tie_break);

            let mut awarded = BTreeMap::new();
            for (alliance, seats) in contenders.iter().zip(won) {
                awarded.insert(alliance.id.clone(), seats);
                *seats_won.entry(alliance.id.clone()).or_insert(0) += seats;
            }
            let handed_out: u32 = awarded.values().sum();

            tracing::debug!(
                "Region {}: {} seats, {} awarded across {} alliances",
                allocation.region,
                allocation.seats,
                handed_out,
                contenders.len()
            );

            regions.push(RegionOutcome {
                region: allocation.region.clone(),
                seats: allocation.seats,
                awarded,
                unassigned: allocation.seats - handed_out,
            });
        }

        Apportionment { seats_won, regions }
    }
}
