//! Property-based invariant tests for D'Hondt apportionment.
//!
//! 1. Conservation: a region with votes hands out exactly its seats.
//! 2. An all-zero region hands out nothing.
//! 3. Monotonicity: more votes for one alliance never cost it a seat.
//! 4. Both tie-break rules agree whenever no quotients tie.
//! 5. Engine totals equal the per-region breakdown.

use alliance_seats::core::{allocate, AllianceRegistry, ApportionmentEngine, VoteLedger};
use alliance_seats::domain::model::{Alliance, AllianceId, PartyId, Region, SeatAllocation, VoteRecord};
use alliance_seats::domain::policy::TieBreak;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn tallies_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..=1_000_000, 1..=8)
}

fn tie_break_strategy() -> impl Strategy<Value = TieBreak> {
    prop_oneof![Just(TieBreak::GenerationOrder), Just(TieBreak::LargerTally)]
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Conservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn seats_are_conserved(
        tallies in tallies_strategy(),
        seats in 1u32..=30,
        tie_break in tie_break_strategy(),
    ) {
        let won = allocate(&tallies, seats, tie_break);
        let awarded: u32 = won.iter().sum();

        prop_assert_eq!(won.len(), tallies.len());
        if tallies.iter().any(|&votes| votes > 0) {
            prop_assert_eq!(awarded, seats, "tallies={:?}", tallies);
        } else {
            prop_assert_eq!(awarded, 0);
        }
    }
}

proptest! {
    #[test]
    fn zero_tally_never_wins(
        tallies in tallies_strategy(),
        seats in 1u32..=30,
        tie_break in tie_break_strategy(),
    ) {
        let won = allocate(&tallies, seats, tie_break);
        for (votes, seats_won) in tallies.iter().zip(&won) {
            if *votes == 0 {
                prop_assert_eq!(*seats_won, 0);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn more_votes_never_lose_seats(
        tallies in tallies_strategy(),
        seats in 1u32..=30,
        pick in any::<prop::sample::Index>(),
        extra in 1u64..=500_000,
        tie_break in tie_break_strategy(),
    ) {
        let slot = pick.index(tallies.len());
        let before = allocate(&tallies, seats, tie_break);

        let mut boosted = tallies.clone();
        boosted[slot] += extra;
        let after = allocate(&boosted, seats, tie_break);

        prop_assert!(
            after[slot] >= before[slot],
            "slot {} went from {} to {} seats: {:?} -> {:?}",
            slot, before[slot], after[slot], tallies, boosted
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Tie-break rules only matter on ties
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tie_break_irrelevant_for_distinct_primes(seats in 1u32..=12) {
        // 互質的票數不會產生相同商數
        let tallies = [7_919u64, 6_563, 5_101, 3_023];
        prop_assert_eq!(
            allocate(&tallies, seats, TieBreak::GenerationOrder),
            allocate(&tallies, seats, TieBreak::LargerTally)
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Engine totals match the regional breakdown
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn engine_totals_match_regions(
        votes in prop::collection::vec((0usize..3, 0usize..5, 0u64..50_000), 0..40),
        seats in prop::collection::vec(1u32..=10, 3),
    ) {
        let regions = ["North", "Center", "South"];
        let parties = ["P0", "P1", "P2", "P3", "P4"];

        let ledger = VoteLedger::from_records(votes.iter().map(|&(region, party, votes)| VoteRecord {
            region: Region::new(regions[region]),
            party: PartyId::new(parties[party]),
            votes,
        }));
        let registry = AllianceRegistry::new(vec![
            Alliance::new(AllianceId::new("A"), vec![PartyId::new("P0"), PartyId::new("P1")]),
            Alliance::new(AllianceId::new("B"), vec![PartyId::new("P2")]),
            Alliance::new(AllianceId::new("C"), vec![PartyId::new("P3"), PartyId::new("P4")]),
        ]).unwrap();
        let allocations: Vec<SeatAllocation> = regions
            .iter()
            .zip(&seats)
            .map(|(region, &seats)| SeatAllocation { region: Region::new(region), seats })
            .collect();

        let result = ApportionmentEngine::default().compute_seats(&ledger, &registry, &allocations);

        let total_won: u32 = result.seats_won.values().sum();
        let total_unassigned: u32 = result.regions.iter().map(|r| r.unassigned).sum();
        prop_assert_eq!(total_won + total_unassigned, seats.iter().sum::<u32>());

        for outcome in &result.regions {
            let awarded: u32 = outcome.awarded.values().sum();
            prop_assert_eq!(awarded + outcome.unassigned, outcome.seats);
        }
        for alliance in registry.alliances() {
            let from_regions: u32 = result
                .regions
                .iter()
                .map(|r| r.awarded.get(&alliance.id).copied().unwrap_or(0))
                .sum();
            prop_assert_eq!(result.seats_for(&alliance.id), from_regions);
        }
    }
}
