use crate::domain::model::{PartyId, Region, VoteRecord};
use std::collections::BTreeMap;

/// Immutable per-(region, party) vote counts.
///
/// Repeated records for the same pair are summed on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    by_region: BTreeMap<Region, BTreeMap<PartyId, u64>>,
    party_totals: BTreeMap<PartyId, u64>,
}

impl VoteLedger {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = VoteRecord>,
    {
        let mut ledger = Self::default();
        for record in records {
            *ledger
                .by_region
                .entry(record.region)
                .or_default()
                .entry(record.party.clone())
                .or_insert(0) += record.votes;
            *ledger.party_totals.entry(record.party).or_insert(0) += record.votes;
        }
        ledger
    }

    pub fn votes(&self, region: &Region, party: &PartyId) -> u64 {
        self.by_region
            .get(region)
            .and_then(|parties| parties.get(party))
            .copied()
            .unwrap_or(0)
    }

    /// Aggregate votes of one party across every region.
    pub fn party_total(&self, party: &PartyId) -> u64 {
        self.party_totals.get(party).copied().unwrap_or(0)
    }

    pub fn region_total_for<'a, I>(&self, region: &Region, members: I) -> u64
    where
        I: IntoIterator<Item = &'a PartyId>,
    {
        match self.by_region.get(region) {
            Some(parties) => members
                .into_iter()
                .filter_map(|party| parties.get(party))
                .sum(),
            None => 0,
        }
    }

    pub fn total_for<'a, I>(&self, members: I) -> u64
    where
        I: IntoIterator<Item = &'a PartyId>,
    {
        members
            .into_iter()
            .map(|party| self.party_total(party))
            .sum()
    }

    pub fn has_region(&self, region: &Region) -> bool {
        self.by_region.contains_key(region)
    }

    pub fn grand_total(&self) -> u64 {
        self.party_totals.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, party: &str, votes: u64) -> VoteRecord {
        VoteRecord {
            region: Region::new(region),
            party: PartyId::new(party),
            votes,
        }
    }

    #[test]
    fn test_repeated_records_are_summed() {
        let ledger = VoteLedger::from_records(vec![
            record("Norte", "P1", 10),
            record("Norte", " P1 ", 5),
            record("Sur", "P1", 7),
        ]);

        assert_eq!(ledger.votes(&Region::new("Norte"), &PartyId::new("P1")), 15);
        assert_eq!(ledger.party_total(&PartyId::new("P1")), 22);
        assert_eq!(ledger.grand_total(), 22);
    }

    #[test]
    fn test_region_total_for_members() {
        let ledger = VoteLedger::from_records(vec![
            record("Norte", "P1", 10),
            record("Norte", "P2", 20),
            record("Norte", "P3", 40),
            record("Sur", "P2", 1),
        ]);
        let members = [PartyId::new("P1"), PartyId::new("P2")];

        assert_eq!(ledger.region_total_for(&Region::new("Norte"), &members), 30);
        assert_eq!(ledger.region_total_for(&Region::new("Sur"), &members), 1);
        assert_eq!(ledger.region_total_for(&Region::new("Este"), &members), 0);
        assert_eq!(ledger.total_for(&members), 31);
    }

    #[test]
    fn test_unknown_party_has_zero_votes() {
        let ledger = VoteLedger::from_records(vec![record("Norte", "P1", 10)]);
        assert_eq!(ledger.party_total(&PartyId::new("P9")), 0);
        assert!(ledger.has_region(&Region::new("Norte")));
        assert!(!ledger.has_region(&Region::new("Sur")));
    }
}
