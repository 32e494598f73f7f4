use crate::core::apportionment::ApportionmentEngine;
use crate::core::context::SessionContext;
use crate::domain::model::{
    Alliance, AllianceDisplay, AllianceId, AllianceSpec, AllianceSummary, PartyId,
};
use crate::utils::error::{Result, StateViolation};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of a registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Unchanged,
    Moved {
        party: PartyId,
        from: AllianceId,
        to: AllianceId,
        dissolved: bool,
    },
    SpunOff {
        party: PartyId,
        from: AllianceId,
        created: AllianceId,
        dissolved: bool,
    },
}

impl Mutation {
    pub fn is_change(&self) -> bool {
        !matches!(self, Mutation::Unchanged)
    }
}

/// Single source of truth for alliance membership.
///
/// Invariant: a party is a member of at most one alliance, and no alliance
/// is empty. Every mutation validates first and only then removes the party
/// from its source before adding it to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllianceRegistry {
    alliances: Vec<Alliance>,
    next_ordinal: usize,
}

impl AllianceRegistry {
    pub fn new(alliances: Vec<Alliance>) -> Result<Self> {
        let mut owners: BTreeMap<PartyId, AllianceId> = BTreeMap::new();
        let mut kept: Vec<Alliance> = Vec::with_capacity(alliances.len());

        for mut alliance in alliances {
            if kept.iter().any(|existing| existing.id == alliance.id) {
                return Err(StateViolation::DuplicateAlliance {
                    alliance: alliance.id,
                }
                .into());
            }

            let mut unique = Vec::with_capacity(alliance.members.len());
            for party in alliance.members.drain(..) {
                if unique.contains(&party) {
                    continue;
                }
                if let Some(first) = owners.get(&party) {
                    return Err(StateViolation::DuplicateMembership {
                        party,
                        first: first.clone(),
                        second: alliance.id,
                    }
                    .into());
                }
                owners.insert(party.clone(), alliance.id.clone());
                unique.push(party);
            }
            alliance.members = unique;

            if alliance.is_dissolved() {
                tracing::warn!("⚠️  Alliance '{}' has no parties and is dropped", alliance.id);
                continue;
            }
            kept.push(alliance);
        }

        let next_ordinal = kept.len() + 1;
        Ok(Self {
            alliances: kept,
            next_ordinal,
        })
    }

    pub fn from_specs(specs: &[AllianceSpec]) -> Result<Self> {
        let alliances = specs
            .iter()
            .map(|spec| {
                Alliance::new(
                    AllianceId::new(&spec.name),
                    spec.parties.iter().map(PartyId::new).collect(),
                )
                .with_display(spec.display.clone())
            })
            .collect();
        Self::new(alliances)
    }

    pub fn alliances(&self) -> &[Alliance] {
        &self.alliances
    }

    pub fn len(&self) -> usize {
        self.alliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alliances.is_empty()
    }

    pub fn get(&self, id: &AllianceId) -> Option<&Alliance> {
        self.alliances.iter().find(|alliance| &alliance.id == id)
    }

    pub fn alliance_of(&self, party: &PartyId) -> Option<&Alliance> {
        self.alliances.iter().find(|alliance| alliance.contains(party))
    }

    pub fn contains(&self, alliance: &AllianceId, party: &PartyId) -> bool {
        self.get(alliance)
            .map(|alliance| alliance.contains(party))
            .unwrap_or(false)
    }

    /// Ordered `(alliance, members)` pairs; equal snapshots mean equal membership.
    pub fn membership_snapshot(&self) -> Vec<(AllianceId, Vec<PartyId>)> {
        self.alliances
            .iter()
            .map(|alliance| (alliance.id.clone(), alliance.members.clone()))
            .collect()
    }

    /// Moves `party` into `to`. The party leaves whichever alliance it is in
    /// now; `from` is only the caller's view and may be stale.
    pub fn move_party(
        &mut self,
        party: &PartyId,
        from: &AllianceId,
        to: &AllianceId,
    ) -> Result<Mutation> {
        let source = self.source_of(party, from)?;
        if &source == to {
            return Ok(Mutation::Unchanged);
        }
        if self.get(to).is_none() {
            return Err(StateViolation::UnknownAlliance {
                alliance: to.clone(),
            }
            .into());
        }

        let dissolved = self.detach(party, &source);
        if let Some(destination) = self.alliances.iter_mut().find(|alliance| &alliance.id == to) {
            destination.members.push(party.clone());
        }

        tracing::debug!("Moved '{}' from '{}' to '{}'", party, source, to);
        Ok(Mutation::Moved {
            party: party.clone(),
            from: source,
            to: to.clone(),
            dissolved,
        })
    }

    pub fn spin_off(
        &mut self,
        party: &PartyId,
        from: &AllianceId,
        label: Option<String>,
    ) -> Result<Mutation> {
        let source = self.source_of(party, from)?;

        let dissolved = self.detach(party, &source);
        let created = self.next_alliance_id();
        let display = AllianceDisplay {
            short_name: Some(label.unwrap_or_else(|| created.to_string())),
            ..AllianceDisplay::default()
        };
        self.alliances
            .push(Alliance::new(created.clone(), vec![party.clone()]).with_display(display));

        tracing::debug!("Spun '{}' off '{}' into '{}'", party, source, created);
        Ok(Mutation::SpunOff {
            party: party.clone(),
            from: source,
            created,
            dissolved,
        })
    }

    /// Per-alliance totals and seats, recomputed on every call.
    pub fn totals_snapshot(
        &self,
        context: &SessionContext,
        engine: &ApportionmentEngine,
    ) -> BTreeMap<AllianceId, AllianceSummary> {
        let apportionment = engine.compute_seats(&context.ledger, self, &context.seats);
        self.summaries(context, &apportionment.seats_won)
    }

    pub(crate) fn summaries(
        &self,
        context: &SessionContext,
        seats_won: &BTreeMap<AllianceId, u32>,
    ) -> BTreeMap<AllianceId, AllianceSummary> {
        self.alliances
            .iter()
            .map(|alliance| {
                let summary = AllianceSummary {
                    total_votes: context.ledger.total_for(&alliance.members),
                    seats_won: seats_won.get(&alliance.id).copied().unwrap_or(0),
                    display: alliance.display.clone(),
                };
                (alliance.id.clone(), summary)
            })
            .collect()
    }

    /// The alliance `party` actually belongs to.
    fn source_of(&self, party: &PartyId, from: &AllianceId) -> Result<AllianceId> {
        let actual = self
            .alliance_of(party)
            .ok_or_else(|| StateViolation::PartyNotRegistered {
                party: party.clone(),
            })?;
        if &actual.id != from {
            // 來源過期，以實際所屬為準
            tracing::debug!(
                "'{}' is in '{}', not '{}'; using the actual alliance",
                party,
                actual.id,
                from
            );
        }
        Ok(actual.id.clone())
    }

    /// Removes `party` from `from`, dropping the alliance once it is empty.
    fn detach(&mut self, party: &PartyId, from: &AllianceId) -> bool {
        let Some(index) = self.alliances.iter().position(|alliance| &alliance.id == from) else {
            return false;
        };
        self.alliances[index].members.retain(|member| member != party);
        if self.alliances[index].is_dissolved() {
            let removed = self.alliances.remove(index);
            tracing::info!("🫧 Alliance '{}' dissolved", removed.id);
            return true;
        }
        false
    }

    fn next_alliance_id(&mut self) -> AllianceId {
        loop {
            let candidate = AllianceId::new(format!("Alliance {}", self.next_ordinal));
            self.next_ordinal += 1;
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
