use crate::core::apportionment::{ApportionmentEngine, RegionOutcome};
use crate::core::context::SessionContext;
use crate::core::layout::{Hierarchy, LayoutProjector, PackedLayout};
use crate::core::regrouping::{DropDecision, GestureState, RegroupingController};
use crate::core::registry::{AllianceRegistry, Mutation};
use crate::domain::model::{AllianceId, AllianceSummary, PartyId, Point};
use crate::domain::policy::{OverlapRule, TieBreak};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{SeatError, StateViolation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of one full recomputation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cycle {
    pub generation: u64,
    pub layout: PackedLayout,
    pub alliances: BTreeMap<AllianceId, AllianceSummary>,
    pub regions: Vec<RegionOutcome>,
    pub membership: Vec<(AllianceId, Vec<PartyId>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Start { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    End { x: f64, y: f64 },
    Cancel,
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match *self {
            PointerEvent::Start { x, y } | PointerEvent::Move { x, y } | PointerEvent::End { x, y } => {
                Some(Point::new(x, y))
            }
            PointerEvent::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum GestureOutcome {
    /// Event had no effect in the current state.
    Ignored,
    Started(PartyId),
    Hover(Option<AllianceId>),
    Applied(Mutation),
    Returned(PartyId),
    Rejected(StateViolation),
    Cancelled(PartyId),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub generated_at: String,
    pub tie_break: TieBreak,
    pub overlap_rule: OverlapRule,
    pub total_seats: u32,
    pub cycle: Cycle,
}

/// Owns the session and reruns the whole pipeline after every mutation.
pub struct Simulator {
    context: SessionContext,
    registry: AllianceRegistry,
    engine: ApportionmentEngine,
    projector: LayoutProjector,
    controller: RegroupingController,
    cycle: Cycle,
}

impl Simulator {
    pub fn new(
        context: SessionContext,
        registry: AllianceRegistry,
        engine: ApportionmentEngine,
        projector: LayoutProjector,
        controller: RegroupingController,
    ) -> Self {
        let cycle = run_cycle(&context, &registry, &engine, &projector, 0);
        tracing::info!(
            "🗳️  Session ready: {} alliances, {} seats across {} regions",
            registry.len(),
            context.total_seats(),
            context.seats.len()
        );
        Self {
            context,
            registry,
            engine,
            projector,
            controller,
            cycle,
        }
    }

    pub fn from_config<C: ConfigProvider>(
        context: SessionContext,
        registry: AllianceRegistry,
        config: &C,
    ) -> Self {
        Self::new(
            context,
            registry,
            ApportionmentEngine::new(config.tie_break()),
            LayoutProjector::new(config.canvas()),
            RegroupingController::new(config.overlap_rule()),
        )
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn registry(&self) -> &AllianceRegistry {
        &self.registry
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn state(&self) -> &GestureState {
        self.controller.state()
    }

    /// Totals straight from the registry, bypassing the stored cycle.
    pub fn totals(&self) -> BTreeMap<AllianceId, AllianceSummary> {
        self.registry.totals_snapshot(&self.context, &self.engine)
    }

    pub fn recompute(&mut self) -> &Cycle {
        let generation = self.cycle.generation + 1;
        self.cycle = run_cycle(
            &self.context,
            &self.registry,
            &self.engine,
            &self.projector,
            generation,
        );
        &self.cycle
    }

    pub fn handle(&mut self, event: PointerEvent) -> GestureOutcome {
        match event {
            PointerEvent::Start { x, y } => {
                let at = Point::new(x, y);
                match self
                    .controller
                    .begin_at(at, &self.cycle.layout, &self.registry)
                {
                    Ok(Some(party)) => GestureOutcome::Started(party),
                    Ok(None) => GestureOutcome::Ignored,
                    Err(err) => self.reject(err),
                }
            }
            PointerEvent::Move { x, y } => {
                if !self.controller.is_dragging() {
                    return GestureOutcome::Ignored;
                }
                GestureOutcome::Hover(
                    self.controller
                        .pointer_moved(Point::new(x, y), &self.cycle.layout),
                )
            }
            PointerEvent::End { x, y } => {
                match self
                    .controller
                    .drop(Point::new(x, y), &self.cycle.layout, &self.registry)
                {
                    Some(decision) => self.apply(decision),
                    None => GestureOutcome::Ignored,
                }
            }
            PointerEvent::Cancel => match self.controller.cancel() {
                Some(party) => GestureOutcome::Cancelled(party),
                None => GestureOutcome::Ignored,
            },
        }
    }

    /// Applies a drop decision and recomputes when membership changed.
    pub fn apply(&mut self, decision: DropDecision) -> GestureOutcome {
        let result = match &decision {
            DropDecision::Return { party } => {
                tracing::debug!("'{}' returned to its alliance", party);
                return GestureOutcome::Returned(party.clone());
            }
            DropDecision::Move { party, from, to } => self.registry.move_party(party, from, to),
            DropDecision::SpinOff { party, from } => {
                let label = self.context.party_label(party).map(str::to_string);
                self.registry.spin_off(party, from, label)
            }
        };

        match result {
            Ok(mutation) => {
                if mutation.is_change() {
                    self.recompute();
                    tracing::info!(
                        "🔁 Cycle {} after {:?}",
                        self.cycle.generation,
                        mutation
                    );
                }
                GestureOutcome::Applied(mutation)
            }
            Err(err) => self.reject(err),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            generated_at: chrono::Utc::now().to_rfc3339(),
            tie_break: self.engine.tie_break(),
            overlap_rule: self.controller.overlap_rule(),
            total_seats: self.context.total_seats(),
            cycle: self.cycle.clone(),
        }
    }

    fn reject(&self, err: SeatError) -> GestureOutcome {
        match err {
            SeatError::InvalidState(violation) => {
                tracing::warn!("⚠️  Mutation skipped: {}", violation);
                GestureOutcome::Rejected(violation)
            }
            other => {
                tracing::error!("❌ Unexpected error during gesture: {}", other);
                GestureOutcome::Ignored
            }
        }
    }
}

fn run_cycle(
    context: &SessionContext,
    registry: &AllianceRegistry,
    engine: &ApportionmentEngine,
    projector: &LayoutProjector,
    generation: u64,
) -> Cycle {
    let apportionment = engine.compute_seats(&context.ledger, registry, &context.seats);
    let alliances = registry.summaries(context, &apportionment.seats_won);
    let layout = projector.project(&Hierarchy::from_registry(registry, &context.ledger));

    tracing::debug!(
        "Cycle {}: {} alliances, {} seats awarded",
        generation,
        alliances.len(),
        apportionment.seats_won.values().sum::<u32>()
    );

    Cycle {
        generation,
        layout,
        alliances,
        regions: apportionment.regions,
        membership: registry.membership_snapshot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::VoteLedger;
    use crate::domain::model::{Alliance, PartyMeta, Region, SeatAllocation, VoteRecord};

    fn simulator() -> Simulator {
        let votes = [
            ("R1", "P1", 60_000),
            ("R1", "P2", 40_000),
            ("R1", "P3", 80_000),
            ("R1", "P4", 20_000),
            ("R2", "P1", 5_000),
            ("R2", "P3", 9_000),
            ("R2", "P4", 7_000),
        ];
        let ledger = VoteLedger::from_records(votes.iter().map(|(region, party, votes)| VoteRecord {
            region: Region::new(region),
            party: PartyId::new(party),
            votes: *votes,
        }));
        let seats = vec![
            SeatAllocation { region: Region::new("R1"), seats: 3 },
            SeatAllocation { region: Region::new("R2"), seats: 2 },
        ];
        let mut parties = BTreeMap::new();
        parties.insert(
            PartyId::new("P2"),
            PartyMeta {
                color: Some("#aa0000".into()),
                short: Some("Dos".into()),
            },
        );
        let registry = AllianceRegistry::new(vec![
            Alliance::new(AllianceId::new("A"), vec![PartyId::new("P1"), PartyId::new("P2")]),
            Alliance::new(AllianceId::new("B"), vec![PartyId::new("P3")]),
            Alliance::new(AllianceId::new("C"), vec![PartyId::new("P4")]),
        ])
        .unwrap();
        Simulator::new(
            SessionContext::new(ledger, seats, parties),
            registry,
            ApportionmentEngine::default(),
            LayoutProjector::default(),
            RegroupingController::default(),
        )
    }

    fn party_point(sim: &Simulator, party: &str) -> Point {
        sim.cycle().layout.party_position(&PartyId::new(party)).unwrap()
    }

    fn alliance_point(sim: &Simulator, alliance: &str) -> Point {
        sim.cycle().layout.alliance(&AllianceId::new(alliance)).unwrap().center
    }

    fn drag(sim: &mut Simulator, from: Point, to: Point) -> GestureOutcome {
        sim.handle(PointerEvent::Start { x: from.x, y: from.y });
        sim.handle(PointerEvent::Move { x: to.x, y: to.y });
        sim.handle(PointerEvent::End { x: to.x, y: to.y })
    }

    #[test]
    fn test_initial_cycle() {
        let sim = simulator();
        let cycle = sim.cycle();

        assert_eq!(cycle.generation, 0);
        // R1: A, B, A  R2: B, C
        assert_eq!(cycle.alliances[&AllianceId::new("A")].seats_won, 2);
        assert_eq!(cycle.alliances[&AllianceId::new("B")].seats_won, 2);
        assert_eq!(cycle.alliances[&AllianceId::new("C")].seats_won, 1);
        assert_eq!(cycle.alliances[&AllianceId::new("A")].total_votes, 105_000);
        assert_eq!(sim.totals(), cycle.alliances);
    }

    #[test]
    fn test_drag_onto_other_alliance_recomputes() {
        let mut sim = simulator();
        let from = party_point(&sim, "P4");
        let to = alliance_point(&sim, "B");

        let outcome = drag(&mut sim, from, to);

        assert!(matches!(outcome, GestureOutcome::Applied(Mutation::Moved { dissolved: true, .. })));
        assert_eq!(sim.cycle().generation, 1);
        assert_eq!(sim.registry().len(), 2);
        assert!(sim.cycle().layout.alliance(&AllianceId::new("C")).is_none());
        assert_eq!(sim.cycle().alliances[&AllianceId::new("B")].total_votes, 116_000);
        assert_eq!(sim.state(), &GestureState::Idle);
    }

    #[test]
    fn test_drop_on_own_alliance_is_bit_identical() {
        let mut sim = simulator();
        let before = sim.cycle().clone();
        let registry_before = sim.registry().clone();

        let from = party_point(&sim, "P1");
        let to = alliance_point(&sim, "A");
        let outcome = drag(&mut sim, from, to);

        assert_eq!(outcome, GestureOutcome::Returned(PartyId::new("P1")));
        assert_eq!(sim.cycle(), &before);
        assert_eq!(sim.registry(), &registry_before);
    }

    #[test]
    fn test_spin_off_uses_party_label() {
        let mut sim = simulator();
        let from = party_point(&sim, "P2");

        let outcome = drag(&mut sim, from, Point::new(-400.0, -400.0));

        let created = match outcome {
            GestureOutcome::Applied(Mutation::SpunOff { created, .. }) => created,
            other => panic!("expected spin-off, got {other:?}"),
        };
        assert_eq!(created, AllianceId::new("Alliance 4"));
        let summary = &sim.cycle().alliances[&created];
        assert_eq!(summary.display.short_name.as_deref(), Some("Dos"));
        assert_eq!(summary.total_votes, 40_000);
        assert_eq!(sim.registry().len(), 4);
    }

    #[test]
    fn test_rejected_mutation_keeps_state() {
        let mut sim = simulator();
        let before = sim.cycle().clone();

        let outcome = sim.apply(DropDecision::Move {
            party: PartyId::new("P9"),
            from: AllianceId::new("A"),
            to: AllianceId::new("B"),
        });

        assert_eq!(
            outcome,
            GestureOutcome::Rejected(StateViolation::PartyNotRegistered {
                party: PartyId::new("P9")
            })
        );
        assert_eq!(sim.cycle(), &before);
    }

    #[test]
    fn test_cancel_and_stray_events_are_ignored() {
        let mut sim = simulator();
        assert_eq!(sim.handle(PointerEvent::Move { x: 1.0, y: 1.0 }), GestureOutcome::Ignored);
        assert_eq!(sim.handle(PointerEvent::End { x: 1.0, y: 1.0 }), GestureOutcome::Ignored);
        assert_eq!(sim.handle(PointerEvent::Cancel), GestureOutcome::Ignored);

        let from = party_point(&sim, "P3");
        assert_eq!(
            sim.handle(PointerEvent::Start { x: from.x, y: from.y }),
            GestureOutcome::Started(PartyId::new("P3"))
        );
        assert_eq!(
            sim.handle(PointerEvent::Cancel),
            GestureOutcome::Cancelled(PartyId::new("P3"))
        );
        assert_eq!(sim.cycle().generation, 0);
    }

    #[test]
    fn test_pointer_event_json_shape() {
        let events: Vec<PointerEvent> = serde_json::from_str(
            r#"[{"type":"start","x":1.0,"y":2.0},{"type":"move","x":3,"y":4},{"type":"cancel"}]"#,
        )
        .unwrap();
        assert_eq!(events[0].position(), Some(Point::new(1.0, 2.0)));
        assert_eq!(events[1], PointerEvent::Move { x: 3.0, y: 4.0 });
        assert_eq!(events[2].position(), None);
    }
}
