//! Drag-to-regroup gesture handling.
//!
//! A gesture is a small finite state machine:
//!
//! ```text
//! Idle --begin--> Dragging --drop--> (Move | SpinOff | Return) --> Idle
//!                     |
//!                     +--cancel--> Idle
//! ```
//!
//! The controller never mutates the registry itself. A drop yields a
//! [`DropDecision`] that the simulator applies before recomputing.

use crate::core::layout::{HitTarget, PackedLayout, PartyTarget};
use crate::core::registry::AllianceRegistry;
use crate::domain::model::{AllianceId, PartyId, Point};
use crate::domain::policy::OverlapRule;
use crate::utils::error::{Result, StateViolation};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragContext {
    pub party: PartyId,
    pub origin: AllianceId,
    /// Pointer position minus the party center at grab time.
    pub grab_offset: Point,
    pub pointer: Point,
    pub hover: Option<AllianceId>,
}

impl DragContext {
    /// Where the detached party circle is drawn while dragging.
    pub fn display_position(&self) -> Point {
        self.pointer.offset_from(self.grab_offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragContext),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropDecision {
    /// Dropped on another alliance.
    Move {
        party: PartyId,
        from: AllianceId,
        to: AllianceId,
    },
    /// Dropped on empty canvas.
    SpinOff { party: PartyId, from: AllianceId },
    /// Dropped back on its own alliance; nothing changes.
    Return { party: PartyId },
}

trait Circular {
    fn center(&self) -> Point;
    fn hit(&self, point: Point) -> bool;
}

impl Circular for HitTarget {
    fn center(&self) -> Point {
        self.center
    }

    fn hit(&self, point: Point) -> bool {
        self.contains(point)
    }
}

impl Circular for PartyTarget {
    fn center(&self) -> Point {
        self.center
    }

    fn hit(&self, point: Point) -> bool {
        self.contains(point)
    }
}

fn resolve<T: Circular>(targets: &[T], point: Point, rule: OverlapRule) -> Option<&T> {
    let mut hits = targets.iter().filter(|target| target.hit(point));
    match rule {
        OverlapRule::LastWins => hits.last(),
        OverlapRule::FirstWins => hits.next(),
        OverlapRule::Nearest => hits.min_by(|a, b| {
            point
                .distance_squared(a.center())
                .total_cmp(&point.distance_squared(b.center()))
        }),
    }
}

/// Alliance under `point`, if any.
pub fn hit_test(targets: &[HitTarget], point: Point, rule: OverlapRule) -> Option<&HitTarget> {
    resolve(targets, point, rule)
}

#[derive(Debug, Clone, Default)]
pub struct RegroupingController {
    state: GestureState,
    overlap: OverlapRule,
}

impl RegroupingController {
    pub fn new(overlap: OverlapRule) -> Self {
        Self {
            state: GestureState::Idle,
            overlap,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn overlap_rule(&self) -> OverlapRule {
        self.overlap
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    pub fn hover_at(&self, pointer: Point, layout: &PackedLayout) -> Option<AllianceId> {
        hit_test(&layout.alliance_targets(), pointer, self.overlap).map(|target| target.alliance.clone())
    }

    /// Start dragging `party`. No data changes until the drop.
    pub fn begin(
        &mut self,
        party: &PartyId,
        pointer: Point,
        layout: &PackedLayout,
        registry: &AllianceRegistry,
    ) -> Result<()> {
        if let GestureState::Dragging(context) = &self.state {
            return Err(StateViolation::GestureInProgress {
                party: context.party.clone(),
            }
            .into());
        }
        let origin = registry
            .alliance_of(party)
            .ok_or_else(|| StateViolation::PartyNotRegistered {
                party: party.clone(),
            })?
            .id
            .clone();
        let anchor = layout.party_position(party).unwrap_or(pointer);

        self.state = GestureState::Dragging(DragContext {
            party: party.clone(),
            origin,
            grab_offset: pointer.offset_from(anchor),
            pointer,
            hover: self.hover_at(pointer, layout),
        });
        Ok(())
    }

    /// Start dragging whichever party circle lies under `pointer`.
    pub fn begin_at(
        &mut self,
        pointer: Point,
        layout: &PackedLayout,
        registry: &AllianceRegistry,
    ) -> Result<Option<PartyId>> {
        let targets = layout.party_targets();
        let Some(target) = resolve(&targets, pointer, self.overlap) else {
            return Ok(None);
        };
        let party = target.party.clone();
        self.begin(&party, pointer, layout, registry)?;
        Ok(Some(party))
    }

    /// Track the pointer; returns the alliance currently hovered.
    pub fn pointer_moved(&mut self, pointer: Point, layout: &PackedLayout) -> Option<AllianceId> {
        let hover = self.hover_at(pointer, layout);
        match &mut self.state {
            GestureState::Dragging(context) => {
                context.pointer = pointer;
                context.hover = hover.clone();
                hover
            }
            GestureState::Idle => None,
        }
    }

    /// End the gesture at `pointer`. Always returns the controller to `Idle`.
    pub fn drop(
        &mut self,
        pointer: Point,
        layout: &PackedLayout,
        registry: &AllianceRegistry,
    ) -> Option<DropDecision> {
        let GestureState::Dragging(context) = std::mem::take(&mut self.state) else {
            return None;
        };
        let from = registry
            .alliance_of(&context.party)
            .map(|alliance| alliance.id.clone())
            .unwrap_or(context.origin);

        let decision = match self.hover_at(pointer, layout) {
            None => DropDecision::SpinOff {
                party: context.party,
                from,
            },
            Some(target) if registry.contains(&target, &context.party) => DropDecision::Return {
                party: context.party,
            },
            Some(to) => DropDecision::Move {
                party: context.party,
                from,
                to,
            },
        };
        tracing::debug!("Drop decision: {:?}", decision);
        Some(decision)
    }

    /// Abandon the gesture without touching the registry.
    pub fn cancel(&mut self) -> Option<PartyId> {
        match std::mem::take(&mut self.state) {
            GestureState::Dragging(context) => Some(context.party),
            GestureState::Idle => None,
        }
    }
}
