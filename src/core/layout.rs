use crate::core::ledger::VoteLedger;
use crate::core::packing::{pack, PackNode};
use crate::core::registry::AllianceRegistry;
use crate::domain::model::{AllianceId, PartyId, Point};
use crate::domain::policy::CanvasSettings;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyLeaf {
    pub party: PartyId,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyBranch {
    pub alliance: AllianceId,
    pub members: Vec<HierarchyLeaf>,
}

/// `root -> alliances -> parties`, each party weighted by its votes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub alliances: Vec<HierarchyBranch>,
}

impl Hierarchy {
    pub fn from_registry(registry: &AllianceRegistry, ledger: &VoteLedger) -> Self {
        let alliances = registry
            .alliances()
            .iter()
            .filter(|alliance| !alliance.is_dissolved())
            .map(|alliance| HierarchyBranch {
                alliance: alliance.id.clone(),
                members: alliance
                    .members
                    .iter()
                    .map(|party| HierarchyLeaf {
                        party: party.clone(),
                        value: ledger.party_total(party),
                    })
                    .collect(),
            })
            .collect();
        Self { alliances }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Alliance(AllianceId),
    Party(PartyId),
}

/// One circle of the projected layout.
///
/// `radius` and `offset` are in packed units (offset is relative to the
/// parent's center); `center` and `radius_px` are canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedNode {
    pub kind: NodeKind,
    pub value: u64,
    pub radius: f64,
    pub offset: Point,
    pub center: Point,
    pub radius_px: f64,
    pub children: Vec<PackedNode>,
}

impl PackedNode {
    pub fn alliance_id(&self) -> Option<&AllianceId> {
        match &self.kind {
            NodeKind::Alliance(id) => Some(id),
            _ => None,
        }
    }

    pub fn party_id(&self) -> Option<&PartyId> {
        match &self.kind {
            NodeKind::Party(id) => Some(id),
            _ => None,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.distance_squared(self.center) <= self.radius_px * self.radius_px
    }
}

/// Linear scale with domain `[0, domain]` onto `[0, range]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: f64,
    pub range: f64,
}

impl LinearScale {
    pub fn new(domain: f64, range: f64) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.domain > 0.0 {
            value / self.domain * self.range
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitTarget {
    pub alliance: AllianceId,
    pub center: Point,
    pub radius: f64,
}

impl HitTarget {
    /// Inside or on the circle: `dx² + dy² <= r²`.
    pub fn contains(&self, point: Point) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyTarget {
    pub party: PartyId,
    pub alliance: AllianceId,
    pub center: Point,
    pub radius: f64,
}

impl PartyTarget {
    pub fn contains(&self, point: Point) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub alliance: AllianceId,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedLayout {
    pub root: PackedNode,
    pub scale: LinearScale,
    pub columns: usize,
    pub rows: usize,
    pub labels: Vec<LabelAnchor>,
}

impl PackedLayout {
    pub fn alliances(&self) -> &[PackedNode] {
        &self.root.children
    }

    pub fn alliance(&self, id: &AllianceId) -> Option<&PackedNode> {
        self.alliances()
            .iter()
            .find(|node| node.alliance_id() == Some(id))
    }

    /// Alliance circles in ordinal order, for hit-testing.
    pub fn alliance_targets(&self) -> Vec<HitTarget> {
        self.alliances()
            .iter()
            .filter_map(|node| {
                node.alliance_id().map(|id| HitTarget {
                    alliance: id.clone(),
                    center: node.center,
                    radius: node.radius_px,
                })
            })
            .collect()
    }

    pub fn party_targets(&self) -> Vec<PartyTarget> {
        let mut targets = Vec::new();
        for alliance in self.alliances() {
            let Some(alliance_id) = alliance.alliance_id() else {
                continue;
            };
            for party in &alliance.children {
                if let Some(party_id) = party.party_id() {
                    targets.push(PartyTarget {
                        party: party_id.clone(),
                        alliance: alliance_id.clone(),
                        center: party.center,
                        radius: party.radius_px,
                    });
                }
            }
        }
        targets
    }

    pub fn party(&self, id: &PartyId) -> Option<&PackedNode> {
        self.alliances()
            .iter()
            .flat_map(|alliance| alliance.children.iter())
            .find(|node| node.party_id() == Some(id))
    }

    pub fn party_position(&self, id: &PartyId) -> Option<Point> {
        self.party(id).map(|node| node.center)
    }
}

/// Turns the alliance hierarchy into canvas geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutProjector {
    canvas: CanvasSettings,
}

impl LayoutProjector {
    pub fn new(canvas: CanvasSettings) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn project(&self, hierarchy: &Hierarchy) -> PackedLayout {
        let canvas = &self.canvas;
        let mut packed = PackNode::branch(
            hierarchy
                .alliances
                .iter()
                .map(|branch| {
                    PackNode::branch(
                        branch
                            .members
                            .iter()
                            .map(|leaf| PackNode::leaf(leaf.value as f64))
                            .collect(),
                    )
                })
                .collect(),
        );
        // 保留 1px 邊框
        pack(
            &mut packed,
            (canvas.width - 2.0).max(1.0),
            (canvas.height - 2.0).max(1.0),
            canvas.padding,
        );

        let max_radius = packed
            .children
            .iter()
            .map(|alliance| alliance.r)
            .fold(0.0, f64::max);
        let band: f64 = packed
            .children
            .iter()
            .map(|alliance| alliance.r * 2.0 + max_radius)
            .sum();
        let scale = LinearScale::new(band, canvas.width);

        let count = hierarchy.alliances.len();
        let columns = match canvas.columns {
            Some(columns) if columns > 0 && count > columns => columns,
            _ => count.max(1),
        };
        let rows = count.div_ceil(columns).max(1);
        let max_radius_px = scale.apply(max_radius);
        let pitch = max_radius_px * 2.0 + canvas.row_gap;
        let middle_row = (rows - 1) as f64 / 2.0;

        let mut alliances = Vec::with_capacity(count);
        let mut labels = Vec::with_capacity(count);
        for (ordinal, (branch, node)) in hierarchy.alliances.iter().zip(&packed.children).enumerate() {
            let column = ordinal % columns;
            let row = ordinal / columns;
            let center = Point::new(
                canvas.width * (column as f64 + 0.5) / columns as f64,
                canvas.height / 2.0 + (row as f64 - middle_row) * pitch,
            );

            let parties = branch
                .members
                .iter()
                .zip(&node.children)
                .map(|(leaf, party)| {
                    let offset = Point::new(party.x - node.x, party.y - node.y);
                    PackedNode {
                        kind: NodeKind::Party(leaf.party.clone()),
                        value: leaf.value,
                        radius: party.r,
                        offset,
                        center: Point::new(
                            center.x + scale.apply(offset.x),
                            center.y + scale.apply(offset.y),
                        ),
                        radius_px: scale.apply(party.r),
                        children: Vec::new(),
                    }
                })
                .collect();

            labels.push(LabelAnchor {
                alliance: branch.alliance.clone(),
                position: Point::new(center.x, center.y - max_radius_px - canvas.label_offset),
            });
            alliances.push(PackedNode {
                kind: NodeKind::Alliance(branch.alliance.clone()),
                value: branch.members.iter().map(|leaf| leaf.value).sum(),
                radius: node.r,
                offset: Point::new(node.x - packed.x, node.y - packed.y),
                center,
                radius_px: scale.apply(node.r),
                children: parties,
            });
        }

        if packed.r == 0.0 {
            tracing::debug!("Degenerate layout: every vote value is zero");
        }

        let root = PackedNode {
            kind: NodeKind::Root,
            value: alliances.iter().map(|node| node.value).sum(),
            radius: packed.r,
            offset: Point::default(),
            center: Point::new(canvas.width / 2.0, canvas.height / 2.0),
            radius_px: scale.apply(packed.r),
            children: alliances,
        };

        PackedLayout {
            root,
            scale,
            columns,
            rows,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(name: &str, members: &[(&str, u64)]) -> HierarchyBranch {
        HierarchyBranch {
            alliance: AllianceId::new(name),
            members: members
                .iter()
                .map(|(party, value)| HierarchyLeaf {
                    party: PartyId::new(party),
                    value: *value,
                })
                .collect(),
        }
    }

    fn sample() -> Hierarchy {
        Hierarchy {
            alliances: vec![
                branch("A", &[("P1", 60_000), ("P2", 40_000)]),
                branch("B", &[("P3", 80_000)]),
                branch("C", &[("P4", 15_000), ("P5", 5_000)]),
            ],
        }
    }

    #[test]
    fn test_single_row_point_centering() {
        let layout = LayoutProjector::default().project(&sample());

        let xs: Vec<f64> = layout.alliances().iter().map(|node| node.center.x).collect();
        let expected = [1000.0 / 6.0, 500.0, 5000.0 / 6.0];
        for (x, want) in xs.iter().zip(expected) {
            assert!((x - want).abs() < 1e-9);
        }
        assert!(layout.alliances().iter().all(|node| node.center.y == 150.0));
        assert_eq!((layout.columns, layout.rows), (3, 1));
    }

    #[test]
    fn test_scaled_diameters_fit_canvas_width() {
        let layout = LayoutProjector::default().project(&sample());
        let diameters: f64 = layout.alliances().iter().map(|node| node.radius_px * 2.0).sum();
        assert!(diameters <= 1000.0 + 1e-9);

        // 最大圓直徑加上間距後總和恰為畫布寬
        let max_px = layout
            .alliances()
            .iter()
            .map(|node| node.radius_px)
            .fold(0.0, f64::max);
        let band = diameters + max_px * layout.alliances().len() as f64;
        assert!((band - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_party_centers_follow_scaled_offsets() {
        let layout = LayoutProjector::default().project(&sample());
        let alliance = layout.alliance(&AllianceId::new("A")).unwrap();

        for party in &alliance.children {
            let expected_x = alliance.center.x + layout.scale.apply(party.offset.x);
            assert!((party.center.x - expected_x).abs() < 1e-9);
            // 子圓必須落在聯盟圓內
            let reach = party.center.distance_squared(alliance.center).sqrt() + party.radius_px;
            assert!(reach <= alliance.radius_px + 1e-6);
        }
        assert!(layout.party_position(&PartyId::new("P2")).is_some());
        assert!(layout.party_position(&PartyId::new("P9")).is_none());
    }

    #[test]
    fn test_grid_rows_use_integer_division() {
        let canvas = CanvasSettings {
            columns: Some(2),
            ..CanvasSettings::default()
        };
        let layout = LayoutProjector::new(canvas).project(&sample());
        assert_eq!((layout.columns, layout.rows), (2, 2));

        let nodes = layout.alliances();
        assert_eq!(nodes[0].center.y, nodes[1].center.y);
        assert!(nodes[2].center.y > nodes[0].center.y);
        assert_eq!(nodes[2].center.x, nodes[0].center.x);

        let max_px = nodes.iter().map(|node| node.radius_px).fold(0.0, f64::max);
        let pitch = nodes[2].center.y - nodes[0].center.y;
        assert!((pitch - (max_px * 2.0 + canvas.row_gap)).abs() < 1e-9);
        // 兩列以畫布中線對稱
        assert!((nodes[0].center.y + nodes[2].center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_columns_wider_than_alliance_count_keep_single_row() {
        let canvas = CanvasSettings {
            columns: Some(8),
            ..CanvasSettings::default()
        };
        let layout = LayoutProjector::new(canvas).project(&sample());
        assert_eq!((layout.columns, layout.rows), (3, 1));
    }

    #[test]
    fn test_all_zero_values_give_degenerate_layout() {
        let hierarchy = Hierarchy {
            alliances: vec![branch("A", &[("P1", 0), ("P2", 0)]), branch("B", &[("P3", 0)])],
        };
        let layout = LayoutProjector::default().project(&hierarchy);

        assert_eq!(layout.alliances().len(), 2);
        for alliance in layout.alliances() {
            assert_eq!(alliance.radius_px, 0.0);
            for party in &alliance.children {
                assert_eq!(party.radius_px, 0.0);
                assert_eq!(party.center, alliance.center);
            }
        }
    }

    #[test]
    fn test_hit_target_boundary_is_inclusive() {
        let target = HitTarget {
            alliance: AllianceId::new("A"),
            center: Point::new(0.0, 0.0),
            radius: 5.0,
        };
        assert!(target.contains(Point::new(3.0, 4.0)));
        assert!(!target.contains(Point::new(3.0, 4.1)));
    }

    #[test]
    fn test_label_anchor_sits_above_tallest_circle() {
        let layout = LayoutProjector::default().project(&sample());
        let max_px = layout
            .alliances()
            .iter()
            .map(|node| node.radius_px)
            .fold(0.0, f64::max);
        for label in &layout.labels {
            assert!((label.position.y - (150.0 - max_px - 10.0)).abs() < 1e-9);
        }
    }
}
