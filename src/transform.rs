//! Maps domain records into graph elements and filters them.
//!
//! Every function here takes its input by reference and returns a new value.

use std::collections::HashSet;

use eframe::egui::Color32;

use crate::palette::{NodeShape, facility_color, facility_shape, status_color};
use crate::supply::{Facility, FacilityType, MovementStatus, VehicleMovement};

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: FacilityType,
    pub details: Facility,
    pub color: Color32,
    pub shape: NodeShape,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub status: MovementStatus,
    pub color: Color32,
    pub weight: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphElements {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphElements {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }
}

/// Type and status restrictions; an entry present in a set is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetFilter {
    pub types: HashSet<FacilityType>,
    pub statuses: HashSet<MovementStatus>,
}

impl Default for FacetFilter {
    fn default() -> Self {
        Self {
            types: FacilityType::KNOWN.into_iter().collect(),
            statuses: MovementStatus::ALL.into_iter().collect(),
        }
    }
}

impl FacetFilter {
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    pub fn toggle_type(&mut self, kind: &FacilityType) {
        if !self.types.remove(kind) {
            self.types.insert(kind.clone());
        }
    }

    pub fn toggle_status(&mut self, status: MovementStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    fn allows_type(&self, kind: &FacilityType) -> bool {
        match kind {
            // Unrecognized types have no checkbox, so they follow the "all types" state.
            FacilityType::Other(_) => self.types.len() == FacilityType::KNOWN.len(),
            known => self.types.contains(known),
        }
    }
}

pub fn to_nodes(facilities: &[Facility]) -> Vec<GraphNode> {
    facilities
        .iter()
        .map(|facility| GraphNode {
            id: facility.id.clone(),
            label: facility.name.clone(),
            kind: facility.kind.clone(),
            details: facility.clone(),
            color: facility_color(&facility.kind),
            shape: facility_shape(&facility.kind),
        })
        .collect()
}

pub fn to_edges(movements: &[VehicleMovement]) -> Vec<GraphEdge> {
    movements
        .iter()
        .map(|movement| GraphEdge {
            id: format!("edge-{}", movement.id),
            source: movement.source_facility_id.clone(),
            target: movement.destination_facility_id.clone(),
            label: if movement.cargo.trim().is_empty() {
                "Cargo".to_owned()
            } else {
                movement.cargo.clone()
            },
            status: movement.status,
            color: status_color(movement.status),
            weight: if movement.status == MovementStatus::InTransit {
                3
            } else {
                2
            },
        })
        .collect()
}

pub fn to_elements(facilities: &[Facility], movements: &[VehicleMovement]) -> GraphElements {
    let elements = GraphElements {
        nodes: to_nodes(facilities),
        edges: to_edges(movements),
    };
    tracing::debug!(
        nodes = elements.nodes.len(),
        edges = elements.edges.len(),
        "transformed dataset into graph elements"
    );
    elements
}

pub fn node_matches_query(node: &GraphNode, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || node.label.to_lowercase().contains(&query)
        || node.kind.as_str().to_lowercase().contains(&query)
}

/// Keeps nodes whose label or type contains `query` and the edges between them.
pub fn filter_by_query(elements: &GraphElements, query: &str) -> GraphElements {
    if query.trim().is_empty() {
        return elements.clone();
    }

    let nodes = elements
        .nodes
        .iter()
        .filter(|node| node_matches_query(node, query))
        .cloned()
        .collect::<Vec<_>>();
    let edges = edges_within(&elements.edges, &nodes, |_| true);

    tracing::debug!(
        query,
        nodes = nodes.len(),
        edges = edges.len(),
        "filtered elements by query"
    );
    GraphElements { nodes, edges }
}

pub fn filter_by_facets(elements: &GraphElements, facets: &FacetFilter) -> GraphElements {
    if facets.is_unrestricted() {
        return elements.clone();
    }

    let nodes = elements
        .nodes
        .iter()
        .filter(|node| facets.allows_type(&node.kind))
        .cloned()
        .collect::<Vec<_>>();
    let edges = edges_within(&elements.edges, &nodes, |edge| {
        facets.statuses.contains(&edge.status)
    });
    GraphElements { nodes, edges }
}

/// Drops edges with an endpoint missing from the node set.
pub fn drop_unresolved(elements: &GraphElements) -> GraphElements {
    let ids = elements.node_ids();
    let edges = elements
        .edges
        .iter()
        .filter(|edge| {
            let resolved = ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str());
            if !resolved {
                tracing::debug!(edge = %edge.id, "dropping edge with unresolved endpoint");
            }
            resolved
        })
        .cloned()
        .collect();

    GraphElements {
        nodes: elements.nodes.clone(),
        edges,
    }
}

fn edges_within(
    edges: &[GraphEdge],
    nodes: &[GraphNode],
    keep: impl Fn(&GraphEdge) -> bool,
) -> Vec<GraphEdge> {
    let ids = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
    edges
        .iter()
        .filter(|edge| {
            ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()) && keep(edge)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::palette::status_color_raw;
    use crate::supply::FacilityDetails;

    pub(crate) fn facility(id: &str, name: &str, kind: FacilityType, lat: f64, lon: f64) -> Facility {
        Facility {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
            latitude: lat,
            longitude: lon,
            details: FacilityDetails::default(),
        }
    }

    pub(crate) fn movement(id: &str, from: &str, to: &str, status: MovementStatus) -> VehicleMovement {
        VehicleMovement {
            id: id.to_owned(),
            source_facility_id: from.to_owned(),
            destination_facility_id: to.to_owned(),
            vehicle_type: "Truck".to_owned(),
            status,
            departure_time: "2025-05-15T08:30:00Z".to_owned(),
            arrival_time: None,
            cargo: "Sedans (35 units)".to_owned(),
        }
    }

    pub(crate) fn scenario_facilities() -> Vec<Facility> {
        vec![
            facility("F1", "F1 Plant", FacilityType::Manufacturing, 13.08, 80.27),
            facility("F2", "F2 Depot", FacilityType::Distribution, 13.15, 80.23),
        ]
    }

    fn ids(elements: &GraphElements) -> (Vec<&str>, Vec<&str>) {
        (
            elements.nodes.iter().map(|node| node.id.as_str()).collect(),
            elements.edges.iter().map(|edge| edge.id.as_str()).collect(),
        )
    }

    #[test]
    fn scenario_a_two_nodes_one_transit_edge() {
        let movements = vec![movement("M1", "F1", "F2", MovementStatus::InTransit)];
        let elements = drop_unresolved(&to_elements(&scenario_facilities(), &movements));

        assert_eq!(elements.nodes.len(), 2);
        assert_eq!(elements.edges.len(), 1);
        let edge = &elements.edges[0];
        assert_eq!(edge.id, "edge-M1");
        assert_eq!(edge.weight, 3);
        assert_eq!(edge.color, status_color_raw("in-transit"));
        assert_eq!(elements.nodes[0].shape, NodeShape::Ellipse);
        assert_eq!(elements.nodes[1].shape, NodeShape::Diamond);
    }

    #[test]
    fn scenario_b_unmatched_query_is_empty() {
        let movements = vec![movement("M1", "F1", "F2", MovementStatus::InTransit)];
        let elements = to_elements(&scenario_facilities(), &movements);
        assert!(filter_by_query(&elements, "F3").is_empty());
    }

    #[test]
    fn scenario_c_dangling_edge_is_dropped() {
        let movements = vec![
            movement("M1", "F1", "F2", MovementStatus::InTransit),
            movement("M2", "F1", "F9", MovementStatus::Completed),
        ];
        let elements = drop_unresolved(&to_elements(&scenario_facilities(), &movements));
        assert_eq!(ids(&elements).1, vec!["edge-M1"]);
    }

    #[test]
    fn empty_query_is_identity_and_filtering_is_idempotent() {
        let movements = vec![
            movement("M1", "F1", "F2", MovementStatus::InTransit),
            movement("M2", "F2", "F1", MovementStatus::Scheduled),
        ];
        let elements = to_elements(&scenario_facilities(), &movements);

        assert_eq!(filter_by_query(&elements, ""), elements);
        assert_eq!(filter_by_query(&elements, "   "), elements);

        for query in ["plant", "DISTRIB", "f", "nothing"] {
            let once = filter_by_query(&elements, query);
            assert_eq!(filter_by_query(&once, query), once);
        }
    }

    #[test]
    fn single_matching_node_does_not_pull_neighbors() {
        let movements = vec![movement("M1", "F1", "F2", MovementStatus::InTransit)];
        let elements = to_elements(&scenario_facilities(), &movements);
        let filtered = filter_by_query(&elements, "plant");
        assert_eq!(ids(&filtered), (vec!["F1"], Vec::new()));

        let by_type = filter_by_query(&elements, "Manufacturing");
        assert_eq!(ids(&by_type).0, vec!["F1"]);
    }

    #[test]
    fn edge_weight_and_label_defaults() {
        let mut empty_cargo = movement("M3", "F1", "F2", MovementStatus::Completed);
        empty_cargo.cargo.clear();
        let edges = to_edges(&[empty_cargo]);
        assert_eq!(edges[0].weight, 2);
        assert_eq!(edges[0].label, "Cargo");
    }

    #[test]
    fn facets_compose_with_query() {
        let mut facilities = scenario_facilities();
        facilities.push(facility(
            "F3",
            "F3 Plant",
            FacilityType::Manufacturing,
            12.9,
            80.1,
        ));
        let movements = vec![
            movement("M1", "F1", "F2", MovementStatus::InTransit),
            movement("M2", "F1", "F3", MovementStatus::Completed),
            movement("M3", "F3", "F1", MovementStatus::Scheduled),
        ];
        let elements = to_elements(&facilities, &movements);

        let mut facets = FacetFilter::default();
        facets.toggle_status(MovementStatus::Completed);
        let filtered = filter_by_facets(&filter_by_query(&elements, "plant"), &facets);
        assert_eq!(ids(&filtered), (vec!["F1", "F3"], vec!["edge-M3"]));

        facets.toggle_type(&FacilityType::Manufacturing);
        let filtered = filter_by_facets(&elements, &facets);
        assert_eq!(ids(&filtered), (vec!["F2"], Vec::new()));

        facets.toggle_type(&FacilityType::Manufacturing);
        facets.toggle_status(MovementStatus::Completed);
        assert!(facets.is_unrestricted());
        assert_eq!(filter_by_facets(&elements, &facets), elements);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let facilities = scenario_facilities();
        let movements = vec![movement("M1", "F1", "F9", MovementStatus::InTransit)];
        let elements = to_elements(&facilities, &movements);
        let snapshot = elements.clone();
        let _ = drop_unresolved(&filter_by_query(&elements, "f1"));
        assert_eq!(elements, snapshot);
        assert_eq!(facilities, scenario_facilities());
    }
}
