use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geodesic::Coordinates;

/// String identifier for a campus graph node.
pub type NodeId = String;

/// Classification of a walkway graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Gate,
    Path,
    Intersection,
    BuildingEntrance,
    Building,
    Evacuation,
    /// Any type string this build does not recognise.
    #[serde(other)]
    Other,
}

impl NodeType {
    /// Whether a node of this type counts as a building destination.
    pub fn is_building_access(self) -> bool {
        matches!(
            self,
            NodeType::BuildingEntrance | NodeType::Building | NodeType::Gate
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            NodeType::Gate => "gate",
            NodeType::Path => "path",
            NodeType::Intersection => "intersection",
            NodeType::BuildingEntrance => "building_entrance",
            NodeType::Building => "building",
            NodeType::Evacuation => "evacuation",
            NodeType::Other => "other",
        };
        f.write_str(value)
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gate" => Ok(NodeType::Gate),
            "path" => Ok(NodeType::Path),
            "intersection" => Ok(NodeType::Intersection),
            "building_entrance" | "building-entrance" => Ok(NodeType::BuildingEntrance),
            "building" => Ok(NodeType::Building),
            "evacuation" => Ok(NodeType::Evacuation),
            other => Err(format!("unknown node type: {other}")),
        }
    }
}

/// Descriptive fields curators attach to nodes. The engine never interprets
/// them; unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_main: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_count: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A point in the campus walkway graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(flatten)]
    pub metadata: NodeMetadata,
}

impl Node {
    pub fn new(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        node_type: NodeType,
        coordinates: Option<Coordinates>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            coordinates,
            metadata: NodeMetadata::default(),
        }
    }

    /// Coordinates if present and usable for distance calculations.
    pub fn valid_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }

    pub fn is_evacuation_point(&self) -> bool {
        self.node_type == NodeType::Evacuation
    }
}
