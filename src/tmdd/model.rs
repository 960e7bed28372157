use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{Point2D, point};

/// A `{longitude, latitude}` coordinate object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoLocation {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<GeoLocation> for Point2D {
    fn from(loc: GeoLocation) -> Self {
        point(loc.longitude, loc.latitude)
    }
}

impl From<Point2D> for GeoLocation {
    fn from(p: Point2D) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Top-level TMDD network document
///
/// Only the coordinate-bearing inventories are typed. Every other section and
/// attribute is carried through `extra` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmddDocument {
    #[serde(rename = "LinkInventory")]
    pub link_inventory: LinkInventory,
    #[serde(rename = "NodeInventory")]
    pub node_inventory: NodeInventory,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInventory {
    #[serde(rename = "link-inventory-list")]
    pub links: Vec<LinkInventoryElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInventory {
    #[serde(rename = "node-inventory-list")]
    pub nodes: Vec<NodeInventoryElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInventoryElement {
    #[serde(rename = "link-begin-node-location")]
    pub begin_location: GeoLocation,
    #[serde(rename = "link-end-node-location")]
    pub end_location: GeoLocation,
    /// Polyline from begin node to end node, inclusive
    #[serde(rename = "link-geom-location")]
    pub geometry: Vec<GeoLocation>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInventoryElement {
    #[serde(rename = "node-location")]
    pub location: GeoLocation,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TmddDocument {
    /// Total number of coordinate objects at the corrected paths
    pub fn coordinate_count(&self) -> usize {
        let link_points: usize = self
            .link_inventory
            .links
            .iter()
            .map(|l| 2 + l.geometry.len())
            .sum();
        link_points + self.node_inventory.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "LinkInventory": {
            "organization-information": {"organization-id": "PATH"},
            "link-inventory-list": [{
                "link-id": "101",
                "link-begin-node-location": {"longitude": -118.1, "latitude": 34.1},
                "link-end-node-location": {"longitude": -118.2, "latitude": 34.2},
                "link-geom-location": [
                    {"longitude": -118.1, "latitude": 34.1},
                    {"longitude": -118.2, "latitude": 34.2}
                ],
                "link-speed-limit": 40.0
            }]
        },
        "NodeInventory": {
            "node-inventory-list": [{
                "node-id": "7",
                "node-location": {"longitude": -118, "latitude": 34}
            }]
        },
        "NodeStatus": {"node-status-list": []}
    }"#;

    #[test]
    fn test_parse_document() {
        let doc: TmddDocument = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(doc.link_inventory.links.len(), 1);
        let link = &doc.link_inventory.links[0];
        assert_eq!(link.begin_location, GeoLocation::new(-118.1, 34.1));
        assert_eq!(link.geometry.len(), 2);
        assert_eq!(link.attributes["link-id"], "101");
        assert_eq!(doc.node_inventory.nodes[0].location, GeoLocation::new(-118.0, 34.0));
        assert!(doc.extra.contains_key("NodeStatus"));
        assert!(doc.link_inventory.extra.contains_key("organization-information"));
        assert_eq!(doc.coordinate_count(), 5);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let doc: TmddDocument = serde_json::from_str(SAMPLE).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["NodeStatus"], serde_json::json!({"node-status-list": []}));
        assert_eq!(value["LinkInventory"]["link-inventory-list"][0]["link-speed-limit"], 40.0);
        assert_eq!(
            value["LinkInventory"]["organization-information"]["organization-id"],
            "PATH"
        );
    }

    #[test]
    fn test_missing_latitude_is_rejected() {
        let json = r#"{
            "LinkInventory": {"link-inventory-list": []},
            "NodeInventory": {"node-inventory-list": [{"node-location": {"longitude": 1.0}}]}
        }"#;
        assert!(serde_json::from_str::<TmddDocument>(json).is_err());
    }

    #[test]
    fn test_geo_location_point_conversion() {
        let p: Point2D = GeoLocation::new(-118.5, 34.5).into();
        assert_eq!(p.x, -118.5);
        assert_eq!(p.y, 34.5);
        assert_eq!(GeoLocation::from(p), GeoLocation::new(-118.5, 34.5));
    }
}
