//! Build a TMDD document from network records already extracted from the
//! simulation model.
//!
//! Positions in the records are expected in degrees; translating the model's
//! internal coordinates happens on the extraction side.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::model::{
    GeoLocation, LinkInventory, LinkInventoryElement, NodeInventory, NodeInventoryElement,
    TmddDocument,
};
use crate::error::{CorrectionError, CorrectionResult};

/// km/h to mph
const MPH_PER_KMH: f64 = 0.62137119;

const NO_DETERMINATION: &str = "no determination";
const NO_JURISDICTION: &str = "Data not provided";

/// Extracted network records
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub junctions: Vec<JunctionRecord>,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JunctionRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub position: GeoLocation,
    /// City the junction belongs to, if recorded
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub road_type: String,
    pub capacity: f64,
    /// Length of each lane, in the model's length unit
    pub lane_lengths: Vec<f64>,
    pub speed_kmh: f64,
    pub full_lanes: u32,
    /// Interior polyline, without the origin and destination positions
    pub polyline: Vec<GeoLocation>,
    #[serde(default)]
    pub origin: Option<u64>,
    #[serde(default)]
    pub destination: Option<u64>,
}

/// Identification stamped on every element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportSettings {
    pub organization_id: String,
    pub network_id: String,
    pub network_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTime {
    pub date: String,
    pub time: String,
    pub offset: String,
}

impl UpdateTime {
    /// Current local date and time
    pub fn now(offset: &str) -> Self {
        let now = chrono::Local::now();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S%.6f").to_string(),
            offset: offset.to_string(),
        }
    }

    fn to_value(&self) -> Value {
        json!({"date": self.date, "time": self.time, "offset": self.offset})
    }
}

/// Hands out `dummy1`, `dummy2`, ... for links missing an endpoint junction.
///
/// One allocator lives for one [`build_document`] call, so numbering restarts
/// with every export.
#[derive(Debug, Default)]
pub struct DummyIdAllocator {
    issued: u32,
}

impl DummyIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> String {
        self.issued += 1;
        format!("dummy{}", self.issued)
    }
}

/// Map a simulation road type name to a TMDD link type
pub fn tmdd_link_type(road_type: &str) -> String {
    let road_type = road_type.to_lowercase();
    match road_type.as_str() {
        "street" => "arterial".to_string(),
        "freeway hov lane" => "dedicated-hov-link".to_string(),
        "off ramp" => "off-ramp".to_string(),
        "on ramp" => "on-ramp".to_string(),
        "light rail track" => "railroad link".to_string(),
        "freeway connector" => "freeway".to_string(),
        _ => road_type,
    }
}

/// Build the link/node inventory and status sections for `snapshot`.
///
/// # Errors
/// `InvalidInput` if a section references an unknown junction, has no lanes,
/// or lacks an endpoint junction while also having an empty polyline.
pub fn build_document(
    snapshot: &NetworkSnapshot,
    settings: &ExportSettings,
    updated: &UpdateTime,
) -> CorrectionResult<TmddDocument> {
    let junctions: HashMap<u64, &JunctionRecord> =
        snapshot.junctions.iter().map(|j| (j.id, j)).collect();
    let mut dummy_ids = DummyIdAllocator::new();
    let organization = json!({"organization-id": settings.organization_id});

    let mut links = Vec::with_capacity(snapshot.sections.len());
    let mut link_status = Vec::with_capacity(snapshot.sections.len());
    for section in &snapshot.sections {
        links.push(build_link(section, &junctions, settings, updated, &mut dummy_ids)?);
        link_status.push(build_link_status(section, settings, updated));
    }

    let nodes = snapshot
        .junctions
        .iter()
        .map(|j| build_node(j, settings, updated))
        .collect();
    let node_status: Vec<Value> = snapshot
        .junctions
        .iter()
        .map(|j| build_node_status(j, settings, updated))
        .collect();

    let mut extra = Map::new();
    extra.insert(
        "LinkStatus".to_string(),
        json!({"organization-information": organization, "link-status-list": link_status}),
    );
    extra.insert(
        "NodeStatus".to_string(),
        json!({"organization-information": organization, "node-status-list": node_status}),
    );

    Ok(TmddDocument {
        link_inventory: LinkInventory {
            links,
            extra: attributes([("organization-information", organization.clone())]),
        },
        node_inventory: NodeInventory {
            nodes,
            extra: attributes([("organization-information", organization)]),
        },
        extra,
    })
}

fn build_link(
    section: &SectionRecord,
    junctions: &HashMap<u64, &JunctionRecord>,
    settings: &ExportSettings,
    updated: &UpdateTime,
    dummy_ids: &mut DummyIdAllocator,
) -> CorrectionResult<LinkInventoryElement> {
    let length = section
        .lane_lengths
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| CorrectionError::invalid(format!("section {} has no lanes", section.id)))?;

    let lookup = |id: u64| {
        junctions.get(&id).copied().ok_or_else(|| {
            CorrectionError::invalid(format!(
                "section {} references unknown junction {id}",
                section.id
            ))
        })
    };
    let missing_endpoint = || {
        CorrectionError::invalid(format!(
            "section {} has a missing endpoint junction and an empty polyline",
            section.id
        ))
    };

    let (begin_id, begin_location, jurisdiction) = match section.origin {
        Some(id) => {
            let junction = lookup(id)?;
            let jurisdiction = junction
                .jurisdiction
                .clone()
                .unwrap_or_else(|| NO_JURISDICTION.to_string());
            (id.to_string(), junction.position, Some(jurisdiction))
        }
        None => {
            let first = section.polyline.first().ok_or_else(missing_endpoint)?;
            (dummy_ids.allocate(), *first, None)
        }
    };
    let (end_id, end_location) = match section.destination {
        Some(id) => (id.to_string(), lookup(id)?.position),
        None => {
            let last = section.polyline.last().ok_or_else(missing_endpoint)?;
            (dummy_ids.allocate(), *last)
        }
    };

    let mut geometry = Vec::with_capacity(section.polyline.len() + 2);
    geometry.push(begin_location);
    geometry.extend_from_slice(&section.polyline);
    geometry.push(end_location);

    let mut attrs = attributes([
        ("network-id", settings.network_id.clone().into()),
        ("network-name", settings.network_name.clone().into()),
        ("link-id", section.id.to_string().into()),
        ("link-name", section.name.clone().into()),
        ("link-type", tmdd_link_type(&section.road_type).into()),
        ("link-capacity", (section.capacity as i64).into()),
        ("link-length", length.into()),
        ("link-begin-node-id", begin_id.into()),
    ]);
    if let Some(jurisdiction) = jurisdiction {
        attrs.insert("link-jurisdiction".to_string(), jurisdiction.into());
    }
    attrs.extend(attributes([
        ("link-end-node-id", end_id.into()),
        ("link-speed-limit", (section.speed_kmh * MPH_PER_KMH).into()),
        ("link-speed-limit-units", "miles per hour".into()),
        ("last-update-time", updated.to_value()),
    ]));

    Ok(LinkInventoryElement {
        begin_location,
        end_location,
        geometry,
        attributes: attrs,
    })
}

fn build_link_status(
    section: &SectionRecord,
    settings: &ExportSettings,
    updated: &UpdateTime,
) -> Value {
    json!({
        "network-id": settings.network_id,
        "network-name": settings.network_name,
        "link-id": section.id.to_string(),
        "link-name": section.name,
        "link-status": NO_DETERMINATION,
        "last-update-time": updated.to_value(),
        "link-lanes-count": section.full_lanes,
    })
}

fn build_node(
    junction: &JunctionRecord,
    settings: &ExportSettings,
    updated: &UpdateTime,
) -> NodeInventoryElement {
    NodeInventoryElement {
        location: junction.position,
        attributes: attributes([
            ("network-id", settings.network_id.clone().into()),
            ("network-name", settings.network_name.clone().into()),
            ("node-id", junction.id.to_string().into()),
            ("node-name", junction.name.clone().into()),
            ("last-update-time", updated.to_value()),
        ]),
    }
}

fn build_node_status(
    junction: &JunctionRecord,
    settings: &ExportSettings,
    updated: &UpdateTime,
) -> Value {
    json!({
        "network-id": settings.network_id,
        "network-name": settings.network_name,
        "node-id": junction.id.to_string(),
        "node-name": junction.name,
        "last-update-time": updated.to_value(),
        "node-status": NO_DETERMINATION,
    })
}

fn attributes<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExportSettings {
        ExportSettings {
            organization_id: "PATH Connected Corridors".to_string(),
            network_id: "2018-06-14a".to_string(),
            network_name: "I-210 Pilot".to_string(),
        }
    }

    fn updated() -> UpdateTime {
        UpdateTime {
            date: "2018-06-14".to_string(),
            time: "10:00:00.000000".to_string(),
            offset: "-8".to_string(),
        }
    }

    fn junction(id: u64, lon: f64, lat: f64) -> JunctionRecord {
        JunctionRecord {
            id,
            name: format!("J{id}"),
            position: GeoLocation::new(lon, lat),
            jurisdiction: None,
        }
    }

    fn section(id: u64, origin: Option<u64>, destination: Option<u64>) -> SectionRecord {
        SectionRecord {
            id,
            name: format!("S{id}"),
            road_type: "Street".to_string(),
            capacity: 1800.7,
            lane_lengths: vec![120.0, 125.5],
            speed_kmh: 100.0,
            full_lanes: 2,
            polyline: vec![GeoLocation::new(0.1, 0.1), GeoLocation::new(0.2, 0.2)],
            origin,
            destination,
        }
    }

    fn snapshot() -> NetworkSnapshot {
        let mut pasadena = junction(1, 0.0, 0.0);
        pasadena.jurisdiction = Some("Pasadena".to_string());
        NetworkSnapshot {
            junctions: vec![pasadena, junction(2, 1.0, 1.0)],
            sections: vec![section(10, Some(1), Some(2)), section(11, None, None)],
        }
    }

    #[test]
    fn test_build_document_links() {
        let doc = build_document(&snapshot(), &settings(), &updated()).unwrap();
        let links = &doc.link_inventory.links;
        assert_eq!(links.len(), 2);

        let full = &links[0];
        assert_eq!(full.begin_location, GeoLocation::new(0.0, 0.0));
        assert_eq!(full.end_location, GeoLocation::new(1.0, 1.0));
        assert_eq!(full.geometry.len(), 4);
        assert_eq!(full.geometry[0], full.begin_location);
        assert_eq!(full.geometry[3], full.end_location);
        assert_eq!(full.attributes["link-type"], "arterial");
        assert_eq!(full.attributes["link-capacity"], 1800);
        assert_eq!(full.attributes["link-length"], 125.5);
        assert_eq!(full.attributes["link-jurisdiction"], "Pasadena");
        assert_eq!(full.attributes["link-begin-node-id"], "1");
        let speed = full.attributes["link-speed-limit"].as_f64().unwrap();
        assert!((speed - 62.137119).abs() < 1e-9);

        let dangling = &links[1];
        assert_eq!(dangling.attributes["link-begin-node-id"], "dummy1");
        assert_eq!(dangling.attributes["link-end-node-id"], "dummy2");
        assert_eq!(dangling.begin_location, GeoLocation::new(0.1, 0.1));
        assert_eq!(dangling.end_location, GeoLocation::new(0.2, 0.2));
        assert_eq!(dangling.geometry.len(), 4);
        assert!(!dangling.attributes.contains_key("link-jurisdiction"));
    }

    #[test]
    fn test_build_document_nodes_and_status() {
        let doc = build_document(&snapshot(), &settings(), &updated()).unwrap();

        assert_eq!(doc.node_inventory.nodes.len(), 2);
        assert_eq!(doc.node_inventory.nodes[1].attributes["node-id"], "2");
        assert_eq!(
            doc.node_inventory.nodes[0].attributes["last-update-time"]["offset"],
            "-8"
        );

        let link_status = &doc.extra["LinkStatus"]["link-status-list"];
        assert_eq!(link_status[0]["link-status"], "no determination");
        assert_eq!(link_status[0]["link-lanes-count"], 2);
        let node_status = &doc.extra["NodeStatus"]["node-status-list"];
        assert_eq!(node_status.as_array().unwrap().len(), 2);
        assert_eq!(
            doc.extra["NodeStatus"]["organization-information"]["organization-id"],
            "PATH Connected Corridors"
        );
    }

    #[test]
    fn test_dummy_ids_restart_per_build() {
        let first = build_document(&snapshot(), &settings(), &updated()).unwrap();
        let second = build_document(&snapshot(), &settings(), &updated()).unwrap();
        assert_eq!(
            first.link_inventory.links[1].attributes["link-begin-node-id"],
            second.link_inventory.links[1].attributes["link-begin-node-id"]
        );
    }

    #[test]
    fn test_build_document_rejects_bad_sections() {
        let mut snap = snapshot();
        snap.sections[0].origin = Some(99);
        assert!(matches!(
            build_document(&snap, &settings(), &updated()),
            Err(CorrectionError::InvalidInput(_))
        ));

        let mut snap = snapshot();
        snap.sections[1].polyline.clear();
        assert!(build_document(&snap, &settings(), &updated()).is_err());

        let mut snap = snapshot();
        snap.sections[0].lane_lengths.clear();
        assert!(build_document(&snap, &settings(), &updated()).is_err());
    }

    #[test]
    fn test_tmdd_link_type() {
        assert_eq!(tmdd_link_type("Freeway HOV Lane"), "dedicated-hov-link");
        assert_eq!(tmdd_link_type("On Ramp"), "on-ramp");
        assert_eq!(tmdd_link_type("Freeway"), "freeway");
        assert_eq!(tmdd_link_type("arterial"), "arterial");
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "junctions": [{"id": 1, "position": {"longitude": 0.5, "latitude": 0.5}}],
            "sections": [{
                "id": 3, "road_type": "on ramp", "capacity": 900, "lane_lengths": [50.0],
                "speed_kmh": 60, "full_lanes": 1,
                "polyline": [{"longitude": 0.6, "latitude": 0.6}],
                "origin": 1
            }]
        }"#;
        let snap: NetworkSnapshot = serde_json::from_str(json).unwrap();
        let doc = build_document(&snap, &settings(), &updated()).unwrap();
        assert_eq!(doc.link_inventory.links[0].attributes["link-end-node-id"], "dummy1");
        assert_eq!(
            doc.link_inventory.links[0].attributes["link-jurisdiction"],
            "Data not provided"
        );
    }

    #[test]
    fn test_update_time_now_format() {
        let t = UpdateTime::now("-8");
        assert_eq!(t.date.len(), 10);
        assert_eq!(t.offset, "-8");
    }
}
