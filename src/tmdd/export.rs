//! CSV export of link geometry for plotting a network on a map.

use std::path::Path;

use csv::Writer;

use super::model::TmddDocument;
use crate::error::CorrectionResult;

/// One polyline vertex, tagged with the index of its link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRow {
    pub lat: f64,
    pub lon: f64,
    pub id: usize,
}

/// Flatten every link's polyline into rows, in document order.
pub fn link_geometry_rows(doc: &TmddDocument) -> Vec<GeometryRow> {
    doc.link_inventory
        .links
        .iter()
        .enumerate()
        .flat_map(|(id, link)| {
            link.geometry.iter().map(move |p| GeometryRow {
                lat: p.latitude,
                lon: p.longitude,
                id,
            })
        })
        .collect()
}

/// Write rows to `path` with a `lat,lon,id` header.
pub fn write_geometry_csv(rows: &[GeometryRow], path: &Path) -> CorrectionResult<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["lat", "lon", "id"])?;
    for row in rows {
        writer.write_record(&[row.lat.to_string(), row.lon.to_string(), row.id.to_string()])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdd::model::{
        GeoLocation, LinkInventory, LinkInventoryElement, NodeInventory,
    };
    use serde_json::Map;
    use tempfile::tempdir;

    fn link(points: &[(f64, f64)]) -> LinkInventoryElement {
        let geometry: Vec<_> = points.iter().map(|&(lon, lat)| GeoLocation::new(lon, lat)).collect();
        LinkInventoryElement {
            begin_location: geometry[0],
            end_location: geometry[geometry.len() - 1],
            geometry,
            attributes: Map::new(),
        }
    }

    fn document() -> TmddDocument {
        TmddDocument {
            link_inventory: LinkInventory {
                links: vec![
                    link(&[(-118.0, 34.0), (-118.1, 34.1)]),
                    link(&[(-117.0, 33.0), (-117.5, 33.5), (-117.9, 33.9)]),
                ],
                extra: Map::new(),
            },
            node_inventory: NodeInventory {
                nodes: Vec::new(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    #[test]
    fn test_link_geometry_rows() {
        let rows = link_geometry_rows(&document());

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], GeometryRow { lat: 34.0, lon: -118.0, id: 0 });
        assert_eq!(rows[2].id, 1);
        assert_eq!(rows[4], GeometryRow { lat: 33.9, lon: -117.9, id: 1 });
    }

    #[test]
    fn test_write_geometry_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tmdd.csv");
        write_geometry_csv(&link_geometry_rows(&document()), &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, vec!["lat", "lon", "id"]);
        let records: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 5);
        assert_eq!(&records[1][0], "34.1");
        assert_eq!(&records[1][1], "-118.1");
        assert_eq!(&records[3][2], "1");
    }

    #[test]
    fn test_write_geometry_csv_empty_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_geometry_csv(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "lat,lon,id\n");
    }
}
