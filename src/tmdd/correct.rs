use rayon::prelude::*;

use super::model::{GeoLocation, LinkInventoryElement, TmddDocument};
use crate::calibration::CorrectionGrid;

/// Counts of what a correction pass touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionSummary {
    pub links: usize,
    pub nodes: usize,
    pub geometry_vertices: usize,
    pub points_corrected: usize,
}

/// Replace every node location, link endpoint and link polyline vertex in `doc`
/// with its corrected coordinate.
///
/// List order and length are preserved and nothing else in the document is
/// touched. With `parallel` set, links and nodes are corrected on the rayon
/// pool; the result is identical either way.
pub fn correct_document(
    doc: &mut TmddDocument,
    grid: &CorrectionGrid,
    parallel: bool,
) -> CorrectionSummary {
    let links = &mut doc.link_inventory.links;
    let nodes = &mut doc.node_inventory.nodes;

    if parallel {
        links.par_iter_mut().for_each(|link| correct_link(link, grid));
        nodes
            .par_iter_mut()
            .for_each(|node| correct_location(&mut node.location, grid));
    } else {
        links.iter_mut().for_each(|link| correct_link(link, grid));
        nodes
            .iter_mut()
            .for_each(|node| correct_location(&mut node.location, grid));
    }

    let geometry_vertices: usize = links.iter().map(|l| l.geometry.len()).sum();
    CorrectionSummary {
        links: links.len(),
        nodes: nodes.len(),
        geometry_vertices,
        points_corrected: 2 * links.len() + geometry_vertices + nodes.len(),
    }
}

fn correct_link(link: &mut LinkInventoryElement, grid: &CorrectionGrid) {
    correct_location(&mut link.begin_location, grid);
    correct_location(&mut link.end_location, grid);
    for vertex in &mut link.geometry {
        correct_location(vertex, grid);
    }
}

fn correct_location(location: &mut GeoLocation, grid: &CorrectionGrid) {
    *location = grid.correct((*location).into()).into();
}
