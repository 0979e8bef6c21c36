//! Progression-order packet sequencing (spec.md §4.1/§4.6).
//!
//! A packet is identified by the tuple `(layer, resolution, component,
//! precinct)`. The five progression orders are the same four-level nested
//! loop in different orders (JPEG 2000 Part 1 Annex H); this module
//! enumerates the tuple sequence for a tile given its per-resolution
//! precinct counts, without touching any packet bytes itself.
//!
//! Precinct counts are allowed to vary per `(component, resolution)` pair
//! (different components can have different precinct grids at the same
//! resolution under explicit precinct partitioning); resolution/position-
//! major orders (RPCL/PCRL) iterate the precinct index up to the largest
//! grid at that resolution across all components and skip indices that
//! don't exist for a given component, matching the standard's "precinct
//! that does not exist for a component is skipped" rule.

use crate::markers::ProgressionOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketId {
    pub layer: u32,
    pub resolution: u32,
    pub component: u32,
    pub precinct: u32,
}

/// Per-tile shape needed to enumerate packets: number of layers, number of
/// resolutions (shared across components, since `num_decompositions` is a
/// per-component COD/COC value but this core does not special-case
/// component-varying decomposition counts), number of components, and a
/// `[component][resolution] -> precinct_count` table.
pub struct TileShape {
    pub num_layers: u32,
    pub num_resolutions: u32,
    pub num_components: u32,
    pub precinct_counts: Vec<Vec<u32>>,
}

impl TileShape {
    fn precincts_at(&self, component: u32, resolution: u32) -> u32 {
        self.precinct_counts[component as usize][resolution as usize]
    }

    fn max_precincts_at(&self, resolution: u32) -> u32 {
        (0..self.num_components)
            .map(|c| self.precincts_at(c, resolution))
            .max()
            .unwrap_or(0)
    }
}

/// Enumerates every packet in `order` for `shape`.
pub fn enumerate_packets(order: ProgressionOrder, shape: &TileShape) -> Vec<PacketId> {
    match order {
        ProgressionOrder::Lrcp => enumerate_lrcp(shape),
        ProgressionOrder::Rlcp => enumerate_rlcp(shape),
        ProgressionOrder::Rpcl => enumerate_rpcl(shape),
        ProgressionOrder::Pcrl => enumerate_pcrl(shape),
        ProgressionOrder::Cprl => enumerate_cprl(shape),
    }
}

fn enumerate_lrcp(shape: &TileShape) -> Vec<PacketId> {
    let mut out = Vec::new();
    for layer in 0..shape.num_layers {
        for resolution in 0..shape.num_resolutions {
            for component in 0..shape.num_components {
                for precinct in 0..shape.precincts_at(component, resolution) {
                    out.push(PacketId { layer, resolution, component, precinct });
                }
            }
        }
    }
    out
}

fn enumerate_rlcp(shape: &TileShape) -> Vec<PacketId> {
    let mut out = Vec::new();
    for resolution in 0..shape.num_resolutions {
        for layer in 0..shape.num_layers {
            for component in 0..shape.num_components {
                for precinct in 0..shape.precincts_at(component, resolution) {
                    out.push(PacketId { layer, resolution, component, precinct });
                }
            }
        }
    }
    out
}

fn enumerate_rpcl(shape: &TileShape) -> Vec<PacketId> {
    let mut out = Vec::new();
    for resolution in 0..shape.num_resolutions {
        let max_precincts = shape.max_precincts_at(resolution);
        for precinct in 0..max_precincts {
            for component in 0..shape.num_components {
                if precinct >= shape.precincts_at(component, resolution) {
                    continue;
                }
                for layer in 0..shape.num_layers {
                    out.push(PacketId { layer, resolution, component, precinct });
                }
            }
        }
    }
    out
}

fn enumerate_pcrl(shape: &TileShape) -> Vec<PacketId> {
    let mut out = Vec::new();
    let max_precincts = (0..shape.num_resolutions)
        .map(|r| shape.max_precincts_at(r))
        .max()
        .unwrap_or(0);
    for precinct in 0..max_precincts {
        for component in 0..shape.num_components {
            for resolution in 0..shape.num_resolutions {
                if precinct >= shape.precincts_at(component, resolution) {
                    continue;
                }
                for layer in 0..shape.num_layers {
                    out.push(PacketId { layer, resolution, component, precinct });
                }
            }
        }
    }
    out
}

fn enumerate_cprl(shape: &TileShape) -> Vec<PacketId> {
    let mut out = Vec::new();
    for component in 0..shape.num_components {
        let max_precincts = (0..shape.num_resolutions)
            .map(|r| shape.precincts_at(component, r))
            .max()
            .unwrap_or(0);
        for precinct in 0..max_precincts {
            for resolution in 0..shape.num_resolutions {
                if precinct >= shape.precincts_at(component, resolution) {
                    continue;
                }
                for layer in 0..shape.num_layers {
                    out.push(PacketId { layer, resolution, component, precinct });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_shape() -> TileShape {
        TileShape {
            num_layers: 2,
            num_resolutions: 3,
            num_components: 3,
            precinct_counts: vec![vec![1, 1, 1]; 3],
        }
    }

    #[test]
    fn every_order_enumerates_the_same_packet_count() {
        let shape = uniform_shape();
        let expected = (shape.num_layers * shape.num_resolutions * shape.num_components) as usize;
        for order in [
            ProgressionOrder::Lrcp,
            ProgressionOrder::Rlcp,
            ProgressionOrder::Rpcl,
            ProgressionOrder::Pcrl,
            ProgressionOrder::Cprl,
        ] {
            let packets = enumerate_packets(order, &shape);
            assert_eq!(packets.len(), expected, "{order:?}");
        }
    }

    #[test]
    fn lrcp_varies_layer_slowest() {
        let shape = uniform_shape();
        let packets = enumerate_packets(ProgressionOrder::Lrcp, &shape);
        assert_eq!(packets[0].layer, 0);
        assert_eq!(packets.last().unwrap().layer, 1);
    }

    #[test]
    fn rpcl_skips_precincts_missing_for_a_component() {
        let mut shape = uniform_shape();
        shape.precinct_counts[1] = vec![1, 2, 1]; // component 1 has 2 precincts at resolution 1
        shape.precinct_counts[0] = vec![1, 1, 1];
        shape.precinct_counts[2] = vec![1, 1, 1];
        let packets = enumerate_packets(ProgressionOrder::Rpcl, &shape);
        let at_res1_precinct1: Vec<_> = packets
            .iter()
            .filter(|p| p.resolution == 1 && p.precinct == 1)
            .collect();
        assert_eq!(at_res1_precinct1.len(), shape.num_layers as usize);
        assert!(at_res1_precinct1.iter().all(|p| p.component == 1));
    }
}
