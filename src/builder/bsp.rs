// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Binary space partitioning of a polygon soup.
//!
//! The tree is built without clipping: a polygon that straddles a splitting plane is kept whole
//! and sent to the front side, as are polygons lying in the plane. A node whose polygons all fall
//! on one side becomes a leaf holding them, so every polygon ends up in exactly one leaf.
//!
//! Nodes and polygons live in flat arenas and refer to each other by index. Both building and
//! walking the tree use an explicit stack, so deep trees cannot overflow the call stack.

use crate::{
    builder::{BuildConfig, SplitMode},
    common::math::{Hyperplane, PolygonSide},
    dif::types::BoxF,
};

use cgmath::{Vector2, Vector3};

/// Score assigned before any candidate splitter has been tried.
const INITIAL_SPLITTER_SCORE: u64 = 1_000_000;

/// Weight of each straddling polygon when scoring a candidate splitter.
const SPANNING_WEIGHT: u64 = 3;

/// A triangle prepared for partitioning.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub points: [Vector3<f32>; 3],
    pub uvs: [Vector2<f32>; 3],
    pub material: u32,
    /// The plane through the first point along the polygon's normal.
    pub plane: Hyperplane,
}

impl Polygon {
    pub fn classify(&self, plane: &Hyperplane) -> PolygonSide {
        plane.classify(self.points.iter())
    }
}

pub type NodeId = usize;
pub type PolygonId = usize;

#[derive(Clone, Debug, PartialEq)]
pub enum BspTreeNode {
    Leaf { polygons: Vec<PolygonId> },
    Split { plane: Hyperplane, front: NodeId, back: NodeId },
}

#[derive(Debug)]
pub struct BspTree {
    nodes: Vec<BspTreeNode>,
}

struct Job {
    node: NodeId,
    polygons: Vec<PolygonId>,
    depth: usize,
}

impl BspTree {
    /// Partitions `polygons`. The root of the result is node 0.
    pub fn build(polygons: &[Polygon], config: &BuildConfig) -> BspTree {
        let mut tree = BspTree {
            nodes: vec![BspTreeNode::Leaf {
                polygons: Vec::new(),
            }],
        };
        let mut used = vec![false; polygons.len()];

        let mut jobs = vec![Job {
            node: 0,
            polygons: (0..polygons.len()).collect(),
            depth: 1,
        }];

        while let Some(job) = jobs.pop() {
            let mode = match config.split_mode {
                SplitMode::Fast if job.depth > config.fast_depth_limit => SplitMode::Quality,
                m => m,
            };

            let splitter = match mode {
                SplitMode::Quality => quality_splitter(polygons, &job.polygons, &mut used),
                SplitMode::Fast => fast_splitter(polygons, &job.polygons),
            };

            let splitter = match splitter {
                Some(p) => p,
                None => {
                    tree.nodes[job.node] = BspTreeNode::Leaf {
                        polygons: job.polygons,
                    };
                    continue;
                }
            };

            let (plane, front, back) = partition(polygons, &job.polygons, splitter);
            if back.is_empty() {
                tree.nodes[job.node] = BspTreeNode::Leaf { polygons: front };
                continue;
            }

            let front_id = tree.alloc();
            let back_id = tree.alloc();
            tree.nodes[job.node] = BspTreeNode::Split {
                plane,
                front: front_id,
                back: back_id,
            };

            jobs.push(Job {
                node: back_id,
                polygons: back,
                depth: job.depth + 1,
            });
            jobs.push(Job {
                node: front_id,
                polygons: front,
                depth: job.depth + 1,
            });
        }

        debug!(
            "BSP of {} polygons: {} nodes, {} leaves, depth {}",
            polygons.len(),
            tree.nodes.len(),
            tree.leaf_count(),
            tree.depth()
        );

        tree
    }

    fn alloc(&mut self) -> NodeId {
        self.nodes.push(BspTreeNode::Leaf {
            polygons: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &BspTreeNode {
        &self.nodes[id]
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| match n {
                BspTreeNode::Leaf { .. } => true,
                _ => false,
            })
            .count()
    }

    /// The number of nodes on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root(), 1)];
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            if let BspTreeNode::Split { front, back, .. } = self.nodes[id] {
                stack.push((back, depth + 1));
                stack.push((front, depth + 1));
            }
        }
        max
    }

    /// Visits every node in pre-order, front subtrees before back subtrees.
    pub fn pre_order(&self) -> PreOrder {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Collects the polygons of every leaf in pre-order.
    ///
    /// The polygons of each leaf come out contiguously, in the same order the leaves appear in
    /// `pre_order`.
    pub fn gather(&self) -> Vec<PolygonId> {
        let mut out = Vec::new();
        for (_, node) in self.pre_order() {
            if let BspTreeNode::Leaf { polygons } = node {
                out.extend_from_slice(polygons);
            }
        }
        out
    }
}

pub struct PreOrder<'a> {
    tree: &'a BspTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (NodeId, &'a BspTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        if let BspTreeNode::Split { front, back, .. } = node {
            self.stack.push(*back);
            self.stack.push(*front);
        }
        Some((id, node))
    }
}

/// Sorts `set` to the sides of `plane`, returning the plane actually used and the two sides.
///
/// Polygons on the plane or straddling it go to the front. If that leaves the front empty, the
/// sides are swapped and the plane negated, so the front is only ever empty for an empty set.
fn partition(
    polygons: &[Polygon],
    set: &[PolygonId],
    plane: Hyperplane,
) -> (Hyperplane, Vec<PolygonId>, Vec<PolygonId>) {
    let mut front = Vec::new();
    let mut back = Vec::new();
    for &id in set.iter() {
        match polygons[id].classify(&plane) {
            PolygonSide::Back => back.push(id),
            PolygonSide::Front | PolygonSide::OnPlane | PolygonSide::Spanning => front.push(id),
        }
    }

    if front.is_empty() && !back.is_empty() {
        (-plane, back, front)
    } else {
        (plane, front, back)
    }
}

/// Picks the unused polygon whose plane best balances the set, and marks it used.
///
/// A candidate scores `|front - back| + 3 × spanning` over every polygon in the set. Only a
/// strictly lower score replaces the current best, so ties go to the earliest candidate.
fn quality_splitter(
    polygons: &[Polygon],
    set: &[PolygonId],
    used: &mut [bool],
) -> Option<Hyperplane> {
    let mut best_score = INITIAL_SPLITTER_SCORE;
    let mut best = None;

    for &candidate in set.iter().filter(|&&id| !used[id]) {
        let plane = &polygons[candidate].plane;
        let mut front = 0i64;
        let mut back = 0i64;
        let mut spanning = 0u64;
        for &id in set.iter() {
            match polygons[id].classify(plane) {
                PolygonSide::Front => front += 1,
                PolygonSide::Back => back += 1,
                PolygonSide::Spanning => spanning += 1,
                PolygonSide::OnPlane => (),
            }
        }

        let score = (front - back).abs() as u64 + SPANNING_WEIGHT * spanning;
        if score < best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    let chosen = best?;
    used[chosen] = true;
    Some(polygons[chosen].plane)
}

/// Splits through the center of the set's bounding box, facing down the X axis.
fn fast_splitter(polygons: &[Polygon], set: &[PolygonId]) -> Option<Hyperplane> {
    if set.is_empty() {
        return None;
    }

    let bounds = BoxF::from_points(set.iter().flat_map(|&id| polygons[id].points.iter()));
    Some(Hyperplane::through_point(
        -Vector3::unit_x(),
        bounds.center(),
    ))
}
