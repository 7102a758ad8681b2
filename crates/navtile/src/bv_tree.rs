//! Bounding volume tree over the ground polygons of a tile
//!
//! Bounds are stored quantized to the source grid: x and z are grid cells,
//! y is rescaled from cell heights into cell sizes so all three axes share
//! one unit. Nodes are laid out depth first. A node with `i >= 0` is a leaf
//! holding polygon `i`; an internal node stores `-escape`, the number of
//! nodes in its subtree, so a stackless traversal can skip it.

use navtile_source::PolyMesh;

/// Node of a [`BvTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BvNode {
    /// Quantized bounding box min coordinates
    pub bmin: [u16; 3],
    /// Quantized bounding box max coordinates
    pub bmax: [u16; 3],
    /// Polygon index for leaves, negative escape offset for internal nodes
    pub i: i32,
}

impl BvNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.i >= 0
    }

    /// Polygon index of a leaf
    #[inline]
    pub fn poly_index(&self) -> Option<usize> {
        self.is_leaf().then_some(self.i as usize)
    }

    /// Number of nodes to skip to leave this node's subtree
    #[inline]
    pub fn escape_offset(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.i.unsigned_abs() as usize
        }
    }

    /// Checks if two quantized boxes overlap
    pub fn overlaps(&self, bmin: &[u16; 3], bmax: &[u16; 3]) -> bool {
        !(self.bmin[0] > bmax[0]
            || self.bmax[0] < bmin[0]
            || self.bmin[1] > bmax[1]
            || self.bmax[1] < bmin[1]
            || self.bmin[2] > bmax[2]
            || self.bmax[2] < bmin[2])
    }
}

#[derive(Debug, Clone, Copy)]
struct BvItem {
    bmin: [u16; 3],
    bmax: [u16; 3],
    i: usize,
}

/// Bounding volume tree in depth-first node order
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BvTree {
    nodes: Vec<BvNode>,
}

impl BvTree {
    /// Builds the tree over every polygon of `mesh`
    ///
    /// `cs` and `ch` are the grid cell size and height used to bring the
    /// vertical axis into horizontal grid units.
    pub fn build(mesh: &PolyMesh, cs: f32, ch: f32) -> Self {
        let mut items: Vec<BvItem> = (0..mesh.npolys)
            .map(|i| Self::poly_item(mesh, i, cs, ch))
            .collect();

        let mut nodes = Vec::with_capacity(Self::node_count_for(items.len()));
        if !items.is_empty() {
            subdivide(&mut items, &mut nodes);
        }

        Self { nodes }
    }

    /// Number of nodes a tree over `poly_count` polygons holds
    pub fn node_count_for(poly_count: usize) -> usize {
        (poly_count * 2).saturating_sub(1)
    }

    fn poly_item(mesh: &PolyMesh, i: usize, cs: f32, ch: f32) -> BvItem {
        let verts = mesh.poly_verts(i);
        let first = mesh.vertex(verts[0] as usize);
        let mut bmin = first;
        let mut bmax = first;
        for &v in &verts[1..] {
            let p = mesh.vertex(v as usize);
            for k in 0..3 {
                bmin[k] = bmin[k].min(p[k]);
                bmax[k] = bmax[k].max(p[k]);
            }
        }

        // Remap y
        bmin[1] = (bmin[1] as f32 * ch / cs).floor() as u16;
        bmax[1] = (bmax[1] as f32 * ch / cs).ceil() as u16;

        BvItem { bmin, bmax, i }
    }

    /// Nodes in depth-first order
    pub fn nodes(&self) -> &[BvNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root node
    pub fn root(&self) -> Option<&BvNode> {
        self.nodes.first()
    }

    /// Leaf nodes in tree order
    pub fn leaves(&self) -> impl Iterator<Item = &BvNode> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }
}

fn calc_extents(items: &[BvItem]) -> ([u16; 3], [u16; 3]) {
    let mut bmin = items[0].bmin;
    let mut bmax = items[0].bmax;
    for it in &items[1..] {
        for k in 0..3 {
            bmin[k] = bmin[k].min(it.bmin[k]);
            bmax[k] = bmax[k].max(it.bmax[k]);
        }
    }
    (bmin, bmax)
}

fn longest_axis(x: u16, y: u16, z: u16) -> usize {
    let mut axis = 0;
    let mut max_val = x;
    if y > max_val {
        axis = 1;
        max_val = y;
    }
    if z > max_val {
        axis = 2;
    }
    axis
}

fn subdivide(items: &mut [BvItem], nodes: &mut Vec<BvNode>) {
    let icur = nodes.len();

    if let [item] = items {
        nodes.push(BvNode {
            bmin: item.bmin,
            bmax: item.bmax,
            i: item.i as i32,
        });
        return;
    }

    let (bmin, bmax) = calc_extents(items);
    nodes.push(BvNode { bmin, bmax, i: 0 });

    let axis = longest_axis(
        bmax[0] - bmin[0],
        bmax[1] - bmin[1],
        bmax[2] - bmin[2],
    );
    items.sort_by_key(|it| it.bmin[axis]);

    let split = items.len() / 2;
    let (left, right) = items.split_at_mut(split);
    subdivide(left, nodes);
    subdivide(right, nodes);

    let escape = (nodes.len() - icur) as i32;
    nodes[icur].i = -escape;
}
