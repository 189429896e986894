use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::domain::{Composition, Species};
use crate::core::error::{NetworkError, NetworkResult};

/// Upper bound on the number of phase-space axes any material may declare.
pub const MAX_AXES: usize = 4;

/// Signed integer coordinate in phase space. Unused trailing axes are 0.
pub type Point = [i64; MAX_AXES];

/// Per-axis split flags returned by a material's `refine`.
pub type AxisMask = [bool; MAX_AXES];

// --- Phase Space ---

/// One phase-space axis.
///
/// A folded axis carries two mutually annihilating species: positive
/// coordinates count `positive`, negative coordinates count `negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub positive: Species,
    pub negative: Option<Species>,
}

impl Axis {
    pub fn plain(species: Species) -> Self {
        Self {
            positive: species,
            negative: None,
        }
    }

    pub fn folded(positive: Species, negative: Species) -> Self {
        Self {
            positive,
            negative: Some(negative),
        }
    }
}

/// The ordered axis set of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpace {
    axes: Vec<Axis>,
}

impl PhaseSpace {
    pub fn new(axes: Vec<Axis>) -> NetworkResult<Self> {
        if axes.is_empty() || axes.len() > MAX_AXES {
            return Err(NetworkError::Config(format!(
                "phase space needs 1..={} axes, got {}",
                MAX_AXES,
                axes.len()
            )));
        }
        let mut seen = [false; crate::core::domain::NUM_SPECIES];
        for species in axes
            .iter()
            .flat_map(|a| std::iter::once(a.positive).chain(a.negative))
        {
            if std::mem::replace(&mut seen[species.index()], true) {
                return Err(NetworkError::Config(format!(
                    "species {} appears on more than one axis",
                    species
                )));
            }
        }
        Ok(Self { axes })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis index and orientation (+1 / -1) carrying `species`.
    pub fn locate(&self, species: Species) -> Option<(usize, i64)> {
        self.axes.iter().enumerate().find_map(|(a, axis)| {
            if axis.positive == species {
                Some((a, 1))
            } else if axis.negative == Some(species) {
                Some((a, -1))
            } else {
                None
            }
        })
    }

    /// Signed coordinates of a composition.
    ///
    /// Fails when the composition uses a species this space does not track,
    /// or puts both species of a folded axis in the same cluster.
    pub fn to_point(&self, composition: &Composition) -> NetworkResult<Point> {
        let mut point = [0i64; MAX_AXES];
        let mut filled = [false; MAX_AXES];
        for (species, n) in composition.iter() {
            let (a, sign) = self.locate(species).ok_or_else(|| {
                NetworkError::InvalidComposition(format!(
                    "{} is not tracked in this phase space",
                    composition
                ))
            })?;
            if std::mem::replace(&mut filled[a], true) {
                return Err(NetworkError::InvalidComposition(format!(
                    "{} mixes both species of a folded axis",
                    composition
                )));
            }
            point[a] = sign * i64::from(n);
        }
        Ok(point)
    }

    pub fn to_composition(&self, point: &Point) -> Composition {
        let mut composition = Composition::new();
        for (a, axis) in self.axes.iter().enumerate() {
            let x = point[a];
            let species = match (x > 0, axis.negative) {
                (true, _) => axis.positive,
                (false, Some(negative)) if x < 0 => negative,
                _ => continue,
            };
            composition = composition.with(species, x.unsigned_abs() as u32);
        }
        composition
    }
}

// --- Regions ---

/// Half-open integer box `[lo, hi)` in phase space.
///
/// **Invariant**: `lo[a] < hi[a]` on every axis of a non-empty region;
/// axes beyond the material's dimension are `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub lo: Point,
    pub hi: Point,
}

impl Region {
    pub fn new(lo: Point, hi: Point) -> Self {
        Self { lo, hi }
    }

    /// Box holding exactly one point.
    pub fn unit(point: Point) -> Self {
        let mut hi = point;
        for h in hi.iter_mut() {
            *h += 1;
        }
        Self { lo: point, hi }
    }

    /// Builds a region from inclusive per-axis bounds for the first `bounds.len()` axes.
    pub fn from_inclusive(bounds: &[(i64, i64)]) -> Self {
        let mut lo = [0; MAX_AXES];
        let mut hi = [1; MAX_AXES];
        for (a, &(l, h)) in bounds.iter().enumerate().take(MAX_AXES) {
            lo[a] = l;
            hi[a] = h + 1;
        }
        Self { lo, hi }
    }

    #[inline]
    pub fn width(&self, axis: usize) -> i64 {
        self.hi[axis] - self.lo[axis]
    }

    pub fn volume(&self) -> i64 {
        (0..MAX_AXES).map(|a| self.width(a).max(0)).product()
    }

    pub fn is_empty(&self) -> bool {
        (0..MAX_AXES).any(|a| self.width(a) <= 0)
    }

    pub fn is_unit(&self) -> bool {
        (0..MAX_AXES).all(|a| self.width(a) == 1)
    }

    /// Axes spanning more than one value.
    pub fn grouped_axes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_AXES).filter(move |&a| self.width(a) > 1)
    }

    pub fn contains(&self, point: &Point) -> bool {
        (0..MAX_AXES).all(|a| self.lo[a] <= point[a] && point[a] < self.hi[a])
    }

    pub fn intersects(&self, other: &Region) -> bool {
        (0..MAX_AXES).all(|a| self.lo[a].max(other.lo[a]) < self.hi[a].min(other.hi[a]))
    }

    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let mut out = *self;
        for a in 0..MAX_AXES {
            out.lo[a] = self.lo[a].max(other.lo[a]);
            out.hi[a] = self.hi[a].min(other.hi[a]);
            if out.lo[a] >= out.hi[a] {
                return None;
            }
        }
        Some(out)
    }

    /// Smallest box holding both.
    pub fn union(&self, other: &Region) -> Region {
        let mut out = *self;
        for a in 0..MAX_AXES {
            out.lo[a] = self.lo[a].min(other.lo[a]);
            out.hi[a] = self.hi[a].max(other.hi[a]);
        }
        out
    }

    pub fn shifted(&self, offset: &Point) -> Region {
        let mut out = *self;
        for a in 0..MAX_AXES {
            out.lo[a] += offset[a];
            out.hi[a] += offset[a];
        }
        out
    }

    /// Mean coordinate of the points in the box.
    pub fn centroid(&self) -> [f64; MAX_AXES] {
        let mut c = [0.0; MAX_AXES];
        for a in 0..MAX_AXES {
            c[a] = (self.lo[a] + self.hi[a] - 1) as f64 * 0.5;
        }
        c
    }

    /// Centroid rounded half-up to the lattice.
    pub fn representative(&self) -> Point {
        let mut p = [0; MAX_AXES];
        for a in 0..MAX_AXES {
            p[a] = (self.lo[a] + self.hi[a]).div_euclid(2);
        }
        p
    }

    /// Halves every masked axis wider than one point.
    ///
    /// Returns the `2^k` children in lexicographic order, or just `self`
    /// when no masked axis can be split.
    pub fn bisect(&self, mask: &AxisMask) -> Vec<Region> {
        let mut children = vec![*self];
        for a in 0..MAX_AXES {
            if !mask[a] || self.width(a) < 2 {
                continue;
            }
            let mid = self.lo[a] + self.width(a) / 2;
            children = children
                .into_iter()
                .flat_map(|r| {
                    let mut low = r;
                    let mut high = r;
                    low.hi[a] = mid;
                    high.lo[a] = mid;
                    [low, high]
                })
                .collect();
        }
        children
    }

    /// Every lattice point, last axis varying fastest.
    pub fn points(&self) -> RegionPoints {
        RegionPoints {
            region: *self,
            next: if self.is_empty() { None } else { Some(self.lo) },
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for a in 0..MAX_AXES {
            if a > 0 {
                f.write_str(",")?;
            }
            if self.width(a) == 1 {
                write!(f, "{}", self.lo[a])?;
            } else {
                write!(f, "{}..{}", self.lo[a], self.hi[a] - 1)?;
            }
        }
        f.write_str("]")
    }
}

pub struct RegionPoints {
    region: Region,
    next: Option<Point>,
}

impl Iterator for RegionPoints {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        let current = self.next?;
        let mut p = current;
        let mut a = MAX_AXES;
        self.next = loop {
            if a == 0 {
                break None;
            }
            a -= 1;
            p[a] += 1;
            if p[a] < self.region.hi[a] {
                break Some(p);
            }
            p[a] = self.region.lo[a];
        };
        Some(current)
    }
}

// --- Bounding Volume Hierarchy ---

const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { start: usize, end: usize },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Region,
    kind: NodeKind,
}

/// Static BVH over disjoint cluster regions.
///
/// Answers "which cluster owns this point" and "which clusters touch this
/// box". Queries use a local stack, so a shared tree is safe to read from
/// many threads.
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    entries: Vec<(Region, usize)>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl RegionTree {
    /// Builds the tree and rejects any pair of overlapping regions.
    pub fn build(entries: Vec<(Region, usize)>) -> NetworkResult<Self> {
        let mut tree = Self {
            entries,
            nodes: Vec::new(),
            root: None,
        };
        if !tree.entries.is_empty() {
            let n = tree.entries.len();
            tree.root = Some(tree.build_node(0, n));
        }

        let mut hits = Vec::new();
        for &(region, id) in &tree.entries {
            hits.clear();
            tree.query(&region, &mut hits);
            if let Some(&other) = hits.iter().find(|&&h| h != id) {
                return Err(NetworkError::DuplicateCluster {
                    composition: format!("cluster {} overlaps cluster {}", id, other),
                    region: region.to_string(),
                });
            }
        }
        Ok(tree)
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let slice = &mut self.entries[start..end];
        let bounds = slice
            .iter()
            .skip(1)
            .fold(slice[0].0, |acc, (r, _)| acc.union(r));

        if end - start <= LEAF_SIZE {
            self.nodes.push(Node {
                bounds,
                kind: NodeKind::Leaf { start, end },
            });
            return self.nodes.len() - 1;
        }

        // Median split on the axis where centroids spread the most
        let key = |r: &Region, a: usize| r.lo[a] + r.hi[a];
        let axis = (0..MAX_AXES)
            .max_by_key(|&a| {
                let (min, max) = slice.iter().fold((i64::MAX, i64::MIN), |(lo, hi), (r, _)| {
                    (lo.min(key(r, a)), hi.max(key(r, a)))
                });
                max - min
            })
            .unwrap_or(0);
        let mid = (end - start) / 2;
        slice.select_nth_unstable_by_key(mid, |(r, id)| (key(r, axis), *id));

        let left = self.build_node(start, start + mid);
        let right = self.build_node(start + mid, end);
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Branch { left, right },
        });
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id of the region containing `point`.
    pub fn find(&self, point: &Point) -> Option<usize> {
        let mut stack = Vec::with_capacity(32);
        stack.extend(self.root);
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.contains(point) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => {
                    let leaf = &self.entries[start..end];
                    if let Some((_, id)) = leaf.iter().find(|(r, _)| r.contains(point)) {
                        return Some(*id);
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        None
    }

    /// Appends the id of every region intersecting `region`.
    pub fn query(&self, region: &Region, out: &mut Vec<usize>) {
        let mut stack = Vec::with_capacity(32);
        stack.extend(self.root);
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.intersects(region) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => out.extend(
                    self.entries[start..end]
                        .iter()
                        .filter(|(r, _)| r.intersects(region))
                        .map(|(_, id)| *id),
                ),
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }
}
