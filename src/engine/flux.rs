//! Net reaction flux and its exact partial derivatives at one grid point.
//!
//! For a cluster with state `L` (concentration, plus moments when grouped)
//! row `k` of each record contributes
//!
//! ```text
//! production    +K * c_second * (coefs * L_first)_k
//! combination   -K * c_other  * (coefs * L_grouped)_k
//! dissociation  +K * (coefs * L_parent)_k
//! emission      -K * (coefs * L_self)_k
//! sink          -s * D * L_self,k
//! ```
//!
//! The partials below differentiate exactly these terms, and the sparsity
//! pattern is derived from the same records.

use serde::Serialize;

use crate::core::domain::Cluster;
use crate::core::error::{NetworkError, NetworkResult};
use crate::engine::network::ReactionNetwork;
use crate::engine::overlap::MomentVector;
use crate::engine::rates::RateConstants;
use crate::engine::reactions::ClusterLinks;

// --- Sparsity ---

/// Compressed row storage of the Jacobian's non-zero structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SparsityPattern {
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
}

impl SparsityPattern {
    /// Rows are sorted and deduplicated on the way in.
    pub fn from_rows(rows: Vec<Vec<usize>>) -> Self {
        let mut row_offsets = Vec::with_capacity(rows.len() + 1);
        let mut columns = Vec::new();
        row_offsets.push(0);
        for mut row in rows {
            row.sort_unstable();
            row.dedup();
            columns.extend(row);
            row_offsets.push(columns.len());
        }
        Self {
            row_offsets,
            columns,
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_offsets.len().saturating_sub(1)
    }

    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.columns[self.row_offsets[row]..self.row_offsets[row + 1]]
    }

    /// Index into a values array aligned with `columns`.
    pub fn position(&self, row: usize, column: usize) -> Option<usize> {
        let start = *self.row_offsets.get(row)?;
        let end = *self.row_offsets.get(row + 1)?;
        self.columns[start..end]
            .binary_search(&column)
            .ok()
            .map(|offset| start + offset)
    }

    /// All `(row, column)` entries in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nrows()).flat_map(move |r| self.row(r).iter().map(move |&c| (r, c)))
    }
}

/// The combination operand carrying moments, and the other one.
#[inline]
fn grouped_operand<'a>(this: &'a Cluster, partner: &'a Cluster) -> (&'a Cluster, &'a Cluster) {
    if this.is_super() {
        (this, partner)
    } else {
        (partner, this)
    }
}

/// Columns of every row owned by cluster `id`, read off its reaction records.
pub(crate) fn cluster_connectivity(
    clusters: &[Cluster],
    links: &[ClusterLinks],
    id: usize,
) -> Vec<usize> {
    let this = &clusters[id];
    let slots = |c: &Cluster| c.state_slots().map(|(_, s)| s).collect::<Vec<_>>();
    let mut columns = slots(this);
    let record = &links[id];

    for p in &record.production {
        columns.push(p.second);
        columns.extend(slots(&clusters[p.first]));
    }
    for r in &record.combining {
        let (grouped, other) = grouped_operand(this, &clusters[r.partner]);
        columns.push(other.id);
        columns.extend(slots(grouped));
    }
    for d in &record.dissociating {
        columns.extend(slots(&clusters[d.parent]));
    }
    columns.sort_unstable();
    columns.dedup();
    columns
}

// --- Flux ---

/// State vector of one cluster in its moment basis.
#[inline]
fn gather(cluster: &Cluster, concentrations: &[f64]) -> MomentVector {
    let mut v = MomentVector::zeros();
    for (basis, slot) in cluster.state_slots() {
        v[basis] = concentrations[slot];
    }
    v
}

#[derive(Debug, Clone, Copy)]
struct Terms {
    production: MomentVector,
    combination: MomentVector,
    dissociation: MomentVector,
    emission: MomentVector,
    sink: MomentVector,
}

impl Terms {
    fn zeros() -> Self {
        let z = MomentVector::zeros();
        Self {
            production: z,
            combination: z,
            dissociation: z,
            emission: z,
            sink: z,
        }
    }

    fn total(&self) -> MomentVector {
        self.production + self.combination + self.dissociation + self.emission + self.sink
    }
}

fn cluster_terms(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
    cluster: &Cluster,
) -> Terms {
    let links = network.links(cluster.id);
    let own = gather(cluster, concentrations);
    let mut t = Terms::zeros();

    for p in &links.production {
        let k = rates.rate(p.reaction);
        let first = gather(network.cluster(p.first), concentrations);
        t.production += p.coefs * first * (k * concentrations[p.second]);
    }
    for r in &links.combining {
        let k = rates.rate(r.reaction);
        let (grouped, other) = grouped_operand(cluster, network.cluster(r.partner));
        let lg = gather(grouped, concentrations);
        t.combination -= r.coefs * lg * (k * concentrations[other.id]);
    }
    for d in &links.dissociating {
        let k = rates.rate(d.reaction);
        t.dissociation += d.coefs * gather(network.cluster(d.parent), concentrations) * k;
    }
    for e in &links.emission {
        t.emission -= e.coefs * own * rates.rate(e.reaction);
    }
    let sink = network.sink(cluster.id);
    if sink > 0.0 {
        t.sink -= own * (sink * rates.diffusion(cluster.id));
    }
    t
}

fn check_dimensions(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
) -> NetworkResult<()> {
    if concentrations.len() != network.dof() {
        return Err(NetworkError::DimensionMismatch {
            what: "concentrations",
            expected: network.dof(),
            actual: concentrations.len(),
        });
    }
    if rates.len() != network.reactions().len() {
        return Err(NetworkError::DimensionMismatch {
            what: "rate constants",
            expected: network.reactions().len(),
            actual: rates.len(),
        });
    }
    Ok(())
}

/// Adds the network's net rate of change into `out` (same layout as
/// `concentrations`).
pub fn compute_fluxes(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
    out: &mut [f64],
) -> NetworkResult<()> {
    check_dimensions(network, rates, concentrations)?;
    if out.len() != network.dof() {
        return Err(NetworkError::DimensionMismatch {
            what: "flux output",
            expected: network.dof(),
            actual: out.len(),
        });
    }
    for cluster in network.clusters() {
        let total = cluster_terms(network, rates, concentrations, cluster).total();
        for (basis, slot) in cluster.state_slots() {
            out[slot] += total[basis];
        }
    }
    Ok(())
}

/// Flux split by mechanism, signed as it enters the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxBreakdown {
    pub production: Vec<f64>,
    pub combination: Vec<f64>,
    pub dissociation: Vec<f64>,
    pub emission: Vec<f64>,
    pub sink: Vec<f64>,
}

impl FluxBreakdown {
    pub fn total(&self) -> Vec<f64> {
        (0..self.production.len())
            .map(|i| {
                self.production[i]
                    + self.combination[i]
                    + self.dissociation[i]
                    + self.emission[i]
                    + self.sink[i]
            })
            .collect()
    }
}

pub fn flux_breakdown(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
) -> NetworkResult<FluxBreakdown> {
    check_dimensions(network, rates, concentrations)?;
    let n = network.dof();
    let mut out = FluxBreakdown {
        production: vec![0.0; n],
        combination: vec![0.0; n],
        dissociation: vec![0.0; n],
        emission: vec![0.0; n],
        sink: vec![0.0; n],
    };
    for cluster in network.clusters() {
        let t = cluster_terms(network, rates, concentrations, cluster);
        for (basis, slot) in cluster.state_slots() {
            out.production[slot] = t.production[basis];
            out.combination[slot] = t.combination[basis];
            out.dissociation[slot] = t.dissociation[basis];
            out.emission[slot] = t.emission[basis];
            out.sink[slot] = t.sink[basis];
        }
    }
    Ok(out)
}

// --- Partial derivatives ---

/// Calls `visit(row, column, value)` for every Jacobian contribution.
///
/// Entries may repeat and must be summed. Every `(row, column)` of the
/// sparsity pattern is visited at least once, zeros included, and nothing
/// outside it is.
pub fn visit_partials<F>(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
    mut visit: F,
) -> NetworkResult<()>
where
    F: FnMut(usize, usize, f64),
{
    check_dimensions(network, rates, concentrations)?;

    for cluster in network.clusters() {
        let links = network.links(cluster.id);
        let rows: Vec<(usize, usize)> = cluster.state_slots().collect();

        for &(_, row) in &rows {
            for &(_, column) in &rows {
                visit(row, column, 0.0);
            }
        }

        for p in &links.production {
            let k = rates.rate(p.reaction);
            let first = network.cluster(p.first);
            let cs = concentrations[p.second];
            let lg = p.coefs * gather(first, concentrations);
            for &(kk, row) in &rows {
                visit(row, p.second, k * lg[kk]);
                for (j, column) in first.state_slots() {
                    visit(row, column, k * cs * p.coefs[(kk, j)]);
                }
            }
        }

        for r in &links.combining {
            let k = rates.rate(r.reaction);
            let (grouped, other) = grouped_operand(cluster, network.cluster(r.partner));
            let co = concentrations[other.id];
            let lg = r.coefs * gather(grouped, concentrations);
            for &(kk, row) in &rows {
                visit(row, other.id, -k * lg[kk]);
                for (j, column) in grouped.state_slots() {
                    visit(row, column, -k * co * r.coefs[(kk, j)]);
                }
            }
        }

        for d in &links.dissociating {
            let k = rates.rate(d.reaction);
            let parent = network.cluster(d.parent);
            for &(kk, row) in &rows {
                for (j, column) in parent.state_slots() {
                    visit(row, column, k * d.coefs[(kk, j)]);
                }
            }
        }

        for e in &links.emission {
            let k = rates.rate(e.reaction);
            for &(kk, row) in &rows {
                for &(j, column) in &rows {
                    visit(row, column, -k * e.coefs[(kk, j)]);
                }
            }
        }

        let sink = network.sink(cluster.id);
        if sink > 0.0 {
            let loss = sink * rates.diffusion(cluster.id);
            for &(_, row) in &rows {
                visit(row, row, -loss);
            }
        }
    }
    Ok(())
}

/// Adds the Jacobian into `values`, aligned with `network.sparsity()`.
pub fn compute_partials(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
    values: &mut [f64],
) -> NetworkResult<()> {
    let pattern = network.sparsity();
    if values.len() != pattern.nnz() {
        return Err(NetworkError::DimensionMismatch {
            what: "Jacobian values",
            expected: pattern.nnz(),
            actual: values.len(),
        });
    }
    visit_partials(network, rates, concentrations, |row, column, value| {
        if let Some(i) = pattern.position(row, column) {
            values[i] += value;
        }
    })
}
