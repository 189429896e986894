use std::sync::Arc;

use defect_network::core::domain::{ClusterKind, Composition, NetworkParams, Species};
use defect_network::core::spatial::{Axis, AxisMask, PhaseSpace, Region, MAX_AXES};
use defect_network::engine::generator::{generate, seed_for};
use defect_network::engine::network::NetworkBuilder;
use defect_network::materials::{build_material, refine_by_schedule, BinSchedule, Material};
use defect_network::{NetworkError, ReactionNetwork};

mod common;
use common::*;

/// 1D test material: sizes 1..=32 except 13, grouped from 8 in bins of 8.
struct Holey {
    space: PhaseSpace,
    schedule: BinSchedule,
}

impl Holey {
    fn new() -> Self {
        Self {
            space: PhaseSpace::new(vec![Axis::plain(Species::Xenon)]).unwrap(),
            schedule: BinSchedule {
                start: 8,
                width: 8.0,
                growth: 0.0,
                min_width: 4,
            },
        }
    }

    fn admissible(&self, region: &Region) -> i64 {
        (region.lo[0]..region.hi[0])
            .filter(|&x| (1..=32).contains(&x) && x != 13)
            .count() as i64
    }
}

impl Material for Holey {
    fn name(&self) -> &str {
        "holey"
    }
    fn phase_space(&self) -> &PhaseSpace {
        &self.space
    }
    fn bounds(&self) -> Region {
        Region::from_inclusive(&[(1, 32)])
    }
    fn intersect(&self, region: &Region) -> bool {
        self.admissible(region) > 0
    }
    fn select(&self, region: &Region) -> bool {
        self.admissible(region) == region.volume()
    }
    fn refine(&self, region: &Region) -> AxisMask {
        refine_by_schedule(region, 1, 0, Some(&self.schedule), self.select(region))
    }
    fn formation_energy(&self, c: &Composition) -> f64 {
        f64::from(c.total())
    }
    fn migration_energy(&self, c: &Composition) -> f64 {
        if c.total() == 1 {
            1.0
        } else {
            f64::INFINITY
        }
    }
    fn diffusion_factor(&self, c: &Composition) -> f64 {
        if c.total() == 1 {
            1e10
        } else {
            0.0
        }
    }
    fn reaction_radius(&self, c: &Composition) -> f64 {
        0.1 * f64::from(c.total()).cbrt()
    }
    fn atomic_volume(&self) -> f64 {
        0.05
    }
    fn emitted_monomers(&self) -> Vec<Composition> {
        vec![Composition::single(Species::Xenon, 1)]
    }
    fn can_emit(&self, parent: &Composition, _monomer: &Composition) -> bool {
        parent.total() >= 2
    }
    fn dissociation_enabled(&self) -> bool {
        true
    }
}

#[test]
fn test_interstitial_network_without_grouping() {
    let network = build(&interstitial_params(5));

    assert_eq!(network.num_clusters(), 5);
    assert_eq!(network.dof(), 5, "no moments without grouping");
    for n in 1..=5 {
        let c = network
            .find(&Composition::single(Species::Interstitial, n))
            .unwrap_or_else(|| panic!("I_{} missing", n));
        assert_eq!(c.kind, ClusterKind::Single);
        assert!(c.is_mobile(), "I_{} migrates in tungsten", n);
        assert!(c.properties.reaction_radius > 0.0);
    }
    assert!(network
        .find(&Composition::single(Species::Interstitial, 6))
        .is_none());
}

#[test]
fn test_tungsten_network_matches_admissible_count() {
    // He_1..3, V_1..2, I_1..2 and He_m V_n with m <= 4n + 5
    let network = build(&tungsten_params(3, 2, 2));
    assert_eq!(network.num_clusters(), 3 + 2 + 2 + 9 + 13);

    let mixed = network
        .clusters()
        .iter()
        .filter(|c| c.kind == ClusterKind::Mixed)
        .count();
    assert_eq!(mixed, 22);

    let hev = Composition::single(Species::Helium, 13).with(Species::Vacancy, 2);
    let c = network.find(&hev).unwrap();
    assert!(!c.is_mobile(), "mixed clusters are immobile");
    assert!(c.properties.migration_energy.is_infinite());
    let overfilled = Composition::single(Species::Helium, 14).with(Species::Vacancy, 2);
    assert!(network.find(&overfilled).is_none());
}

#[test]
fn test_grouped_tungsten_covers_admissible_space() {
    let params = grouped_tungsten_params();
    let network = build(&params);
    let material = build_material(&params).unwrap();

    let supers: Vec<_> = network.clusters().iter().filter(|c| c.is_super()).collect();
    assert!(!supers.is_empty(), "grouping produced no super-clusters");

    // Every admissible composition has exactly one owner
    let mut admissible = 0;
    for p in material.bounds().points() {
        if material.select(&Region::unit(p)) {
            admissible += 1;
            let owner = network.find_point(&p);
            assert!(owner.is_some(), "{:?} unowned", p);
            let composition = material.phase_space().to_composition(&p);
            assert_eq!(
                network.find_owner(&composition).map(|c| c.id),
                owner.map(|c| c.id),
                "{} resolves to a different owner",
                composition
            );
        } else {
            assert!(network.find_point(&p).is_none(), "{:?} owned but inadmissible", p);
        }
    }
    let covered: i64 = network.clusters().iter().map(|c| c.volume()).sum();
    assert_eq!(covered, admissible);

    // Super-clusters sit after every single cluster and are immobile
    let first_super = supers[0].id;
    assert!(network.clusters()[..first_super].iter().all(|c| !c.is_super()));
    for s in &supers {
        assert!(s.id >= first_super);
        assert!(!s.is_mobile());
        assert!(material.select(&s.region));
        let schedule_ok = s.region.lo[1] >= 4 && s.region.width(1) <= 4 && s.region.width(0) <= 4;
        assert!(schedule_ok, "super {} outside the bin schedule", s.region);
    }
}

#[test]
fn test_moment_slots_follow_clusters() {
    let network = build(&xenon_params(60, true));
    let n = network.num_clusters();

    let mut slots: Vec<usize> = network
        .clusters()
        .iter()
        .flat_map(|c| c.moment_ids.iter().flatten().copied())
        .collect();
    assert!(!slots.is_empty());
    slots.sort_unstable();
    let expected: Vec<usize> = (n..network.dof()).collect();
    assert_eq!(slots, expected, "moment slots must be dense after cluster ids");

    for c in network.clusters() {
        let grouped = c.region.grouped_axes().count();
        assert_eq!(c.moment_ids.iter().flatten().count(), grouped);
        assert_eq!(c.is_super(), grouped > 0);

        assert_eq!(c.column(0), Some(c.id));
        for (axis, slot) in c.moment_ids.iter().enumerate() {
            assert_eq!(c.column(axis + 1), *slot);
        }
        assert_eq!(c.column(MAX_AXES + 1), None);
        for (basis, slot) in c.state_slots() {
            assert_eq!(c.column(basis), Some(slot));
        }
    }
}

#[test]
fn test_owner_lookup_resolves_grouped_compositions() {
    let network = build(&xenon_params(60, true));
    let exact = network.find(&Composition::single(Species::Xenon, 3)).unwrap();
    assert_eq!(
        network.find_owner(&Composition::single(Species::Xenon, 3)).map(|c| c.id),
        Some(exact.id)
    );

    // A composition inside a super-cluster has an owner but no exact match
    let group = network.clusters().iter().find(|c| c.is_super()).unwrap();
    let inner = Composition::single(Species::Xenon, group.region.lo[0] as u32 + 1);
    assert!(group.region.width(0) > 1);
    assert!(network.find(&inner).is_none());
    assert_eq!(network.find_owner(&inner).map(|c| c.id), Some(group.id));

    assert!(network
        .find_owner(&Composition::single(Species::Xenon, 61))
        .is_none());
    assert!(network
        .find_owner(&Composition::single(Species::Helium, 1))
        .is_none());
}

#[test]
fn test_partly_admissible_regions_are_dropped() {
    let material = Holey::new();
    let (seeds, stats) = generate(&material).unwrap();

    assert_eq!(stats.dropped_regions, 1);
    assert_eq!(stats.dropped_compositions, 4);

    // Sizes 1..=8 single, [9, 12] grouped, [13, 16] dropped, rest grouped
    let covered: i64 = seeds.iter().map(|s| s.region.volume()).sum();
    assert_eq!(covered, 32 - 4);
    assert!(seeds.iter().all(|s| !s.region.contains(&[14, 0, 0, 0])));
    assert!(seeds
        .iter()
        .any(|s| s.region == Region::from_inclusive(&[(9, 12)])));
}

#[test]
fn test_custom_material_builds_network() {
    init_logging();
    let material: Arc<dyn Material> = Arc::new(Holey::new());
    let mut builder = NetworkBuilder::with_material(&NetworkParams::default(), material);
    builder.generate().unwrap();
    let network = builder.finish().unwrap();

    assert!(network.production_count() > 0);
    assert!(network.dissociation_count() > 0);
    assert!(network.find_point(&[14, 0, 0, 0]).is_none());
}

#[test]
fn test_duplicate_cluster_is_fatal() {
    let params = interstitial_params(3);
    let mut builder = NetworkBuilder::new(&params).unwrap();
    let material = builder.material().clone();

    let seed = seed_for(material.as_ref(), &Region::unit([0, -2, 0, 0])).unwrap();
    builder.add(seed.clone()).unwrap();
    let err = builder.add(seed).unwrap_err();
    assert!(matches!(err, NetworkError::DuplicateCluster { .. }));

    // A grouped region swallowing an existing cluster fails at finish
    let mut builder = NetworkBuilder::new(&params).unwrap();
    let single = seed_for(material.as_ref(), &Region::unit([0, -1, 0, 0])).unwrap();
    let group = Region::from_inclusive(&[(0, 0), (-3, -1)]);
    builder.add(single).unwrap();
    builder
        .add(seed_for(material.as_ref(), &group).unwrap())
        .unwrap();
    assert!(matches!(
        builder.finish(),
        Err(NetworkError::DuplicateCluster { .. })
    ));
}

#[test]
fn test_configuration_errors() {
    // Nothing admissible
    let empty = interstitial_params(0);
    assert!(matches!(
        ReactionNetwork::new(&empty),
        Err(NetworkError::EmptyNetwork(_))
    ));

    // Tungsten only tabulates He_1..He_8
    let too_much_helium = tungsten_params(9, 2, 2);
    assert!(matches!(
        ReactionNetwork::new(&too_much_helium),
        Err(NetworkError::Config(_))
    ));

    assert!(matches!(
        ReactionNetwork::new(&xenon_params(0, false)),
        Err(NetworkError::Config(_))
    ));
}
