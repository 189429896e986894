use defect_network::core::chemistry::{
    diffusion_coefficient, dissociation_rate, production_from_dissociation, production_rate,
};
use defect_network::core::domain::{Composition, GroupingParams, NetworkParams, Species};
use defect_network::core::spatial::{Axis, PhaseSpace, Region, RegionTree, MAX_AXES};
use defect_network::NetworkError;
use proptest::prelude::*;

fn hev_space() -> PhaseSpace {
    PhaseSpace::new(vec![
        Axis::plain(Species::Helium),
        Axis::folded(Species::Vacancy, Species::Interstitial),
    ])
    .unwrap()
}

#[test]
fn test_composition_key_and_order() {
    let c = Composition::new()
        .with(Species::Vacancy, 3)
        .with(Species::Helium, 2);
    assert_eq!(c.to_string(), "He_2V_3");
    assert_eq!(c.total(), 5);
    assert!(c.is_mixed());
    assert!(!Composition::single(Species::Interstitial, 4).is_mixed());
    assert!(Composition::single(Species::Xenon, 1).is_monomer());

    // Equal counts hash and compare equal regardless of construction order
    let d = Composition::single(Species::Helium, 2).with(Species::Vacancy, 3);
    assert_eq!(c, d);
}

#[test]
fn test_phase_space_folds_vacancies_and_interstitials() {
    let space = hev_space();
    let v = Composition::single(Species::Vacancy, 4);
    let i = Composition::single(Species::Interstitial, 2);
    let hev = Composition::single(Species::Helium, 3).with(Species::Vacancy, 1);

    assert_eq!(space.to_point(&v).unwrap()[..2], [0, 4]);
    assert_eq!(space.to_point(&i).unwrap()[..2], [0, -2]);
    assert_eq!(space.to_point(&hev).unwrap()[..2], [3, 1]);

    for c in [v, i, hev] {
        let p = space.to_point(&c).unwrap();
        assert_eq!(space.to_composition(&p), c);
    }
}

#[test]
fn test_phase_space_rejects_invalid_compositions() {
    let space = hev_space();

    let xe = Composition::single(Species::Xenon, 1);
    assert!(matches!(
        space.to_point(&xe),
        Err(NetworkError::InvalidComposition(_))
    ));

    // V and I on one folded axis cannot coexist
    let vi = Composition::single(Species::Vacancy, 1).with(Species::Interstitial, 1);
    assert!(matches!(
        space.to_point(&vi),
        Err(NetworkError::InvalidComposition(_))
    ));

    let twice = PhaseSpace::new(vec![
        Axis::plain(Species::Helium),
        Axis::folded(Species::Vacancy, Species::Helium),
    ]);
    assert!(matches!(twice, Err(NetworkError::Config(_))));
}

#[test]
fn test_region_geometry() {
    let r = Region::from_inclusive(&[(2, 5), (-1, 1)]);
    assert_eq!(r.width(0), 4);
    assert_eq!(r.width(1), 3);
    assert_eq!(r.volume(), 12);
    assert_eq!(r.grouped_axes().collect::<Vec<_>>(), vec![0, 1]);
    assert!(r.contains(&[5, -1, 0, 0]));
    assert!(!r.contains(&[6, 0, 0, 0]));

    let c = r.centroid();
    assert!((c[0] - 3.5).abs() < 1e-12);
    assert!(c[1].abs() < 1e-12);
    assert_eq!(r.representative()[..2], [4, 0]);

    assert_eq!(r.points().count(), 12);
    assert!(r.points().all(|p| r.contains(&p)));

    let other = Region::from_inclusive(&[(4, 9), (0, 0)]);
    let overlap = r.intersection(&other).unwrap();
    assert_eq!(overlap, Region::from_inclusive(&[(4, 5), (0, 0)]));
    assert!(r.intersection(&Region::from_inclusive(&[(6, 7), (0, 0)])).is_none());

    let shifted = r.shifted(&[1, -2, 0, 0]);
    assert_eq!(shifted, Region::from_inclusive(&[(3, 6), (-3, -1)]));
}

#[test]
fn test_region_bisect_partitions() {
    let r = Region::from_inclusive(&[(0, 6), (0, 3)]);
    let mut mask = [false; MAX_AXES];
    mask[0] = true;
    mask[1] = true;

    let children = r.bisect(&mask);
    assert_eq!(children.len(), 4);
    assert_eq!(children.iter().map(|c| c.volume()).sum::<i64>(), r.volume());
    for (i, a) in children.iter().enumerate() {
        for b in &children[i + 1..] {
            assert!(!a.intersects(b), "{} overlaps {}", a, b);
        }
    }

    // Nothing to split
    let unit = Region::unit([3, 1, 0, 0]);
    assert_eq!(unit.bisect(&mask), vec![unit]);
}

#[test]
fn test_region_tree_rejects_overlap() {
    let entries = vec![
        (Region::from_inclusive(&[(0, 3)]), 0),
        (Region::from_inclusive(&[(3, 3)]), 1),
    ];
    let err = RegionTree::build(entries).unwrap_err();
    assert!(matches!(err, NetworkError::DuplicateCluster { .. }));
}

proptest! {
    #[test]
    fn test_region_tree_matches_brute_force(
        widths in proptest::collection::vec(1i64..5, 1..40),
        probe in -5i64..120,
        qlo in -5i64..110,
        qw in 1i64..15,
    ) {
        // Disjoint 1D tiling
        let mut entries = Vec::new();
        let mut lo = 0;
        for (id, w) in widths.iter().enumerate() {
            entries.push((Region::from_inclusive(&[(lo, lo + w - 1)]), id));
            lo += w;
        }
        let tree = RegionTree::build(entries.clone()).unwrap();

        let point = [probe, 0, 0, 0];
        let expected = entries.iter().find(|(r, _)| r.contains(&point)).map(|(_, id)| *id);
        prop_assert_eq!(tree.find(&point), expected);

        let query = Region::from_inclusive(&[(qlo, qlo + qw - 1)]);
        let mut hits = Vec::new();
        tree.query(&query, &mut hits);
        hits.sort_unstable();
        let brute: Vec<usize> = entries
            .iter()
            .filter(|(r, _)| r.intersects(&query))
            .map(|(_, id)| *id)
            .collect();
        prop_assert_eq!(hits, brute);
    }
}

#[test]
fn test_params_validation() {
    assert!(NetworkParams::default().validate().is_ok());

    let zero_width = NetworkParams {
        grouping: Some(GroupingParams {
            width: 0,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(matches!(zero_width.validate(), Err(NetworkError::Config(_))));

    let bad_sink = NetworkParams {
        sink_strength: -1.0,
        ..Default::default()
    };
    assert!(matches!(bad_sink.validate(), Err(NetworkError::Config(_))));
}

#[test]
fn test_params_from_json() {
    let params = NetworkParams::from_json(
        r#"{
            "material": "xenon",
            "max_xenon": 50,
            "grouping": { "start": 10, "width": 4, "growth": 1.0, "min_width": 1 }
        }"#,
    )
    .unwrap();
    assert_eq!(params.max_xenon, 50);
    assert!(params.dissociation_enabled, "unset fields take defaults");

    let err = NetworkParams::from_json(
        r#"{ "grouping": { "start": 1, "width": 4, "growth": 1.0, "min_width": 1 } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, NetworkError::Config(_)));

    assert!(matches!(
        NetworkParams::from_json("{ not json"),
        Err(NetworkError::Json(_))
    ));
}

#[test]
fn test_rate_laws() {
    // Immobile partners never diffuse
    assert_eq!(diffusion_coefficient(0.0, 1.0, 1000.0), 0.0);
    assert_eq!(diffusion_coefficient(1e10, f64::INFINITY, 1000.0), 0.0);

    let d = diffusion_coefficient(1e10, 0.5, 800.0);
    let k = production_rate(0.2, 0.3, 0.1, d, 0.0);
    assert!((k - 4.0 * std::f64::consts::PI * 0.6 * d).abs() <= 1e-9 * k);

    // Detailed balance is invertible
    let kminus = dissociation_rate(k, 1.7, 0.0159, 800.0);
    let back = production_from_dissociation(kminus, 1.7, 0.0159, 800.0);
    assert!((back - k).abs() <= 1e-10 * k);
}
