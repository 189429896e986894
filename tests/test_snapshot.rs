use std::path::PathBuf;

use defect_network::analysis::inventory::{fingerprint, NetworkStats};
use defect_network::io::snapshot::{read_json, snapshot, write_cluster_table, write_json};
use defect_network::{NetworkError, RateConstants};

mod common;
use common::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("defect_network_{}_{}", std::process::id(), name))
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let network = build(&grouped_tungsten_params());
    let path = temp_path("snapshot.json");

    write_json(&path, &snapshot(&network)).unwrap();
    let restored = read_json(&path).unwrap().restore().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(fingerprint(&restored), fingerprint(&network));
    assert_eq!(restored.dof(), network.dof());
    assert_eq!(NetworkStats::collect(&restored), NetworkStats::collect(&network));

    let a = RateConstants::compute(&network, 1000.0).unwrap();
    let b = RateConstants::compute(&restored, 1000.0).unwrap();
    assert_eq!(a, b, "restored network must reproduce its rates");
}

#[test]
fn test_snapshot_rejects_tampered_records() {
    let network = build(&xenon_params(30, true));
    let snap = snapshot(&network);

    let mut duplicated = snap.clone();
    let copy = duplicated.clusters[0].clone();
    duplicated.clusters.push(copy);
    assert!(matches!(
        duplicated.restore(),
        Err(NetworkError::DuplicateCluster { .. })
    ));

    let mut wrong_dof = snap.clone();
    wrong_dof.dof += 1;
    assert!(matches!(
        wrong_dof.restore(),
        Err(NetworkError::DimensionMismatch { .. })
    ));

    let mut bad_bounds = snap;
    bad_bounds.clusters[0].lo.push(0);
    assert!(matches!(
        bad_bounds.restore(),
        Err(NetworkError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_missing_snapshot_file_is_an_error() {
    let err = read_json(temp_path("does_not_exist.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to open snapshot file"));
}

#[test]
fn test_cluster_table_has_one_row_per_cluster() {
    let network = build(&tungsten_params(2, 3, 2));
    let path = temp_path("clusters.csv");
    write_cluster_table(&path, &network).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[1], "name");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    std::fs::remove_file(&path).ok();

    assert_eq!(rows.len(), network.num_clusters());
    assert_eq!(&rows[0][1], network.cluster(0).name().as_str());
}
