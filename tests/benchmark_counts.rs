//! Regression counts for the real benchmark catalog.
//!
//! The catalog is not bundled; point `YOUTUBE_FACES_CATALOG` at it and run
//! `cargo test -- --ignored`.

use std::path::PathBuf;

use youtube_faces_db::{Database, Group, ObjectQuery, Protocol, Purpose, Subworld, WorldType};

/// (world unrestricted, world restricted, dev, eval) clients.
const CLIENTS: [(usize, usize, usize, usize); 10] = [
    (3959, 2956, 1189, 601),
    (3984, 2986, 1210, 555),
    (4041, 3040, 1156, 552),
    (4082, 3052, 1107, 560),
    (4070, 3039, 1112, 567),
    (4095, 3017, 1127, 527),
    (4058, 2997, 1094, 597),
    (4024, 2976, 1124, 601),
    (3971, 2956, 1198, 580),
    (3959, 2948, 1181, 609),
];

/// (dev, eval) models.
const MODELS: [(usize, usize); 10] = [
    (916, 472),
    (930, 462),
    (934, 440),
    (902, 459),
    (899, 436),
    (895, 441),
    (877, 476),
    (917, 462),
    (938, 458),
    (920, 458),
];

/// (dev, eval) probe files.
const PROBES: [(usize, usize); 10] = [
    (931, 473),
    (947, 454),
    (927, 439),
    (893, 451),
    (890, 449),
    (900, 450),
    (899, 467),
    (917, 462),
    (929, 457),
    (919, 474),
];

const RESTRICTED_THREEFOLD_WORLD: [usize; 10] =
    [2267, 2228, 2234, 2293, 2341, 2362, 2334, 2356, 2368, 2320];

const UNRESTRICTED_SEVENFOLD_WORLD: [usize; 10] =
    [8874, 8714, 9408, 9453, 9804, 9727, 9361, 9155, 9114, 9021];

fn open() -> Database {
    let path = std::env::var("YOUTUBE_FACES_CATALOG")
        .map(PathBuf::from)
        .expect("YOUTUBE_FACES_CATALOG must point at the benchmark catalog");
    Database::open(&path).expect("benchmark catalog loads")
}

fn folds() -> impl Iterator<Item = (usize, Protocol)> {
    (0..10).map(|i| (i, Protocol::Fold(i as u8 + 1)))
}

fn count(db: &Database, protocol: Protocol, group: Group, purpose: Purpose) -> usize {
    db.objects(
        &ObjectQuery::new()
            .protocol(protocol)
            .group(group)
            .purpose(purpose),
    )
    .len()
}

#[test]
#[ignore = "needs the benchmark catalog"]
fn clients_and_models_per_fold() {
    let db = open();
    for (i, protocol) in folds() {
        let (unrestricted, restricted, dev, eval) = CLIENTS[i];
        let clients = |groups: &[Group], world_type| db.clients(Some(protocol), groups, world_type).len();
        assert_eq!(clients(&[Group::World], WorldType::Unrestricted), unrestricted, "{protocol}");
        assert_eq!(clients(&[Group::World], WorldType::Restricted), restricted, "{protocol}");
        assert_eq!(clients(&[Group::Dev], WorldType::default()), dev, "{protocol}");
        assert_eq!(clients(&[Group::Eval], WorldType::default()), eval, "{protocol}");

        assert_eq!(db.models(Some(protocol), &[Group::Dev]).len(), MODELS[i].0);
        assert_eq!(db.models(Some(protocol), &[Group::Eval]).len(), MODELS[i].1);
    }
}

#[test]
#[ignore = "needs the benchmark catalog"]
fn objects_per_fold() {
    let db = open();
    assert_eq!(db.objects(&ObjectQuery::new()).len(), 13233);
    assert_eq!(
        db.objects(&ObjectQuery::new().world_type(WorldType::Restricted)).len(),
        9056
    );

    for (i, protocol) in folds() {
        assert_eq!(count(&db, protocol, Group::Dev, Purpose::Enrol), MODELS[i].0);
        assert_eq!(count(&db, protocol, Group::Eval, Purpose::Enrol), MODELS[i].1);
        assert_eq!(count(&db, protocol, Group::Dev, Purpose::Probe), PROBES[i].0);
        assert_eq!(count(&db, protocol, Group::Eval, Purpose::Probe), PROBES[i].1);

        let world = ObjectQuery::new().protocol(protocol).group(Group::World);
        let restricted = world
            .clone()
            .world_type(WorldType::Restricted)
            .subworld(Subworld::Threefolds);
        assert_eq!(db.objects(&restricted).len(), RESTRICTED_THREEFOLD_WORLD[i]);
        let unrestricted = world
            .world_type(WorldType::Unrestricted)
            .subworld(Subworld::Sevenfolds);
        assert_eq!(db.objects(&unrestricted).len(), UNRESTRICTED_SEVENFOLD_WORLD[i]);
    }
}

#[test]
#[ignore = "needs the benchmark catalog"]
fn pairs_per_protocol() {
    let db = open();
    let pairs = |protocol, group| db.pairs(Some(protocol), &[group], &[]).len();
    for (_, protocol) in folds() {
        assert_eq!(pairs(protocol, Group::World), 4200);
        assert_eq!(pairs(protocol, Group::Dev), 1200);
        assert_eq!(pairs(protocol, Group::Eval), 600);
    }
    assert_eq!(pairs(Protocol::View1, Group::World), 2200);
    assert_eq!(pairs(Protocol::View1, Group::Dev), 1000);
    assert_eq!(pairs(Protocol::View1, Group::Eval), 0);
}

#[test]
#[ignore = "needs the benchmark catalog"]
fn benchmark_catalog_is_consistent() {
    open().self_check().expect("consistent");
}
