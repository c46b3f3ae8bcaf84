//! End-to-end build properties over randomized inputs.

use glam::Vec3;
use lbvh::{Aabb, Lbvh, Ray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn random_positions(seed: u64, count: usize) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.random_range(-100.0..100.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-25.0..75.0),
            )
        })
        .collect()
}

fn ids(count: usize) -> Vec<u32> {
    (0..count as u32).collect()
}

/// Collect leaves with a manual stack walk, independent of `for_each_leaf`.
fn walk_leaves(bvh: &Lbvh) -> Vec<u32> {
    let mut leaves = Vec::new();
    if bvh.nodes().is_empty() {
        if bvh.leaf_count() == 1 {
            leaves.push(0);
        }
        return leaves;
    }
    let mut stack = vec![lbvh::ChildRef::internal(bvh.root())];
    while let Some(child) = stack.pop() {
        assert!(!child.is_unset(), "unset child reference in finished tree");
        if child.is_leaf() {
            leaves.push(child.index());
        } else {
            let node = &bvh.nodes()[child.index() as usize];
            stack.push(node.left);
            stack.push(node.right);
        }
    }
    leaves
}

#[test]
fn tree_shape_and_reachability() {
    init_tracing();
    for count in [2usize, 3, 7, 64, 1000] {
        let bvh = Lbvh::build(random_positions(42, count), ids(count)).unwrap();
        assert_eq!(bvh.nodes().len(), count - 1);
        assert_eq!(bvh.leaf_count(), count);

        let mut leaves = walk_leaves(&bvh);
        assert_eq!(leaves.len(), count, "every leaf reachable exactly once");
        leaves.sort_unstable();
        assert_eq!(leaves, (0..count as u32).collect::<Vec<_>>());
    }
}

#[test]
fn every_internal_node_reachable() {
    let count = 500;
    let bvh = Lbvh::build(random_positions(7, count), ids(count)).unwrap();

    let mut seen = vec![false; bvh.nodes().len()];
    let mut stack = vec![bvh.root()];
    while let Some(i) = stack.pop() {
        assert!(!seen[i as usize], "node visited twice");
        seen[i as usize] = true;
        let node = &bvh.nodes()[i as usize];
        for child in [node.left, node.right] {
            if !child.is_leaf() {
                stack.push(child.index());
            }
        }
    }
    assert!(seen.iter().all(|&s| s), "unreachable internal node");
}

#[test]
fn boxes_valid_and_contain_children() {
    let count = 1000;
    let bvh = Lbvh::build(random_positions(3, count), ids(count)).unwrap();

    for node in bvh.nodes() {
        let b = node.aabb;
        assert!(b.min.cmple(b.max).all(), "inverted box after refit");
        for child in [node.left, node.right] {
            let child_box = if child.is_leaf() {
                Aabb::from_point(bvh.positions()[child.index() as usize])
            } else {
                bvh.nodes()[child.index() as usize].aabb
            };
            assert!(b.contains_box(&child_box), "child box leaks out of parent");
        }
    }

    // root covers the scene exactly
    assert_eq!(bvh.nodes()[bvh.root() as usize].aabb, bvh.bounds());
}

#[test]
fn prim_id_round_trip() {
    let count = 300;
    let positions = random_positions(11, count);
    let prim_ids: Vec<u32> = (0..count as u32).map(|i| i * 3 + 7).collect();
    let bvh = Lbvh::build(positions, prim_ids.clone()).unwrap();

    let mut seen: Vec<u32> = walk_leaves(&bvh)
        .into_iter()
        .map(|l| bvh.prim_ids()[l as usize])
        .collect();
    seen.sort_unstable();
    let mut expected = prim_ids;
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn rebuild_is_idempotent() {
    let count = 400;
    let positions = random_positions(5, count);
    let a = Lbvh::build(positions.clone(), ids(count)).unwrap();
    let b = Lbvh::build(positions, ids(count)).unwrap();

    assert_eq!(a.root(), b.root());
    assert_eq!(a.prim_ids(), b.prim_ids());
    for (na, nb) in a.nodes().iter().zip(b.nodes()) {
        assert_eq!(na.left, nb.left);
        assert_eq!(na.right, nb.right);
        assert_eq!(na.aabb, nb.aabb);
    }
}

#[test]
fn single_threaded_build_matches_parallel() {
    let count = 2000;
    let positions = random_positions(23, count);

    let parallel = Lbvh::build(positions.clone(), ids(count)).unwrap();
    let serial_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let serial = serial_pool.install(|| Lbvh::build(positions, ids(count)).unwrap());

    // topology depends only on sorted keys; boxes only on min/max unions,
    // which are exact under any arrival order
    assert_eq!(parallel.prim_ids(), serial.prim_ids());
    for (p, s) in parallel.nodes().iter().zip(serial.nodes()) {
        assert_eq!(p.left, s.left);
        assert_eq!(p.right, s.right);
        assert_eq!(p.aabb, s.aabb);
    }
}

#[test]
fn duplicate_positions_build_cleanly() {
    // many identical Morton keys; ties resolved by original index
    let positions = vec![Vec3::new(1.0, 2.0, 3.0); 64];
    let bvh = Lbvh::build(positions, ids(64)).unwrap();
    assert_eq!(bvh.nodes().len(), 63);
    let mut leaves = walk_leaves(&bvh);
    leaves.sort_unstable();
    assert_eq!(leaves, (0..64u32).collect::<Vec<_>>());
    assert_eq!(bvh.bounds(), Aabb::from_point(Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn negative_coordinates_refit_correctly() {
    // exercises the order-preserving float transform in the atomic boxes
    let positions = vec![
        Vec3::new(-10.0, -10.0, -10.0),
        Vec3::new(-5.0, -8.0, -2.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-7.0, -3.0, -9.0),
    ];
    let bvh = Lbvh::build(positions, ids(4)).unwrap();
    let root = bvh.nodes()[bvh.root() as usize].aabb;
    assert_eq!(root.min, Vec3::new(-10.0, -10.0, -10.0));
    assert_eq!(root.max, Vec3::new(-1.0, -1.0, -1.0));
}

#[test]
fn rays_against_built_boxes() {
    let count = 100;
    let bvh = Lbvh::build(random_positions(31, count), ids(count)).unwrap();
    let scene = bvh.bounds();
    let center = (scene.min + scene.max) * 0.5;

    // from inside the scene box: always a hit with t_near <= 0 < t_far
    let inside = Ray::new(center, Vec3::new(1.0, 1.0, 1.0));
    let t = scene.intersect(&inside, f32::MAX).expect("inside origin hits");
    assert!(t <= 0.0);

    // from far outside, pointing away: never a hit
    let away = Ray::new(scene.max + Vec3::splat(10.0), Vec3::X);
    assert!(scene.intersect(&away, f32::MAX).is_none());
}
