use dbvt3d::bounding_volume::BoundingVolume;
use dbvt3d::broadphase::{BoxGeometry, CollisionObject, DynamicAabbTreeManager, Geometry};
use dbvt3d::math::{Real, Vector};
use dbvt3d::na::Isometry3;
use rand::{Rng, SeedableRng};
use rand_isaac::IsaacRng;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

fn random_object(rng: &mut IsaacRng) -> Rc<CollisionObject> {
    let extents = Vector::new(
        rng.gen_range(0.2..3.0),
        rng.gen_range(0.2..3.0),
        rng.gen_range(0.2..3.0),
    );
    let translation = Isometry3::translation(
        rng.gen_range(-15.0..15.0),
        rng.gen_range(-15.0..15.0),
        rng.gen_range(-15.0..15.0),
    );
    Rc::new(CollisionObject::with_transform(
        Geometry::Box(BoxGeometry::new(extents)),
        translation,
    ))
}

fn cube_object(side: Real, center: [Real; 3]) -> Rc<CollisionObject> {
    Rc::new(CollisionObject::with_transform(
        Geometry::Box(BoxGeometry::cube(side)),
        Isometry3::translation(center[0], center[1], center[2]),
    ))
}

// Identifies objects by address so callback arguments can be mapped back to
// their registration index.
fn index_by_ptr(objects: &[Rc<CollisionObject>]) -> HashMap<*const CollisionObject, usize> {
    objects
        .iter()
        .enumerate()
        .map(|(i, obj)| (Rc::as_ptr(obj), i))
        .collect()
}

fn brute_force_pairs(objects: &[Rc<CollisionObject>]) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();
    for i in 0..objects.len() {
        for j in i + 1..objects.len() {
            if objects[i].aabb().intersects(&objects[j].aabb()) {
                let _ = pairs.insert((i, j));
            }
        }
    }
    pairs
}

fn traversal_pairs(
    manager: &DynamicAabbTreeManager,
    ids: &HashMap<*const CollisionObject, usize>,
) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();
    manager.collide(|a, b| {
        let ia = ids[&(a as *const CollisionObject)];
        let ib = ids[&(b as *const CollisionObject)];
        let _ = pairs.insert((ia.min(ib), ia.max(ib)));
        false
    });
    pairs
}

#[test]
fn self_collision_matches_brute_force() {
    for seed in 0..3 {
        let mut rng = IsaacRng::seed_from_u64(seed);
        let objects: Vec<_> = (0..200).map(|_| random_object(&mut rng)).collect();
        let ids = index_by_ptr(&objects);

        let mut manager = DynamicAabbTreeManager::new();
        manager.register_objects(&objects);
        manager.tree().assert_well_formed();

        assert_eq!(traversal_pairs(&manager, &ids), brute_force_pairs(&objects));

        // Move a quarter of the objects and update all poses at once.
        for obj in objects.iter().step_by(4) {
            obj.set_translation(Vector::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            ));
        }
        manager.update();
        manager.tree().assert_well_formed();

        assert_eq!(traversal_pairs(&manager, &ids), brute_force_pairs(&objects));
    }
}

#[test]
fn update_without_motion_preserves_the_pair_set() {
    let mut rng = IsaacRng::seed_from_u64(11);
    let objects: Vec<_> = (0..150).map(|_| random_object(&mut rng)).collect();
    let ids = index_by_ptr(&objects);

    let mut manager = DynamicAabbTreeManager::new();
    for obj in &objects {
        manager.register_object(obj);
    }

    let before = traversal_pairs(&manager, &ids);
    manager.update();
    assert_eq!(traversal_pairs(&manager, &ids), before);
    manager.update();
    assert_eq!(traversal_pairs(&manager, &ids), before);
}

#[test]
fn pairwise_managers_match_brute_force() {
    for seed in 0..3 {
        let mut rng = IsaacRng::seed_from_u64(100 + seed);
        let group_a: Vec<_> = (0..100).map(|_| random_object(&mut rng)).collect();
        let group_b: Vec<_> = (0..100).map(|_| random_object(&mut rng)).collect();
        let ids_a = index_by_ptr(&group_a);
        let ids_b = index_by_ptr(&group_b);

        let mut manager_a = DynamicAabbTreeManager::new();
        let mut manager_b = DynamicAabbTreeManager::new();
        manager_a.register_objects(&group_a);
        manager_b.register_objects(&group_b);

        let mut expected = BTreeSet::new();
        for (i, a) in group_a.iter().enumerate() {
            for (j, b) in group_b.iter().enumerate() {
                if a.aabb().intersects(&b.aabb()) {
                    let _ = expected.insert((i, j));
                }
            }
        }

        let mut pairs = BTreeSet::new();
        manager_a.collide_manager(&manager_b, |a, b| {
            // The first argument always belongs to the receiver.
            let ia = ids_a[&(a as *const CollisionObject)];
            let ib = ids_b[&(b as *const CollisionObject)];
            let _ = pairs.insert((ia, ib));
            false
        });

        assert_eq!(pairs, expected);
    }
}

#[test]
fn self_distance_finds_the_minimum_aabb_distance() {
    for seed in 0..3 {
        let mut rng = IsaacRng::seed_from_u64(200 + seed);
        // Spread small boxes over a large domain so most pairs are disjoint.
        let objects: Vec<_> = (0..60)
            .map(|_| {
                cube_object(
                    rng.gen_range(0.2..0.8),
                    [
                        rng.gen_range(-40.0..40.0),
                        rng.gen_range(-40.0..40.0),
                        rng.gen_range(-40.0..40.0),
                    ],
                )
            })
            .collect();

        let mut manager = DynamicAabbTreeManager::new();
        manager.register_objects(&objects);

        let mut best = Real::MAX;
        manager.distance(|a, b, min_dist| {
            let d = a.aabb().distance(&b.aabb());
            if d < *min_dist {
                *min_dist = d;
            }
            best = best.min(d);
            false
        });

        let mut expected = Real::MAX;
        for i in 0..objects.len() {
            for j in i + 1..objects.len() {
                expected = expected.min(objects[i].aabb().distance(&objects[j].aabb()));
            }
        }

        assert_eq!(best, expected);
    }
}

#[test]
fn manager_distance_matches_cross_brute_force() {
    let mut rng = IsaacRng::seed_from_u64(300);
    let group_a: Vec<_> = (0..40).map(|_| random_object(&mut rng)).collect();
    let group_b: Vec<_> = (0..40).map(|_| random_object(&mut rng)).collect();

    let mut manager_a = DynamicAabbTreeManager::new();
    let mut manager_b = DynamicAabbTreeManager::new();
    manager_a.register_objects(&group_a);
    manager_b.register_objects(&group_b);

    let mut best = Real::MAX;
    manager_a.distance_manager(&manager_b, |a, b, min_dist| {
        let d = a.aabb().distance(&b.aabb());
        if d < *min_dist {
            *min_dist = d;
        }
        best = best.min(d);
        false
    });

    let mut expected = Real::MAX;
    for a in &group_a {
        for b in &group_b {
            expected = expected.min(a.aabb().distance(&b.aabb()));
        }
    }

    assert_eq!(best, expected);
}

// Eight update+distance rounds over two static objects: the callback fires
// exactly once per round with the same unordered pair. Which object comes
// first is unspecified and free to flip between rounds.
#[test]
fn two_object_repeatability() {
    let object0 = cube_object(0.2, [0.1, 0.2, 0.3]);
    let object1 = cube_object(0.4, [0.11, 0.21, 0.31]);

    let mut manager = DynamicAabbTreeManager::new();
    manager.register_object(&object0);
    manager.register_object(&object1);

    let expected: BTreeSet<*const CollisionObject> =
        [Rc::as_ptr(&object0), Rc::as_ptr(&object1)].into_iter().collect();

    for _ in 0..8 {
        manager.update();

        let mut invocations = 0;
        let mut seen = BTreeSet::new();
        manager.distance(|a, b, _min_dist| {
            invocations += 1;
            let _ = seen.insert(a as *const CollisionObject);
            let _ = seen.insert(b as *const CollisionObject);
            true
        });

        assert_eq!(invocations, 1);
        assert_eq!(seen, expected);
    }
}

#[test]
fn callback_returning_true_stops_the_walk() {
    // Everything overlaps everything: plenty of pairs to cut short.
    let objects: Vec<_> = (0..30).map(|_| cube_object(2.0, [0.0, 0.0, 0.0])).collect();

    let mut manager = DynamicAabbTreeManager::new();
    manager.register_objects(&objects);

    let mut invocations = 0;
    manager.collide(|_, _| {
        invocations += 1;
        true
    });
    assert_eq!(invocations, 1);

    let mut invocations = 0;
    manager.distance(|_, _, _| {
        invocations += 1;
        true
    });
    assert_eq!(invocations, 1);

    let query = cube_object(1.0, [0.0, 0.0, 0.0]);
    let mut invocations = 0;
    manager.collide_object(&query, |_, _| {
        invocations += 1;
        true
    });
    assert_eq!(invocations, 1);
}

#[test]
fn single_object_queries_match_brute_force() {
    let mut rng = IsaacRng::seed_from_u64(400);
    let objects: Vec<_> = (0..120).map(|_| random_object(&mut rng)).collect();
    let ids = index_by_ptr(&objects);

    let mut manager = DynamicAabbTreeManager::new();
    manager.register_objects(&objects);

    let query = cube_object(6.0, [1.0, -2.0, 0.5]);

    let mut hits = BTreeSet::new();
    manager.collide_object(&query, |stored, q| {
        // The stored object always comes first, the query second.
        assert!(std::ptr::eq(q, Rc::as_ptr(&query)));
        let _ = hits.insert(ids[&(stored as *const CollisionObject)]);
        false
    });

    let expected: BTreeSet<usize> = objects
        .iter()
        .enumerate()
        .filter(|(_, obj)| obj.aabb().intersects(&query.aabb()))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(hits, expected);

    let mut best = Real::MAX;
    manager.distance_object(&query, |stored, _q, min_dist| {
        let d = stored.aabb().distance(&query.aabb());
        if d < *min_dist {
            *min_dist = d;
        }
        best = best.min(d);
        false
    });

    let expected_min = objects
        .iter()
        .map(|obj| obj.aabb().distance(&query.aabb()))
        .fold(Real::MAX, Real::min);
    assert_eq!(best, expected_min);
}

#[test]
fn lifecycle() {
    let mut rng = IsaacRng::seed_from_u64(500);
    let objects: Vec<_> = (0..20).map(|_| random_object(&mut rng)).collect();

    let mut manager = DynamicAabbTreeManager::new();
    assert!(manager.is_empty());

    // Unregistering an unknown object is a silent no-op.
    manager.unregister_object(&objects[0]);
    assert!(manager.is_empty());

    manager.register_objects(&objects);
    assert_eq!(manager.len(), 20);

    let registered: BTreeSet<*const CollisionObject> =
        manager.objects().iter().map(Rc::as_ptr).collect();
    let expected: BTreeSet<*const CollisionObject> = objects.iter().map(Rc::as_ptr).collect();
    assert_eq!(registered, expected);

    manager.unregister_object(&objects[3]);
    manager.unregister_object(&objects[7]);
    // A second unregistration of the same object is also ignored.
    manager.unregister_object(&objects[3]);
    assert_eq!(manager.len(), 18);
    manager.tree().assert_well_formed();

    // Updating an unregistered object is ignored as well.
    manager.update_object(&objects[3]);
    assert_eq!(manager.len(), 18);

    manager.clear();
    assert!(manager.is_empty());
    assert!(manager.objects().is_empty());

    // The manager remains usable after a clear.
    manager.register_objects(&objects);
    assert_eq!(manager.len(), 20);
    manager.tree().assert_well_formed();
}

#[test]
fn incremental_registration_matches_bulk_registration() {
    let mut rng = IsaacRng::seed_from_u64(600);
    let objects: Vec<_> = (0..80).map(|_| random_object(&mut rng)).collect();
    let ids = index_by_ptr(&objects);

    let mut bulk = DynamicAabbTreeManager::new();
    bulk.register_objects(&objects);

    let mut incremental = DynamicAabbTreeManager::new();
    for obj in &objects {
        incremental.register_object(obj);
    }
    incremental.setup();

    assert_eq!(
        traversal_pairs(&bulk, &ids),
        traversal_pairs(&incremental, &ids)
    );

    // Per-object updates keep both in agreement after motion.
    for obj in objects.iter().take(10) {
        obj.set_translation(Vector::new(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
        ));
    }
    bulk.update_objects(&objects[..10]);
    incremental.update_objects(&objects[..10]);

    assert_eq!(traversal_pairs(&bulk, &ids), brute_force_pairs(&objects));
    assert_eq!(
        traversal_pairs(&incremental, &ids),
        brute_force_pairs(&objects)
    );
}
