//! Integration tests for the literal scenarios in spec §8.

use fabric_core::{EvaluationFailure, FabricConfig, FabricError, Node, Tail};

fn n(v: u64) -> Node {
    Node::integer(v)
}

fn fabric() -> fabric_core::Fabric {
    fabric_core::Fabric::new(FabricConfig::default())
}

/// Scenario 1: fresh fabric queries null, then `define_const` sticks
/// for both orderings of the tail.
#[test]
fn scenario_1_fresh_query_then_define_const() {
    let f = fabric();
    assert_eq!(f.query(Tail::new(n(1), n(2))).unwrap(), Node::NULL);

    f.define(Tail::new(n(1), n(2)), n(42));
    assert_eq!(f.query(Tail::new(n(1), n(2))).unwrap(), n(42));
    assert_eq!(f.query(Tail::new(n(2), n(1))).unwrap(), n(42));
}

/// Scenario 2: a composed path — `query(query(1,2), query(3,4))` —
/// resolves once both leaves exist, and stays null until then.
#[test]
fn scenario_2_composed_path_resolves_once_its_leaves_exist() {
    let f = fabric();
    f.define(Tail::new(n(1), n(2)), n(10));
    f.define(Tail::new(n(3), n(4)), n(20));
    f.define_path(Tail::new(n(5), n(6)), vec![vec![n(1), n(2)], vec![n(3), n(4)]]);

    assert_eq!(f.query(Tail::new(n(5), n(6))).unwrap(), Node::NULL);

    f.define(Tail::new(n(10), n(20)), n(99));
    assert_eq!(f.query(Tail::new(n(5), n(6))).unwrap(), n(99));
}

/// Scenario 3: redefining a leaf invalidates the cached composed head.
#[test]
fn scenario_3_redefining_a_leaf_invalidates_the_cached_head() {
    let f = fabric();
    f.define(Tail::new(n(1), n(2)), n(10));
    f.define(Tail::new(n(3), n(4)), n(20));
    f.define_path(Tail::new(n(5), n(6)), vec![vec![n(1), n(2)], vec![n(3), n(4)]]);
    f.define(Tail::new(n(10), n(20)), n(99));
    assert_eq!(f.query(Tail::new(n(5), n(6))).unwrap(), n(99));

    f.define(Tail::new(n(1), n(2)), n(11));
    f.define(Tail::new(n(11), n(20)), n(100));
    assert_eq!(f.query(Tail::new(n(5), n(6))).unwrap(), n(100));
}

/// Scenario 4: `unique()` returns three distinct, strictly increasing
/// allocated nodes.
#[test]
fn scenario_4_unique_is_injective_and_increasing() {
    let f = fabric();
    let a = f.unique();
    let b = f.unique();
    let c = f.unique();
    assert_ne!(a, b);
    assert_ne!(b, c);

    let Node::Allocated(av) = a else { panic!("expected allocated") };
    let Node::Allocated(bv) = b else { panic!("expected allocated") };
    let Node::Allocated(cv) = c else { panic!("expected allocated") };
    assert!(av < bv);
    assert!(bv < cv);
}

/// Scenario 5: `partners(1)` surfaces every tail-mate, and repeated
/// querying eventually promotes the most-queried partner to the front.
#[test]
fn scenario_5_partners_reflects_tail_mates_and_significance() {
    let f = fabric();
    f.define(Tail::new(n(1), n(2)), Node::NULL);
    f.define(Tail::new(n(1), n(3)), Node::NULL);
    f.define(Tail::new(n(1), n(4)), Node::NULL);

    let mut all = f.partners(n(1), 10, 0);
    all.sort();
    assert_eq!(all, vec![n(2), n(3), n(4)]);

    for _ in 0..100 {
        f.query(Tail::new(n(1), n(3))).unwrap();
    }
    f.query(Tail::new(n(1), n(2))).unwrap();

    assert_eq!(f.partners(n(1), 1, 0)[0], n(3));
}

/// Scenario 6: a self-referential path definition fails with
/// `EvaluationFailed` on query, and the fabric stays usable after.
#[test]
fn scenario_6_self_referential_definition_is_a_detected_cycle() {
    let f = fabric();
    let tail = Tail::new(n(1), n(2));
    f.define_path(tail, vec![vec![n(1), n(2)]]);

    let err = f.query(tail).unwrap_err();
    assert!(matches!(
        err,
        FabricError::EvaluationFailed {
            reason: EvaluationFailure::Cycle,
            ..
        }
    ));

    f.define(Tail::new(n(8), n(9)), n(1));
    assert_eq!(f.query(Tail::new(n(8), n(9))).unwrap(), n(1));
}

/// Invariant 1: `get` is symmetric on tail ordering.
#[test]
fn invariant_get_is_symmetric_on_tail_ordering() {
    let f = fabric();
    let a = f.get(Tail::new(n(1), n(2)));
    let b = f.get(Tail::new(n(2), n(1)));
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

/// Invariant 7: `Tail::new` canonicalizes regardless of argument order.
#[test]
fn invariant_tail_canonicalization_is_order_independent() {
    assert_eq!(Tail::new(n(5), n(9)), Tail::new(n(9), n(5)));
}

/// A direct null-node step through a query is well-defined, not an
/// error (spec §4.5: "explicit null appearance ... is a warning-level
/// event that still evaluates").
#[test]
fn querying_through_a_null_node_still_evaluates() {
    let f = fabric();
    let tail = Tail::new(Node::NULL, n(1));
    assert_eq!(f.query(tail).unwrap(), Node::NULL);
}
