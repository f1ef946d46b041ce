use crate::jitter::store::OrderedStore;

#[test]
fn test_store_keeps_key_order() {
    let mut store = OrderedStore::new();
    store.insert(40, "c");
    store.insert(0, "a");
    store.insert(20, "b");

    assert_eq!(store.len(), 3);
    assert_eq!(store.first_key(), Some(0));
    assert_eq!(store.pop_first(), Some((0, "a")));
    assert_eq!(store.pop_first(), Some((20, "b")));
    assert_eq!(store.pop_first(), Some((40, "c")));
    assert!(store.pop_first().is_none());
    assert!(store.is_empty());
}

#[test]
fn test_store_insert_replaces_existing_key() {
    let mut store = OrderedStore::new();
    assert_eq!(store.insert(100, "first"), None);
    assert_eq!(store.insert(100, "second"), Some("first"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.values().collect::<Vec<_>>(), vec![&"second"]);
}

#[test]
fn test_store_pop_first_below() {
    let mut store = OrderedStore::new();
    store.insert(10, ());
    store.insert(30, ());

    assert_eq!(store.pop_first_below(10), None);
    assert_eq!(store.pop_first_below(11), Some((10, ())));
    assert_eq!(store.pop_first_below(30), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_remove_below() {
    let mut store = OrderedStore::new();
    for ts in (0..100).step_by(10) {
        store.insert(ts, ts * 2);
    }

    assert_eq!(store.remove_below(35), 4);
    assert_eq!(store.first_key(), Some(40));
    assert_eq!(store.remove_below(35), 0);
    assert_eq!(store.remove_below(1000), 6);
    assert!(store.is_empty());
}
