use super::*;

#[test]
fn intern_same_string_twice_returns_same_name() {
    let interner = StringInterner::new();
    let a = interner.intern("fib");
    let b = interner.intern("fib");
    assert_eq!(a, b);
    assert_eq!(interner.lookup(a), "fib");
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    assert_ne!(interner.intern("x"), interner.intern("y"));
}

#[test]
fn empty_string_is_name_zero() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn get_does_not_intern() {
    let interner = StringInterner::new();
    let before = interner.len();
    assert_eq!(interner.get("never_seen"), None);
    assert_eq!(interner.len(), before);
    assert_eq!(interner.get("main"), Some(interner.intern("main")));
}

#[test]
fn shared_interner_clones_share_storage() {
    let interner = SharedInterner::new();
    let clone = interner.clone();
    let name = interner.intern("shared");
    assert_eq!(clone.get("shared"), Some(name));
}

#[test]
fn concurrent_interning_agrees_on_one_name() {
    let interner = SharedInterner::new();
    let names: Vec<Name> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| interner.intern("contended")))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("interning thread panicked")))
            .collect()
    });
    assert!(names.windows(2).all(|w| w[0] == w[1]));
}
