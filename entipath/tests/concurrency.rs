mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use entipath::prelude::*;
use support::{QEmployee, QPerson};

const THREADS: usize = 16;

fn counted_leaf(builds: &Arc<AtomicUsize>) -> EntityTarget<EntityPathBase> {
    let builds = Arc::clone(builds);
    EntityTarget::new("Leaf", move |metadata, inits| {
        builds.fetch_add(1, Ordering::SeqCst);
        let mut base = EntityPathBase::new("Leaf", metadata, inits);
        base.create_string("label");
        base
    })
}

#[test]
fn deferred_placeholder_expands_once_under_contention() {
    let builds = Arc::new(AtomicUsize::new(0));
    let mut root = EntityPathBase::new("Root", PathMetadata::root("r"), PathInits::deferred());
    let leaf = root.create_entity_with("leaf", &counted_leaf(&builds));
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let seen: Vec<Arc<EntityPathBase>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| Arc::clone(leaf.association().shared())))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(seen.iter().all(|child| Arc::ptr_eq(child, &seen[0])));
    assert_eq!(leaf.state(), AssociationState::Expanded);
}

#[test]
fn typed_back_reference_is_shared_between_threads() {
    let employee = QEmployee::root("e");
    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| employee.manager.get() as *const QEmployee as usize))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(employee.manager.state(), AssociationState::Expanded);
}

#[test]
fn registry_builds_each_key_once() {
    let registry = PathRegistry::new();
    let builds = AtomicUsize::new(0);

    let roots: Vec<Arc<QPerson>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|index| {
                let registry = &registry;
                let builds = &builds;
                scope.spawn(move || {
                    let variable = if index % 2 == 0 { "p1" } else { "p2" };
                    let metadata = PathMetadata::root(variable);
                    registry.get_or_insert_with(QPerson::ENTITY, &metadata, || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        QPerson::from_metadata(metadata.clone())
                    })
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(registry.len(), 2);
    for (index, root) in roots.iter().enumerate() {
        assert!(Arc::ptr_eq(root, &roots[index % 2]));
    }
    assert!(!Arc::ptr_eq(&roots[0], &roots[1]));
}

#[test]
fn typed_registry_roots_are_shared() {
    let registry = PathRegistry::new();
    let roots: Vec<Arc<QEmployee>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| registry.canonical::<QEmployee>()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert!(roots.iter().all(|root| Arc::ptr_eq(root, &roots[0])));
    assert_eq!(roots[0].metadata().to_string(), "employee");
    assert_eq!(registry.len(), 1);
}
