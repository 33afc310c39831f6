//! Property-based tests for consumer notification.
//!
//! For any sequence of producer updates:
//!
//! 1. A full-value consumer is asked to re-render exactly when the value's
//!    identity changes.
//! 2. A selecting consumer is asked to re-render exactly when its selection
//!    changes.
//! 3. A consumer re-renders at most once per update.
//! 4. An unmounted consumer is never asked again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hookstore_core::{create_shared_store, Hooks, RerenderHandle, Store};
use proptest::prelude::*;

// Helpers

/// A store whose value keeps its `Arc` while the props are unchanged.
fn pair_store() -> Store<(u8, u8), (u8, u8)> {
    create_shared_store(|hooks: &mut Hooks, props: &(u8, u8)| {
        hooks.use_memo(*props, |pair| *pair)
    })
}

fn counting_handle() -> (RerenderHandle, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let handle = RerenderHandle::new(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    (handle, count)
}

// A narrow range so that repeated props are common.
fn props_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    proptest::collection::vec((0u8..3, 0u8..3), 1..40)
}

proptest! {
    #[test]
    fn full_value_consumer_tracks_identity(start in (0u8..3, 0u8..3), updates in props_strategy()) {
        let store = pair_store();
        let mut producer = store.mount(start, RerenderHandle::noop());
        let (handle, requests) = counting_handle();
        let mut consumer = producer.provide(|| store.use_store(handle)).unwrap();

        let mut previous = start;
        for props in updates {
            let before = requests.load(Ordering::SeqCst);
            producer.set_props(props);
            producer.update();
            let asked = requests.load(Ordering::SeqCst) - before;

            prop_assert!(asked <= 1, "consumer asked {} times in one update", asked);
            prop_assert_eq!(asked == 1, props != previous);

            if asked == 1 {
                prop_assert_eq!(*consumer.render().unwrap(), props);
            }
            previous = props;
        }
    }

    #[test]
    fn selecting_consumer_tracks_selection(start in (0u8..3, 0u8..3), updates in props_strategy()) {
        let store = pair_store();
        let mut producer = store.mount(start, RerenderHandle::noop());
        let (handle, requests) = counting_handle();
        let mut consumer = producer
            .provide(|| store.use_store_with(|v| v.0, handle))
            .unwrap();

        let mut rendered = start.0;
        for props in updates {
            let before = requests.load(Ordering::SeqCst);
            producer.set_props(props);
            producer.update();
            let asked = requests.load(Ordering::SeqCst) - before;

            prop_assert!(asked <= 1);
            prop_assert_eq!(asked == 1, props.0 != rendered);

            if asked == 1 {
                rendered = consumer.render().unwrap();
                prop_assert_eq!(rendered, props.0);
            }
        }
        prop_assert_eq!(consumer.selected(), producer.value().0);
    }

    #[test]
    fn unmounted_consumer_stays_silent(updates in props_strategy()) {
        let store = pair_store();
        let mut producer = store.mount((9, 9), RerenderHandle::noop());
        let (handle, requests) = counting_handle();
        let consumer = producer.provide(|| store.use_store(handle)).unwrap();
        drop(consumer);

        for props in updates {
            producer.set_props(props);
            producer.update();
        }
        prop_assert_eq!(requests.load(Ordering::SeqCst), 0);
        prop_assert_eq!(producer.subscriber_count(), 0);
    }
}
