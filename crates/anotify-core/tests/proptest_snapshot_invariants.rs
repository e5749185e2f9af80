//! Property-based invariant tests for snapshots and the `when` resolver.
//!
//! 1. Data and error are never both present, whatever transform chain runs.
//! 2. A stack trace is present exactly when an error is present.
//! 3. `is_reloading` == payload present && loading.
//! 4. `in_state` only changes the connection state.
//! 5. The resolver always yields exactly one outcome, and the only failure is
//!    an empty `done` snapshot without a `none` handler.
//! 6. Loading is chosen iff the snapshot is loading and not skipped, or it is
//!    an empty in-flight / empty none-without-handler snapshot.

use anotify_core::{AsyncError, ConnectionState, Resolution, Snapshot, SnapshotError};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn state_strategy() -> impl Strategy<Value = ConnectionState> {
    prop_oneof![
        Just(ConnectionState::None),
        Just(ConnectionState::Waiting),
        Just(ConnectionState::Active),
        Just(ConnectionState::Done),
    ]
}

fn snapshot_strategy() -> impl Strategy<Value = Snapshot<i32>> {
    (state_strategy(), 0u8..3, any::<i32>()).prop_map(|(state, kind, value)| match kind {
        0 => Snapshot::empty(state),
        1 => Snapshot::with_data(state, value),
        _ => Snapshot::with_error(state, AsyncError::msg(format!("err {value}"))),
    })
}

#[derive(Debug, Clone)]
enum Op {
    Data(ConnectionState, i32),
    Error(ConnectionState),
    InState(ConnectionState),
    MapData,
    Nothing,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (state_strategy(), any::<i32>()).prop_map(|(s, v)| Op::Data(s, v)),
        state_strategy().prop_map(Op::Error),
        state_strategy().prop_map(Op::InState),
        Just(Op::MapData),
        Just(Op::Nothing),
    ]
}

fn apply(snap: &Snapshot<i32>, op: &Op) -> Snapshot<i32> {
    match op {
        Op::Data(state, value) => Snapshot::with_data(*state, *value),
        Op::Error(state) => Snapshot::with_error(*state, AsyncError::msg("op")),
        Op::InState(state) => snap.in_state(*state),
        Op::MapData => snap.map_data(|v| v.wrapping_add(1)),
        Op::Nothing => Snapshot::nothing(),
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Payload invariants over transform chains
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn data_and_error_mutually_exclusive(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut snap = Snapshot::nothing();
        for op in &ops {
            snap = apply(&snap, op);
            prop_assert!(!(snap.has_data() && snap.has_error()), "both present after {:?}", op);
            prop_assert_eq!(snap.has_none(), !snap.has_data() && !snap.has_error());
            prop_assert_eq!(snap.stack_trace().is_some(), snap.has_error());
            prop_assert_eq!(
                snap.is_reloading(),
                (snap.has_data() || snap.has_error()) && snap.is_loading()
            );
        }
    }

    // ═════════════════════════════════════════════════════════════════════
    // 4. in_state preserves payload
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn in_state_only_changes_state(snap in snapshot_strategy(), state in state_strategy()) {
        let moved = snap.in_state(state);
        prop_assert_eq!(moved.connection_state(), state);
        prop_assert_eq!(moved.data(), snap.data());
        prop_assert_eq!(moved.error(), snap.error());
    }

    // ═════════════════════════════════════════════════════════════════════
    // 5–6. Resolver totality and precedence
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn resolver_is_total_except_empty_done(
        snap in snapshot_strategy(),
        skip in any::<bool>(),
        has_none in any::<bool>(),
    ) {
        match snap.resolve(skip, has_none) {
            Ok(Resolution::Loading) => {
                let blocking = snap.is_loading() && !skip;
                let empty_fallback = snap.has_none()
                    && (snap.is_loading()
                        || (snap.connection_state() == ConnectionState::None && !has_none));
                prop_assert!(blocking || empty_fallback);
            }
            Ok(Resolution::Error(err)) => {
                prop_assert_eq!(Some(err), snap.error());
                prop_assert!(skip || !snap.is_loading());
            }
            Ok(Resolution::Data(v)) => {
                prop_assert_eq!(Some(v), snap.data());
                prop_assert!(skip || !snap.is_loading());
            }
            Ok(Resolution::None) => {
                prop_assert!(has_none && snap.has_none() && !snap.is_loading());
            }
            Err(SnapshotError::EmptyCompletion) => {
                prop_assert!(!has_none);
                prop_assert!(snap.has_none());
                prop_assert_eq!(snap.connection_state(), ConnectionState::Done);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn maybe_when_never_panics(snap in snapshot_strategy(), skip in any::<bool>()) {
        let out = snap
            .maybe_when(|| 0u8)
            .data(|_| 1)
            .error(|_| 2)
            .loading(|| 3)
            .skip_loading(skip)
            .resolve();
        prop_assert!(out <= 3);
    }
}
