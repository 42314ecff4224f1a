// crates/gift-ledger-core/tests/proptest_batch_paging.rs
// ============================================================================
// Module: Batch Paging Property-Based Tests
// Description: Property tests for page coverage and termination.
// Purpose: Show every matching key is visited exactly once in ascending order.
// ============================================================================

//! Property-based tests for batched paging invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use gift_ledger_core::BatchMigrator;
use gift_ledger_core::BatchSource;
use gift_ledger_core::BatchUpdate;
use gift_ledger_core::ConfirmActiveUsers;
use gift_ledger_core::InMemoryUserStore;
use gift_ledger_core::RowKey;
use gift_ledger_core::StoreError;
use gift_ledger_core::Timestamp;
use gift_ledger_core::UserAccount;
use gift_ledger_core::UserAccountStore;
use gift_ledger_core::UserId;
use proptest::prelude::*;

struct SetSource {
    keys: BTreeSet<RowKey>,
    probes: Mutex<usize>,
}

impl BatchSource for SetSource {
    fn keys_after(&self, after: RowKey, limit: usize) -> Result<Vec<RowKey>, StoreError> {
        *self.probes.lock().unwrap() += 1;
        Ok(self.keys.range(after + 1 ..).copied().take(limit).collect())
    }
}

#[derive(Default)]
struct Collect {
    pages: Mutex<Vec<Vec<RowKey>>>,
}

impl BatchUpdate for Collect {
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError> {
        self.pages.lock().unwrap().push(keys.to_vec());
        Ok(keys.len())
    }
}

proptest! {
    #[test]
    fn every_key_lands_in_exactly_one_page(
        keys in prop::collection::btree_set(1u64 .. 50_000, 0 .. 400),
        batch_size in 1usize .. 64,
    ) {
        let source = SetSource { keys: keys.clone(), probes: Mutex::new(0) };
        let update = Collect::default();
        let report = BatchMigrator::new(batch_size).unwrap().run("prop", &source, &update).unwrap();

        let pages = update.pages.lock().unwrap();
        let flattened: Vec<RowKey> = pages.iter().flatten().copied().collect();
        let expected: Vec<RowKey> = keys.iter().copied().collect();
        prop_assert_eq!(&flattened, &expected);

        let expected_pages = keys.len().div_ceil(batch_size);
        prop_assert_eq!(report.pages, expected_pages);
        prop_assert_eq!(*source.probes.lock().unwrap(), expected_pages + 1);
        for page in pages.iter() {
            prop_assert!(!page.is_empty());
            prop_assert!(page.len() <= batch_size);
        }
    }

    #[test]
    fn confirmation_backfill_reaches_a_fixed_point(
        flags in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0 .. 120),
        batch_size in 1usize .. 16,
    ) {
        let store = InMemoryUserStore::new();
        for (index, (is_active, is_confirmed, logged_in)) in flags.iter().enumerate() {
            let id = u64::try_from(index).unwrap() + 1;
            store.upsert(UserAccount {
                id: UserId::from_raw(id).unwrap(),
                email: format!("user{id}@example.com"),
                is_active: *is_active,
                is_confirmed: *is_confirmed,
                last_login: logged_in.then(|| Timestamp::from_unix_millis(1)),
                jwt_token_key: None,
            }).unwrap();
        }
        let expected_updates = flags
            .iter()
            .filter(|(is_active, is_confirmed, logged_in)| *is_active && !*is_confirmed && *logged_in)
            .count();

        let migrator = BatchMigrator::new(batch_size).unwrap();
        let backfill = ConfirmActiveUsers::new(&store);
        let first = backfill.run(&migrator, "confirm").unwrap();
        let second = backfill.run(&migrator, "confirm").unwrap();

        prop_assert_eq!(first.updated, expected_updates);
        prop_assert_eq!(second.updated, 0);
        prop_assert!(store.confirmation_candidates_after(0, usize::MAX).unwrap().is_empty());
        for (index, (is_active, is_confirmed, _)) in flags.iter().enumerate() {
            let id = UserId::from_raw(u64::try_from(index).unwrap() + 1).unwrap();
            let account = store.get(id).unwrap().unwrap();
            prop_assert_eq!(account.is_active, *is_active);
            if *is_confirmed {
                prop_assert!(account.is_confirmed);
            }
        }
    }
}
