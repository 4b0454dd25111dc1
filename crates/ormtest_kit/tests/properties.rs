//! Property tests for the change tracker.

use ormtest_core::{EntityKey, EntityRecord, EntityType, Session};
use ormtest_kit::ChangeTracker;
use ormtest_memory::{MemoryConfig, MemorySession};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    AddTransient(u8, u8),
    Upsert(u8, i64, u8),
    Delete(u8, i64),
    Commit,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..3u8, any::<u8>()).prop_map(|(t, p)| Step::AddTransient(t, p)),
        (0..3u8, 1..6i64, any::<u8>()).prop_map(|(t, k, p)| Step::Upsert(t, k, p)),
        (0..3u8, 1..6i64).prop_map(|(t, k)| Step::Delete(t, k)),
        Just(Step::Commit),
    ]
}

fn type_for(selector: u8) -> EntityType {
    EntityType::new(match selector % 3 {
        0 => "users",
        1 => "posts",
        _ => "tags",
    })
}

fn run_steps(session: &MemorySession, steps: &[Step]) {
    for step in steps {
        match step {
            Step::AddTransient(t, p) => session
                .add(EntityRecord::transient(type_for(*t), vec![*p]))
                .unwrap(),
            Step::Upsert(t, k, p) => session
                .add(EntityRecord::keyed(
                    type_for(*t),
                    EntityKey::from(*k),
                    vec![*p],
                ))
                .unwrap(),
            Step::Delete(t, k) => session.delete(&type_for(*t), &EntityKey::from(*k)).unwrap(),
            Step::Commit => {
                session.commit().unwrap();
            }
        }
    }
    session.commit().unwrap();
}

proptest! {
    #[test]
    fn result_sets_are_pairwise_disjoint(
        seed in proptest::collection::vec((0..3u8, 1..6i64, any::<u8>()), 0..8),
        steps in proptest::collection::vec(step_strategy(), 0..32),
    ) {
        let session = MemorySession::with_config(MemoryConfig::new().strict_delete(false));
        for (t, k, p) in &seed {
            session
                .add(EntityRecord::keyed(type_for(*t), EntityKey::from(*k), vec![*p]))
                .unwrap();
        }
        session.commit().unwrap();

        let tracker = ChangeTracker::all(&session).unwrap();
        run_steps(&session, &steps);
        let changes = tracker.finish().unwrap();

        for t in 0..3u8 {
            let ty = type_for(t);
            let created = changes.created(&ty);
            let updated = changes.updated(&ty);
            let deleted = changes.deleted(&ty);
            prop_assert!(created.intersection(updated).next().is_none());
            prop_assert!(created.intersection(deleted).next().is_none());
            prop_assert!(updated.intersection(deleted).next().is_none());
        }
    }
}
