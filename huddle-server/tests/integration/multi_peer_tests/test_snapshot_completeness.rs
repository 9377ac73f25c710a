use huddle_core::RelaySignal;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::TestSession;

const PEERS: usize = 8;

#[tokio::test]
async fn test_kth_joiner_sees_k_minus_one_members() {
    init_tracing();

    let room = create_test_room();
    let mut sessions: Vec<TestSession> = Vec::new();

    for k in 1..=PEERS {
        let mut session = TestSession::join(&room).await.unwrap();
        let snapshot = session.snapshot().await.unwrap();

        assert_eq!(snapshot.len(), k - 1, "joiner #{}", k);
        let earlier: Vec<_> = sessions.iter().map(|s| s.peer_id).collect();
        assert_eq!(snapshot, earlier);

        sessions.push(session);
    }

    for (index, session) in sessions.iter_mut().enumerate() {
        let frames = session.drain().await;
        let joins: Vec<_> = frames
            .iter()
            .filter_map(|s| match s {
                RelaySignal::UserJoined(id) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(joins.len(), PEERS - index - 1);
        let mut unique = joins.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), joins.len(), "duplicate join notification");
    }
}
