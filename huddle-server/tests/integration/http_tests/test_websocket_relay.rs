use huddle_core::{ClientSignal, PeerId, RelaySignal};
use huddle_server::CredentialService;
use serde_json::json;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, sample_offer, spawn_relay};

async fn welcome(client: &mut WsTestClient) -> (PeerId, Vec<PeerId>) {
    let id = match client.next().await.unwrap() {
        RelaySignal::Welcome(id) => id,
        other => panic!("expected welcome, got {:?}", other),
    };
    let users = match client.next().await.unwrap() {
        RelaySignal::ExistingUsers(users) => users,
        other => panic!("expected existing-users, got {:?}", other),
    };
    (id, users)
}

#[tokio::test]
async fn test_two_sockets_negotiate_through_relay() {
    init_tracing();

    let (addr, room) = spawn_relay(CredentialService::new(None, "http://unused")).await;

    let mut a = WsTestClient::connect(addr).await.unwrap();
    let (a_id, a_users) = welcome(&mut a).await;
    assert!(a_users.is_empty());

    let mut b = WsTestClient::connect(addr).await.unwrap();
    let (b_id, b_users) = welcome(&mut b).await;
    assert_eq!(b_users, vec![a_id]);

    assert_eq!(a.next().await.unwrap(), RelaySignal::UserJoined(b_id));

    b.send(&ClientSignal::Offer {
        to: a_id,
        description: sample_offer(),
    })
    .await
    .unwrap();

    assert_eq!(
        a.next().await.unwrap(),
        RelaySignal::Offer {
            from: b_id,
            description: sample_offer()
        }
    );

    b.close().await.unwrap();
    assert_eq!(a.next().await.unwrap(), RelaySignal::UserLeft(b_id));

    // Membership tracks open sockets only.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(room.members().await.unwrap(), vec![a_id]);
}

#[tokio::test]
async fn test_spoofed_sender_is_overwritten() {
    init_tracing();

    let (addr, _room) = spawn_relay(CredentialService::new(None, "http://unused")).await;

    let mut a = WsTestClient::connect(addr).await.unwrap();
    let (a_id, _) = welcome(&mut a).await;
    let mut b = WsTestClient::connect(addr).await.unwrap();
    let (b_id, _) = welcome(&mut b).await;
    a.next().await.unwrap();

    let forged = json!({
        "op": "answer",
        "d": {
            "to": a_id.to_string(),
            "from": PeerId::new().to_string(),
            "description": { "type": "answer", "sdp": "v=0" }
        }
    });
    b.send_raw(forged.to_string()).await.unwrap();

    match a.next().await.unwrap() {
        RelaySignal::Answer { from, .. } => assert_eq!(from, b_id),
        other => panic!("expected answer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_frame_keeps_socket_open() {
    init_tracing();

    let (addr, _room) = spawn_relay(CredentialService::new(None, "http://unused")).await;

    let mut a = WsTestClient::connect(addr).await.unwrap();
    let (a_id, _) = welcome(&mut a).await;
    let mut b = WsTestClient::connect(addr).await.unwrap();
    welcome(&mut b).await;
    a.next().await.unwrap();

    b.send_raw("{not json".into()).await.unwrap();
    b.send(&ClientSignal::Offer {
        to: a_id,
        description: sample_offer(),
    })
    .await
    .unwrap();

    assert!(matches!(a.next().await.unwrap(), RelaySignal::Offer { .. }));
}
