mod common;

use std::time::Duration;

use common::{ann, bob, history, message, Call, FakeBackend};

use spektr_client::conversation::ConversationView;
use spektr_client::{ClientError, Route};
use spektr_shared::constants::POLL_INTERVAL;
use spektr_shared::protocol::MessagesReply;
use spektr_shared::{ChatId, MessageId, Peer, UserId};

fn loads(backend: &FakeBackend) -> usize {
    backend.count(|c| matches!(c, Call::ListMessages(_)))
}

#[tokio::test(start_paused = true)]
async fn mounted_view_polls_until_unmounted() {
    let backend = FakeBackend::new();
    backend.set_standing_history(history(vec![message(1, &bob(), "hi")]));
    let view = ConversationView::mount(ChatId(7), UserId(1), backend.clone(), POLL_INTERVAL);

    // First load happens on mount.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(loads(&backend), 1);
    assert_eq!(view.messages().len(), 1);
    assert!(view.is_polling());

    tokio::time::sleep(POLL_INTERVAL).await;
    assert_eq!(loads(&backend), 2);
    tokio::time::sleep(POLL_INTERVAL * 2).await;
    assert_eq!(loads(&backend), 4);

    view.unmount();
    tokio::time::sleep(POLL_INTERVAL * 10).await;
    assert_eq!(loads(&backend), 4);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_view_stops_polling() {
    let backend = FakeBackend::new();
    let view = ConversationView::mount(ChatId(7), UserId(1), backend.clone(), POLL_INTERVAL);
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(view);

    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(loads(&backend), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_failures_keep_last_history() {
    let backend = FakeBackend::new();
    backend.push_history(Ok(history(vec![message(1, &bob(), "hi")])));
    backend.push_history(Err(ClientError::Transport("timeout".into())));
    backend.set_standing_history(history(vec![
        message(1, &bob(), "hi"),
        message(2, &ann(), "hey"),
    ]));
    let view = ConversationView::mount(ChatId(7), UserId(1), backend.clone(), POLL_INTERVAL);

    tokio::time::sleep(POLL_INTERVAL + Duration::from_millis(10)).await;
    assert_eq!(loads(&backend), 2);
    assert_eq!(view.messages().len(), 1);

    tokio::time::sleep(POLL_INTERVAL).await;
    assert_eq!(view.messages().len(), 2);
}

#[tokio::test]
async fn later_issued_history_wins() {
    let view = ConversationView::new(ChatId(7), UserId(1), FakeBackend::new());
    let first = view.begin_history();
    let second = view.begin_history();

    let newer = history(vec![message(1, &bob(), "hi"), message(2, &ann(), "hey")]);
    let older = history(vec![message(1, &bob(), "hi")]);
    assert!(view.apply_history(second, Ok(newer)).unwrap());
    assert!(!view.apply_history(first, Ok(older)).unwrap());

    let ids: Vec<MessageId> = view.messages().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![MessageId(1), MessageId(2)]);
}

#[tokio::test]
async fn peer_from_explicit_field_or_scan() {
    let backend = FakeBackend::new();
    let explicit = Peer {
        id: UserId(2),
        username: "@bob".into(),
        first_name: "Bob".into(),
        avatar_url: None,
    };
    // Only my own messages so far; the backend names the peer.
    backend.push_history(Ok(MessagesReply {
        messages: vec![message(1, &ann(), "anyone?")],
        peer: Some(explicit.clone()),
    }));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.load_history().await.unwrap();
    assert_eq!(view.peer(), Some(explicit));

    // Older backend: derived from the first foreign sender.
    let view = ConversationView::new(ChatId(8), UserId(1), backend.clone());
    backend.push_history(Ok(history(vec![
        message(1, &ann(), "hi"),
        message(2, &bob(), "hello"),
    ])));
    view.load_history().await.unwrap();
    assert_eq!(view.peer().map(|p| p.id), Some(UserId(2)));
}

#[tokio::test]
async fn unknown_peer_until_they_write() {
    let backend = FakeBackend::new();
    backend.push_history(Ok(history(vec![message(1, &ann(), "hi")])));
    let view = ConversationView::new(ChatId(7), UserId(1), backend);
    view.load_history().await.unwrap();
    assert!(view.peer().is_none());
}

#[tokio::test]
async fn blank_input_is_not_sent() {
    let backend = FakeBackend::new();
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("   ");

    assert!(matches!(
        view.send_message().await,
        Err(ClientError::Validation(_))
    ));
    assert_eq!(view.input(), "   ");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn successful_send_clears_input_and_reloads() {
    let backend = FakeBackend::new();
    backend.push_send(Ok(MessageId(5)));
    backend.set_standing_history(history(vec![message(5, &ann(), "hello")]));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("hello");

    assert_eq!(view.send_message().await.unwrap(), MessageId(5));
    assert_eq!(view.input(), "");
    assert!(!view.is_sending());
    assert_eq!(view.messages().len(), 1);
    assert_eq!(
        backend.calls(),
        vec![
            Call::Send {
                chat: ChatId(7),
                sender: UserId(1),
                text: "hello".into()
            },
            Call::ListMessages(ChatId(7)),
        ]
    );
}

#[tokio::test]
async fn failed_send_keeps_input() {
    let backend = FakeBackend::new();
    backend.push_send(Err(ClientError::Rejected("Chat not found".into())));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("hello");

    assert!(view.send_message().await.is_err());
    assert_eq!(view.input(), "hello");
    assert_eq!(view.error().as_deref(), Some("Chat not found"));
    assert_eq!(loads(&backend), 0);
}

#[tokio::test]
async fn block_without_peer_is_refused() {
    let backend = FakeBackend::new();
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());

    assert!(matches!(view.block_peer().await, Err(ClientError::NoPeer)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn block_returns_to_chat_list() {
    let backend = FakeBackend::new();
    backend.push_history(Ok(history(vec![message(1, &bob(), "hi")])));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.load_history().await.unwrap();

    assert_eq!(view.block_peer().await.unwrap(), Route::ChatList);
    assert!(backend.calls().contains(&Call::Block {
        blocker: UserId(1),
        blocked: UserId(2)
    }));
}

#[tokio::test]
async fn repeated_loads_leave_history_unchanged() {
    let backend = FakeBackend::new();
    backend.set_standing_history(history(vec![
        message(1, &bob(), "hi"),
        message(2, &ann(), "hey"),
        message(3, &bob(), "how are you"),
    ]));
    let view = ConversationView::new(ChatId(5), UserId(1), backend);

    view.load_history().await.unwrap();
    let before = view.messages();
    view.load_history().await.unwrap();
    view.load_history().await.unwrap();

    assert_eq!(view.messages(), before);
}

#[tokio::test]
async fn input_is_sent_as_typed() {
    let backend = FakeBackend::new();
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("  hello  ");

    view.send_message().await.unwrap();

    assert_eq!(
        backend.calls()[0],
        Call::Send {
            chat: ChatId(7),
            sender: UserId(1),
            text: "  hello  ".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn second_send_while_first_outstanding_is_refused() {
    let backend = FakeBackend::new();
    backend.stall_next(1);
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("hello");

    let mut first = Box::pin(view.send_message());
    assert!(tokio::time::timeout(Duration::from_millis(10), &mut first)
        .await
        .is_err());
    assert!(view.is_sending());

    assert!(matches!(view.send_message().await, Err(ClientError::Busy)));
    assert_eq!(backend.count(|c| matches!(c, Call::Send { .. })), 1);

    drop(first);
    assert!(!view.is_sending());
}

#[tokio::test(start_paused = true)]
async fn abandoned_send_does_not_block_the_next_one() {
    let backend = FakeBackend::new();
    backend.stall_next(1);
    backend.push_send(Ok(MessageId(9)));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.set_input("hello");

    let abandoned = tokio::time::timeout(Duration::from_secs(1), view.send_message()).await;
    assert!(abandoned.is_err());
    assert!(!view.is_sending());
    assert_eq!(view.input(), "hello");

    assert_eq!(view.send_message().await.unwrap(), MessageId(9));
    assert_eq!(view.input(), "");
    assert_eq!(backend.count(|c| matches!(c, Call::Send { .. })), 2);
}

#[tokio::test]
async fn failed_block_keeps_the_conversation() {
    let backend = FakeBackend::new();
    backend.push_history(Ok(history(vec![message(1, &bob(), "hi")])));
    backend.push_block(Err(ClientError::Rejected("Cannot block this user".into())));
    let view = ConversationView::new(ChatId(7), UserId(1), backend.clone());
    view.load_history().await.unwrap();

    assert!(matches!(
        view.block_peer().await,
        Err(ClientError::Rejected(_))
    ));
    assert_eq!(view.error().as_deref(), Some("Cannot block this user"));
    assert_eq!(view.peer().map(|p| p.id), Some(UserId(2)));
    assert_eq!(view.messages().len(), 1);
}
