//! End-to-end watch flow over real sockets: store mutation -> event queue ->
//! dispatcher -> RESP push frame -> client socket.

use std::io::Read;
use std::net::Shutdown;
use std::net::TcpListener;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use d_store::encode_push_response;
use d_store::watch_channels;
use d_store::ClientHandle;
use d_store::KeyPatternExecutor;
use d_store::PushResponse;
use d_store::Query;
use d_store::QueryResult;
use d_store::QueryWatcher;
use d_store::ShardManager;
use d_store::SocketTransport;
use d_store::StoreConfig;
use d_store::SubscriptionRegistry;
use d_store::WatchDispatcher;
use d_store::WatchEvent;
use d_store::WatchOperation;
use d_store::WatchSubscription;
use tokio_util::sync::CancellationToken;

fn connected_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (server, _) = listener.accept().unwrap();
    (server, client)
}

fn expected_frame(
    query: &Query,
    rows: Vec<(&str, &str)>,
) -> Bytes {
    encode_push_response(&PushResponse::new(
        query,
        QueryResult {
            rows: rows
                .into_iter()
                .map(|(k, v)| (k.to_string(), Bytes::from(v.to_string())))
                .collect(),
        },
    ))
}

#[test]
fn test_push_then_self_healing_unsubscribe() {
    let mut config = StoreConfig::default();
    config.shard.shard_count = 4;
    let shards = Arc::new(ShardManager::new(&config, None));
    let transport = Arc::new(SocketTransport::new());
    let registry = Arc::new(SubscriptionRegistry::new());
    let dispatcher = WatchDispatcher::new(
        registry.clone(),
        shards.clone(),
        Arc::new(KeyPatternExecutor),
        transport.clone(),
    );

    let (server, mut client) = connected_pair();
    let server_handle = server.try_clone().unwrap();
    transport.register(ClientHandle(42), server);

    shards.put("user:42", "alice");
    let query = Query::new("user:*");
    registry.add_watcher(query.clone(), ClientHandle(42));

    let event = WatchEvent {
        key: "user:42".to_string(),
        operation: WatchOperation::Set,
    };
    assert_eq!(dispatcher.dispatch(&event), 1);

    let expected = expected_frame(&query, vec![("user:42", "alice")]);
    let mut received = vec![0u8; expected.len()];
    client.read_exact(&mut received).unwrap();
    assert_eq!(Bytes::from(received), expected);

    // nothing beyond the single frame
    client
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut extra = [0u8; 1];
    assert!(client.read(&mut extra).is_err());

    // socket breaks: the failed write unsubscribes the client
    server_handle.shutdown(Shutdown::Write).unwrap();
    assert_eq!(dispatcher.dispatch(&event), 0);
    assert!(!registry.contains(&query, ClientHandle(42)));
    assert!(!registry.contains_query(&query));

    // no further delivery attempt
    assert_eq!(dispatcher.dispatch(&event), 0);
}

#[tokio::test]
async fn test_query_watcher_pushes_across_shards() {
    let mut config = StoreConfig::default();
    config.shard.shard_count = 3;
    let mut channels = watch_channels(&config.watch);
    let shards = Arc::new(ShardManager::new(&config, Some(channels.event_tx.clone())));
    let transport = Arc::new(SocketTransport::new());

    for i in 0..6 {
        shards.put(format!("user:{i}"), format!("v{i}"));
    }
    // seeding happened before anyone watched
    while channels.event_rx.try_recv().is_ok() {}

    let (server, mut client) = connected_pair();
    transport.register(ClientHandle(1), server);

    let watcher = QueryWatcher::new(
        shards.clone(),
        Arc::new(KeyPatternExecutor),
        transport,
        channels.event_rx,
        channels.subscription_rx,
    );
    let registry = watcher.registry();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(cancel.clone()));

    let query = Query::new("user:*");
    channels
        .subscription_tx
        .send(WatchSubscription::subscribe(query.clone(), ClientHandle(1)))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while !registry.contains(&query, ClientHandle(1)) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    shards.put("user:9", "v9");

    let mut rows: Vec<(String, String)> = (0..6).map(|i| (format!("user:{i}"), format!("v{i}"))).collect();
    rows.push(("user:9".to_string(), "v9".to_string()));
    let expected = expected_frame(
        &query,
        rows.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
    );

    client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let received = tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).unwrap();
        (Bytes::from(buf), expected)
    })
    .await
    .unwrap();
    assert_eq!(received.0, received.1);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}
