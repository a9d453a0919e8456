use serde_json::json;
use tokio::net::TcpListener;

use super::*;

#[tokio::test]
async fn test_channel_pair_delivers_both_ways() {
	let (left, right) = ChannelTransport::pair();
	let TransportParts {
		sender: mut left_sender,
		receiver: left_receiver,
		message_rx: mut left_rx,
	} = left;
	let TransportParts {
		sender: mut right_sender,
		receiver: right_receiver,
		message_rx: mut right_rx,
	} = right;

	let left_task = tokio::spawn(left_receiver.run());
	let right_task = tokio::spawn(right_receiver.run());

	left_sender.send(json!({"id": 1, "method": "ping"})).await.unwrap();
	right_sender.send(json!({"id": 1, "result": {}})).await.unwrap();

	assert_eq!(right_rx.recv().await.unwrap()["method"], "ping");
	assert_eq!(left_rx.recv().await.unwrap()["id"], 1);

	// Closing one side ends the peer's read loop.
	left_sender.close().await.unwrap();
	assert!(right_rx.recv().await.is_none());
	right_task.await.unwrap().unwrap();

	drop(right_sender);
	left_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_send_after_close_fails() {
	let (left, _right) = ChannelTransport::pair();
	let mut sender = left.sender;
	sender.close().await.unwrap();
	let err = sender.send(json!({})).await.unwrap_err();
	assert!(err.to_string().contains("closed"));
}

#[tokio::test]
async fn test_messages_arrive_in_order() {
	let (left, right) = ChannelTransport::pair();
	let mut sender = left.sender;
	let mut rx = right.message_rx;
	let read_task = tokio::spawn(right.receiver.run());

	for id in 0..5 {
		sender.send(json!({ "id": id })).await.unwrap();
	}
	for id in 0..5 {
		assert_eq!(rx.recv().await.unwrap()["id"], id);
	}

	drop(sender);
	read_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_websocket_round_trip() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	// Echo server: answers every frame with the same JSON plus "echo": true.
	let server = tokio::spawn(async move {
		let (socket, _) = listener.accept().await.unwrap();
		let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
		let TransportParts {
			mut sender,
			receiver,
			mut message_rx,
		} = WebSocketTransport::from_stream(ws);
		let read_task = tokio::spawn(receiver.run());
		while let Some(mut value) = message_rx.recv().await {
			value["echo"] = json!(true);
			if sender.send(value).await.is_err() {
				break;
			}
		}
		let _ = read_task.await;
	});

	let TransportParts {
		mut sender,
		receiver,
		mut message_rx,
	} = WebSocketTransport::connect(&format!("ws://{addr}")).await.unwrap();
	let read_task = tokio::spawn(receiver.run());

	sender.send(json!({"id": 9, "method": "listContexts"})).await.unwrap();
	let reply = message_rx.recv().await.unwrap();
	assert_eq!(reply["id"], 9);
	assert_eq!(reply["echo"], true);

	sender.close().await.unwrap();
	let _ = read_task.await;
	let _ = server.await;
}

#[tokio::test]
async fn test_connect_refused_is_connection_failed() {
	// Bind then drop to get a port with nothing listening.
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = match WebSocketTransport::connect(&format!("ws://{addr}")).await {
		Ok(_) => panic!("expected connection failure"),
		Err(e) => e,
	};
	assert!(matches!(err, Error::ConnectionFailed { .. }), "got {err:?}");
}

#[test]
fn test_normalize_endpoint() {
	assert_eq!(normalize_endpoint("ws://127.0.0.1:8181/abc=/ws").unwrap(), "ws://127.0.0.1:8181/abc=/ws");
	assert_eq!(normalize_endpoint("http://127.0.0.1:8181/abc=/").unwrap(), "ws://127.0.0.1:8181/abc=/ws");
	assert_eq!(normalize_endpoint("https://example.test/t").unwrap(), "wss://example.test/t/ws");
	assert!(matches!(normalize_endpoint("ftp://x"), Err(Error::InvalidEndpoint(_))));
	assert!(matches!(normalize_endpoint("not a url"), Err(Error::InvalidEndpoint(_))));
}
