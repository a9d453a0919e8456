//! Integration tests driving a real agent service over the in-memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use uibridge::{
	CapabilityInfo, CapabilityName, ChannelDialer, ConnectionState, Connector, ConnectorConfig, Error, ErrorClass,
	HotReloadOutcome, Rect,
};
use uibridge_agent::testing::{FakeHost, FakeNode, run_local};
use uibridge_agent::{Agent, AgentConfig, CapabilityResult, HostErrorReport, ServiceHost, UiHost};
use uibridge_protocol::fault::codes;
use uibridge_protocol::service::ReloadReport;

const SCREEN: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);

struct Target {
	agent: Agent,
	host: Arc<FakeHost>,
	root: Arc<FakeNode>,
	reports: Arc<Mutex<Vec<HostErrorReport>>>,
}

fn target() -> Target {
	let root = FakeNode::new("Scaffold")
		.bounds(SCREEN)
		.child(
			FakeNode::new("ElevatedButton")
				.key("ok")
				.text("OK")
				.bounds(Rect::new(0.0, 0.0, 100.0, 40.0)),
		)
		.child(
			FakeNode::new("TextField")
				.key("email")
				.text_input()
				.bounds(Rect::new(0.0, 60.0, 300.0, 40.0)),
		)
		.build();
	let host = Arc::new(FakeHost::new(Arc::clone(&root), SCREEN));
	let reports = Arc::new(Mutex::new(Vec::new()));
	let sink = {
		let reports = Arc::clone(&reports);
		Arc::new(move |report: &HostErrorReport| reports.lock().push(report.clone()))
	};
	let agent = Agent::new(Arc::clone(&host) as Arc<dyn UiHost>, AgentConfig::default())
		.unwrap()
		.with_error_sink(sink);
	Target {
		agent,
		host,
		root,
		reports,
	}
}

fn test_config() -> ConnectorConfig {
	ConnectorConfig {
		hot_reload_probe_timeout: Duration::from_millis(50),
		..ConnectorConfig::default()
	}
}

/// Connector whose every dial is served by a fresh session of `service`.
fn connector_for(service: ServiceHost, config: ConnectorConfig, dials: Arc<AtomicUsize>) -> Connector {
	Connector::with_dialer(
		config,
		ChannelDialer::new(move |_endpoint, parts| {
			dials.fetch_add(1, Ordering::SeqCst);
			let service = service.clone();
			tokio::task::spawn_local(async move {
				let _ = service.serve(parts).await;
			});
			Ok(())
		}),
	)
}

async fn connected(target: &Target) -> Connector {
	let connector = connector_for(
		ServiceHost::new(target.agent.clone()),
		test_config(),
		Arc::new(AtomicUsize::new(0)),
	);
	connector.connect("memory://target").await.unwrap();
	connector
}

fn criteria(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		other => panic!("criteria must be an object, got {other}"),
	}
}

fn name(value: &str) -> CapabilityName {
	CapabilityName::parse(value).unwrap()
}

#[tokio::test]
async fn invoke_returns_tagged_handler_data() {
	run_local(async {
		let target = target();
		target
			.agent
			.register("nav.get", Some("Current route"), |_| async {
				Ok(CapabilityResult::success(criteria(json!({"route": "/home"}))))
			})
			.unwrap();

		let connector = connected(&target).await;
		assert_eq!(connector.state(), ConnectionState::Connected);
		assert_eq!(connector.context_id().as_deref(), Some("context/1"));
		assert!(connector.known_capabilities().contains(&name("nav.get")));

		let reply = connector.invoke("nav.get", Map::new()).await.unwrap();
		assert_eq!(
			reply,
			json!({"type": "_extensionType", "method": "nav.get", "status": "success", "route": "/home"})
		);
	})
	.await;
}

#[tokio::test]
async fn invoke_while_disconnected_never_dials() {
	run_local(async {
		let target = target();
		let dials = Arc::new(AtomicUsize::new(0));
		let connector = connector_for(ServiceHost::new(target.agent.clone()), test_config(), Arc::clone(&dials));

		let err = connector.invoke("nav.get", Map::new()).await.unwrap_err();
		assert!(matches!(err, Error::NotConnected));
		assert_eq!(err.class(), ErrorClass::Connectivity);
		assert_eq!(dials.load(Ordering::SeqCst), 0);
	})
	.await;
}

#[tokio::test]
async fn malformed_names_fail_before_connectivity() {
	run_local(async {
		let target = target();
		let connector = connector_for(
			ServiceHost::new(target.agent.clone()),
			test_config(),
			Arc::new(AtomicUsize::new(0)),
		);

		for bad in ["", "ext.foo"] {
			let err = connector.invoke(bad, Map::new()).await.unwrap_err();
			assert!(matches!(err, Error::InvalidCapabilityName(_)), "{bad:?}: {err}");
			assert_eq!(err.class(), ErrorClass::Validation);
		}
	})
	.await;
}

#[tokio::test]
async fn uncaught_handler_fault_reaches_caller_and_host() {
	run_local(async {
		let target = target();
		target
			.agent
			.register("orders.submit", None, |_| async { Err(anyhow::anyhow!("boom")) })
			.unwrap();
		let connector = connected(&target).await;

		let err = connector.invoke("orders.submit", Map::new()).await.unwrap_err();
		let Error::Internal { message, data } = &err else {
			panic!("expected internal fault, got {err:?}");
		};
		assert!(message.contains("boom"));
		assert!(message.contains("orders.submit"));
		assert_eq!(data.as_ref().unwrap()["method"], "orders.submit");
		assert_eq!(err.class(), ErrorClass::Unexpected);

		let reports = target.reports.lock();
		assert_eq!(reports.len(), 1);
		assert_eq!(reports[0].method, "orders.submit");
		assert_eq!(reports[0].exception, "boom");
	})
	.await;
}

#[tokio::test(start_paused = true)]
async fn wait_for_unregistered_name_times_out() {
	run_local(async {
		let target = target();
		let connector = connected(&target).await;

		let started = tokio::time::Instant::now();
		assert_eq!(connector.wait_for(&name("x"), Some(Duration::from_millis(100))).await, None);
		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(110), "{elapsed:?}");

		target
			.agent
			.register("x", None, |_| async { Ok(CapabilityResult::success(Map::new())) })
			.unwrap();
		assert_eq!(connector.wait_for(&name("x"), None).await, Some(name("x")));
	})
	.await;
}

#[tokio::test]
async fn late_registration_wakes_waiter() {
	run_local(async {
		let target = target();
		let connector = Arc::new(connected(&target).await);

		let waiter = {
			let connector = Arc::clone(&connector);
			tokio::spawn(async move { connector.wait_for(&name("cart.clear"), Some(Duration::from_secs(5))).await })
		};
		tokio::task::yield_now().await;

		target
			.agent
			.register("cart.clear", None, |_| async { Ok(CapabilityResult::success(Map::new())) })
			.unwrap();
		assert_eq!(waiter.await.unwrap(), Some(name("cart.clear")));

		let reply = connector.invoke("cart.clear", Map::new()).await.unwrap();
		assert_eq!(reply["status"], "success");
	})
	.await;
}

#[tokio::test]
async fn disconnect_releases_waiters_and_is_idempotent() {
	run_local(async {
		let target = target();
		let connector = Arc::new(connected(&target).await);

		let waiter = {
			let connector = Arc::clone(&connector);
			tokio::spawn(async move { connector.wait_for(&name("never"), Some(Duration::from_secs(60))).await })
		};
		tokio::task::yield_now().await;

		connector.disconnect().await;
		assert_eq!(waiter.await.unwrap(), None);
		assert_eq!(connector.state(), ConnectionState::Disconnected);
		assert_eq!(connector.context_id(), None);
		assert!(connector.known_capabilities().is_empty());

		connector.disconnect().await;
		assert_eq!(connector.state(), ConnectionState::Disconnected);
		assert!(matches!(
			connector.invoke("uibridge.ping", Map::new()).await,
			Err(Error::NotConnected)
		));
	})
	.await;
}

#[tokio::test]
async fn connect_while_connected_reconnects() {
	run_local(async {
		let target = target();
		let dials = Arc::new(AtomicUsize::new(0));
		let connector = connector_for(ServiceHost::new(target.agent.clone()), test_config(), Arc::clone(&dials));

		connector.connect("memory://a").await.unwrap();
		connector.connect("memory://b").await.unwrap();
		assert_eq!(dials.load(Ordering::SeqCst), 2);
		assert_eq!(connector.state(), ConnectionState::Connected);

		let reply = connector.invoke("uibridge.ping", Map::new()).await.unwrap();
		assert_eq!(reply["alive"], true);
	})
	.await;
}

#[tokio::test]
async fn connect_without_liveness_context_rolls_back() {
	run_local(async {
		let target = target();
		let connector = connector_for(
			ServiceHost::new(target.agent.clone()),
			ConnectorConfig {
				liveness_capability: "other.marker".into(),
				..test_config()
			},
			Arc::new(AtomicUsize::new(0)),
		);

		let err = connector.connect("memory://target").await.unwrap_err();
		assert!(matches!(&err, Error::NoContext(marker) if marker == "other.marker"));
		assert_eq!(err.class(), ErrorClass::Connectivity);
		assert_eq!(connector.state(), ConnectionState::Disconnected);
		assert!(connector.known_capabilities().is_empty());
	})
	.await;
}

#[tokio::test]
async fn refused_dial_is_a_connect_failure() {
	run_local(async {
		let connector = Connector::with_dialer(
			ConnectorConfig::default(),
			ChannelDialer::new(|_, _| Err("refused".to_string())),
		);

		let err = connector.connect("memory://nowhere").await.unwrap_err();
		assert!(matches!(&err, Error::ConnectFailed { reason, .. } if reason == "refused"));
		assert_eq!(connector.state(), ConnectionState::Disconnected);
	})
	.await;
}

#[tokio::test]
async fn hot_reload_falls_back_to_reload_sources() {
	run_local(async {
		let target = target();
		target.host.set_reload(Ok(ReloadReport {
			success: true,
			notices: vec!["3 libraries reloaded".into()],
		}));
		let connector = connected(&target).await;

		let outcome = connector.hot_reload().await.unwrap();
		assert_eq!(
			outcome,
			HotReloadOutcome::ReloadSources {
				success: true,
				notices: vec!["3 libraries reloaded".into()],
			}
		);
		assert!(outcome.succeeded());
	})
	.await;
}

#[tokio::test]
async fn hot_reload_prefers_registered_alternate() {
	run_local(async {
		let target = target();
		let connector = connected(&target).await;
		target
			.agent
			.register("uibridge.hotReload", None, |_| async {
				Ok(CapabilityResult::success(criteria(json!({"reloaded": 7}))))
			})
			.unwrap();

		let HotReloadOutcome::Capability { capability, result } = connector.hot_reload().await.unwrap() else {
			panic!("expected the alternate reload to be used");
		};
		assert_eq!(capability, "uibridge.hotReload");
		assert_eq!(result["reloaded"], 7);
	})
	.await;
}

#[tokio::test]
async fn typed_wrappers_drive_the_ui() {
	run_local(async {
		let target = target();
		target
			.agent
			.register("nav.get", Some("Current route"), |_| async {
				Ok(CapabilityResult::success(Map::new()))
			})
			.unwrap();
		target.agent.logs().append("info", "app started");
		target.host.set_screens(Ok(vec![b"png-1".to_vec()]));
		let connector = connected(&target).await;

		let elements = connector.list_elements().await.unwrap();
		let keys: Vec<_> = elements.iter().filter_map(|e| e.key.as_deref()).collect();
		assert_eq!(keys, ["ok", "email"]);
		assert!(elements.iter().all(|e| e.visible));

		let tapped = connector.tap(criteria(json!({"key": "ok"}))).await.unwrap();
		assert_eq!(tapped.message, "Tapped Key(\"ok\")");
		assert_eq!(target.host.taps().len(), 1);

		let entered = connector
			.enter_text(criteria(json!({"key": "email"})), "a@b.c")
			.await
			.unwrap();
		assert_eq!(entered.message, "Entered text into Key(\"email\")");
		assert_eq!(target.root.find("email").unwrap().entered_text().as_deref(), Some("a@b.c"));

		let scrolled = connector.scroll_to(criteria(json!({"text": "OK"}))).await.unwrap();
		assert_eq!(scrolled.message, "Scrolled to Text(\"OK\")");

		let logs = connector.get_logs(true).await.unwrap();
		assert_eq!(logs.len(), 1);
		assert_eq!(logs[0].message, "app started");
		assert!(connector.get_logs(false).await.unwrap().is_empty());

		assert_eq!(connector.take_screenshots().await.unwrap(), ["cG5nLTE="]);

		assert_eq!(
			connector.list_custom_capabilities().await.unwrap(),
			[CapabilityInfo {
				name: "nav.get".into(),
				description: Some("Current route".into()),
			}]
		);
	})
	.await;
}

#[tokio::test]
async fn unresolved_matcher_is_an_application_fault() {
	run_local(async {
		let target = target();
		let connector = connected(&target).await;

		let err = connector.tap(criteria(json!({"key": "missing"}))).await.unwrap_err();
		assert!(matches!(err, Error::Application { code, .. } if code == codes::ELEMENT_NOT_FOUND));
		assert_eq!(err.class(), ErrorClass::Application);

		let err = connector.tap(Map::new()).await.unwrap_err();
		assert!(matches!(err, Error::InvalidParams(_)));
	})
	.await;
}

#[tokio::test]
async fn connects_over_websocket() {
	run_local(async {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let target = target();
		let service = ServiceHost::new(target.agent.clone());
		tokio::task::spawn_local(async move {
			let _ = service.serve_websocket(listener).await;
		});

		let connector = Connector::new(ConnectorConfig::default());
		connector.connect(&format!("http://{addr}/token/")).await.unwrap();
		let reply = connector.invoke("uibridge.ping", Map::new()).await.unwrap();
		assert_eq!(reply["alive"], true);
		connector.disconnect().await;
	})
	.await;
}
