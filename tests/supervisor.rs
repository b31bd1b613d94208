//! End-to-end tests: launching fleets, serving, failing and shutting down.

use std::time::Duration;

use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use http_supervisor::auth::DefaultAuthenticatorFactory;
use http_supervisor::config::AuthenticationPolicy;
use http_supervisor::http::base_router;
use http_supervisor::net::{ListenerError, ListenerState};
use http_supervisor::{launch, SupervisionGroup, SupervisorError};

mod common;

use common::{bearer_policy, client, loopback_server, PROMPTLY};

#[tokio::test]
async fn cancellation_shuts_down_every_listener() {
    let group = SupervisionGroup::new();
    let configurations = vec![loopback_server(2), loopback_server(1)];

    let handles = launch(&configurations, base_router(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();
    assert_eq!(group.registered(), 6);

    let client = client();
    let mut addrs = Vec::new();
    for handle in &handles {
        let addr = handle.listening().await.expect("listener should bind");
        let res = client
            .get(format!("http://{addr}/healthz"))
            .send()
            .await
            .expect("listener unreachable");
        assert_eq!(res.status(), 200);
        addrs.push(addr);
    }

    group.cancel();
    tokio::time::timeout(PROMPTLY, group.wait())
        .await
        .expect("group should stop promptly")
        .expect("clean shutdown is success");

    for handle in &handles {
        assert_eq!(handle.state(), ListenerState::Closed);
    }
    for addr in addrs {
        TcpListener::bind(addr).await.expect("socket should be released");
    }
}

#[tokio::test]
async fn bind_failure_fails_the_whole_fleet() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let occupied_addr = occupied.local_addr().unwrap().to_string();

    let group = SupervisionGroup::new();
    let mut broken = loopback_server(0);
    broken.listen_addresses.push(occupied_addr.clone());
    let configurations = vec![loopback_server(2), broken];

    let handles = launch(&configurations, base_router(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();

    let err = tokio::time::timeout(PROMPTLY, group.wait())
        .await
        .expect("group should stop promptly")
        .unwrap_err();
    match err.as_ref() {
        SupervisorError::Listener(ListenerError::Bind { address, .. }) => {
            assert_eq!(address, &occupied_addr);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(group.is_cancelled());
    for handle in &handles {
        assert_eq!(handle.state(), ListenerState::Closed);
    }
}

#[tokio::test]
async fn duplicate_addresses_race_at_bind() {
    let addr = {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap().to_string()
    };

    let group = SupervisionGroup::new();
    let mut configuration = loopback_server(0);
    configuration.listen_addresses = vec![addr.clone(), addr.clone()];

    launch(&[configuration], Router::new(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();

    let err = tokio::time::timeout(PROMPTLY, group.wait())
        .await
        .unwrap()
        .unwrap_err();
    match err.as_ref() {
        SupervisorError::Listener(e) => {
            assert!(matches!(e, ListenerError::Bind { .. }), "{e}");
            assert_eq!(e.address(), addr);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn authentication_is_enforced_per_configuration() {
    let group = SupervisionGroup::new();
    let mut protected = loopback_server(1);
    protected.authentication_policy = Some(bearer_policy(&[("s3cret", "ci")]));
    let open = loopback_server(1);

    let handles = launch(&[protected, open], base_router(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();
    let protected_addr = handles[0].listening().await.unwrap();
    let open_addr = handles[1].listening().await.unwrap();

    let client = client();

    let res = client
        .get(format!("http://{protected_addr}/whoami"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{protected_addr}/whoami"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    assert_eq!(res.text().await.unwrap(), "Invalid bearer token");

    let res = client
        .get(format!("http://{protected_addr}/whoami"))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ci");

    let res = client
        .get(format!("http://{open_addr}/whoami"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "anonymous");

    group.cancel();
    assert!(group.wait().await.is_ok());
}

#[tokio::test]
async fn construction_error_leaves_earlier_listeners_running() {
    let group = SupervisionGroup::new();
    let valid = loopback_server(1);
    let mut invalid = loopback_server(1);
    invalid.authentication_policy = Some(AuthenticationPolicy::Any(vec![]));
    let never_reached = loopback_server(1);

    let err = launch(
        &[valid, invalid, never_reached],
        base_router(),
        &group,
        &DefaultAuthenticatorFactory,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SupervisorError::Authenticator { index: 1, .. }), "{err}");
    assert_eq!(group.registered(), 2);
    assert!(!group.is_cancelled());

    // The listener from the first configuration is still serving.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(group.running(), 2);

    group.cancel();
    assert!(group.wait().await.is_ok());
}

#[tokio::test]
async fn tls_listener_starts_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let group = SupervisionGroup::new();
    let mut configuration = loopback_server(1);
    configuration.tls = Some(common::self_signed_tls(dir.path()));

    let handles = launch(&[configuration], base_router(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();
    let addr = handles[0].listening().await.expect("TLS listener should bind");
    assert!(addr.ip().is_loopback());

    // A plaintext request must not be served on the TLS port.
    {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut reply = Vec::new();
        let _ = tokio::time::timeout(PROMPTLY, stream.read_to_end(&mut reply)).await;
        assert!(
            !reply.starts_with(b"HTTP/1.1 200"),
            "plaintext request was answered: {}",
            String::from_utf8_lossy(&reply)
        );
    }

    group.cancel();
    tokio::time::timeout(PROMPTLY, group.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(handles[0].state(), ListenerState::Closed);
}

#[tokio::test]
async fn parent_cancellation_stops_the_fleet() {
    let parent = CancellationToken::new();
    let group = SupervisionGroup::with_parent(&parent);

    let handles = launch(&[loopback_server(2)], base_router(), &group, &DefaultAuthenticatorFactory)
        .await
        .unwrap();
    for handle in &handles {
        handle.listening().await.unwrap();
    }

    parent.cancel();
    tokio::time::timeout(PROMPTLY, group.wait())
        .await
        .unwrap()
        .unwrap();
    for handle in &handles {
        handle.closed().await;
    }
}
