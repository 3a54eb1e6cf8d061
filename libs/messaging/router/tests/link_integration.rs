//! Router end to end over real sockets

use bridge_codec::{decode_frame, encode_frame};
use bridge_config::LinkEndpoint;
use bridge_types::{Frame, FrameHeader, MessageId};
use link_router::{HandlerResult, Link, Router, RouterError};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};

#[tokio::test]
async fn test_unix_link_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fcu.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let endpoint = LinkEndpoint::Unix { path: path.clone() };
    let (link, accepted) = tokio::join!(Link::connect(&endpoint), listener.accept());
    let link = link.expect("connect");
    let (mut remote, _) = accepted.unwrap();
    assert_eq!(link.name(), endpoint.to_string());

    let router = Arc::new(Router::new());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    router.register(
        "echo_probe",
        &[MessageId::HIGHRES_IMU],
        Arc::new(move |frame: &Frame| -> HandlerResult {
            tx.send(frame.timestamp_us)?;
            Ok(())
        }),
    );
    let _reader = router.attach(link).await;

    // Outbound
    let outbound = Frame::new(MessageId::HIL_SENSOR, 1_000, vec![7u8; 64]);
    router.send(&outbound).await.unwrap();
    let mut wire = vec![0u8; FrameHeader::SIZE + 64];
    remote.read_exact(&mut wire).await.unwrap();
    assert_eq!(decode_frame(&wire).unwrap(), outbound);

    // Inbound
    let inbound = Frame::new(MessageId::HIGHRES_IMU, 2_000, vec![1u8; 64]);
    remote
        .write_all(&encode_frame(&inbound).unwrap())
        .await
        .unwrap();
    let stamp = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stamp, 2_000);
}

#[tokio::test]
async fn test_tcp_link_loss_makes_send_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let endpoint = LinkEndpoint::Tcp {
        host: "127.0.0.1".to_string(),
        port,
    };

    let (link, accepted) = tokio::join!(Link::connect(&endpoint), listener.accept());
    let router = Arc::new(Router::new());
    let reader = router.attach(link.unwrap()).await;

    drop(accepted.unwrap());
    tokio::time::timeout(Duration::from_secs(2), reader)
        .await
        .unwrap()
        .unwrap();

    let err = router
        .send(&Frame::new(MessageId::HIL_SENSOR, 0, vec![0u8; 64]))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::LinkUnavailable { .. }));
}

#[tokio::test]
async fn test_connect_refused_is_recoverable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = Link::connect(&LinkEndpoint::Tcp {
        host: "127.0.0.1".to_string(),
        port,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, RouterError::Connect { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_concurrent_senders_never_interleave() {
    let (local, mut remote) = tokio::io::duplex(64 * 1024);
    let router = Arc::new(Router::new());
    let _reader = router.attach(Link::new("duplex", local)).await;

    let mut tasks = Vec::new();
    for unit in 0..4u8 {
        let router = Arc::clone(&router);
        tasks.push(tokio::spawn(async move {
            for i in 0..25u64 {
                let frame = Frame::new(MessageId(unit as u32), i, vec![unit; 64]);
                router.send(&frame).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let frame_size = FrameHeader::SIZE + 64;
    let mut wire = vec![0u8; frame_size * 100];
    remote.read_exact(&mut wire).await.unwrap();

    for chunk in wire.chunks(frame_size) {
        let frame = decode_frame(chunk).expect("frames are contiguous and intact");
        assert!(frame.payload.iter().all(|b| *b as u32 == frame.message_id.value()));
    }
}
