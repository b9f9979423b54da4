//! End-to-end checks of the worker -> channel -> aggregation pipeline
//! against a local mock resolver.

use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::{Message, MessageType};
use spectral::prelude::*;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;

use dnsburst::query::QuerySet;
use dnsburst::stats::{AggregateWindow, StatsMessage};
use dnsburst::target::ResolverTarget;
use dnsburst::worker::{Worker, WorkerOpts, REPORT_BATCH};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers every request with a well-formed response. When `seen` is given,
/// every parsed request is forwarded to the test before it is answered.
async fn spawn_mock_resolver(seen: Option<mpsc::UnboundedSender<Message>>) -> ResolverTarget {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("failed to bind mock resolver");
    let addr = socket.local_addr().expect("failed to read mock resolver addr");

    tokio::spawn(async move {
        let mut buffer = [0u8; 4096];
        loop {
            let (received, peer) = match socket.recv_from(&mut buffer).await {
                Ok(x) => x,
                Err(_) => break,
            };
            let mut message = match Message::from_vec(&buffer[..received]) {
                Ok(message) => message,
                Err(_) => continue,
            };
            if let Some(seen) = &seen {
                let _ = seen.send(message.clone());
            }
            message.set_message_type(MessageType::Response);
            if let Ok(bytes) = message.to_vec() {
                let _ = socket.send_to(&bytes, peer).await;
            }
        }
    });

    ResolverTarget::from(addr)
}

async fn recv(receiver: &mut mpsc::Receiver<StatsMessage>) -> StatsMessage {
    timeout(RECV_TIMEOUT, receiver.recv())
        .await
        .expect("timed out waiting for stats")
        .expect("stats channel closed")
}

#[tokio::test]
async fn worker_updates_fold_into_matching_totals() {
    let target = spawn_mock_resolver(None).await;
    let queries = QuerySet::from_domains([
        "one.example.com.",
        "two.example.com.",
        "three.example.com.",
        "four.example.com.",
    ])
    .expect("failed to parse domains");
    let (sender, mut receiver) = mpsc::channel(2);
    let flood_slots = Arc::new(Semaphore::new(16));

    for (id, partition) in queries.partition(2).into_iter().enumerate() {
        let worker = Worker::new(
            id,
            partition,
            target,
            WorkerOpts::default(),
            sender.clone(),
            Arc::clone(&flood_slots),
        );
        tokio::spawn(worker.run());
    }
    drop(sender);

    let mut window = AggregateWindow::default();
    let mut updates: Vec<StatsMessage> = Vec::new();
    for _ in 0..6 {
        let update = recv(&mut receiver).await;
        window.fold(&update);
        updates.push(update);
    }

    let sent: usize = updates.iter().map(|u| u.sent).sum();
    let errors: usize = updates.iter().map(|u| u.errors).sum();
    let true_max = updates.iter().map(|u| u.max_elapsed).max().unwrap_or_default();

    assert_that(&window.sent()).is_equal_to(sent);
    assert_that(&window.sent()).is_equal_to(6 * REPORT_BATCH);
    assert_that(&window.errors()).is_equal_to(errors);
    assert_that(&window.max_elapsed()).is_equal_to(true_max);
}

#[tokio::test]
async fn iterative_mode_clears_recursion_on_the_wire() {
    let (seen_sender, mut seen_receiver) = mpsc::unbounded_channel();
    let target = spawn_mock_resolver(Some(seen_sender)).await;
    let queries = QuerySet::from_domains(["www.example.com."]).expect("failed to parse domains");
    let (sender, mut receiver) = mpsc::channel(2);
    let opts = WorkerOpts {
        iterative: true,
        ..Default::default()
    };
    let worker = Worker::new(
        0,
        queries.partition(1).remove(0),
        target,
        opts,
        sender,
        Arc::new(Semaphore::new(16)),
    );

    let handle = tokio::spawn(worker.run());
    let request = timeout(RECV_TIMEOUT, seen_receiver.recv())
        .await
        .expect("timed out waiting for a request")
        .expect("mock resolver is gone");
    let _ = recv(&mut receiver).await;
    handle.abort();

    assert_that(&request.recursion_desired()).is_equal_to(false);
}

#[tokio::test]
async fn recursive_mode_keeps_recursion_on_the_wire() {
    let (seen_sender, mut seen_receiver) = mpsc::unbounded_channel();
    let target = spawn_mock_resolver(Some(seen_sender)).await;
    let queries = QuerySet::from_domains(["www.example.com."]).expect("failed to parse domains");
    let (sender, mut receiver) = mpsc::channel(2);
    let worker = Worker::new(
        0,
        queries.partition(1).remove(0),
        target,
        WorkerOpts::default(),
        sender,
        Arc::new(Semaphore::new(16)),
    );

    let handle = tokio::spawn(worker.run());
    let request = timeout(RECV_TIMEOUT, seen_receiver.recv())
        .await
        .expect("timed out waiting for a request")
        .expect("mock resolver is gone");
    let _ = recv(&mut receiver).await;
    handle.abort();

    assert_that(&request.recursion_desired()).is_equal_to(true);
}
