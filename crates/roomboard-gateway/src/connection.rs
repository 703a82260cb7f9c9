use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::hub::{Hub, Subscription};

/// Timing knobs for one push-channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimings {
    /// How often the server sends a Ping. Two consecutive missed Pongs
    /// drop the connection.
    pub heartbeat_interval: Duration,

    /// Upper bound on a single frame write. A client that cannot accept a
    /// frame within this window is disconnected.
    pub send_timeout: Duration,
}

impl Default for ConnectionTimings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            send_timeout: Duration::from_secs(5),
        }
    }
}

/// Serve one push-channel connection for `room_id` until either side
/// goes away. Clients only listen; anything they send besides control
/// frames is ignored.
pub async fn handle_connection(socket: WebSocket, hub: Hub, room_id: String) {
    let subscription = hub.subscribe(&room_id).await;
    let id = subscription.id;
    let (sender, receiver) = socket.split();

    info!("Subscriber {} connected to room '{}'", id, room_id);
    run_connection(sender, receiver, &hub, subscription, ConnectionTimings::default()).await;
    info!("Subscriber {} disconnected from room '{}'", id, room_id);
}

/// Pump hub events into `sender` and watch `receiver` for Pongs and Close
/// until either side ends. The subscription is removed from the hub on exit.
pub async fn run_connection<S, R, E>(
    mut sender: S,
    mut receiver: R,
    hub: &Hub,
    subscription: Subscription,
    timings: ConnectionTimings,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: fmt::Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send,
{
    let Subscription { id, mut rx } = subscription;
    let ConnectionTimings {
        heartbeat_interval,
        send_timeout,
    } = timings;

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward hub events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = rx.recv() => {
                    // None: the hub dropped us (queue overflow or shutdown)
                    let Some(event) = event else { break };

                    let frame = Message::Text(event.to_string().into());
                    match tokio::time::timeout(send_timeout, sender.send(frame)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            debug!("Subscriber {} send failed: {}", id, e);
                            break;
                        }
                        Err(_) => {
                            warn!("Subscriber {} send timed out after {:?}", id, send_timeout);
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping subscriber {}", missed_heartbeats, id);
                            break;
                        }
                    }
                    let ping = sender.send(Message::Ping(Bytes::new()));
                    if !matches!(tokio::time::timeout(send_timeout, ping).await, Ok(Ok(()))) {
                        break;
                    }
                }
            }
        }

        let _ = tokio::time::timeout(send_timeout, sender.send(Message::Close(None))).await;
    });

    // Read control frames from client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unsubscribe(id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_util::stream;
    use tokio::time::Instant;
    use uuid::Uuid;

    use crate::hub::BroadcastScope;
    use roomboard_types::events::BoardEvent;

    const TIMINGS: ConnectionTimings = ConnectionTimings {
        heartbeat_interval: Duration::from_secs(15),
        send_timeout: Duration::from_secs(5),
    };

    /// A client that never reads: every write stays pending.
    struct StalledClient;

    impl Sink<Message> for StalledClient {
        type Error = Infallible;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }
    }

    fn silent() -> stream::Pending<Result<Message, Infallible>> {
        stream::pending()
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_is_dropped_after_send_timeout() {
        let hub = Hub::new(BroadcastScope::Room);
        let subscription = hub.subscribe("general").await;
        hub.publish("general", BoardEvent::MessageCreated(Uuid::new_v4()))
            .await;

        let start = Instant::now();
        run_connection(StalledClient, silent(), &hub, subscription, TIMINGS).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= TIMINGS.send_timeout);
        assert!(elapsed < TIMINGS.heartbeat_interval);
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn two_missed_pongs_drop_the_connection() {
        let hub = Hub::new(BroadcastScope::Room);
        let subscription = hub.subscribe("general").await;

        let start = Instant::now();
        let client = futures_util::sink::drain::<Message>();
        run_connection(client, silent(), &hub, subscription, TIMINGS).await;

        // first ping is free, the next two go unanswered
        let elapsed = start.elapsed();
        assert!(elapsed >= TIMINGS.heartbeat_interval * 3);
        assert!(elapsed < TIMINGS.heartbeat_interval * 4);
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn answering_pongs_keeps_the_connection_alive() {
        let hub = Hub::new(BroadcastScope::Room);
        let subscription = hub.subscribe("general").await;

        // pong every half interval for five intervals, then hang up
        let half = TIMINGS.heartbeat_interval / 2;
        let pongs = stream::unfold(0u32, move |n| async move {
            if n == 10 {
                return None;
            }
            tokio::time::sleep(half).await;
            Some((Ok::<_, Infallible>(Message::Pong(Bytes::new())), n + 1))
        });

        let start = Instant::now();
        let client = futures_util::sink::drain::<Message>();
        run_connection(client, Box::pin(pongs), &hub, subscription, TIMINGS).await;

        assert!(start.elapsed() >= TIMINGS.heartbeat_interval * 5);
        assert_eq!(hub.subscriber_count().await, 0);
    }
}
