//! Service runner: the harness that serves a [`Service`] over the broker.
//!
//! The runner subscribes to the service's query topic and, for each
//! delivery, decodes the request, calls the service, and publishes the
//! response (or a fault) on the response topic with the request id echoed.
//! Handlers run on the blocking pool so a large maze does not stall the
//! async workers.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use arcade_net::{DeliveryStream, Envelope, EnvelopeHeader, Fault, NetError, Transport};

use crate::service::Service;

/// Serves one [`Service`] on its topic pair.
#[derive(Debug)]
pub struct ServiceRunner<S> {
    /// The service being served.
    service: S,
    /// Unique instance identifier for this runner.
    instance_id: String,
}

impl<S: Service> ServiceRunner<S> {
    /// Create a new runner.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self {
            service,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the unique instance ID for this runner.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.service.name()
    }

    /// Subscribe and serve until the subscription ends.
    ///
    /// A response that cannot be encoded or published is logged and skipped;
    /// the loop keeps serving later requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription fails or a handler panics.
    pub async fn run(self, transport: Arc<dyn Transport>) -> Result<()> {
        let queries = self.subscribe(transport.as_ref()).await?;
        self.serve(transport, queries).await
    }

    /// Subscribe, then serve on a background task.
    ///
    /// Requests published after this returns are guaranteed to be seen.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription fails.
    pub async fn spawn(self, transport: Arc<dyn Transport>) -> Result<JoinHandle<Result<()>>> {
        let queries = self.subscribe(transport.as_ref()).await?;
        Ok(tokio::spawn(self.serve(transport, queries)))
    }

    async fn subscribe(&self, transport: &dyn Transport) -> Result<DeliveryStream> {
        let topics = self.service.topics();
        let queries = transport.subscribe(&topics.query).await?;
        info!(
            service = self.name(),
            instance_id = self.instance_id,
            query = topics.query,
            response = topics.response,
            "service subscribed"
        );
        Ok(queries)
    }

    async fn serve(self, transport: Arc<dyn Transport>, mut queries: DeliveryStream) -> Result<()> {
        let topics = self.service.topics();
        let runner = Arc::new(self);
        while let Some(delivery) = queries.next().await {
            let worker = Arc::clone(&runner);
            let reply =
                tokio::task::spawn_blocking(move || worker.respond(&delivery.payload)).await?;
            let reply = match reply {
                Ok(Some(reply)) => reply,
                Ok(None) => continue,
                Err(e) => {
                    error!(service = runner.name(), error = %e, "failed to encode reply");
                    continue;
                }
            };
            if let Err(e) = transport.publish(&topics.response, reply).await {
                error!(
                    service = runner.name(),
                    topic = %topics.response,
                    error = %e,
                    "failed to publish reply"
                );
            }
        }
        info!(service = runner.name(), "query subscription ended");
        Ok(())
    }

    /// Turn one raw request payload into the payload to publish.
    ///
    /// Returns `None` when the payload is unusable and carries no request id
    /// to address a fault to.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the reply cannot be serialised.
    pub fn respond(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, NetError> {
        let service = self.name();
        let request_id = match EnvelopeHeader::read(payload) {
            Ok(header) => header.request_id,
            Err(e) => {
                warn!(service, error = %e, "dropping malformed request");
                return Ok(None);
            }
        };

        let request: S::Request = match arcade_net::decode(payload) {
            Ok(request) => request,
            Err(e) if request_id.is_some() => {
                warn!(service, ?request_id, error = %e, "rejecting undecodable request");
                return fault(request_id, e.to_string()).map(Some);
            }
            Err(e) => {
                warn!(service, error = %e, "dropping malformed request");
                return Ok(None);
            }
        };

        match self.service.handle(request) {
            Ok(response) => {
                debug!(service, ?request_id, "request served");
                arcade_net::encode(&Envelope {
                    request_id,
                    body: &response,
                })
                .map(Some)
            }
            Err(e) => {
                warn!(service, ?request_id, error = %e, "request rejected");
                fault(request_id, e.to_string()).map(Some)
            }
        }
    }
}

fn fault(request_id: Option<Uuid>, error: String) -> Result<Vec<u8>, NetError> {
    arcade_net::encode(&Envelope {
        request_id,
        body: &Fault { error },
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use arcade_games::{
        Board, Cell, Mark, MazeRequest, MazeResponse, Position, Square, TicTacToeRequest,
        TicTacToeResponse,
    };
    use arcade_games::GameError;
    use arcade_net::{BridgeConfig, LocalBroker, MazeClient, TicTacToeClient, TopicPair};

    use super::*;
    use crate::service::{MazeService, TicTacToeService};

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    fn config() -> BridgeConfig {
        BridgeConfig::new().with_response_timeout(Duration::from_secs(2))
    }

    async fn start_services(broker: &LocalBroker) {
        let transport: Arc<dyn Transport> = Arc::new(broker.clone());
        ServiceRunner::new(MazeService::default().with_seed(3))
            .spawn(Arc::clone(&transport))
            .await
            .unwrap();
        ServiceRunner::new(TicTacToeService)
            .spawn(transport)
            .await
            .unwrap();
    }

    /// Shares a [`LocalBroker`] but fails the next publish when armed.
    #[derive(Debug, Clone)]
    struct FlakyTransport {
        broker: LocalBroker,
        fail_next: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(NetError::Closed);
            }
            self.broker.publish(topic, payload).await
        }

        async fn subscribe(&self, topic: &str) -> Result<DeliveryStream, NetError> {
            self.broker.subscribe(topic).await
        }
    }

    #[test]
    fn test_runner_creation() {
        let runner = ServiceRunner::new(TicTacToeService);
        assert_eq!(runner.name(), "tictactoe");
        assert!(!runner.instance_id().is_empty());
    }

    #[test]
    fn test_respond_echoes_request_id() {
        let runner = ServiceRunner::new(MazeService::default().with_seed(1));
        let id = Uuid::new_v4();
        let payload = arcade_net::encode(&Envelope {
            request_id: Some(id),
            body: &MazeRequest::corner_to_corner(5, 5),
        })
        .unwrap();

        let reply = runner.respond(&payload).unwrap().unwrap();
        let header = EnvelopeHeader::read(&reply).unwrap();
        assert_eq!(header.request_id, Some(id));
        assert!(header.error.is_none());
        let response: MazeResponse = arcade_net::decode(&reply).unwrap();
        assert_eq!(response.maze.width(), 5);
    }

    #[test]
    fn test_respond_serves_legacy_clients() {
        let runner = ServiceRunner::new(TicTacToeService);
        let payload = br#"{"grid": [[null, null, null], [null, null, null], [null, null, null]],
                           "current_player": "X", "move": [1, 1]}"#;
        let reply = runner.respond(payload).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&reply).unwrap();
        assert!(json.get("request_id").is_none());
        assert_eq!(json["status"], "move");
        assert_eq!(json["next_move"], serde_json::json!([0, 0]));
    }

    #[test]
    fn test_respond_drops_garbage() {
        let runner = ServiceRunner::new(TicTacToeService);
        assert!(runner.respond(b"\xff\xfe").unwrap().is_none());
        assert!(runner.respond(br#"{"grid": 3}"#).unwrap().is_none());
    }

    #[test]
    fn test_respond_faults_undecodable_request_with_id() {
        let runner = ServiceRunner::new(MazeService::default());
        let id = Uuid::new_v4();
        let payload = format!(r#"{{"request_id": "{id}", "width": "wide"}}"#);
        let reply = runner.respond(payload.as_bytes()).unwrap().unwrap();
        let header = EnvelopeHeader::read(&reply).unwrap();
        assert_eq!(header.request_id, Some(id));
        assert!(header.error.is_some());
    }

    #[tokio::test]
    async fn test_maze_round_trip() {
        let broker = LocalBroker::new();
        start_services(&broker).await;
        let client = MazeClient::connect(Arc::new(broker.clone()), config())
            .await
            .unwrap();

        let request = MazeRequest::corner_to_corner(16, 12);
        let response = client.generate(&request).await.unwrap();

        let maze = &response.maze;
        assert_eq!((maze.width(), maze.height()), (16, 12));
        assert!(maze.is_path(request.exit_position));
        let reached = maze.reachable_from(Position(0, 0));
        assert_eq!(reached.len(), maze.path_count());
        assert!(!response.hazards.contains(&request.exit_position));
        assert!(!response.hazards.contains(&request.start_position));
        assert!(
            response
                .hazards
                .iter()
                .all(|&hazard| maze.get(hazard) == Some(Cell::Wall))
        );
    }

    #[test]
    fn test_respond_faults_oversized_maze() {
        let runner = ServiceRunner::new(MazeService::default().with_seed(1));
        let id = Uuid::new_v4();
        let payload = format!(
            r#"{{"request_id": "{id}", "width": 9223372036854775807, "height": 1,
                 "exit_position": [0, 0], "start_position": [0, 0]}}"#
        );
        let reply = runner.respond(payload.as_bytes()).unwrap().unwrap();
        let header = EnvelopeHeader::read(&reply).unwrap();
        assert_eq!(header.request_id, Some(id));
        assert!(header.error.unwrap().contains("exceed the limit"));
    }

    #[tokio::test]
    async fn test_oversized_maze_comes_back_as_fault() {
        let broker = LocalBroker::new();
        start_services(&broker).await;
        let client = MazeClient::connect(Arc::new(broker.clone()), config())
            .await
            .unwrap();

        let request = MazeRequest::new(i64::MAX, 1, Position(0, 0), Position(0, 0));
        let err = client.generate(&request).await.unwrap_err();
        let expected = GameError::TooLarge {
            width: i64::MAX,
            height: 1,
            limit: arcade_games::maze::DEFAULT_MAX_DIMENSION,
        };
        assert!(matches!(err, NetError::Remote(msg) if msg == expected.to_string()));

        // The service is still up after rejecting it.
        let response = client
            .generate(&MazeRequest::corner_to_corner(5, 5))
            .await
            .unwrap();
        assert_eq!(response.maze.width(), 5);
    }

    #[tokio::test]
    async fn test_failed_publish_does_not_stop_the_runner() {
        let broker = LocalBroker::new();
        let flaky = FlakyTransport {
            broker: broker.clone(),
            fail_next: Arc::new(AtomicBool::new(true)),
        };
        let handle = ServiceRunner::new(TicTacToeService)
            .spawn(Arc::new(flaky.clone()))
            .await
            .unwrap();
        let client = TicTacToeClient::connect(
            Arc::new(broker.clone()),
            BridgeConfig::new().with_response_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap();
        let request = TicTacToeRequest {
            grid: Board::new(),
            current_player: Mark::X,
            player_move: Square(1, 1),
        };

        let lost = client.play(&request).await.unwrap_err();
        assert!(matches!(lost, NetError::Timeout { .. }));
        assert!(!flaky.fail_next.load(Ordering::SeqCst));

        let served = client.play(&request).await.unwrap();
        assert!(matches!(served, TicTacToeResponse::Move { .. }));
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn test_maze_fault_reaches_caller() {
        let broker = LocalBroker::new();
        start_services(&broker).await;
        let client = MazeClient::connect(Arc::new(broker.clone()), config())
            .await
            .unwrap();

        let request = MazeRequest::new(-1, 8, Position(0, 0), Position(0, 0));
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, NetError::Remote(msg) if msg.contains("must be positive")));
    }

    #[tokio::test]
    async fn test_tictactoe_turns() {
        let broker = LocalBroker::new();
        start_services(&broker).await;
        let client = TicTacToeClient::connect(Arc::new(broker.clone()), config())
            .await
            .unwrap();

        let opening = client
            .play(&TicTacToeRequest {
                grid: Board::new(),
                current_player: Mark::X,
                player_move: Square(1, 1),
            })
            .await
            .unwrap();
        assert_eq!(
            opening,
            TicTacToeResponse::Move {
                grid: Board::from_rows([[O, E, E], [E, X, E], [E, E, E]]),
                next_move: Square(0, 0),
            }
        );

        let winning = client
            .play(&TicTacToeRequest {
                grid: Board::from_rows([[X, X, E], [O, O, E], [E, E, E]]),
                current_player: Mark::X,
                player_move: Square(0, 2),
            })
            .await
            .unwrap();
        assert!(matches!(
            winning,
            TicTacToeResponse::Win {
                winner: Mark::X,
                winning_line: [Square(0, 0), Square(0, 1), Square(0, 2)],
                ..
            }
        ));

        let occupied = client
            .play(&TicTacToeRequest {
                grid: Board::from_rows([[O, E, E], [E, X, E], [E, E, E]]),
                current_player: Mark::X,
                player_move: Square(1, 1),
            })
            .await
            .unwrap_err();
        assert!(matches!(occupied, NetError::Remote(_)));
    }

    #[tokio::test]
    async fn test_concurrent_clients_share_topics() {
        let broker = LocalBroker::new();
        start_services(&broker).await;

        let mut clients = Vec::new();
        for _ in 0..4 {
            clients.push(
                MazeClient::connect(Arc::new(broker.clone()), config())
                    .await
                    .unwrap(),
            );
        }
        let sizes = [(5, 5), (8, 6), (11, 7), (4, 9)];
        let requests: Vec<MazeRequest> = sizes
            .iter()
            .map(|&(w, h)| MazeRequest::corner_to_corner(w, h))
            .collect();
        let calls = clients
            .iter()
            .zip(&requests)
            .map(|(client, request)| client.generate(request));
        let responses = futures::future::join_all(calls).await;

        let dims: BTreeSet<(usize, usize)> = responses
            .into_iter()
            .map(|response| {
                let maze = response.unwrap().maze;
                (maze.width(), maze.height())
            })
            .collect();
        assert_eq!(dims, sizes.into_iter().collect());
    }

    #[tokio::test]
    async fn test_runner_survives_malformed_requests() {
        let broker = LocalBroker::new();
        start_services(&broker).await;
        broker
            .publish(&TopicPair::labyrinth().query, b"{not json".to_vec())
            .await
            .unwrap();

        let client = MazeClient::connect(Arc::new(broker.clone()), config())
            .await
            .unwrap();
        let response = client
            .generate(&MazeRequest::corner_to_corner(3, 3))
            .await
            .unwrap();
        let open: HashSet<Position> = response.maze.reachable_from(Position(0, 0));
        assert!(open.contains(&Position(0, 2)));
    }
}
