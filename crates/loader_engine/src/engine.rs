use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use loader_core::RequestId;
use loader_logging::{loader_debug, loader_error, loader_info};

use crate::fetch::{ContentClient, ReqwestContentClient};
use crate::{ClientSettings, ContentRequest, EngineEvent};

enum EngineCommand {
    Load {
        request_id: RequestId,
        request: ContentRequest,
    },
}

/// Runs content requests on a background tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Self {
        Self::with_client(Arc::new(ReqwestContentClient::new(settings)))
    }

    pub fn with_client(client: Arc<dyn ContentClient>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    loader_error!("Engine runtime failed to start: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(client.as_ref(), command, event_tx).await;
                });
            }
            loader_debug!("Engine command channel closed");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn request(&self, request_id: RequestId, request: ContentRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Load {
            request_id,
            request,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    client: &dyn ContentClient,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Load {
            request_id,
            request,
        } => {
            let result = match client.load(&request).await {
                Ok(payload) => {
                    loader_info!(
                        "Request {} for '{}' returned {} bytes",
                        request_id,
                        request.fragment_path,
                        payload.content.len()
                    );
                    Ok(payload)
                }
                Err(err) => {
                    loader_info!(
                        "Request {} for '{}' failed: {}",
                        request_id,
                        request.fragment_path,
                        err
                    );
                    Err(err.into_failure())
                }
            };
            let _ = event_tx.send(EngineEvent::FetchCompleted { request_id, result });
        }
    }
}
