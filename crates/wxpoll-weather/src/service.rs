//! Async driver for [`WeatherState`].
//!
//! Network work runs on spawned tasks; results come back to the service loop
//! over an mpsc channel, so all state changes happen on one task.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use wxpoll_core::WeatherConfig;

use crate::icon::render_icon;
use crate::provider::WeatherProvider;
use crate::scheduler::HEARTBEAT_INTERVAL;
use crate::sink::HostSink;
use crate::snapshot::WeatherSnapshot;
use crate::state::{Action, WeatherState};
use crate::types::{FetchError, IconError};

/// Messages processed by the service loop
#[derive(Debug)]
pub enum ServiceMessage {
    WeatherDone {
        generation: u64,
        result: Result<WeatherSnapshot, FetchError>,
    },
    IconDone {
        generation: u64,
        code: String,
        result: Result<Vec<u8>, IconError>,
    },
    Refresh {
        force: bool,
    },
    Reconfigure(WeatherConfig),
}

/// Cloneable handle for talking to a running service
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<ServiceMessage>,
}

impl ServiceHandle {
    /// Returns false once the service has stopped
    pub fn refresh(&self) -> bool {
        self.tx.send(ServiceMessage::Refresh { force: false }).is_ok()
    }

    /// Refresh and clear a latched error
    pub fn force_refresh(&self) -> bool {
        self.tx.send(ServiceMessage::Refresh { force: true }).is_ok()
    }

    pub fn reconfigure(&self, config: WeatherConfig) -> bool {
        self.tx.send(ServiceMessage::Reconfigure(config)).is_ok()
    }
}

pub struct WeatherService<S: HostSink> {
    state: WeatherState,
    provider: Arc<WeatherProvider>,
    sink: S,
    tx: mpsc::UnboundedSender<ServiceMessage>,
    rx: mpsc::UnboundedReceiver<ServiceMessage>,
}

impl<S: HostSink> WeatherService<S> {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: WeatherConfig, sink: S) -> Result<Self, FetchError> {
        let provider = WeatherProvider::new(&config)?;
        Ok(Self::with_provider(config, provider, sink))
    }

    pub fn with_provider(config: WeatherConfig, provider: WeatherProvider, sink: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: WeatherState::new(config),
            provider: Arc::new(provider),
            sink,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Arm polling; the first request goes out immediately.
    pub fn start(&mut self) {
        let actions = self.state.start(Instant::now());
        self.apply(actions);
    }

    /// Heartbeat
    pub fn tick(&mut self) {
        let actions = self.state.tick(Instant::now());
        self.apply(actions);
    }

    pub fn handle_message(&mut self, message: ServiceMessage) {
        let now = Instant::now();
        let actions = match message {
            ServiceMessage::WeatherDone { generation, result } => {
                self.state.on_weather(generation, result)
            }
            ServiceMessage::IconDone {
                generation,
                code,
                result,
            } => self.state.on_icon(generation, &code, result),
            ServiceMessage::Refresh { force: false } => self.state.refresh(now),
            ServiceMessage::Refresh { force: true } => self.state.force_refresh(now),
            ServiceMessage::Reconfigure(config) => {
                self.rebuild_provider(&config);
                self.state.reconfigure(config, now)
            }
        };
        self.apply(actions);
    }

    /// Wait for and process one message.
    pub async fn next_message(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => {
                self.handle_message(message);
                true
            }
            None => false,
        }
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.start();

        let mut heartbeat = tokio::time::interval_at(
            tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
            HEARTBEAT_INTERVAL,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let message = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Weather service stopping");
                    break;
                }
                _ = heartbeat.tick() => None,
                Some(message) = self.rx.recv() => Some(message),
            };
            match message {
                Some(message) => self.handle_message(message),
                None => self.tick(),
            }
        }
    }

    fn rebuild_provider(&mut self, config: &WeatherConfig) {
        let current = self.state.config();
        if current.api_base_url == config.api_base_url
            && current.icon_base_url == config.icon_base_url
        {
            return;
        }
        match WeatherProvider::new(config) {
            Ok(provider) => self.provider = Arc::new(provider),
            Err(e) => tracing::error!("Keeping previous endpoints: {}", e),
        }
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::FetchWeather {
                    generation,
                    request,
                } => {
                    let provider = Arc::clone(&self.provider);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = provider.fetch_current(&request).await;
                        let _ = tx.send(ServiceMessage::WeatherDone { generation, result });
                    });
                }
                Action::FetchIcon { generation, code } => {
                    let provider = Arc::clone(&self.provider);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = fetch_rendered_icon(&provider, &code).await;
                        let _ = tx.send(ServiceMessage::IconDone {
                            generation,
                            code,
                            result,
                        });
                    });
                }
                Action::Status { status, message } => {
                    self.sink.status_changed(status, message.as_deref());
                }
                Action::Variables { values, is_day } => {
                    self.sink.variables_updated(&values, is_day);
                }
                Action::IconReady { code, png } => self.sink.icon_ready(&code, &png),
                Action::IconUnavailable { code } => self.sink.icon_unavailable(&code),
            }
        }
    }
}

/// Fetch an icon and scale it on the blocking pool.
pub async fn fetch_rendered_icon(
    provider: &WeatherProvider,
    code: &str,
) -> Result<Vec<u8>, IconError> {
    let raw = provider.fetch_icon(code).await?;
    tokio::task::spawn_blocking(move || render_icon(&raw)).await?
}
