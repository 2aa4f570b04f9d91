//! All mutable weather state, bundled in one place.
//!
//! `WeatherState` never performs I/O. Each operation takes the current time,
//! updates the state, and returns the [`Action`]s the caller must carry out:
//! requests to send and notifications for the host.

use std::time::Instant;

use wxpoll_core::{AppError, WeatherConfig};

use crate::icon::{IconCache, IconLookup};
use crate::normalize::normalize;
use crate::provider::WeatherRequest;
use crate::scheduler::{PollDecision, PollScheduler};
use crate::snapshot::WeatherSnapshot;
use crate::types::{FetchError, HostStatus, IconError, VariableValue, VariableValues};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchWeather {
        generation: u64,
        request: WeatherRequest,
    },
    FetchIcon {
        generation: u64,
        code: String,
    },
    Status {
        status: HostStatus,
        message: Option<String>,
    },
    Variables {
        values: VariableValues,
        is_day: Option<bool>,
    },
    IconReady {
        code: String,
        png: Vec<u8>,
    },
    IconUnavailable {
        code: String,
    },
}

#[derive(Debug)]
pub struct WeatherState {
    config: WeatherConfig,
    /// Bumped on every reconfiguration; results tagged with an older
    /// generation are discarded
    generation: u64,
    enabled: bool,
    scheduler: PollScheduler,
    icons: IconCache,
    snapshot: Option<WeatherSnapshot>,
    values: VariableValues,
    is_day: Option<bool>,
    status: Option<(HostStatus, Option<String>)>,
}

impl WeatherState {
    pub fn new(config: WeatherConfig) -> Self {
        let scheduler = PollScheduler::new(config.refresh_interval());
        Self {
            config,
            generation: 0,
            enabled: false,
            scheduler,
            icons: IconCache::new(),
            snapshot: None,
            values: VariableValues::empty(),
            is_day: None,
            status: None,
        }
    }

    /// Arm polling and dispatch the first request.
    ///
    /// Without an API key nothing is polled and the host is told the
    /// configuration is bad.
    pub fn start(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();

        if !self.config.has_api_key() {
            self.enabled = false;
            tracing::warn!("No API key configured, polling disabled");
            actions.extend(self.set_status(HostStatus::BadConfig, Some("Missing API key")));
            return actions;
        }

        self.enabled = true;
        actions.extend(self.set_status(HostStatus::Connecting, None));
        actions.extend(self.tick(now));
        actions
    }

    /// Replace the configuration and reset all polling state.
    ///
    /// When the location is unchanged the last snapshot is re-rendered with
    /// the new settings straight away, without waiting for a request.
    pub fn reconfigure(&mut self, config: WeatherConfig, now: Instant) -> Vec<Action> {
        let same_location = config.location == self.config.location;

        self.generation += 1;
        self.scheduler.reset(config.refresh_interval());
        self.icons = IconCache::new();
        self.values = VariableValues::empty();
        self.is_day = None;
        if !same_location {
            self.snapshot = None;
        }
        self.config = config;

        tracing::info!(
            generation = self.generation,
            units = %self.config.units,
            "Weather configuration updated"
        );

        let mut actions = if self.snapshot.is_some() {
            self.publish()
        } else {
            vec![Action::Variables {
                values: self.values.clone(),
                is_day: None,
            }]
        };
        actions.extend(self.start(now));
        actions
    }

    /// Heartbeat
    pub fn tick(&mut self, now: Instant) -> Vec<Action> {
        if !self.enabled {
            return Vec::new();
        }
        let decision = self.scheduler.tick(now);
        self.dispatch(decision)
    }

    /// Manual refresh, subject to the minimum interval and the error latch
    pub fn refresh(&mut self, now: Instant) -> Vec<Action> {
        if !self.enabled {
            return Vec::new();
        }
        let decision = self.scheduler.request_poll(now);
        self.dispatch(decision)
    }

    /// Manual refresh that clears the error latch first
    pub fn force_refresh(&mut self, now: Instant) -> Vec<Action> {
        if !self.enabled {
            return Vec::new();
        }
        let decision = self.scheduler.force(now);
        self.dispatch(decision)
    }

    /// Completion of a weather request
    pub fn on_weather(
        &mut self,
        generation: u64,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> Vec<Action> {
        if generation != self.generation {
            tracing::debug!(generation, "Discarding stale weather response");
            return Vec::new();
        }

        match result {
            Ok(snapshot) => {
                self.scheduler.on_success();
                tracing::info!("Weather data updated");
                self.snapshot = Some(snapshot);

                let mut actions: Vec<Action> =
                    self.set_status(HostStatus::Ok, Some("Connected")).into_iter().collect();
                actions.extend(self.publish());
                actions
            }
            Err(e) => {
                self.scheduler.on_failure();
                tracing::warn!("Weather request failed: {}", e);

                let status = e.host_status();
                let message = e.message();
                let clears_values =
                    matches!(e, FetchError::Status { .. } | FetchError::Unauthorized(_));
                let summary = AppError::from(e).user_message();
                let mut actions: Vec<Action> =
                    self.set_status(status, Some(&summary)).into_iter().collect();

                if clears_values {
                    self.values = VariableValues::empty();
                    self.values.set("l_name", VariableValue::Text(message));
                    self.is_day = None;
                    actions.push(Action::Variables {
                        values: self.values.clone(),
                        is_day: None,
                    });
                }
                actions
            }
        }
    }

    /// Completion of an icon request; `result` holds the resized PNG
    pub fn on_icon(
        &mut self,
        generation: u64,
        code: &str,
        result: Result<Vec<u8>, IconError>,
    ) -> Vec<Action> {
        if generation != self.generation {
            tracing::debug!(generation, code, "Discarding stale icon response");
            return Vec::new();
        }
        let lookup = self.icons.complete(code, result);
        self.icon_action(lookup).into_iter().collect()
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn values(&self) -> &VariableValues {
        &self.values
    }

    pub fn is_day(&self) -> Option<bool> {
        self.is_day
    }

    pub fn status(&self) -> Option<HostStatus> {
        self.status.as_ref().map(|(status, _)| *status)
    }

    fn dispatch(&self, decision: PollDecision) -> Vec<Action> {
        match decision {
            PollDecision::Dispatch => vec![Action::FetchWeather {
                generation: self.generation,
                request: WeatherRequest::from_config(&self.config),
            }],
            PollDecision::NotDue | PollDecision::TooSoon | PollDecision::Latched => Vec::new(),
        }
    }

    /// Re-render the current snapshot and resolve its icon
    fn publish(&mut self) -> Vec<Action> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Vec::new();
        };

        let normalized = normalize(snapshot, self.config.units);
        self.values = normalized.values;
        self.is_day = normalized.is_day;

        let mut actions = vec![Action::Variables {
            values: self.values.clone(),
            is_day: self.is_day,
        }];

        if let Some(code) = normalized.condition_code {
            let lookup = self.icons.resolve(&code);
            actions.extend(self.icon_action(lookup));
        }
        actions
    }

    fn icon_action(&self, lookup: IconLookup) -> Option<Action> {
        match lookup {
            IconLookup::Ready(code) => {
                let png = self.icons.get(&code)?.to_vec();
                Some(Action::IconReady { code, png })
            }
            IconLookup::Unavailable(code) => Some(Action::IconUnavailable { code }),
            IconLookup::Fetch(code) => Some(Action::FetchIcon {
                generation: self.generation,
                code,
            }),
            IconLookup::Unchanged | IconLookup::Pending => None,
        }
    }

    /// Record a status, returning a notification only when it changed
    fn set_status(&mut self, status: HostStatus, message: Option<&str>) -> Option<Action> {
        let next = (status, message.map(str::to_string));
        if self.status.as_ref() == Some(&next) {
            return None;
        }
        self.status = Some(next.clone());
        Some(Action::Status {
            status: next.0,
            message: next.1,
        })
    }
}
