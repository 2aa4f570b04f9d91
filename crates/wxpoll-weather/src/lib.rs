//! Weather polling for wxpoll
//!
//! Polls OpenWeather current conditions, normalizes them into a flat table of
//! display variables and keeps a cache of condition icons.

pub mod icon;
pub mod normalize;
pub mod provider;
pub mod scheduler;
pub mod service;
pub mod sink;
pub mod snapshot;
pub mod state;
pub mod types;
pub mod units;
pub mod variables;

pub use icon::{render_icon, IconCache, IconLookup, ICON_SIZE};
pub use normalize::{normalize, Normalized};
pub use provider::{WeatherProvider, WeatherRequest};
pub use scheduler::{PollDecision, PollPhase, PollScheduler, MIN_POLL_INTERVAL};
pub use service::{fetch_rendered_icon, ServiceHandle, ServiceMessage, WeatherService};
pub use sink::{HostSink, HostView, SharedView};
pub use snapshot::WeatherSnapshot;
pub use state::{Action, WeatherState};
pub use types::*;
pub use variables::{VariableSpec, VARIABLE_TABLE};
