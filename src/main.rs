use anyhow::Result;
use tokio_util::sync::CancellationToken;
use wxpoll_core::Config;
use wxpoll_weather::{HostSink, HostStatus, SharedView, VariableValues, WeatherService};

/// Prints each update and keeps the shared view current.
struct ConsoleSink {
    view: SharedView,
}

impl HostSink for ConsoleSink {
    fn status_changed(&mut self, status: HostStatus, message: Option<&str>) {
        println!("[{:?}] {}", status, message.unwrap_or(""));
        self.view.status_changed(status, message);
    }

    fn variables_updated(&mut self, values: &VariableValues, is_day: Option<bool>) {
        if !values.display("l_name").is_empty() {
            println!(
                "{}, {}: {} ({}), feels {}, wind {} {}",
                values.display("l_name"),
                values.display("l_country"),
                values.display("c_temp"),
                values.display("c_desc"),
                values.display("c_feels"),
                values.display("c_wind"),
                values.display("c_winddir"),
            );
        }
        self.view.variables_updated(values, is_day);
    }

    fn icon_ready(&mut self, code: &str, png: &[u8]) {
        println!("Icon {} ({} bytes)", code, png.len());
        self.view.icon_ready(code, png);
    }

    fn icon_unavailable(&mut self, code: &str) {
        self.view.icon_unavailable(code);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    wxpoll_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!(
        location = %config.weather.location,
        units = %config.weather.units,
        "wxpoll started"
    );

    let sink = ConsoleSink {
        view: SharedView::new(),
    };
    let service = WeatherService::new(config.weather, sink)?;

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(service.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    shutdown.cancel();
    task.await?;

    tracing::info!("wxpoll stopped");
    Ok(())
}
