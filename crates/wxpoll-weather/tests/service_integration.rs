//! Integration tests for WeatherService against a mock OpenWeather server.

use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};
use wxpoll_core::{UnitSystem, WeatherConfig};
use wxpoll_weather::{HostStatus, SharedView, WeatherService, ICON_SIZE};

fn config(server: &MockServer, units: UnitSystem) -> WeatherConfig {
    WeatherConfig {
        api_key: "abc123".into(),
        location: "London,GB".into(),
        units,
        api_base_url: server.uri(),
        icon_base_url: server.uri(),
        ..WeatherConfig::default()
    }
}

fn current_weather() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "dt": 1700000000,
        "timezone": 0,
        "main": { "temp": 300.0, "feels_like": 301.2, "pressure": 1013, "humidity": 81 },
        "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "wind": { "speed": 5.0, "deg": 270 },
        "sys": { "country": "GB", "sunrise": 1699990000, "sunset": 1700030000 }
    })
}

fn icon_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 255, 255])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn mount_weather(server: &MockServer, response: ResponseTemplate, times: impl Into<Times>) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "standard"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_icon(server: &MockServer, times: impl Into<Times>) {
    Mock::given(method("GET"))
        .and(path("/img/wn/01d@2x.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(icon_png()))
        .expect(times)
        .mount(server)
        .await;
}

/// Process messages until `done` holds for the view.
async fn drive_until(
    service: &mut WeatherService<SharedView>,
    view: &SharedView,
    done: impl Fn(&SharedView) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(view) {
            assert!(service.next_message().await);
        }
    })
    .await
    .expect("service did not reach the expected state");
}

#[tokio::test]
async fn test_end_to_end_imperial() {
    let server = MockServer::start().await;
    mount_weather(&server, ResponseTemplate::new(200).set_body_json(current_weather()), 1).await;
    mount_icon(&server, 1).await;

    let view = SharedView::new();
    let mut service =
        WeatherService::new(config(&server, UnitSystem::Imperial), view.clone()).unwrap();
    service.start();
    assert_eq!(view.status(), Some(HostStatus::Connecting));

    drive_until(&mut service, &view, |v| v.icon_code().is_some()).await;

    assert_eq!(view.status(), Some(HostStatus::Ok));
    assert_eq!(view.display("l_name"), "London");
    assert_eq!(view.display("c_temp"), "80\u{b0}");
    assert_eq!(view.display("c_time"), "11-14 22:13");
    assert_eq!(view.display("c_winddir"), "W");
    assert_eq!(view.display("c_day"), "true");
    assert_eq!(view.is_day(), Some(true));

    let icon = view.snapshot().icon.unwrap().1;
    let decoded = image::load_from_memory(&icon).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (ICON_SIZE, ICON_SIZE));
    assert!(view.icon_base64().is_some());
}

#[tokio::test]
async fn test_refresh_within_floor_sends_one_request() {
    let server = MockServer::start().await;
    mount_weather(&server, ResponseTemplate::new(200).set_body_json(current_weather()), 1).await;
    mount_icon(&server, 1).await;

    let view = SharedView::new();
    let mut service =
        WeatherService::new(config(&server, UnitSystem::Imperial), view.clone()).unwrap();
    let handle = service.handle();

    service.start();
    assert!(handle.refresh());
    assert!(handle.refresh());

    drive_until(&mut service, &view, |v| v.icon_code().is_some()).await;
    assert!(handle.force_refresh());
    assert!(service.next_message().await);
    // mock expectations are verified when the server drops
}

#[tokio::test]
async fn test_missing_api_key_never_polls() {
    let server = MockServer::start().await;
    mount_weather(&server, ResponseTemplate::new(200).set_body_json(current_weather()), 0).await;

    let mut cfg = config(&server, UnitSystem::Imperial);
    cfg.api_key.clear();

    let view = SharedView::new();
    let mut service = WeatherService::new(cfg, view.clone()).unwrap();
    service.start();
    service.tick();

    assert_eq!(view.status(), Some(HostStatus::BadConfig));
    assert!(!service.state().is_enabled());
}

#[tokio::test]
async fn test_provider_error_latches() {
    let server = MockServer::start().await;
    mount_weather(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "error": { "message": "quota exceeded" } })),
        1,
    )
    .await;

    let view = SharedView::new();
    let mut service =
        WeatherService::new(config(&server, UnitSystem::Imperial), view.clone()).unwrap();
    service.start();

    drive_until(&mut service, &view, |v| v.status() != Some(HostStatus::Connecting)).await;

    assert_eq!(view.status(), Some(HostStatus::UnknownError));
    assert_eq!(view.status_message().as_deref(), Some("quota exceeded"));
    assert!(service.state().scheduler().is_latched());

    service.tick();
    assert!(service.state().scheduler().is_latched());
}

#[tokio::test]
async fn test_city_not_found_shows_message() {
    let server = MockServer::start().await;
    mount_weather(
        &server,
        ResponseTemplate::new(404)
            .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        1,
    )
    .await;

    let view = SharedView::new();
    let mut service =
        WeatherService::new(config(&server, UnitSystem::Metric), view.clone()).unwrap();
    service.start();

    drive_until(&mut service, &view, |v| v.status() != Some(HostStatus::Connecting)).await;

    assert_eq!(view.status(), Some(HostStatus::UnknownError));
    assert_eq!(view.display("l_name"), "city not found");
    assert_eq!(view.display("c_temp"), "");
}

#[tokio::test]
async fn test_unit_change_recomputes_before_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather()))
        .expect(1..=2)
        .mount(&server)
        .await;
    mount_icon(&server, 1..=2).await;

    let view = SharedView::new();
    let mut service =
        WeatherService::new(config(&server, UnitSystem::Imperial), view.clone()).unwrap();
    let handle = service.handle();
    service.start();
    drive_until(&mut service, &view, |v| v.icon_code().is_some()).await;
    assert_eq!(view.display("c_temp"), "80\u{b0}");

    assert!(handle.reconfigure(config(&server, UnitSystem::Metric)));
    assert!(service.next_message().await);

    assert_eq!(view.display("c_temp"), "27\u{b0}");
    assert_eq!(view.display("c_pressure"), "1013");
    assert_eq!(service.state().generation(), 1);
}
