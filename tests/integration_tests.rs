use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Weekday};
use tower::ServiceExt;

use barberbook::catalog;
use barberbook::config::AppConfig;
use barberbook::models::{WebhookEvent, WebhookPayload};
use barberbook::services::notifications;
use barberbook::services::webhook::{HttpTransport, WebhookDispatcher};
use barberbook::state::AppState;
use barberbook::store::{BookingStore, MemoryStorage};

// ── Webhook receiver ──

#[derive(Clone, Default)]
struct Receiver {
    hits: Arc<AtomicU32>,
    fail_first: u32,
    payloads: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn receive(
    State(receiver): State<Receiver>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let hit = receiver.hits.fetch_add(1, Ordering::SeqCst) + 1;
    receiver.payloads.lock().unwrap().push(body);
    if hit <= receiver.fail_first {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

/// Starts a local endpoint that fails the first `fail_first` requests.
async fn spawn_receiver(fail_first: u32) -> (String, Receiver) {
    let receiver = Receiver {
        fail_first,
        ..Default::default()
    };
    let app = Router::new()
        .route("/hook", post(receive))
        .with_state(receiver.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), receiver)
}

async fn wait_for_hits(receiver: &Receiver, expected: u32) {
    for _ in 0..100 {
        if receiver.hits.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {expected} webhook hits, got {}",
        receiver.hits.load(Ordering::SeqCst)
    );
}

// ── Helpers ──

fn test_config(webhook_url: &str) -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        webhook_url: webhook_url.to_string(),
        public_url: "https://albibarber.example".to_string(),
        slot_interval_minutes: 20,
        webhook_retries: 3,
        webhook_backoff: Duration::from_millis(5),
        opening_hours: catalog::default_opening_hours(),
    }
}

fn test_state(webhook_url: &str) -> Arc<AppState> {
    let config = test_config(webhook_url);
    let store = BookingStore::load(Box::new(MemoryStorage::new()), &config.webhook_url).unwrap();
    let webhooks = WebhookDispatcher::new(Box::new(HttpTransport::new()))
        .with_retries(config.webhook_retries)
        .with_backoff_base(config.webhook_backoff);
    Arc::new(AppState {
        store: Mutex::new(store),
        config,
        webhooks: Arc::new(webhooks),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    barberbook::router(state)
}

/// Next Monday strictly after today; every default barber but Simone works.
fn next_monday() -> NaiveDate {
    let mut date = Local::now().date_naive() + ChronoDuration::days(1);
    while date.weekday() != Weekday::Mon {
        date += ChronoDuration::days(1);
    }
    date
}

fn next_sunday() -> NaiveDate {
    next_monday() - ChronoDuration::days(1) + ChronoDuration::days(7)
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn booking_body(date: NaiveDate, time: &str, barber: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "serviceIds": ["1", "6"],
        "barberId": barber,
        "date": date.format("%Y-%m-%d").to_string(),
        "time": time,
        "name": "Marco",
        "surname": "Rossi",
        "phone": "+39 333 1234567",
        "email": "marco@example.it",
        "notes": null
    })
}

async fn create_booking(app: &Router, date: NaiveDate, time: &str, barber: Option<&str>) -> serde_json::Value {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/bookings", booking_body(date, time, barber)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

// ── Public API ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_services_and_team() {
    let app = test_app(test_state(""));

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let services = body_json(res).await;
    assert_eq!(services.as_array().unwrap().len(), 16);

    let res = app
        .oneshot(Request::builder().uri("/api/team").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let team = body_json(res).await;
    assert_eq!(team[0]["id"], "alberto");
}

#[tokio::test]
async fn test_dates_skip_sundays() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(Request::builder().uri("/api/dates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = serde_json::from_value(body_json(res).await).unwrap();
    assert_eq!(dates.len(), 12);
    assert!(dates.iter().all(|d| d.weekday() != Weekday::Sun));
}

#[tokio::test]
async fn test_slots_for_open_and_closed_days() {
    let app = test_app(test_state(""));

    let uri = format!("/api/slots?date={}", next_monday().format("%Y-%m-%d"));
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let slots = json["slots"].as_array().unwrap();
    assert_eq!(slots.first().unwrap(), "09:00");
    assert_eq!(slots.last().unwrap(), "18:50");

    let uri = format!("/api/slots?date={}", next_sunday().format("%Y-%m-%d"));
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(res).await;
    assert!(json["slots"].as_array().unwrap().is_empty());
}

async fn get_slots(app: &Router, date: NaiveDate, query: &str) -> serde_json::Value {
    let uri = format!("/api/slots?date={}{query}", date.format("%Y-%m-%d"));
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

fn strings(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap()
}

#[tokio::test]
async fn test_slots_report_taken_times() {
    let app = test_app(test_state(""));
    let monday = next_monday();
    // Services 1 + 6 last 45 minutes: 10:00-10:45.
    create_booking(&app, monday, "10:00", Some("marco")).await;

    let json = get_slots(&app, monday, "&barber=marco").await;
    assert_eq!(json["taken"], serde_json::json!(["10:00", "10:20", "10:40"]));
    // Taken times are reported, never removed from the slot list.
    assert!(json["slots"].as_array().unwrap().iter().any(|s| s == "10:00"));

    let json = get_slots(&app, monday, "&barber=marco&duration=45").await;
    assert_eq!(
        json["taken"],
        serde_json::json!(["09:20", "09:40", "10:00", "10:20", "10:40"])
    );

    let json = get_slots(&app, monday, "&barber=luca&duration=45").await;
    assert!(json["taken"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_taken_slots_match_booking_outcome() {
    let app = test_app(test_state(""));
    let monday = next_monday();
    create_booking(&app, monday, "10:00", Some("marco")).await;

    // Same services as `booking_body`, so the same 45 minute length.
    let json = get_slots(&app, monday, "&barber=marco&duration=45").await;
    let taken = strings(&json["taken"]);
    let slots = strings(&json["slots"]);
    assert!(!taken.is_empty());

    for slot in &slots {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/bookings",
                booking_body(monday, slot, Some("marco")),
            ))
            .await
            .unwrap();

        if taken.contains(slot) {
            assert_eq!(res.status(), StatusCode::CONFLICT, "slot {slot}");
            continue;
        }
        assert_eq!(res.status(), StatusCode::CREATED, "slot {slot}");

        // Release the slot again so the next one is judged against the
        // original booking only.
        let id = body_json(res).await["id"].as_str().unwrap().to_string();
        let res = app
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/bookings/{id}/status"),
                Some(serde_json::json!({ "status": "cancelled" })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_create_and_fetch_booking() {
    let app = test_app(test_state(""));
    let booking = create_booking(&app, next_monday(), "09:20", Some("luca")).await;

    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["totalDuration"], 45);
    assert_eq!(booking["totalPrice"], 28.0);

    let id = booking["id"].as_str().unwrap();
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["barberId"], "luca");
}

#[tokio::test]
async fn test_booking_not_found() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings/NOPE00")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_on_closed_day_rejected() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            booking_body(next_sunday(), "10:00", None),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_booking_off_grid_time_rejected() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            booking_body(next_monday(), "13:40", None),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_conflicting_booking_rejected() {
    let app = test_app(test_state(""));
    let monday = next_monday();
    create_booking(&app, monday, "11:00", Some("alberto")).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/bookings",
            booking_body(monday, "11:20", Some("alberto")),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_succeeds_when_webhook_unreachable() {
    // Nothing listens on port 9; delivery fails but the booking stands.
    let state = test_state("http://127.0.0.1:9/hook");
    let app = test_app(state.clone());
    create_booking(&app, next_monday(), "15:00", None).await;
    assert_eq!(state.store.lock().unwrap().bookings().len(), 1);
}

// ── Admin API ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/dashboard")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_dashboard() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(admin_request("GET", "/api/admin/dashboard", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["totalBookings"], 0);
    assert_eq!(json["teamSize"], 4);
}

#[tokio::test]
async fn test_admin_complete_then_cancel_rejected() {
    let app = test_app(test_state(""));
    let booking = create_booking(&app, next_monday(), "09:00", None).await;
    let id = booking["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/api/admin/bookings/{id}/status"),
            Some(serde_json::json!({ "status": "completed" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/api/admin/bookings/{id}/status"),
            Some(serde_json::json!({ "status": "cancelled" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .oneshot(admin_request("GET", "/api/admin/bookings?status=completed", None))
        .await
        .unwrap();
    let list = body_json(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_calendar_groups_by_barber() {
    let app = test_app(test_state(""));
    let monday = next_monday();
    create_booking(&app, monday, "09:00", Some("marco")).await;
    create_booking(&app, monday, "10:00", None).await;

    let res = app
        .oneshot(admin_request(
            "GET",
            &format!("/api/admin/calendar?date={}", monday.format("%Y-%m-%d")),
            None,
        ))
        .await
        .unwrap();
    let days = body_json(res).await;
    let days = days.as_array().unwrap();
    let count_for = |id: &str| {
        days.iter()
            .find(|d| d["barber"]["id"] == id)
            .map(|d| d["bookings"].as_array().unwrap().len())
            .unwrap()
    };
    assert_eq!(count_for("marco"), 2);
    assert_eq!(count_for("luca"), 1);
}

#[tokio::test]
async fn test_admin_services_crud() {
    let app = test_app(test_state(""));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/services",
            Some(serde_json::json!({
                "id": "17",
                "name": "Maschera Carbone",
                "duration": 20,
                "price": 15.0,
                "category": "Other"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 17);

    let res = app
        .clone()
        .oneshot(admin_request("DELETE", "/api/admin/services/17", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(admin_request("DELETE", "/api/admin/services/17", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_service_bounds_keep_api_alive() {
    let app = test_app(test_state(""));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/services",
            Some(serde_json::json!({
                "id": "big",
                "name": "Maratona",
                "duration": u32::MAX,
                "price": 10.0,
                "category": "Other"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = booking_body(next_monday(), "09:00", None);
    body["serviceIds"] = serde_json::json!(["big", "1"]);
    let res = app
        .clone()
        .oneshot(json_request("POST", "/api/bookings", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_settings_round_trip() {
    let app = test_app(test_state(""));

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/admin/settings",
            Some(serde_json::json!({ "webhookUrl": " https://hooks.example.com/abc " })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(admin_request("GET", "/api/admin/settings", None))
        .await
        .unwrap();
    assert_eq!(
        body_json(res).await["webhookUrl"],
        "https://hooks.example.com/abc"
    );
}

#[tokio::test]
async fn test_admin_webhook_test_without_url() {
    let app = test_app(test_state(""));
    let res = app
        .oneshot(admin_request("POST", "/api/admin/webhook/test", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["ok"], false);
}

// ── Webhook delivery ──

#[tokio::test]
async fn test_admin_webhook_test_delivers() {
    let (url, receiver) = spawn_receiver(0).await;
    let app = test_app(test_state(&url));

    let res = app
        .oneshot(admin_request("POST", "/api/admin/webhook/test", None))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["ok"], true);
    assert_eq!(receiver.hits.load(Ordering::SeqCst), 1);
    assert_eq!(receiver.payloads.lock().unwrap()[0]["event"], "test_connection");
}

#[tokio::test]
async fn test_http_dispatcher_retries_until_success() {
    let (url, receiver) = spawn_receiver(2).await;
    let dispatcher = WebhookDispatcher::new(Box::new(HttpTransport::new()))
        .with_backoff_base(Duration::from_millis(5));

    let report = dispatcher
        .deliver(&url, &notifications::test_payload(), 3)
        .await;
    assert!(report.delivered);
    assert_eq!(report.attempts, 3);
    assert_eq!(report.waits.len(), 2);
    assert_eq!(receiver.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_dispatcher_gives_up() {
    let (url, receiver) = spawn_receiver(u32::MAX).await;
    let dispatcher = WebhookDispatcher::new(Box::new(HttpTransport::new()))
        .with_backoff_base(Duration::from_millis(5));

    assert!(!dispatcher.send(&url, &notifications::test_payload()).await);
    assert_eq!(receiver.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_new_booking_fires_webhook() {
    let (url, receiver) = spawn_receiver(0).await;
    let app = test_app(test_state(&url));

    let booking = create_booking(&app, next_monday(), "16:00", Some("alberto")).await;
    wait_for_hits(&receiver, 1).await;

    let payload: WebhookPayload =
        serde_json::from_value(receiver.payloads.lock().unwrap()[0].clone()).unwrap();
    assert_eq!(payload.event, WebhookEvent::NewBooking);
    assert_eq!(payload.booking_id.as_deref(), booking["id"].as_str());
    assert_eq!(payload.customer.email.as_deref(), Some("marco@example.it"));
    let appointment = payload.appointment.unwrap();
    assert_eq!(appointment.barber, "Alberto");
    assert_eq!(appointment.time, "16:00");
    assert_eq!(
        appointment.services,
        vec!["Taglio Uomo Classic", "Barba Rifinitura"]
    );
    assert!(payload
        .management_link
        .unwrap()
        .starts_with("https://albibarber.example/booking/"));
}

#[tokio::test]
async fn test_cancel_and_modify_fire_webhooks() {
    let (url, receiver) = spawn_receiver(0).await;
    let app = test_app(test_state(&url));

    let booking = create_booking(&app, next_monday(), "09:00", Some("marco")).await;
    let id = booking["id"].as_str().unwrap().to_string();
    wait_for_hits(&receiver, 1).await;

    let res = app
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/api/admin/bookings/{id}/modify"),
            Some(serde_json::json!({ "time": "10:20" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["time"], "10:20");
    wait_for_hits(&receiver, 2).await;

    let res = app
        .oneshot(admin_request(
            "POST",
            &format!("/api/admin/bookings/{id}/status"),
            Some(serde_json::json!({ "status": "cancelled" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    wait_for_hits(&receiver, 3).await;

    let events: Vec<String> = receiver
        .payloads
        .lock()
        .unwrap()
        .iter()
        .map(|p| p["event"].as_str().unwrap().to_string())
        .collect();
    assert!(events.contains(&"booking_modified".to_string()));
    assert!(events.contains(&"booking_cancelled".to_string()));
}
