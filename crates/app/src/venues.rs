use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use chrono::NaiveDate;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cantata_core::{
    i18n::{labels, Lang},
    Outcome, VenueForm, VenueKey, VenueRecord, VenueUpdate,
};

use crate::problem::ProblemResponse;
use crate::refresh::RefreshSource;
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct MutationBody {
    pub outcome: Outcome,
    pub record: VenueRecord,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub city: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CityForm {
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelsQuery {
    #[serde(default)]
    lang: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<VenueRecord>>, ProblemResponse> {
    Ok(Json(state.storage().venues().list().await?))
}

pub async fn route(
    State(state): State<AppState>,
) -> Result<Json<Vec<VenueRecord>>, ProblemResponse> {
    Ok(Json(state.storage().venues().tour_route().await?))
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<VenueForm>, FormRejection>,
) -> Result<(StatusCode, Json<MutationBody>), ProblemResponse> {
    state.admin().authorize(&headers)?;
    let Form(form) = form.map_err(invalid_form)?;
    let key = form.key();

    let result = {
        let _write = state.write_lock().await;
        state.storage().venues().register(form).await
    };
    let (outcome, record) = record_result("register", &key, result)?;

    state.refresh().publish(RefreshSource::VenueChange);
    let status = match outcome {
        Outcome::Registered => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(MutationBody { outcome, record })))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<VenueUpdate>, FormRejection>,
) -> Result<Json<MutationBody>, ProblemResponse> {
    state.admin().authorize(&headers)?;
    let Form(update) = form.map_err(invalid_form)?;
    let key = update.key();

    let result = {
        let _write = state.write_lock().await;
        state.storage().venues().update(update).await
    };
    let record = record_result("update", &key, result)?;

    state.refresh().publish(RefreshSource::VenueChange);
    Ok(Json(MutationBody {
        outcome: Outcome::Updated,
        record,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<Json<MutationBody>, ProblemResponse> {
    state.admin().authorize(&headers)?;
    let Form(form) = form.map_err(invalid_form)?;
    let key = VenueKey::new(form.city.trim(), form.date);

    let result = {
        let _write = state.write_lock().await;
        state.storage().venues().delete(&key).await
    };
    let record = record_result("delete", &key, result)?;

    state.refresh().publish(RefreshSource::VenueChange);
    Ok(Json(MutationBody {
        outcome: Outcome::Deleted,
        record,
    }))
}

pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ProblemResponse> {
    Ok(Json(state.storage().cities().list().await?))
}

pub async fn add_city(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<CityForm>, FormRejection>,
) -> Result<(StatusCode, Json<CityForm>), ProblemResponse> {
    state.admin().authorize(&headers)?;
    let Form(form) = form.map_err(invalid_form)?;

    let city = {
        let _write = state.write_lock().await;
        state.storage().cities().add(&form.city).await
    }
    .map_err(|err| {
        warn!(stage = "venues", city = %form.city, error = %err, "city rejected");
        ProblemResponse::from(err)
    })?;

    info!(stage = "venues", %city, "city added");
    state.refresh().publish(RefreshSource::CityChange);
    Ok((StatusCode::CREATED, Json(CityForm { city })))
}

pub async fn ui_labels(
    Query(query): Query<LabelsQuery>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let lang = match query.lang.as_deref() {
        None | Some("") => Lang::default(),
        Some(raw) => Lang::parse(raw).ok_or_else(|| {
            ProblemResponse::new(
                StatusCode::BAD_REQUEST,
                "unknown_language",
                format!("unsupported language '{raw}'"),
            )
        })?,
    };
    Ok(([(header::CONTENT_LANGUAGE, lang.as_str())], Json(labels(lang))))
}

fn invalid_form(rejection: FormRejection) -> ProblemResponse {
    ProblemResponse::new(StatusCode::BAD_REQUEST, "invalid_form", rejection.body_text())
}

/// Logs and counts a mutation, turning rejections into user-facing warnings.
fn record_result<T, E>(
    op: &'static str,
    key: &VenueKey,
    result: Result<T, E>,
) -> Result<T, ProblemResponse>
where
    E: std::fmt::Display + Into<ProblemResponse>,
{
    match result {
        Ok(value) => {
            counter!("venue_form_total", "op" => op, "result" => "ok").increment(1);
            info!(stage = "venues", op, city = %key.city, date = %key.date, "venue form applied");
            Ok(value)
        }
        Err(err) => {
            warn!(stage = "venues", op, city = %key.city, date = %key.date, warning = %err, "venue form rejected");
            let problem: ProblemResponse = err.into();
            counter!("venue_form_total", "op" => op, "result" => problem.problem_type()).increment(1);
            Err(problem)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, Router};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::admin::ADMIN_HEADER;
    use crate::router::{app_router, test_state};

    const LINK: &str = "https://www.google.com/maps/place/X/@18.5204,73.8567,15z";

    fn setup(admin: Option<&str>) -> (TempDir, AppState, Router) {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path(), admin);
        let app = app_router(state.clone());
        (dir, state, app)
    }

    fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let body = serde_urlencoded::to_string(fields).expect("encode form");
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn register_fields<'a>(city: &'a str, date: &'a str, link: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![
            ("city", city),
            ("date", date),
            ("venue", "Ganesh Kala Krida"),
            ("seats", "2500"),
            ("type", "indoor"),
            ("note", "sound check at 4pm"),
            ("map_link", link),
        ]
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("handler should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should read")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn stored(state: &AppState) -> Vec<VenueRecord> {
        state.storage().venues().list().await.expect("list")
    }

    #[tokio::test]
    async fn register_persists_and_broadcasts() {
        let (_dir, state, app) = setup(None);
        let mut listener = state.refresh().subscribe();

        let (status, body) = send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Pune", "2025-12-20", LINK),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["outcome"], "registered");
        assert_eq!(body["record"]["lat"], 18.5204);
        let records = stored(&state).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seats, 2500);
        assert_eq!(
            listener.recv().await.expect("refresh"),
            RefreshSource::VenueChange
        );
    }

    #[tokio::test]
    async fn register_with_bad_link_is_a_warning() {
        let (dir, state, app) = setup(None);

        let (status, body) = send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Pune", "2025-12-20", "https://maps.app.goo.gl/xyz"),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["type"], "invalid_map_link");
        assert!(stored(&state).await.is_empty());
        assert!(!dir.path().join("venues.json").exists());
    }

    #[tokio::test]
    async fn update_changes_only_submitted_fields() {
        let (_dir, state, app) = setup(None);
        send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Pune", "2025-12-20", LINK),
            ),
        )
        .await;
        send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Mumbai", "2025-12-24", "19.07,72.88"),
            ),
        )
        .await;
        let before = stored(&state).await;

        let (status, body) = send(
            &app,
            form_request(
                "/api/venues/update",
                &[("city", "Pune"), ("date", "2025-12-20"), ("seats", "3000")],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "updated");
        let after = stored(&state).await;
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].seats, 3000);
        assert_eq!(after[0].venue, before[0].venue);
        assert_eq!(after[0].note, before[0].note);
        assert_eq!(after[1], before[1]);
    }

    #[tokio::test]
    async fn update_ignores_blank_form_inputs() {
        let (_dir, state, app) = setup(None);
        send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Pune", "2025-12-20", LINK),
            ),
        )
        .await;
        let before = stored(&state).await;

        let (status, _) = send(
            &app,
            form_request(
                "/api/venues/update",
                &[
                    ("city", "Pune"),
                    ("date", "2025-12-20"),
                    ("venue", "New Hall"),
                    ("seats", ""),
                    ("type", ""),
                    ("note", "doors at 6pm"),
                    ("map_link", ""),
                ],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let after = stored(&state).await;
        assert_eq!(after[0].venue, "New Hall");
        assert_eq!(after[0].note, "doors at 6pm");
        assert_eq!(after[0].seats, before[0].seats);
        assert_eq!(after[0].kind, before[0].kind);
        assert_eq!(after[0].coordinates(), before[0].coordinates());
        assert_eq!(after[0].nav_url, before[0].nav_url);

        let (status, _) = send(
            &app,
            form_request(
                "/api/venues/update",
                &[("city", "Pune"), ("date", "2025-12-20"), ("map_link", "   ")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored(&state).await[0].lat, before[0].lat);
    }

    #[tokio::test]
    async fn update_unknown_key_leaves_list() {
        let (_dir, state, app) = setup(None);
        send(
            &app,
            form_request(
                "/api/venues/register",
                &register_fields("Pune", "2025-12-20", LINK),
            ),
        )
        .await;
        let before = stored(&state).await;

        let (status, body) = send(
            &app,
            form_request(
                "/api/venues/update",
                &[("city", "Pune"), ("date", "2025-12-21"), ("seats", "1")],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "venue_not_found");
        assert_eq!(stored(&state).await, before);
    }

    #[tokio::test]
    async fn delete_removes_one_record() {
        let (_dir, state, app) = setup(None);
        for (city, date) in [("Pune", "2025-12-20"), ("Nagpur", "2025-12-22")] {
            send(
                &app,
                form_request("/api/venues/register", &register_fields(city, date, LINK)),
            )
            .await;
        }

        let (status, body) = send(
            &app,
            form_request(
                "/api/venues/delete",
                &[("city", "Nagpur"), ("date", "2025-12-22")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["city"], "Nagpur");
        assert_eq!(stored(&state).await.len(), 1);

        let (status, _) = send(
            &app,
            form_request(
                "/api/venues/delete",
                &[("city", "Nagpur"), ("date", "2025-12-22")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(stored(&state).await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_form_is_rejected() {
        let (_dir, _state, app) = setup(None);
        let (status, body) = send(
            &app,
            form_request("/api/venues/delete", &[("city", "Pune"), ("date", "tomorrow")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid_form");
    }

    #[tokio::test]
    async fn route_lists_stops_by_date() {
        let (_dir, _state, app) = setup(None);
        for (city, date) in [("Mumbai", "2025-12-24"), ("Pune", "2025-12-20")] {
            send(
                &app,
                form_request("/api/venues/register", &register_fields(city, date, LINK)),
            )
            .await;
        }

        let request = Request::builder()
            .uri("/api/route")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["city"], "Pune");
        assert_eq!(body[1]["city"], "Mumbai");
    }

    #[tokio::test]
    async fn admin_password_guards_mutations() {
        let (_dir, state, app) = setup(Some("0691"));
        let fields = register_fields("Pune", "2025-12-20", LINK);

        let (status, body) = send(&app, form_request("/api/venues/register", &fields)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], "admin_required");

        let mut request = form_request("/api/venues/register", &fields);
        request
            .headers_mut()
            .insert(ADMIN_HEADER, "1234".parse().expect("header"));
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(stored(&state).await.is_empty());

        let mut request = form_request("/api/venues/register", &fields);
        request
            .headers_mut()
            .insert(ADMIN_HEADER, "0691".parse().expect("header"));
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);

        let request = Request::builder()
            .uri("/api/venues")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let update = [("city", "Pune"), ("date", "2025-12-20"), ("seats", "10")];
        let delete = [("city", "Pune"), ("date", "2025-12-20")];
        let city = [("city", "Kolhapur")];
        for (uri, fields) in [
            ("/api/venues/update", &update[..]),
            ("/api/venues/delete", &delete[..]),
            ("/api/cities", &city[..]),
        ] {
            let (status, body) = send(&app, form_request(uri, fields)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["type"], "admin_required", "{uri}");
        }
        assert_eq!(stored(&state).await[0].seats, 2500);
        assert!(!state.storage().cities_path().exists());

        for (uri, fields, expected) in [
            ("/api/venues/update", &update[..], StatusCode::OK),
            ("/api/venues/delete", &delete[..], StatusCode::OK),
            ("/api/cities", &city[..], StatusCode::CREATED),
        ] {
            let mut request = form_request(uri, fields);
            request
                .headers_mut()
                .insert(ADMIN_HEADER, "0691".parse().expect("header"));
            let (status, _) = send(&app, request).await;
            assert_eq!(status, expected, "{uri}");
        }
        assert!(stored(&state).await.is_empty());
    }

    #[tokio::test]
    async fn cities_can_be_listed_and_added() {
        let (_dir, _state, app) = setup(None);

        let (status, body) = send(&app, form_request("/api/cities", &[("city", "Kolhapur")])).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["city"], "Kolhapur");

        let (status, _) = send(&app, form_request("/api/cities", &[("city", "Pune")])).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let request = Request::builder()
            .uri("/api/cities")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(&app, request).await;
        let cities = body.as_array().expect("array");
        assert_eq!(cities.first().and_then(Value::as_str), Some("Mumbai"));
        assert_eq!(cities.last().and_then(Value::as_str), Some("Kolhapur"));
    }

    #[tokio::test]
    async fn labels_follow_requested_language() {
        let (_dir, _state, app) = setup(None);

        let request = Request::builder()
            .uri("/api/labels?lang=en")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_LANGUAGE).expect("header"),
            "en"
        );
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["title"], "Cantata Tour 2025");

        let request = Request::builder()
            .uri("/api/labels?lang=fr")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "unknown_language");
    }
}
