//! Monthly aggregation and trend segmentation over HTTP.

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Duration, Months, Utc};
use common::{access_token, build_test_app, get, post, record_body};
use serde_json::{json, Value};

#[tokio::test]
async fn monthly_stats_group_by_month_newest_first() {
    let app = build_test_app();
    let token = access_token(&app, "stats@example.com").await;

    let this_month = Utc::now().date_naive().with_day(1).unwrap();
    let last_month = this_month.checked_sub_months(Months::new(1)).unwrap();

    // Last month: anxiety -2, 0, 2 (internal 2, 4, 6), no weight.
    for (offset, moods, anxiety) in [(0, vec![2], -2), (1, vec![-3], 0), (2, vec![1, -1], 2)] {
        let date = last_month + Duration::days(offset);
        let mut body = record_body(&date.to_string(), &moods);
        body["anxiety"] = json!(anxiety);
        let (status, _) = post(&app, "/api/records", &token, body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut body = record_body(&this_month.to_string(), &[4]);
    body["weight"] = json!(70.0);
    post(&app, "/api/records", &token, body).await;

    // Outside the default lookback.
    post(&app, "/api/records", &token, record_body("2001-06-01", &[1])).await;

    let (status, stats) = get(&app, "/api/stats/monthly", &token).await;
    assert_eq!(status, StatusCode::OK);
    let months = stats.as_array().unwrap();
    assert_eq!(months.len(), 2);

    assert_eq!(months[0]["month"], this_month.format("%Y-%m").to_string());
    assert_eq!(months[0]["record_count"], 1);
    assert_eq!(months[0]["avg_weight"], 70.0);
    assert_eq!(months[0]["avg_mood_down"], Value::Null);

    let last = &months[1];
    assert_eq!(last["month"], last_month.format("%Y-%m").to_string());
    assert_eq!(last["record_count"], 3);
    assert_eq!(last["mixed_days"], 1);
    assert_eq!(last["avg_anxiety"], 0.0);
    assert_eq!(last["avg_mood_up"], 1.5);
    assert_eq!(last["avg_mood_down"], -2.0);
    assert_eq!(last["avg_weight"], Value::Null);
    assert_eq!(last["avg_sleep_hours"], 7.5);
    assert_eq!(last["flag_days"]["exercise"], 3);
}

#[tokio::test]
async fn trend_splits_runs_and_gaps() {
    let app = build_test_app();
    let token = access_token(&app, "trend@example.com").await;

    for (date, moods) in [
        ("2025-03-01", vec![2]),
        ("2025-03-02", vec![3]),
        ("2025-03-03", vec![-1]),
        ("2025-03-04", vec![-2]),
        ("2025-03-05", vec![0]),
    ] {
        let (status, _) = post(&app, "/api/records", &token, record_body(date, &moods)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // A day without a mood can only come from an import.
    let legacy = |date: &str, up: Value| {
        json!({
            "record_date": date,
            "mood_up_score": up,
            "anxiety_score": 4,
            "tension_score": 4,
            "anger_score": 4,
            "interest_score": 4,
            "activity_score": 4,
            "thought_speed_score": 4,
            "thought_content_score": 4,
            "sleep_hours": 7.0
        })
    };
    let (status, _) = post(
        &app,
        "/api/records/import",
        &token,
        json!({ "records": [legacy("2025-03-06", Value::Null), legacy("2025-03-07", json!(1))] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, trend) = get(
        &app,
        "/api/stats/trend?start_date=2025-03-01&end_date=2025-03-31",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trend["has_elevated"], true);
    assert_eq!(trend["has_depressed"], true);

    let point = |date: &str, value: f64| json!({ "date": date, "value": value });
    assert_eq!(
        trend["segments"],
        json!([
            {
                "kind": "line",
                "category": "elevated",
                "points": [point("2025-03-01", 2.0), point("2025-03-02", 3.0)],
                "joined_from": null
            },
            {
                "kind": "line",
                "category": "depressed",
                "points": [point("2025-03-03", -1.0), point("2025-03-04", -2.0)],
                "joined_from": point("2025-03-02", 3.0)
            },
            {
                "kind": "line",
                "category": "elevated",
                "points": [point("2025-03-05", 0.0)],
                "joined_from": point("2025-03-04", -2.0)
            },
            { "kind": "gap", "start": "2025-03-06", "end": "2025-03-06", "days": 1 },
            {
                "kind": "line",
                "category": "elevated",
                "points": [point("2025-03-07", 1.0)],
                "joined_from": null
            }
        ])
    );
}

#[tokio::test]
async fn trend_without_depressed_days_has_no_depressed_legend() {
    let app = build_test_app();
    let token = access_token(&app, "calm@example.com").await;

    for (date, moods) in [("2025-06-01", vec![0]), ("2025-06-02", vec![2])] {
        post(&app, "/api/records", &token, record_body(date, &moods)).await;
    }

    let (_, trend) = get(
        &app,
        "/api/stats/trend?start_date=2025-06-01&end_date=2025-06-30",
        &token,
    )
    .await;
    assert_eq!(trend["has_elevated"], true);
    assert_eq!(trend["has_depressed"], false);
    assert_eq!(trend["segments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn trend_rejects_inverted_window() {
    let app = build_test_app();
    let token = access_token(&app, "inverted@example.com").await;

    let (status, _) = get(
        &app,
        "/api/stats/trend?start_date=2025-06-30&end_date=2025-06-01",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn trend_window_is_capped() {
    let app = build_test_app();
    let token = access_token(&app, "window@example.com").await;

    let (status, _) = get(
        &app,
        "/api/stats/trend?start_date=2024-01-01&end_date=2024-12-31",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(
        &app,
        "/api/stats/trend?start_date=1900-01-01&end_date=2025-01-01",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["message"].as_str().unwrap().contains("366"));
}
