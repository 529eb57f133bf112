use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
};
use salesdesk_db::PgPool;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::MetricsProfile;

const PROFILE_PROD: u8 = 0;
const PROFILE_STAGING: u8 = 1;
const PROFILE_DEBUG: u8 = 2;

static METRICS_PROFILE: AtomicU8 = AtomicU8::new(PROFILE_PROD);

pub fn set_profile(profile: MetricsProfile) {
    let value = match profile {
        MetricsProfile::Prod => PROFILE_PROD,
        MetricsProfile::Staging => PROFILE_STAGING,
        MetricsProfile::Debug => PROFILE_DEBUG,
    };
    METRICS_PROFILE.store(value, Ordering::Relaxed);
}

fn active_profile() -> MetricsProfile {
    match METRICS_PROFILE.load(Ordering::Relaxed) {
        PROFILE_STAGING => MetricsProfile::Staging,
        PROFILE_DEBUG => MetricsProfile::Debug,
        _ => MetricsProfile::Prod,
    }
}

// A metric that fails both registration and local construction is dropped;
// recording against it becomes a no-op.

fn counter_vec_or_fallback(name: &str, help: &str, labels: &[&str]) -> Option<IntCounterVec> {
    match register_int_counter_vec!(name, help, labels) {
        Ok(metric) => Some(metric),
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            IntCounterVec::new(Opts::new(name, help), labels)
                .map_err(|err| {
                    warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                })
                .ok()
        }
    }
}

fn gauge_vec_or_fallback(name: &str, help: &str, labels: &[&str]) -> Option<IntGaugeVec> {
    match register_int_gauge_vec!(name, help, labels) {
        Ok(metric) => Some(metric),
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            IntGaugeVec::new(Opts::new(name, help), labels)
                .map_err(|err| {
                    warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                })
                .ok()
        }
    }
}

fn gauge_or_fallback(name: &str, help: &str) -> Option<IntGauge> {
    match register_int_gauge!(name, help) {
        Ok(metric) => Some(metric),
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            IntGauge::new(name, help)
                .map_err(|err| {
                    warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                })
                .ok()
        }
    }
}

fn histogram_vec_or_fallback(
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: Vec<f64>,
) -> Option<HistogramVec> {
    match register_histogram_vec!(name, help, labels, buckets.clone()) {
        Ok(metric) => Some(metric),
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            let opts = HistogramOpts::new(name, help).buckets(buckets);
            HistogramVec::new(opts, labels)
                .map_err(|err| {
                    warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                })
                .ok()
        }
    }
}

fn http_buckets() -> Vec<f64> {
    vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

static AUTH_REJECTED: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_auth_rejected_total",
        "Rejected bearer tokens",
        &["reason"],
    )
});

static HTTP_IN_FLIGHT: LazyLock<Option<IntGauge>> =
    LazyLock::new(|| gauge_or_fallback("salesdesk_http_in_flight", "HTTP requests in flight"));

static HTTP_REQUESTS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_http_requests_total",
        "HTTP requests",
        &["method", "route", "status_class"],
    )
});

static HTTP_REQUESTS_BY_STATUS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_http_requests_by_status_total",
        "HTTP requests by status",
        &["method", "route", "status"],
    )
});

static HTTP_LATENCY: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    histogram_vec_or_fallback(
        "salesdesk_http_request_duration_seconds",
        "HTTP request latency",
        &["route"],
        http_buckets(),
    )
});

static FORBIDDEN_ACCESS: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_forbidden_access_total",
        "Forbidden access attempts",
        &["resource"],
    )
});

static MEMBER_RECONCILE: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_group_member_reconcile_total",
        "Group membership batch replacements",
        &["result"],
    )
});

static MEMBER_RECONCILE_LATENCY: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    histogram_vec_or_fallback(
        "salesdesk_group_member_reconcile_duration_seconds",
        "Group membership batch replacement latency",
        &["result"],
        http_buckets(),
    )
});

static DEAL_MOVES: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "salesdesk_deal_stage_moves_total",
        "Deal stage reassignments",
        &["result"],
    )
});

static DB_POOL_CONNECTIONS: LazyLock<Option<IntGaugeVec>> = LazyLock::new(|| {
    gauge_vec_or_fallback(
        "salesdesk_db_pool_connections",
        "Database pool connections",
        &["state"],
    )
});

pub fn auth_rejected(reason: &str) {
    if let Some(metric) = AUTH_REJECTED.as_ref() {
        metric.with_label_values(&[reason]).inc();
    }
}

pub fn forbidden_access(resource: &str) {
    let label = match active_profile() {
        MetricsProfile::Prod => "redacted",
        MetricsProfile::Staging | MetricsProfile::Debug => resource,
    };
    if let Some(metric) = FORBIDDEN_ACCESS.as_ref() {
        metric.with_label_values(&[label]).inc();
    }
}

pub fn member_reconcile(result: &str, duration_seconds: f64) {
    if let Some(metric) = MEMBER_RECONCILE.as_ref() {
        metric.with_label_values(&[result]).inc();
    }
    if let Some(metric) = MEMBER_RECONCILE_LATENCY.as_ref() {
        metric
            .with_label_values(&[result])
            .observe(duration_seconds);
    }
}

pub fn deal_moved(result: &str) {
    if let Some(metric) = DEAL_MOVES.as_ref() {
        metric.with_label_values(&[result]).inc();
    }
}

pub async fn http_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
        .to_string();
    let in_flight = HTTP_IN_FLIGHT.as_ref();
    if let Some(gauge) = in_flight {
        gauge.inc();
    }
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    if let Some(gauge) = in_flight {
        gauge.dec();
    }
    record_http_request(&method, &route, response.status().as_u16(), elapsed);
    response
}

pub fn record_http_request(method: &str, route: &str, status: u16, duration_seconds: f64) {
    let status_class = match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "unknown",
    };
    if let Some(metric) = HTTP_REQUESTS.as_ref() {
        metric
            .with_label_values(&[method, route, status_class])
            .inc();
    }
    if let Some(metric) = HTTP_LATENCY.as_ref() {
        metric.with_label_values(&[route]).observe(duration_seconds);
    }

    match active_profile() {
        MetricsProfile::Prod => {}
        MetricsProfile::Staging | MetricsProfile::Debug => {
            if let Some(metric) = HTTP_REQUESTS_BY_STATUS.as_ref() {
                let status_label = status.to_string();
                metric
                    .with_label_values(&[method, route, &status_label])
                    .inc();
            }
        }
    }
}

pub fn start_db_pool_metrics(pool: PgPool, max_connections: u32) {
    let Some(gauges) = DB_POOL_CONNECTIONS.as_ref() else {
        return;
    };
    let idle_metric = gauges.with_label_values(&["idle"]);
    let active_metric = gauges.with_label_values(&["active"]);
    let max_metric = gauges.with_label_values(&["max"]);
    max_metric.set(i64::from(max_connections));

    tokio::spawn(async move {
        loop {
            let idle = i64::try_from(pool.num_idle()).unwrap_or(i64::MAX);
            let size = i64::from(pool.size());
            let active = (size - idle).max(0);
            idle_metric.set(idle);
            active_metric.set(active);
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    });
}
