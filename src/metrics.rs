use actix_web::{dev::{Service, ServiceRequest, ServiceResponse, Transform}, web, Error, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::future::{ok, Ready};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EndpointKey {
    path: String,
    method: String,
}

#[derive(Default)]
struct Counters {
    endpoints: HashMap<EndpointKey, u64>,
    status_codes: BTreeMap<u16, u64>,
}

/// In-process request counters, also usable as actix middleware
#[derive(Clone)]
pub struct MetricsCollector {
    counters: Arc<Mutex<Counters>>,
    start_time: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct EndpointStats {
    pub path: String,
    pub method: String,
    pub count: u64,
}

#[derive(Serialize)]
pub struct StatusCodeBreakdown {
    pub status_code: u16,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub endpoints: Vec<EndpointStats>,
    pub status_codes: Vec<StatusCodeBreakdown>,
    pub total_calls: u64,
    pub uptime_secs: i64,
    pub started_at: String,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        MetricsCollector {
            counters: Arc::new(Mutex::new(Counters::default())),
            start_time: Utc::now(),
        }
    }

    pub fn record(&self, path: &str, method: &str, status_code: u16) {
        // A poisoned lock only loses counts
        let Ok(mut counters) = self.counters.lock() else {
            return;
        };
        let key = EndpointKey {
            path: path.to_string(),
            method: method.to_string(),
        };
        *counters.endpoints.entry(key).or_insert(0) += 1;
        *counters.status_codes.entry(status_code).or_insert(0) += 1;
    }

    pub fn get_metrics(&self) -> MetricsResponse {
        let (mut endpoints, status_counts) = match self.counters.lock() {
            Ok(counters) => (
                counters
                    .endpoints
                    .iter()
                    .map(|(key, count)| EndpointStats {
                        path: key.path.clone(),
                        method: key.method.clone(),
                        count: *count,
                    })
                    .collect::<Vec<_>>(),
                counters.status_codes.clone(),
            ),
            Err(_) => (Vec::new(), BTreeMap::new()),
        };
        endpoints.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));

        let total_calls: u64 = status_counts.values().sum();
        let status_codes = status_counts
            .into_iter()
            .map(|(status_code, count)| StatusCodeBreakdown {
                status_code,
                count,
                percentage: if total_calls > 0 {
                    (count as f64 / total_calls as f64) * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        MetricsResponse {
            endpoints,
            status_codes,
            total_calls,
            uptime_secs: (Utc::now() - self.start_time).num_seconds(),
            started_at: self.start_time.to_rfc3339(),
        }
    }
}

// Middleware implementation
impl<S, B> Transform<S, ServiceRequest> for MetricsCollector
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(MetricsMiddleware {
            service,
            metrics: self.clone(),
        })
    }
}

pub struct MetricsMiddleware<S> {
    service: S,
    metrics: MetricsCollector,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let method = req.method().to_string();
        let should_track = path.starts_with("/api/") || path == "/health";
        let metrics = self.metrics.clone();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            if should_track {
                // Route pattern keeps /api/blobs/{id}/{name} as one entry
                let route = res.request().match_pattern().unwrap_or(path);
                metrics.record(&route, &method, res.status().as_u16());
            }

            Ok(res)
        })
    }
}

pub async fn get_metrics_handler(metrics: web::Data<MetricsCollector>) -> HttpResponse {
    HttpResponse::Ok().json(metrics.get_metrics())
}
