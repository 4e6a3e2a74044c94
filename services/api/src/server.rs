use crate::cli::ServeArgs;
use crate::infra::{AppState, ScriptedRiskBackend};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use breastcare_intake::config::AppConfig;
use breastcare_intake::error::AppError;
use breastcare_intake::telemetry;
use breastcare_intake::workflows::assessment::{
    AssessmentService, HttpRiskBackend, QuestionCatalog, RiskBackend,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.scripted_backend {
        warn!("serving with the scripted scoring backend; results are not clinical");
        serve(config, ScriptedRiskBackend::default()).await
    } else {
        let backend = HttpRiskBackend::new(&config.backend.base_url, config.backend.timeout())?;
        info!(base_url = %backend.base_url(), "using remote risk backend");
        serve(config, backend).await
    }
}

async fn serve<B>(config: AppConfig, backend: B) -> Result<(), AppError>
where
    B: RiskBackend + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(QuestionCatalog::breast_cancer_risk());
    let assessment_service = Arc::new(AssessmentService::new(
        Arc::clone(&catalog),
        Arc::new(backend),
        config.assessment.session_policy(),
    ));
    spawn_purge_task(Arc::clone(&assessment_service));

    let app = with_assessment_routes(assessment_service)
        .layer(Extension(catalog))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "breastcare intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_purge_task<B>(service: Arc<AssessmentService<B>>)
where
    B: RiskBackend + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            service.purge_expired(chrono::Utc::now());
        }
    });
}
