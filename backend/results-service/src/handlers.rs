/// HTTP handlers for the dashboard-facing results API
use crate::error::{Result, ServiceError};
use crate::games::DEFAULT_LIMIT;
use crate::models::FrequencyOrder;
use crate::service::DataAccessService;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FrequencyQuery {
    pub limit: Option<u32>,
    #[serde(default)]
    pub order: FrequencyOrder,
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// GET /api/v1/status
#[get("/status")]
pub async fn status(service: web::Data<DataAccessService>) -> HttpResponse {
    HttpResponse::Ok().json(service.storage_status().await)
}

/// GET /api/v1/games
#[get("/games")]
pub async fn list_games(service: web::Data<DataAccessService>) -> Result<HttpResponse> {
    let games = service.available_games().await?;
    Ok(HttpResponse::Ok().json(games))
}

/// GET /api/v1/draws/latest
#[get("/draws/latest")]
pub async fn latest_per_game(service: web::Data<DataAccessService>) -> Result<HttpResponse> {
    let rows = service.latest_per_game().await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/v1/games/{game}/draws?limit=N
#[get("/games/{game}/draws")]
pub async fn latest_draws(
    service: web::Data<DataAccessService>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let game = path.into_inner();
    let rows = service
        .latest_results(&game, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/v1/games/{game}/draws/{draw_number}
#[get("/games/{game}/draws/{draw_number}")]
pub async fn get_draw(
    service: web::Data<DataAccessService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (game, draw_number) = path.into_inner();
    match service.draw(&game, draw_number).await? {
        Some(row) => Ok(HttpResponse::Ok().json(row)),
        None => Err(ServiceError::NotFound(format!("{game} draw {draw_number}"))),
    }
}

/// GET /api/v1/games/{game}/frequency?limit=N&order=asc|desc
#[get("/games/{game}/frequency")]
pub async fn number_frequency(
    service: web::Data<DataAccessService>,
    path: web::Path<String>,
    query: web::Query<FrequencyQuery>,
) -> Result<HttpResponse> {
    let game = path.into_inner();
    let frequencies = service
        .number_frequency(&game, query.limit, query.order)
        .await?;
    Ok(HttpResponse::Ok().json(frequencies))
}

/// POST /api/v1/cache/invalidate
#[post("/cache/invalidate")]
pub async fn invalidate_cache(service: web::Data<DataAccessService>) -> HttpResponse {
    service.invalidate();
    HttpResponse::NoContent().finish()
}

/// Register all routes; the caller provides `web::Data<DataAccessService>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api/v1")
            .service(status)
            .service(list_games)
            .service(latest_per_game)
            .service(latest_draws)
            .service(get_draw)
            .service(number_frequency)
            .service(invalidate_cache),
    );
}
