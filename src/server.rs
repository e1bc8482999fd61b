use actix_cors::Cors;
use actix_web::{dev::Server, http::header, middleware, web, App, HttpServer};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    controller::{notifications, version},
    error::Error,
};

/// Bulk deletes carry one credential per account, each a few hundred bytes.
const JSON_LIMIT: usize = 64 * 1024;

pub async fn server_task(app_state: &AppState<State>) -> Result<(), Error> {
    let app = app_state.clone();
    tokio::spawn(async move {
        let server = init_server(app)?;
        server.await?;
        Ok(())
    })
    .await?
}

fn init_server(app_state: AppState<State>) -> Result<Server, Error> {
    let host = app_state.config.server_host.to_owned();
    let port = app_state.config.port;

    info!("Listening on {}:{}", host, port);

    let server = HttpServer::new(move || {
        let app = app_state.clone();
        let allowed_cors = String::from("*");
        let cors_access_all =
            app.config.allowed_origins.contains(&allowed_cors);
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                if cors_access_all {
                    return true;
                }
                let allowed = &app.config.allowed_origins;
                if let Ok(origin) = origin.to_str() {
                    return allowed.iter().any(|item| item == origin);
                }
                false
            })
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .service(notifications::post_index)
            .service(notifications::get_index)
            .service(notifications::delete_index)
            .service(notifications::test_index)
            .service(version::index)
    })
    .bind((host, port))?
    .disable_signals()
    .run();

    Ok(server)
}

pub(crate) fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(JSON_LIMIT)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use super::*;
    use crate::types::DeleteNotificationRequest;

    async fn count_jwts(data: web::Json<DeleteNotificationRequest>) -> String {
        data.jwts.as_ref().map(Vec::len).unwrap_or_default().to_string()
    }

    fn jwts(count: usize) -> serde_json::Value {
        let jwts = (0..count)
            .map(|id| format!("{}.{}", id, "x".repeat(400)))
            .collect::<Vec<String>>();
        serde_json::json!({ "jwts": jwts })
    }

    #[actix_web::test]
    async fn test_bulk_delete_body_is_accepted() {
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .route("/notifications", web::delete().to(count_jwts)),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/notifications")
            .set_json(jwts(40))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "40");
    }

    #[actix_web::test]
    async fn test_oversized_body_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .route("/notifications", web::delete().to(count_jwts)),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/notifications")
            .set_json(jwts(200))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
