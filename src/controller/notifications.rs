//! Device registration endpoints

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    error::Error,
    types::{
        DeleteNotificationRequest, DeleteResponse, DeleteTarget,
        NotificationRequest, TestNotificationRequest, TestResponse,
        TokenQuery,
    },
};

#[post("/notifications")]
pub async fn post_index(
    state: web::Data<AppState<State>>,
    data: web::Json<NotificationRequest>,
) -> Result<impl Responder, Error> {
    let subscription = data.validate()?;
    let item = state.database.subscription.upsert(&subscription).await?;

    info!(
        "Registered {} subscription {} on instance {}",
        subscription.channel_type, item.id, item.instance
    );

    Ok(HttpResponse::Created().json(vec![item]))
}

#[get("/notifications")]
pub async fn get_index(
    state: web::Data<AppState<State>>,
    query: web::Query<TokenQuery>,
) -> Result<impl Responder, Error> {
    let token = query.token.trim();
    if token.is_empty() {
        return Err(Error::MissingParams(String::from("token")));
    }

    let items = state.database.subscription.get_by_token(token).await?;

    Ok(web::Json(items))
}

#[delete("/notifications")]
pub async fn delete_index(
    state: web::Data<AppState<State>>,
    data: web::Json<DeleteNotificationRequest>,
) -> Result<impl Responder, Error> {
    let deleted = match data.target()? {
        DeleteTarget::Jwts(jwts) => {
            state.database.subscription.delete_by_jwts(&jwts).await?
        },
        DeleteTarget::Token(token) => {
            state.database.subscription.delete_by_token(&token).await?
        },
    };

    info!("Deleted {} subscriptions", deleted);

    Ok(web::Json(DeleteResponse {
        message: "Notifications removed",
        deleted,
    }))
}

#[post("/notifications/test")]
pub async fn test_index(
    state: web::Data<AppState<State>>,
    data: web::Json<TestNotificationRequest>,
) -> Result<impl Responder, Error> {
    let jwt = data.validate()?;

    if state.database.subscription.queue_test(jwt).await? == 0 {
        return Err(Error::NotFound(String::from(
            "no subscription for this account",
        )));
    }

    state.trigger.fire();

    Ok(web::Json(TestResponse { queued: true }))
}
