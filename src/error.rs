use std::{
    env::VarError, io::Error as IO_ERROR, num::ParseIntError,
    str::ParseBoolError as PARSE_BOOL_ERROR,
};

use actix_web::{http::StatusCode, ResponseError};
use anyhow::Error as ANYHOW_ERROR;
use jsonwebtoken::errors::Error as JWT_ERROR;
use reqwest::header::InvalidHeaderValue as INVALID_HEADER_VALUE;
use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use sqlx::error::Error as SQL_ERROR;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    SQL(#[from] SQL_ERROR),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("{0}")]
    AnyHowError(#[from] ANYHOW_ERROR),

    #[error("{0}")]
    ReqwestError(#[from] REQWEST_ERROR),

    #[error("{0}")]
    InvalidHeaderValue(#[from] INVALID_HEADER_VALUE),

    #[error("{0}")]
    JWT(#[from] JWT_ERROR),

    #[error("Invalid option {option}")]
    InvalidOption { option: String },

    #[error("Missing params: {0}")]
    MissingParams(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Home server {instance} responded with status {status}")]
    HomeServer { instance: String, status: u16 },

    #[error("Push provider rejected notification with status {0}")]
    PushRejected(u16),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - client sent invalid input
            Error::MissingParams(_)
            | Error::InvalidOption { .. }
            | Error::JsonError(_)
            | Error::ParseBoolError(_)
            | Error::INT(_) => StatusCode::BAD_REQUEST,

            Error::NotFound(_) => StatusCode::NOT_FOUND,

            Error::ReqwestError(e) if e.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            },

            // 502 Bad Gateway - upstream service error
            Error::ReqwestError(_)
            | Error::HomeServer { .. }
            | Error::PushRejected(_) => StatusCode::BAD_GATEWAY,

            Error::ConfigurationError(_)
            | Error::SQL(_)
            | Error::Io(_)
            | Error::URL(_)
            | Error::VAR(_)
            | Error::TokioJoinError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::AnyHowError(_)
            | Error::InvalidHeaderValue(_)
            | Error::JWT(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_errors_are_client_errors() {
        let missing = Error::MissingParams(String::from("jwt"));
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

        let option = Error::InvalidOption {
            option: String::from("type"),
        };
        assert_eq!(option.status_code(), StatusCode::BAD_REQUEST);

        let not_found = Error::NotFound(String::from("subscription"));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        let err = Error::HomeServer {
            instance: String::from("lemmy.world"),
            status: 429,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.to_string(),
            "Home server lemmy.world responded with status 429"
        );
    }
}
