use crate::summarizer::SummarizerError;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Json,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// 服务层与接口层统一错误
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// 记录存储不可用或查询失败 (与"无记录"区分)。
    /// 底层错误只写日志, 不返回给客户端。
    #[error("record store unavailable")]
    Store(#[from] sqlx::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Summarizer(#[from] SummarizerError),
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Summarizer(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Store(e) => tracing::error!("Request failed: {}: {:?}", self, e),
            _ if status.is_server_error() => tracing::error!("Request failed: {}", self),
            _ => {}
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// 路径参数无法解析 (如非数字 id)
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Path rejected: {}", rejection.body_text());
        AppError::BadRequest("Invalid id format".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
