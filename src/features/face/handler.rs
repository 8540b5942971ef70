use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};

use crate::config::FaceConfig;
use crate::error::{AppError, ProblemDetails};
use crate::features::profile::PlayerIdentifier;
use crate::state::AppState;

const NAME_USAGE: &str = "get /name/<username> or /name/<username>?size=64";
const UUID_USAGE: &str = "get /uuid/<uuid> or /uuid/<uuid>?size=64";
const ROOT_USAGE: &str = "get /uuid or /name";

/// 原始 query 键值对，保留重复键
type QueryPairs = Vec<(String, String)>;

/// 取第一个 `size` 参数，重复出现时忽略后面的值。
fn first_size(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "size")
        .map(|(_, value)| value.as_str())
}

/// 计算实际输出边长。
///
/// - 配置了 `fixed_size` 时忽略 query；
/// - 缺省或不是整数时使用 `default_size`；
/// - `<= 0` 或超过 `max_size`（非 0 时）返回校验错误。
pub fn effective_size(cfg: &FaceConfig, raw: Option<&str>) -> Result<u32, AppError> {
    if let Some(fixed) = cfg.fixed_size {
        return Ok(fixed);
    }
    let Some(requested) = raw.and_then(|s| s.trim().parse::<i64>().ok()) else {
        return Ok(cfg.default_size);
    };
    if requested <= 0 {
        return Err(AppError::Validation(format!(
            "size 必须为正整数，收到 {requested}"
        )));
    }
    let size = u32::try_from(requested)
        .map_err(|_| AppError::Validation(format!("size 超出范围: {requested}")))?;
    if cfg.max_size != 0 && size > cfg.max_size {
        return Err(AppError::Validation(format!(
            "size 不能超过 {}，收到 {size}",
            cfg.max_size
        )));
    }
    Ok(size)
}

async fn render(
    state: &AppState,
    identifier: PlayerIdentifier,
    params: &[(String, String)],
) -> Result<Response, AppError> {
    let size = effective_size(&state.face, first_size(params))?;
    let png = state.face_service.render_face(&identifier, size).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

#[utoipa::path(
    get,
    path = "/name/{username}",
    summary = "按用户名生成头像",
    description = "用户名 → UUID → 皮肤，裁剪头部正面并叠加帽子层，最近邻缩放后返回 PNG。",
    params(
        ("username" = String, Path, description = "玩家用户名"),
        (
            "size" = Option<u32>,
            Query,
            description = "输出边长像素（默认 256；非整数时使用默认值，重复时取第一个）"
        )
    ),
    responses(
        (status = 200, description = "PNG 头像（image/png）"),
        (status = 404, description = "玩家不存在", body = ProblemDetails),
        (status = 422, description = "参数错误", body = ProblemDetails),
        (status = 502, description = "上游错误或皮肤无效", body = ProblemDetails),
        (status = 504, description = "上游超时", body = ProblemDetails)
    ),
    tag = "Face"
)]
pub async fn face_by_name(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(username) = path?;
    let Query(params) = query?;
    let identifier = PlayerIdentifier::username(&username)?;
    render(&state, identifier, &params).await
}

#[utoipa::path(
    get,
    path = "/uuid/{uuid}",
    summary = "按 UUID 生成头像",
    description = "UUID → 皮肤，裁剪头部正面并叠加帽子层，最近邻缩放后返回 PNG。",
    params(
        ("uuid" = String, Path, description = "玩家 UUID（带或不带横线）"),
        (
            "size" = Option<u32>,
            Query,
            description = "输出边长像素（默认 256；非整数时使用默认值，重复时取第一个）"
        )
    ),
    responses(
        (status = 200, description = "PNG 头像（image/png）"),
        (status = 404, description = "档案不存在", body = ProblemDetails),
        (status = 422, description = "参数错误", body = ProblemDetails),
        (status = 502, description = "上游错误或皮肤无效", body = ProblemDetails),
        (status = 504, description = "上游超时", body = ProblemDetails)
    ),
    tag = "Face"
)]
pub async fn face_by_uuid(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(uuid) = path?;
    let Query(params) = query?;
    let identifier = PlayerIdentifier::unique_id(&uuid)?;
    render(&state, identifier, &params).await
}

#[utoipa::path(
    get,
    path = "/name/",
    summary = "用户名接口用法",
    responses((status = 200, description = "用法提示", body = serde_json::Value)),
    tag = "Face"
)]
pub async fn name_usage() -> Json<Value> {
    Json(json!({ "error": NAME_USAGE }))
}

#[utoipa::path(
    get,
    path = "/uuid/",
    summary = "UUID 接口用法",
    responses((status = 200, description = "用法提示", body = serde_json::Value)),
    tag = "Face"
)]
pub async fn uuid_usage() -> Json<Value> {
    Json(json!({ "error": UUID_USAGE }))
}

#[utoipa::path(
    get,
    path = "/",
    summary = "服务用法",
    responses((status = 200, description = "用法提示", body = serde_json::Value)),
    tag = "Face"
)]
pub async fn root_usage() -> Json<Value> {
    Json(json!({ "msg": ROOT_USAGE }))
}

pub fn create_face_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_usage))
        .route("/name", get(name_usage))
        .route("/name/", get(name_usage))
        .route("/name/:username", get(face_by_name))
        .route("/uuid", get(uuid_usage))
        .route("/uuid/", get(uuid_usage))
        .route("/uuid/:uuid", get(face_by_uuid))
}
