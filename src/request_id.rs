use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// 请求 ID 头名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    /// 当前请求绑定的 request_id，错误响应体通过它回填 `requestId`。
    static TASK_REQUEST_ID: String;
}

/// 获取当前请求上下文中的 request_id（不在请求处理链路内时为 None）。
pub fn current_request_id() -> Option<String> {
    TASK_REQUEST_ID.try_with(|v| v.clone()).ok()
}

/// 只接受长度受限的安全字符，避免把任意客户端输入写进日志与响应头。
fn is_acceptable(v: &str) -> bool {
    (1..=128).contains(&v.len())
        && v.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn pick_request_id(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_acceptable(v))
        .map(str::to_string)
        .unwrap_or_else(|| format!("req_{}", Uuid::new_v4().simple()))
}

/// 全局 request_id 中间件。
///
/// 客户端传入合法的 `X-Request-Id` 时原样透传，否则生成 `req_<uuid>`；
/// 处理期间绑定到当前任务与 tracing span，结束后回写到响应头。
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = pick_request_id(&req);
    let span = tracing::info_span!("req", id = %request_id);

    let mut res = TASK_REQUEST_ID
        .scope(request_id.clone(), next.run(req))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
