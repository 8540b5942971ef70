use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件（头像可被网页直接 `<img>` 引用，通常只需放行 GET）。
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let origins = parse_list("allowed_origins", &cors.allowed_origins, |v| {
        HeaderValue::from_str(v).ok()
    });
    let origin = match origins {
        Parsed::Any => AllowOrigin::from(Any),
        Parsed::List(list) if !list.is_empty() => AllowOrigin::list(list),
        Parsed::List(_) => {
            tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
            return None;
        }
    };

    let methods = match parse_list("allowed_methods", &cors.allowed_methods, |v| {
        Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
    }) {
        Parsed::Any => AllowMethods::from(Any),
        Parsed::List(list) if list.is_empty() => AllowMethods::list([Method::GET, Method::HEAD]),
        Parsed::List(list) => AllowMethods::list(list),
    };

    let mut layer = CorsLayer::new().allow_origin(origin).allow_methods(methods);

    match parse_list("expose_headers", &cors.expose_headers, |v| {
        HeaderName::from_bytes(v.as_bytes()).ok()
    }) {
        Parsed::Any => layer = layer.expose_headers(ExposeHeaders::from(Any)),
        Parsed::List(list) if !list.is_empty() => layer = layer.expose_headers(list),
        Parsed::List(_) => {}
    }

    if let Some(secs) = cors.max_age_secs.filter(|s| *s > 0) {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

#[derive(Debug, PartialEq)]
enum Parsed<T> {
    Any,
    List(Vec<T>),
}

/// 解析配置列表：`"*"` 表示任意，空白项跳过，无效项告警后忽略。
fn parse_list<T>(label: &str, values: &[String], parse: impl Fn(&str) -> Option<T>) -> Parsed<T> {
    let mut out = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            return Parsed::Any;
        }
        match parse(value) {
            Some(v) => out.push(v),
            None => tracing::warn!("CORS {} 含无效值: {}", label, value),
        }
    }
    Parsed::List(out)
}
