use utoipa::OpenApi;

use crate::error::ProblemDetails;
use crate::features::health::handler::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::face::handler::face_by_name,
        crate::features::face::handler::face_by_uuid,
        crate::features::face::handler::name_usage,
        crate::features::face::handler::uuid_usage,
        crate::features::face::handler::root_usage,
    ),
    components(schemas(ProblemDetails, HealthResponse)),
    tags(
        (
            name = "Face",
            description = "玩家头像：按用户名或 UUID 取皮肤，输出叠加帽子层的脸部 PNG。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Skin Favicon API",
        version = env!("CARGO_PKG_VERSION"),
        description = "玩家皮肤头像服务（Axum + utoipa）。错误统一返回 application/problem+json，并带 `error` 字段。"
    )
)]
pub struct ApiDoc;
