use axum::body::Bytes;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Instant;

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::http::join_path_segment;

use super::models::{
    PlayerIdentifier, SessionProfileResponse, TextureDescriptor, UsernameLookupResponse,
};

/// 身份解析客户端：用户名 → UUID → 贴图描述。
///
/// 不做重试，上游任何失败都直接返回给调用方。
#[derive(Clone)]
pub struct ProfileClient {
    client: reqwest::Client,
    username_lookup_url: String,
    session_profile_url: String,
}

impl ProfileClient {
    pub fn new(client: reqwest::Client, cfg: &UpstreamConfig) -> Self {
        Self {
            client,
            username_lookup_url: cfg.username_lookup_url.clone(),
            session_profile_url: cfg.session_profile_url.clone(),
        }
    }

    /// 用户名 → UUID（上游返回的原样字符串，通常为 32 位无横线十六进制）。
    pub async fn resolve_username(&self, username: &str) -> Result<String, AppError> {
        let url = join_path_segment(&self.username_lookup_url, username)?;
        let body = self.get_upstream(url, "用户名查询", username).await?;

        let parsed: UsernameLookupResponse = serde_json::from_slice(&body)
            .map_err(|e| AppError::MalformedResponse(format!("用户名查询响应缺少 id: {e}")))?;
        let id = parsed.id.trim();
        if id.is_empty() {
            return Err(AppError::MalformedResponse(
                "用户名查询响应的 id 为空".to_string(),
            ));
        }
        tracing::debug!(username, id, name = ?parsed.name, "用户名解析完成");
        Ok(id.to_string())
    }

    /// UUID → 贴图描述。
    pub async fn resolve_unique_id(&self, unique_id: &str) -> Result<TextureDescriptor, AppError> {
        let url = join_path_segment(&self.session_profile_url, unique_id)?;
        let body = self.get_upstream(url, "档案查询", unique_id).await?;

        let profile: SessionProfileResponse = serde_json::from_slice(&body)
            .map_err(|e| AppError::MalformedResponse(format!("档案响应结构异常: {e}")))?;
        let property = profile.texture_property().ok_or_else(|| {
            AppError::MalformedResponse(format!("档案 {unique_id} 的 properties 为空"))
        })?;

        let descriptor = TextureDescriptor::from_property_value(&property.value)?;
        tracing::debug!(
            unique_id,
            profile_name = ?descriptor.profile_name.as_deref().or(profile.name.as_deref()),
            skin_url = descriptor.skin_url(),
            slim = descriptor.is_slim(),
            "贴图描述解析完成"
        );
        Ok(descriptor)
    }

    /// 按标识类型分派：用户名先解析为 UUID，再走 UUID 路径。
    pub async fn resolve(
        &self,
        identifier: &PlayerIdentifier,
    ) -> Result<TextureDescriptor, AppError> {
        let t_start = Instant::now();
        let descriptor = match identifier {
            PlayerIdentifier::Username(name) => {
                let unique_id = self.resolve_username(name).await?;
                self.resolve_unique_id(&unique_id).await?
            }
            PlayerIdentifier::UniqueId(unique_id) => self.resolve_unique_id(unique_id).await?,
        };
        tracing::info!(
            %identifier,
            "身份解析完成，耗时: {}ms",
            t_start.elapsed().as_millis()
        );
        Ok(descriptor)
    }

    /// GET 上游并返回成功响应体。
    ///
    /// 404/204 视为玩家不存在（Mojang 查询接口的“无此玩家”信号），其余非 2xx 归为上游错误。
    async fn get_upstream(
        &self,
        url: reqwest::Url,
        what: &str,
        subject: &str,
    ) -> Result<Bytes, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::from_transport(what, e))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| AppError::from_transport(what, e))?;

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            let hint = upstream_error_message(&body)
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            return Err(AppError::NotFound(format!("{what}: {subject} 不存在{hint}")));
        }
        if !status.is_success() {
            let hint = upstream_error_message(&body)
                .map(|m| format!(": {m}"))
                .unwrap_or_default();
            return Err(AppError::Network(format!("{what}返回 HTTP {status}{hint}")));
        }
        Ok(body)
    }
}

/// 提取上游错误体中的 `errorMessage` / `error` 字段（Mojang 的错误响应格式）。
fn upstream_error_message(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    v.get("errorMessage")
        .or_else(|| v.get("error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
