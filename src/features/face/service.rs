use axum::body::Bytes;
use std::time::Instant;

use crate::error::AppError;
use crate::features::profile::{PlayerIdentifier, ProfileClient};

use super::compositor::render_icon;
use super::skin::fetch_skin_bytes;

/// 头像服务：身份解析 → 下载皮肤 → 合成头像。
///
/// 无状态，可在任意数量的请求间共享。
#[derive(Clone)]
pub struct FaceService {
    profiles: ProfileClient,
    client: reqwest::Client,
    max_texture_bytes: u64,
}

impl FaceService {
    pub fn new(client: reqwest::Client, profiles: ProfileClient, max_texture_bytes: u64) -> Self {
        Self {
            profiles,
            client,
            max_texture_bytes,
        }
    }

    /// 生成 `size × size` 的头像 PNG。
    pub async fn render_face(
        &self,
        identifier: &PlayerIdentifier,
        size: u32,
    ) -> Result<Bytes, AppError> {
        let t_total = Instant::now();

        let descriptor = self.profiles.resolve(identifier).await?;

        let t_fetch = Instant::now();
        let skin = fetch_skin_bytes(&self.client, descriptor.skin_url(), self.max_texture_bytes)
            .await?;
        tracing::debug!(
            skin_url = descriptor.skin_url(),
            bytes = skin.len(),
            "皮肤下载完成，耗时: {}ms",
            t_fetch.elapsed().as_millis()
        );

        // 解码/合成/编码是纯 CPU 工作，移出 tokio worker。
        let t_render = Instant::now();
        let png = tokio::task::spawn_blocking(move || render_icon(&skin, size))
            .await
            .map_err(|e| AppError::Internal(format!("头像渲染任务执行失败: {e}")))??;

        tracing::info!(
            %identifier,
            size,
            png_bytes = png.len(),
            "头像生成完成，渲染耗时: {}ms，总耗时: {}ms",
            t_render.elapsed().as_millis(),
            t_total.elapsed().as_millis()
        );
        Ok(Bytes::from(png))
    }
}
