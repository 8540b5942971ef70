use std::sync::Arc;

use crate::config::{AppConfig, FaceConfig};
use crate::error::AppError;
use crate::features::face::FaceService;
use crate::features::profile::ProfileClient;
use crate::http::build_upstream_client;

/// 聚合的应用共享状态（只读，请求之间不共享可变数据）
#[derive(Clone)]
pub struct AppState {
    pub face_service: Arc<FaceService>,
    /// 输出尺寸策略
    pub face: Arc<FaceConfig>,
}

impl AppState {
    /// 按配置构建共享 HTTP Client 与各服务。
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = build_upstream_client(&config.upstream)?;
        let profiles = ProfileClient::new(client.clone(), &config.upstream);
        let face_service = FaceService::new(client, profiles, config.upstream.max_texture_bytes);
        Ok(Self {
            face_service: Arc::new(face_service),
            face: Arc::new(config.face.clone()),
        })
    }
}
