use reqwest::{Client, Url};

use crate::config::UpstreamConfig;
use crate::error::AppError;

/// 构建外呼共享的 HTTP Client（统一连接池/Keep-Alive）。
///
/// 所有上游调用（用户名查询、档案查询、皮肤下载）都带总超时与建连超时，
/// 避免上游挂起时长期占用请求任务。
pub fn build_upstream_client(cfg: &UpstreamConfig) -> Result<Client, AppError> {
    Client::builder()
        .timeout(cfg.timeout())
        .connect_timeout(cfg.connect_timeout())
        .user_agent(cfg.user_agent.as_str())
        .build()
        .map_err(|e| AppError::Internal(format!("初始化 HTTP Client 失败: {e}")))
}

/// 把 `segment` 作为一个完整路径段追加到 `base` 之后（自动转义 `/`、空格等字符）。
///
/// `base` 末尾有无 `/` 均可。
pub fn join_path_segment(base: &str, segment: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Internal(format!("上游基地址无效 ({base}): {e}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("上游基地址不能追加路径: {base}")))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}
