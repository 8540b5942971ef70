use std::io::Cursor;

use axum::body::Bytes;
use image::{ImageReader, Limits, RgbaImage};

use crate::error::AppError;

use super::canvas::Region;
use super::compositor::{HAT_FRONT, HEAD_FRONT};

/// 解码时允许的最大边长（正常皮肤为 64，高清皮肤也远小于此）
const MAX_DECODE_DIMENSION: u32 = 4096;

/// 下载皮肤贴图原始字节，响应体不得超过 `max_bytes`。
///
/// 传输失败、非 2xx 或超出上限归为 `Fetch`，超时归为 `Timeout`。
pub async fn fetch_skin_bytes(
    client: &reqwest::Client,
    url: &str,
    max_bytes: u64,
) -> Result<Bytes, AppError> {
    let url = reqwest::Url::parse(url)
        .map_err(|e| AppError::MalformedResponse(format!("皮肤地址无效 ({url}): {e}")))?;

    let mut resp = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| transfer_error(&url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("{url} 返回 HTTP {status}")));
    }

    // 声明了长度的先拒绝，没声明的边读边数
    if let Some(len) = resp.content_length().filter(|len| *len > max_bytes) {
        return Err(too_large(&url, len, max_bytes));
    }

    let mut body = Vec::new();
    let mut total = 0u64;
    while let Some(chunk) = resp.chunk().await.map_err(|e| transfer_error(&url, e))? {
        total = total.saturating_add(chunk.len() as u64);
        if total > max_bytes {
            return Err(too_large(&url, total, max_bytes));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(body))
}

fn transfer_error(url: &reqwest::Url, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("皮肤下载超时 ({url}): {err}"))
    } else {
        AppError::Fetch(format!("{url}: {err}"))
    }
}

fn too_large(url: &reqwest::Url, len: u64, max_bytes: u64) -> AppError {
    AppError::Fetch(format!("{url} 贴图过大: 至少 {len} 字节，上限 {max_bytes}"))
}

/// 把贴图字节解码为 RGBA 皮肤，并确认两个头部区域都在图像范围内。
pub fn decode_skin(bytes: &[u8]) -> Result<RgbaImage, AppError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(format!("无法识别皮肤图片格式: {e}")))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    reader.limits(limits);

    let skin = reader.decode()?.to_rgba8();
    check_layout(skin.width(), skin.height())?;
    Ok(skin)
}

/// 皮肤必须同时容纳头部正面与帽子层正面，否则视为非标准布局。
pub fn check_layout(width: u32, height: u32) -> Result<(), AppError> {
    let required = [HEAD_FRONT, HAT_FRONT];
    if required.iter().all(|r| r.fits_within(width, height)) {
        return Ok(());
    }
    let min_w = required.iter().map(Region::right).max().unwrap_or(0);
    let min_h = required.iter().map(Region::bottom).max().unwrap_or(0);
    Err(AppError::InvalidLayout(format!(
        "皮肤尺寸 {width}x{height} 过小，至少需要 {min_w}x{min_h}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::face::canvas::Canvas;

    #[test]
    fn layout_accepts_standard_and_legacy() {
        assert!(check_layout(64, 64).is_ok());
        assert!(check_layout(64, 32).is_ok());
        assert!(check_layout(48, 16).is_ok());
    }

    #[test]
    fn too_small_skin_is_invalid_layout() {
        let png = RgbaImage::new(10, 10).encode_png().expect("encode");
        let err = decode_skin(&png).expect_err("10x10 must fail");
        assert!(matches!(err, AppError::InvalidLayout(_)), "{err:?}");

        // 宽度够头部但不够帽子层
        let png = RgbaImage::new(16, 16).encode_png().expect("encode");
        let err = decode_skin(&png).expect_err("16x16 must fail");
        assert!(matches!(err, AppError::InvalidLayout(_)), "{err:?}");
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let err = decode_skin(b"definitely not a png").expect_err("garbage");
        assert!(matches!(err, AppError::Decode(_)), "{err:?}");
    }
}
