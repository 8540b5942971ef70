//! 皮肤 → 头像的合成流水线：裁剪 → 透明判定 → 合成/直通 → 最近邻缩放 → PNG。

use super::canvas::{Canvas, Region};
use super::skin::decode_skin;
use crate::error::AppError;

/// 头像（脸部正面）边长
pub const FACE_SIZE: u32 = 8;
/// 基础层头部正面
pub const HEAD_FRONT: Region = Region::new(8, 8, FACE_SIZE, FACE_SIZE);
/// 帽子/头发层正面，与头部正面对齐
pub const HAT_FRONT: Region = Region::new(40, 8, FACE_SIZE, FACE_SIZE);

/// 所有像素 alpha 都严格为 0 时返回 true（alpha=1 也算“有内容”）。
pub fn is_fully_transparent<C: Canvas>(region: &C) -> bool {
    region.alpha_values().all(|a| a == 0)
}

/// 从皮肤导出 8x8 的脸部图像。
///
/// 头部正面完全透明时，帽子层本身就是可见的脸，原样返回；
/// 否则先整体铺上头部正面，再把帽子层按其 alpha 叠加上去。
pub fn derive_face<C: Canvas>(skin: &C) -> Result<C, AppError> {
    let head = skin.crop(HEAD_FRONT)?;
    let hat = skin.crop(HAT_FRONT)?;

    if is_fully_transparent(&head) {
        return Ok(hat);
    }

    let mut face = C::blank(FACE_SIZE, FACE_SIZE);
    face.replace(&head);
    face.composite_over(&hat);
    Ok(face)
}

/// 最近邻缩放到 `size × size`；不做上限截断，上限策略由 HTTP 边界决定。
pub fn resample<C: Canvas>(face: &C, size: u32) -> Result<C, AppError> {
    if size == 0 {
        return Err(AppError::Validation("size 必须为正整数".to_string()));
    }
    Ok(face.resize_nearest(size, size))
}

/// 完整的 CPU 段：解码皮肤字节并输出头像 PNG。
pub fn render_icon(skin_bytes: &[u8], size: u32) -> Result<Vec<u8>, AppError> {
    let skin = decode_skin(skin_bytes)?;
    let face = derive_face(&skin)?;
    resample(&face, size)?.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn fill(img: &mut RgbaImage, region: Region, f: impl Fn(u32, u32) -> Rgba<u8>) {
        for dy in 0..region.height {
            for dx in 0..region.width {
                img.put_pixel(region.x + dx, region.y + dy, f(dx, dy));
            }
        }
    }

    fn skin_with(
        head: impl Fn(u32, u32) -> Rgba<u8>,
        hat: impl Fn(u32, u32) -> Rgba<u8>,
    ) -> RgbaImage {
        let mut skin = RgbaImage::new(64, 64);
        fill(&mut skin, HEAD_FRONT, head);
        fill(&mut skin, HAT_FRONT, hat);
        skin
    }

    #[test]
    fn transparency_is_exact_equality() {
        let clear = RgbaImage::new(FACE_SIZE, FACE_SIZE);
        assert!(is_fully_transparent(&clear));

        let mut almost = clear.clone();
        almost.put_pixel(7, 7, Rgba([0, 0, 0, 1]));
        assert!(!is_fully_transparent(&almost));

        // 颜色非零但 alpha 为 0 仍然算透明
        let tinted = RgbaImage::from_pixel(FACE_SIZE, FACE_SIZE, Rgba([200, 10, 10, 0]));
        assert!(is_fully_transparent(&tinted));
    }

    #[test]
    fn transparent_head_passes_hat_through() {
        let skin = skin_with(
            |_, _| CLEAR,
            |x, y| Rgba([x as u8 * 30, y as u8 * 30, 7, (x * 8 + y) as u8 * 3]),
        );
        let face = derive_face(&skin).expect("derive");
        let hat = Canvas::crop(&skin, HAT_FRONT).expect("crop");
        assert_eq!(face, hat);
    }

    #[test]
    fn opaque_head_with_half_covering_hat() {
        // 帽子层左半边不透明蓝，右半边完全透明
        let skin = skin_with(|_, _| RED, |x, _| if x < 4 { BLUE } else { CLEAR });
        let face = derive_face(&skin).expect("derive");
        for (x, _, p) in face.enumerate_pixels() {
            assert_eq!(*p, if x < 4 { BLUE } else { RED }, "pixel at x={x}");
        }
    }

    #[test]
    fn derive_face_is_deterministic() {
        let skin = skin_with(
            |x, y| Rgba([x as u8 * 20, y as u8 * 20, 99, 255]),
            |x, y| Rgba([5, 6, 7, ((x + y) * 16) as u8]),
        );
        let a = derive_face(&skin).expect("derive a");
        let b = derive_face(&skin).expect("derive b");
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn resample_maps_source_pixels_to_uniform_blocks() {
        let face = RgbaImage::from_fn(FACE_SIZE, FACE_SIZE, |x, y| {
            Rgba([x as u8 * 32, y as u8 * 32, 128, 255])
        });
        let icon = resample(&face, 64).expect("resample");
        assert_eq!(icon.dimensions(), (64, 64));
        for (x, y, p) in icon.enumerate_pixels() {
            assert_eq!(p, face.get_pixel(x / 8, y / 8), "pixel at ({x},{y})");
        }
    }

    #[test]
    fn resample_rejects_zero() {
        let face = RgbaImage::new(FACE_SIZE, FACE_SIZE);
        assert!(matches!(resample(&face, 0), Err(AppError::Validation(_))));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let skin = skin_with(
            |x, y| Rgba([x as u8 * 31, y as u8 * 17, 3, 255]),
            |x, _| {
                if x % 2 == 0 {
                    Rgba([9, 9, 9, 128])
                } else {
                    CLEAR
                }
            },
        );
        let face = derive_face(&skin).expect("derive");
        let icon = resample(&face, 24).expect("resample");
        let png = icon.encode_png().expect("encode");
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (24, 24));
        assert_eq!(decoded.as_raw(), icon.as_raw());
    }

    #[test]
    fn render_icon_end_to_end() {
        let skin = skin_with(|_, _| RED, |_, _| CLEAR);
        let skin_png = skin.encode_png().expect("encode");
        let png = render_icon(&skin_png, 32).expect("render");
        let icon = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(icon.dimensions(), (32, 32));
        assert!(icon.pixels().all(|p| *p == RED));
    }
}
