use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage, imageops};

use crate::error::AppError;

/// 像素矩形，原点在左上角。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// 区域是否完整落在 `width × height` 的画布内。
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// 头像合成所需的最小图像能力集。
///
/// 合成逻辑只依赖这几个操作，与具体图像库解耦；默认实现基于 `image::RgbaImage`。
pub trait Canvas: Sized {
    /// 全透明画布
    fn blank(width: u32, height: u32) -> Self;

    fn dimensions(&self) -> (u32, u32);

    /// 裁剪出 `region`；越界返回 `InvalidLayout`，不做截断。
    fn crop(&self, region: Region) -> Result<Self, AppError>;

    /// 按行优先顺序返回每个像素的 alpha
    fn alpha_values(&self) -> impl Iterator<Item = u8> + '_;

    /// 从左上角开始整体覆盖（含 alpha），不做混合
    fn replace(&mut self, top: &Self);

    /// 从左上角开始按 `top` 自身的 alpha 做 "over" 合成
    fn composite_over(&mut self, top: &Self);

    /// 最近邻缩放，输出每个像素都严格等于某一个源像素
    fn resize_nearest(&self, width: u32, height: u32) -> Self;

    fn encode_png(&self) -> Result<Vec<u8>, AppError>;
}

impl Canvas for RgbaImage {
    fn blank(width: u32, height: u32) -> Self {
        RgbaImage::new(width, height)
    }

    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn crop(&self, region: Region) -> Result<Self, AppError> {
        let (w, h) = RgbaImage::dimensions(self);
        if !region.fits_within(w, h) {
            return Err(AppError::InvalidLayout(format!(
                "区域 ({},{})-({},{}) 超出图像范围 {w}x{h}",
                region.x,
                region.y,
                region.right(),
                region.bottom()
            )));
        }
        let view = imageops::crop_imm(self, region.x, region.y, region.width, region.height);
        Ok(view.to_image())
    }

    fn alpha_values(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels().map(|p| p[3])
    }

    fn replace(&mut self, top: &Self) {
        imageops::replace(self, top, 0, 0);
    }

    fn composite_over(&mut self, top: &Self) {
        let (w, h) = RgbaImage::dimensions(self);
        for (x, y, src) in top.enumerate_pixels() {
            if x < w && y < h {
                let dst = self.get_pixel_mut(x, y);
                *dst = blend_over(*src, *dst);
            }
        }
    }

    fn resize_nearest(&self, width: u32, height: u32) -> Self {
        let (sw, sh) = RgbaImage::dimensions(self);
        if sw == 0 || sh == 0 {
            return RgbaImage::new(width, height);
        }
        // 取输出像素中心对应的源像素：src = floor((dst + 0.5) * src_len / dst_len)
        let sample = |dst: u32, dst_len: u32, src_len: u32| -> u32 {
            let v = (2 * u64::from(dst) + 1) * u64::from(src_len) / (2 * u64::from(dst_len));
            (v as u32).min(src_len - 1)
        };
        RgbaImage::from_fn(width, height, |x, y| {
            *self.get_pixel(sample(x, width, sw), sample(y, height, sh))
        })
    }

    fn encode_png(&self) -> Result<Vec<u8>, AppError> {
        let mut buf = Cursor::new(Vec::new());
        self.write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| AppError::Internal(format!("PNG 编码失败: {e}")))?;
        Ok(buf.into_inner())
    }
}

/// Porter-Duff "over"：`top` 叠在 `bottom` 上。
///
/// alpha=0 保留底色，alpha=255 直接替换；其余按非预乘颜色做整数运算并四舍五入。
pub fn blend_over(top: Rgba<u8>, bottom: Rgba<u8>) -> Rgba<u8> {
    let ta = u32::from(top[3]);
    match ta {
        0 => return bottom,
        255 => return top,
        _ => {}
    }
    let ba = u32::from(bottom[3]);

    // 以 255*255 为单位
    let out_a = ta * 255 + ba * (255 - ta);
    let channel = |t: u8, b: u8| -> u8 {
        let num = u32::from(t) * ta * 255 + u32::from(b) * ba * (255 - ta);
        ((num + out_a / 2) / out_a) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        ((out_a + 127) / 255) as u8,
    ])
}
