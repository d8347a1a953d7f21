//! 图像解码, 缩放到屏幕尺寸, 量化效果预览

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, Resizer};
use image::{DynamicImage, RgbImage};

use crate::rgb565::{unpack_rgb888, PixelFormat};

/// 解码一个图片文件, 格式由扩展名和文件头自动识别
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("打开图片失败: {}", path.display()))
}

/// 缩放到目标尺寸, 尺寸已经一致时直接返回
///
/// 缺省卷积核是Lanczos3
pub fn resize_to_screen(src: &DynamicImage, dst_width: u32, dst_height: u32) -> Result<RgbImage> {
    let mut src = src.to_rgb8();
    if src.width() == dst_width && src.height() == dst_height {
        return Ok(src);
    }
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x3);
    let v = Image::from_slice_u8(src.width(), src.height(), src.as_mut(), PixelType::U8x3)?;
    let mut resizer = Resizer::new();
    resizer.resize(&v, &mut dst_image, None)?;
    RgbImage::from_raw(dst_width, dst_height, dst_image.buffer().to_vec())
        .ok_or_else(|| anyhow!("缩放结果buffer大小错误"))
}

/// 把打包后的数据还原成图片存盘, 在PC上直接查看量化损失
pub fn save_preview(
    packed: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    path: &Path,
) -> Result<()> {
    let rgb = unpack_rgb888(packed, format);
    let img = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| anyhow!("还原buffer大小与{width}x{height}不符"))?;
    img.save(path)
        .with_context(|| format!("保存预览图失败: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rgb565::pack_rgb888;

    #[test]
    fn test_resize_passthrough() {
        //尺寸一致时像素原样返回
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30])));
        let out = resize_to_screen(&img, 8, 4).unwrap();
        assert_eq!(out.as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn test_resize_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, image::Rgb([200, 0, 0])));
        let out = resize_to_screen(&img, 32, 16).unwrap();
        assert_eq!((out.width(), out.height()), (32, 16));
    }

    #[test]
    fn test_save_preview() {
        //纯红纯绿在565量化下无损, 预览图像素应当和原图一致
        let packed = pack_rgb888(&[255, 0, 0, 0, 255, 0], 2, 1, PixelFormat::Rgb565Le).unwrap();
        let path = std::env::temp_dir().join("screen_tools_preview_test.png");
        save_preview(&packed, 2, 1, PixelFormat::Rgb565Le, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0]);
        let _ = std::fs::remove_file(&path);
    }
}
