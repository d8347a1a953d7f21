//! RGB888与16位打包像素格式之间的转换
//! 转换必须与单片机端取色方式完全一致, 任何偏差都会造成整屏偏色

use clap::ValueEnum;
use image::RgbImage;
use thiserror::Error;

/// 输出的16位像素格式, 对应两块不同的屏幕
///
/// - `Rgb565Le`: R5|G6|B5直接打包, 低字节在前, ST7789串流固件直接写入显存
/// - `Bgr565Swapped`: 按B5|G6|R5打包后再交换高低字节,
///   对应ILI9341 (BGR面板) + LVGL开启LV_COLOR_16_SWAP的情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PixelFormat {
    #[value(name = "rgb565-le")]
    Rgb565Le,
    #[value(name = "bgr565-swapped")]
    Bgr565Swapped,
}

impl PixelFormat {
    /// 格式说明文字 (写入生成的C文件注释)
    pub fn describe(&self) -> &'static str {
        match self {
            PixelFormat::Rgb565Le => "RGB565 (16-bit, little-endian)",
            PixelFormat::Bgr565Swapped => "BGR565 (16-bit, byte-swapped)",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackError {
    #[error("图像宽高不能为0: {width}x{height}")]
    EmptyInput { width: u32, height: u32 },
    #[error("像素数据与声明的尺寸不符: {width}x{height}需要{expected}字节RGB888数据, 实际{actual}字节")]
    ShapeMismatch {
        width: u32,
        height: u32,
        //u32宽高的乘积可能超出usize, 用u128存放精确值
        expected: u128,
        actual: usize,
    },
}

/// RGB888转RGB565 (直接截断低位: R/B丢弃低3位, G丢弃低2位, 不做四舍五入)
#[inline]
pub fn rgb_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// RGB888转BGR565 (R和B互换位置, 截断方式同上)
#[inline]
pub fn rgb_to_bgr565(r: u8, g: u8, b: u8) -> u16 {
    ((b as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (r as u16 >> 3)
}

/// 将RGB888字节序列按行优先顺序打包成16位像素字节流
///
/// `rgb`长度必须等于`width * height * 3`, 输出长度固定为`width * height * 2`,
/// 输出字节顺序与输入像素顺序严格对应, 行与行之间无填充。
pub fn pack_rgb888(
    rgb: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>, PackError> {
    if width == 0 || height == 0 {
        return Err(PackError::EmptyInput { width, height });
    }
    //宽高乘积可能超出usize, 在u128里比较, 避免调试模式panic和发布模式回绕
    let expected = width as u128 * height as u128 * 3;
    if rgb.len() as u128 != expected {
        return Err(PackError::ShapeMismatch {
            width,
            height,
            expected,
            actual: rgb.len(),
        });
    }
    //校验通过说明w*h*3不超过切片长度上限, 下面的w*h*2不会溢出
    let mut packed = Vec::with_capacity(width as usize * height as usize * 2);
    for p in rgb.chunks_exact(3) {
        let bytes = match format {
            PixelFormat::Rgb565Le => rgb_to_rgb565(p[0], p[1], p[2]).to_le_bytes(),
            //BGR打包后交换高低字节, 等价于按大端序输出
            PixelFormat::Bgr565Swapped => rgb_to_bgr565(p[0], p[1], p[2]).to_be_bytes(),
        };
        packed.extend_from_slice(&bytes);
    }
    Ok(packed)
}

/// 打包一张RgbImage
pub fn pack_image(img: &RgbImage, format: PixelFormat) -> Result<Vec<u8>, PackError> {
    pack_rgb888(img.as_raw(), img.width(), img.height(), format)
}

/// 16位像素字节流还原为RGB888, 用于在PC上预览转换损失
///
/// 位扩展时低位用高位填充: 5位->8位左移3位后低3位补高3位, 6位->8位同理
pub fn unpack_rgb888(packed: &[u8], format: PixelFormat) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(packed.len() / 2 * 3);
    for chunk in packed.chunks_exact(2) {
        let value = match format {
            PixelFormat::Rgb565Le => u16::from_le_bytes([chunk[0], chunk[1]]),
            PixelFormat::Bgr565Swapped => u16::from_be_bytes([chunk[0], chunk[1]]),
        };
        let hi5 = ((value >> 11) & 0x1F) as u8;
        let g6 = ((value >> 5) & 0x3F) as u8;
        let lo5 = (value & 0x1F) as u8;
        let (r5, b5) = match format {
            PixelFormat::Rgb565Le => (hi5, lo5),
            PixelFormat::Bgr565Swapped => (lo5, hi5),
        };
        rgb.push((r5 << 3) | (r5 >> 2));
        rgb.push((g6 << 2) | (g6 >> 4));
        rgb.push((b5 << 3) | (b5 >> 2));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_rgb565_le() {
        //纯红: R5=31 G6=0 B5=0 -> 0xF800, 小端序低字节在前
        let packed = pack_rgb888(&[255, 0, 0], 1, 1, PixelFormat::Rgb565Le).unwrap();
        assert_eq!(packed, vec![0x00, 0xF8]);
    }

    #[test]
    fn test_red_bgr565_swapped() {
        //纯红按BGR打包: B5=0 G6=0 R5=31 -> 0x001F, 交换后高字节在前
        let packed = pack_rgb888(&[255, 0, 0], 1, 1, PixelFormat::Bgr565Swapped).unwrap();
        assert_eq!(packed, vec![0x00, 0x1F]);
    }

    #[test]
    fn test_green_blue_row() {
        //2x1: 纯绿0x07E0 + 纯蓝0x001F, 小端序逐像素拼接
        let rgb = [0, 255, 0, 0, 0, 255];
        let packed = pack_rgb888(&rgb, 2, 1, PixelFormat::Rgb565Le).unwrap();
        assert_eq!(packed, vec![0xE0, 0x07, 0x1F, 0x00]);
    }

    #[test]
    fn test_output_length() {
        let rgb = vec![0x7Fu8; 7 * 5 * 3];
        for format in [PixelFormat::Rgb565Le, PixelFormat::Bgr565Swapped] {
            let packed = pack_rgb888(&rgb, 7, 5, format).unwrap();
            assert_eq!(packed.len(), 7 * 5 * 2);
        }
    }

    #[test]
    fn test_truncation_exact() {
        //每个通道单独扫描0..=255, 验证位域是纯截断
        for v in 0u16..=255 {
            let v8 = v as u8;
            let r = rgb_to_rgb565(v8, 0, 0);
            assert_eq!(r >> 11, v >> 3, "R通道截断错误: {v}");
            let g = rgb_to_rgb565(0, v8, 0);
            assert_eq!((g >> 5) & 0x3F, v >> 2, "G通道截断错误: {v}");
            let b = rgb_to_rgb565(0, 0, v8);
            assert_eq!(b & 0x1F, v >> 3, "B通道截断错误: {v}");
        }
    }

    #[test]
    fn test_no_rounding() {
        //(7,3,7)各通道低位全部截掉, 四舍五入的话R5/B5会变成1
        assert_eq!(rgb_to_rgb565(7, 3, 7), 0x0000);
        assert_eq!(rgb_to_bgr565(7, 3, 7), 0x0000);
    }

    #[test]
    fn test_bgr_channel_swap() {
        //BGR打包里R和B位置互换
        for (r, g, b) in [(200u8, 100u8, 50u8), (13, 77, 250), (255, 255, 255)] {
            assert_eq!(rgb_to_bgr565(r, g, b), rgb_to_rgb565(b, g, r));
        }
    }

    #[test]
    fn test_byte_order() {
        //(200,100,50): R5=25 G6=25 B5=6 -> RGB565=0xCB26, BGR565=0x3339
        let le = pack_rgb888(&[200, 100, 50], 1, 1, PixelFormat::Rgb565Le).unwrap();
        assert_eq!(le, vec![0x26, 0xCB]);
        let swapped = pack_rgb888(&[200, 100, 50], 1, 1, PixelFormat::Bgr565Swapped).unwrap();
        assert_eq!(swapped, vec![0x33, 0x39]);
    }

    #[test]
    fn test_deterministic() {
        let rgb: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 37 % 256) as u8).collect();
        let a = pack_rgb888(&rgb, 4, 3, PixelFormat::Bgr565Swapped).unwrap();
        let b = pack_rgb888(&rgb, 4, 3, PixelFormat::Bgr565Swapped).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shape_mismatch() {
        //5个像素声明为2x2
        let rgb = vec![0u8; 5 * 3];
        let err = pack_rgb888(&rgb, 2, 2, PixelFormat::Rgb565Le).unwrap_err();
        assert_eq!(
            err,
            PackError::ShapeMismatch {
                width: 2,
                height: 2,
                expected: 12,
                actual: 15
            }
        );
    }

    #[test]
    fn test_shape_mismatch_huge_dims() {
        //宽高乘积超出usize时也必须正常返回ShapeMismatch, 不能算术溢出
        let err = pack_rgb888(&[], u32::MAX, u32::MAX, PixelFormat::Rgb565Le).unwrap_err();
        assert_eq!(
            err,
            PackError::ShapeMismatch {
                width: u32::MAX,
                height: u32::MAX,
                expected: u32::MAX as u128 * u32::MAX as u128 * 3,
                actual: 0
            }
        );
    }

    #[test]
    fn test_empty_input() {
        let err = pack_rgb888(&[], 0, 4, PixelFormat::Rgb565Le).unwrap_err();
        assert_eq!(err, PackError::EmptyInput { width: 0, height: 4 });
        //0x0也必须报EmptyInput而不是返回空buffer
        let err = pack_rgb888(&[], 0, 0, PixelFormat::Bgr565Swapped).unwrap_err();
        assert_eq!(err, PackError::EmptyInput { width: 0, height: 0 });
    }

    #[test]
    fn test_unpack_roundtrip() {
        //量化后的值再打包应当保持不变
        let rgb: Vec<u8> = (0..6 * 2 * 3).map(|i| (i * 19 % 256) as u8).collect();
        for format in [PixelFormat::Rgb565Le, PixelFormat::Bgr565Swapped] {
            let packed = pack_rgb888(&rgb, 6, 2, format).unwrap();
            let restored = unpack_rgb888(&packed, format);
            assert_eq!(restored.len(), rgb.len());
            let repacked = pack_rgb888(&restored, 6, 2, format).unwrap();
            assert_eq!(repacked, packed);
        }
    }

    #[test]
    fn test_pack_image() {
        let img = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8 * 80, y as u8 * 100, 33]));
        let packed = pack_image(&img, PixelFormat::Rgb565Le).unwrap();
        assert_eq!(
            packed,
            pack_rgb888(img.as_raw(), 3, 2, PixelFormat::Rgb565Le).unwrap()
        );
    }
}
