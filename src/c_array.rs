//! 把打包好的像素数据渲染成LVGL可直接引用的C源文件
//!
//! 输出布局固定: 两个include, 来源注释, `{name}_map`字节数组(每行16个字节),
//! 后面紧跟`lv_image_dsc_t`描述结构体。描述结构体的cf标签固定写RGB565,
//! 字节交换由数据本身承担, LVGL侧开LV_COLOR_16_SWAP后即可正常显示。

use crate::rgb565::PixelFormat;

/// 每行输出的字节字面量个数
const BYTES_PER_LINE: usize = 16;

/// 文件名转合法C标识符: 非字母数字一律换成下划线, 数字开头时前面补一个下划线
pub fn c_identifier(stem: &str) -> String {
    let mut ident = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
        } else {
            ident.push('_');
        }
    }
    if ident.is_empty() || ident.as_bytes()[0].is_ascii_digit() {
        ident.insert(0, '_');
    }
    ident
}

/// 渲染完整的C源文件内容
///
/// `name`必须已经是合法C标识符(先过`c_identifier`), `source`只用于注释,
/// `packed`是打包后的字节流, 长度应为`width * height * 2`。
pub fn render_c_source(
    name: &str,
    source: &str,
    width: u32,
    height: u32,
    format: PixelFormat,
    packed: &[u8],
) -> String {
    //每个字节占"0xHH, "6个字符, 预留头尾的固定文本
    let mut out = String::with_capacity(packed.len() * 6 + 512);
    out.push_str("#include <stdint.h>\n");
    out.push_str("#include <lvgl.h>\n\n");
    out.push_str(&format!("// Generated from: {source} at {width}x{height}\n"));
    out.push_str(&format!("// Format: {}\n", format.describe()));
    out.push_str("// NOTE: Field \".header.always_zero\" removed for LVGL v8 compatibility.\n\n");

    out.push_str(&format!("const uint8_t {name}_map[] = {{\n"));
    for (i, byte) in packed.iter().enumerate() {
        if i > 0 {
            if i % BYTES_PER_LINE == 0 {
                out.push_str(",\n");
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(&format!("0x{byte:02X}"));
    }
    out.push_str("\n};\n\n");

    let data_size = width as usize * height as usize * 2;
    out.push_str(&format!("const lv_image_dsc_t {name}_{width}x{height} = {{\n"));
    out.push_str("  .header.cf = LV_COLOR_FORMAT_RGB565,\n");
    out.push_str(&format!("  .header.w = {width},\n"));
    out.push_str(&format!("  .header.h = {height},\n"));
    out.push_str(&format!("  .data_size = {data_size},\n"));
    out.push_str(&format!("  .data = {name}_map,\n"));
    out.push_str("};\n");
    out
}
