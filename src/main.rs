use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

mod ai_image;
mod c_array;
mod config;
mod convert;
mod rgb565;
#[cfg(feature = "usb-serial")]
mod serial_screen;
mod tcp_screen;

use crate::config::AppConfig;
use crate::rgb565::{pack_image, PixelFormat};

#[derive(Parser)]
#[command(
    name = "esp32-screen-tools",
    version,
    about = "ESP32小屏幕图像工具: 图片转C数组 / 串口传图 / 传感器轮询AI生图"
)]
struct Cli {
    /// JSON配置文件路径, 不存在时使用内置默认值
    #[arg(long, global = true, default_value = "screen-tools.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 图片转成LVGL的C数组源文件, 或raw裸数据
    Convert {
        /// 输入图片
        input: PathBuf,
        /// 输出文件, 扩展名.raw/.bin时输出裸数据, 其余输出C文件, 缺省按输入名生成.c
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 目标宽度
        #[arg(long, default_value_t = 320)]
        width: u32,
        /// 目标高度
        #[arg(long, default_value_t = 240)]
        height: u32,
        /// 像素格式
        #[arg(long, value_enum, default_value = "bgr565-swapped")]
        format: PixelFormat,
        /// C数组名, 缺省取输出文件名
        #[arg(long)]
        name: Option<String>,
        /// 把量化还原后的效果另存一张预览图
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// 通过USB串口把raw图像发到ST7789屏幕
    #[cfg(feature = "usb-serial")]
    Send {
        /// raw图像文件 (width*height*2字节)
        input: PathBuf,
        /// 串口名, 例如COM17或/dev/ttyACM0
        #[arg(short, long)]
        port: String,
        #[arg(long, default_value_t = serial_screen::DEFAULT_BAUD_RATE)]
        baud: u32,
        #[arg(long, default_value_t = 320)]
        width: u32,
        #[arg(long, default_value_t = 170)]
        height: u32,
    },
    /// 列出系统中的串口
    #[cfg(feature = "usb-serial")]
    Ports,
    /// 轮询温度传感器, AI生图后推送到屏幕, Ctrl+C退出
    Watch {
        /// 覆盖配置文件里的设备IP
        #[arg(long)]
        ip: Option<String>,
        /// 覆盖轮询间隔(秒)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn main() -> Result<()> {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            width,
            height,
            format,
            name,
            preview,
        } => run_convert(
            &input,
            output.as_deref(),
            width,
            height,
            format,
            name.as_deref(),
            preview.as_deref(),
        ),
        #[cfg(feature = "usb-serial")]
        Commands::Send {
            input,
            port,
            baud,
            width,
            height,
        } => run_send(&input, &port, baud, width, height),
        #[cfg(feature = "usb-serial")]
        Commands::Ports => serial_screen::list_ports(),
        Commands::Watch { ip, interval } => {
            let mut config = config;
            if let Some(ip) = ip {
                config.device.ip = ip;
            }
            if let Some(secs) = interval {
                config.poll_interval_secs = secs;
            }
            run_watch(&config)
        }
    }
}

fn run_convert(
    input: &Path,
    output: Option<&Path>,
    width: u32,
    height: u32,
    format: PixelFormat,
    name: Option<&str>,
    preview: Option<&Path>,
) -> Result<()> {
    let img = convert::load_image(input)?;
    info!(
        "输入图片{}x{}, 目标{width}x{height} {}",
        img.width(),
        img.height(),
        format.describe()
    );
    let resized = convert::resize_to_screen(&img, width, height)?;
    let packed = pack_image(&resized, format)?;

    let output = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_extension("c"),
    };
    let is_raw = matches!(
        output.extension().and_then(|e| e.to_str()),
        Some("raw") | Some("bin")
    );
    if is_raw {
        std::fs::write(&output, &packed)
            .with_context(|| format!("写入失败: {}", output.display()))?;
        info!("已写入{}字节raw数据: {}", packed.len(), output.display());
    } else {
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let array_name = c_array::c_identifier(name.unwrap_or(stem));
        let source_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        let c_source =
            c_array::render_c_source(&array_name, source_name, width, height, format, &packed);
        std::fs::write(&output, c_source)
            .with_context(|| format!("写入失败: {}", output.display()))?;
        info!("已生成C文件: {} (数组{array_name}_map)", output.display());
    }

    if let Some(preview_path) = preview {
        convert::save_preview(&packed, width, height, format, preview_path)?;
        info!("预览图已保存: {}", preview_path.display());
    }
    Ok(())
}

#[cfg(feature = "usb-serial")]
fn run_send(input: &Path, port: &str, baud: u32, width: u32, height: u32) -> Result<()> {
    let data =
        std::fs::read(input).with_context(|| format!("读取文件失败: {}", input.display()))?;
    serial_screen::send_image(port, baud, width, height, &data)
}

fn run_watch(config: &AppConfig) -> Result<()> {
    //先确认密钥能拿到, 不要等到轮询阶段才发现没配置
    config.api.resolve_api_key()?;
    info!(
        "开始轮询 {}, 间隔{}秒, 屏幕{}x{}",
        config.device.ip, config.poll_interval_secs, config.screen.width, config.screen.height
    );
    loop {
        if let Err(err) = watch_cycle(config) {
            error!("本轮失败, 跳过: {err:?}");
        }
        info!("等待{}秒...", config.poll_interval_secs);
        std::thread::sleep(Duration::from_secs(config.poll_interval_secs));
    }
}

/// 单个轮询周期: 查温度 -> 生成提示词 -> 生图 -> 缩放打包 -> 推送
/// 任何一步失败都结束本轮, 不重试
fn watch_cycle(config: &AppConfig) -> Result<()> {
    let data = tcp_screen::poll_sensor(&config.device)?;
    info!("传感器数据: {data}");
    let temp = match tcp_screen::parse_temperature(&data) {
        Some(t) => t,
        None => {
            warn!("温度解析失败, 使用默认值25.0C");
            25.0
        }
    };
    let prompt = ai_image::build_prompt(temp);
    let img = ai_image::generate_image(&config.api, &prompt)?;
    //ST7789串流固件只认RGB565小端序
    let resized = convert::resize_to_screen(&img, config.screen.width, config.screen.height)?;
    let packed = pack_image(&resized, PixelFormat::Rgb565Le)?;
    if packed.len() != config.screen.data_size() {
        return Err(anyhow!(
            "打包数据{}字节, 与屏幕{}x{}不符",
            packed.len(),
            config.screen.width,
            config.screen.height
        ));
    }
    tcp_screen::send_image(&config.device, &packed)
}
