//! 运行配置: ESP32地址, 屏幕尺寸, 生图接口参数
//! 所有参数通过结构体显式传给各个收发模块, 不放全局状态

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// ESP32网络地址 (ESP32作为服务器端, PC主动连接)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 局域网IP
    pub ip: String,
    /// 图像流端口
    pub image_port: u16,
    /// 传感器查询端口
    pub sensor_port: u16,
    /// 连接和读写超时(秒)
    pub timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip: "192.168.0.17".to_string(),
            image_port: 8080,
            sensor_port: 8082,
            timeout_secs: 5,
        }
    }
}

/// 目标屏幕尺寸
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenConfig {
    //ST7789横屏
    fn default() -> Self {
        Self {
            width: 320,
            height: 170,
        }
    }
}

impl ScreenConfig {
    /// 一帧打包后的字节数
    pub fn data_size(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }
}

/// Stability AI生图接口参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub api_url: String,
    pub model: String,
    pub output_format: String,
    pub aspect_ratio: String,
    pub timeout_secs: u64,
    /// 不填时启动后从环境变量STABILITY_API_KEY读取
    pub api_key: Option<String>,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.stability.ai/v2beta/stable-image/generate/core".to_string(),
            model: "stable-diffusion-xl".to_string(),
            output_format: "jpeg".to_string(),
            aspect_ratio: "16:9".to_string(),
            timeout_secs: 45,
            api_key: None,
        }
    }
}

impl StabilityConfig {
    /// 取API密钥, 配置文件优先, 其次环境变量
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref() {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }
        std::env::var("STABILITY_API_KEY")
            .context("未找到API密钥, 请在配置文件api.api_key中填写或者设置环境变量STABILITY_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub screen: ScreenConfig,
    pub api: StabilityConfig,
    /// 轮询间隔(秒)
    pub poll_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            screen: ScreenConfig::default(),
            api: StabilityConfig::default(),
            poll_interval_secs: 30,
        }
    }
}

impl AppConfig {
    /// 读取JSON配置文件, 文件不存在时直接用默认值
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }
}
