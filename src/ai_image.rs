//! 调用Stability AI接口, 按当前温度生成一张风景图

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use log::info;
use reqwest::blocking::{multipart, Client};

use crate::config::StabilityConfig;

/// 温度转提示词
///
/// 高于30度是沙漠, 低于20度是雪景, 中间区间按小数部分在三种平和场景里轮换,
/// 让温度的微小变化也能换出不同的画面
pub fn build_prompt(temp: f32) -> String {
    if temp > 30.0 {
        format!("A dramatic, hot, desert landscape under a blazing sun with red and yellow tones. Current temperature is {temp:.2}C.")
    } else if temp < 20.0 {
        format!("A serene, cold winter wonderland with thick snow and deep blue tones. Current temperature is {temp:.2}C.")
    } else {
        let decimal_part = temp - temp.trunc();
        let mood = if decimal_part < 0.33 {
            "A mild, contemplative forest scene at dawn with soft muted colors."
        } else if decimal_part < 0.66 {
            "A pleasant, sunny meadow scene in the afternoon with cheerful green and yellow."
        } else {
            "A slightly overcast, calm lake scene at dusk with atmospheric moody blue."
        };
        format!("{mood} Temperature is {temp:.2}C, causing subtle changes in the environment.")
    }
}

/// 请求生成一张图并解码, 单次尝试, 失败由调用方决定是否跳过本轮
pub fn generate_image(api: &StabilityConfig, prompt: &str) -> Result<DynamicImage> {
    let api_key = api.resolve_api_key()?;
    info!("请求生成图像: {prompt}");
    let client = Client::builder()
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()?;
    let form = multipart::Form::new()
        .text("prompt", prompt.to_string())
        .text("output_format", api.output_format.clone())
        .text("aspect_ratio", api.aspect_ratio.clone())
        .text("model", api.model.clone());
    let response = client
        .post(&api.api_url)
        .header("Accept", "image/*")
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .context("生图接口请求失败")?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(anyhow!("生图接口返回错误: status={status} body={body}"));
    }
    let bytes = response.bytes().context("读取响应失败")?;
    let img = image::load_from_memory(&bytes).context("生成结果解码失败")?;
    info!("图像生成成功 {}x{}", img.width(), img.height());
    Ok(img)
}
