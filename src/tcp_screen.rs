//! 与ESP32两个TCP服务的交互 (ESP32是服务器端)
//!
//! 图像端口收一整帧raw数据直接刷屏, 传感器端口收"GET_TEMP\n"回一行读数

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::config::DeviceConfig;

fn connect(ip: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = (ip, port)
        .to_socket_addrs()
        .with_context(|| format!("解析地址失败: {ip}:{port}"))?
        .next()
        .ok_or_else(|| anyhow!("解析地址失败: {ip}:{port}"))?;
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .with_context(|| format!("连接{ip}:{port}失败, ESP32服务是否在运行?"))?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

/// 连接图像端口, 整帧发完后关闭连接, 固件收满一帧立即刷屏
pub fn send_image(device: &DeviceConfig, data: &[u8]) -> Result<()> {
    let timeout = Duration::from_secs(device.timeout_secs);
    info!("连接图像服务 {}:{}...", device.ip, device.image_port);
    let mut stream = connect(&device.ip, device.image_port, timeout)?;
    info!("连接成功, 发送{}字节...", data.len());
    stream.write_all(data).context("图像数据发送失败")?;
    stream.shutdown(Shutdown::Both)?;
    info!("图像发送完成");
    Ok(())
}

/// 请求一次传感器读数, 返回修剪过的响应文本 (形如temp=35.50C)
///
/// 空响应按失败处理, 调用方据此跳过本轮, 不会白跑一次生图请求
pub fn poll_sensor(device: &DeviceConfig) -> Result<String> {
    let timeout = Duration::from_secs(device.timeout_secs);
    info!("连接传感器服务 {}:{}...", device.ip, device.sensor_port);
    let mut stream = connect(&device.ip, device.sensor_port, timeout)?;
    stream.write_all(b"GET_TEMP\n").context("查询命令发送失败")?;
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).context("读取传感器响应失败")?;
    let text = String::from_utf8_lossy(&buf[..n]).trim().to_string();
    if text.is_empty() {
        return Err(anyhow!("传感器响应为空"));
    }
    Ok(text)
}

/// 从key=value<unit>格式中解析温度数值, 解析不了返回None由调用方给默认值
pub fn parse_temperature(data: &str) -> Option<f32> {
    let value = data.split('=').nth(1)?;
    value.replace('C', "").trim().parse::<f32>().ok()
}
