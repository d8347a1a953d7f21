//! 通过USB串口把整帧raw图像发给ST7789串流固件
//!
//! 固件协议: 收到开始命令后进入读循环, 依次读满width*height*2字节写入显存

use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::info;
use serialport::SerialPortType;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// 通知固件进入读图循环的命令, 必须带换行
pub const START_COMMAND: &str = "START_IMAGE_TRANSFER\n";

/// 发送一帧图像数据
///
/// 打开串口会触发开发板复位, 等2秒固件起来再发开始命令,
/// 之后等500毫秒让固件进入读循环, 最后写入整帧数据
pub fn send_image(port_name: &str, baud_rate: u32, width: u32, height: u32, data: &[u8]) -> Result<()> {
    let expected = width as usize * height as usize * 2;
    if data.len() != expected {
        return Err(anyhow!(
            "数据大小不符: {width}x{height}屏幕需要{expected}字节, 实际{}字节",
            data.len()
        ));
    }

    info!("打开串口 {port_name}, 波特率{baud_rate}...");
    let mut port = serialport::new(port_name, baud_rate)
        .timeout(Duration::from_secs(10))
        .open()
        .with_context(|| format!("打开串口{port_name}失败, 可用ports子命令查看可用串口"))?;
    thread::sleep(Duration::from_secs(2));

    info!("发送开始命令: {}", START_COMMAND.trim_end());
    port.write_all(START_COMMAND.as_bytes())?;
    port.flush()?;
    thread::sleep(Duration::from_millis(500));

    info!("发送{}字节图像数据...", data.len());
    port.write_all(data)?;
    port.flush()?;
    info!("串口传输完成, 屏幕应当已刷新");
    Ok(())
}

/// 打印系统中的所有串口, USB设备带上vid/pid和产品名
pub fn list_ports() -> Result<()> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("未找到串口设备");
        return Ok(());
    }
    for p in ports {
        match &p.port_type {
            SerialPortType::UsbPort(usb) => {
                let product = usb.product.as_deref().unwrap_or("?");
                println!("{}  USB {:04x}:{:04x} {}", p.port_name, usb.vid, usb.pid, product);
            }
            _ => println!("{}", p.port_name),
        }
    }
    Ok(())
}
