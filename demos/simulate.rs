//! Run a simulated GestIC sensor through the full decode path.
//!
//! Usage: RUST_LOG=debug cargo run --example simulate

use gestic::protocol::{FW_STATUS_VALID, MSG_ID_FW_VERSION_INFO, MSG_ID_SENSOR_DATA_OUTPUT};
use gestic::{event_channel, Device, ScriptedTransport, SensorConfig};
use std::time::Duration;

fn data_frame(mask: u16, system_info: u8, blocks: &[u8]) -> Vec<u8> {
    let [lo, hi] = mask.to_le_bytes();
    let mut msg = vec![0x00, 0x08, 0x00, MSG_ID_SENSOR_DATA_OUTPUT, lo, hi, 0x00, system_info];
    msg.extend_from_slice(blocks);
    msg[0] = msg.len() as u8;
    msg
}

fn main() {
    env_logger::init();

    let (bus, log) = ScriptedTransport::new();

    // Version info answer for the bring-up handshake.
    let mut version = vec![0u8; 48];
    version[0] = 0x84;
    version[3] = MSG_ID_FW_VERSION_INFO;
    version[4] = FW_STATUS_VALID;
    version[10] = 4;
    version[11] = 1;
    version[42..47].copy_from_slice(&[1, 3, 14, 7, 2]);
    log.push_response(version);

    let (sink, events) = event_channel(256);
    let device = match Device::open(bus, sink, SensorConfig::from_env()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to open sensor: {}", e);
            std::process::exit(1);
        }
    };

    match device.firmware() {
        Some(fw) => println!(
            "Firmware: {} (bootloader {}.{}, {:?})",
            fw.version_string(),
            fw.bootloader_major,
            fw.bootloader_minor,
            fw.validity
        ),
        None => println!("Firmware: unknown"),
    }
    println!();

    // A hand sweeping right to left above the sensor, ending in a swipe.
    for step in 0..8u16 {
        let x = 0x7000 - step * 0x0E00;
        let [xl, xh] = x.to_le_bytes();
        log.push_response(data_frame(0x0010, 0x01, &[xl, xh, 0x00, 0x40, 0x00, 0x20]));
    }
    let swipe_left = [0x13, 0x10, 0x00, 0x00, 0x00, 0x10, 0x00, 0x40, 0x00, 0x20];
    log.push_response(data_frame(0x0012, 0x01, &swipe_left));
    // Air wheel turn with a valid wheel value.
    log.push_response(data_frame(0x0008, 0x02, &[0x40, 0x01]));

    while log.pending_responses() > 0 {
        device.interrupt();
        std::thread::sleep(Duration::from_millis(5));
    }

    while let Ok(event) = events.recv_timeout(Duration::from_millis(200)) {
        println!("{:?}", event);
    }

    device.close();
}
