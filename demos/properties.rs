//! Drive the property interface the way a host control layer would.
//!
//! Usage: cargo run --example properties

use gestic::{
    event_channel, ControlSurface, Device, Property, ScriptedTransport, SensorConfig, Value,
};

fn main() {
    env_logger::init();

    let (bus, log) = ScriptedTransport::new();
    let (sink, _events) = event_channel(16);
    let device = match Device::open(bus, sink, SensorConfig::default()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to open sensor: {}", e);
            std::process::exit(1);
        }
    };

    for prop in Property::ALL {
        if prop.readable() && prop != Property::ReceiveBuffer {
            match device.get(prop.name()) {
                Ok(v) => println!("{:<24} {:?}", prop.name(), v),
                Err(e) => println!("{:<24} error: {}", prop.name(), e),
            }
        }
    }
    println!();

    // Rebind swipe up to a left click, parsed from host text.
    let value = Value::parse_int("2000\n").unwrap_or(Value::Int(2000));
    if let Err(e) = device.set("air_swipe_up", value) {
        eprintln!("air_swipe_up: {}", e);
    }

    // Stream read of bytes an external producer queued.
    device.push_stream_bytes(b"gestic");
    let _ = device.set("receive_buffer", Value::Int(4));
    let _ = device.set("send_buffer", Value::Bytes(vec![0xFE, 0x00]));
    println!("stream read: {:?}", device.get("receive_buffer"));
    println!("stream_buffer_size: {:?}", device.get("stream_buffer_size"));

    // Raw passthrough.
    let _ = device.set("send_buffer", Value::Bytes(vec![0x42, 0x02, 0x01, 0x02]));
    println!("bus traffic: {:02x?}", log.sent());

    device.close();
}
