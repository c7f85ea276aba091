//! Conversion of decoded status reports into metric points

use crate::gem::protocol::DecodedFrame;
use crate::sink::MetricPoint;
use chrono::{DateTime, Utc};

/// Convert one decoded report into the points it contributes
///
/// One `voltage` point is always emitted, even for an all-default frame
/// (empty serial, zero volts). Each populated channel adds one point per
/// sample map, tagged with the serial and the channel id. All points share
/// the decode timestamp.
pub fn frame_points(frame: &DecodedFrame, timestamp: DateTime<Utc>) -> Vec<MetricPoint> {
    let mut points = Vec::with_capacity(
        1 + frame.energy.len() + frame.temperatures.len() + frame.pulses.len(),
    );

    points.push(
        MetricPoint::new("voltage", timestamp)
            .with_tag("serial", frame.serial.clone())
            .with_field("volts", frame.voltage),
    );

    for (channel, sample) in &frame.energy {
        points.push(
            channel_point("energy", frame, *channel, timestamp)
                .with_field("watt-hours", sample.watt_hours)
                .with_field("watts", sample.watts)
                .with_field("amps", sample.amps),
        );
    }

    for (channel, sample) in &frame.temperatures {
        points.push(
            channel_point("temperature", frame, *channel, timestamp)
                .with_field("temperature", sample.temperature),
        );
    }

    for (channel, sample) in &frame.pulses {
        points.push(
            channel_point("pulses", frame, *channel, timestamp)
                .with_field("pulses", sample.pulses),
        );
    }

    points
}

fn channel_point(
    measurement: &str,
    frame: &DecodedFrame,
    channel: i64,
    timestamp: DateTime<Utc>,
) -> MetricPoint {
    MetricPoint::new(measurement, timestamp)
        .with_tag("serial", frame.serial.clone())
        .with_tag("channel", channel.to_string())
}
