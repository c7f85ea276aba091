//! # GEM Status-Report Decoder
//!
//! Decodes one raw status line into typed per-channel samples.

use super::protocol::*;

/// Decode a complete GEM status report
///
/// Total function: never fails on malformed input. Every malformed field is
/// skipped and recorded in `field_errors`, and decoding continues with the
/// remaining fields. Decoding the same line twice yields identical frames.
///
/// # Arguments
///
/// * `line` - One raw status line (`&`-joined `key=value` fields, no newline)
///
/// # Returns
///
/// * `DecodedFrame` - Decoded samples plus any per-field decode errors
///
/// # Examples
///
/// ```
/// use gem_bridge::gem::decoder::decode;
///
/// let frame = decode("v=120.5&n=ABC123&wh_1=100.2&p_1=50.0&a_1=0.4");
/// assert_eq!(frame.voltage, 120.5);
/// assert_eq!(frame.serial, "ABC123");
/// assert_eq!(frame.energy[&1].watt_hours, 100.2);
/// assert!(frame.field_errors.is_empty());
/// ```
pub fn decode(line: &str) -> DecodedFrame {
    let mut frame = DecodedFrame::default();

    for field in line.split(FIELD_SEPARATOR) {
        let pair: Vec<&str> = field.split('=').collect();
        if pair.len() != 2 {
            frame.field_errors.push(FieldError::Structure(field.to_string()));
            continue;
        }
        // The monitor prefixes the serial field with "Alive " in the report
        // it sends in response to a keepalive poll.
        let key = if pair[0] == "Alive n" { "n" } else { pair[0] };
        let value = pair[1];

        match key {
            "v" => match value.parse::<f64>() {
                Ok(volts) => frame.voltage = volts,
                Err(_) => frame.field_errors.push(FieldError::Parse(field.to_string())),
            },
            "n" => frame.serial = value.to_string(),
            // Elapsed-time marker, intentionally unused
            "m" => {}
            _ => decode_channel_field(&mut frame, key, value, field),
        }
    }

    frame
}

/// Decode one `{type}_{channel}` field into the matching channel map
///
/// Unknown type prefixes are silently ignored; structural and parse problems
/// are recorded on the frame and the field is skipped.
fn decode_channel_field(frame: &mut DecodedFrame, key: &str, value: &str, field: &str) {
    let key_split: Vec<&str> = key.split('_').collect();
    if key_split.len() != 2 {
        frame.field_errors.push(FieldError::Structure(field.to_string()));
        return;
    }

    let channel: i64 = match key_split[1].parse() {
        Ok(channel) => channel,
        Err(_) => {
            frame.field_errors.push(FieldError::Parse(field.to_string()));
            return;
        }
    };

    match key_split[0] {
        "wh" => {
            if let Some(watt_hours) = parse_float(frame, value, field) {
                frame.energy.entry(channel).or_default().watt_hours = watt_hours;
            }
        }
        "p" => {
            if let Some(watts) = parse_float(frame, value, field) {
                frame.energy.entry(channel).or_default().watts = watts;
            }
        }
        "a" => {
            if let Some(amps) = parse_float(frame, value, field) {
                frame.energy.entry(channel).or_default().amps = amps;
            }
        }
        "t" => {
            // Unconnected temperature sensors report a sentinel, not a number
            if TEMPERATURE_NO_READING.contains(&value) {
                return;
            }
            if let Some(temperature) = parse_float(frame, value, field) {
                frame
                    .temperatures
                    .insert(channel, TemperatureSample { temperature });
            }
        }
        "c" => match value.parse::<i64>() {
            Ok(pulses) => {
                frame.pulses.insert(channel, PulseSample { pulses });
            }
            Err(_) => frame.field_errors.push(FieldError::Parse(field.to_string())),
        },
        // Unknown channel types are not an error
        _ => {}
    }
}

fn parse_float(frame: &mut DecodedFrame, value: &str, field: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            frame.field_errors.push(FieldError::Parse(field.to_string()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_report() {
        let frame = decode("v=120.5&n=ABC123&wh_1=100.2&p_1=50.0&a_1=0.4&t_2=72.3&c_3=15");

        assert_eq!(frame.voltage, 120.5);
        assert_eq!(frame.serial, "ABC123");
        assert_eq!(frame.energy.len(), 1);
        assert_eq!(frame.energy[&1].watt_hours, 100.2);
        assert_eq!(frame.energy[&1].watts, 50.0);
        assert_eq!(frame.energy[&1].amps, 0.4);
        assert_eq!(frame.temperatures[&2].temperature, 72.3);
        assert_eq!(frame.pulses[&3].pulses, 15);
        assert!(frame.field_errors.is_empty());
    }

    #[test]
    fn test_decode_is_idempotent() {
        let line = "v=120.5&n=ABC123&wh_1=100.2&bogus&t_4=x&c_2=7";
        assert_eq!(decode(line), decode(line));
    }

    #[test]
    fn test_decode_alive_serial_alias() {
        let frame = decode("Alive n=GEM042&v=119.8");
        assert_eq!(frame.serial, "GEM042");
        assert_eq!(frame.voltage, 119.8);
        assert!(frame.field_errors.is_empty());
    }

    #[test]
    fn test_decode_temperature_no_reading_sentinels() {
        // "nc" and "x" mean no sensor connected: no sample, no error
        for line in ["t_2=nc", "t_2=x"] {
            let frame = decode(line);
            assert!(frame.temperatures.is_empty(), "line {:?}", line);
            assert!(frame.field_errors.is_empty(), "line {:?}", line);
        }
    }

    #[test]
    fn test_decode_m_key_always_ignored() {
        for line in ["m=123", "m=garbage", "v=120.0&m=&wh_1=5.0"] {
            let frame = decode(line);
            assert!(frame.field_errors.is_empty(), "line {:?}", line);
        }
    }

    #[test]
    fn test_decode_malformed_pair_recorded_and_skipped() {
        let frame = decode("v=120.0&bogus&wh_1=5.0");

        assert_eq!(frame.voltage, 120.0);
        assert_eq!(frame.energy[&1].watt_hours, 5.0);
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Structure("bogus".to_string())]
        );
    }

    #[test]
    fn test_decode_double_equals_is_structure_error() {
        let frame = decode("wh_1=5.0=extra");
        assert!(frame.energy.is_empty());
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Structure("wh_1=5.0=extra".to_string())]
        );
    }

    #[test]
    fn test_decode_bad_voltage_keeps_default() {
        let frame = decode("v=notanumber&n=ABC");
        assert_eq!(frame.voltage, 0.0);
        assert_eq!(frame.serial, "ABC");
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Parse("v=notanumber".to_string())]
        );
    }

    #[test]
    fn test_decode_channel_key_shape_errors() {
        // No underscore split into exactly two parts
        let frame = decode("wh=5.0");
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Structure("wh=5.0".to_string())]
        );

        let frame = decode("wh_1_2=5.0");
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Structure("wh_1_2=5.0".to_string())]
        );
    }

    #[test]
    fn test_decode_bad_channel_id_is_parse_error() {
        let frame = decode("wh_abc=5.0");
        assert!(frame.energy.is_empty());
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Parse("wh_abc=5.0".to_string())]
        );
    }

    #[test]
    fn test_decode_bad_channel_value_skips_field_only() {
        let frame = decode("wh_1=abc&p_1=50.0");

        // The unparseable watt-hours field is skipped, the watts field for
        // the same channel still lands
        assert_eq!(frame.energy[&1].watt_hours, 0.0);
        assert_eq!(frame.energy[&1].watts, 50.0);
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Parse("wh_1=abc".to_string())]
        );
    }

    #[test]
    fn test_decode_unknown_channel_type_ignored() {
        let frame = decode("z_1=42");
        assert!(frame.energy.is_empty());
        assert!(frame.pulses.is_empty());
        assert!(frame.temperatures.is_empty());
        assert!(frame.field_errors.is_empty());
    }

    #[test]
    fn test_decode_later_field_overwrites_earlier() {
        let frame = decode("p_1=50.0&p_1=60.0&t_2=70.0&t_2=71.5");
        assert_eq!(frame.energy[&1].watts, 60.0);
        assert_eq!(frame.temperatures[&2].temperature, 71.5);
    }

    #[test]
    fn test_decode_energy_fields_merge_per_channel() {
        let frame = decode("wh_5=100.0&a_5=1.5");
        assert_eq!(frame.energy.len(), 1);
        assert_eq!(frame.energy[&5].watt_hours, 100.0);
        assert_eq!(frame.energy[&5].watts, 0.0);
        assert_eq!(frame.energy[&5].amps, 1.5);
    }

    #[test]
    fn test_decode_negative_channel_id_accepted() {
        // Channel ids parse as signed integers, matching the wire grammar
        let frame = decode("c_-1=3");
        assert_eq!(frame.pulses[&-1].pulses, 3);
    }

    #[test]
    fn test_decode_is_total_on_noise() {
        // Arbitrary junk never panics and always yields a frame
        for line in ["", "&&&", "=", "===", "&=&=&", "\u{0}\u{1}", "v=", "_=_"] {
            let frame = decode(line);
            assert!(frame.energy.is_empty(), "line {:?}", line);
        }
    }

    #[test]
    fn test_decode_empty_line_records_structure_error() {
        let frame = decode("");
        assert_eq!(
            frame.field_errors,
            vec![FieldError::Structure(String::new())]
        );
    }
}
