use std::num::ParseIntError;

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

pub(crate) fn u16_from_hex(value: &str) -> Result<u16, ParseIntError> {
    u16::from_str_radix(strip_hex_prefix(value), 16)
}

/// A byte written in hexadecimal, with or without the 0x prefix.
pub(crate) fn u8_from_hex(value: &str) -> Result<u8, ParseIntError> {
    u8::from_str_radix(strip_hex_prefix(value), 16)
}

/// A 7-bit I2C address in hexadecimal.
pub(crate) fn i2c_address(value: &str) -> Result<u8, String> {
    let address = u8_from_hex(value).map_err(|e| e.to_string())?;
    if address > 0x7F {
        return Err(format!("{address:#04x} is not a 7-bit address"));
    }
    Ok(address)
}

/// Format bytes as space-separated hex.
pub(crate) fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_prefix_is_optional() {
        assert_eq!(u16_from_hex("0x4D8"), Ok(0x4D8));
        assert_eq!(u16_from_hex("dd"), Ok(0xDD));
        assert_eq!(u8_from_hex("0XfF"), Ok(0xFF));
    }

    #[test]
    fn addresses_are_seven_bits() {
        assert_eq!(i2c_address("0x50"), Ok(0x50));
        assert!(i2c_address("80").is_err());
    }

    #[test]
    fn bytes_are_formatted_upper_case() {
        assert_eq!(hex_bytes(&[0x0A, 0xFF, 0x00]), "0A FF 00");
    }
}
