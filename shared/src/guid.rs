//! SDL GUID construction and decoding.
//!
//! An SDL GUID is 16 bytes rendered as 32 lowercase hex characters:
//! bytes 0..1 are the bus type (little-endian), 4..5 the USB vendor id,
//! 8..9 the product id, and 12..13 the version on platforms that report
//! one. Backends without hardware ids fall back to hashing the device
//! name into the vendor/product/version region, exactly as SDL does, so
//! community mapping lines still match.

/// Builds a GUID from USB-style hardware ids.
pub fn guid_from_usb_ids(bus: u16, vendor: u16, product: u16, version: u16) -> String {
    format!(
        "{:02x}{:02x}0000{:02x}{:02x}0000{:02x}{:02x}0000{:02x}{:02x}0000",
        bus as u8,
        (bus >> 8) as u8,
        vendor as u8,
        (vendor >> 8) as u8,
        product as u8,
        (product >> 8) as u8,
        version as u8,
        (version >> 8) as u8,
    )
}

/// Builds a GUID from the bus type and the first 12 bytes of the device
/// name, for devices that report no usable vendor/product ids.
pub fn guid_from_name(bus: u16, name: &str) -> String {
    let mut bytes = [0u8; 12];
    for (dst, src) in bytes.iter_mut().zip(name.bytes()) {
        *dst = src;
    }
    let mut guid = format!("{:02x}{:02x}0000", bus as u8, (bus >> 8) as u8);
    for b in bytes {
        guid.push_str(&format!("{b:02x}"));
    }
    guid
}

/// Decodes the button/axis capability masks from the last four bytes of a
/// GUID (bytes 12..13 and 14..15, little-endian). Returns `None` unless
/// the input is exactly 32 hex characters.
pub fn decode_guid_masks(guid: &str) -> Option<(u16, u16)> {
    if guid.len() != 32 {
        return None;
    }
    let byte_at = |i: usize| u8::from_str_radix(guid.get(i * 2..i * 2 + 2)?, 16).ok();
    let button_mask = u16::from(byte_at(12)?) | u16::from(byte_at(13)?) << 8;
    let axis_mask = u16::from(byte_at(14)?) | u16::from(byte_at(15)?) << 8;
    Some((button_mask, axis_mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_guid_layout() {
        // Bus 0x0003 (USB), Sony DualShock 4.
        let guid = guid_from_usb_ids(0x0003, 0x054c, 0x09cc, 0x8111);
        assert_eq!(guid, "030000004c050000cc09000011810000");
        assert_eq!(guid.len(), 32);
    }

    #[test]
    fn test_name_guid_pads_short_names() {
        let guid = guid_from_name(0x0003, "pad");
        assert_eq!(guid.len(), 32);
        assert!(guid.starts_with("03000000"));
        // 'p' 'a' 'd' then zero padding.
        assert_eq!(&guid[8..16], "70616400");
    }

    #[test]
    fn test_decode_masks() {
        let guid = "050000004c050000cc0900000f000300";
        assert_eq!(decode_guid_masks(guid), Some((0x000f, 0x0003)));
        assert_eq!(decode_guid_masks("tooshort"), None);
    }

    #[test]
    fn test_decode_masks_rejects_non_hex() {
        assert_eq!(decode_guid_masks("zz000000000000000000000000000000"), None);
    }
}
