//! Strings.
//!
//! Strings start with the byte order mark of their encoding and end with a terminating NUL code
//! unit. The length field, when present, counts all of these bytes.

use crate::{
    Deployment, DeserializeError, Reader, Serialize, SerializeError, StringDeployment,
    StringEncoding, TypeDeployment, Writer,
};

/// Encodes `text` including its byte order mark and terminator.
fn encode(text: &str, encoding: StringEncoding) -> Vec<u8> {
    let mut bytes = encoding.bom().to_vec();
    match encoding {
        StringEncoding::Utf8 => {
            bytes.extend_from_slice(text.as_bytes());
            bytes.push(0);
        }
        StringEncoding::Utf16Be => {
            text.encode_utf16()
                .chain([0])
                .for_each(|unit| bytes.extend_from_slice(&unit.to_be_bytes()));
        }
        StringEncoding::Utf16Le => {
            text.encode_utf16()
                .chain([0])
                .for_each(|unit| bytes.extend_from_slice(&unit.to_le_bytes()));
        }
    }
    bytes
}

/// Decodes a string, detecting its encoding from the byte order mark.
///
/// Only the final terminator is removed, so NUL code units before it are kept.
fn decode(bytes: &[u8]) -> Result<String, DeserializeError> {
    if let Some(payload) = bytes.strip_prefix(StringEncoding::Utf8.bom()) {
        let payload = payload
            .strip_suffix(&[0])
            .ok_or(DeserializeError::InvalidEncoding("missing terminator"))?;
        String::from_utf8(payload.to_vec())
            .map_err(|_| DeserializeError::InvalidEncoding("invalid UTF-8"))
    } else if let Some(payload) = bytes.strip_prefix(StringEncoding::Utf16Be.bom()) {
        decode_utf16(payload, u16::from_be_bytes)
    } else if let Some(payload) = bytes.strip_prefix(StringEncoding::Utf16Le.bom()) {
        decode_utf16(payload, u16::from_le_bytes)
    } else {
        Err(DeserializeError::InvalidEncoding("missing byte order mark"))
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, DeserializeError> {
    if bytes.len() % 2 != 0 {
        return Err(DeserializeError::InvalidEncoding("odd number of UTF-16 bytes"));
    }
    let payload = bytes
        .strip_suffix(&[0, 0])
        .ok_or(DeserializeError::InvalidEncoding("missing terminator"))?;
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| DeserializeError::InvalidEncoding("invalid UTF-16"))
}

fn string_deployment(deployment: &Deployment) -> Option<StringDeployment> {
    match deployment {
        Deployment::Empty => Some(StringDeployment::default()),
        Deployment::String(deployment) => Some(*deployment),
        _ => None,
    }
}

/// Checks that a string without a length field fills its field with whole code units.
fn check_field_size(deployment: &StringDeployment) -> Result<(), &'static str> {
    if deployment.max_length % deployment.encoding.unit_size() == 0 {
        Ok(())
    } else {
        Err("UTF-16 string fields must have an even size")
    }
}

impl TypeDeployment for str {}

impl Serialize for str {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        let deployment =
            string_deployment(deployment).ok_or(SerializeError::UnexpectedDeployment {
                expected: "string",
                found: deployment.kind(),
            })?;
        let bytes = encode(self, deployment.encoding);
        if deployment.length_width.is_none() {
            check_field_size(&deployment).map_err(SerializeError::InvalidDeployment)?;
            if bytes.len() > deployment.max_length {
                return Err(SerializeError::TooLong {
                    found: bytes.len(),
                    max: deployment.max_length,
                });
            }
            writer.put_slice(&bytes);
            writer.put_zeros(deployment.max_length - bytes.len());
            return Ok(());
        }
        if deployment.max_length > 0 && bytes.len() > deployment.max_length {
            return Err(SerializeError::TooLong {
                found: bytes.len(),
                max: deployment.max_length,
            });
        }
        writer.put_length(bytes.len(), deployment.length_width)?;
        writer.put_slice(&bytes);
        Ok(())
    }
}

impl TypeDeployment for String {}

impl Serialize for String {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        self.as_str().serialize(writer, deployment)
    }
}

impl crate::Deserialize for String {
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        let deployment =
            string_deployment(deployment).ok_or(DeserializeError::UnexpectedDeployment {
                expected: "string",
                found: deployment.kind(),
            })?;
        let bytes = if deployment.length_width.is_none() {
            check_field_size(&deployment).map_err(DeserializeError::InvalidDeployment)?;
            reader.get_slice(deployment.max_length)?
        } else {
            let length = reader.get_length(deployment.length_width)?;
            if deployment.max_length > 0 && length > deployment.max_length {
                return Err(DeserializeError::LengthOutOfBounds {
                    found: length,
                    min: 0,
                    max: deployment.max_length,
                });
            }
            reader.get_slice(length)?
        };
        decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{decode, encode, round_trip},
        LengthWidth,
    };

    fn string(max_length: usize, length_width: u8, encoding: StringEncoding) -> Deployment {
        let length_width = LengthWidth::try_from(length_width).expect("should be a valid width");
        StringDeployment::new(max_length, length_width, encoding).into()
    }

    #[test]
    fn fixed_field_admits_exact_size() {
        let deployment = string(10, 0, StringEncoding::Utf8);
        assert_eq!(
            round_trip(&String::from("abcdef"), &deployment),
            Some(String::from("abcdef"))
        );
        assert_eq!(encode("abcdefg", &deployment), None);
    }

    #[test]
    fn fixed_field_is_padded() {
        let deployment = string(8, 0, StringEncoding::Utf8);
        let body = encode("ab", &deployment).expect("should encode the string");
        assert_eq!(body, [0xef, 0xbb, 0xbf, b'a', b'b', 0, 0, 0]);
        assert_eq!(
            decode::<String>(&body, &deployment),
            Some(String::from("ab\0\0"))
        );
    }

    #[test]
    fn utf16_field_holds_whole_code_units() {
        let deployment = string(10, 0, StringEncoding::Utf16Be);
        let body = encode("ab", &deployment).expect("should encode the string");
        assert_eq!(body, [0xfe, 0xff, 0, b'a', 0, b'b', 0, 0, 0, 0]);
        assert_eq!(
            decode::<String>(&body, &deployment),
            Some(String::from("ab\0"))
        );

        let deployment = string(9, 0, StringEncoding::Utf16Be);
        assert_eq!(encode("ab", &deployment), None);
        assert_eq!(
            decode::<String>(&[0xfe, 0xff, 0, b'a', 0, b'b', 0, 0, 0], &deployment),
            None
        );
        assert!(encode("ab", &string(9, 0, StringEncoding::Utf8)).is_some());
    }

    #[test]
    fn utf8_with_length() {
        let body = encode("abcdef€", &string(0, 1, StringEncoding::Utf8));
        assert_eq!(
            body,
            Some(vec![
                13, 0xef, 0xbb, 0xbf, b'a', b'b', b'c', b'd', b'e', b'f', 0xe2, 0x82, 0xac, 0
            ])
        );
    }

    #[test]
    fn utf16_big_endian_with_length() {
        let body = encode("abcdef€", &string(0, 1, StringEncoding::Utf16Be));
        assert_eq!(
            body,
            Some(vec![
                18, 0xfe, 0xff, 0, b'a', 0, b'b', 0, b'c', 0, b'd', 0, b'e', 0, b'f', 0x20, 0xac,
                0, 0
            ])
        );
    }

    #[test]
    fn utf16_little_endian_with_length() {
        let body = encode("abcdef€", &string(0, 1, StringEncoding::Utf16Le));
        assert_eq!(
            body,
            Some(vec![
                18, 0xff, 0xfe, b'a', 0, b'b', 0, b'c', 0, b'd', 0, b'e', 0, b'f', 0, 0xac, 0x20,
                0, 0
            ])
        );
    }

    #[test]
    fn embedded_nul_is_kept() {
        let text = String::from("abc\0def€");
        let deployment = string(0, 1, StringEncoding::Utf8);
        assert_eq!(encode(&text, &deployment).map(|body| body[0]), Some(14));
        assert_eq!(round_trip(&text, &deployment), Some(text.clone()));

        let deployment = string(0, 2, StringEncoding::Utf16Le);
        assert_eq!(round_trip(&text, &deployment), Some(text));
    }

    #[test]
    fn length_beyond_maximum_is_rejected() {
        let deployment = string(8, 1, StringEncoding::Utf8);
        assert_eq!(encode("abcd", &deployment).map(|body| body.len()), Some(9));
        assert_eq!(encode("abcde", &deployment), None);
        assert_eq!(
            decode::<String>(&[9, 0xef, 0xbb, 0xbf, b'a', b'b', b'c', b'd', b'e', 0], &deployment),
            None
        );
    }

    #[test]
    fn length_beyond_width_is_rejected() {
        let text = "a".repeat(251);
        let deployment = string(0, 1, StringEncoding::Utf8);
        assert!(encode(text.as_str(), &deployment).is_some());
        assert_eq!(encode(format!("{text}b").as_str(), &deployment), None);
    }

    #[test]
    fn empty_deployment_uses_utf8_and_four_byte_length() {
        assert_eq!(
            encode("1", &Deployment::Empty),
            Some(vec![0, 0, 0, 5, 0xef, 0xbb, 0xbf, b'1', 0])
        );
    }

    #[test]
    fn malformed_strings_are_rejected() {
        let deployment = string(0, 1, StringEncoding::Utf8);
        assert_eq!(decode::<String>(&[2, b'a', 0], &deployment), None);
        assert_eq!(decode::<String>(&[4, 0xef, 0xbb, 0xbf, b'a'], &deployment), None);
        assert_eq!(decode::<String>(&[5, 0xef, 0xbb, 0xbf, 0xff, 0], &deployment), None);
        assert_eq!(decode::<String>(&[5, 0xfe, 0xff, 0, 0], &deployment), None);
        assert_eq!(decode::<String>(&[9, 0xef, 0xbb, 0xbf, 0], &deployment), None);
    }
}
