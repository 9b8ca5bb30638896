//! Base64 variant used inside native bcrypt strings.
//!
//! Bcrypt uses its own alphabet (`./A-Za-z0-9`) and never emits padding characters: a
//! trailing partial group is filled with zero bits. Decoding is lenient on purpose, it
//! stops at the first symbol outside the alphabet or once the requested number of bytes
//! has been produced, the same way the reference implementation truncates. Bcrypt fields
//! have a fixed length by construction, so callers always pass the expected length and
//! check the number of bytes they got back.

const ALPHABET: &[u8; 64] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Marks bytes outside the alphabet in [`INDEX`].
const INVALID: u8 = 0xff;

const INDEX: [u8; 128] = {
    let mut index = [INVALID; 128];
    let mut i: u8 = 0;
    while i < 64 {
        index[ALPHABET[i as usize] as usize] = i;
        i += 1;
    }
    index
};

fn symbol(value: u8) -> char {
    char::from(ALPHABET[usize::from(value & 0x3f)])
}

fn value(symbol: Option<&u8>) -> Option<u8> {
    let symbol = *symbol?;

    INDEX
        .get(usize::from(symbol))
        .copied()
        .filter(|&v| v != INVALID)
}

#[must_use]
pub fn encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        match *chunk {
            [a] => {
                output.push(symbol(a >> 2));
                output.push(symbol((a & 0x03) << 4));
            }
            [a, b] => {
                output.push(symbol(a >> 2));
                output.push(symbol(((a & 0x03) << 4) | (b >> 4)));
                output.push(symbol((b & 0x0f) << 2));
            }
            [a, b, c] => {
                output.push(symbol(a >> 2));
                output.push(symbol(((a & 0x03) << 4) | (b >> 4)));
                output.push(symbol(((b & 0x0f) << 2) | (c >> 6)));
                output.push(symbol(c));
            }
            _ => unreachable!("chunks(3) yields between one and three bytes"),
        }
    }

    output
}

/// Decodes at most `length` bytes from `input`.
///
/// The result may be shorter than `length` when `input` ends early or holds a symbol
/// outside the alphabet.
#[must_use]
pub fn decode(input: &str, length: usize) -> Vec<u8> {
    let input = input.as_bytes();
    let mut output = Vec::with_capacity(length);

    for group in input.chunks(4) {
        if output.len() >= length {
            break;
        }

        let (Some(c1), Some(c2)) = (value(group.first()), value(group.get(1))) else {
            break;
        };

        output.push((c1 << 2) | ((c2 & 0x30) >> 4));
        if output.len() >= length {
            break;
        }

        let Some(c3) = value(group.get(2)) else {
            break;
        };

        output.push(((c2 & 0x0f) << 4) | ((c3 & 0x3c) >> 2));
        if output.len() >= length {
            break;
        }

        let Some(c4) = value(group.get(3)) else {
            break;
        };

        output.push(((c3 & 0x03) << 6) | c4);
    }

    output
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alphabet_starts_with_dot_and_slash() {
        assert_eq!(encode(&[0x00, 0x00, 0x00]), "....");
        assert_eq!(encode(&[0xff, 0xff, 0xff]), "9999");
        assert_eq!(encode(&[0x04, 0x10, 0x41]), "////");
    }

    #[test]
    fn partial_groups_are_zero_filled_without_padding() {
        assert_eq!(encode(&[0xff]), "9u");
        assert_eq!(encode(&[0xff, 0xff]), "996");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn decode_inverts_encode_for_bcrypt_lengths() {
        for length in 1..=72 {
            let input = (0..length)
                .map(|i| u8::try_from((i * 37 + 11) % 256).unwrap_or_default())
                .collect::<Vec<_>>();

            let encoded = encode(&input);

            assert_eq!(decode(&encoded, length), input, "length {length}");
        }
    }

    #[test]
    fn decode_stops_at_requested_length() {
        let encoded = encode(&[1, 2, 3, 4, 5, 6]);

        assert_eq!(decode(&encoded, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn decode_stops_at_invalid_symbol() {
        let mut encoded = encode(&[1, 2, 3, 4, 5, 6]);
        encoded.replace_range(4..5, "$");

        assert_eq!(decode(&encoded, 6), vec![1, 2, 3]);
    }

    #[test]
    fn decode_stops_at_truncated_input() {
        let encoded = encode(&[1, 2, 3, 4, 5, 6]);

        assert_eq!(decode(&encoded[..5], 6), vec![1, 2, 3]);
        assert_eq!(decode(&encoded[..6], 6), vec![1, 2, 3, 4]);
        assert!(decode("", 16).is_empty());
    }

    #[test]
    fn decode_ignores_non_ascii() {
        assert!(decode("é...", 3).is_empty());
    }
}
