use std::io;

use shared::error::{Error, Result};

pub(crate) const END_LINE: &str = "\r\n";

/// One `<type>=<value>` line of a description.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) key: u8,
    pub(crate) value: String,
}

/// Reads the next non-empty line. Both CRLF and bare LF terminate a line.
pub(crate) fn read_line<R: io::BufRead>(reader: &mut R) -> Result<Option<Line>> {
    loop {
        let mut raw = String::new();
        if reader.read_line(&mut raw)? == 0 {
            return Ok(None);
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        let bytes = line.as_bytes();
        if bytes.len() < 2 || bytes[1] != b'=' || !bytes[0].is_ascii_lowercase() {
            return Err(Error::SdpInvalidSyntax(line.to_owned()));
        }

        return Ok(Some(Line {
            key: bytes[0],
            value: line[2..].to_owned(),
        }));
    }
}

pub(crate) fn index_of(element: &str, data: &[&str]) -> i32 {
    for (k, &v) in data.iter().enumerate() {
        if element == v {
            return k as i32;
        }
    }
    -1
}

/// Splits `value` on whitespace and requires exactly `n` fields.
pub(crate) fn fields(value: &str, n: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() != n {
        return Err(Error::SdpInvalidSyntax(value.to_owned()));
    }
    Ok(fields)
}

/// Parses `<d>[dhms]` time shorthand of repeat times and time zones into seconds.
pub(crate) fn parse_time_units(value: &str) -> Result<i64> {
    let value = value.as_bytes();
    let (num, factor) = match value.last() {
        Some(b'd') => (&value[..value.len() - 1], 86400),
        Some(b'h') => (&value[..value.len() - 1], 3600),
        Some(b'm') => (&value[..value.len() - 1], 60),
        Some(b's') => (&value[..value.len() - 1], 1),
        _ => (value, 1),
    };

    let num = std::str::from_utf8(num).map_err(|err| Error::Other(err.to_string()))?;
    match num.parse::<i64>() {
        Ok(num) => num
            .checked_mul(factor)
            .ok_or_else(|| Error::SdpInvalidValue(num.to_string())),
        Err(_) => Err(Error::SdpInvalidValue(num.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_line() -> Result<()> {
        let mut reader = Cursor::new("v=0\r\n\r\ns=-\nt=0 0");
        let mut keys = vec![];
        while let Some(line) = read_line(&mut reader)? {
            keys.push((line.key, line.value));
        }
        assert_eq!(
            keys,
            vec![
                (b'v', "0".to_owned()),
                (b's', "-".to_owned()),
                (b't', "0 0".to_owned())
            ]
        );

        for bad in ["v:0", "V=0", "=0", "x"] {
            let mut reader = Cursor::new(bad);
            assert_eq!(
                read_line(&mut reader),
                Err(Error::SdpInvalidSyntax(bad.to_owned())),
                "{bad}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_parse_time_units() -> Result<()> {
        let tests = vec![
            ("1d", 86400),
            ("2h", 7200),
            ("3m", 180),
            ("4s", 4),
            ("-1h", -3600),
            ("604800", 604800),
        ];
        for (input, expected) in tests {
            assert_eq!(parse_time_units(input)?, expected, "{input}");
        }
        assert!(parse_time_units("1w").is_err());
        assert!(parse_time_units("").is_err());
        Ok(())
    }
}
