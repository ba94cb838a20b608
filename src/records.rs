use serde::Deserialize;
use std::{fs, io::ErrorKind, path::Path};
use tracing::{debug, info};

use crate::error::{Result, SalesError};

/// Number of `|`-separated fields in a sales line.
pub const FIELD_COUNT: usize = 8;

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub transaction_id: String,
    pub date: String,
    pub product_id: String,
    #[serde(deserialize_with = "strip_commas")]
    pub product_name: String,
    #[serde(deserialize_with = "strip_commas_and_parse_i64")]
    pub quantity: i64,
    #[serde(deserialize_with = "strip_commas_and_parse_f64")]
    pub unit_price: f64,
    pub customer_id: String,
    pub region: String,
}

impl Transaction {
    /// Line amount, always derived from the current quantity and unit price.
    pub fn amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl Encoding {
    pub const FALLBACK_ORDER: [Encoding; 3] =
        [Encoding::Utf8, Encoding::Latin1, Encoding::Windows1252];

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Windows1252 => "cp1252",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Windows1252 => bytes.iter().map(|&b| windows_1252_char(b)).collect(),
        }
    }
}

// 0x80..=0x9F differ from Latin-1; five of those bytes are unassigned.
// Latin-1 decodes any byte sequence, so this entry is only reached when the
// fallback order changes.
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

fn windows_1252_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => WINDOWS_1252_HIGH[(byte - 0x80) as usize],
        _ => Some(byte as char),
    }
}

/// Reads the sales file, trying each encoding in [`Encoding::FALLBACK_ORDER`]
/// until one decodes. `\r\n`, `\n` and a bare `\r` all end a line. The header
/// line and blank lines are dropped and every remaining line is trimmed.
pub fn read_sales_data<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SalesError::NotFound(path.to_path_buf()),
        _ => SalesError::Io(e),
    })?;

    for encoding in Encoding::FALLBACK_ORDER {
        let Some(text) = encoding.decode(&bytes) else {
            debug!(encoding = encoding.name(), "decode failed, trying next encoding");
            continue;
        };

        info!(path = %path.display(), encoding = encoding.name(), "read sales file");
        return Ok(text
            .replace("\r\n", "\n")
            .split(['\r', '\n'])
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect());
    }

    Err(SalesError::DecodeFailure(path.to_path_buf()))
}

/// Parses raw lines into transactions. Lines without exactly
/// [`FIELD_COUNT`] fields, or whose numbers do not parse, are dropped.
pub fn parse_transactions<S: AsRef<str>>(raw_lines: &[S]) -> Vec<Transaction> {
    let mut transactions = Vec::with_capacity(raw_lines.len());

    for line in raw_lines {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_reader(line.as_ref().as_bytes());

        let mut record = csv::StringRecord::new();
        match rdr.read_record(&mut record) {
            Ok(true) if record.len() == FIELD_COUNT => {}
            _ => continue,
        }

        if let Ok(transaction) = record.deserialize::<Transaction>(None) {
            transactions.push(transaction);
        }
    }

    debug!(
        parsed = transactions.len(),
        dropped = raw_lines.len() - transactions.len(),
        "parsed sales lines"
    );
    transactions
}

fn strip_commas<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    Ok(s.replace(',', ""))
}

fn strip_commas_and_parse_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    s.replace(',', "")
        .trim()
        .parse::<i64>()
        .map_err(serde::de::Error::custom)
}

fn strip_commas_and_parse_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    s.replace(',', "")
        .trim()
        .parse::<f64>()
        .map_err(serde::de::Error::custom)
}
