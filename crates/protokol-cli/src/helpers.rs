//! Parsing helpers shared by the command handlers.

use std::path::Path;

use chrono::NaiveDate;

use protokol_core::calendar::{month_key_of, normalize_month, parse_date};
use protokol_core::model::{QueueKind, ServiceType, ToolLine};
use protokol_core::signature::{Leg, SignatureImage, SignatureParty};

pub fn parse_date_arg(value: &str) -> anyhow::Result<NaiveDate> {
    parse_date(value).map_err(|e| anyhow::anyhow!("{}", e))
}

pub fn parse_month_arg(value: &str) -> anyhow::Result<String> {
    normalize_month(value).map_err(|e| anyhow::anyhow!("{}", e))
}

pub fn parse_queue_type(value: &str) -> anyhow::Result<QueueKind> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_leg(value: &str) -> anyhow::Result<Leg> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_party(value: &str) -> anyhow::Result<SignatureParty> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_service(value: &str) -> anyhow::Result<ServiceType> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Parse `NAME=COUNT` tool positions from the command line.
pub fn parse_tool_pairs(pairs: &[String]) -> anyhow::Result<Vec<ToolLine>> {
    let mut tools = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (name, count) = pair
            .rsplit_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid tool {:?} (use NAME=COUNT)", pair))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow::anyhow!("Invalid tool {:?}: empty name", pair));
        }
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid tool count in {:?}", pair))?;
        tools.push(ToolLine::new(name, count));
    }
    Ok(tools)
}

/// Require `date` to fall inside `month`.
pub fn ensure_date_in_month(date: NaiveDate, month: &str) -> anyhow::Result<()> {
    let key = month_key_of(date);
    if key != month {
        return Err(anyhow::anyhow!(
            "Date {} belongs to {}, not {}",
            date.format("%Y-%m-%d"),
            key,
            month
        ));
    }
    Ok(())
}

/// Read a PNG or JPEG signature file into a validated payload. The
/// format is sniffed from the file's magic bytes.
pub fn read_signature_image(path: &str) -> anyhow::Result<SignatureImage> {
    let bytes = std::fs::read(Path::new(path))
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Ok(SignatureImage::from_png_bytes(&bytes))
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Ok(SignatureImage::from_jpeg_bytes(&bytes))
    } else {
        Err(anyhow::anyhow!(
            "{} is not a PNG or JPEG image",
            path
        ))
    }
}

/// Stable client slug from a display name: lowercased, Polish
/// diacritics folded, everything else collapsed to dashes.
pub fn slug_from_name(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            other => other,
        })
        .collect();
    let mut slug = String::with_capacity(folded.len());
    let mut last_dash = true;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}
