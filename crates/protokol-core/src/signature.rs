//! Signature capture: four independent ink slots per entry.
//!
//! Each slot (transfer/return × client/staff) is captured on its own
//! fixed-size raster surface. A pad is blank until the first stroke;
//! committing a blank pad yields nothing, so persisting a leg only ever
//! writes the slots that were actually drawn on.
//!
//! Payloads travel as `data:` URLs. Pads serialize their monochrome
//! raster as a portable bitmap; imported signature files must be PNG or
//! JPEG, validated the same way the legacy backend validated uploads.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Raster width of a signature pad, in pixels.
pub const PAD_WIDTH: usize = 400;
/// Raster height of a signature pad, in pixels.
pub const PAD_HEIGHT: usize = 120;

/// The two halves of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Transfer,
    #[serde(rename = "return")]
    Return,
}

impl Leg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Return => "return",
        }
    }
}

impl std::str::FromStr for Leg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(Self::Transfer),
            "return" => Ok(Self::Return),
            other => Err(format!("unknown leg {other:?} (use transfer or return)")),
        }
    }
}

/// Who holds the pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureParty {
    Client,
    Staff,
}

impl SignatureParty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Staff => "staff",
        }
    }
}

impl std::str::FromStr for SignatureParty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "staff" => Ok(Self::Staff),
            other => Err(format!("unknown party {other:?} (use client or staff)")),
        }
    }
}

/// One of the four signature slots of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureSlot {
    pub leg: Leg,
    pub party: SignatureParty,
}

impl SignatureSlot {
    pub const ALL: [SignatureSlot; 4] = [
        SignatureSlot {
            leg: Leg::Transfer,
            party: SignatureParty::Client,
        },
        SignatureSlot {
            leg: Leg::Transfer,
            party: SignatureParty::Staff,
        },
        SignatureSlot {
            leg: Leg::Return,
            party: SignatureParty::Client,
        },
        SignatureSlot {
            leg: Leg::Return,
            party: SignatureParty::Staff,
        },
    ];

    pub fn new(leg: Leg, party: SignatureParty) -> Self {
        Self { leg, party }
    }
}

/// A validated signature image payload (a `data:` URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureImage(String);

impl SignatureImage {
    /// Accept a payload, verifying the data URL envelope and base64 body.
    ///
    /// Allowed media types: `image/png`, `image/jpeg` (imported files)
    /// and `image/x-portable-bitmap` (pad rasters).
    pub fn from_data_url(payload: &str) -> Result<Self> {
        let rest = payload
            .strip_prefix("data:image/")
            .ok_or_else(|| ProtocolError::InvalidInput("Invalid image dataURL".to_string()))?;
        let (media, body) = rest
            .split_once(";base64,")
            .ok_or_else(|| ProtocolError::InvalidInput("Invalid image dataURL".to_string()))?;
        if !matches!(media, "png" | "jpeg" | "x-portable-bitmap") {
            return Err(ProtocolError::InvalidInput(format!(
                "Unsupported signature image type: image/{media}"
            )));
        }
        STANDARD
            .decode(body)
            .map_err(|_| ProtocolError::InvalidInput("Invalid image dataURL".to_string()))?;
        Ok(Self(payload.to_string()))
    }

    /// Wrap raw PNG bytes read from a file.
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    /// Wrap raw JPEG bytes read from a file.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A freehand-ink raster surface for one signature slot.
///
/// The surface starts blank (opaque background); the first stroke marks
/// it non-empty. `commit` serializes the raster, `clear` resets it.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    pixels: Vec<bool>,
    empty: bool,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new()
    }
}

impl SignaturePad {
    pub fn new() -> Self {
        Self {
            pixels: vec![false; PAD_WIDTH * PAD_HEIGHT],
            empty: true,
        }
    }

    /// True until the first stroke of the current editing session.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Draw a polyline through `points` (pad coordinates). Points
    /// outside the surface are clamped to its edge.
    pub fn stroke(&mut self, points: &[(u32, u32)]) {
        if points.is_empty() {
            return;
        }
        self.empty = false;
        let clamp = |(x, y): (u32, u32)| {
            (
                (x as usize).min(PAD_WIDTH - 1),
                (y as usize).min(PAD_HEIGHT - 1),
            )
        };
        let mut prev = clamp(points[0]);
        self.set_pixel(prev.0, prev.1);
        for &point in &points[1..] {
            let next = clamp(point);
            self.line(prev, next);
            prev = next;
        }
    }

    /// Reset to a blank surface and mark the pad empty again.
    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = false);
        self.empty = true;
    }

    /// Serialize the raster, or `None` when nothing was drawn.
    pub fn commit(&self) -> Option<SignatureImage> {
        if self.empty {
            return None;
        }
        // P4: magic, dimensions, then rows packed MSB-first.
        let mut bytes = format!("P4\n{PAD_WIDTH} {PAD_HEIGHT}\n").into_bytes();
        for row in 0..PAD_HEIGHT {
            let mut byte = 0u8;
            for col in 0..PAD_WIDTH {
                if self.pixels[row * PAD_WIDTH + col] {
                    byte |= 0x80 >> (col % 8);
                }
                if col % 8 == 7 {
                    bytes.push(byte);
                    byte = 0;
                }
            }
            if PAD_WIDTH % 8 != 0 {
                bytes.push(byte);
            }
        }
        Some(SignatureImage(format!(
            "data:image/x-portable-bitmap;base64,{}",
            STANDARD.encode(&bytes)
        )))
    }

    fn set_pixel(&mut self, x: usize, y: usize) {
        self.pixels[y * PAD_WIDTH + x] = true;
    }

    fn line(&mut self, from: (usize, usize), to: (usize, usize)) {
        // Bresenham over the clamped segment.
        let (mut x0, mut y0) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x0 as usize, y0 as usize);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

/// The four pads of one signing session, keyed by slot.
///
/// Mirrors the signature dialog: the operator may ink any subset of the
/// four slots, and only the non-empty ones are committed per leg.
#[derive(Debug, Default)]
pub struct SignatureSession {
    pads: HashMap<SignatureSlot, SignaturePad>,
}

impl SignatureSession {
    pub fn new() -> Self {
        let mut pads = HashMap::new();
        for slot in SignatureSlot::ALL {
            pads.insert(slot, SignaturePad::new());
        }
        Self { pads }
    }

    pub fn pad_mut(&mut self, slot: SignatureSlot) -> &mut SignaturePad {
        self.pads.entry(slot).or_insert_with(SignaturePad::new)
    }

    pub fn is_empty(&self, slot: SignatureSlot) -> bool {
        self.pads.get(&slot).map(|p| p.is_empty()).unwrap_or(true)
    }

    pub fn commit(&self, slot: SignatureSlot) -> Option<SignatureImage> {
        self.pads.get(&slot).and_then(|p| p.commit())
    }

    pub fn clear(&mut self, slot: SignatureSlot) {
        if let Some(pad) = self.pads.get_mut(&slot) {
            pad.clear();
        }
    }

    /// Committed images for one leg: `(client, staff)`, omitted slots
    /// stay `None` so a persist never touches them.
    pub fn leg_images(&self, leg: Leg) -> (Option<SignatureImage>, Option<SignatureImage>) {
        (
            self.commit(SignatureSlot::new(leg, SignatureParty::Client)),
            self.commit(SignatureSlot::new(leg, SignatureParty::Staff)),
        )
    }

    /// True when no slot has been drawn on at all.
    pub fn all_empty(&self) -> bool {
        SignatureSlot::ALL.iter().all(|slot| self.is_empty(*slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_starts_empty_and_commit_returns_none() {
        let pad = SignaturePad::new();
        assert!(pad.is_empty());
        assert!(pad.commit().is_none());
    }

    #[test]
    fn test_first_stroke_marks_non_empty() {
        let mut pad = SignaturePad::new();
        pad.stroke(&[(10, 10), (50, 40), (120, 30)]);
        assert!(!pad.is_empty());
        let image = pad.commit().expect("committed image");
        assert!(image
            .as_str()
            .starts_with("data:image/x-portable-bitmap;base64,"));
        // Round-trips through the payload validator
        SignatureImage::from_data_url(image.as_str()).expect("valid payload");
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut pad = SignaturePad::new();
        pad.stroke(&[(0, 0), (399, 119)]);
        pad.clear();
        assert!(pad.is_empty());
        assert!(pad.commit().is_none());
    }

    #[test]
    fn test_out_of_range_points_are_clamped() {
        let mut pad = SignaturePad::new();
        pad.stroke(&[(10_000, 10_000)]);
        assert!(!pad.is_empty());
        pad.commit().expect("commit succeeds");
    }

    #[test]
    fn test_session_commits_only_drawn_slots() {
        let mut session = SignatureSession::new();
        session
            .pad_mut(SignatureSlot::new(Leg::Transfer, SignatureParty::Staff))
            .stroke(&[(5, 5), (60, 60)]);

        let (client, staff) = session.leg_images(Leg::Transfer);
        assert!(client.is_none());
        assert!(staff.is_some());
        let (r_client, r_staff) = session.leg_images(Leg::Return);
        assert!(r_client.is_none() && r_staff.is_none());
        assert!(!session.all_empty());
    }

    #[test]
    fn test_data_url_validation() {
        assert!(SignatureImage::from_data_url("data:image/png;base64,aGVsbG8=").is_ok());
        assert!(SignatureImage::from_data_url("data:image/gif;base64,aGVsbG8=").is_err());
        assert!(SignatureImage::from_data_url("data:image/png;base64,!!!").is_err());
        assert!(SignatureImage::from_data_url("just-a-string").is_err());
    }

    #[test]
    fn test_png_wrapper_is_valid_payload() {
        let image = SignatureImage::from_png_bytes(b"\x89PNG fake body");
        SignatureImage::from_data_url(image.as_str()).expect("valid payload");
    }
}
