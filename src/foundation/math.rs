use crate::foundation::error::{CutPasteError, CutPasteResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(state: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(state, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Seed of one image job: FNV-1a over the run seed, the split name and the job index.
///
/// Stable across platforms and independent of scheduling order.
pub(crate) fn derive_seed(base: u64, split: &str, job_index: u64) -> u64 {
    [&base.to_le_bytes()[..], split.as_bytes(), &job_index.to_le_bytes()[..]]
        .into_iter()
        .fold(FNV_OFFSET, fnv1a)
}

/// `src * a + dst * (255 - a)`, divided by 255 with rounding.
pub(crate) fn lerp_u8(dst: u8, src: u8, a: u8) -> u8 {
    let a = u32::from(a);
    let sum = u32::from(src) * a + u32::from(dst) * (255 - a);
    ((sum + 127) / 255).min(255) as u8
}

/// Byte length of a `width * height * channels` buffer, with overflow checking.
pub(crate) fn buffer_len(width: u32, height: u32, channels: usize) -> CutPasteResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| CutPasteError::validation("image buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
