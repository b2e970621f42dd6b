//! Simulator time units expressed in femtoseconds.

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = FS_PER_MS * 1_000;

/// Parses a time unit such as `"1ns"`, `"10 ps"` or `"100fs"` into femtoseconds.
///
/// A missing magnitude means 1 and a bare number means femtoseconds.
pub fn parse_time_unit(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty time unit".to_string());
    }

    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num_str, unit_str) = s.split_at(digit_end);

    let num: u64 = if num_str.is_empty() {
        1
    } else {
        num_str
            .parse()
            .map_err(|_| format!("invalid time magnitude: {num_str}"))?
    };

    let fs_per = match unit_str.trim().to_ascii_lowercase().as_str() {
        "fs" | "" => 1,
        "ps" => FS_PER_PS,
        "ns" => FS_PER_NS,
        "us" => FS_PER_US,
        "ms" => FS_PER_MS,
        "s" => FS_PER_S,
        other => return Err(format!("unknown time unit: {other}")),
    };

    num.checked_mul(fs_per)
        .filter(|fs| *fs > 0)
        .ok_or_else(|| format!("time unit out of range: {s}"))
}
