/// Shorten `s` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Show only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(8))
}

/// Human-readable byte size: 512 B, 1.5 KB, 2.0 MB
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

pub fn progress_line(current: usize, total: usize, percent: u32) -> String {
    const WIDTH: usize = 20;
    let filled = (percent.min(100) as usize * WIDTH) / 100;
    format!(
        "[{}{}] {current}/{total} ({percent}%)",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("鋒兄資訊管理系統", 4), "鋒兄資…");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("standard_abcdef1234"), "********1234");
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(progress_line(0, 4, 0), "[--------------------] 0/4 (0%)");
        assert_eq!(progress_line(2, 4, 50), "[##########----------] 2/4 (50%)");
        assert_eq!(progress_line(4, 4, 100), "[####################] 4/4 (100%)");
    }
}
