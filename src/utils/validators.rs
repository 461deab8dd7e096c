//! Input validation for timer and profile settings

/// Longest accepted timer label
pub const MAX_LABEL_LEN: usize = 30;
/// Longest accepted timer duration (24 hours)
pub const MAX_DURATION_SECS: u32 = 86_400;
/// Longest accepted profile name
pub const MAX_PROFILE_NAME_LEN: usize = 50;

const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];
const MODIFIERS: &[&str] = &["ctrl", "shift", "alt", "win", "cmd"];

pub fn validate_timer_label(label: &str) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("Timer label cannot be empty".to_string());
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(format!("Timer label too long (max {} characters)", MAX_LABEL_LEN));
    }
    Ok(())
}

pub fn validate_duration(duration: u64) -> Result<u32, String> {
    if duration == 0 {
        return Err("Duration must be positive".to_string());
    }
    if duration > u64::from(MAX_DURATION_SECS) {
        return Err("Duration too long (max 24 hours)".to_string());
    }
    Ok(duration as u32)
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS` into a positive number of seconds
pub fn parse_duration(input: &str) -> Option<u64> {
    let parts: Vec<u64> = input
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect::<Option<_>>()?;

    let total = match parts.as_slice() {
        [secs] => *secs,
        [mins, secs] => mins.checked_mul(60)?.checked_add(*secs)?,
        [hours, mins, secs] => hours
            .checked_mul(3600)?
            .checked_add(mins.checked_mul(60)?)?
            .checked_add(*secs)?,
        _ => return None,
    };

    (total > 0).then_some(total)
}

/// Check a hotkey string such as `ctrl+shift+1`. An empty string means no
/// hotkey and is accepted. Returns an optional warning for bare single keys.
pub fn validate_hotkey(hotkey: &str) -> Result<Option<String>, String> {
    if hotkey.trim().is_empty() {
        return Ok(None);
    }

    let parts: Vec<String> = hotkey.split('+').map(|p| p.trim().to_lowercase()).collect();
    let (modifiers, keys): (Vec<&String>, Vec<&String>) =
        parts.iter().partition(|p| MODIFIERS.contains(&p.as_str()));

    match keys.as_slice() {
        [] => Err("Hotkey must include at least one regular key".to_string()),
        [key] if key.is_empty() => Err("Invalid hotkey format".to_string()),
        [key] if modifiers.is_empty() && key.chars().count() == 1 => Ok(Some(format!(
            "'{}' has no modifier and may clash with normal typing",
            hotkey
        ))),
        [_] => Ok(None),
        _ => Err("Hotkey can only have one regular key".to_string()),
    }
}

pub fn validate_profile_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Profile name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_PROFILE_NAME_LEN {
        return Err(format!(
            "Profile name too long (max {} characters)",
            MAX_PROFILE_NAME_LEN
        ));
    }
    if name.contains(UNSAFE_FILENAME_CHARS) {
        return Err("Profile name contains invalid characters".to_string());
    }
    if RESERVED_NAMES.contains(&name.to_uppercase().as_str()) {
        return Err(format!("'{}' is a reserved name", name));
    }
    Ok(())
}

/// Replace filesystem-unsafe characters and trim stray dots and spaces
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
