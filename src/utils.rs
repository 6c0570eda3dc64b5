use std::{
    env,
    path::{Path, PathBuf},
};

use rand::{Rng, distr::Alphanumeric};

const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a base62 Spotify ID.
pub const BASE62_ID_LEN: usize = 22;

/// Converts a 22-character base62 ID into its 32-character hex GID.
///
/// Returns `None` if the ID contains characters outside the base62 alphabet
/// or encodes a value wider than 128 bits.
pub fn base62_to_hex(id: &str) -> Option<String> {
    let mut value: u128 = 0;
    for c in id.bytes() {
        let digit = BASE62_ALPHABET.iter().position(|&a| a == c)? as u128;
        value = value.checked_mul(62)?.checked_add(digit)?;
    }
    Some(format!("{:032x}", value))
}

/// Converts a hex GID back into the 22-character base62 ID used by the Web API.
pub fn hex_to_base62(gid: &str) -> Option<String> {
    let mut value = u128::from_str_radix(gid, 16).ok()?;
    let mut digits = Vec::with_capacity(BASE62_ID_LEN);
    while value > 0 {
        digits.push(BASE62_ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    while digits.len() < BASE62_ID_LEN {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).ok()
}

/// Renders a track number with a single leading zero below 10.
pub fn pad_track_number(number: u32) -> String {
    if number < 10 {
        format!("0{}", number)
    } else {
        number.to_string()
    }
}

/// Replaces characters that are illegal in file names on common platforms.
pub fn clean_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Prepares an artist or album name for use as a single directory segment.
pub fn path_segment(name: &str) -> String {
    let replaced = name.replace('/', "-").replace('\\', "-");
    match replaced.trim() {
        "" | "." | ".." => "_".to_string(),
        other => other.to_string(),
    }
}

/// `{output_root}/{artist}/{album}`
pub fn output_directory(output_root: &Path, artist: &str, album: &str) -> PathBuf {
    output_root.join(path_segment(artist)).join(path_segment(album))
}

/// `{NN}. {title}` with illegal characters removed.
pub fn output_file_stem(track_number: u32, title: &str) -> String {
    clean_filename(&format!("{}. {}", pad_track_number(track_number), title))
}

pub fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Search PATH for the first matching binary name.
pub fn get_binary_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;

    for dir in env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }

            if cfg!(windows) {
                let candidate = dir.join(format!("{}.exe", name));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}
